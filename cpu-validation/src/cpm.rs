//! CP/M BDOS test harness for running the classic Intel 8080 conformance
//! suites (TST8080, 8080PRE, CPUTEST, 8080EXM) unmodified.
//!
//! These `.COM` files are written against CP/M 2.2's BDOS: they `CALL 0x0005`
//! to print characters or strings and expect the process to exit once
//! execution falls through to address 0. Real CP/M isn't emulated; instead
//! the 0x0005 entry point is patched to `RET` and intercepted so the runner
//! can service the two BDOS calls the test ROMs actually use.

use phosphor_core::core::bus::InterruptState;
use phosphor_core::core::{Bus, BusMaster};
use phosphor_core::cpu::i8080::I8080;

/// `CALL 5` is the BDOS entry point on CP/M. The test ROMs call it to print
/// characters and strings; `RET` (0xC9) is patched in so control returns to
/// the caller immediately once the harness has serviced the request.
const BDOS_ENTRY: u16 = 0x0005;
const BDOS_RET_OPCODE: u8 = 0xC9;

/// Programs are loaded at CP/M's standard TPA origin.
const LOAD_ADDRESS: u16 = 0x0100;

/// Flat 64KB RAM bus used to run a CP/M `.COM` test image. I/O ports are
/// unconnected: none of the conformance ROMs touch them.
struct CpmBus {
    ram: [u8; 0x10000],
}

impl CpmBus {
    fn new() -> Self {
        Self { ram: [0; 0x10000] }
    }
}

impl Bus for CpmBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.ram[addr as usize] = data;
    }

    fn io_read(&mut self, _master: BusMaster, _addr: u16) -> u8 {
        0xFF
    }

    fn io_write(&mut self, _master: BusMaster, _addr: u16, _data: u8) {}

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState::default()
    }
}

/// Outcome of running a CP/M test image to completion.
pub struct CpmRun {
    /// Output lines as they would appear on a CP/M console, newline-split.
    pub lines: Vec<String>,
    /// Number of 8080 instructions executed.
    pub instructions_executed: u64,
}

impl CpmRun {
    /// Joins all output lines back into a single string, for substring
    /// assertions against a test ROM's pass/fail banner.
    pub fn output(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runs a CP/M `.COM` image (raw bytes, no header) to completion and
/// collects its console output.
///
/// Execution stops when the program falls through to address 0x0000 (the
/// CP/M warm-boot vector), which is how these test images signal they are
/// done. A hard cap on instruction count guards against a regressed CPU
/// spinning forever instead of halting.
pub fn run_cpm_program(image: &[u8]) -> CpmRun {
    let mut bus = CpmBus::new();
    let copy_len = image.len().min(bus.ram.len() - LOAD_ADDRESS as usize);
    bus.ram[LOAD_ADDRESS as usize..LOAD_ADDRESS as usize + copy_len]
        .copy_from_slice(&image[..copy_len]);
    bus.ram[BDOS_ENTRY as usize] = BDOS_RET_OPCODE;

    let mut cpu = I8080::new();
    cpu.pc = LOAD_ADDRESS;

    let mut collector = LineCollector::default();
    let mut instructions_executed = 0u64;
    const MAX_INSTRUCTIONS: u64 = 200_000_000;

    loop {
        if cpu.pc == BDOS_ENTRY {
            handle_bdos_call(&cpu, &mut bus, &mut collector);
        } else if cpu.pc == 0x0000 {
            break;
        }

        cpu.single_step(&mut bus, BusMaster::Cpu(0));
        instructions_executed += 1;
        if instructions_executed >= MAX_INSTRUCTIONS {
            collector.push_str("(runner aborted: instruction limit exceeded)\n");
            break;
        }
    }

    collector.flush();
    CpmRun {
        lines: collector.lines,
        instructions_executed,
    }
}

fn handle_bdos_call(cpu: &I8080, bus: &mut CpmBus, collector: &mut LineCollector) {
    match cpu.c {
        2 => collector.push_char(cpu.e),
        9 => {
            let mut addr = cpu.get_de();
            loop {
                let ch = bus.read(BusMaster::Cpu(0), addr);
                if ch == b'$' {
                    break;
                }
                if ch == b'\r' {
                    addr = addr.wrapping_add(1);
                    continue;
                }
                collector.push_char(ch);
                addr = addr.wrapping_add(1);
            }
        }
        other => log::error!("unknown BDOS command 0x{other:02X}"),
    }
}

/// Accumulates characters into newline-delimited lines, matching the
/// original harness's behavior of filtering `\r`, substituting `?` for
/// non-printable bytes, and logging one completed line at a time.
#[derive(Default)]
struct LineCollector {
    current: String,
    lines: Vec<String>,
}

impl LineCollector {
    fn push_char(&mut self, ch: u8) {
        if ch == b'\r' {
            return;
        }
        let ch = if ch != b'\n' && !(ch.is_ascii_graphic() || ch == b' ') {
            b'?'
        } else {
            ch
        };
        if ch == b'\n' {
            self.lines.push(std::mem::take(&mut self.current));
        } else {
            self.current.push(ch as char);
        }
    }

    fn push_str(&mut self, s: &str) {
        for b in s.bytes() {
            self.push_char(b);
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `MVI C,9 / LXI D,msg / CALL 5 / HLT` where `msg` is a `$`-terminated
    /// string, followed by falling through to 0 after the HLT traps forever
    /// in real hardware — instead we just drop straight to RET-then-zero by
    /// writing the program to end at address 0 via a JMP 0, since HLT alone
    /// would spin `single_step` without advancing `pc` past the BDOS check.
    fn build_print_string_program(message: &str) -> Vec<u8> {
        let mut prog = vec![
            0x0E, 0x09, // MVI C, 9
            0x11, 0x0A, 0x01, // LXI D, 0x010A (message start, right after this program)
            0xCD, 0x05, 0x00, // CALL 5
            0xC3, 0x00, 0x00, // JMP 0
        ];
        prog.extend_from_slice(message.as_bytes());
        prog.push(b'$');
        prog
    }

    #[test]
    fn prints_dollar_terminated_string_via_bdos_9() {
        let image = build_print_string_program("HELLO");
        let run = run_cpm_program(&image);
        assert_eq!(run.output(), "HELLO");
    }

    #[test]
    fn prints_single_characters_via_bdos_2() {
        // MVI C,2 / MVI E,'A' / CALL 5 / MVI E,'\n' / CALL 5 / JMP 0
        let image = vec![
            0x0E, 0x02, // MVI C, 2
            0x1E, b'A', // MVI E, 'A'
            0xCD, 0x05, 0x00, // CALL 5
            0x1E, b'\n', // MVI E, '\n'
            0xCD, 0x05, 0x00, // CALL 5
            0xC3, 0x00, 0x00, // JMP 0
        ];
        let run = run_cpm_program(&image);
        assert_eq!(run.lines, vec!["A".to_string()]);
    }

    #[test]
    fn carriage_returns_are_dropped_from_output() {
        let image = build_print_string_program("A\rB");
        let run = run_cpm_program(&image);
        assert_eq!(run.output(), "AB");
    }
}
