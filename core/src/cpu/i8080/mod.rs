mod alu;
mod branch;
mod load_store;

use crate::core::{
    Bus, BusMaster,
    bus::InterruptState,
    component::{BusMasterComponent, Component},
};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, I8080State},
};

/// Flag bit positions within the Intel 8080 status byte: `S Z 0 H 0 P 1 C`.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01, // Carry
    P = 0x04, // Parity (even)
    H = 0x10, // Auxiliary carry
    Z = 0x40, // Zero
    S = 0x80, // Sign
}

/// Intel 8080 CPU core.
///
/// Unlike the T-state machines elsewhere in this crate, the 8080 executes
/// whole instructions per call: [`I8080::single_step`] and [`I8080::run`]
/// both run to the next instruction boundary (or further) rather than
/// ticking a single clock phase. This matches how the original hardware's
/// interrupt and HALT semantics are specified.
pub struct I8080 {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,

    pub interrupt_enabled: bool,
    pub halted: bool,

    pub(crate) interrupt_request: bool,
    pub(crate) interrupt_request_vector: u8,

    /// Signed cycle budget remaining for the current `run()` call.
    pub(crate) cycles_left: i64,
    /// Cycles executed since the last flush to the bus via `add_cycles`.
    pub(crate) pending_cycles: i64,

    /// When set, `single_step`/`run` log a one-line disassembly of each
    /// instruction at `log::Level::Trace` before executing it. A config
    /// field rather than a global so multiple CPU instances (or tests)
    /// can trace independently.
    pub trace: bool,
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    pub fn new() -> Self {
        Self {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            interrupt_enabled: true,
            halted: false,
            interrupt_request: false,
            interrupt_request_vector: 0,
            cycles_left: 0,
            pending_cycles: 0,
            trace: false,
        }
    }

    // 16-bit register pair helpers (matches the Z80 core's accessor naming).
    pub fn get_bc(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }
    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn get_de(&self) -> u16 {
        ((self.d as u16) << 8) | self.e as u16
    }
    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn get_hl(&self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }
    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    pub fn get_psw(&self) -> u16 {
        ((self.a as u16) << 8) | self.f as u16
    }
    pub fn set_psw(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = val as u8;
        self.fixup_flags();
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.f & flag as u8 != 0
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.f |= flag as u8;
        } else {
            self.f &= !(flag as u8);
        }
    }

    /// Restores the fixed bits of the flag byte (bit 1 always set, bits 3
    /// and 5 always clear) after a raw load such as POP PSW.
    fn fixup_flags(&mut self) {
        self.f = (self.f & 0b1101_0101) | 0b0000_0010;
    }

    fn tick_cycles(&mut self, n: i64) {
        self.cycles_left -= n;
        self.pending_cycles += n;
    }

    /// Reset to the power-on state: all registers zeroed, PC at 0, interrupts
    /// enabled, no pending cycle budget. `halted` is left untouched, matching
    /// the original firmware's reset routine.
    pub fn reset(&mut self) {
        self.a = 0;
        self.f = 0;
        self.b = 0;
        self.c = 0;
        self.d = 0;
        self.e = 0;
        self.h = 0;
        self.l = 0;
        self.sp = 0;
        self.pc = 0;
        self.cycles_left = 0;
        self.pending_cycles = 0;
        self.interrupt_enabled = true;
        self.interrupt_request = false;
        self.interrupt_request_vector = 0;
    }

    /// Latches an interrupt request with a 3-bit RST vector (0-7). Becomes
    /// observable at the next instruction boundary if interrupts are
    /// enabled; otherwise it stays latched until they are.
    pub fn request_interrupt(&mut self, vector: u8) {
        self.interrupt_request = true;
        self.interrupt_request_vector = vector & 0x07;
    }

    fn dispatch_interrupt<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) {
        if !(self.interrupt_request && self.interrupt_enabled) {
            return;
        }

        let pc = self.pc;
        self.push_word(bus, master, pc);
        self.pc = (self.interrupt_request_vector as u16) * 8;
        self.interrupt_enabled = false;
        self.interrupt_request = false;
        self.interrupt_request_vector = 0;
        self.halted = false;
    }

    fn halt(&mut self) {
        self.halted = true;
        if self.cycles_left > 0 {
            self.pending_cycles += self.cycles_left;
            self.cycles_left = 0;
        }
    }

    /// Logs a one-line disassembly of the next instruction plus register
    /// state at `log::Level::Trace`, if `self.trace` is set. No-op
    /// otherwise, so untraced execution never pays for the extra bus reads.
    fn trace_line<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &self,
        bus: &mut B,
        master: BusMaster,
    ) {
        if !self.trace {
            return;
        }
        let disasm = self.disassemble(bus, master, self.pc);
        log::trace!(
            "{disasm}  a={:02x} bc={:04x} de={:04x} hl={:04x} sp={:04x} f={:02x}",
            self.a,
            self.get_bc(),
            self.get_de(),
            self.get_hl(),
            self.sp,
            self.f
        );
    }

    /// Executes exactly one instruction, unless halted or an interrupt is
    /// dispatched instead, then flushes the cycle count to the bus.
    pub fn single_step<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.dispatch_interrupt(bus, master);
        if !self.halted {
            self.trace_line(bus, master);
            self.execute_instruction(bus, master);
        }

        bus.add_cycles(master, self.pending_cycles);
        self.pending_cycles = 0;
    }

    /// Runs instructions until at least `cycles` worth of budget has been
    /// consumed (possibly overshooting by the last instruction's length),
    /// or the CPU halts, then flushes the cycle count to the bus.
    pub fn run<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        cycles: i64,
    ) {
        self.cycles_left += cycles;

        while self.cycles_left > 0 {
            self.dispatch_interrupt(bus, master);
            if self.halted {
                self.cycles_left = 0;
                break;
            }

            self.trace_line(bus, master);
            self.execute_instruction(bus, master);
        }

        bus.add_cycles(master, self.pending_cycles);
        self.pending_cycles = 0;
    }

    /// Produces a one-line disassembly of the instruction at `addr`, without
    /// mutating CPU state. Reads through the bus, so memory-mapped I/O with
    /// read side effects may be disturbed.
    pub fn disassemble<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &self,
        bus: &mut B,
        master: BusMaster,
        addr: u16,
    ) -> String {
        let opcode = bus.read(master, addr);
        let template = DISASM_TEMPLATES[opcode as usize];
        let mut cursor = addr.wrapping_add(1);
        let mut hex = format!("{opcode:02X}");
        let mut text = String::new();

        let bytes: Vec<char> = template.chars().collect();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == '$' || (bytes[i] == '#' && bytes.get(i + 1) == Some(&'#')) {
                let low = bus.read(master, cursor);
                cursor = cursor.wrapping_add(1);
                let high = bus.read(master, cursor);
                cursor = cursor.wrapping_add(1);
                let value = (low as u16) | ((high as u16) << 8);
                hex.push_str(&format!(" {low:02X} {high:02X}"));
                text.push_str(&format!("{value:04x}h"));
                i += 2;
            } else if bytes[i] == '#' {
                let value = bus.read(master, cursor);
                cursor = cursor.wrapping_add(1);
                hex.push_str(&format!(" {value:02X}"));
                text.push_str(&format!("{value:02x}h"));
                i += 1;
            } else {
                text.push(bytes[i]);
                i += 1;
            }
        }

        format!("{addr:04X}: {hex:<16} {text}")
    }

    fn execute_instruction<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) {
        let opcode = self.read_immediate_byte(bus, master);

        match opcode {
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => self.tick_cycles(4), // nop

            0x01 => {
                self.tick_cycles(10);
                let v = self.read_immediate_word(bus, master);
                self.set_bc(v);
            }
            0x11 => {
                self.tick_cycles(10);
                let v = self.read_immediate_word(bus, master);
                self.set_de(v);
            }
            0x21 => {
                self.tick_cycles(10);
                let v = self.read_immediate_word(bus, master);
                self.set_hl(v);
            }
            0x31 => {
                self.tick_cycles(10);
                self.sp = self.read_immediate_word(bus, master);
            }

            0x0A => {
                self.tick_cycles(7);
                self.a = bus.read(master, self.get_bc());
            }
            0x1A => {
                self.tick_cycles(7);
                self.a = bus.read(master, self.get_de());
            }
            0x02 => {
                self.tick_cycles(7);
                bus.write(master, self.get_bc(), self.a);
            }
            0x12 => {
                self.tick_cycles(7);
                bus.write(master, self.get_de(), self.a);
            }

            0x3A => {
                self.tick_cycles(13);
                let addr = self.read_immediate_word(bus, master);
                self.a = bus.read(master, addr);
            }
            0x32 => {
                self.tick_cycles(13);
                let addr = self.read_immediate_word(bus, master);
                bus.write(master, addr, self.a);
            }
            0x2A => {
                self.tick_cycles(16);
                let addr = self.read_immediate_word(bus, master);
                let v = self.read_word(bus, master, addr);
                self.set_hl(v);
            }
            0x22 => {
                self.tick_cycles(16);
                let addr = self.read_immediate_word(bus, master);
                let v = self.get_hl();
                self.write_word(bus, master, addr, v);
            }

            0x03 => {
                self.tick_cycles(5);
                self.set_bc(self.get_bc().wrapping_add(1));
            }
            0x13 => {
                self.tick_cycles(5);
                self.set_de(self.get_de().wrapping_add(1));
            }
            0x23 => {
                self.tick_cycles(5);
                self.set_hl(self.get_hl().wrapping_add(1));
            }
            0x33 => {
                self.tick_cycles(5);
                self.sp = self.sp.wrapping_add(1);
            }
            0x0B => {
                self.tick_cycles(5);
                self.set_bc(self.get_bc().wrapping_sub(1));
            }
            0x1B => {
                self.tick_cycles(5);
                self.set_de(self.get_de().wrapping_sub(1));
            }
            0x2B => {
                self.tick_cycles(5);
                self.set_hl(self.get_hl().wrapping_sub(1));
            }
            0x3B => {
                self.tick_cycles(5);
                self.sp = self.sp.wrapping_sub(1);
            }

            0x09 => {
                self.tick_cycles(10);
                let v = self.op_dad(self.get_hl(), self.get_bc());
                self.set_hl(v);
            }
            0x19 => {
                self.tick_cycles(10);
                let v = self.op_dad(self.get_hl(), self.get_de());
                self.set_hl(v);
            }
            0x29 => {
                self.tick_cycles(10);
                let hl = self.get_hl();
                let v = self.op_dad(hl, hl);
                self.set_hl(v);
            }
            0x39 => {
                self.tick_cycles(10);
                let v = self.op_dad(self.get_hl(), self.sp);
                self.set_hl(v);
            }

            // inr/dcr r, inr/dcr m
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let idx = (opcode >> 3) & 7;
                self.tick_cycles(if idx == 6 { 10 } else { 5 });
                let v = self.get_reg8(bus, master, idx);
                let r = self.op_inr(v);
                self.set_reg8(bus, master, idx, r);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let idx = (opcode >> 3) & 7;
                self.tick_cycles(if idx == 6 { 10 } else { 5 });
                let v = self.get_reg8(bus, master, idx);
                let r = self.op_dcr(v);
                self.set_reg8(bus, master, idx, r);
            }

            // mvi r, d8 / mvi m, d8
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let idx = (opcode >> 3) & 7;
                self.tick_cycles(if idx == 6 { 10 } else { 7 });
                let v = self.read_immediate_byte(bus, master);
                self.set_reg8(bus, master, idx, v);
            }

            0x07 => {
                self.tick_cycles(4);
                self.a = self.op_rlc(self.a);
            }
            0x17 => {
                self.tick_cycles(4);
                self.a = self.op_ral(self.a);
            }
            0x0F => {
                self.tick_cycles(4);
                self.a = self.op_rrc(self.a);
            }
            0x1F => {
                self.tick_cycles(4);
                self.a = self.op_rar(self.a);
            }
            0x27 => {
                self.tick_cycles(4);
                self.a = self.op_daa(self.a);
            }
            0x2F => {
                self.tick_cycles(4);
                self.a = !self.a;
            }
            0x37 => {
                self.tick_cycles(4);
                self.set_flag(Flag::C, true);
            }
            0x3F => {
                self.tick_cycles(4);
                let c = self.flag(Flag::C);
                self.set_flag(Flag::C, !c);
            }

            0x76 => {
                self.tick_cycles(7);
                self.halt();
            }

            // mov r, r' (0x40-0x7F excluding 0x76, handled above)
            0x40..=0x7F => {
                let dst = (opcode >> 3) & 7;
                let src = opcode & 7;
                self.tick_cycles(if dst == 6 || src == 6 { 7 } else { 5 });
                let v = self.get_reg8(bus, master, src);
                self.set_reg8(bus, master, dst, v);
            }

            // add/adc/sub/sbb/ana/xra/ora/cmp r / m / d8
            0x80..=0xBF => {
                let op_kind = (opcode >> 3) & 7;
                let src = opcode & 7;
                self.tick_cycles(if src == 6 { 7 } else { 4 });
                let rhs = self.get_reg8(bus, master, src);
                self.apply_alu_op(op_kind, rhs);
            }
            0xC6 => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_add(self.a, rhs);
            }
            0xCE => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_adc(self.a, rhs);
            }
            0xD6 => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_sub(self.a, rhs);
            }
            0xDE => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_sbb(self.a, rhs);
            }
            0xE6 => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_and(self.a, rhs);
            }
            0xEE => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_xor(self.a, rhs);
            }
            0xF6 => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.a = self.op_or(self.a, rhs);
            }
            0xFE => {
                self.tick_cycles(7);
                let rhs = self.read_immediate_byte(bus, master);
                self.op_sub(self.a, rhs); // cpi: discard result, keep flags
            }

            // Unconditional/conditional jumps
            0xC3 | 0xCB => {
                self.tick_cycles(10);
                let tgt = self.read_immediate_word(bus, master);
                self.op_jmp(tgt);
            }
            0xC2 | 0xD2 | 0xE2 | 0xF2 | 0xCA | 0xDA | 0xEA | 0xFA => {
                self.tick_cycles(10);
                let tgt = self.read_immediate_word(bus, master);
                if self.branch_condition(opcode) {
                    self.op_jmp(tgt);
                }
            }

            // Unconditional calls
            0xCD | 0xDD | 0xED | 0xFD => {
                self.tick_cycles(17);
                let tgt = self.read_immediate_word(bus, master);
                self.op_call(bus, master, tgt);
            }

            // Conditional calls
            0xC4 | 0xD4 | 0xE4 | 0xF4 | 0xCC | 0xDC | 0xEC | 0xFC => {
                let tgt = self.read_immediate_word(bus, master);
                if self.branch_condition(opcode) {
                    self.tick_cycles(17);
                    self.op_call(bus, master, tgt);
                } else {
                    self.tick_cycles(11);
                }
            }

            // Unconditional returns
            0xC9 | 0xD9 => {
                self.tick_cycles(10);
                self.op_ret(bus, master);
            }

            // Conditional returns
            0xC0 | 0xD0 | 0xE0 | 0xF0 | 0xC8 | 0xD8 | 0xE8 | 0xF8 => {
                if self.branch_condition(opcode) {
                    self.tick_cycles(11);
                    self.op_ret(bus, master);
                } else {
                    self.tick_cycles(5);
                }
            }

            // RST 0-7
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.tick_cycles(11);
                let vector = (opcode & 0x38) as u16;
                self.op_call(bus, master, vector);
            }

            0xF5 => {
                self.tick_cycles(11);
                let v = self.get_psw();
                self.push_word(bus, master, v);
            }
            0xC5 => {
                self.tick_cycles(11);
                let v = self.get_bc();
                self.push_word(bus, master, v);
            }
            0xD5 => {
                self.tick_cycles(11);
                let v = self.get_de();
                self.push_word(bus, master, v);
            }
            0xE5 => {
                self.tick_cycles(11);
                let v = self.get_hl();
                self.push_word(bus, master, v);
            }
            0xC1 => {
                self.tick_cycles(10);
                let v = self.pop_word(bus, master);
                self.set_bc(v);
            }
            0xD1 => {
                self.tick_cycles(10);
                let v = self.pop_word(bus, master);
                self.set_de(v);
            }
            0xE1 => {
                self.tick_cycles(10);
                let v = self.pop_word(bus, master);
                self.set_hl(v);
            }
            0xF1 => {
                self.tick_cycles(10);
                let v = self.pop_word(bus, master);
                self.set_psw(v);
            }

            0xEB => {
                self.tick_cycles(5);
                std::mem::swap(&mut self.d, &mut self.h);
                std::mem::swap(&mut self.e, &mut self.l);
            }
            0xE3 => {
                self.tick_cycles(18);
                self.op_xthl(bus, master);
            }
            0xE9 => {
                self.tick_cycles(5);
                self.pc = self.get_hl();
            }
            0xF9 => {
                self.tick_cycles(5);
                self.sp = self.get_hl();
            }

            0xF3 => {
                self.tick_cycles(4);
                self.interrupt_enabled = false;
            }
            0xFB => {
                self.tick_cycles(4);
                self.interrupt_enabled = true;
            }

            0xDB => {
                self.tick_cycles(10);
                let port = self.read_immediate_byte(bus, master);
                self.a = bus.io_read(master, port as u16);
            }
            0xD3 => {
                self.tick_cycles(10);
                let port = self.read_immediate_byte(bus, master);
                bus.io_write(master, port as u16, self.a);
            }
        }
    }

    fn apply_alu_op(&mut self, kind: u8, rhs: u8) {
        match kind {
            0 => self.a = self.op_add(self.a, rhs),
            1 => self.a = self.op_adc(self.a, rhs),
            2 => self.a = self.op_sub(self.a, rhs),
            3 => self.a = self.op_sbb(self.a, rhs),
            4 => self.a = self.op_and(self.a, rhs),
            5 => self.a = self.op_xor(self.a, rhs),
            6 => self.a = self.op_or(self.a, rhs),
            _ => {
                self.op_sub(self.a, rhs); // cmp: discard result, keep flags
            }
        }
    }
}

impl Component for I8080 {
    fn tick(&mut self) -> bool {
        false
    }
}

impl BusMasterComponent for I8080 {
    type Bus = dyn Bus<Address = u16, Data = u8>;

    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master: BusMaster) -> bool {
        self.single_step(bus, master);
        true
    }
}

impl Cpu for I8080 {
    fn reset(&mut self) {
        I8080::reset(self);
    }

    fn signal_interrupt(&mut self, _int: InterruptState) {}

    fn is_sleeping(&self) -> bool {
        self.halted
    }
}

impl CpuStateTrait for I8080 {
    type Snapshot = I8080State;

    fn snapshot(&self) -> I8080State {
        I8080State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
            interrupt_enabled: self.interrupt_enabled,
            halted: self.halted,
        }
    }
}

#[rustfmt::skip]
const DISASM_TEMPLATES: [&str; 256] = [
    "nop",      "lxi b, ##", "stax b",   "inx b",    "inr b",      "dcr b",    "mvi b, #",  "rlc",        "nop",
    "dad b",    "ldax b",    "dcx b",    "inr c",    "dcr c",      "mvi c, #", "rrc",       "nop",        "lxi d, ##",
    "stax d",   "inx d",     "inr d",    "dcr d",    "mvi d, #",   "ral",      "nop",       "dad d",      "ldax d",
    "dcx d",    "inr e",     "dcr e",    "mvi e, #", "rar",        "nop",      "lxi h, ##", "shld      ", "inx h",
    "inr h",    "dcr h",     "mvi h, #", "daa",      "nop",        "dad h",    "lhld",      "dcx h",      "inr l",
    "dcr l",    "mvi l, #",  "cma",      "nop",      "lxi sp, ##", "sta $",    "inx sp",    "inr m",      "dcr m",
    "mvi m, #", "stc",       "nop",      "dad sp",   "lda $",      "dcx sp",   "inr a",     "dcr a",      "mvi a, #",
    "cmc",      "mov b, b",  "mov b, c", "mov b, d", "mov b, e",   "mov b, h", "mov b, l",  "mov b, m",   "mov b, a",
    "mov c, b", "mov c, c",  "mov c, d", "mov c, e", "mov c, h",   "mov c, l", "mov c, m",  "mov c, a",   "mov d, b",
    "mov d, c", "mov d, d",  "mov d, e", "mov d, h", "mov d, l",   "mov d, m", "mov d, a",  "mov e, b",   "mov e, c",
    "mov e, d", "mov e, e",  "mov e, h", "mov e, l", "mov e, m",   "mov e, a", "mov h, b",  "mov h, c",   "mov h, d",
    "mov h, e", "mov h, h",  "mov h, l", "mov h, m", "mov h, a",   "mov l, b", "mov l, c",  "mov l, d",   "mov l, e",
    "mov l, h", "mov l, l",  "mov l, m", "mov l, a", "mov m, b",   "mov m, c", "mov m, d",  "mov m, e",   "mov m, h",
    "mov m, l", "hlt",       "mov m, a", "mov a, b", "mov a, c",   "mov a, d", "mov a, e",  "mov a, h",   "mov a, l",
    "mov a, m", "mov a, a",  "add b",    "add c",    "add d",      "add e",    "add h",     "add l",      "add m",
    "add a",    "adc b",     "adc c",    "adc d",    "adc e",      "adc h",    "adc l",     "adc m",      "adc a",
    "sub b",    "sub c",     "sub d",    "sub e",    "sub h",      "sub l",    "sub m",     "sub a",      "sbc b",
    "sbc c",    "sbc d",     "sbc e",    "sbc h",    "sbc l",      "sbc m",    "sbc a",     "ana b",      "ana c",
    "ana d",    "ana e",     "ana h",    "ana l",    "ana m",      "ana a",    "xra b",     "xra c",      "xra d",
    "xra e",    "xra h",     "xra l",    "xra m",    "xra a",      "ora b",    "ora c",     "ora d",      "ora e",
    "ora h",    "ora l",     "ora m",    "ora a",    "cmp b",      "cmp c",    "cmp d",     "cmp e",      "cmp h",
    "cmp l",    "cmp m",     "cmp a",    "rnz",      "pop b",      "jnz $",    "jmp $",     "cnz $",      "push b",
    "adi #",    "rst 0",     "rz",       "ret",      "jz $",       "jmp $",    "cz $",      "call $",     "aci #",
    "rst 1",    "rnc",       "pop d",    "jnc $",    "out #",      "cnc $",    "push d",    "sui #",      "rst 2",
    "rc",       "ret",       "jc $",     "in #",     "cc $",       "call $",   "sbi #",     "rst 3",      "rpo",
    "pop h",    "jpo $",     "xthl",     "cpo $",    "push h",     "ani #",    "rst 4",     "rpe",        "pchl",
    "jo $",     "xchg",      "cpe $",    "call $",   "xri #",      "rst 5",    "rp",        "pop psw",    "jp $",
    "di",       "cp $",      "push psw", "ori #",    "rst 6",      "rm",       "sphl",      "jm $",       "ei",
    "cm $",     "call $",    "cpi #",    "rst 7",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::InterruptState as IS;

    /// Minimal flat-RAM bus for exercising the CPU in isolation.
    struct TestBus {
        mem: [u8; 0x10000],
        io: [u8; 0x100],
        cycles_added: i64,
    }

    impl TestBus {
        fn new() -> Self {
            Self {
                mem: [0; 0x10000],
                io: [0; 0x100],
                cycles_added: 0,
            }
        }
    }

    impl Bus for TestBus {
        type Address = u16;
        type Data = u8;

        fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
            self.mem[addr as usize]
        }
        fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
            self.mem[addr as usize] = data;
        }
        fn io_read(&mut self, _master: BusMaster, addr: u16) -> u8 {
            self.io[(addr & 0xFF) as usize]
        }
        fn io_write(&mut self, _master: BusMaster, addr: u16, data: u8) {
            self.io[(addr & 0xFF) as usize] = data;
        }
        fn is_halted_for(&self, _master: BusMaster) -> bool {
            false
        }
        fn check_interrupts(&self, _target: BusMaster) -> IS {
            IS::default()
        }
        fn add_cycles(&mut self, _master: BusMaster, cycles: i64) {
            self.cycles_added += cycles;
        }
    }

    const M: BusMaster = BusMaster::Cpu(0);

    #[test]
    fn nop_takes_four_cycles() {
        let mut cpu = I8080::new();
        let mut bus = TestBus::new();
        bus.mem[0] = 0x00;
        cpu.single_step(&mut bus, M);
        assert_eq!(bus.cycles_added, 4);
        assert_eq!(cpu.pc, 1);
    }

    #[test]
    fn mvi_and_mov_roundtrip() {
        let mut cpu = I8080::new();
        let mut bus = TestBus::new();
        bus.mem[0] = 0x3E; // mvi a, d8
        bus.mem[1] = 0x42;
        bus.mem[2] = 0x47; // mov b, a
        cpu.single_step(&mut bus, M);
        assert_eq!(cpu.a, 0x42);
        cpu.single_step(&mut bus, M);
        assert_eq!(cpu.b, 0x42);
    }

    #[test]
    fn push_pop_psw_preserves_fixed_bits() {
        let mut cpu = I8080::new();
        let mut bus = TestBus::new();
        cpu.sp = 0x2000;
        cpu.a = 0xAA;
        cpu.f = 0x00; // fixed bits cleared on purpose
        bus.mem[0] = 0xF5; // push psw
        bus.mem[1] = 0xF1; // pop psw
        cpu.single_step(&mut bus, M);
        cpu.a = 0;
        cpu.single_step(&mut bus, M);
        assert_eq!(cpu.a, 0xAA);
        assert_eq!(cpu.f & 0b0000_1010, 0b0000_0010);
        assert_eq!(cpu.sp, 0x2000);
    }

    #[test]
    fn daa_adjusts_packed_bcd() {
        let mut cpu = I8080::new();
        cpu.a = 0x9B;
        cpu.set_flag(Flag::C, false);
        cpu.set_flag(Flag::H, false);
        cpu.a = cpu.op_daa(cpu.a);
        assert_eq!(cpu.a, 0x01);
        assert!(cpu.flag(Flag::C));
        assert!(cpu.flag(Flag::H));
    }

    #[test]
    fn ora_a_clears_carry_and_sets_parity() {
        let mut cpu = I8080::new();
        cpu.a = 0b0000_0011; // even parity
        cpu.set_flag(Flag::C, true);
        let mut bus = TestBus::new();
        bus.mem[0] = 0xB7; // ora a
        cpu.single_step(&mut bus, M);
        assert!(!cpu.flag(Flag::C));
        assert!(cpu.flag(Flag::P));
    }

    #[test]
    fn halt_parks_cycle_budget_in_pending() {
        let mut cpu = I8080::new();
        let mut bus = TestBus::new();
        bus.mem[0] = 0x76; // hlt
        cpu.run(&mut bus, M, 100);
        assert!(cpu.halted);
        assert_eq!(bus.cycles_added, 100);
    }

    #[test]
    fn interrupt_dispatches_between_instructions_only() {
        let mut cpu = I8080::new();
        let mut bus = TestBus::new();
        cpu.sp = 0x2000;
        cpu.pc = 0x1000;
        bus.mem[0x1000] = 0x00; // nop, never reached: the interrupt preempts it
        bus.mem[0x0008] = 0x00; // nop at the RST 1 vector
        cpu.request_interrupt(1); // RST 1 -> vector 0x0008
        cpu.single_step(&mut bus, M); // dispatches the interrupt, then executes its first instruction
        assert_eq!(cpu.pc, 0x0009);
        assert_eq!(cpu.sp, 0x1FFE);
        assert!(!cpu.interrupt_enabled);
        assert_eq!(cpu.pop_word(&mut bus, M), 0x1000); // pushed return address
    }

    #[test]
    fn interrupt_ignored_while_disabled() {
        let mut cpu = I8080::new();
        let mut bus = TestBus::new();
        cpu.interrupt_enabled = false;
        cpu.pc = 0x1000;
        bus.mem[0x1000] = 0x00; // nop
        cpu.request_interrupt(2);
        cpu.single_step(&mut bus, M);
        assert_eq!(cpu.pc, 0x1001);
        assert!(cpu.interrupt_request);
    }
}
