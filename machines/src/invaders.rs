//! Taito/Midway Space Invaders arcade system (1978).
//!
//! Hardware: Intel 8080 @ 2 MHz, 8KB ROM + 8KB RAM (1KB work RAM, 7KB video
//! RAM), a discrete shift-register peripheral used for sprite scaling math,
//! and two interrupts per 60 Hz frame (mid-screen and vblank) driving a
//! 256x224 monochrome bitmap with a fixed color-overlay film.

use phosphor_core::core::bus::InterruptState;
use phosphor_core::core::machine::{InputButton, Machine};
use phosphor_core::core::{Bus, BusMaster};
use phosphor_core::cpu::i8080::I8080;

use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

/// The four program ROMs, 2KB each, filling the bottom half of the 8KB
/// address space ROM is decoded into.
pub static INVADERS_PROGRAM_ROM: RomRegion = RomRegion {
    size: 0x2000,
    entries: &[
        RomEntry {
            name: "invaders.h",
            size: 0x0800,
            offset: 0x0000,
            crc32: None,
        },
        RomEntry {
            name: "invaders.g",
            size: 0x0800,
            offset: 0x0800,
            crc32: None,
        },
        RomEntry {
            name: "invaders.f",
            size: 0x0800,
            offset: 0x1000,
            crc32: None,
        },
        RomEntry {
            name: "invaders.e",
            size: 0x0800,
            offset: 0x1800,
            crc32: None,
        },
    ],
};

// ---------------------------------------------------------------------------
// Input button IDs
// ---------------------------------------------------------------------------
pub const INPUT_P1_LEFT: u8 = 0;
pub const INPUT_P1_RIGHT: u8 = 1;
pub const INPUT_P1_FIRE: u8 = 2;
pub const INPUT_P2_LEFT: u8 = 3;
pub const INPUT_P2_RIGHT: u8 = 4;
pub const INPUT_P2_FIRE: u8 = 5;
pub const INPUT_CREDIT: u8 = 6;
pub const INPUT_P1_START: u8 = 7;
pub const INPUT_P2_START: u8 = 8;
pub const INPUT_TILT: u8 = 9;

const INVADERS_INPUT_MAP: &[InputButton] = &[
    InputButton {
        id: INPUT_P1_LEFT,
        name: "P1 Left",
    },
    InputButton {
        id: INPUT_P1_RIGHT,
        name: "P1 Right",
    },
    InputButton {
        id: INPUT_P1_FIRE,
        name: "P1 Fire",
    },
    InputButton {
        id: INPUT_P2_LEFT,
        name: "P2 Left",
    },
    InputButton {
        id: INPUT_P2_RIGHT,
        name: "P2 Right",
    },
    InputButton {
        id: INPUT_P2_FIRE,
        name: "P2 Fire",
    },
    InputButton {
        id: INPUT_CREDIT,
        name: "Credit",
    },
    InputButton {
        id: INPUT_P1_START,
        name: "P1 Start",
    },
    InputButton {
        id: INPUT_P2_START,
        name: "P2 Start",
    },
    InputButton {
        id: INPUT_TILT,
        name: "Tilt",
    },
];

// ---------------------------------------------------------------------------
// Timing / display constants
// ---------------------------------------------------------------------------

/// Half of 2,000,000 / 60, rounded: the cycle gap between the mid-screen and
/// vblank interrupts (and vice versa).
const INTERRUPT_CYCLE_INTERVAL: i64 = 17066;

const DISPLAY_WIDTH: usize = 256;
const DISPLAY_HEIGHT: usize = 224;
const VRAM_OFFSET: usize = 0x400;
const VRAM_BYTES_PER_ROW: usize = DISPLAY_WIDTH / 8;

/// Precomputed per-pixel color-overlay film. Indexed `[row][col]`.
struct ColorMask {
    rgb: Vec<(u8, u8, u8)>,
}

impl ColorMask {
    fn new() -> Self {
        const WHITE: (u8, u8, u8) = (255, 255, 255);
        const GREEN: (u8, u8, u8) = (0, 255, 0);
        const RED: (u8, u8, u8) = (255, 0, 0);

        let mut rgb = Vec::with_capacity(DISPLAY_WIDTH * DISPLAY_HEIGHT);
        for row in 0..DISPLAY_HEIGHT {
            for col in 0..DISPLAY_WIDTH {
                let color = if col < 16 {
                    if row < 16 {
                        WHITE
                    } else if row < 118 {
                        GREEN
                    } else {
                        WHITE
                    }
                } else if col < 72 {
                    GREEN
                } else if col < 192 {
                    RED
                } else if col < 224 {
                    GREEN
                } else {
                    WHITE
                };
                rgb.push(color);
            }
        }
        Self { rgb }
    }

    fn at(&self, row: usize, col: usize) -> (u8, u8, u8) {
        self.rgb[row * DISPLAY_WIDTH + col]
    }
}

/// Taito Space Invaders (1978). Intel 8080 @ 2MHz, 256x224 monochrome
/// bitmap display with a fixed color-overlay film, one external
/// bit-shifter peripheral, and two interrupts per 60Hz frame.
pub struct InvadersSystem {
    cpu: I8080,

    rom: [u8; 0x2000],
    ram: [u8; 0x2000],

    in0: u8,
    in1: u8,
    in2: u8,

    shift_value: u16,
    shift_offset: u8,

    cycles_to_next_interrupt: i64,
    last_was_vblank: bool,

    color_mask: ColorMask,
    framebuffer: Vec<u8>,
    frames_rendered: u64,
}

impl Default for InvadersSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InvadersSystem {
    pub fn new() -> Self {
        Self {
            cpu: I8080::new(),
            rom: [0; 0x2000],
            ram: [0; 0x2000],
            // INP0/INP1's stuck-high bits are applied on read, not stored here.
            in0: 0,
            in1: 0,
            in2: 0,
            shift_value: 0,
            shift_offset: 0,
            cycles_to_next_interrupt: INTERRUPT_CYCLE_INTERVAL,
            last_was_vblank: true,
            color_mask: ColorMask::new(),
            framebuffer: vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT * 4],
            frames_rendered: 0,
        }
    }

    /// Load the four program ROMs from a resolved [`RomSet`].
    pub fn load_rom_set(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        let data = INVADERS_PROGRAM_ROM.load(rom_set)?;
        self.rom.copy_from_slice(&data);
        Ok(())
    }

    /// Total frames rendered since the last reset. Exposed for tests and for
    /// a frontend FPS readout; not part of the `Machine` contract.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    fn shift_read(&self) -> u8 {
        ((self.shift_value >> (8 - self.shift_offset)) & 0xFF) as u8
    }

    fn render(&mut self) {
        for row in 0..DISPLAY_HEIGHT {
            let row_base = VRAM_OFFSET + row * VRAM_BYTES_PER_ROW;
            for byte_col in 0..VRAM_BYTES_PER_ROW {
                let mut byte = self.ram[row_base + byte_col];
                for bit in 0..8 {
                    let col = byte_col * 8 + bit;
                    let on = byte & 0x01 != 0;
                    let (r, g, b) = if on {
                        self.color_mask.at(row, col)
                    } else {
                        (0, 0, 0)
                    };
                    let idx = (row * DISPLAY_WIDTH + col) * 4;
                    self.framebuffer[idx] = r;
                    self.framebuffer[idx + 1] = g;
                    self.framebuffer[idx + 2] = b;
                    self.framebuffer[idx + 3] = 0xFF;
                    byte >>= 1;
                }
            }
        }
        self.frames_rendered += 1;
    }

    /// Runs one 17066-cycle half-frame slice, dispatching whatever
    /// interrupt the scheduler requests via [`Bus::add_cycles`].
    fn run_half_frame(&mut self) {
        let ptr: *mut Self = self;
        // SAFETY: `self` outlives the call and the CPU only accesses it
        // through the `Bus` trait for the duration of `run`; same pattern
        // used by the other machines in this workspace to let the system be
        // both the `Machine` owner and its own `Bus`.
        unsafe {
            let bus = &mut *ptr as &mut dyn Bus<Address = u16, Data = u8>;
            self.cpu.run(bus, BusMaster::Cpu(0), INTERRUPT_CYCLE_INTERVAL);
        }
    }
}

impl Bus for InvadersSystem {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        match (addr >> 12) & 0xF {
            0x0 | 0x1 => self.rom[(addr & 0x1FFF) as usize],
            0x2..=0x5 => self.ram[(addr & 0x1FFF) as usize],
            _ => {
                log::warn!("unhandled read: {addr:#06X}");
                0xFF
            }
        }
    }

    fn write(&mut self, _master: BusMaster, addr: u16, value: u8) {
        match (addr >> 12) & 0xF {
            0x0 | 0x1 => {}
            0x2..=0x5 => self.ram[(addr & 0x1FFF) as usize] = value,
            _ => log::warn!("unhandled write: {addr:#06X} <- {value:#04X}"),
        }
    }

    fn io_read(&mut self, _master: BusMaster, port: u16) -> u8 {
        match port {
            0 => self.in0 | 0b0000_1110,
            1 => self.in1 | 0b0000_1000,
            2 => self.in2,
            3 => self.shift_read(),
            _ => {
                log::warn!("unhandled I/O port read: {port:#04X}");
                0xFF
            }
        }
    }

    fn io_write(&mut self, _master: BusMaster, port: u16, value: u8) {
        match port {
            2 => self.shift_offset = value & 0x07,
            3 => {} // SOUND1: audio out of scope, discarded.
            4 => self.shift_value = ((value as u16) << 8) | (self.shift_value >> 8),
            5 => {} // SOUND2: discarded.
            6 => {} // WATCHDOG: discarded.
            _ => log::warn!("unhandled I/O port write {port:#04X} <- {value:#04X}"),
        }
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState::default()
    }

    fn add_cycles(&mut self, _master: BusMaster, cycles: i64) {
        self.cycles_to_next_interrupt -= cycles;
        if self.cycles_to_next_interrupt > 0 {
            return;
        }

        self.last_was_vblank = !self.last_was_vblank;
        self.cycles_to_next_interrupt += INTERRUPT_CYCLE_INTERVAL;
        self.cpu
            .request_interrupt(if self.last_was_vblank { 2 } else { 1 });
        if self.last_was_vblank {
            self.render();
        }
    }
}

impl Machine for InvadersSystem {
    fn display_size(&self) -> (u32, u32) {
        (DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32)
    }

    fn run_frame(&mut self) {
        // Two half-frame slices: mid-screen interrupt, then vblank.
        self.run_half_frame();
        self.run_half_frame();
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        buffer[..self.framebuffer.len()].copy_from_slice(&self.framebuffer);
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            // Shared coin-cabinet wiring: the same physical P1 switches also
            // appear on INP0 (per hardware; see DESIGN.md).
            INPUT_P1_LEFT => {
                set_bit(&mut self.in1, 5, pressed);
                set_bit(&mut self.in0, 5, pressed);
            }
            INPUT_P1_RIGHT => {
                set_bit(&mut self.in1, 6, pressed);
                set_bit(&mut self.in0, 6, pressed);
            }
            INPUT_P1_FIRE => {
                set_bit(&mut self.in1, 4, pressed);
                set_bit(&mut self.in0, 4, pressed);
            }
            INPUT_P2_LEFT => set_bit(&mut self.in2, 5, pressed),
            INPUT_P2_RIGHT => set_bit(&mut self.in2, 6, pressed),
            INPUT_P2_FIRE => set_bit(&mut self.in2, 4, pressed),
            INPUT_CREDIT => set_bit(&mut self.in1, 0, pressed),
            // The cabinet wires each start button to both INP1 and INP2 at
            // the same bit position (see DESIGN.md for the source union
            // these bits were lifted from).
            INPUT_P1_START => {
                set_bit(&mut self.in1, 2, pressed);
                set_bit(&mut self.in2, 2, pressed);
            }
            INPUT_P2_START => {
                set_bit(&mut self.in1, 1, pressed);
                set_bit(&mut self.in2, 1, pressed);
            }
            INPUT_TILT => set_bit(&mut self.in2, 2, pressed),
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        INVADERS_INPUT_MAP
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.ram = [0; 0x2000];
        self.in0 = 0;
        self.in1 = 0;
        self.in2 = 0;
        self.shift_value = 0;
        self.shift_offset = 0;
        self.cycles_to_next_interrupt = INTERRUPT_CYCLE_INTERVAL;
        self.last_was_vblank = true;
        self.framebuffer.fill(0);
        self.frames_rendered = 0;
    }
}

fn set_bit(reg: &mut u8, bit: u8, value: bool) {
    if value {
        *reg |= 1 << bit;
    } else {
        *reg &= !(1 << bit);
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_machine(
    rom_set: &RomSet,
) -> Result<Box<dyn phosphor_core::core::machine::Machine>, RomLoadError> {
    let mut sys = InvadersSystem::new();
    sys.load_rom_set(rom_set)?;
    Ok(Box::new(sys))
}

inventory::submit! {
    MachineEntry::new("invaders", "invaders", create_machine)
}
