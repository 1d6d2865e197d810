//! Control flow: jumps, calls, returns, RST, XTHL, and condition decoding.

use super::{Flag, I8080};
use crate::core::{Bus, BusMaster};

impl I8080 {
    pub(super) fn op_jmp(&mut self, target: u16) {
        self.pc = target;
    }

    pub(super) fn op_call<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
        target: u16,
    ) {
        let ret_addr = self.pc;
        self.push_word(bus, master, ret_addr);
        self.op_jmp(target);
    }

    pub(super) fn op_ret<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.pc = self.pop_word(bus, master);
    }

    pub(super) fn op_xthl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) {
        let hl = self.get_hl();
        let new_hl = self.read_word(bus, master, self.sp);
        self.set_hl(new_hl);
        self.write_word(bus, master, self.sp, hl);
    }

    /// Decodes the condition field (bits 3-4) shared by conditional JMP,
    /// CALL, and RET opcodes: NZ, Z, NC, C, PO, PE, P, M in that order.
    pub(super) fn branch_condition(&self, opcode: u8) -> bool {
        match (opcode >> 3) & 0x07 {
            0 => !self.flag(Flag::Z),
            1 => self.flag(Flag::Z),
            2 => !self.flag(Flag::C),
            3 => self.flag(Flag::C),
            4 => !self.flag(Flag::P),
            5 => self.flag(Flag::P),
            6 => !self.flag(Flag::S),
            _ => self.flag(Flag::S),
        }
    }
}
