//! Effective-address computation and stack access.

use crate::table::{AddrMode, Opcode};
use crate::Rp2a03;
use nes_core::Bus;

impl Rp2a03 {
    /// Fetch the next byte at PC and advance.
    pub(crate) fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    /// Fetch a 16-bit little-endian word at PC.
    pub(crate) fn fetch16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Read a 16-bit word whose high-byte fetch wraps within the page.
    /// Replicates the JMP ($xxFF) hardware bug.
    fn read16_pagewrap(bus: &mut impl Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF));
        u16::from_le_bytes([lo, hi])
    }

    /// Resolve the operand address for `opcode`, consuming operand bytes and
    /// charging the page-cross penalty where the descriptor asks for one.
    ///
    /// `Rel` and `Imm` yield the address of the operand byte itself; `Acc`
    /// and `Impl` have no operand and yield a sentinel 0.
    pub(crate) fn operand_addr(&mut self, bus: &mut impl Bus, opcode: &Opcode) -> u16 {
        let addr = match opcode.mode {
            AddrMode::Abs => self.fetch16(bus),
            AddrMode::AbsX => self.fetch16(bus).wrapping_add(self.x as u16),
            AddrMode::AbsY => self.fetch16(bus).wrapping_add(self.y as u16),
            AddrMode::Ind => {
                let ptr = self.fetch16(bus);
                Self::read16_pagewrap(bus, ptr)
            }
            AddrMode::IndY => {
                let zp = self.fetch(bus);
                bus.read16_zpg(zp).wrapping_add(self.y as u16)
            }
            AddrMode::XInd => {
                let zp = self.fetch(bus).wrapping_add(self.x);
                bus.read16_zpg(zp)
            }
            AddrMode::Zpg => self.fetch(bus) as u16,
            AddrMode::ZpgX => self.fetch(bus).wrapping_add(self.x) as u16,
            AddrMode::ZpgY => self.fetch(bus).wrapping_add(self.y) as u16,
            AddrMode::Rel | AddrMode::Imm => {
                let at = self.pc;
                self.pc = self.pc.wrapping_add(1);
                at
            }
            AddrMode::Acc | AddrMode::Impl => 0,
            AddrMode::Invalid => {
                log::error!("invalid addressing mode in descriptor table");
                0
            }
        };

        if opcode.page_penalty {
            // Only indexed reads can pay this; the base address is recovered
            // by undoing the index.
            let crossed = match opcode.mode {
                AddrMode::AbsX => Self::page_crossed(addr.wrapping_sub(self.x as u16), addr),
                AddrMode::AbsY | AddrMode::IndY => {
                    Self::page_crossed(addr.wrapping_sub(self.y as u16), addr)
                }
                _ => false,
            };
            if crossed {
                self.cycles += 1;
            }
        }

        addr
    }

    pub(crate) fn page_crossed(a: u16, b: u16) -> bool {
        (a & 0xFF00) != (b & 0xFF00)
    }

    // =========================================================================
    // Stack access ($0100-$01FF)
    // =========================================================================

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | self.s as u16, value);
        self.s = self.s.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(0x0100 | self.s as u16)
    }

    /// Push a 16-bit word, high byte first.
    pub(crate) fn push16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    /// Pull a 16-bit word, low byte first.
    pub(crate) fn pull16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}
