//! Opcode descriptor table.
//!
//! A flat 256-entry table indexed by the opcode byte. Each descriptor names
//! the instruction, its addressing mode, the base cycle cost, and whether
//! crossing a page during indexing costs an extra cycle. Opcode bytes with
//! no documented instruction resolve to the invalid descriptor.

/// Instruction mnemonics (documented opcodes only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    Invalid,
}

/// Addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// $nnnn
    Abs,
    /// $nnnn,X
    AbsX,
    /// $nnnn,Y
    AbsY,
    /// ($nnnn) — JMP only, high byte fetch wraps within the page
    Ind,
    /// ($nn),Y
    IndY,
    /// ($nn,X)
    XInd,
    /// $nn
    Zpg,
    /// $nn,X (wraps within the zero page)
    ZpgX,
    /// $nn,Y (wraps within the zero page)
    ZpgY,
    /// Branch offset (-128..=127)
    Rel,
    /// #$nn
    Imm,
    /// Operates on A
    Acc,
    /// No operand
    Impl,
    Invalid,
}

/// One opcode descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub instr: Instr,
    pub mode: AddrMode,
    /// Base cycle cost; penalties are added during execution.
    pub cycles: u8,
    /// Add a cycle when indexing crosses a page (absX/absY/indY reads).
    pub page_penalty: bool,
}

const INVALID: Opcode = Opcode {
    instr: Instr::Invalid,
    mode: AddrMode::Invalid,
    cycles: 0,
    page_penalty: false,
};

const fn op(instr: Instr, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { instr, mode, cycles, page_penalty: false }
}

const fn op_pg(instr: Instr, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode { instr, mode, cycles, page_penalty: true }
}

const fn build_table() -> [Opcode; 256] {
    use AddrMode::*;
    use Instr::*;

    let mut t = [INVALID; 256];

    // $0x
    t[0x00] = op(Brk, Impl, 7);
    t[0x01] = op(Ora, XInd, 6);
    t[0x05] = op(Ora, Zpg, 3);
    t[0x06] = op(Asl, Zpg, 5);
    t[0x08] = op(Php, Impl, 3);
    t[0x09] = op(Ora, Imm, 2);
    t[0x0A] = op(Asl, Acc, 2);
    t[0x0D] = op(Ora, Abs, 4);
    t[0x0E] = op(Asl, Abs, 6);

    // $1x
    t[0x10] = op(Bpl, Rel, 2);
    t[0x11] = op_pg(Ora, IndY, 5);
    t[0x15] = op(Ora, ZpgX, 4);
    t[0x16] = op(Asl, ZpgX, 6);
    t[0x18] = op(Clc, Impl, 2);
    t[0x19] = op_pg(Ora, AbsY, 4);
    t[0x1D] = op_pg(Ora, AbsX, 4);
    t[0x1E] = op(Asl, AbsX, 7);

    // $2x
    t[0x20] = op(Jsr, Abs, 6);
    t[0x21] = op(And, XInd, 6);
    t[0x24] = op(Bit, Zpg, 3);
    t[0x25] = op(And, Zpg, 3);
    t[0x26] = op(Rol, Zpg, 5);
    t[0x28] = op(Plp, Impl, 4);
    t[0x29] = op(And, Imm, 2);
    t[0x2A] = op(Rol, Acc, 2);
    t[0x2C] = op(Bit, Abs, 4);
    t[0x2D] = op(And, Abs, 4);
    t[0x2E] = op(Rol, Abs, 6);

    // $3x
    t[0x30] = op(Bmi, Rel, 2);
    t[0x31] = op_pg(And, IndY, 5);
    t[0x35] = op(And, ZpgX, 4);
    t[0x36] = op(Rol, ZpgX, 6);
    t[0x38] = op(Sec, Impl, 2);
    t[0x39] = op_pg(And, AbsY, 4);
    t[0x3D] = op_pg(And, AbsX, 4);
    t[0x3E] = op(Rol, AbsX, 7);

    // $4x
    t[0x40] = op(Rti, Impl, 6);
    t[0x41] = op(Eor, XInd, 6);
    t[0x45] = op(Eor, Zpg, 3);
    t[0x46] = op(Lsr, Zpg, 5);
    t[0x48] = op(Pha, Impl, 3);
    t[0x49] = op(Eor, Imm, 2);
    t[0x4A] = op(Lsr, Acc, 2);
    t[0x4C] = op(Jmp, Abs, 3);
    t[0x4D] = op(Eor, Abs, 4);
    t[0x4E] = op(Lsr, Abs, 6);

    // $5x
    t[0x50] = op(Bvc, Rel, 2);
    t[0x51] = op_pg(Eor, IndY, 5);
    t[0x55] = op(Eor, ZpgX, 4);
    t[0x56] = op(Lsr, ZpgX, 6);
    t[0x58] = op(Cli, Impl, 2);
    t[0x59] = op_pg(Eor, AbsY, 4);
    t[0x5D] = op_pg(Eor, AbsX, 4);
    t[0x5E] = op(Lsr, AbsX, 7);

    // $6x
    t[0x60] = op(Rts, Impl, 6);
    t[0x61] = op(Adc, XInd, 6);
    t[0x65] = op(Adc, Zpg, 3);
    t[0x66] = op(Ror, Zpg, 5);
    t[0x68] = op(Pla, Impl, 4);
    t[0x69] = op(Adc, Imm, 2);
    t[0x6A] = op(Ror, Acc, 2);
    t[0x6C] = op(Jmp, Ind, 5);
    t[0x6D] = op(Adc, Abs, 4);
    t[0x6E] = op(Ror, Abs, 6);

    // $7x
    t[0x70] = op(Bvs, Rel, 2);
    t[0x71] = op_pg(Adc, IndY, 5);
    t[0x75] = op(Adc, ZpgX, 4);
    t[0x76] = op(Ror, ZpgX, 6);
    t[0x78] = op(Sei, Impl, 2);
    t[0x79] = op_pg(Adc, AbsY, 4);
    t[0x7D] = op_pg(Adc, AbsX, 4);
    t[0x7E] = op(Ror, AbsX, 7);

    // $8x
    t[0x81] = op(Sta, XInd, 6);
    t[0x84] = op(Sty, Zpg, 3);
    t[0x85] = op(Sta, Zpg, 3);
    t[0x86] = op(Stx, Zpg, 3);
    t[0x88] = op(Dey, Impl, 2);
    t[0x8A] = op(Txa, Impl, 2);
    t[0x8C] = op(Sty, Abs, 4);
    t[0x8D] = op(Sta, Abs, 4);
    t[0x8E] = op(Stx, Abs, 4);

    // $9x
    t[0x90] = op(Bcc, Rel, 2);
    t[0x91] = op(Sta, IndY, 6);
    t[0x94] = op(Sty, ZpgX, 4);
    t[0x95] = op(Sta, ZpgX, 4);
    t[0x96] = op(Stx, ZpgY, 4);
    t[0x98] = op(Tya, Impl, 2);
    t[0x99] = op(Sta, AbsY, 5);
    t[0x9A] = op(Txs, Impl, 2);
    t[0x9D] = op(Sta, AbsX, 5);

    // $Ax
    t[0xA0] = op(Ldy, Imm, 2);
    t[0xA1] = op(Lda, XInd, 6);
    t[0xA2] = op(Ldx, Imm, 2);
    t[0xA4] = op(Ldy, Zpg, 3);
    t[0xA5] = op(Lda, Zpg, 3);
    t[0xA6] = op(Ldx, Zpg, 3);
    t[0xA8] = op(Tay, Impl, 2);
    t[0xA9] = op(Lda, Imm, 2);
    t[0xAA] = op(Tax, Impl, 2);
    t[0xAC] = op(Ldy, Abs, 4);
    t[0xAD] = op(Lda, Abs, 4);
    t[0xAE] = op(Ldx, Abs, 4);

    // $Bx
    t[0xB0] = op(Bcs, Rel, 2);
    t[0xB1] = op_pg(Lda, IndY, 5);
    t[0xB4] = op(Ldy, ZpgX, 4);
    t[0xB5] = op(Lda, ZpgX, 4);
    t[0xB6] = op(Ldx, ZpgY, 4);
    t[0xB8] = op(Clv, Impl, 2);
    t[0xB9] = op_pg(Lda, AbsY, 4);
    t[0xBA] = op(Tsx, Impl, 2);
    t[0xBC] = op_pg(Ldy, AbsX, 4);
    t[0xBD] = op_pg(Lda, AbsX, 4);
    t[0xBE] = op_pg(Ldx, AbsY, 4);

    // $Cx
    t[0xC0] = op(Cpy, Imm, 2);
    t[0xC1] = op(Cmp, XInd, 6);
    t[0xC4] = op(Cpy, Zpg, 3);
    t[0xC5] = op(Cmp, Zpg, 3);
    t[0xC6] = op(Dec, Zpg, 5);
    t[0xC8] = op(Iny, Impl, 2);
    t[0xC9] = op(Cmp, Imm, 2);
    t[0xCA] = op(Dex, Impl, 2);
    t[0xCC] = op(Cpy, Abs, 4);
    t[0xCD] = op(Cmp, Abs, 4);
    t[0xCE] = op(Dec, Abs, 6);

    // $Dx
    t[0xD0] = op(Bne, Rel, 2);
    t[0xD1] = op_pg(Cmp, IndY, 5);
    t[0xD5] = op(Cmp, ZpgX, 4);
    t[0xD6] = op(Dec, ZpgX, 6);
    t[0xD8] = op(Cld, Impl, 2);
    t[0xD9] = op_pg(Cmp, AbsY, 4);
    t[0xDD] = op_pg(Cmp, AbsX, 4);
    t[0xDE] = op(Dec, AbsX, 7);

    // $Ex
    t[0xE0] = op(Cpx, Imm, 2);
    t[0xE1] = op(Sbc, XInd, 6);
    t[0xE4] = op(Cpx, Zpg, 3);
    t[0xE5] = op(Sbc, Zpg, 3);
    t[0xE6] = op(Inc, Zpg, 5);
    t[0xE8] = op(Inx, Impl, 2);
    t[0xE9] = op(Sbc, Imm, 2);
    t[0xEA] = op(Nop, Impl, 2);
    t[0xEC] = op(Cpx, Abs, 4);
    t[0xED] = op(Sbc, Abs, 4);
    t[0xEE] = op(Inc, Abs, 6);

    // $Fx
    t[0xF0] = op(Beq, Rel, 2);
    t[0xF1] = op_pg(Sbc, IndY, 5);
    t[0xF5] = op(Sbc, ZpgX, 4);
    t[0xF6] = op(Inc, ZpgX, 6);
    t[0xF8] = op(Sed, Impl, 2);
    t[0xF9] = op_pg(Sbc, AbsY, 4);
    t[0xFD] = op_pg(Sbc, AbsX, 4);
    t[0xFE] = op(Inc, AbsX, 7);

    t
}

/// The 256-entry descriptor table, indexed by opcode byte.
pub static OPCODES: [Opcode; 256] = build_table();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_opcode_count() {
        let documented = OPCODES
            .iter()
            .filter(|o| !matches!(o.instr, Instr::Invalid))
            .count();
        assert_eq!(documented, 151);
    }

    #[test]
    fn test_invalid_entries_are_zero_cycle() {
        for opcode in OPCODES.iter() {
            if matches!(opcode.instr, Instr::Invalid) {
                assert_eq!(opcode.cycles, 0);
                assert!(!opcode.page_penalty);
            } else {
                assert!(opcode.cycles >= 2 && opcode.cycles <= 7);
            }
        }
    }

    #[test]
    fn test_page_penalty_only_on_indexed_reads() {
        for opcode in OPCODES.iter() {
            if opcode.page_penalty {
                assert!(matches!(
                    opcode.mode,
                    AddrMode::AbsX | AddrMode::AbsY | AddrMode::IndY
                ));
            }
        }
    }

    #[test]
    fn test_spot_checks() {
        assert!(matches!(OPCODES[0xA9].instr, Instr::Lda));
        assert!(matches!(OPCODES[0xA9].mode, AddrMode::Imm));
        assert_eq!(OPCODES[0xA9].cycles, 2);

        assert!(matches!(OPCODES[0x6C].instr, Instr::Jmp));
        assert!(matches!(OPCODES[0x6C].mode, AddrMode::Ind));
        assert_eq!(OPCODES[0x6C].cycles, 5);

        // STA never takes the read-path page penalty
        assert!(!OPCODES[0x9D].page_penalty);
        assert_eq!(OPCODES[0x9D].cycles, 5);
    }
}
