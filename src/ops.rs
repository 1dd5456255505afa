use std::fmt;

/// Every value of the 4-bit opcode field.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Branch on condition code
    BR = 0x0,
    ADD = 0x1,
    /// Load PC-relative
    LD = 0x2,
    /// Store PC-relative
    ST = 0x3,
    /// Jump to subroutine, saving the return address in R7
    JSR = 0x4,
    AND = 0x5,
    /// Load base+offset
    LDR = 0x6,
    /// Store base+offset
    STR = 0x7,
    /// Return from interrupt. Not implemented.
    RTI = 0x8,
    NOT = 0x9,
    /// Load indirect
    LDI = 0xA,
    /// Store indirect
    STI = 0xB,
    /// Jump to address in register. `RET` is `JMP R7`.
    JMP = 0xC,
    /// Reserved.
    RES = 0xD,
    /// Load effective address
    LEA = 0xE,
    TRAP = 0xF,
}

impl Opcode {
    const ALL: [Opcode; 16] = [
        Opcode::BR,
        Opcode::ADD,
        Opcode::LD,
        Opcode::ST,
        Opcode::JSR,
        Opcode::AND,
        Opcode::LDR,
        Opcode::STR,
        Opcode::RTI,
        Opcode::NOT,
        Opcode::LDI,
        Opcode::STI,
        Opcode::JMP,
        Opcode::RES,
        Opcode::LEA,
        Opcode::TRAP,
    ];

    /// Opcode held in the top 4 bits of an instruction.
    #[inline]
    pub fn of(instr: u16) -> Self {
        Self::ALL[(instr >> 12) as usize]
    }

    /// Whether the opcode has no defined behaviour on this machine.
    pub fn is_reserved(self) -> bool {
        matches!(self, Opcode::RTI | Opcode::RES)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::BR => "BR",
            Opcode::ADD => "ADD",
            Opcode::LD => "LD",
            Opcode::ST => "ST",
            Opcode::JSR => "JSR",
            Opcode::AND => "AND",
            Opcode::LDR => "LDR",
            Opcode::STR => "STR",
            Opcode::RTI => "RTI",
            Opcode::NOT => "NOT",
            Opcode::LDI => "LDI",
            Opcode::STI => "STI",
            Opcode::JMP => "JMP",
            Opcode::RES => "RES",
            Opcode::LEA => "LEA",
            Opcode::TRAP => "TRAP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_nibble_has_an_opcode() {
        for nibble in 0..16u16 {
            let op = Opcode::of(nibble << 12 | 0x0ABC);
            assert_eq!(op as u16, nibble);
        }
    }

    #[test]
    fn reserved_opcodes() {
        let reserved: Vec<_> = Opcode::ALL
            .iter()
            .filter(|op| op.is_reserved())
            .map(|op| op.mnemonic())
            .collect();
        assert_eq!(reserved, ["RTI", "RES"]);
        assert_eq!(format!("{:<5}|", Opcode::LD), "LD   |");
    }
}
