use std::cmp::Ordering;
use std::fmt;

/// Address at which execution starts when no image supplies an origin.
pub const DEFAULT_START: u16 = 0x3000;

/// Condition code, set using the result of the previous flag-updating instruction.
///
/// Discriminants match the `nzp` mask layout of a `BR` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Negative
    N = 0b100,
    /// Zero
    Z = 0b010,
    /// Positive
    P = 0b001,
}

impl Condition {
    /// Classify a word by its two's-complement sign.
    #[inline]
    pub fn from_value(val: u16) -> Self {
        match (val as i16).cmp(&0) {
            Ordering::Less => Condition::N,
            Ordering::Equal => Condition::Z,
            Ordering::Greater => Condition::P,
        }
    }

    /// Whether this condition is selected by an `nzp` mask.
    #[inline]
    pub fn matches(self, mask: u16) -> bool {
        self as u16 & mask != 0
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::N => "N",
            Condition::Z => "Z",
            Condition::P => "P",
        };
        write!(f, "{name}")
    }
}

/// One of the 8 general purpose registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Register(u8);

impl Register {
    pub const R0: Register = Register(0);
    pub const R7: Register = Register(7);

    /// Register index from a 3-bit instruction field. Higher bits are discarded.
    #[inline]
    pub fn from_field(field: u16) -> Self {
        Register((field & 0b111) as u8)
    }

    /// Fails for indices outside of 0-7.
    pub fn new(index: usize) -> Option<Self> {
        (index < 8).then_some(Register(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Register file: general registers, program counter and condition code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    /// 8x 16-bit registers
    gpr: [u16; 8],
    /// Program counter
    pc: u16,
    /// Condition code
    cond: Condition,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            gpr: [0; 8],
            pc: DEFAULT_START,
            cond: Condition::Z,
        }
    }

    #[inline]
    pub fn get(&self, reg: Register) -> u16 {
        self.gpr[reg.index()]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, val: u16) {
        self.gpr[reg.index()] = val;
    }

    /// Set a register and derive the condition code from its new value.
    #[inline]
    pub fn set_with_flags(&mut self, reg: Register, val: u16) {
        self.set(reg, val);
        self.update_flags(reg);
    }

    /// Derive the condition code from the current value of `reg`.
    #[inline]
    pub fn update_flags(&mut self, reg: Register) {
        self.cond = Condition::from_value(self.get(reg));
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Return the current PC and advance it by one word, wrapping at the end of memory.
    #[inline]
    pub fn fetch_pc(&mut self) -> u16 {
        let pc = self.pc;
        self.pc = pc.wrapping_add(1);
        pc
    }

    #[inline]
    pub fn cond(&self) -> Condition {
        self.cond
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        self.gpr
            .iter()
            .enumerate()
            .map(|(i, val)| (Register(i as u8), *val))
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
