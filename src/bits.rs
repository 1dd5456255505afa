//! Bit-level helpers shared by every instruction handler.

/// Sign-extend the low `bits` bits of `val` to a full word.
///
/// Bits above the field are ignored, so a raw instruction can be passed directly with the field
/// width. `bits` must be the width of the field, not the shift used to reach it.
#[inline]
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits < 16);
    // Sign bit
    let sign = val & (1u16 << (bits - 1));
    // Bits lower than sign bit
    let magnitude = val & ((1u16 << bits) - 1);
    // Positive input: all bits unset; 0x0000
    // Negative input: sign bit and above will be set, lower bits will be reset
    //      Eg. bits=14 -> 0xE000
    let sign_extension = (!sign).wrapping_add(1); // sign * -1
    magnitude | sign_extension
}

/// 3-bit register field starting at bit `shift`.
#[inline]
pub fn reg_field(instr: u16, shift: u32) -> u16 {
    (instr >> shift) & 0b111
}

/// Whether bit `n` of `instr` is set.
#[inline]
pub fn bit(instr: u16, n: u32) -> bool {
    instr & (1 << n) != 0
}

/// Apply a sign-extended offset to a base address without wrapping.
///
/// The result may fall outside of memory; [`crate::memory::Memory`] rejects such addresses
/// instead of letting them alias.
#[inline]
pub fn effective_address(base: u16, offset: u16) -> i32 {
    base as i32 + offset as i16 as i32
}
