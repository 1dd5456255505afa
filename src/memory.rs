use std::fmt;

use crate::error::{Access, MachineError};

/// LC3 can address 128KB of memory.
pub const MEMORY_MAX: usize = 0x10000;

/// Flat word-addressed system memory.
///
/// Addresses are accepted as wide signed integers so that arithmetic which runs off either end
/// of memory is caught here instead of wrapping around.
#[derive(Clone)]
pub struct Memory {
    /// 128KB in size, boxed to keep it off the stack.
    words: Box<[u16; MEMORY_MAX]>,
}

impl Memory {
    /// Zero-filled memory.
    pub fn new() -> Self {
        Memory {
            words: Box::new([0; MEMORY_MAX]),
        }
    }

    pub fn read(&self, address: impl Into<i32>) -> Result<u16, MachineError> {
        let index = Self::index(address.into(), Access::Read)?;
        Ok(self.words[index])
    }

    pub fn write(&mut self, address: impl Into<i32>, value: u16) -> Result<(), MachineError> {
        let index = Self::index(address.into(), Access::Write)?;
        self.words[index] = value;
        Ok(())
    }

    /// Copy `words` into memory starting at `origin`, stopping at the end of memory.
    ///
    /// Returns the amount of words written.
    pub fn load(&mut self, origin: u16, words: &[u16]) -> usize {
        let origin = origin as usize;
        let count = words.len().min(MEMORY_MAX - origin);
        self.words[origin..origin + count].copy_from_slice(&words[..count]);
        count
    }

    /// View of the words in `[start, start + len)`, clamped to the end of memory.
    #[cfg(test)]
    pub fn slice(&self, start: u16, len: usize) -> &[u16] {
        let start = start as usize;
        let end = start.saturating_add(len).min(MEMORY_MAX);
        &self.words[start..end]
    }

    fn index(address: i32, access: Access) -> Result<usize, MachineError> {
        match usize::try_from(address) {
            Ok(index) if index < MEMORY_MAX => Ok(index),
            _ => Err(MachineError::AddressOutOfRange { address, access }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.words.iter().filter(|word| **word != 0).count();
        f.debug_struct("Memory").field("nonzero_words", &used).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unloaded_memory_reads_zero() {
        let mem = Memory::new();
        assert_eq!(mem.read(0u16).unwrap(), 0);
        assert_eq!(mem.read(0x3000).unwrap(), 0);
        assert_eq!(mem.read(0xFFFF).unwrap(), 0);
    }

    #[test]
    fn last_address_is_valid() {
        let mut mem = Memory::new();
        mem.write(0xFFFF, 0xBEEF).unwrap();
        assert_eq!(mem.read(0xFFFF).unwrap(), 0xBEEF);
    }

    #[test]
    fn rejects_addresses_outside_memory() {
        let mut mem = Memory::new();
        for address in [0x10000, -1, i32::MAX, i32::MIN] {
            match mem.read(address) {
                Err(MachineError::AddressOutOfRange {
                    address: a,
                    access: Access::Read,
                }) => assert_eq!(a, address),
                other => panic!("expected read fault at {address}, got {other:?}"),
            }
            match mem.write(address, 1) {
                Err(MachineError::AddressOutOfRange {
                    address: a,
                    access: Access::Write,
                }) => assert_eq!(a, address),
                other => panic!("expected write fault at {address}, got {other:?}"),
            }
        }
    }

    #[test]
    fn load_is_capped_at_end_of_memory() {
        let mut mem = Memory::new();
        assert_eq!(mem.load(0x3000, &[0x1234, 0x5678]), 2);
        assert_eq!(mem.slice(0x3000, 3), &[0x1234, 0x5678, 0]);

        assert_eq!(mem.load(0xFFFE, &[1, 2, 3, 4]), 2);
        assert_eq!(mem.read(0xFFFE).unwrap(), 1);
        assert_eq!(mem.read(0xFFFF).unwrap(), 2);
        // Nothing wrapped around to the start
        assert_eq!(mem.read(0u16).unwrap(), 0);
    }
}
