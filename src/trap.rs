//! Console service routines reached through `TRAP`.

use colored::Colorize;

use crate::console::Console;
use crate::error::MachineError;
use crate::output::{self, Output};
use crate::registers::Register;
use crate::runtime::Machine;

/// Value stored in R0 when a read finds the end of input.
pub const END_OF_INPUT: u16 = 0xFFFF;

/// Prompt printed by `IN`.
pub const IN_PROMPT: &str = "Enter a character: ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapVector {
    /// Read a character into R0, without echo.
    Getc = 0x20,
    /// Write the character in the low byte of R0.
    Out = 0x21,
    /// Write the string at R0, one character per word.
    Puts = 0x22,
    /// Prompt, then read a character into R0 and echo it.
    In = 0x23,
    /// Write the string at R0, two characters per word.
    Putsp = 0x24,
    /// Stop the machine.
    Halt = 0x25,
}

impl TryFrom<u16> for TrapVector {
    type Error = ();
    fn try_from(instr: u16) -> Result<Self, Self::Error> {
        Ok(match instr & 0xFF {
            0x20 => TrapVector::Getc,
            0x21 => TrapVector::Out,
            0x22 => TrapVector::Puts,
            0x23 => TrapVector::In,
            0x24 => TrapVector::Putsp,
            0x25 => TrapVector::Halt,
            _ => return Err(()),
        })
    }
}

impl<C: Console> Machine<C> {
    pub(crate) fn trap(&mut self, instr: u16) -> Result<(), MachineError> {
        let Ok(vector) = TrapVector::try_from(instr) else {
            let address = self.pc().wrapping_sub(1);
            output::warning(format_args!(
                "unknown trap vector 0x{:02x} (0x{instr:04x}) at 0x{address:04x}, skipping",
                instr & 0xFF
            ));
            return Ok(());
        };

        match vector {
            TrapVector::Getc => {
                let ch = self.read_char()?;
                self.registers_mut().set(Register::R0, ch);
            }
            TrapVector::Out => {
                let ch = (self.registers().get(Register::R0) & 0xFF) as u8;
                self.console_mut().write_bytes(&[ch])?;
            }
            TrapVector::Puts => {
                let string = self.collect_string(|word, out| out.push((word & 0xFF) as u8))?;
                self.console_mut().write_bytes(&string)?;
            }
            TrapVector::In => {
                self.console_mut().write_str(IN_PROMPT)?;
                self.console_mut().flush()?;
                let ch = self.read_char()?;
                if ch != END_OF_INPUT {
                    self.console_mut().write_bytes(&[ch as u8])?;
                }
                self.registers_mut().set(Register::R0, ch);
            }
            TrapVector::Putsp => {
                let string = self.collect_string(|word, out| {
                    out.push((word & 0xFF) as u8);
                    let high = (word >> 8) as u8;
                    if high != 0 {
                        out.push(high);
                    }
                })?;
                self.console_mut().write_bytes(&string)?;
            }
            TrapVector::Halt => {
                let notice = if Output::is_minimal() {
                    "Halted".to_string()
                } else {
                    "Halted".cyan().to_string()
                };
                self.console_mut().write_str(&format!("\n{notice}\n"))?;
                self.halt();
            }
        }
        self.console_mut().flush()?;
        Ok(())
    }

    fn read_char(&mut self) -> Result<u16, MachineError> {
        Ok(match self.console_mut().read_byte()? {
            Some(byte) => byte as u16,
            None => END_OF_INPUT,
        })
    }

    /// Bytes of the zero-terminated string at R0, unpacked from each word by `unpack`.
    fn collect_string<F>(&self, unpack: F) -> Result<Vec<u8>, MachineError>
    where
        F: Fn(u16, &mut Vec<u8>),
    {
        let mut out = Vec::new();
        let mut addr = self.registers().get(Register::R0) as i32;
        loop {
            let word = self.memory().read(addr)?;
            if word == 0 {
                return Ok(out);
            }
            unpack(word, &mut out);
            addr += 1;
        }
    }
}
