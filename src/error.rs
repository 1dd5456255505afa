use std::fmt;
use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Direction of a memory access, used to tell read and write faults apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// Every condition which stops the emulator.
///
/// Unknown opcodes and trap vectors are not errors: they are reported and execution continues,
/// unless strict mode turns reserved opcodes into [`MachineError::ReservedOpcode`].
#[derive(Debug, Error, Diagnostic)]
pub enum MachineError {
    #[error("Memory {access} out of range at address {address}")]
    #[diagnostic(
        code(runtime::address),
        help("addresses must lie between 0 and 65535 (0xFFFF); the program has likely lost control flow")
    )]
    AddressOutOfRange { address: i32, access: Access },

    #[error("Failed to load image {}", path.display())]
    #[diagnostic(
        code(loader::image),
        help("check that the path exists and points to a readable object file")
    )]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No object image was provided")]
    #[diagnostic(code(cli::no_image), help("pass the path of an object image, eg. `lc3vm run hello.obj`"))]
    NoImage,

    #[error("Console I/O failed: {0}")]
    #[diagnostic(code(runtime::console))]
    Console(#[from] io::Error),

    #[error("Encountered reserved opcode {opcode:#03x} at address {address:#06x}")]
    #[diagnostic(
        code(runtime::reserved),
        help("RTI and RES are not implemented; run without `--strict` to skip them")
    )]
    ReservedOpcode { opcode: u16, address: u16 },
}

impl MachineError {
    /// Exit code reported to the host for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MachineError::ImageLoad { .. } => 1,
            MachineError::NoImage => 2,
            MachineError::AddressOutOfRange {
                access: Access::Write,
                ..
            } => 3,
            MachineError::AddressOutOfRange {
                access: Access::Read,
                ..
            } => 4,
            MachineError::Console(_) => 5,
            MachineError::ReservedOpcode { .. } => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            MachineError::ImageLoad {
                path: PathBuf::from("missing.obj"),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
            MachineError::NoImage,
            MachineError::AddressOutOfRange {
                address: 0x10000,
                access: Access::Write,
            },
            MachineError::AddressOutOfRange {
                address: -1,
                access: Access::Read,
            },
            MachineError::Console(io::Error::from(io::ErrorKind::BrokenPipe)),
            MachineError::ReservedOpcode {
                opcode: 0x8,
                address: 0x3000,
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(MachineError::exit_code).collect();
        assert!(codes.iter().all(|code| *code != 0));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn message_names_address() {
        let error = MachineError::AddressOutOfRange {
            address: 65536,
            access: Access::Read,
        };
        assert_eq!(
            error.to_string(),
            "Memory read out of range at address 65536"
        );
    }
}
