// Machine state
mod memory;
pub use memory::{Memory, MEMORY_MAX};
mod registers;
pub use registers::{Condition, Register, Registers, DEFAULT_START};

// Execution
mod bits;
pub use bits::sign_extend;
mod ops;
pub use ops::Opcode;
mod runtime;
pub use runtime::{Machine, RunOptions};
mod trap;
pub use trap::TrapVector;

// Input and output
pub mod console;
mod loader;
pub use loader::Image;
pub mod output;

mod error;
pub use error::{Access, MachineError};

pub mod env;
