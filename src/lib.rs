//! A tiny boot-sector machine: 64 KiB of memory, a boot signature check and
//! an engine that understands exactly two opcodes.

pub mod config;
pub mod console;
pub mod machine;
pub mod memory;
pub mod processor;

pub use config::{MachineConfig, Messages};
pub use console::{Console, StdoutConsole};
pub use machine::{BootOutcome, Machine, MachineError};
pub use memory::{Address, Byte, Memory, MemoryError};
pub use processor::{Halt, Instruction, Opcode, Processor, State};
