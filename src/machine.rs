use crate::config::MachineConfig;
use crate::console::Console;
use crate::memory::{Address, Byte, Memory, MemoryError};
use crate::processor::{Halt, Processor};
use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("address fault at 0x{address:04X}")]
    AddressFault { address: Address },
}

/// How a boot attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootOutcome {
    /// The signature check failed, no instruction was executed
    MissingSignature,
    Halted(Halt),
}

/// Memory and an execution engine, wired up by a [`MachineConfig`]
#[derive(Debug, Clone)]
pub struct Machine {
    config: MachineConfig,
    memory: Memory,
    processor: Processor,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let memory = Memory::new(config.memory_size, config.max_image_size);
        let processor = Processor::new(config.entry_address);

        Self {
            config,
            memory,
            processor,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Loads a boot image at the entry address
    pub fn load_image(&mut self, image: &[Byte]) -> Result<(), MachineError> {
        self.memory.load_image(image, self.config.entry_address)?;

        info!(
            "loaded {} byte image at 0x{:04X}",
            image.len(),
            self.config.entry_address
        );
        Ok(())
    }

    /// Checks for the boot signature at its fixed place after the entry address
    pub fn has_boot_signature(&self) -> bool {
        let Some(start) = self.config.signature_address() else {
            return false;
        };
        self.config
            .signature
            .iter()
            .enumerate()
            .all(|(i, &expected)| {
                start
                    .checked_add(i as Address)
                    .map_or(false, |address| self.memory.read_byte(address) == Ok(expected))
            })
    }

    /// Shows the banner, validates the signature and runs the engine until it
    /// halts.
    ///
    /// An unsupported opcode is reported on the console and ends the run
    /// normally. Fetching outside of memory is fatal: the engine halts and
    /// [`MachineError::AddressFault`] is returned without the waiting message.
    pub fn run<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<BootOutcome, MachineError> {
        let messages = &self.config.messages;
        console.display(&messages.banner);

        if !self.has_boot_signature() {
            warn!(
                "no boot signature at 0x{:04X}+0x{:X}",
                self.config.entry_address, self.config.signature_offset
            );
            console.display(&messages.missing_signature);
            return Ok(BootOutcome::MissingSignature);
        }

        console.display(&messages.booting);
        let halt = self.processor.run(&self.memory);
        match halt {
            Halt::SelfLoop => {}
            Halt::UnsupportedOpcode { opcode, address } => {
                console.display(&messages.unsupported_opcode(opcode, address));
            }
            Halt::AddressFault { address } => {
                return Err(MachineError::AddressFault { address });
            }
        }
        console.display(&messages.waiting);

        Ok(BootOutcome::Halted(halt))
    }
}
