//! Machine parameters. Everything the boot sequence depends on lives in a
//! [`MachineConfig`] handed to [`Machine::new`](crate::Machine::new).

use crate::memory::{Address, Byte};

pub const DEFAULT_MEMORY_SIZE: usize = 0x10000; // 64 KiB
pub const DEFAULT_ENTRY_ADDRESS: Address = 0x7C00;
pub const DEFAULT_SIGNATURE_OFFSET: Address = 0x1FE;
pub const BOOT_SIGNATURE: [Byte; 2] = [0x55, 0xAA];
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 512;

/// Strings written to the console during boot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Messages {
    pub banner: String,
    pub booting: String,
    pub waiting: String,
    pub missing_signature: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            banner: "Copyright (C) 2024 ZZY\n".to_owned(),
            booting: "Booting from hard disk...\n".to_owned(),
            waiting: "Waiting for more instructions...\n".to_owned(),
            missing_signature: "Boot signature not found. Halting.\n".to_owned(),
        }
    }
}

impl Messages {
    /// Diagnostic for a byte the engine cannot execute
    pub fn unsupported_opcode(&self, opcode: Byte, address: Address) -> String {
        format!("Unsupported opcode {:02X} at {:04X}. Halting.\n", opcode, address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineConfig {
    /// Size of the address space in bytes
    pub memory_size: usize,
    /// Where the image is loaded and where execution starts
    pub entry_address: Address,
    /// Offset of the boot signature from the entry address
    pub signature_offset: Address,
    pub signature: [Byte; 2],
    pub max_image_size: usize,
    pub messages: Messages,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            entry_address: DEFAULT_ENTRY_ADDRESS,
            signature_offset: DEFAULT_SIGNATURE_OFFSET,
            signature: BOOT_SIGNATURE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            messages: Messages::default(),
        }
    }
}

impl MachineConfig {
    /// Absolute address of the first signature byte, `None` if it does not
    /// fit in an [`Address`]
    pub fn signature_address(&self) -> Option<Address> {
        self.entry_address.checked_add(self.signature_offset)
    }
}
