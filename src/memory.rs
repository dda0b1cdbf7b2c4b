use thiserror::Error;

use crate::config::{DEFAULT_MAX_IMAGE_SIZE, DEFAULT_MEMORY_SIZE};

pub type Byte = u8; // 1 byte

/// An address into memory.
///
/// Wider than the 16-bit address space so the engine can step past the last
/// byte and have that reported instead of silently wrapping around.
pub type Address = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("address 0x{address:04X} is outside of memory (size 0x{size:X})")]
    OutOfRange { address: usize, size: usize },
    #[error("image is {len} bytes, a boot image holds at most {max}")]
    ImageTooLarge { len: usize, max: usize },
}

/// The whole address space of the machine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memory {
    data: Box<[Byte]>,
    image_limit: usize,
}

impl Default for Memory {
    /// 64 KiB of zeroed memory accepting boot-sector sized images
    fn default() -> Self {
        Memory::new(DEFAULT_MEMORY_SIZE, DEFAULT_MAX_IMAGE_SIZE)
    }
}

impl Memory {
    /// Allocates `size` zeroed bytes. Images larger than `image_limit` are
    /// rejected by [`Memory::load_image`].
    pub fn new(size: usize, image_limit: usize) -> Self {
        Self {
            data: vec![0; size].into_boxed_slice(),
            image_limit,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[Byte] {
        &self.data
    }

    fn index(&self, address: Address) -> Result<usize, MemoryError> {
        let index = address as usize;
        if index < self.data.len() {
            Ok(index)
        } else {
            Err(MemoryError::OutOfRange {
                address: index,
                size: self.data.len(),
            })
        }
    }

    /// Reads a byte from the memory
    pub fn read_byte(&self, address: Address) -> Result<Byte, MemoryError> {
        self.index(address).map(|index| self.data[index])
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, address: Address, value: Byte) -> Result<(), MemoryError> {
        let index = self.index(address)?;
        self.data[index] = value;
        Ok(())
    }

    /// Writes an array of bytes to the memory. Nothing is written unless the
    /// whole array fits.
    pub fn write_array(&mut self, address: Address, data: &[Byte]) -> Result<(), MemoryError> {
        let start = address as usize;
        let end = start + data.len();
        if end > self.data.len() {
            return Err(MemoryError::OutOfRange {
                address: end.saturating_sub(1).max(start),
                size: self.data.len(),
            });
        }

        self.data[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Copies a boot image into memory starting at `base`
    pub fn load_image(&mut self, image: &[Byte], base: Address) -> Result<(), MemoryError> {
        if image.len() > self.image_limit {
            return Err(MemoryError::ImageTooLarge {
                len: image.len(),
                max: self.image_limit,
            });
        }

        self.write_array(base, image)
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ])
    };
}

#[cfg(test)]
mod tests {
    use crate::processor::Opcode;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_read_byte() -> Result<()> {
        let mut mem = Memory::default();
        mem.data[0x2] = 0x12;
        assert_eq!(mem.read_byte(0x2)?, 0x12);

        Ok(())
    }

    #[test]
    fn test_write_byte() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_byte(0x44, 12)?;
        assert_eq!(mem.data[0x44], 12);

        Ok(())
    }

    #[test]
    fn test_out_of_range() -> Result<()> {
        let mut mem = Memory::default();
        assert_eq!(mem.read_byte(0xFFFF)?, 0);
        assert_eq!(
            mem.read_byte(0x10000),
            Err(MemoryError::OutOfRange {
                address: 0x10000,
                size: 0x10000
            })
        );
        assert!(mem.write_byte(0x10000, 1).is_err());

        Ok(())
    }

    #[test]
    fn test_write_array() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(0x44, &[0x12, 0x34, 0x56, 0x78])?;
        assert_eq!(&mem.data[0x44..0x48], &[0x12, 0x34, 0x56, 0x78]);

        // doesn't fit: nothing is written
        assert_eq!(
            mem.write_array(0xFFFE, &[1, 2, 3]),
            Err(MemoryError::OutOfRange {
                address: 0x10000,
                size: 0x10000
            })
        );
        assert_eq!(&mem.data[0xFFFE..], &[0, 0]);

        Ok(())
    }

    #[test]
    fn test_load_image() -> Result<()> {
        let mut mem = Memory::default();
        let image: Vec<Byte> = (0..=255).chain(0..=255).collect();
        mem.load_image(&image, 0x7C00)?;

        assert_eq!(&mem.data[0x7C00..0x7E00], image.as_slice());
        assert!(mem.data[..0x7C00].iter().all(|&b| b == 0));
        assert!(mem.data[0x7E00..].iter().all(|&b| b == 0));

        Ok(())
    }

    #[test]
    fn test_load_image_too_large() -> Result<()> {
        let mut mem = Memory::default();
        let image = vec![0xAB; 513];

        assert_eq!(
            mem.load_image(&image, 0x7C00),
            Err(MemoryError::ImageTooLarge { len: 513, max: 512 })
        );
        assert_eq!(mem, Memory::default());

        Ok(())
    }

    #[test]
    fn test_load_image_past_end() -> Result<()> {
        let mut mem = Memory::new(0x100, 512);

        assert!(matches!(
            mem.load_image(&[1; 16], 0xF8),
            Err(MemoryError::OutOfRange { size: 0x100, .. })
        ));
        assert_eq!(mem, Memory::new(0x100, 512));

        Ok(())
    }

    #[test]
    fn test_write_instructions() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(
            0x7C00,
            &[
                Opcode::Padding as Byte,
                Opcode::NearJump as Byte,
                0xFE,
            ],
        )?;

        let mut mem2 = Memory::default();
        use crate::processor::Opcode::*;
        write_instructions!(mem2 : 0x7C00 => Padding, NearJump, 0xFE)?;

        assert_eq!(mem, mem2);

        Ok(())
    }
}
