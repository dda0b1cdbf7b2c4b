use std::fmt;

use crate::config::DEFAULT_ENTRY_ADDRESS;
use crate::memory::{Address, Byte, Memory};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// Jump offset that makes a near jump land on itself (`jmp $`)
pub const SELF_LOOP: Byte = 0xFE;

/// Why the engine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Halt {
    /// A `jmp $` was reached
    SelfLoop,
    /// The byte at `address` is not an opcode this engine knows
    UnsupportedOpcode { opcode: Byte, address: Address },
    /// A fetch went outside of memory
    AddressFault { address: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Running,
    /// Terminal, the engine never resumes
    Halted(Halt),
}

/// A decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `0xEB offset`. The offset is taken as unsigned and added after
    /// skipping the two instruction bytes.
    NearJump { offset: Byte },
    /// `0x00` filler
    Padding,
    Unsupported(Byte),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::NearJump { offset: SELF_LOOP } => {
                write!(f, "{} $", Opcode::NearJump)
            }
            Instruction::NearJump { offset } => write!(f, "{} +0x{:02X}", Opcode::NearJump, offset),
            Instruction::Padding => write!(f, "{}", Opcode::Padding),
            Instruction::Unsupported(byte) => write!(f, "DB 0x{:02X}", byte),
        }
    }
}

fn fetch(memory: &Memory, address: Address) -> Result<Byte, Address> {
    memory.read_byte(address).map_err(|_| address)
}

/// Decodes the instruction starting at `address`. Fails with the address of
/// the first byte that lies outside of memory.
pub fn decode(memory: &Memory, address: Address) -> Result<Instruction, Address> {
    let opcode = fetch(memory, address)?;
    let instruction = match Opcode::try_from(opcode) {
        Ok(Opcode::NearJump) => Instruction::NearJump {
            offset: fetch(memory, address.saturating_add(1))?,
        },
        Ok(Opcode::Padding) => Instruction::Padding,
        Err(_) => Instruction::Unsupported(opcode),
    };

    Ok(instruction)
}

/// The execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Instruction pointer
    pub ip: Address,
    pub state: State,
    /// Number of fetch/decode/execute steps performed so far
    pub steps: u64,
}

impl Default for Processor {
    /// Initializes a new engine at the boot sector entry
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_ADDRESS)
    }
}

impl Processor {
    /// Initializes a new engine
    /// @param entrypoint The address of the first instruction
    pub fn new(entrypoint: Address) -> Self {
        Self {
            ip: entrypoint,
            state: State::Running,
            steps: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Applies a decoded instruction to the engine state. Does nothing once
    /// halted.
    pub fn execute(&mut self, instruction: Instruction) {
        if !self.is_running() {
            return;
        }

        match instruction {
            Instruction::NearJump { offset: SELF_LOOP } => {
                self.state = State::Halted(Halt::SelfLoop);

                debug!("{:04X}: {}", self.ip, instruction);
            }
            Instruction::NearJump { offset } => {
                let from = self.ip;
                self.ip += 2 + Address::from(offset);

                debug!("{:04X}: {} -> {:04X}", from, instruction, self.ip);
            }
            Instruction::Padding => {
                self.ip += 1;

                trace!("{:04X}: {}", self.ip - 1, instruction);
            }
            Instruction::Unsupported(opcode) => {
                self.state = State::Halted(Halt::UnsupportedOpcode {
                    opcode,
                    address: self.ip,
                });

                warn!("unsupported opcode 0x{:02X} at {:04X}", opcode, self.ip);
            }
        }
    }

    /// Runs one fetch/decode/execute step
    pub fn step(&mut self, memory: &Memory) -> State {
        if !self.is_running() {
            return self.state;
        }

        match decode(memory, self.ip) {
            Ok(instruction) => self.execute(instruction),
            Err(address) => {
                self.state = State::Halted(Halt::AddressFault { address });

                error!("{:04X}: address fault at {:04X}", self.ip, address);
            }
        }
        self.steps += 1;

        self.state
    }

    /// Run until the engine halts
    pub fn run(&mut self, memory: &Memory) -> Halt {
        loop {
            if let State::Halted(halt) = self.step(memory) {
                info!("halted after {} steps: {:?}", self.steps, halt);
                return halt;
            }
        }
    }
}

macro_rules! opcodes {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal => $mnemonic:literal , )+ ) => {
        /// The opcodes the engine understands. Every other byte decodes to
        /// [`Instruction::Unsupported`].
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Opcode {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Opcode {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn mnemonic(&self) -> &'static str {
                match self {
                    $( Self::$name => $mnemonic , )+
                }
            }
        }

        impl ::std::fmt::Display for Opcode {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.mnemonic())
            }
        }
    }
}

opcodes! {
    /// Filler byte, skipped
    Padding = 0x00 => "PAD",
    /// Near jump
    /// @param offset Added to the address following the instruction
    NearJump = 0xEB => "JMP",
}
