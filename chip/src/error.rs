use thiserror::Error;

use crate::opcode::Opcode;

/// The fatal errors a single [`step`](crate::chip8::ChipSet::step) can run into. The chipset
/// state is left as it was before the failing step.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessError {
    #[error("Program counter {pc:#06X} is outside of the addressable memory.")]
    PcOutOfBounds { pc: usize },
    #[error("Return at {pc:#06X} with an empty stack.")]
    StackUnderflow { pc: usize },
    #[error("Call at {pc:#06X} with a full stack.")]
    StackOverflow { pc: usize },
    #[error("Opcode {opcode:#06X} at {pc:#06X} accessed memory at {address:#06X} out of bounds.")]
    MemoryAccessOutOfBounds {
        pc: usize,
        opcode: Opcode,
        address: usize,
    },
    #[error("An unsupported opcode was used {opcode:#06X} at {pc:#06X}.")]
    UnknownOpcode { pc: usize, opcode: Opcode },
    #[error("Opcode {opcode:#06X} at {pc:#06X} referenced the key {key:#04X}, which does not exist.")]
    InvalidKey { pc: usize, opcode: Opcode, key: u8 },
}

impl ProcessError {
    /// The address of the instruction that failed.
    pub fn pc(&self) -> usize {
        match *self {
            ProcessError::PcOutOfBounds { pc }
            | ProcessError::StackUnderflow { pc }
            | ProcessError::StackOverflow { pc }
            | ProcessError::MemoryAccessOutOfBounds { pc, .. }
            | ProcessError::UnknownOpcode { pc, .. }
            | ProcessError::InvalidKey { pc, .. } => pc,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X}.")]
    InvalidOpcode(Opcode),
    #[error("Pointer location invalid there can not be an opcode at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum LoadError {
    #[error("The image is {len} bytes long, but only {capacity} bytes of program space exist.")]
    ImageTooLarge { len: usize, capacity: usize },
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum KeyboardError {
    #[error("There is no key with the index {0:#X}.")]
    InvalidKey(usize),
}

#[derive(Error, Debug)]
pub enum RomError {
    #[error("Unable to read the rom '{name}'.")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Rom '{name}' could not be loaded.")]
    Load {
        name: String,
        #[source]
        source: LoadError,
    },
}

/// Errors raised by the display and keyboard adapters.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device io failed.")]
    Io(#[from] std::io::Error),
    #[error("Device failed '{0}'.")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Execution halted.")]
    Process(#[from] ProcessError),
    #[error("A device failed.")]
    Device(#[from] DeviceError),
    #[error("Invalid key event.")]
    Keyboard(#[from] KeyboardError),
}
