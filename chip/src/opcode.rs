//! Opcode abstractions, functionality and constants.
use std::fmt;

use crate::{definitions::memory, OpcodeError};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a single byte
const BYTE_SIZE: u16 = 0x8;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = OpcodeError::MemoryInvalid {pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(
/// #    Err(err),
/// #    build_opcode(&SPLIT_OPCODE, pointer)
/// # );
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    // controlling that there is no illegal access here
    if pointer + 1 < data.len() {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// this is an opcode extractor that will return the
    /// family nibble of any opcode
    /// - `T` is the opcode type
    fn t(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `T` is the opcode type
    /// - `NNN` is an address
    fn nnn(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TXKK`
    /// - `T` is the opcode type
    /// - `X` is a register index
    /// - `KK` is a constant
    fn xkk(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `T` is the opcode type
    /// - `X` is a register index
    /// - `Y` is a register index
    /// - `N` is a count or an opcode subtype
    fn xyn(&self) -> (usize, usize, usize);

    /// this is an opcode extractor for the opcode type `TXYT`
    /// - `T` is the opcode type
    /// - `X` is a register index
    /// - `Y` is a register index
    fn xy(&self) -> (usize, usize);

    /// this is an opcode extractor for the opcode type `TXTT`
    /// - `T` is the opcode type
    /// - `X` is a register index
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1);
    /// ```
    fn t(&self) -> usize {
        const SHIFT: u16 = 3 * BYTE_SIZE / 2;
        ((self & OPCODE_MASK_F000) >> SHIFT) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xkk(), (0xE, 0xDA));
    /// ```
    fn xkk(&self) -> (usize, u8) {
        let x = self.x();
        let kk = (self & OPCODE_MASK_00FF) as u8;
        (x, kk)
    }

    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, usize) {
        let (x, y) = self.xy();
        let n = (self & OPCODE_MASK_000F) as usize;
        (x, y, n)
    }

    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xy(), (0xE, 0xD));
    /// ```
    fn xy(&self) -> (usize, usize) {
        let x = self.x();
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        const NIBBLE: u16 = BYTE_SIZE / 2;
        let y = ((self & MASK) >> NIBBLE) as usize;
        (x, y)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.x(), 0xE);
    /// ```
    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> BYTE_SIZE) as usize
    }
}

/// A fully decoded instruction.
///
/// `x` and `y` are register indexes, `kk` an immediate byte, `nnn` an address and `n` the
/// sprite height of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0` - Clears the screen.
    ClearDisplay,
    /// `00EE` - Returns from a subroutine.
    Return,
    /// `1NNN` - Jumps to address `NNN`.
    Jump { nnn: usize },
    /// `2NNN` - Calls subroutine at `NNN`.
    Call { nnn: usize },
    /// `3XKK` - Skips the next instruction if `VX` equals `KK`.
    SkipEqImm { x: usize, kk: u8 },
    /// `4XKK` - Skips the next instruction if `VX` doesn't equal `KK`.
    SkipNeImm { x: usize, kk: u8 },
    /// `5XY0` - Skips the next instruction if `VX` equals `VY`.
    SkipEqReg { x: usize, y: usize },
    /// `6XKK` - Sets `VX` to `KK`.
    SetImm { x: usize, kk: u8 },
    /// `7XKK` - Adds `KK` to `VX`. (Carry flag is not changed)
    AddImm { x: usize, kk: u8 },
    /// `8XY0` - Sets `VX` to the value of `VY`.
    Set { x: usize, y: usize },
    /// `8XY1` - Sets `VX` to `VX | VY`.
    Or { x: usize, y: usize },
    /// `8XY2` - Sets `VX` to `VX & VY`.
    And { x: usize, y: usize },
    /// `8XY3` - Sets `VX` to `VX ^ VY`.
    Xor { x: usize, y: usize },
    /// `8XY4` - Adds `VY` to `VX`. `VF` is set to `1` when there's a carry.
    AddReg { x: usize, y: usize },
    /// `8XY5` - `VY` is subtracted from `VX`. `VF` is set to `0` when there's a borrow.
    SubReg { x: usize, y: usize },
    /// `8XY6` - Stores the least significant bit in `VF` and shifts right by `1`.
    ShiftRight { x: usize, y: usize },
    /// `8XY7` - Sets `VX` to `VY - VX`. `VF` is set to `0` when there's a borrow.
    SubReverse { x: usize, y: usize },
    /// `8XYE` - Stores the most significant bit in `VF` and shifts left by `1`.
    ShiftLeft { x: usize, y: usize },
    /// `9XY0` - Skips the next instruction if `VX` doesn't equal `VY`.
    SkipNeReg { x: usize, y: usize },
    /// `ANNN` - Sets `I` to the address `NNN`.
    SetIndex { nnn: usize },
    /// `BNNN` - Jumps to the address `NNN` plus `V0`.
    JumpOffset { nnn: usize },
    /// `CXKK` - Sets `VX` to a random byte and `KK`.
    Random { x: usize, kk: u8 },
    /// `DXYN` - Draws a sprite of height `N` at `(VX, VY)`.
    Draw { x: usize, y: usize, n: usize },
    /// `EX9E` - Skips the next instruction if the key stored in `VX` is pressed.
    SkipKeyPressed { x: usize },
    /// `EXA1` - Skips the next instruction if the key stored in `VX` isn't pressed.
    SkipKeyNotPressed { x: usize },
    /// `FX07` - Sets `VX` to the value of the delay timer.
    GetDelayTimer { x: usize },
    /// `FX0A` - A key press is awaited, and then stored in `VX`.
    AwaitKeyPress { x: usize },
    /// `FX15` - Sets the delay timer to `VX`.
    SetDelayTimer { x: usize },
    /// `FX18` - Sets the sound timer to `VX`.
    SetSoundTimer { x: usize },
    /// `FX1E` - Adds `VX` to `I`. `VF` is not affected.
    AddToIndex { x: usize },
    /// `FX29` - Sets `I` to the location of the glyph for the character in `VX`.
    SetIndexToGlyph { x: usize },
    /// `FX33` - Stores the binary-coded decimal representation of `VX` at `I`.
    StoreBcd { x: usize },
    /// `FX55` - Stores `V0` to `VX` (including `VX`) in memory starting at address `I`.
    StoreRegisters { x: usize },
    /// `FX65` - Fills `V0` to `VX` (including `VX`) from memory starting at address `I`.
    LoadRegisters { x: usize },
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let (x, kk) = value.xkk();
        let (_, y, n) = value.xyn();
        let nnn = value.nnn();

        let instruction = match (value.t(), x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Instruction::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Instruction::Return,
            (0x1, ..) => Instruction::Jump { nnn },
            (0x2, ..) => Instruction::Call { nnn },
            (0x3, ..) => Instruction::SkipEqImm { x, kk },
            (0x4, ..) => Instruction::SkipNeImm { x, kk },
            (0x5, _, _, 0x0) => Instruction::SkipEqReg { x, y },
            (0x6, ..) => Instruction::SetImm { x, kk },
            (0x7, ..) => Instruction::AddImm { x, kk },
            (0x8, _, _, 0x0) => Instruction::Set { x, y },
            (0x8, _, _, 0x1) => Instruction::Or { x, y },
            (0x8, _, _, 0x2) => Instruction::And { x, y },
            (0x8, _, _, 0x3) => Instruction::Xor { x, y },
            (0x8, _, _, 0x4) => Instruction::AddReg { x, y },
            (0x8, _, _, 0x5) => Instruction::SubReg { x, y },
            (0x8, _, _, 0x6) => Instruction::ShiftRight { x, y },
            (0x8, _, _, 0x7) => Instruction::SubReverse { x, y },
            (0x8, _, _, 0xE) => Instruction::ShiftLeft { x, y },
            (0x9, _, _, 0x0) => Instruction::SkipNeReg { x, y },
            (0xA, ..) => Instruction::SetIndex { nnn },
            (0xB, ..) => Instruction::JumpOffset { nnn },
            (0xC, ..) => Instruction::Random { x, kk },
            (0xD, ..) => Instruction::Draw { x, y, n },
            (0xE, ..) if kk == 0x9E => Instruction::SkipKeyPressed { x },
            (0xE, ..) if kk == 0xA1 => Instruction::SkipKeyNotPressed { x },
            (0xF, ..) => match kk {
                0x07 => Instruction::GetDelayTimer { x },
                0x0A => Instruction::AwaitKeyPress { x },
                0x15 => Instruction::SetDelayTimer { x },
                0x18 => Instruction::SetSoundTimer { x },
                0x1E => Instruction::AddToIndex { x },
                0x29 => Instruction::SetIndexToGlyph { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegisters { x },
                0x65 => Instruction::LoadRegisters { x },
                _ => return Err(OpcodeError::InvalidOpcode(value)),
            },
            _ => return Err(OpcodeError::InvalidOpcode(value)),
        };
        Ok(instruction)
    }
}

/// Disassembly in the usual Cowgod mnemonics, used for tracing.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearDisplay => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { nnn } => write!(f, "JP {:#05X}", nnn),
            Call { nnn } => write!(f, "CALL {:#05X}", nnn),
            SkipEqImm { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            SkipNeImm { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            SetImm { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            AddImm { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            Set { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            SubReg { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex { nnn } => write!(f, "LD I, {:#05X}", nnn),
            JumpOffset { nnn } => write!(f, "JP V0, {:#05X}", nnn),
            Random { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {:#X}", x, y, n),
            SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            GetDelayTimer { x } => write!(f, "LD V{:X}, DT", x),
            AwaitKeyPress { x } => write!(f, "LD V{:X}, K", x),
            SetDelayTimer { x } => write!(f, "LD DT, V{:X}", x),
            SetSoundTimer { x } => write!(f, "LD ST, V{:X}", x),
            AddToIndex { x } => write!(f, "ADD I, V{:X}", x),
            SetIndexToGlyph { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the program steps that the chip can take, relative to the already advanced
/// program counter.
pub enum ProgramCounterStep {
    /// Keeps the advance done during fetch
    Next,
    /// Skips the next instruction
    Skip,
    /// Moves back onto the current instruction, so that it will run again
    Rewind,
    /// Will simply move the program counter to the given location.
    Jump(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Applies the step onto the program counter, that already points past the
    /// current instruction.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(0x204, ProgramCounterStep::Skip.apply(0x202));
    /// assert_eq!(0x200, ProgramCounterStep::Rewind.apply(0x202));
    /// assert_eq!(0x400, ProgramCounterStep::Jump(0x400).apply(0x202));
    /// ```
    #[inline]
    pub fn apply(&self, advanced: usize) -> usize {
        match *self {
            ProgramCounterStep::Next => advanced,
            ProgramCounterStep::Skip => advanced + memory::opcodes::SIZE,
            ProgramCounterStep::Rewind => advanced - memory::opcodes::SIZE,
            ProgramCounterStep::Jump(pointer) => pointer,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents a command from the interpreter up to the driver.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The interpreter is spinning on a key wait
    Wait,
    /// The display changed and should be redrawn
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value: Opcode = 0x00E0;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Ok(Instruction::ClearDisplay));
    }

    #[test]
    fn test_tryfrom_opcode_simple_fail() {
        let value: Opcode = 0x00E1;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Err(OpcodeError::InvalidOpcode(value)));
    }

    #[test]
    fn test_tryfrom_opcode_multiple() {
        use Instruction::*;
        let tests = [
            (0x00E0, Ok(ClearDisplay)),
            (0x00EE, Ok(Return)),
            (0x00E1, Err(())),
            // the machine code call is not supported
            (0x0123, Err(())),
            (0x1919, Ok(Jump { nnn: 0x919 })),
            (0x2222, Ok(Call { nnn: 0x222 })),
            (0x3123, Ok(SkipEqImm { x: 0x1, kk: 0x23 })),
            (0x4123, Ok(SkipNeImm { x: 0x1, kk: 0x23 })),
            (0x5120, Ok(SkipEqReg { x: 0x1, y: 0x2 })),
            (0x5121, Err(())),
            (0x6123, Ok(SetImm { x: 0x1, kk: 0x23 })),
            (0x7123, Ok(AddImm { x: 0x1, kk: 0x23 })),
            (0x8120, Ok(Set { x: 0x1, y: 0x2 })),
            (0x8121, Ok(Or { x: 0x1, y: 0x2 })),
            (0x8122, Ok(And { x: 0x1, y: 0x2 })),
            (0x8123, Ok(Xor { x: 0x1, y: 0x2 })),
            (0x8124, Ok(AddReg { x: 0x1, y: 0x2 })),
            (0x8125, Ok(SubReg { x: 0x1, y: 0x2 })),
            (0x8126, Ok(ShiftRight { x: 0x1, y: 0x2 })),
            (0x8127, Ok(SubReverse { x: 0x1, y: 0x2 })),
            (0x812E, Ok(ShiftLeft { x: 0x1, y: 0x2 })),
            (0x8128, Err(())),
            (0x812F, Err(())),
            (0x9120, Ok(SkipNeReg { x: 0x1, y: 0x2 })),
            (0x9121, Err(())),
            (0xA222, Ok(SetIndex { nnn: 0x222 })),
            (0xB222, Ok(JumpOffset { nnn: 0x222 })),
            (0xC123, Ok(Random { x: 0x1, kk: 0x23 })),
            (0xD123, Ok(Draw { x: 0x1, y: 0x2, n: 0x3 })),
            (0xE19E, Ok(SkipKeyPressed { x: 0x1 })),
            (0xE1A1, Ok(SkipKeyNotPressed { x: 0x1 })),
            (0xE111, Err(())),
            (0xF007, Ok(GetDelayTimer { x: 0x0 })),
            (0xF00A, Ok(AwaitKeyPress { x: 0x0 })),
            (0xF015, Ok(SetDelayTimer { x: 0x0 })),
            (0xF018, Ok(SetSoundTimer { x: 0x0 })),
            (0xF01E, Ok(AddToIndex { x: 0x0 })),
            (0xF029, Ok(SetIndexToGlyph { x: 0x0 })),
            (0xF033, Ok(StoreBcd { x: 0x0 })),
            (0xF055, Ok(StoreRegisters { x: 0x0 })),
            (0xF065, Ok(LoadRegisters { x: 0x0 })),
            (0xF0AA, Err(())),
        ];
        for (value, res) in tests {
            let conv: Result<Instruction, _> = (value as Opcode).try_into();
            assert_eq!(conv, res.map_err(|_| OpcodeError::InvalidOpcode(value)));
        }
    }

    #[test]
    fn test_disassembly() {
        let tests = [
            (0x2400, "CALL 0x400"),
            (0x8AB4, "ADD VA, VB"),
            (0xD015, "DRW V0, V1, 0x5"),
            (0xF333, "LD B, V3"),
        ];
        for (opcode, text) in tests {
            let instruction = Instruction::try_from(opcode as Opcode).unwrap();
            assert_eq!(text, instruction.to_string());
        }
    }
}
