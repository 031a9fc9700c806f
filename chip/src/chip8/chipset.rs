use std::ops::{Deref, DerefMut};

use {
    crate::{
        definitions::{cpu, display, memory},
        devices::Keyboard,
        opcode::{self, Instruction, Opcode, Operation},
        resources::Rom,
        KeyboardError, LoadError, ProcessError, RomError,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// `8-bit` data registers named `V0` to `VF`.
///
/// The `VF` register doubles as a flag for some instructions while staying a normal general
/// purpose register for all the others. In an addition operation, `VF` is the carry flag, while
/// in subtraction, it is the "no borrow" flag. The shifts store the shifted out bit in it and in
/// the draw instruction `VF` is set upon pixel collision. A program that keeps data in `VF` will
/// have it overwritten by any of these.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers([u8; cpu::register::SIZE]);

impl Registers {
    /// Will write the flag into `VF`.
    pub fn set_flag(&mut self, flag: bool) {
        self.0[cpu::register::LAST] = flag as u8;
    }

    /// The current content of `VF`
    pub fn flag(&self) -> u8 {
        self.0[cpu::register::LAST]
    }
}

impl Deref for Registers {
    type Target = [u8; cpu::register::SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Registers {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
/// `(64 x 32)`, stored row major.
#[derive(Clone, PartialEq, Eq)]
pub struct Display {
    pixels: [bool; display::RESOLUTION],
}

impl Default for Display {
    fn default() -> Self {
        Self {
            pixels: [false; display::RESOLUTION],
        }
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let on = self.pixels.iter().filter(|pixel| **pixel).count();
        write!(f, "Display {{ on: {} }}", on)
    }
}

impl Display {
    /// Is the pixel at the given coordinates on.
    ///
    /// # Panics
    /// If the coordinates are outside of the display.
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < display::WIDTH && y < display::HEIGHT);
        self.pixels[y * display::WIDTH + x]
    }

    /// All the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(display::WIDTH)
    }

    /// The raw pixels in row major order.
    pub fn as_slice(&self) -> &[bool] {
        &self.pixels
    }

    pub(super) fn clear(&mut self) {
        self.pixels = [false; display::RESOLUTION];
    }

    /// Flips the pixel and returns if it was turned off by doing so.
    pub(super) fn toggle(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.pixels[y * display::WIDTH + x];
        *pixel = !*pixel;
        !*pixel
    }
}

/// The compatibility switches for behaviour the historical interpreters disagree on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// `8XY6` and `8XYE` shift `VY` into `VX` as the COSMAC VIP did, instead of shifting `VX`
    /// in place.
    pub shift_uses_vy: bool,
    /// `8XY5`, `8XY7`, `8XY6`, `8XYE` and `DXYN` read all their registers before `VF` is
    /// written. Otherwise `VF` is written first and an operand in `VF` sees the new flag, while
    /// drawing that includes every collision found so far.
    pub operands_before_flag: bool,
}

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
pub struct ChipSet {
    /// the last executed opcode, all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    /// - `0x000-0x04F` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x050-0x1FF` - Reserved for the interpreter
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Vec<u8>,
    pub(super) registers: Registers,
    /// The index for the register, this is a special register entry
    /// called index `I`
    pub(super) index_register: u16,
    /// The program counter has the address of the next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting.
    pub(super) stack: ArrayVec<[u16; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: u8,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    pub(super) sound_timer: u8,
    pub(super) display: Display,
    /// Set every time the display changes, until the driver clears it.
    pub(super) dirty: bool,
    pub(super) keyboard: Keyboard,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
    pub(super) quirks: Quirks,
}

impl Default for ChipSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipSet {
    /// will create a new chipset object
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    /// will create a new chipset object with the given compatibility settings
    pub fn with_quirks(quirks: Quirks) -> Self {
        let mut chip = Self {
            opcode: 0,
            memory: vec![0; memory::SIZE],
            registers: Registers::default(),
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: 0,
            sound_timer: 0,
            display: Display::default(),
            dirty: false,
            keyboard: Keyboard::new(),
            rng: Box::new(rand::rngs::OsRng),
            quirks,
        };
        chip.reset();
        chip
    }

    /// Replaces the random number generator used by `CXKK`.
    pub fn with_rng<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Box::new(rng);
        self
    }

    /// Puts the chipset back into the power on state, the quirks and the random number
    /// generator are kept.
    pub fn reset(&mut self) {
        // initialize all the memory with 0
        self.memory.fill(0);

        // load fonts
        let fontset = &display::fontset::FONTSET;
        self.memory[display::fontset::LOCATION..(display::fontset::LOCATION + fontset.len())]
            .copy_from_slice(fontset);

        self.opcode = 0;
        self.registers = Registers::default();
        self.index_register = 0;
        self.program_counter = cpu::PROGRAM_COUNTER;
        self.stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.display.clear();
        self.dirty = false;
        self.keyboard.reset();
    }

    /// Will write the image into the program space, after zeroing it.
    /// The registers, program counter, stack and timers are left as they are.
    pub fn load(&mut self, data: &[u8]) -> Result<(), LoadError> {
        if data.len() > cpu::PROGRAM_SPACE {
            return Err(LoadError::ImageTooLarge {
                len: data.len(),
                capacity: cpu::PROGRAM_SPACE,
            });
        }

        let program = &mut self.memory[cpu::PROGRAM_COUNTER..];
        program.fill(0);
        program[..data.len()].copy_from_slice(data);

        log::debug!("loaded {} bytes into the program space", data.len());
        Ok(())
    }

    /// Will load the rom into the program space.
    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), RomError> {
        self.load(rom.get_data()).map_err(|source| RomError::Load {
            name: rom.get_name().to_string(),
            source,
        })
    }

    /// will advance the program by a single instruction
    ///
    /// On error nothing was changed and the program counter still points to the failing
    /// instruction.
    pub fn step(&mut self) -> Result<Operation, ProcessError> {
        let pc = self.program_counter;
        let opcode = opcode::build_opcode(&self.memory, pc)
            .map_err(|_| ProcessError::PcOutOfBounds { pc })?;
        let instruction = Instruction::try_from(opcode)
            .map_err(|_| ProcessError::UnknownOpcode { pc, opcode })?;

        log::trace!("{:#06X}: {:#06X} {}", pc, opcode, instruction);

        let (step, operation) = self.execute(instruction, opcode, pc)?;

        self.opcode = opcode;
        self.program_counter = step.apply(pc + memory::opcodes::SIZE);
        if let Operation::Draw = operation {
            self.dirty = true;
        }
        Ok(operation)
    }

    /// Counts both timers down by one, they stop at zero.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Will set the value of the given key
    pub fn set_key(&mut self, key: usize, to: bool) -> Result<(), KeyboardError> {
        self.keyboard.set_key(key, to)
    }

    /// Will get the current state of the keyboard
    pub fn get_keyboard(&self) -> &[bool] {
        self.keyboard.get_keys()
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer
    }

    /// Will return the current display configuration
    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Has the display changed since the last [`clear_dirty`](Self::clear_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the current display as presented.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn get_index_register(&self) -> u16 {
        self.index_register
    }

    pub fn get_registers(&self) -> &Registers {
        &self.registers
    }

    /// The return addresses from the oldest to the newest call.
    pub fn get_stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn get_memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn get_quirks(&self) -> Quirks {
        self.quirks
    }

    /// Will push the return address to the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), crate::StackError> {
        if self.stack.len() == self.stack.capacity() {
            Err(crate::StackError::Full)
        } else {
            log::debug!("push {:#06X} at depth {}", pointer, self.stack.len());
            self.stack.push(pointer as u16);
            Ok(())
        }
    }

    /// Will pop the last return address from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, crate::StackError> {
        let pointer = self.stack.pop().ok_or(crate::StackError::Empty)?;
        log::debug!("pop {:#06X} at depth {}", pointer, self.stack.len());
        Ok(pointer as usize)
    }
}
