use std::ops::Range;

use rand::RngCore;

use crate::{
    definitions::{display, memory},
    opcode::{Instruction, Opcode, Operation, ProgramCounterStep},
    ProcessError,
};

use super::ChipSet;

type Outcome = Result<(ProgramCounterStep, Operation), ProcessError>;

impl ChipSet {
    /// Runs a single decoded instruction. Every check that can fail happens before the first
    /// write, so that an error leaves the chipset untouched.
    ///
    /// - `pc` is the address of the instruction, the returned step is relative to `pc + 2`.
    pub(super) fn execute(&mut self, instruction: Instruction, opcode: Opcode, pc: usize) -> Outcome {
        use Instruction::*;
        match instruction {
            ClearDisplay => self.clear_display(),
            Return => self.return_from_subroutine(pc),
            Jump { nnn } => Ok((ProgramCounterStep::Jump(nnn), Operation::None)),
            Call { nnn } => self.call_subroutine(pc, nnn),
            SkipEqImm { x, kk } => Ok(skip(self.registers[x] == kk)),
            SkipNeImm { x, kk } => Ok(skip(self.registers[x] != kk)),
            SkipEqReg { x, y } => Ok(skip(self.registers[x] == self.registers[y])),
            SetImm { x, kk } => {
                self.registers[x] = kk;
                Ok(next())
            }
            AddImm { x, kk } => {
                self.registers[x] = self.registers[x].wrapping_add(kk);
                Ok(next())
            }
            Set { x, y } => {
                self.registers[x] = self.registers[y];
                Ok(next())
            }
            Or { x, y } => {
                let vy = self.registers[y];
                self.registers[x] |= vy;
                Ok(next())
            }
            And { x, y } => {
                let vy = self.registers[y];
                self.registers[x] &= vy;
                Ok(next())
            }
            Xor { x, y } => {
                let vy = self.registers[y];
                self.registers[x] ^= vy;
                Ok(next())
            }
            AddReg { x, y } => {
                let (result, carry) = self.registers[x].overflowing_add(self.registers[y]);
                self.set_with_flag(x, result, carry)
            }
            SubReg { x, y } => {
                let flag = self.registers[x] >= self.registers[y];
                self.flag_then_apply(x, y, flag, |vx, vy| vx.wrapping_sub(vy))
            }
            SubReverse { x, y } => {
                let flag = self.registers[y] >= self.registers[x];
                self.flag_then_apply(x, y, flag, |vx, vy| vy.wrapping_sub(vx))
            }
            ShiftRight { x, y } => {
                let flag = self.shift_source(x, y) & 0x1 == 0x1;
                let uses_vy = self.quirks.shift_uses_vy;
                self.flag_then_apply(x, y, flag, |vx, vy| (if uses_vy { vy } else { vx }) >> 1)
            }
            ShiftLeft { x, y } => {
                let flag = self.shift_source(x, y) & 0x80 == 0x80;
                let uses_vy = self.quirks.shift_uses_vy;
                self.flag_then_apply(x, y, flag, |vx, vy| (if uses_vy { vy } else { vx }) << 1)
            }
            SkipNeReg { x, y } => Ok(skip(self.registers[x] != self.registers[y])),
            SetIndex { nnn } => {
                self.index_register = nnn as u16;
                Ok(next())
            }
            JumpOffset { nnn } => {
                let pointer = nnn + self.registers[0] as usize;
                Ok((ProgramCounterStep::Jump(pointer), Operation::None))
            }
            Random { x, kk } => {
                let mut byte = [0u8; 1];
                self.rng.fill_bytes(&mut byte);
                self.registers[x] = byte[0] & kk;
                Ok(next())
            }
            Draw { x, y, n } => self.draw(opcode, pc, x, y, n),
            SkipKeyPressed { x } => {
                let pressed = self.key_state(opcode, pc, x)?;
                Ok(skip(pressed))
            }
            SkipKeyNotPressed { x } => {
                let pressed = self.key_state(opcode, pc, x)?;
                Ok(skip(!pressed))
            }
            GetDelayTimer { x } => {
                self.registers[x] = self.delay_timer;
                Ok(next())
            }
            AwaitKeyPress { x } => Ok(self.await_key_press(x)),
            SetDelayTimer { x } => {
                self.delay_timer = self.registers[x];
                Ok(next())
            }
            SetSoundTimer { x } => {
                self.sound_timer = self.registers[x];
                Ok(next())
            }
            AddToIndex { x } => {
                self.index_register = self.index_register.wrapping_add(self.registers[x] as u16);
                Ok(next())
            }
            SetIndexToGlyph { x } => {
                let glyph = self.registers[x] as usize * display::fontset::GLYPH_SIZE;
                self.index_register = (display::fontset::LOCATION + glyph) as u16;
                Ok(next())
            }
            StoreBcd { x } => {
                let range = self.memory_range(opcode, pc, 3)?;
                let value = self.registers[x];
                self.memory[range].copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
                Ok(next())
            }
            StoreRegisters { x } => {
                let range = self.memory_range(opcode, pc, x + 1)?;
                self.memory[range].copy_from_slice(&self.registers[..=x]);
                Ok(next())
            }
            LoadRegisters { x } => {
                let range = self.memory_range(opcode, pc, x + 1)?;
                self.registers[..=x].copy_from_slice(&self.memory[range]);
                Ok(next())
            }
        }
    }

    fn clear_display(&mut self) -> Outcome {
        self.display.clear();
        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    fn return_from_subroutine(&mut self, pc: usize) -> Outcome {
        let pointer = self
            .pop_stack()
            .map_err(|_| ProcessError::StackUnderflow { pc })?;
        Ok((ProgramCounterStep::Jump(pointer), Operation::None))
    }

    fn call_subroutine(&mut self, pc: usize, nnn: usize) -> Outcome {
        self.push_stack(pc + memory::opcodes::SIZE)
            .map_err(|_| ProcessError::StackOverflow { pc })?;
        Ok((ProgramCounterStep::Jump(nnn), Operation::None))
    }

    /// The flag is written before the result, so that with `x == 0xF` the result is what
    /// remains in `VF`.
    fn set_with_flag(&mut self, x: usize, result: u8, flag: bool) -> Outcome {
        self.registers.set_flag(flag);
        self.registers[x] = result;
        Ok(next())
    }

    /// Writes the flag and then `VX = apply(VX, VY)`. The operands are read after the flag was
    /// written, unless `operands_before_flag` is set.
    fn flag_then_apply(&mut self, x: usize, y: usize, flag: bool, apply: impl Fn(u8, u8) -> u8) -> Outcome {
        let (vx, vy) = (self.registers[x], self.registers[y]);
        self.registers.set_flag(flag);
        let result = if self.quirks.operands_before_flag {
            apply(vx, vy)
        } else {
            apply(self.registers[x], self.registers[y])
        };
        self.registers[x] = result;
        Ok(next())
    }

    fn shift_source(&self, x: usize, y: usize) -> u8 {
        if self.quirks.shift_uses_vy {
            self.registers[y]
        } else {
            self.registers[x]
        }
    }

    /// The sprite is `n` bytes starting at `I`, every byte is a row of eight pixels which are
    /// xored onto the display. Coordinates wrap around both axes.
    ///
    /// `VF` is cleared first and set on the first collision, the coordinates are read for every
    /// lit pixel. With `operands_before_flag` they are read once and `VF` is written at the end.
    fn draw(&mut self, opcode: Opcode, pc: usize, x: usize, y: usize, n: usize) -> Outcome {
        let rows = self.memory_range(opcode, pc, n)?;
        let live = !self.quirks.operands_before_flag;
        let (coord_x, coord_y) = (self.registers[x], self.registers[y]);
        if live {
            self.registers.set_flag(false);
        }

        let mut collision = false;
        for (row, address) in rows.enumerate() {
            let sprite = self.memory[address];
            for bit in 0..8 {
                if sprite & (0x80u8 >> bit) == 0 {
                    continue;
                }
                let (coord_x, coord_y) = if live {
                    (self.registers[x], self.registers[y])
                } else {
                    (coord_x, coord_y)
                };
                let pos_x = (coord_x as usize + bit) % display::WIDTH;
                let pos_y = (coord_y as usize + row) % display::HEIGHT;
                if self.display.toggle(pos_x, pos_y) {
                    collision = true;
                    if live {
                        self.registers.set_flag(true);
                    }
                }
            }
        }
        self.registers.set_flag(collision);

        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    fn key_state(&self, opcode: Opcode, pc: usize, x: usize) -> Result<bool, ProcessError> {
        let key = self.registers[x];
        self.keyboard
            .is_pressed(key as usize)
            .ok_or(ProcessError::InvalidKey { pc, opcode, key })
    }

    fn await_key_press(&mut self, x: usize) -> (ProgramCounterStep, Operation) {
        match self.keyboard.first_pressed() {
            Some(key) => {
                self.registers[x] = key as u8;
                next()
            }
            None => (ProgramCounterStep::Rewind, Operation::Wait),
        }
    }

    /// The memory `I..I + len`, if all of it is addressable.
    fn memory_range(&self, opcode: Opcode, pc: usize, len: usize) -> Result<Range<usize>, ProcessError> {
        let start = self.index_register as usize;
        if len == 0 {
            return Ok(0..0);
        }
        if start + len > memory::SIZE {
            return Err(ProcessError::MemoryAccessOutOfBounds {
                pc,
                opcode,
                address: start.max(memory::SIZE),
            });
        }
        Ok(start..start + len)
    }
}

#[inline]
fn next() -> (ProgramCounterStep, Operation) {
    (ProgramCounterStep::Next, Operation::None)
}

#[inline]
fn skip(cond: bool) -> (ProgramCounterStep, Operation) {
    (ProgramCounterStep::cond(cond), Operation::None)
}
