//! The state dump of the [`ChipSet`], used when execution halts and for debugging.

use std::fmt::{self, Write};

use num_traits::{PrimInt, Unsigned};
use once_cell::sync::Lazy;

use super::ChipSet;
use crate::{
    definitions::memory,
    opcode::{self, Opcode},
};

/// How many opcodes are shown per memory row.
const HEX_PRINT_STEP: usize = 8;

/// The bytes covered by a single memory row.
const ROW_SIZE: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;

const INDENT: &str = "\t";

/// Stands in for a run of rows that contain only zeros.
static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
    let zero = integer(0u16);
    let width = (zero.len() + 1) * HEX_PRINT_STEP - 1;
    format!("{:^width$}", "...", width = width)
});

/// All integers are shown as zero padded hex with the `0x` prefix and four digits.
fn integer<T>(value: T) -> String
where
    T: PrimInt + Unsigned + fmt::UpperHex,
{
    format!("{:#06X}", value)
}

fn list<T>(values: &[T]) -> String
where
    T: PrimInt + Unsigned + fmt::UpperHex,
{
    values
        .iter()
        .map(|value| integer(*value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes the memory in rows of opcodes, several rows of zeros in a row are collapsed.
fn memory_dump(f: &mut String, data: &[u8]) -> fmt::Result {
    let mut zero_rows = 0;
    for (index, row) in data.chunks(ROW_SIZE).enumerate() {
        let from = index * ROW_SIZE;
        let to = from + row.len() - 1;

        if row.iter().all(|byte| *byte == 0) {
            zero_rows += 1;
            if zero_rows == 2 {
                writeln!(f, "{}{:18}{}", INDENT, "", *ZERO_FILLER)?;
            }
            if zero_rows >= 2 {
                continue;
            }
        } else {
            zero_rows = 0;
        }

        let opcodes: Vec<Opcode> = (0..row.len())
            .step_by(memory::opcodes::SIZE)
            .filter_map(|pointer| opcode::build_opcode(row, pointer).ok())
            .collect();
        writeln!(
            f,
            "{}{} - {} : {}",
            INDENT,
            integer(from as u16),
            integer(to as u16),
            list(&opcodes)
        )?;
    }
    Ok(())
}

impl fmt::Display for ChipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();

        writeln!(text, "Opcode: {}", integer(self.opcode))?;
        writeln!(text, "Program Counter: {}", integer(self.program_counter as u16))?;
        writeln!(text, "Index Register: {}", integer(self.index_register))?;
        writeln!(text, "Delay Timer: {}", integer(self.delay_timer))?;
        writeln!(text, "Sound Timer: {}", integer(self.sound_timer))?;
        writeln!(text, "Registers:\n{}{}", INDENT, list(&self.registers[..]))?;
        writeln!(text, "Stack:\n{}{}", INDENT, list(&self.stack[..]))?;

        let keys: String = self
            .keyboard
            .get_keys()
            .iter()
            .map(|&pressed| if pressed { '1' } else { '0' })
            .collect();
        writeln!(text, "Keyboard:\n{}{}", INDENT, keys)?;

        writeln!(text, "Memory:")?;
        memory_dump(&mut text, &self.memory)?;

        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer() {
        assert_eq!("0x0000", integer(0u8));
        assert_eq!("0x00FF", integer(0xFFu8));
        assert_eq!("0x1EDA", integer(0x1EDAu16));
    }

    #[test]
    fn test_memory_dump_collapses_zeros() {
        let mut data = [0u8; ROW_SIZE * 4];
        data[0] = 0x12;
        data[ROW_SIZE * 3 + 1] = 0x34;

        let mut text = String::new();
        memory_dump(&mut text, &data).unwrap();
        let lines: Vec<_> = text.lines().collect();

        // first row, the first zero row, the filler and the last row
        assert_eq!(4, lines.len());
        assert!(lines[0].contains("0x0000 - 0x000F : 0x1200"));
        assert!(lines[2].trim().starts_with("..."));
        assert!(lines[3].contains("0x0030 - 0x003F : 0x0034"));
    }

    #[test]
    fn test_display_contains_state() {
        let mut chip = ChipSet::new();
        chip.registers[0xA] = 0xBC;
        chip.stack.push(0x0202);
        chip.set_key(0x1, true).unwrap();

        let text = chip.to_string();
        assert!(text.contains("Program Counter: 0x0200"));
        assert!(text.contains("0x00BC"));
        assert!(text.contains("Stack:\n\t0x0202"));
        assert!(text.contains("Keyboard:\n\t0100000000000000"));
        // the font is the first thing in memory
        assert!(text.contains("0x0000 - 0x000F : 0xF090"));
    }
}
