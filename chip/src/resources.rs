use std::{fs, path::Path};

use crate::RomError;

/// A small keypad tester that is always available, it shows the glyph of the last pressed key
/// in the middle of the screen.
const BUILTIN_NAME: &str = "KEYPAD";
const BUILTIN_DATA: [u8; 28] = [
    0x00, 0xE0, // CLS
    0x6A, 0x00, // LD VA, 0x00
    0x00, 0xE0, // CLS
    0xFA, 0x29, // LD F, VA
    0x60, 0x1C, // LD V0, 0x1C
    0x61, 0x0D, // LD V1, 0x0D
    0xD0, 0x15, // DRW V0, V1, 0x5
    0xFA, 0x0A, // LD VA, K
    0x6B, 0x0A, // LD VB, 0x0A
    0xFB, 0x15, // LD DT, VB
    0xFB, 0x07, // LD VB, DT
    0x3B, 0x00, // SE VB, 0x00
    0x12, 0x14, // JP 0x214
    0x12, 0x04, // JP 0x204
];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents a single rom with it's information
pub struct Rom {
    /// The rom name
    name: String,
    /// The raw program image, it gets loaded at `0x200`
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data
    pub fn new(name: &str, data: Box<[u8]>) -> Self {
        Rom {
            name: name.to_string(),
            data,
        }
    }

    /// Will read the rom from the file system, the file name is used as the rom name.
    ///
    /// The size is checked once the rom is loaded into a chipset.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let data = fs::read(path).map_err(|source| RomError::Io {
            name: name.clone(),
            source,
        })?;

        log::info!("read rom '{}' with {} bytes", name, data.len());
        Ok(Rom::new(&name, data.into_boxed_slice()))
    }

    /// The rom that is used when no other rom was given.
    pub fn builtin() -> Self {
        Rom::new(BUILTIN_NAME, Box::new(BUILTIN_DATA))
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{
        chip8::ChipSet,
        definitions::cpu,
        opcode::{build_opcode, Instruction, Operation},
        LoadError,
    };

    fn temp_file(name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(data).unwrap();
        path
    }

    #[test]
    fn test_builtin_decodes() {
        let rom = Rom::builtin();
        let data = rom.get_data();
        assert_eq!(0, data.len() % 2);

        for i in (0..data.len()).step_by(2) {
            let opcode = build_opcode(data, i).unwrap();
            assert!(Instruction::try_from(opcode).is_ok(), "{:#06X}", opcode);
        }
    }

    #[test]
    fn test_builtin_runs() {
        let mut chip = ChipSet::new();
        chip.load_rom(&Rom::builtin()).unwrap();

        let mut operations = Vec::new();
        for _ in 0..8 {
            operations.push(chip.step().unwrap());
        }
        // draws the glyph of 0 and then waits for a key
        assert_eq!(Operation::Draw, operations[6]);
        assert!(chip.display().get(0x1C, 0x0D));
        assert_eq!(Operation::Wait, operations[7]);
        assert_eq!(0x20E, chip.get_program_counter());

        chip.set_key(0xB, true).unwrap();
        assert_eq!(Operation::None, chip.step().unwrap());
        assert_eq!(0xB, chip.get_registers()[0xA]);
    }

    #[test]
    fn test_from_path() {
        let path = temp_file("rom-ok.ch8", &[0x12, 0x00]);
        let rom = Rom::from_path(&path).unwrap();
        assert_eq!(&[0x12, 0x00], rom.get_data());
        assert!(rom.get_name().ends_with("rom-ok.ch8"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_from_path_missing() {
        let path = std::env::temp_dir().join("this-rom-does-not-exist.ch8");
        assert!(matches!(
            Rom::from_path(&path),
            Err(RomError::Io { .. })
        ));
    }

    #[test]
    fn test_too_large_rom_fails_to_load() {
        let path = temp_file("rom-large.ch8", &vec![0; cpu::PROGRAM_SPACE + 1]);
        let rom = Rom::from_path(&path).unwrap();
        fs::remove_file(path).unwrap();

        let mut chip = ChipSet::new();
        match chip.load_rom(&rom).unwrap_err() {
            RomError::Load { source, .. } => assert_eq!(
                LoadError::ImageTooLarge {
                    len: cpu::PROGRAM_SPACE + 1,
                    capacity: cpu::PROGRAM_SPACE
                },
                source
            ),
            err => panic!("unexpected error {}", err),
        }
    }
}
