use crate::{
    chip8::Display,
    definitions::keyboard,
    DeviceError, KeyboardError,
};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will display all the pixels, the display is in row major order
    fn display(&mut self, pixels: &Display) -> Result<(), DeviceError>;
}

/// A single event reported by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The key with the given index changed its state
    Key { index: usize, pressed: bool },
    /// The user asked to stop the emulation
    Quit,
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for collecting the keyboard data
pub trait KeyboardCommands {
    /// Will return all the events that happened since the last poll.
    fn poll(&mut self) -> Result<Vec<InputEvent>, DeviceError>;
}

/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn reset(&mut self) {
        self.keys = [false; keyboard::SIZE];
    }

    pub fn set_key(&mut self, key: usize, to: bool) -> Result<(), KeyboardError> {
        let entry = self
            .keys
            .get_mut(key)
            .ok_or(KeyboardError::InvalidKey(key))?;
        *entry = to;
        Ok(())
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }

    /// Returns the state of the key or `None` if there is no such key.
    pub fn is_pressed(&self, key: usize) -> Option<bool> {
        self.keys.get(key).copied()
    }

    /// The lowest index of all the pressed keys.
    pub fn first_pressed(&self) -> Option<usize> {
        self.keys.iter().position(|&key| key)
    }
}
