use std::time::{Duration, Instant};

use chip::{
    definitions::keyboard,
    devices::{InputEvent, KeyboardCommands},
    DeviceError,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use hashbrown::HashMap;

/// The left-hand side of a qwerty keyboard, laid out like the hex keypad.
const CONVENTIONAL_ROWS: [[char; 4]; 4] = [
    ['1', '2', '3', '4'],
    ['q', 'w', 'e', 'r'],
    ['a', 's', 'd', 'f'],
    ['z', 'x', 'c', 'v'],
];

/// How long a key counts as pressed after the terminal reported it.
pub const KEY_HOLD: Duration = Duration::from_millis(150);

/// map of the keys read from the terminal to what the chip8 expects
pub fn conventional_keymap() -> HashMap<char, usize> {
    CONVENTIONAL_ROWS
        .iter()
        .zip(keyboard::LAYOUT.iter())
        .flat_map(|(chars, keys)| chars.iter().copied().zip(keys.iter().copied()))
        .collect()
}

/// Terminals rarely report releases, so every press is remembered for a fixed hold time and
/// released after it.
#[derive(Debug)]
pub struct KeyLatches {
    hold: Duration,
    pressed: HashMap<usize, Instant>,
}

impl KeyLatches {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            pressed: HashMap::new(),
        }
    }

    /// Returns the event to forward, repeated presses only extend the hold.
    pub fn press(&mut self, key: usize, now: Instant) -> Option<InputEvent> {
        match self.pressed.insert(key, now) {
            Some(_) => None,
            None => Some(InputEvent::Key {
                index: key,
                pressed: true,
            }),
        }
    }

    pub fn release(&mut self, key: usize) -> Option<InputEvent> {
        self.pressed.remove(&key).map(|_| InputEvent::Key {
            index: key,
            pressed: false,
        })
    }

    /// Releases all the keys whose hold ran out at `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        let hold = self.hold;
        let mut expired: Vec<usize> = self
            .pressed
            .iter()
            .filter(|(_, since)| now.saturating_duration_since(**since) >= hold)
            .map(|(key, _)| *key)
            .collect();
        expired.sort_unstable();

        expired
            .into_iter()
            .filter_map(|key| self.release(key))
            .collect()
    }
}

/// Translates a single terminal key event.
fn translate(
    keymap: &HashMap<char, usize>,
    latches: &mut KeyLatches,
    key: KeyEvent,
    now: Instant,
) -> Option<InputEvent> {
    match key.code {
        KeyCode::Esc => Some(InputEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Char(c) => match keymap.get(&c.to_ascii_lowercase()) {
            Some(&index) if key.kind == KeyEventKind::Release => latches.release(index),
            Some(&index) => latches.press(index, now),
            None => {
                log::warn!("can't map {:?} to a chip8 key", c);
                None
            }
        },
        code => {
            log::warn!("unknown key event received {:?}", code);
            None
        }
    }
}

/// Reads the key presses from the terminal, it relies on the display having put the terminal
/// into raw mode.
pub struct TerminalKeyboard {
    keymap: HashMap<char, usize>,
    latches: KeyLatches,
}

impl TerminalKeyboard {
    pub fn new(hold: Duration) -> Self {
        Self {
            keymap: conventional_keymap(),
            latches: KeyLatches::new(hold),
        }
    }
}

impl KeyboardCommands for TerminalKeyboard {
    fn poll(&mut self) -> Result<Vec<InputEvent>, DeviceError> {
        let now = Instant::now();
        let mut events = self.latches.expire(now);

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = translate(&self.keymap, &mut self.latches, key, now) {
                    events.push(event);
                }
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_keymap() {
        let keymap = conventional_keymap();
        assert_eq!(keyboard::SIZE, keymap.len());
        assert_eq!(Some(&0x1), keymap.get(&'1'));
        assert_eq!(Some(&0xC), keymap.get(&'4'));
        assert_eq!(Some(&0x0), keymap.get(&'x'));
        assert_eq!(Some(&0xA), keymap.get(&'z'));
        assert_eq!(Some(&0xF), keymap.get(&'v'));

        let mut values: Vec<_> = keymap.values().copied().collect();
        values.sort_unstable();
        assert_eq!((0..keyboard::SIZE).collect::<Vec<_>>(), values);
    }

    #[test]
    fn test_latches() {
        let start = Instant::now();
        let mut latches = KeyLatches::new(KEY_HOLD);

        assert_eq!(
            Some(InputEvent::Key {
                index: 0x5,
                pressed: true
            }),
            latches.press(0x5, start)
        );
        // auto repeat only extends the hold
        assert_eq!(None, latches.press(0x5, start + KEY_HOLD / 2));

        assert!(latches.expire(start + KEY_HOLD).is_empty());
        assert_eq!(
            vec![InputEvent::Key {
                index: 0x5,
                pressed: false
            }],
            latches.expire(start + KEY_HOLD / 2 + KEY_HOLD)
        );
        assert_eq!(None, latches.release(0x5));
    }

    #[test]
    fn test_translate() {
        let keymap = conventional_keymap();
        let mut latches = KeyLatches::new(KEY_HOLD);
        let now = Instant::now();

        assert_eq!(
            Some(InputEvent::Quit),
            translate(&keymap, &mut latches, key(KeyCode::Esc, KeyModifiers::NONE), now)
        );
        assert_eq!(
            Some(InputEvent::Quit),
            translate(
                &keymap,
                &mut latches,
                key(KeyCode::Char('c'), KeyModifiers::CONTROL),
                now
            )
        );
        assert_eq!(
            Some(InputEvent::Key {
                index: 0xB,
                pressed: true
            }),
            translate(
                &keymap,
                &mut latches,
                key(KeyCode::Char('C'), KeyModifiers::SHIFT),
                now
            )
        );
        assert_eq!(
            None,
            translate(&keymap, &mut latches, key(KeyCode::Char('p'), KeyModifiers::NONE), now)
        );
        assert_eq!(
            None,
            translate(&keymap, &mut latches, key(KeyCode::Enter, KeyModifiers::NONE), now)
        );
    }

    #[test]
    fn test_translate_release() {
        let keymap = conventional_keymap();
        let mut latches = KeyLatches::new(KEY_HOLD);
        let now = Instant::now();

        translate(&keymap, &mut latches, key(KeyCode::Char('w'), KeyModifiers::NONE), now);
        let mut release = key(KeyCode::Char('w'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(
            Some(InputEvent::Key {
                index: 0x5,
                pressed: false
            }),
            translate(&keymap, &mut latches, release, now)
        );
    }
}
