use crate::error::Chip8Error;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// number of keys on the COSMAC hex pad
pub const KEY_COUNT: usize = 16;

/// The hex pad as the interpreter sees it: which keys are held right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    pub fn set(&mut self, key: u8, pressed: bool) -> Result<(), Chip8Error> {
        let k = key as usize;
        if k >= KEY_COUNT {
            return Err(Chip8Error::InvalidKey(key));
        }
        self.keys[k] = pressed;
        Ok(())
    }

    /// only the low nibble of `key` counts; registers hold a full byte
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0x0f) as usize]
    }

    /// lowest numbered key that's held
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }
}

/// left-hand side of a qwerty keyboard, laid out like the COSMAC pad:
///   1 2 3 C      1 2 3 4
///   4 5 6 D  <-  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// Terminals only report presses (and auto-repeats), never releases, so a key
/// is held until this long after its last press.
const KEY_HOLD: Duration = Duration::from_millis(150);

/// Reads the keyboard on behalf of the interpreter.
pub trait Input {
    /// current held state of all 16 keys
    fn poll_keys(&mut self) -> Result<Keypad, io::Error>;

    /// has the user asked to stop the emulator?
    fn quit_requested(&self) -> bool;
}

/// implementation of Input reading the terminal through crossterm
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    last_press: [Option<Instant>; KEY_COUNT],
    quit: bool,
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_press: [None; KEY_COUNT],
            quit: false,
        })
    }

    fn read_stdin(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => self.quit = true,
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.quit = true
                    }
                    KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                        Some(&mapped) => self.last_press[mapped as usize] = Some(Instant::now()),
                        None => log::warn!("can't map {:?} to a COSMAC key", key),
                    },
                    _ => log::debug!("ignoring key event {:?}", evt),
                }
            }
        }
        Ok(())
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("failed to restore terminal: {}", e);
        }
    }
}

impl Input for StdinInput {
    fn poll_keys(&mut self) -> Result<Keypad, io::Error> {
        self.read_stdin()?;
        let now = Instant::now();
        let mut keypad = Keypad::new();
        for (key, pressed) in self.last_press.iter().enumerate() {
            if let Some(at) = pressed {
                keypad.keys[key] = now.duration_since(*at) < KEY_HOLD;
            }
        }
        Ok(keypad)
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing; the given keys are held forever
pub struct DummyInput {
    keypad: Keypad,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        let mut keypad = Keypad::new();
        for &k in keys {
            // out of range keys are simply not held
            let _ = keypad.set(k, true);
        }
        DummyInput { keypad }
    }
}

impl Input for DummyInput {
    fn poll_keys(&mut self) -> Result<Keypad, io::Error> {
        Ok(self.keypad)
    }

    fn quit_requested(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_set_and_read() -> Result<(), Chip8Error> {
        let mut k = Keypad::new();
        k.set(0xa, true)?;
        assert!(k.is_pressed(0xa));
        assert!(!k.is_pressed(0xb));
        k.set(0xa, false)?;
        assert!(!k.is_pressed(0xa));
        Ok(())
    }

    #[test]
    fn test_keypad_rejects_out_of_range() {
        let mut k = Keypad::new();
        assert!(matches!(k.set(16, true), Err(Chip8Error::InvalidKey(16))));
        assert_eq!(k, Keypad::new());
    }

    #[test]
    fn test_keypad_masks_register_values() -> Result<(), Chip8Error> {
        let mut k = Keypad::new();
        k.set(0x3, true)?;
        assert!(k.is_pressed(0x13));
        Ok(())
    }

    #[test]
    fn test_first_pressed_is_lowest() -> Result<(), Chip8Error> {
        let mut k = Keypad::new();
        assert_eq!(k.first_pressed(), None);
        k.set(0xc, true)?;
        k.set(0x4, true)?;
        assert_eq!(k.first_pressed(), Some(0x4));
        Ok(())
    }

    #[test]
    fn test_keymap_covers_every_key() {
        let mut seen = [false; KEY_COUNT];
        for (_, k) in CHIP8_CONVENTIONAL_KEYMAP {
            seen[k as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_dummy_input_holds_keys() -> Result<(), io::Error> {
        let mut i = DummyInput::new(&[1, 0xf, 0x20]);
        let k = i.poll_keys()?;
        assert!(k.is_pressed(1));
        assert!(k.is_pressed(0xf));
        assert_eq!(k.first_pressed(), Some(1));
        assert!(!i.quit_requested());
        Ok(())
    }
}
