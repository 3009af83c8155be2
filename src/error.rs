use std::io;
use thiserror::Error;

/// Errors surfaced to whoever is hosting the interpreter. Faults inside a
/// running program are not errors; see `interpreter::Fault`.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program is {len} bytes but only {capacity} bytes are available")]
    ProgramTooLarge { len: usize, capacity: usize },

    #[error("key 0x{0:02x} is outside the 16-key pad")]
    InvalidKey(u8),

    #[error(transparent)]
    Io(#[from] io::Error),
}
