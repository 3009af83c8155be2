//! A CHIP-8 interpreter.
//!
//! ## Design
//!
//! * the interpreter is a single owned value; no globals, so any number of
//!   machines can run side by side
//! * one call to `run_cycle` is one instruction plus one tick of each timer;
//!   the interpreter never sleeps, blocks or reads a clock
//! * FX0A "wait for key" blocks by not advancing the PC, so the host just
//!   keeps calling `run_cycle`
//! * the interpreter exposes state (display, tone) and accepts state (keys);
//!   rendering, keyboard mapping and beeping are the host's business
//! * random numbers come from a `RandomSource` so tests can fix them
//!
//! Model
//!
//! Environment
//!  |-- display, input, sound, config
//!  |-- interpreter(config quirks, random source)
//!  |    |-- memory map (font at 0x000, program at 0x200)
//!  |    |-- registers, stack, timers, framebuffer, keypad
//!  |    `-- instruction decode
//!  `-- main loop
//!       |-- keys = input.poll_keys(); interpreter.set_keypad(keys)
//!       |-- interpreter.run_cycle()
//!       |-- if the framebuffer changed: display.draw(snapshot)
//!       |-- beep while the tone timer runs
//!       `-- sleep off the rest of the cycle period
pub mod display;
pub mod environment;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod random;
pub mod sound;

pub use error::Chip8Error;
pub use interpreter::{Chip8Interpreter, Diagnostic, Fault, Quirks};
