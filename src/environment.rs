/// # environment
///
/// Sets everything up and runs the main loop. The interpreter knows nothing
/// about wall-clock time or devices, so each pass of the loop:
///
///  * polls the input device and hands the held keys to the interpreter
///  * runs one interpreter cycle
///  * redraws the display if the framebuffer changed
///  * switches the beeper on or off to follow the tone timer
///  * sleeps off whatever is left of the cycle period
use crate::display::Display;
use crate::error::Chip8Error;
use crate::input::Input;
use crate::interpreter::{Chip8Interpreter, Diagnostic, Fault, Quirks};
use crate::random::{RandomSource, SystemRandom};
use crate::sound::Sound;
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

/// Host settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// interpreter cycles per second; timers tick once per cycle too
    pub cycle_hz: u32,
    /// stop after this many cycles
    pub max_cycles: Option<u64>,
    /// seed the random source, for reproducible runs
    pub seed: Option<u64>,
    pub mute: bool,
    pub quirks: Quirks,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cycle_hz: 500,
            max_cycles: None,
            seed: None,
            mute: false,
            quirks: Quirks::default(),
        }
    }
}

impl Config {
    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs(1) / self.cycle_hz.max(1)
    }
}

/// why the main loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    Quit,
    CycleLimit,
    Fault(Fault),
}

pub struct Environment<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: Config,
    cycles: u64,
    drawn: Option<u64>,
}

impl<'a> Environment<'a> {
    pub fn new(
        config: Config,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        let random: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SystemRandom::seeded(seed)),
            None => Box::new(SystemRandom::new()),
        };
        let mut interpreter = Chip8Interpreter::with_random(random);
        interpreter.set_quirks(config.quirks);
        Environment {
            interpreter,
            display,
            input,
            sound,
            config,
            cycles: 0,
            drawn: None,
        }
    }

    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        self.interpreter.load_program_from(reader)
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// everything the interpreter complained about since the last call
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.interpreter.take_diagnostics()
    }

    /// one pass of the main loop, without the sleep
    pub fn step(&mut self) -> Result<Option<Stop>, Box<dyn Error>> {
        let keys = self.input.poll_keys()?;
        if self.input.quit_requested() {
            return Ok(Some(Stop::Quit));
        }
        self.interpreter.set_keypad(keys);

        self.interpreter.run_cycle();
        self.cycles += 1;

        let frame = self.interpreter.display_snapshot();
        if self.drawn.map_or(true, |seen| frame.is_newer_than(seen)) {
            self.display.draw(&frame)?;
            self.drawn = Some(frame.generation);
        }

        let active = self.interpreter.sound_active();
        if active && !self.sound.is_beeping() {
            self.sound.beep()?;
        } else if !active && self.sound.is_beeping() {
            self.sound.stop()?;
        }

        if let Some(fault) = self.interpreter.fault() {
            return Ok(Some(Stop::Fault(fault)));
        }
        if self.config.max_cycles.map_or(false, |max| self.cycles >= max) {
            return Ok(Some(Stop::CycleLimit));
        }
        Ok(None)
    }

    pub fn main_loop(&mut self) -> Result<Stop, Box<dyn Error>> {
        let period = self.config.cycle_period();
        let mut deadline = Instant::now();
        loop {
            if let Some(stop) = self.step()? {
                if self.sound.is_beeping() {
                    self.sound.stop()?;
                }
                log::info!("stopped after {} cycles: {:?}", self.cycles, stop);
                return Ok(stop);
            }

            deadline += period;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else {
                // running slow; don't try to catch up
                deadline = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::sound::Mute;

    fn fast(max_cycles: u64) -> Config {
        Config {
            cycle_hz: 1_000_000,
            max_cycles: Some(max_cycles),
            seed: Some(7),
            ..Config::default()
        }
    }

    #[test]
    fn test_cycle_period() {
        let c = Config {
            cycle_hz: 500,
            ..Config::default()
        };
        assert_eq!(c.cycle_period(), Duration::from_millis(2));
        let c = Config {
            cycle_hz: 0,
            ..Config::default()
        };
        assert_eq!(c.cycle_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_main_loop_draws_only_on_change() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(fast(10), &mut display, &mut input, &mut sound);
        // I = 0x206; DRW V0, V0, 1; JP 0x204; sprite
        let mut prog: &[u8] = &[0xa2, 0x06, 0xd0, 0x01, 0x12, 0x04, 0xff];
        env.load_program(&mut prog)?;

        assert_eq!(env.main_loop()?, Stop::CycleLimit);
        assert_eq!(env.cycles(), 10);
        drop(env);
        assert_eq!(display.frames, 2);
        assert_eq!(display.last_lit, 8);
        Ok(())
    }

    #[test]
    fn test_main_loop_follows_tone_timer() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(fast(3), &mut display, &mut input, &mut sound);
        // V3 = 3; ST = V3; JP 0x204
        let mut prog: &[u8] = &[0x63, 0x03, 0xf3, 0x18, 0x12, 0x04];
        env.load_program(&mut prog)?;

        env.main_loop()?;
        assert!(env.interpreter().sound_active());
        drop(env);
        // switched off when the loop stopped
        assert!(!sound.is_beeping());
        assert_eq!(sound.beeps, 1);
        Ok(())
    }

    #[test]
    fn test_step_switches_beeper_off() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(fast(100), &mut display, &mut input, &mut sound);
        let mut prog: &[u8] = &[0x63, 0x02, 0xf3, 0x18, 0x12, 0x04];
        env.load_program(&mut prog)?;

        env.step()?;
        env.step()?;
        assert!(env.sound.is_beeping());
        env.step()?;
        assert!(!env.sound.is_beeping());
        Ok(())
    }

    #[test]
    fn test_keys_reach_interpreter() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[0x5]);
        let mut sound = Mute::new();
        let mut env = Environment::new(fast(2), &mut display, &mut input, &mut sound);
        let mut prog: &[u8] = &[0xf3, 0x0a, 0x12, 0x02];
        env.load_program(&mut prog)?;

        env.main_loop()?;
        assert_eq!(env.interpreter().register(3), 5);
        Ok(())
    }

    #[test]
    fn test_fault_stops_loop() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(fast(100), &mut display, &mut input, &mut sound);
        let mut prog: &[u8] = &[0x00, 0xee];
        env.load_program(&mut prog)?;

        assert_eq!(
            env.main_loop()?,
            Stop::Fault(Fault::StackUnderflow { addr: 0x200 })
        );
        assert_eq!(env.cycles(), 1);
        Ok(())
    }

    #[test]
    fn test_diagnostics_survive_the_loop() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut env = Environment::new(fast(100), &mut display, &mut input, &mut sound);
        // unknown opcode, then RET with an empty stack
        let mut prog: &[u8] = &[0x80, 0x0f, 0x00, 0xee];
        env.load_program(&mut prog)?;

        env.main_loop()?;
        assert_eq!(
            env.take_diagnostics(),
            vec![
                Diagnostic::UnknownOpcode {
                    addr: 0x200,
                    word: 0x800f
                },
                Diagnostic::Fault(Fault::StackUnderflow { addr: 0x202 }),
            ]
        );
        assert!(env.take_diagnostics().is_empty());
        Ok(())
    }

    #[test]
    fn test_seeded_runs_repeat() -> Result<(), Box<dyn Error>> {
        let mut results = Vec::new();
        for _ in 0..2 {
            let mut display = DummyDisplay::new();
            let mut input = DummyInput::new(&[]);
            let mut sound = Mute::new();
            let mut env = Environment::new(fast(4), &mut display, &mut input, &mut sound);
            let mut prog: &[u8] = &[0xc0, 0xff, 0xc1, 0xff, 0xc2, 0xff, 0xc3, 0xff];
            env.load_program(&mut prog)?;
            env.main_loop()?;
            let i = env.interpreter();
            results.push([i.register(0), i.register(1), i.register(2), i.register(3)]);
        }
        assert_eq!(results[0], results[1]);
        Ok(())
    }

    #[test]
    fn test_quirks_are_applied() {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let config = Config {
            quirks: Quirks {
                increment_index_on_block_copy: true,
            },
            ..fast(1)
        };
        let env = Environment::new(config, &mut display, &mut input, &mut sound);
        assert!(env.interpreter().quirks().increment_index_on_block_copy);
    }
}
