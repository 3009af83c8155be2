use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use chip8::display::MonoTermDisplay;
use chip8::environment::{Config, Environment, Stop};
use chip8::input::StdinInput;
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::{Diagnostic, Quirks};
use clap::Parser;

/// Run a CHIP-8 program in the terminal. Keys 1234/qwer/asdf/zxcv are the
/// hex pad; Esc quits.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// program to load at 0x200
    rom: PathBuf,

    /// interpreter cycles (and timer ticks) per second
    #[arg(long, default_value_t = 500)]
    hz: u32,

    /// stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// seed for the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// don't beep
    #[arg(long)]
    mute: bool,

    /// FX55/FX65 advance I past the copied registers, like the COSMAC VIP
    #[arg(long)]
    legacy_index: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            cycle_hz: self.hz,
            max_cycles: self.cycles,
            seed: self.seed,
            mute: self.mute,
            quirks: Quirks {
                increment_index_on_block_copy: self.legacy_index,
            },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = args.config();

    // open the program before the terminal goes into raw mode, so a bad
    // path gets a readable error
    let mut f = File::open(&args.rom)?;

    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new()?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let (stop, diagnostics) = {
        let mut env = Environment::new(config, &mut display, &mut input, sound.as_mut());
        env.load_program(&mut f)?;
        let stop = env.main_loop()?;
        (stop, env.take_diagnostics())
    };

    // restore the terminal before reporting
    drop(input);
    drop(display);
    // the fault itself is reported below
    for d in diagnostics
        .iter()
        .filter(|d| !matches!(d, Diagnostic::Fault(_)))
    {
        eprintln!("warning: {}", d);
    }
    match stop {
        Stop::Fault(fault) => eprintln!("program halted: {}", fault),
        Stop::CycleLimit | Stop::Quit => {}
    }
    Ok(())
}
