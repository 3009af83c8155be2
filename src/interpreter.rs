/// # interpreter
///
/// The CHIP-8 virtual machine itself:
///  * V0-VF   sixteen 8-bit registers; VF doubles as carry/borrow/collision flag
///  * I       12-bit index register, the only memory pointer programs get
///  * PC      12-bit program counter, starts at 0x200
///  * stack   16 return addresses, kept outside addressable RAM
///  * timers  general (delay) and tone (sound), both count down once per cycle
///  * a 64x32 monochrome framebuffer and the 16-key hex pad
///
/// The interpreter never paces itself and never touches a terminal; the host
/// calls `run_cycle` as often as it likes, feeds in keys and reads back the
/// display and tone state.
use crate::error::Chip8Error;
use crate::framebuffer::{DisplaySnapshot, FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::input::Keypad;
use crate::instruction::Instruction;
use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::random::{RandomSource, SystemRandom};
use std::collections::VecDeque;
use std::{fmt, io};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;

/// VF
const FLAG: usize = 0xf;

/// PC and I are 12 bits wide
const ADDRESS_MASK: u16 = 0x0fff;

/// oldest diagnostics are dropped beyond this
const MAX_DIAGNOSTICS: usize = 64;

/// Behaviour that differs between CHIP-8 interpreters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// FX55/FX65 leave I pointing just past the last register copied, as
    /// the COSMAC VIP interpreter did. Off by default: I is left alone.
    pub increment_index_on_block_copy: bool,
}

/// A program error the machine can't continue from. Once faulted, cycles do
/// nothing until the machine is initialised again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// CALL with all 16 stack slots in use
    StackOverflow { addr: u16 },
    /// RET with nothing on the stack
    StackUnderflow { addr: u16 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::StackOverflow { addr } => write!(f, "stack overflow at 0x{:03x}", addr),
            Fault::StackUnderflow { addr } => write!(f, "stack underflow at 0x{:03x}", addr),
        }
    }
}

/// Something worth telling the host about, that didn't stop the cycle from
/// completing (or, for a fault, from being reported).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// the word at `addr` isn't an instruction; it was skipped
    UnknownOpcode { addr: u16, word: u16 },
    Fault(Fault),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownOpcode { addr, word } => {
                write!(f, "unknown opcode 0x{:04x} at 0x{:03x}", word, addr)
            }
            Diagnostic::Fault(fault) => write!(f, "{}", fault),
        }
    }
}

/// where the PC goes once an instruction is done
enum Next {
    Advance,
    Skip,
    Jump(u16),
    /// re-run this instruction next cycle
    Repeat,
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    registers: [u8; REGISTER_COUNT],
    i: u16,
    program_counter: u16,
    stack: Vec<u16>,
    general_timer: u8,
    tone_timer: u8,
    framebuffer: FrameBuffer,
    keypad: Keypad,
    random: Box<dyn RandomSource>,
    quirks: Quirks,
    tone: bool,
    fault: Option<Fault>,
    diagnostics: VecDeque<Diagnostic>,
}

impl Chip8Interpreter {
    /// a freshly initialised machine with an OS-seeded random source
    pub fn new() -> Self {
        Self::with_random(Box::new(SystemRandom::new()))
    }

    pub fn with_random(random: Box<dyn RandomSource>) -> Self {
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            registers: [0; REGISTER_COUNT],
            i: 0,
            program_counter: 0,
            stack: Vec::with_capacity(STACK_DEPTH),
            general_timer: 0,
            tone_timer: 0,
            framebuffer: FrameBuffer::new(),
            keypad: Keypad::new(),
            random,
            quirks: Quirks::default(),
            tone: false,
            fault: None,
            diagnostics: VecDeque::new(),
        }
        .initialized()
    }

    fn initialized(mut self) -> Self {
        self.initialize();
        self
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }

    /// Reset everything: RAM (font reloaded), registers, stack, timers,
    /// display, keys, fault and diagnostics. Quirks and the random source
    /// are configuration and survive.
    pub fn initialize(&mut self) {
        self.memory = Chip8MemoryMap::new();
        self.registers = [0; REGISTER_COUNT];
        self.i = 0;
        self.program_counter = self.memory.program_addr;
        self.stack.clear();
        self.general_timer = 0;
        self.tone_timer = 0;
        self.framebuffer.clear();
        self.keypad = Keypad::new();
        self.tone = false;
        self.fault = None;
        self.diagnostics.clear();
    }

    /// Copy a program in at 0x200. Nothing is written if it doesn't fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_program(program)?;
        log::info!(
            "loaded {} byte program ({} bytes free)",
            program.len(),
            self.memory.program_capacity() - program.len()
        );
        Ok(())
    }

    /// load a chip8 program from a file or similar
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        self.memory.load_program_from(reader)?;
        log::info!("loaded program at 0x{:03x}", self.memory.program_addr);
        Ok(())
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) -> Result<(), Chip8Error> {
        self.keypad.set(key, pressed)
    }

    /// replace the whole key table at once
    pub fn set_keypad(&mut self, keypad: Keypad) {
        self.keypad = keypad;
    }

    pub fn display_snapshot(&self) -> DisplaySnapshot<'_> {
        self.framebuffer.snapshot()
    }

    /// did the tone timer run out during the last cycle?
    pub fn should_tone(&self) -> bool {
        self.tone
    }

    /// is the tone timer still counting, i.e. should the beeper be on?
    pub fn sound_active(&self) -> bool {
        self.tone_timer > 0
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    pub fn register(&self, x: usize) -> u8 {
        self.registers[x & 0xf]
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn delay_timer(&self) -> u8 {
        self.general_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.tone_timer
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    /// Fetch, decode and execute one instruction, then count both timers
    /// down. A faulted machine does nothing at all.
    pub fn run_cycle(&mut self) {
        self.tone = false;
        if self.fault.is_some() {
            return;
        }

        let addr = self.program_counter;
        let word = self.memory.get_word(addr);
        let next = match Instruction::decode(word) {
            Some(instruction) => {
                log::trace!("{:03x}: {:04x}  {}", addr, word, instruction);
                match self.execute(instruction, addr) {
                    Ok(next) => next,
                    Err(fault) => {
                        log::error!("{}", fault);
                        self.fault = Some(fault);
                        self.report(Diagnostic::Fault(fault));
                        return;
                    }
                }
            }
            None => {
                log::warn!("unknown opcode 0x{:04x} at 0x{:03x}", word, addr);
                self.report(Diagnostic::UnknownOpcode { addr, word });
                Next::Advance
            }
        };

        self.program_counter = match next {
            Next::Advance => addr.wrapping_add(2),
            Next::Skip => addr.wrapping_add(4),
            Next::Jump(target) => target,
            Next::Repeat => addr,
        } & ADDRESS_MASK;

        self.tick_timers();
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(diagnostic);
    }

    fn tick_timers(&mut self) {
        self.general_timer = self.general_timer.saturating_sub(1);
        if self.tone_timer == 1 {
            self.tone = true;
        }
        self.tone_timer = self.tone_timer.saturating_sub(1);
    }

    fn skip_if(condition: bool) -> Next {
        if condition {
            Next::Skip
        } else {
            Next::Advance
        }
    }

    /// `addr` is where `instruction` was fetched from
    fn execute(&mut self, instruction: Instruction, addr: u16) -> Result<Next, Fault> {
        use Instruction::*;
        let v = &mut self.registers;

        match instruction {
            Sys { addr: routine } => {
                log::debug!("ignoring machine routine call to 0x{:03x}", routine);
            }
            ClearScreen => self.framebuffer.clear(),
            Return => {
                let target = self.stack.pop().ok_or(Fault::StackUnderflow { addr })?;
                return Ok(Next::Jump(target));
            }
            Jump { addr: target } => return Ok(Next::Jump(target)),
            Call { addr: target } => {
                if self.stack.len() == STACK_DEPTH {
                    return Err(Fault::StackOverflow { addr });
                }
                self.stack.push(addr.wrapping_add(2) & ADDRESS_MASK);
                return Ok(Next::Jump(target));
            }
            SkipEqImm { x, nn } => return Ok(Self::skip_if(v[x] == nn)),
            SkipNeImm { x, nn } => return Ok(Self::skip_if(v[x] != nn)),
            SkipEqReg { x, y } => return Ok(Self::skip_if(v[x] == v[y])),
            SkipNeReg { x, y } => return Ok(Self::skip_if(v[x] != v[y])),
            SetImm { x, nn } => v[x] = nn,
            AddImm { x, nn } => v[x] = v[x].wrapping_add(nn),
            Assign { x, y } => v[x] = v[y],
            Or { x, y } => v[x] |= v[y],
            And { x, y } => v[x] &= v[y],
            Xor { x, y } => v[x] ^= v[y],
            // flag goes in last, so VF holds the flag even when X is F
            AddReg { x, y } => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                v[x] = sum;
                v[FLAG] = carry as u8;
            }
            SubReg { x, y } => {
                let (vx, vy) = (v[x], v[y]);
                v[x] = vx.wrapping_sub(vy);
                v[FLAG] = (vx >= vy) as u8;
            }
            SubReverse { x, y } => {
                let (vx, vy) = (v[x], v[y]);
                v[x] = vy.wrapping_sub(vx);
                v[FLAG] = (vy >= vx) as u8;
            }
            ShiftRight { x, .. } => {
                let vx = v[x];
                v[x] = vx >> 1;
                v[FLAG] = vx & 0x01;
            }
            ShiftLeft { x, .. } => {
                let vx = v[x];
                v[x] = vx << 1;
                v[FLAG] = vx >> 7;
            }
            SetIndex { addr: target } => self.i = target,
            JumpOffset { addr: target } => {
                return Ok(Next::Jump(target.wrapping_add(v[0] as u16) & ADDRESS_MASK));
            }
            Random { x, nn } => v[x] = self.random.next_byte() & nn,
            Draw { x, y, n } => {
                let mut rows = [0u8; 15];
                let rows = &mut rows[..n as usize];
                for (r, row) in rows.iter_mut().enumerate() {
                    *row = self.memory.get_byte(self.i.wrapping_add(r as u16));
                }
                let collision = self.framebuffer.draw_sprite(
                    v[x] as usize % DISPLAY_WIDTH,
                    v[y] as usize % DISPLAY_HEIGHT,
                    rows,
                );
                v[FLAG] = collision as u8;
            }
            SkipKeyPressed { x } => return Ok(Self::skip_if(self.keypad.is_pressed(v[x]))),
            SkipKeyNotPressed { x } => return Ok(Self::skip_if(!self.keypad.is_pressed(v[x]))),
            GetDelay { x } => v[x] = self.general_timer,
            WaitKey { x } => match self.keypad.first_pressed() {
                Some(key) => v[x] = key,
                None => return Ok(Next::Repeat),
            },
            SetDelay { x } => self.general_timer = v[x],
            SetSound { x } => self.tone_timer = v[x],
            AddIndex { x } => {
                let sum = self.i + v[x] as u16;
                v[FLAG] = (sum > ADDRESS_MASK) as u8;
                self.i = sum & ADDRESS_MASK;
            }
            FontChar { x } => self.i = Chip8MemoryMap::font_glyph_addr(v[x]),
            Bcd { x } => {
                let vx = v[x];
                self.memory.set_byte(self.i, vx / 100);
                self.memory.set_byte(self.i.wrapping_add(1), vx / 10 % 10);
                self.memory.set_byte(self.i.wrapping_add(2), vx % 10);
            }
            StoreRegs { x } => {
                for r in 0..=x {
                    self.memory.set_byte(self.i.wrapping_add(r as u16), v[r]);
                }
                self.advance_index_after_block_copy(x);
            }
            LoadRegs { x } => {
                for r in 0..=x {
                    v[r] = self.memory.get_byte(self.i.wrapping_add(r as u16));
                }
                self.advance_index_after_block_copy(x);
            }
        }
        Ok(Next::Advance)
    }

    fn advance_index_after_block_copy(&mut self, x: usize) {
        if self.quirks.increment_index_on_block_copy {
            self.i = self.i.wrapping_add(x as u16 + 1) & ADDRESS_MASK;
        }
    }
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
