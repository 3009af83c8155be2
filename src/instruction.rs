/// # instruction
///
/// Decoding of the 35 standard CHIP-8 instructions. Every instruction is one
/// big-endian 16-bit word; the top nibble selects a family, and families
/// 0, 8, E and F are further split on the low byte or nibble.
///
/// Operand fields:
///  * X   = bits 8-11 (register)
///  * Y   = bits 4-7  (register)
///  * N   = bits 0-3  (4-bit immediate)
///  * NN  = bits 0-7  (8-bit immediate)
///  * NNN = bits 0-11 (address)
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0NNN: machine code routine on the COSMAC; ignored here
    Sys { addr: u16 },
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump { addr: u16 },
    /// 2NNN
    Call { addr: u16 },
    /// 3XNN
    SkipEqImm { x: usize, nn: u8 },
    /// 4XNN
    SkipNeImm { x: usize, nn: u8 },
    /// 5XY0 (any low nibble)
    SkipEqReg { x: usize, y: usize },
    /// 6XNN
    SetImm { x: usize, nn: u8 },
    /// 7XNN, no carry
    AddImm { x: usize, nn: u8 },
    /// 8XY0
    Assign { x: usize, y: usize },
    /// 8XY1
    Or { x: usize, y: usize },
    /// 8XY2
    And { x: usize, y: usize },
    /// 8XY3
    Xor { x: usize, y: usize },
    /// 8XY4, VF = carry
    AddReg { x: usize, y: usize },
    /// 8XY5, VF = !borrow
    SubReg { x: usize, y: usize },
    /// 8XY6, VF = shifted out bit
    ShiftRight { x: usize, y: usize },
    /// 8XY7, VF = !borrow
    SubReverse { x: usize, y: usize },
    /// 8XYE, VF = shifted out bit
    ShiftLeft { x: usize, y: usize },
    /// 9XY0 (any low nibble)
    SkipNeReg { x: usize, y: usize },
    /// ANNN
    SetIndex { addr: u16 },
    /// BNNN
    JumpOffset { addr: u16 },
    /// CXNN
    Random { x: usize, nn: u8 },
    /// DXYN
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E
    SkipKeyPressed { x: usize },
    /// EXA1
    SkipKeyNotPressed { x: usize },
    /// FX07
    GetDelay { x: usize },
    /// FX0A
    WaitKey { x: usize },
    /// FX15
    SetDelay { x: usize },
    /// FX18
    SetSound { x: usize },
    /// FX1E
    AddIndex { x: usize },
    /// FX29
    FontChar { x: usize },
    /// FX33
    Bcd { x: usize },
    /// FX55
    StoreRegs { x: usize },
    /// FX65
    LoadRegs { x: usize },
}

impl Instruction {
    /// Decode an instruction word. `None` means the word doesn't match any
    /// instruction in its family.
    pub fn decode(word: u16) -> Option<Instruction> {
        use Instruction::*;

        let x = ((word & 0x0f00) >> 8) as usize;
        let y = ((word & 0x00f0) >> 4) as usize;
        let n = (word & 0x000f) as u8;
        let nn = (word & 0x00ff) as u8;
        let addr = word & 0x0fff;

        let instruction = match word >> 12 {
            0x0 => match word {
                0x00e0 => ClearScreen,
                0x00ee => Return,
                _ => Sys { addr },
            },
            0x1 => Jump { addr },
            0x2 => Call { addr },
            0x3 => SkipEqImm { x, nn },
            0x4 => SkipNeImm { x, nn },
            // low nibble of 5XY_ and 9XY_ is ignored
            0x5 => SkipEqReg { x, y },
            0x6 => SetImm { x, nn },
            0x7 => AddImm { x, nn },
            0x8 => match n {
                0x0 => Assign { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => SubReg { x, y },
                0x6 => ShiftRight { x, y },
                0x7 => SubReverse { x, y },
                0xe => ShiftLeft { x, y },
                _ => return None,
            },
            0x9 => SkipNeReg { x, y },
            0xa => SetIndex { addr },
            0xb => JumpOffset { addr },
            0xc => Random { x, nn },
            0xd => Draw { x, y, n },
            0xe => match nn {
                0x9e => SkipKeyPressed { x },
                0xa1 => SkipKeyNotPressed { x },
                _ => return None,
            },
            0xf => match nn {
                0x07 => GetDelay { x },
                0x0a => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1e => AddIndex { x },
                0x29 => FontChar { x },
                0x33 => Bcd { x },
                0x55 => StoreRegs { x },
                0x65 => LoadRegs { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }
}

/// disassembly in the usual Cowgod mnemonics, for trace output
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Sys { addr } => write!(f, "SYS  0x{:03x}", addr),
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { addr } => write!(f, "JP   0x{:03x}", addr),
            Call { addr } => write!(f, "CALL 0x{:03x}", addr),
            SkipEqImm { x, nn } => write!(f, "SE   V{:X}, 0x{:02x}", x, nn),
            SkipNeImm { x, nn } => write!(f, "SNE  V{:X}, 0x{:02x}", x, nn),
            SkipEqReg { x, y } => write!(f, "SE   V{:X}, V{:X}", x, y),
            SetImm { x, nn } => write!(f, "LD   V{:X}, 0x{:02x}", x, nn),
            AddImm { x, nn } => write!(f, "ADD  V{:X}, 0x{:02x}", x, nn),
            Assign { x, y } => write!(f, "LD   V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR   V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND  V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR  V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD  V{:X}, V{:X}", x, y),
            SubReg { x, y } => write!(f, "SUB  V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR  V{:X}, V{:X}", x, y),
            SubReverse { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL  V{:X}, V{:X}", x, y),
            SkipNeReg { x, y } => write!(f, "SNE  V{:X}, V{:X}", x, y),
            SetIndex { addr } => write!(f, "LD   I, 0x{:03x}", addr),
            JumpOffset { addr } => write!(f, "JP   V0, 0x{:03x}", addr),
            Random { x, nn } => write!(f, "RND  V{:X}, 0x{:02x}", x, nn),
            Draw { x, y, n } => write!(f, "DRW  V{:X}, V{:X}, {}", x, y, n),
            SkipKeyPressed { x } => write!(f, "SKP  V{:X}", x),
            SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            GetDelay { x } => write!(f, "LD   V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD   V{:X}, K", x),
            SetDelay { x } => write!(f, "LD   DT, V{:X}", x),
            SetSound { x } => write!(f, "LD   ST, V{:X}", x),
            AddIndex { x } => write!(f, "ADD  I, V{:X}", x),
            FontChar { x } => write!(f, "LD   F, V{:X}", x),
            Bcd { x } => write!(f, "LD   B, V{:X}", x),
            StoreRegs { x } => write!(f, "LD   [I], V{:X}", x),
            LoadRegs { x } => write!(f, "LD   V{:X}, [I]", x),
        }
    }
}
