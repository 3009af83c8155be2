use crate::error::Chip8Error;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the addressable memory of the machine.
///
/// Byte and word access wraps addresses into the address space, so a running
/// program can never reach outside the backing store. Block writes are
/// checked instead, and fail without writing anything.
pub trait MemoryMap {
    /// number of addressable bytes
    fn size(&self) -> usize;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];

    /// wrap an address into the address space
    fn mask(&self, addr: u16) -> u16 {
        (addr as usize % self.size()) as u16
    }

    /// write unknown len of data into memory at a particular address
    fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<(), Chip8Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.write(&buf, addr)
    }

    /// write a chunk of bytes; all or nothing
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Chip8Error> {
        let capacity = self.size().saturating_sub(addr as usize);
        if data.len() > capacity {
            return Err(Chip8Error::ProgramTooLarge {
                len: data.len(),
                capacity,
            });
        }
        self.get_rw_slice(addr, data.len()).copy_from_slice(data);
        Ok(())
    }

    fn get_byte(&self, addr: u16) -> u8 {
        self.get_ro_slice(self.mask(addr), 1)[0]
    }

    fn set_byte(&mut self, addr: u16, value: u8) {
        let a = self.mask(addr);
        self.get_rw_slice(a, 1)[0] = value;
    }

    /// get a big-endian two-byte word (an instruction)
    fn get_word(&self, addr: u16) -> u16 {
        ((self.get_byte(addr) as u16) << 8) | self.get_byte(addr.wrapping_add(1)) as u16
    }
}

/// Defines the CHIP-8 standard memory map, 4K configuration:
///   0x0000-0x004f  font (16 glyphs of 5 bytes)
///   0x0050-0x01ff  reserved for the interpreter
///   0x0200-0x0fff  program and work RAM
///
/// Stack and display live outside addressable memory.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn size(&self) -> usize {
        self.bytes.len()
    }
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the built-in hex font starts; FX29 relies on this being zero
pub const CHIP8_FONT_ADDR: u16 = 0x0000;

/// bytes per font glyph
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

impl Chip8MemoryMap {
    /// zeroed RAM with the font baked in
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap {
            bytes,
            program_addr: CHIP8_PROGRAM_ADDR,
        }
    }

    /// how many bytes a program may occupy
    pub fn program_capacity(&self) -> usize {
        self.size() - self.program_addr as usize
    }

    /// load a CHIP-8 program at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.write(program, self.program_addr)
    }

    /// load a CHIP-8 program at 0x200 from a file or similar
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        self.write_any(reader, self.program_addr)
    }

    /// address of the glyph for the low nibble of `digit`
    pub fn font_glyph_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + (digit & 0x0f) as u16 * CHIP8_FONT_GLYPH_BYTES
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new();
        // NB. memory is zeroed from 0x50 because before that we bake in the font
        assert!(m.bytes[0x50..].iter().all(|&b| b == 0));
        assert_eq!(m.bytes.len(), CHIP8_RAM_SIZE_BYTES);
    }

    #[test]
    fn test_font_baked_in() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.get_ro_slice(0, 5), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(
            m.get_ro_slice(Chip8MemoryMap::font_glyph_addr(0xa), 5),
            &[0xF0, 0x90, 0xF0, 0x90, 0x90]
        );
    }

    #[test]
    fn test_font_glyph_addr_uses_low_nibble() {
        assert_eq!(Chip8MemoryMap::font_glyph_addr(0x0f), 75);
        assert_eq!(Chip8MemoryMap::font_glyph_addr(0x13), 15);
    }

    #[test]
    fn test_write_any_data_ok() -> Result<(), Chip8Error> {
        let mut dst = Chip8MemoryMap::new();
        let mut src: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
        dst.write_any(&mut src, 0x300)?;
        assert_eq!(
            dst.get_ro_slice(0x2f8, 16),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
        Ok(())
    }

    #[test]
    fn test_read_word() -> Result<(), Chip8Error> {
        let mut m = Chip8MemoryMap::new();
        m.write(&[0, 1, 2, 3, 4, 5, 6, 7], 0x200)?;
        assert_eq!(m.get_word(0x204), 0x0405);
        Ok(())
    }

    #[test]
    fn test_word_wraps_at_top_of_ram() {
        let mut m = Chip8MemoryMap::new();
        m.set_byte(0x0fff, 0x12);
        // second byte comes from 0x000, the first font byte
        assert_eq!(m.get_word(0x0fff), 0x12f0);
    }

    #[test]
    fn test_byte_access_masks_address() {
        let mut m = Chip8MemoryMap::new();
        m.set_byte(0x1234, 0xaa);
        assert_eq!(m.get_byte(0x0234), 0xaa);
        assert_eq!(m.get_byte(0xf234), 0xaa);
    }

    #[test]
    fn test_write_too_much_rejected_untouched() {
        let mut dst = Chip8MemoryMap::new();
        let before = dst.bytes.clone();
        let err = dst.write(&[0xff; 8], 4089).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::ProgramTooLarge {
                len: 8,
                capacity: 7
            }
        ));
        assert_eq!(dst.bytes, before);
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut dst = Chip8MemoryMap::new();
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        dst.load_program_from(&mut prog)?;
        assert_eq!(dst.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_exactly_fills_ram() -> Result<(), Chip8Error> {
        let mut dst = Chip8MemoryMap::new();
        assert_eq!(dst.program_capacity(), 0xe00);
        dst.load_program(&[0x11; 0xe00])?;
        assert_eq!(dst.get_byte(0x0fff), 0x11);
        Ok(())
    }

    #[test]
    fn test_program_too_large() {
        let mut dst = Chip8MemoryMap::new();
        let before = dst.bytes.clone();
        assert!(dst.load_program(&[0x11; 0xe01]).is_err());
        assert_eq!(dst.bytes, before);
    }
}
