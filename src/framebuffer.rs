/// width of the CHIP-8 display, in pixels
pub const DISPLAY_WIDTH: usize = 64;
/// height of the CHIP-8 display, in pixels
pub const DISPLAY_HEIGHT: usize = 32;

const DISPLAY_BYTES: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT / 8;

/// The display state: one bit per pixel, row-major, most significant bit
/// leftmost. This is the same layout the COSMAC kept in its display page.
///
/// Every mutation bumps `generation`, which is how a renderer tells whether
/// anything changed since it last looked.
pub struct FrameBuffer {
    data: [u8; DISPLAY_BYTES],
    generation: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            data: [0; DISPLAY_BYTES],
            generation: 0,
        }
    }

    pub fn clear(&mut self) {
        self.data = [0; DISPLAY_BYTES];
        self.generation += 1;
    }

    /// XOR a sprite onto the display at (x, y), wrapping at the edges.
    /// Returns true if any lit pixel got switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;
        for (dy, row) in rows.iter().enumerate() {
            for dx in 0..8 {
                if row & (0x80 >> dx) == 0 {
                    continue;
                }
                let (byte, mask) = locate(x + dx, y + dy);
                if self.data[byte] & mask != 0 {
                    collision = true;
                }
                self.data[byte] ^= mask;
            }
        }
        self.generation += 1;
        collision
    }

    pub fn snapshot(&self) -> DisplaySnapshot<'_> {
        DisplaySnapshot {
            data: &self.data,
            generation: self.generation,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// byte index and bit mask for a pixel, wrapping both coordinates
fn locate(x: usize, y: usize) -> (usize, u8) {
    let i = (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + (x % DISPLAY_WIDTH);
    (i / 8, 0x80 >> (i % 8))
}

/// Read-only view of the display for a renderer.
#[derive(Clone, Copy)]
pub struct DisplaySnapshot<'a> {
    /// packed pixels, 8 to a byte, `DISPLAY_WIDTH / 8` bytes per row
    pub data: &'a [u8],
    /// bumped on every clear or draw
    pub generation: u64,
}

impl<'a> DisplaySnapshot<'a> {
    pub fn width(&self) -> usize {
        DISPLAY_WIDTH
    }

    pub fn height(&self) -> usize {
        DISPLAY_HEIGHT
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let (byte, mask) = locate(x, y);
        self.data[byte] & mask != 0
    }

    /// has the display changed since the renderer saw `generation`?
    pub fn is_newer_than(&self, generation: u64) -> bool {
        self.generation != generation
    }

    pub fn lit_pixels(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }
}
