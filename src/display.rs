use crate::framebuffer::DisplaySnapshot;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the host to put the interpreter's framebuffer on a
/// screen. It should abstract the implementation details, so a variety of
/// kinds of screen would work.
pub trait Display {
    /// present a frame
    fn draw(&mut self, frame: &DisplaySnapshot) -> Result<(), io::Error>;
}

// width and height of the frame being rendered
struct Resolution(usize, usize);

impl Resolution {
    fn of(frame: &DisplaySnapshot) -> Self {
        Resolution(frame.width(), frame.height())
    }

    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel that's set (or clear), y growing
    /// downwards
    fn bitplane_from_frame<'a>(
        &self,
        frame: DisplaySnapshot<'a>,
        lit: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count();
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                let (x, y) = (count % w, count / w);
                if frame.pixel(x, y) == lit {
                    return Some((x as f64, -1.0 * y as f64));
                }
            }
            None
        })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay { terminal })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen) {
            log::error!("failed to restore terminal: {}", e);
        }
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &DisplaySnapshot) -> Result<(), io::Error> {
        let resolution = Resolution::of(frame);

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution
                            .bitplane_from_frame(*frame, false)
                            .collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution
                            .bitplane_from_frame(*frame, true)
                            .collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; counts frames and remembers
/// how many pixels the last one had lit
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub last_lit: usize,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &DisplaySnapshot) -> Result<(), io::Error> {
        self.frames += 1;
        self.last_lit = frame.lit_pixels();
        Ok(())
    }
}
