//! Output surface abstraction.
//!
//! The renderer paints through this trait rather than touching the host
//! directly: a surface reports its pixel dimensions and offers the usual
//! raster primitives. The shipped implementation maps the host console
//! onto the surface, one console cell per pixel unit; tests substitute a
//! recording surface.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::core::grid::Color;

/// A raster surface the renderer can paint on. Pixel units; the surface
/// may reset drawing state between frames, so the renderer re-applies the
/// font every frame.
pub trait Surface {
    fn width(&self) -> u16;
    fn height(&self) -> u16;
    /// Clear the whole surface.
    fn clear(&mut self);
    fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color);
    fn draw_text(&mut self, text: &str, x: u16, y: u16, color: Color);
    fn set_font(&mut self, height_px: u16);
    /// Flush the frame to the host.
    fn present(&mut self) -> io::Result<()>;
}

/// Console-backed surface using crossterm. One console cell is one pixel
/// unit, so an 80x25 grid on an 80x25 console gets 1x1-pixel cells.
pub struct ConsoleSurface {
    size: (u16, u16),
    initialized: bool,
    /// Queued frame, flushed by `present`.
    buf: Vec<u8>,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self {
            size: (0, 0),
            initialized: false,
            buf: Vec::with_capacity(65536),
        }
    }

    /// Initialize the console for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            Hide,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        // Enable synchronized output mode (reduces flicker)
        write!(stdout, "\x1b[?2026h")?;
        stdout.flush()?;
        self.size = terminal::size()?;
        self.initialized = true;
        Ok(())
    }

    /// Restore the console
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        write!(stdout, "\x1b[?2026l")?;
        let _ = execute!(stdout, ResetColor, Show, EnableLineWrap, LeaveAlternateScreen);
        let _ = stdout.flush();
        terminal::disable_raw_mode()?;
        println!();
        Ok(())
    }

    /// Track a host resize; the renderer recomputes its cell mapping from
    /// the new dimensions before the next paint.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for ConsoleSurface {
    fn width(&self) -> u16 {
        self.size.0
    }

    fn height(&self) -> u16 {
        self.size.1
    }

    fn clear(&mut self) {
        let _ = write!(self.buf, "\x1b[?2026h");
        let _ = queue!(self.buf, ResetColor, Clear(ClearType::All));
    }

    fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        let run = " ".repeat(w as usize);
        let _ = queue!(self.buf, SetBackgroundColor(color.to_crossterm()));
        for dy in 0..h {
            let _ = queue!(self.buf, MoveTo(x, y + dy), Print(&run));
        }
        let _ = queue!(self.buf, ResetColor);
    }

    fn draw_text(&mut self, text: &str, x: u16, y: u16, color: Color) {
        let _ = queue!(
            self.buf,
            MoveTo(x, y),
            SetBackgroundColor(Color::Black.to_crossterm()),
            SetForegroundColor(color.to_crossterm()),
            Print(text)
        );
    }

    fn set_font(&mut self, _height_px: u16) {
        // The console's font is fixed; nothing to re-apply.
    }

    fn present(&mut self) -> io::Result<()> {
        let _ = write!(self.buf, "\x1b[?2026l");
        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        stdout.write_all(&self.buf)?;
        stdout.flush()?;
        self.buf.clear();
        Ok(())
    }
}

impl Drop for ConsoleSurface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
