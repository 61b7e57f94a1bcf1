//! Frame renderer.
//!
//! One paint per frame: clear the surface, lay a black background, draw
//! every non-blank cell at its pixel position, then the blinking input
//! bar when the prompt is live. The renderer only ever reads the grid;
//! the surface is the one thing it touches.

use std::io;

use crate::core::grid::{Color, Grid};

use super::surface::Surface;

/// Blink cycle length in frames, and how many of them the bar is visible.
const BLINK_PERIOD: u64 = 20;
const BLINK_VISIBLE: u64 = 10;

/// Input bar thickness in pixels, clamped to the cell height.
const CURSOR_BAR_PX: u16 = 2;

/// Grid-to-surface painter. Owns the frame counter and the pixel-per-cell
/// mapping; recomputed from the surface dimensions on resize so that
/// `cell_w = width / cols` and `cell_h = height / rows` stay consistent.
pub struct Renderer {
    cols: u16,
    rows: u16,
    cell_w: u16,
    cell_h: u16,
    font_px: u16,
    frame: u64,
}

impl Renderer {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            cell_w: 1,
            cell_h: 1,
            font_px: 1,
            frame: 0,
        }
    }

    /// Recompute the pixel-per-cell mapping and font scale from the
    /// surface dimensions. Called once at startup and after every resize.
    pub fn layout(&mut self, surface: &dyn Surface) {
        self.cell_w = (surface.width() / self.cols).max(1);
        self.cell_h = (surface.height() / self.rows).max(1);
        self.font_px = (self.cell_h * 4 / 5).max(1);
    }

    /// Paint one frame.
    pub fn render(
        &mut self,
        surface: &mut dyn Surface,
        grid: &Grid,
        accepting_input: bool,
    ) -> io::Result<()> {
        surface.clear();
        surface.fill_rect(0, 0, surface.width(), surface.height(), Color::Black);
        // Drawing state may have been reset since the last frame.
        surface.set_font(self.font_px);

        for row in 0..self.rows.min(grid.rows()) {
            for col in 0..self.cols.min(grid.cols()) {
                if let Ok(cell) = grid.get(col, row) {
                    if cell.is_blank() {
                        continue;
                    }
                    surface.draw_text(
                        cell.display(),
                        col * self.cell_w,
                        row * self.cell_h,
                        cell.color,
                    );
                }
            }
        }

        if accepting_input && self.frame % BLINK_PERIOD < BLINK_VISIBLE {
            let cursor = grid.cursor();
            if cursor.col < self.cols && cursor.row < self.rows {
                let bar = CURSOR_BAR_PX.min(self.cell_h);
                surface.fill_rect(
                    cursor.col * self.cell_w,
                    cursor.row * self.cell_h + self.cell_h - bar,
                    self.cell_w,
                    bar,
                    Color::Green,
                );
            }
        }

        self.frame += 1;
        surface.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Grid;

    #[derive(Debug, PartialEq)]
    enum Op {
        Clear,
        Rect(u16, u16, u16, u16, Color),
        Text(String, u16, u16, Color),
        Font(u16),
    }

    struct RecordingSurface {
        w: u16,
        h: u16,
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn new(w: u16, h: u16) -> Self {
            Self { w, h, ops: Vec::new() }
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> u16 {
            self.w
        }
        fn height(&self) -> u16 {
            self.h
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color) {
            self.ops.push(Op::Rect(x, y, w, h, color));
        }
        fn draw_text(&mut self, text: &str, x: u16, y: u16, color: Color) {
            self.ops.push(Op::Text(text.to_string(), x, y, color));
        }
        fn set_font(&mut self, height_px: u16) {
            self.ops.push(Op::Font(height_px));
        }
        fn present(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_layout_divides_surface_into_cells() {
        let mut renderer = Renderer::new(80, 25);
        let surface = RecordingSurface::new(800, 500);
        renderer.layout(&surface);
        assert_eq!(renderer.cell_w, 10);
        assert_eq!(renderer.cell_h, 20);
        assert_eq!(renderer.font_px, 16);
    }

    #[test]
    fn test_render_paints_nonblank_cells_at_pixel_positions() {
        let mut grid = Grid::new(80, 25);
        grid.set(2, 1, 'A', Color::Amber);
        let mut renderer = Renderer::new(80, 25);
        let mut surface = RecordingSurface::new(800, 500);
        renderer.layout(&surface);
        renderer.render(&mut surface, &grid, false).unwrap();

        assert_eq!(surface.ops[0], Op::Clear);
        assert_eq!(surface.ops[1], Op::Rect(0, 0, 800, 500, Color::Black));
        assert_eq!(surface.ops[2], Op::Font(16));
        assert_eq!(
            surface.ops[3],
            Op::Text("A".to_string(), 20, 20, Color::Amber)
        );
        assert_eq!(surface.ops.len(), 4);
    }

    #[test]
    fn test_blink_bar_follows_cursor_while_accepting() {
        let mut grid = Grid::new(80, 25);
        grid.draw_prompt("> ", "", Color::Green);
        let mut renderer = Renderer::new(80, 25);
        let mut surface = RecordingSurface::new(800, 500);
        renderer.layout(&surface);

        // Frames 0..9 draw the bar, 10..19 hide it.
        for frame in 0..20u16 {
            surface.ops.clear();
            renderer.render(&mut surface, &grid, true).unwrap();
            let bar = surface
                .ops
                .iter()
                .any(|op| matches!(op, Op::Rect(20, 18, 10, 2, Color::Green)));
            assert_eq!(bar, frame < 10, "frame {frame}");
        }
    }

    #[test]
    fn test_no_blink_bar_while_awaiting() {
        let mut grid = Grid::new(80, 25);
        grid.draw_prompt("> ", "", Color::Green);
        let mut renderer = Renderer::new(80, 25);
        let mut surface = RecordingSurface::new(80, 25);
        renderer.layout(&surface);
        renderer.render(&mut surface, &grid, false).unwrap();
        assert!(!surface
            .ops
            .iter()
            .any(|op| matches!(op, Op::Rect(_, _, _, _, Color::Green))));
    }
}
