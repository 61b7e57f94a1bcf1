//! Line-oriented write operations on the screen grid.
//!
//! Two distinct write disciplines coexist here:
//!
//! - [`Grid::put_str`] places text at an explicit position and silently
//!   drops anything past the right edge. It never wraps.
//! - [`Grid::write_line`] is the entry point for ordinary output: it
//!   scrolls when the cursor has run off the bottom, truncates to the grid
//!   width, and advances the cursor to the next row. Whole lines are never
//!   dropped.
//!
//! The asymmetry is a contract, not an accident: positioned writes clip,
//! line writes scroll.

use unicode_width::UnicodeWidthChar;

use super::grid::{Cell, Color, Cursor, Grid};

impl Grid {
    /// Place a single character. Out-of-range is a silent no-op.
    ///
    /// Zero-width characters (combining marks) are appended to the cell to
    /// the left so a cell always holds one full grapheme.
    pub fn put_char(&mut self, ch: char, col: u16, row: u16, color: Color) {
        if ch.width().unwrap_or(0) == 0 {
            self.append_to_previous_cell(ch, col, row);
            return;
        }
        self.set(col, row, ch, color);
    }

    fn append_to_previous_cell(&mut self, ch: char, col: u16, row: u16) {
        if col == 0 || col - 1 >= self.cols() || row >= self.rows() {
            return;
        }
        let cell = &mut self.cells[row as usize][(col - 1) as usize];
        if !cell.grapheme.is_empty() {
            cell.grapheme.push(ch);
        }
    }

    /// Place a string left to right starting at `(col, row)`. Characters
    /// past the right edge are dropped; there is no wrapping. Returns the
    /// position one past the last character, for callers that park a
    /// follow-up cursor there.
    pub fn put_str(&mut self, s: &str, col: u16, row: u16, color: Color) -> Cursor {
        let mut x = col;
        for ch in s.chars() {
            if ch.width().unwrap_or(0) == 0 {
                self.put_char(ch, x, row, color);
                continue;
            }
            self.set(x, row, ch, color);
            x = x.saturating_add(1);
        }
        Cursor { col: x, row }
    }

    /// Write one line of output at the cursor row, scrolling first if the
    /// cursor has run off the bottom. Text is truncated to the grid width
    /// and the cursor advances to the start of the next row.
    pub fn write_line(&mut self, text: &str, color: Color) {
        if self.cursor.row >= self.rows() {
            self.scroll();
            self.cursor.row = self.rows() - 1;
        }
        let row = self.cursor.row;
        self.clear_line(row);
        let truncated: String = text.chars().take(self.cols() as usize).collect();
        self.put_str(&truncated, 0, row, color);
        self.cursor = Cursor { col: 0, row: row + 1 };
    }

    /// Shift every row up by one and blank the last row. The cursor is not
    /// adjusted; callers that scroll as part of a bounds check clamp it
    /// themselves.
    pub fn scroll(&mut self) {
        self.cells.remove(0);
        self.cells.push(vec![Cell::default(); self.cols() as usize]);
    }

    /// Blank a single row.
    pub fn clear_line(&mut self, row: u16) {
        if row >= self.rows() {
            return;
        }
        for cell in &mut self.cells[row as usize] {
            *cell = Cell::default();
        }
    }

    /// Blank the whole grid and home the cursor.
    pub fn clear_screen(&mut self) {
        self.reset();
    }

    /// Redraw the interactive prompt on the cursor row: the fixed prefix
    /// followed by the pending input line. The cursor is parked one past
    /// the text so the blink bar tracks the insertion point; the row stays
    /// current so the eventual echo overwrites it.
    pub fn draw_prompt(&mut self, prefix: &str, pending: &str, color: Color) {
        if self.cursor.row >= self.rows() {
            self.scroll();
            self.cursor.row = self.rows() - 1;
        }
        let row = self.cursor.row;
        self.clear_line(row);
        let end = self.put_str(&format!("{prefix}{pending}"), 0, row, color);
        self.cursor = Cursor { col: end.col, row };
    }
}
