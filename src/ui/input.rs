//! Keyboard input routing.
//!
//! Builds the pending command line from key events and hands it to the
//! session on submit. Keystrokes are only accepted while the prompt is
//! live; anything typed mid-request is dropped, not buffered.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::grid::{Color, Grid};
use crate::core::session::{RemoteSession, SessionState, PROMPT_PREFIX};

/// The not-yet-submitted command line.
pub struct InputRouter {
    pending: String,
}

impl InputRouter {
    pub fn new() -> Self {
        Self {
            pending: String::new(),
        }
    }

    #[allow(dead_code)]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Route one key event. Returns true if the event was consumed. After
    /// every accepted keystroke the prompt line is redrawn so the visible
    /// buffer always matches the pending line exactly.
    pub fn handle_key(
        &mut self,
        key: &KeyEvent,
        grid: &mut Grid,
        session: &mut RemoteSession,
    ) -> bool {
        if session.state() != SessionState::AcceptingInput {
            return false;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => {
                self.pending.push(c);
            }
            KeyCode::Backspace => {
                // No-op on an empty line.
                self.pending.pop();
            }
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.pending);
                session.submit_command(&line, grid);
                return true;
            }
            _ => return false,
        }
        grid.draw_prompt(PROMPT_PREFIX, &self.pending, Color::Green);
        true
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{Cursor, Grid};
    use crate::core::session::testing::{accepting_session, pump, rescript, scripted_session};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn row_text(grid: &Grid, row: u16) -> String {
        let mut out = String::new();
        for col in 0..grid.cols() {
            out.push_str(grid.get(col, row).unwrap().display());
        }
        out.trim_end().to_string()
    }

    #[test]
    fn test_typing_builds_pending_line_and_redraws_prompt() {
        let mut grid = Grid::new(80, 25);
        let mut session = accepting_session(&mut grid);
        let mut router = InputRouter::new();

        assert!(router.handle_key(&key(KeyCode::Char('l')), &mut grid, &mut session));
        assert!(router.handle_key(&key(KeyCode::Char('s')), &mut grid, &mut session));
        assert_eq!(router.pending(), "ls");
        assert_eq!(row_text(&grid, 0), "> ls");
        assert_eq!(grid.cursor(), Cursor { col: 4, row: 0 });
    }

    #[test]
    fn test_backspace_removes_last_char() {
        let mut grid = Grid::new(80, 25);
        let mut session = accepting_session(&mut grid);
        let mut router = InputRouter::new();

        router.handle_key(&key(KeyCode::Char('a')), &mut grid, &mut session);
        router.handle_key(&key(KeyCode::Char('b')), &mut grid, &mut session);
        router.handle_key(&key(KeyCode::Backspace), &mut grid, &mut session);
        assert_eq!(router.pending(), "a");
        assert_eq!(row_text(&grid, 0), "> a");

        // Draining past empty stays empty.
        router.handle_key(&key(KeyCode::Backspace), &mut grid, &mut session);
        router.handle_key(&key(KeyCode::Backspace), &mut grid, &mut session);
        assert_eq!(router.pending(), "");
        assert_eq!(row_text(&grid, 0), ">");
    }

    #[test]
    fn test_enter_submits_and_clears_pending() {
        let mut grid = Grid::new(80, 25);
        let mut session = accepting_session(&mut grid);
        let transport = rescript(&mut session, vec![Ok("EOF".into())]);
        let mut router = InputRouter::new();

        router.handle_key(&key(KeyCode::Char('g')), &mut grid, &mut session);
        router.handle_key(&key(KeyCode::Char('o')), &mut grid, &mut session);
        assert!(router.handle_key(&key(KeyCode::Enter), &mut grid, &mut session));
        assert_eq!(router.pending(), "");
        assert_eq!(row_text(&grid, 0), "> go");
        pump(&mut session, &mut grid);
        assert_eq!(*transport.sent.lock().unwrap(), vec!["input"]);
    }

    #[test]
    fn test_keystrokes_ignored_while_awaiting_response() {
        let mut grid = Grid::new(80, 25);
        let mut session = accepting_session(&mut grid);
        rescript(&mut session, vec![Ok("EOF".into())]);
        session.submit_command("first", &mut grid);
        assert_eq!(session.state(), SessionState::AwaitingResponse);

        let mut router = InputRouter::new();
        assert!(!router.handle_key(&key(KeyCode::Char('x')), &mut grid, &mut session));
        assert!(!router.handle_key(&key(KeyCode::Enter), &mut grid, &mut session));
        // Nothing buffered, nothing fired.
        assert_eq!(router.pending(), "");
        assert_eq!(row_text(&grid, 1), "");
    }

    #[test]
    fn test_keystrokes_ignored_while_idle() {
        let mut grid = Grid::new(80, 25);
        let (mut session, transport) = scripted_session(vec![]);
        let mut router = InputRouter::new();
        assert!(!router.handle_key(&key(KeyCode::Char('x')), &mut grid, &mut session));
        assert_eq!(router.pending(), "");
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_control_chords_are_not_input() {
        let mut grid = Grid::new(80, 25);
        let mut session = accepting_session(&mut grid);
        let mut router = InputRouter::new();
        let chord = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!router.handle_key(&chord, &mut grid, &mut session));
        assert_eq!(router.pending(), "");
    }
}
