//! Text prompts
//!
//! A small grid of text lines shown before playback, or instead of it when
//! the video is refused.

use heapless::String;

use crate::backend::{DisplayBackend, DisplayError};

/// Number of prompt rows
pub const SCREEN_ROWS: usize = 8;

/// Number of character columns per prompt row
pub const SCREEN_COLS: usize = 40;

/// Prompt text, one line per row
///
/// Empty rows are skipped when rendering, so a prompt can leave gaps.
#[derive(Clone)]
pub struct Screen {
    lines: [String<SCREEN_COLS>; SCREEN_ROWS],
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Self {
            lines: core::array::from_fn(|_| String::new()),
        }
    }

    /// Replace a row, cutting the text at `SCREEN_COLS` characters
    ///
    /// Rows past the bottom are ignored.
    pub fn set_line(&mut self, row: usize, text: &str) {
        let Some(line) = self.lines.get_mut(row) else {
            return;
        };
        line.clear();
        for ch in text.chars() {
            if line.push(ch).is_err() {
                break;
            }
        }
    }

    pub fn get_line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(|s| s.as_str())
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|s| s.as_str())
    }

    /// Clear the display, draw every non-empty row, then flush
    pub fn render<B>(&self, backend: &mut B) -> Result<(), DisplayError>
    where
        B: DisplayBackend + ?Sized,
    {
        backend.clear()?;
        for (row, line) in self.lines.iter().enumerate() {
            if !line.is_empty() {
                backend.draw_text(row as u8, 0, line.as_str())?;
            }
        }
        backend.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    #[test]
    fn test_set_line_truncates() {
        let mut screen = Screen::new();
        screen.set_line(0, "0123456789012345678901234567890123456789overflow");
        assert_eq!(screen.get_line(0).map(str::len), Some(SCREEN_COLS));
    }

    #[test]
    fn test_set_line_replaces_previous_text() {
        let mut screen = Screen::new();
        screen.set_line(1, "Press any key to play!");
        screen.set_line(1, "Pre-Loading first frame..");
        assert_eq!(screen.get_line(1), Some("Pre-Loading first frame.."));
    }

    #[test]
    fn test_set_line_out_of_range_is_ignored() {
        let mut screen = Screen::new();
        screen.set_line(SCREEN_ROWS, "nope");
        assert!(screen.lines().all(str::is_empty));
    }

    #[test]
    fn test_render_draws_and_flushes() {
        let mut screen = Screen::new();
        screen.set_line(0, "== LOADED VIDEO FILE ==");
        let mut fb = FrameBuffer::new();

        screen.render(&mut fb).unwrap();

        assert_eq!(fb.presented(), 1);
        assert!(fb.ink_in(0, 0, 320, 16) > 0);
    }
}
