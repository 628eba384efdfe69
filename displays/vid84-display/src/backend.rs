//! Panel interface used by the player
//!
//! Prompts need text; playback needs nothing but solid rectangles in one of
//! two tones. Backends may draw straight to hardware or into a buffer that
//! `flush` presents.

/// Panel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transfer to the panel failed
    Communication,
    /// Text position outside the character grid
    InvalidCoordinates,
}

/// Pixel tone
///
/// Videos are ink rectangles on a paper canvas, prompts ink text on paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tone {
    /// White
    #[default]
    Paper,
    /// Black
    Ink,
}

/// Text output for prompts
pub trait DisplayBackend {
    /// Blank the whole panel to paper
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Write `text` starting at character cell (`row`, `col`)
    fn draw_text(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError>;

    /// Present everything drawn since the last flush
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Character grid as (columns, rows)
    fn dimensions(&self) -> (u8, u8);
}

/// Solid rectangle fill, the only primitive playback uses
pub trait GraphicsDisplayBackend: DisplayBackend {
    /// Tone for subsequent fills
    fn set_tone(&mut self, tone: Tone);

    /// Fill `width` x `height` pixels at (`x`, `y`) in the current tone
    ///
    /// Anything past the panel edge is clipped, not rejected.
    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError>;
}
