//! Player configuration
//!
//! Panel geometry and scheduler tunables. The defaults reproduce the
//! reference player: a 240x240 canvas centred on a 320x240 panel with black
//! side borders, a 500 ms grace period to pre-fill the first frame, and
//! lookahead prefetch enabled.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Canvas has zero size
    EmptyCanvas,
    /// Canvas plus both margins is wider than the panel
    CanvasTooWide,
    /// Canvas is taller than the panel
    CanvasTooTall,
}

/// Player configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Horizontal offset of the canvas on the panel (pixels)
    pub margin_x: u16,
    /// Side length of the square canvas (pixels)
    pub canvas_size: u16,
    /// Panel width (pixels)
    pub display_width: u16,
    /// Panel height (pixels)
    pub display_height: u16,
    /// Time allowed to pre-fill the queue before the first frame (ms)
    pub prime_grace_ms: u32,
    /// Decode ahead during slack time; when false, slack is only slept
    pub prefetch: bool,
    /// Paint the regions left and right of the canvas in ink every frame
    pub draw_borders: bool,
    /// Key polling interval on prompts (ms)
    pub key_poll_ms: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl PlayerConfig {
    /// Reference geometry and timing
    pub const fn reference() -> Self {
        Self {
            margin_x: 40,
            canvas_size: 240,
            display_width: 320,
            display_height: 240,
            prime_grace_ms: 500,
            prefetch: true,
            draw_borders: true,
            key_poll_ms: 20,
        }
    }

    /// Plain decode-and-draw loop without lookahead
    pub const fn synchronous() -> Self {
        let mut config = Self::reference();
        config.prefetch = false;
        config
    }

    /// Check that the canvas fits the panel
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_size == 0 {
            return Err(ConfigError::EmptyCanvas);
        }
        if self.margin_x as u32 * 2 + self.canvas_size as u32 > self.display_width as u32 {
            return Err(ConfigError::CanvasTooWide);
        }
        if self.canvas_size > self.display_height {
            return Err(ConfigError::CanvasTooTall);
        }
        Ok(())
    }

    /// Left edge of the right-hand border
    pub const fn right_border_x(&self) -> u16 {
        self.margin_x.saturating_add(self.canvas_size)
    }

    /// Width of the right-hand border
    pub const fn right_border_width(&self) -> u16 {
        self.display_width.saturating_sub(self.right_border_x())
    }
}
