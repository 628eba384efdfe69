//! Playback errors

use vid84_display::DisplayError;

use crate::config::ConfigError;
use crate::container::ContainerError;

/// Errors that stop playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError {
    /// Header or trailer check failed; nothing is played
    InvalidContainer(ContainerError),
    /// The decoder would have read past the end of the container
    OutOfBoundsRead {
        /// Offending byte offset
        offset: usize,
    },
    /// A sentinel interrupted a rectangle, or the first frame-start is missing
    MalformedFrame {
        /// Offset of the unexpected byte
        offset: usize,
    },
    /// A rectangle was pushed into a full lookahead queue
    QueueFull,
    /// The display backend failed
    Display(DisplayError),
    /// Player configuration does not fit the panel
    InvalidConfig(ConfigError),
}

impl From<ContainerError> for PlaybackError {
    fn from(e: ContainerError) -> Self {
        PlaybackError::InvalidContainer(e)
    }
}

impl From<DisplayError> for PlaybackError {
    fn from(e: DisplayError) -> Self {
        PlaybackError::Display(e)
    }
}

impl From<ConfigError> for PlaybackError {
    fn from(e: ConfigError) -> Self {
        PlaybackError::InvalidConfig(e)
    }
}
