//! Board-agnostic core of the 84VID player
//!
//! This crate contains everything in the decode path that does not depend on
//! specific hardware:
//!
//! - Container validation (fixed 8-byte header, trailing end marker)
//! - Rectangle stream decoder (sentinel framing, budgeted decode with rewind)
//! - Lookahead queue of pre-decoded rectangles
//! - Frame scheduler (render, then prefetch or idle for the rest of the frame)
//! - Start and error prompts
//! - A container writer for building streams in tests and tools
//!
//! Hardware reaches the core through `vid84_display` traits, the [`traits::Clock`]
//! trait and `embedded_hal::delay::DelayNs`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod container;
pub mod decoder;
pub mod error;
pub mod player;
pub mod prompt;
pub mod queue;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, PlayerConfig};
pub use container::{Container, ContainerError, ContainerWriter, Header, WriteError};
pub use decoder::{Rect, StreamDecoder};
pub use error::PlaybackError;
pub use player::{FrameReport, Phase, PlaybackSummary, Player};
pub use queue::{LookaheadQueue, QUEUE_CAPACITY};
