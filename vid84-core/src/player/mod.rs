//! Frame scheduler
//!
//! Drives playback one phase at a time:
//!
//! ```text
//! AwaitStart → PrimeFirstFrame → RenderFrame ⇄ IdleOrPrime → Done
//! ```
//!
//! Each frame is rendered from the lookahead queue first and then by live
//! decoding up to the next sentinel. Whatever is left of the frame budget is
//! spent decoding ahead for the next frame, then sleeping.

pub mod render;
pub mod scheduler;
pub mod state;

pub use render::{Layout, LiveSink};
pub use scheduler::{FrameReport, PlaybackSummary, Player};
pub use state::{Phase, PlayerState};
