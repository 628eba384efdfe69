//! Playback state owned by the scheduler

use crate::queue::LookaheadQueue;

/// Scheduler phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Container accepted, first frame not located yet
    AwaitStart,
    /// Filling the queue for frame 0 within the grace period
    PrimeFirstFrame,
    /// Next step renders a frame
    RenderFrame,
    /// Next step spends the rest of the frame budget
    IdleOrPrime,
    /// End of stream rendered
    Done,
}

impl Phase {
    /// Whether playback has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done)
    }
}

/// Mutable playback state
///
/// The stream cursor is the only decode position carried between frames;
/// the lookahead queue holds rectangles decoded ahead of it.
#[derive(Debug, Clone)]
pub struct PlayerState<const N: usize> {
    pub(crate) phase: Phase,
    pub(crate) cursor: usize,
    pub(crate) queue: LookaheadQueue<N>,
    pub(crate) frames: u32,
    pub(crate) late_frames: u32,
}

impl<const N: usize> Default for PlayerState<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PlayerState<N> {
    /// Fresh state positioned before the first frame
    pub const fn new() -> Self {
        Self {
            phase: Phase::AwaitStart,
            cursor: 0,
            queue: LookaheadQueue::new(),
            frames: 0,
            late_frames: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Byte offset of the next undecoded byte
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rectangles decoded ahead of the cursor
    pub fn queue(&self) -> &LookaheadQueue<N> {
        &self.queue
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Frames that used up their whole budget
    pub fn late_frames(&self) -> u32 {
        self.late_frames
    }
}
