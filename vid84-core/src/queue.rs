//! Lookahead queue of pre-decoded rectangles
//!
//! Filled from index 0 upward during a frame's slack time and drained in the
//! same order at the start of the next frame. Slots are always contiguous
//! from index 0, so draining stops at the first empty slot by construction.

use heapless::Vec;

use crate::decoder::{Rect, RectSink, Segment, StreamDecoder};
use crate::error::PlaybackError;
use crate::traits::Budget;

/// Default number of rectangles that may be decoded ahead
pub const QUEUE_CAPACITY: usize = 32;

/// Fixed-capacity FIFO of rectangles decoded ahead of the render position
#[derive(Debug, Clone)]
pub struct LookaheadQueue<const N: usize = QUEUE_CAPACITY> {
    slots: Vec<Rect, N>,
}

impl<const N: usize> Default for LookaheadQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LookaheadQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Decode ahead into the queue until it is full, a sentinel is reached
    /// or `budget` runs out
    ///
    /// A full queue returns immediately without touching the cursor.
    pub fn try_fill<B>(
        &mut self,
        decoder: &StreamDecoder<'_>,
        cursor: &mut usize,
        budget: &B,
    ) -> Result<Segment, PlaybackError>
    where
        B: Budget + ?Sized,
    {
        decoder.decode_segment(cursor, self, budget)
    }

    /// Hand every queued rectangle to `render` in order, then empty the queue
    ///
    /// Returns how many rectangles were rendered. The queue is emptied even
    /// if `render` fails part-way.
    pub fn drain<F, E>(&mut self, mut render: F) -> Result<usize, E>
    where
        F: FnMut(Rect) -> Result<(), E>,
    {
        let mut rendered = 0;
        let mut result = Ok(());
        for &rect in self.slots.iter() {
            if let Err(e) = render(rect) {
                result = Err(e);
                break;
            }
            rendered += 1;
        }
        self.slots.clear();
        result.map(|()| rendered)
    }

    /// Whether slot 0 holds a rectangle
    pub fn is_primed(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Number of queued rectangles
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of queued rectangles
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> RectSink for LookaheadQueue<N> {
    fn push(&mut self, rect: Rect) -> Result<(), PlaybackError> {
        self.slots.push(rect).map_err(|_| PlaybackError::QueueFull)
    }

    fn is_full(&self) -> bool {
        self.slots.is_full()
    }
}
