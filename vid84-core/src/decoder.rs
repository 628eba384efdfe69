//! Rectangle stream decoder
//!
//! Walks the frame data one byte at a time, assembling groups of four
//! coordinate bytes `(x, y, x2, y2)` into rectangles and stopping at the
//! frame-start (0xFF) and end-of-stream (0xFE) sentinels.
//!
//! A decode call may be cut short by a [`Budget`]. When that happens in the
//! middle of a rectangle, the cursor is moved back to the rectangle's first
//! byte so the next call re-reads it whole. A rectangle is only handed to the
//! sink once all four components have been read.

use crate::container::{Container, END_OF_STREAM, FRAME_START};
use crate::error::PlaybackError;
use crate::traits::{Budget, Unbounded};

/// Components per rectangle record
pub const RECT_COMPONENTS: usize = 4;

/// A decoded rectangle in canvas space (coordinates already scaled)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub x2: u16,
    pub y2: u16,
}

/// Where and how large a rectangle is painted on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Placement {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    /// Scale raw `[x, y, x2, y2]` bytes by the container's scale factor
    pub const fn scaled(raw: [u8; RECT_COMPONENTS], scale: u8) -> Self {
        let s = scale as u16;
        Self {
            x: raw[0] as u16 * s,
            y: raw[1] as u16 * s,
            x2: raw[2] as u16 * s,
            y2: raw[3] as u16 * s,
        }
    }

    /// Panel placement of this rectangle
    ///
    /// Both x coordinates move right by `margin_x`. A zero width or height
    /// becomes `min_extent` (one scale unit) so thin rectangles stay visible.
    pub fn placement(&self, margin_x: u16, min_extent: u16) -> Placement {
        let x = self.x.saturating_add(margin_x);
        let x2 = self.x2.saturating_add(margin_x);

        let mut width = x2.abs_diff(x);
        let mut height = self.y2.abs_diff(self.y);
        if width == 0 {
            width = min_extent;
        }
        if height == 0 {
            height = min_extent;
        }

        Placement {
            x,
            y: self.y,
            width,
            height,
        }
    }
}

/// Which sentinel stopped a decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delimiter {
    /// 0xFF: another frame follows
    FrameStart,
    /// 0xFE: this was the last frame
    EndOfStream,
}

/// Why a decode segment stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SegmentEnd {
    /// Cursor rests on a sentinel, which is not consumed
    Delimiter(Delimiter),
    /// The sink cannot take another rectangle
    SinkFull,
    /// The budget ran out; `rewound` components of a partial rectangle were
    /// given back (0 when stopped on a rectangle boundary)
    OutOfTime { rewound: u8 },
}

/// Result of one decode segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    /// Rectangles handed to the sink
    pub emitted: usize,
    /// Stop reason
    pub end: SegmentEnd,
}

/// How a frame ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameEnd {
    /// Terminated by 0xFF; the cursor now points past it
    Next,
    /// Terminated by 0xFE; the cursor stays on it
    Last,
}

/// Result of decoding a whole frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameDecode {
    /// Rectangles decoded
    pub rects: usize,
    /// Terminating sentinel
    pub end: FrameEnd,
}

/// Destination for completed rectangles
pub trait RectSink {
    /// Take one complete rectangle
    fn push(&mut self, rect: Rect) -> Result<(), PlaybackError>;

    /// Whether another rectangle would be refused
    fn is_full(&self) -> bool {
        false
    }
}

/// Decoder over a read-only container buffer
///
/// The decoder holds no position of its own; the cursor belongs to the
/// caller and is advanced in place.
#[derive(Debug, Clone, Copy)]
pub struct StreamDecoder<'a> {
    data: &'a [u8],
    scale: u8,
}

impl<'a> StreamDecoder<'a> {
    /// Decoder for a validated container
    pub fn new(container: &Container<'a>) -> Self {
        Self::from_raw(container.bytes(), container.header().scale_factor())
    }

    /// Decoder over arbitrary bytes with an explicit scale factor
    pub fn from_raw(data: &'a [u8], scale: u8) -> Self {
        Self { data, scale }
    }

    /// Scale factor applied to coordinates
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Bounds-checked byte read
    pub fn byte_at(&self, offset: usize) -> Result<u8, PlaybackError> {
        self.data
            .get(offset)
            .copied()
            .ok_or(PlaybackError::OutOfBoundsRead { offset })
    }

    /// Decode rectangles into `sink` starting at `cursor`
    ///
    /// Stops on a sentinel (left unconsumed), when the sink is full, or when
    /// `budget` is exhausted. The budget is polled after every byte.
    pub fn decode_segment<S, B>(
        &self,
        cursor: &mut usize,
        sink: &mut S,
        budget: &B,
    ) -> Result<Segment, PlaybackError>
    where
        S: RectSink + ?Sized,
        B: Budget + ?Sized,
    {
        let mut raw = [0u8; RECT_COMPONENTS];
        let mut component = 0;
        let mut emitted = 0;

        loop {
            if component == 0 && sink.is_full() {
                return Ok(Segment {
                    emitted,
                    end: SegmentEnd::SinkFull,
                });
            }

            let offset = *cursor;
            let byte = match self.byte_at(offset) {
                Ok(byte) => byte,
                Err(e) => {
                    *cursor -= component;
                    return Err(e);
                }
            };

            let delimiter = match byte {
                FRAME_START => Some(Delimiter::FrameStart),
                END_OF_STREAM => Some(Delimiter::EndOfStream),
                _ => None,
            };
            if let Some(delimiter) = delimiter {
                if component != 0 {
                    *cursor -= component;
                    return Err(PlaybackError::MalformedFrame { offset });
                }
                return Ok(Segment {
                    emitted,
                    end: SegmentEnd::Delimiter(delimiter),
                });
            }

            raw[component] = byte;
            component += 1;
            *cursor += 1;

            if component == RECT_COMPONENTS {
                sink.push(Rect::scaled(raw, self.scale))?;
                emitted += 1;
                component = 0;
            }

            if budget.exhausted() {
                // Never leave the cursor inside a rectangle
                *cursor -= component;
                return Ok(Segment {
                    emitted,
                    end: SegmentEnd::OutOfTime {
                        rewound: component as u8,
                    },
                });
            }
        }
    }

    /// Decode the rest of the current frame without a time budget
    ///
    /// A terminating 0xFF is consumed so the cursor lands on the next frame's
    /// first rectangle; a terminating 0xFE is left in place.
    pub fn decode_frame<S>(&self, cursor: &mut usize, sink: &mut S) -> Result<FrameDecode, PlaybackError>
    where
        S: RectSink + ?Sized,
    {
        let segment = self.decode_segment(cursor, sink, &Unbounded)?;

        match segment.end {
            SegmentEnd::Delimiter(Delimiter::FrameStart) => {
                *cursor += 1;
                Ok(FrameDecode {
                    rects: segment.emitted,
                    end: FrameEnd::Next,
                })
            }
            SegmentEnd::Delimiter(Delimiter::EndOfStream) => Ok(FrameDecode {
                rects: segment.emitted,
                end: FrameEnd::Last,
            }),
            // An unbounded budget never runs out, so only a full sink stops early
            SegmentEnd::SinkFull | SegmentEnd::OutOfTime { .. } => Err(PlaybackError::QueueFull),
        }
    }
}
