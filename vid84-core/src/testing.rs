//! Host-side doubles for the clock, display, delay and input

use core::cell::Cell;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use vid84_display::{DisplayBackend, DisplayError, GraphicsDisplayBackend, InputSource, Tone};

use crate::container::ContainerWriter;
use crate::decoder::{Rect, RectSink};
use crate::error::PlaybackError;
use crate::traits::{Budget, Clock};

/// Clock that only moves when told to, plus `tick` ms after every reading
pub struct ManualClock {
    now: Cell<u64>,
    tick: u64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self::ticking(start, 0)
    }

    /// Each `now_ms` call returns the current time, then moves it on by `tick`
    pub fn ticking(start: u64, tick: u64) -> Self {
        Self {
            now: Cell::new(start),
            tick,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.tick);
        now
    }
}

/// Budget exhausted on its n-th poll
pub struct CountdownBudget {
    remaining: Cell<usize>,
}

impl CountdownBudget {
    pub fn new(polls: usize) -> Self {
        Self {
            remaining: Cell::new(polls),
        }
    }
}

impl Budget for CountdownBudget {
    fn exhausted(&self) -> bool {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        left == 0
    }
}

/// Sink collecting rectangles, optionally bounded
pub struct CollectSink {
    pub rects: Vec<Rect>,
    capacity: Option<usize>,
}

impl CollectSink {
    pub fn unbounded() -> Self {
        Self {
            rects: Vec::new(),
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rects: Vec::new(),
            capacity: Some(capacity),
        }
    }
}

impl RectSink for CollectSink {
    fn push(&mut self, rect: Rect) -> Result<(), PlaybackError> {
        if self.is_full() {
            return Err(PlaybackError::QueueFull);
        }
        self.rects.push(rect);
        Ok(())
    }

    fn is_full(&self) -> bool {
        self.capacity.is_some_and(|c| self.rects.len() >= c)
    }
}

/// One call made on a [`RecordingDisplay`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Clear,
    Text(u8, String),
    Fill {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        tone: Tone,
    },
    Flush,
}

/// Display that records every call, optionally charging time per fill
pub struct RecordingDisplay<'c> {
    pub calls: Vec<DrawCall>,
    tone: Tone,
    clock: Option<&'c ManualClock>,
    fill_cost_ms: u64,
    fail_fills: bool,
}

impl<'c> RecordingDisplay<'c> {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            tone: Tone::Ink,
            clock: None,
            fill_cost_ms: 0,
            fail_fills: false,
        }
    }

    /// Every fill advances `clock` by `cost_ms`
    pub fn timed(clock: &'c ManualClock, cost_ms: u64) -> Self {
        Self {
            clock: Some(clock),
            fill_cost_ms: cost_ms,
            ..Self::new()
        }
    }

    /// Every fill fails
    pub fn broken() -> Self {
        Self {
            fail_fills: true,
            ..Self::new()
        }
    }

    /// Ink fills, in call order, as (x, y, width, height)
    pub fn ink_fills(&self) -> Vec<(u16, u16, u16, u16)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                DrawCall::Fill {
                    x,
                    y,
                    width,
                    height,
                    tone: Tone::Ink,
                } => Some((x, y, width, height)),
                _ => None,
            })
            .collect()
    }

    pub fn flushes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == DrawCall::Flush)
            .count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text(_, text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DisplayBackend for RecordingDisplay<'_> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.calls.push(DrawCall::Clear);
        Ok(())
    }

    fn draw_text(&mut self, row: u8, _col: u8, text: &str) -> Result<(), DisplayError> {
        self.calls.push(DrawCall::Text(row, String::from(text)));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.calls.push(DrawCall::Flush);
        Ok(())
    }

    fn dimensions(&self) -> (u8, u8) {
        (52, 23)
    }
}

impl GraphicsDisplayBackend for RecordingDisplay<'_> {
    fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
    }

    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError> {
        if self.fail_fills {
            return Err(DisplayError::Communication);
        }
        self.calls.push(DrawCall::Fill {
            x,
            y,
            width,
            height,
            tone: self.tone,
        });
        if let Some(clock) = self.clock {
            clock.advance(self.fill_cost_ms);
        }
        Ok(())
    }
}

/// Delay that records requested sleeps and advances a shared clock
pub struct RecordingDelay<'c> {
    pub sleeps: Vec<u32>,
    clock: &'c ManualClock,
}

impl<'c> RecordingDelay<'c> {
    pub fn new(clock: &'c ManualClock) -> Self {
        Self {
            sleeps: Vec::new(),
            clock,
        }
    }
}

impl DelayNs for RecordingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(ns as u64 / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.push(ms);
        self.clock.advance(ms as u64);
    }
}

/// Input that reports a key press after `polls` negative polls
pub struct KeyAfter {
    pub polls: u32,
    pub seen: u32,
}

impl KeyAfter {
    pub fn new(polls: u32) -> Self {
        Self { polls, seen: 0 }
    }
}

impl InputSource for KeyAfter {
    fn any_key_pressed(&mut self) -> bool {
        self.seen += 1;
        self.seen > self.polls
    }
}

/// Single-frame container holding `count` distinct rectangles
pub fn rect_stream(count: usize, scale: u8) -> Vec<u8> {
    let mut writer = ContainerWriter::<2048>::new(30, scale).unwrap();
    writer.begin_frame().unwrap();
    for i in 0..count {
        let v = (i % 200) as u8;
        writer.push_rect([v, v, v + 1, v + 2]).unwrap();
    }
    writer.finish().unwrap().to_vec()
}

/// Container with one frame per entry of `frames`
pub fn video(refresh_rate: u8, scale: u8, frames: &[&[[u8; 4]]]) -> Vec<u8> {
    let mut writer = ContainerWriter::<4096>::new(refresh_rate, scale).unwrap();
    for frame in frames {
        writer.push_frame(frame).unwrap();
    }
    writer.finish().unwrap().to_vec()
}
