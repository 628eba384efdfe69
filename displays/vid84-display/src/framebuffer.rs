//! Monochrome frame buffer
//!
//! A 320x240 buffer with one bit per pixel (set = ink), organized as rows of
//! bytes, most significant bit leftmost. Boards render into it and copy the
//! rows to their panel in `flush`.
//!
//! The buffer tracks the byte-aligned bounding box of pixels that actually
//! changed, so a board only has to send that region. Repainting static
//! content such as the borders leaves it untouched.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::backend::{DisplayBackend, DisplayError, GraphicsDisplayBackend, Tone};

/// Panel width in pixels
pub const DISPLAY_WIDTH: usize = 320;

/// Panel height in pixels
pub const DISPLAY_HEIGHT: usize = 240;

/// Bytes per pixel row
pub const ROW_BYTES: usize = DISPLAY_WIDTH / 8;

/// Character cell of the prompt font
const GLYPH_WIDTH: usize = 6;
const GLYPH_HEIGHT: usize = 10;

/// Left/top padding for prompt text
const TEXT_ORIGIN: i32 = 5;

/// Byte-aligned area that changed since the last [`FrameBuffer::take_dirty`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRegion {
    /// Left edge in pixels, a multiple of 8
    pub x: usize,
    pub y: usize,
    /// Width in pixels, a multiple of 8
    pub width: usize,
    pub height: usize,
}

impl DirtyRegion {
    /// The whole panel
    pub const FULL: Self = Self {
        x: 0,
        y: 0,
        width: DISPLAY_WIDTH,
        height: DISPLAY_HEIGHT,
    };

    /// Byte columns covered in each packed row
    pub fn columns(&self) -> core::ops::Range<usize> {
        self.x / 8..(self.x + self.width) / 8
    }
}

/// Inclusive byte-column and row bounds of changed bytes
#[derive(Debug, Clone, Copy)]
struct Bounds {
    col0: usize,
    col1: usize,
    row0: usize,
    row1: usize,
}

const FULL_BOUNDS: Bounds = Bounds {
    col0: 0,
    col1: ROW_BYTES - 1,
    row0: 0,
    row1: DISPLAY_HEIGHT - 1,
};

/// One-bit-per-pixel frame buffer
pub struct FrameBuffer {
    rows: [[u8; ROW_BYTES]; DISPLAY_HEIGHT],
    tone: Tone,
    presented: u32,
    dirty: Option<Bounds>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Create a frame buffer cleared to paper
    ///
    /// The whole buffer starts dirty since the panel contents are unknown.
    pub const fn new() -> Self {
        Self {
            rows: [[0; ROW_BYTES]; DISPLAY_HEIGHT],
            tone: Tone::Ink,
            presented: 0,
            dirty: Some(FULL_BOUNDS),
        }
    }

    /// Whether the pixel at (x, y) is ink
    ///
    /// Pixels outside the buffer read as paper.
    pub fn is_ink(&self, x: usize, y: usize) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        self.rows[y][x / 8] & (0x80 >> (x % 8)) != 0
    }

    /// Number of ink pixels inside the given region
    pub fn ink_in(&self, x: usize, y: usize, width: usize, height: usize) -> usize {
        let mut count = 0;
        for py in y..(y + height).min(DISPLAY_HEIGHT) {
            for px in x..(x + width).min(DISPLAY_WIDTH) {
                if self.is_ink(px, py) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Raw packed pixel row
    pub fn row(&self, y: usize) -> Option<&[u8; ROW_BYTES]> {
        self.rows.get(y)
    }

    /// Iterate over all packed pixel rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8; ROW_BYTES]> {
        self.rows.iter()
    }

    /// Tone used by the next `fill_rect`
    pub fn tone(&self) -> Tone {
        self.tone
    }

    /// Number of times the buffer was flushed
    pub fn presented(&self) -> u32 {
        self.presented
    }

    /// Region changed since the last call, if any, and start tracking afresh
    pub fn take_dirty(&mut self) -> Option<DirtyRegion> {
        self.dirty.take().map(|b| DirtyRegion {
            x: b.col0 * 8,
            y: b.row0,
            width: (b.col1 - b.col0 + 1) * 8,
            height: b.row1 - b.row0 + 1,
        })
    }

    /// Mark everything dirty, e.g. after the panel lost its contents
    pub fn invalidate(&mut self) {
        self.dirty = Some(FULL_BOUNDS);
    }

    /// Fill the whole buffer with one tone
    pub fn fill(&mut self, tone: Tone) {
        let byte = fill_byte(tone);
        for y in 0..DISPLAY_HEIGHT {
            for col in 0..ROW_BYTES {
                self.write_byte(col, y, byte);
            }
        }
    }

    fn write_byte(&mut self, col: usize, y: usize, value: u8) {
        if self.rows[y][col] == value {
            return;
        }
        self.rows[y][col] = value;
        self.dirty = Some(match self.dirty {
            None => Bounds {
                col0: col,
                col1: col,
                row0: y,
                row1: y,
            },
            Some(b) => Bounds {
                col0: b.col0.min(col),
                col1: b.col1.max(col),
                row0: b.row0.min(y),
                row1: b.row1.max(y),
            },
        });
    }

    fn set_pixel(&mut self, x: usize, y: usize, tone: Tone) {
        let mask = 0x80 >> (x % 8);
        let byte = self.rows[y][x / 8];
        let value = match tone {
            Tone::Ink => byte | mask,
            Tone::Paper => byte & !mask,
        };
        self.write_byte(x / 8, y, value);
    }

    /// Paint a horizontal span `[x0, x1)` of one row
    fn fill_span(&mut self, y: usize, x0: usize, x1: usize, tone: Tone) {
        let mut x = x0;
        while x < x1 {
            // Whole bytes can be written at once when aligned
            if x % 8 == 0 && x + 8 <= x1 {
                self.write_byte(x / 8, y, fill_byte(tone));
                x += 8;
            } else {
                self.set_pixel(x, y, tone);
                x += 1;
            }
        }
    }
}

fn fill_byte(tone: Tone) -> u8 {
    match tone {
        Tone::Paper => 0x00,
        Tone::Ink => 0xFF,
    }
}

impl DisplayBackend for FrameBuffer {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.fill(Tone::Paper);
        Ok(())
    }

    fn draw_text(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        let (cols, rows) = self.dimensions();
        if row >= rows || col >= cols {
            return Err(DisplayError::InvalidCoordinates);
        }

        let origin = Point::new(
            TEXT_ORIGIN + col as i32 * GLYPH_WIDTH as i32,
            TEXT_ORIGIN + row as i32 * GLYPH_HEIGHT as i32,
        );
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        // Drawing into memory cannot fail
        let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(self);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.presented = self.presented.wrapping_add(1);
        Ok(())
    }

    fn dimensions(&self) -> (u8, u8) {
        (
            ((DISPLAY_WIDTH - TEXT_ORIGIN as usize) / GLYPH_WIDTH) as u8,
            ((DISPLAY_HEIGHT - TEXT_ORIGIN as usize) / GLYPH_HEIGHT) as u8,
        )
    }
}

impl GraphicsDisplayBackend for FrameBuffer {
    fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
    }

    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError> {
        let x0 = (x as usize).min(DISPLAY_WIDTH);
        let y0 = (y as usize).min(DISPLAY_HEIGHT);
        let x1 = (x as usize + width as usize).min(DISPLAY_WIDTH);
        let y1 = (y as usize + height as usize).min(DISPLAY_HEIGHT);

        let tone = self.tone;
        for row in y0..y1 {
            self.fill_span(row, x0, x1, tone);
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
                continue;
            }
            let tone = if color.is_on() { Tone::Ink } else { Tone::Paper };
            self.set_pixel(x, y, tone);
        }
        Ok(())
    }
}
