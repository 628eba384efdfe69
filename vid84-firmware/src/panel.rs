//! Player display backed by the ILI9341
//!
//! All drawing lands in the 1-bpp frame buffer; `flush` pushes the part of
//! the buffer that changed since the previous flush. During playback that
//! stays inside the canvas, since the borders never change.

use defmt::warn;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use vid84_display::{DisplayBackend, DisplayError, FrameBuffer, GraphicsDisplayBackend, Tone};

use crate::ili9341::Ili9341;

pub struct Panel<SPI, DC, CS> {
    lcd: Ili9341<SPI, DC, CS>,
    frame: &'static mut FrameBuffer,
}

impl<SPI, DC, CS> Panel<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    pub fn new(lcd: Ili9341<SPI, DC, CS>, frame: &'static mut FrameBuffer) -> Self {
        Self { lcd, frame }
    }
}

impl<SPI, DC, CS> DisplayBackend for Panel<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.frame.clear()
    }

    fn draw_text(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        self.frame.draw_text(row, col, text)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.frame.flush()?;
        let Some(region) = self.frame.take_dirty() else {
            return Ok(());
        };
        self.lcd.write_region(region, self.frame.rows()).map_err(|e| {
            // The panel may hold a partial update
            self.frame.invalidate();
            warn!("Panel write failed: {:?}", e);
            DisplayError::Communication
        })
    }

    fn dimensions(&self) -> (u8, u8) {
        self.frame.dimensions()
    }
}

impl<SPI, DC, CS> GraphicsDisplayBackend for Panel<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    fn set_tone(&mut self, tone: Tone) {
        self.frame.set_tone(tone);
    }

    fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError> {
        self.frame.fill_rect(x, y, width, height)
    }
}
