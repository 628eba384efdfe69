//! ILI9341 TFT Display Driver
//!
//! Driver for 320x240 ILI9341 panels over 4-wire SPI, in landscape.
//! Pixels are streamed as RGB565; the player's 1-bpp rows are expanded
//! on the fly so no full-colour frame buffer is needed. Only the region
//! that changed since the previous flush is sent.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use vid84_display::framebuffer::ROW_BYTES;
use vid84_display::{DirtyRegion, DISPLAY_WIDTH};

/// RGB565 colours for the two tones
const INK: u16 = 0x0000;
const PAPER: u16 = 0xFFFF;

/// ILI9341 commands
#[allow(dead_code)]
mod cmd {
    pub const SW_RESET: u8 = 0x01;
    pub const SLEEP_OUT: u8 = 0x11;
    pub const DISPLAY_OFF: u8 = 0x28;
    pub const DISPLAY_ON: u8 = 0x29;
    pub const COLUMN_ADDR: u8 = 0x2A;
    pub const PAGE_ADDR: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
    pub const MEMORY_ACCESS: u8 = 0x36;
    pub const PIXEL_FORMAT: u8 = 0x3A;
    pub const INVERT_OFF: u8 = 0x20;
}

/// MADCTL: row/column exchange plus BGR order gives 320x240 landscape
const MADCTL_LANDSCAPE: u8 = 0x20 | 0x08;

/// 16 bits per pixel
const PIXEL_FORMAT_RGB565: u8 = 0x55;

/// Bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Error {
    Spi,
    Pin,
}

/// ILI9341 panel driver
pub struct Ili9341<SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
}

impl<SPI, DC, CS> Ili9341<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Create a new ILI9341 driver
    pub fn new(spi: SPI, dc: DC, cs: CS) -> Self {
        Self { spi, dc, cs }
    }

    /// Reset and initialize the panel
    pub fn init<RST, D>(&mut self, rst: &mut RST, delay: &mut D) -> Result<(), Error>
    where
        RST: OutputPin,
        D: DelayNs,
    {
        rst.set_low().map_err(|_| Error::Pin)?;
        delay.delay_ms(10);
        rst.set_high().map_err(|_| Error::Pin)?;
        delay.delay_ms(120);

        self.command(cmd::SW_RESET, &[])?;
        delay.delay_ms(150);
        self.command(cmd::SLEEP_OUT, &[])?;
        delay.delay_ms(120);

        self.command(cmd::PIXEL_FORMAT, &[PIXEL_FORMAT_RGB565])?;
        self.command(cmd::MEMORY_ACCESS, &[MADCTL_LANDSCAPE])?;
        self.command(cmd::INVERT_OFF, &[])?;
        self.command(cmd::DISPLAY_ON, &[])?;
        delay.delay_ms(20);

        Ok(())
    }

    /// Send a command followed by its parameters
    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), Error> {
        self.cs.set_low().map_err(|_| Error::Pin)?;
        let result = self.command_selected(command, params);
        self.cs.set_high().map_err(|_| Error::Pin)?;
        result
    }

    fn command_selected(&mut self, command: u8, params: &[u8]) -> Result<(), Error> {
        self.dc.set_low().map_err(|_| Error::Pin)?;
        self.spi.write(&[command]).map_err(|_| Error::Spi)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(|_| Error::Pin)?;
            self.spi.write(params).map_err(|_| Error::Spi)?;
        }
        self.spi.flush().map_err(|_| Error::Spi)
    }

    /// Set the drawing window (inclusive corners)
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Error> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(cmd::COLUMN_ADDR, &[x0h, x0l, x1h, x1l])?;
        self.command(cmd::PAGE_ADDR, &[y0h, y0l, y1h, y1l])
    }

    /// Stream `region` of the packed 1-bpp rows (MSB leftmost, set bit =
    /// ink) to the panel
    ///
    /// `rows` is the full buffer, top to bottom.
    pub fn write_region<'r, I>(&mut self, region: DirtyRegion, rows: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'r [u8; ROW_BYTES]>,
    {
        if region.width == 0 || region.height == 0 {
            return Ok(());
        }
        self.set_window(
            region.x as u16,
            region.y as u16,
            (region.x + region.width - 1) as u16,
            (region.y + region.height - 1) as u16,
        )?;

        self.cs.set_low().map_err(|_| Error::Pin)?;
        let result = self.stream_region(region, rows);
        self.cs.set_high().map_err(|_| Error::Pin)?;
        result
    }

    fn stream_region<'r, I>(&mut self, region: DirtyRegion, rows: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'r [u8; ROW_BYTES]>,
    {
        self.dc.set_low().map_err(|_| Error::Pin)?;
        self.spi.write(&[cmd::MEMORY_WRITE]).map_err(|_| Error::Spi)?;
        self.spi.flush().map_err(|_| Error::Spi)?;
        self.dc.set_high().map_err(|_| Error::Pin)?;

        let mut line = [0u8; DISPLAY_WIDTH * 2];
        let span = &mut line[..region.width * 2];
        for row in rows.into_iter().skip(region.y).take(region.height) {
            expand_bytes(&row[region.columns()], span);
            self.spi.write(span).map_err(|_| Error::Spi)?;
        }
        self.spi.flush().map_err(|_| Error::Spi)
    }
}

/// Expand packed pixels into big-endian RGB565, eight per input byte
fn expand_bytes(packed: &[u8], line: &mut [u8]) {
    for (i, pixel) in line.chunks_exact_mut(2).enumerate() {
        let ink = packed[i / 8] & (0x80 >> (i % 8)) != 0;
        let colour = if ink { INK } else { PAPER };
        pixel.copy_from_slice(&colour.to_be_bytes());
    }
}
