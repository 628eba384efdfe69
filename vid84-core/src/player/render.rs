//! Painting frames onto the display

use vid84_display::{DisplayError, GraphicsDisplayBackend, Tone};

use crate::config::PlayerConfig;
use crate::decoder::{Rect, RectSink};
use crate::error::PlaybackError;

/// Canvas-to-panel mapping for rectangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    /// Horizontal offset added to both x coordinates
    pub margin_x: u16,
    /// Extent substituted for a zero width or height (one scale unit)
    pub min_extent: u16,
}

impl Layout {
    pub fn new(config: &PlayerConfig, scale_factor: u8) -> Self {
        Self {
            margin_x: config.margin_x,
            min_extent: scale_factor as u16,
        }
    }
}

/// Paint one rectangle in the current tone
pub fn paint_rect<D>(display: &mut D, rect: Rect, layout: &Layout) -> Result<(), DisplayError>
where
    D: GraphicsDisplayBackend + ?Sized,
{
    let p = rect.placement(layout.margin_x, layout.min_extent);
    display.fill_rect(p.x, p.y, p.width, p.height)
}

/// Blank the canvas and paint the side borders, leaving the tone on ink
pub fn paint_background<D>(display: &mut D, config: &PlayerConfig) -> Result<(), DisplayError>
where
    D: GraphicsDisplayBackend + ?Sized,
{
    display.set_tone(Tone::Paper);
    display.fill_rect(config.margin_x, 0, config.canvas_size, config.canvas_size)?;

    display.set_tone(Tone::Ink);
    if config.draw_borders {
        if config.margin_x > 0 {
            display.fill_rect(0, 0, config.margin_x, config.display_height)?;
        }
        let right_width = config.right_border_width();
        if right_width > 0 {
            display.fill_rect(
                config.right_border_x(),
                0,
                right_width,
                config.display_height,
            )?;
        }
    }
    Ok(())
}

/// Sink that paints each rectangle the moment it is complete
pub struct LiveSink<'d, D: ?Sized> {
    display: &'d mut D,
    layout: Layout,
}

impl<'d, D: ?Sized> LiveSink<'d, D> {
    pub fn new(display: &'d mut D, layout: Layout) -> Self {
        Self { display, layout }
    }
}

impl<D> RectSink for LiveSink<'_, D>
where
    D: GraphicsDisplayBackend + ?Sized,
{
    fn push(&mut self, rect: Rect) -> Result<(), PlaybackError> {
        paint_rect(self.display, rect, &self.layout)?;
        Ok(())
    }
}
