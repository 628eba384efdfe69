//! Board glue: monotonic clock and the start button

use embassy_rp::gpio::Input;
use embassy_time::Instant;
use vid84_core::traits::Clock;
use vid84_display::InputSource;

/// Milliseconds since boot from the embassy time driver
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Active-low push button
pub struct Button<'d> {
    pin: Input<'d>,
}

impl<'d> Button<'d> {
    pub fn new(pin: Input<'d>) -> Self {
        Self { pin }
    }
}

impl InputSource for Button<'_> {
    fn any_key_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}
