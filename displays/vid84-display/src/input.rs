//! Input source abstraction
//!
//! The player only needs to know whether any key is down, to gate its
//! start and error prompts.

use embedded_hal::delay::DelayNs;

/// Source of key presses
pub trait InputSource {
    /// Whether any key is currently pressed
    fn any_key_pressed(&mut self) -> bool;
}

/// Block until any key is pressed
///
/// Polls `input` every `poll_ms` milliseconds. A `poll_ms` of zero polls
/// continuously.
pub fn wait_for_any_key<I, D>(input: &mut I, delay: &mut D, poll_ms: u32)
where
    I: InputSource,
    D: DelayNs,
{
    while !input.any_key_pressed() {
        if poll_ms > 0 {
            delay.delay_ms(poll_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PressAfter(u32);

    impl InputSource for PressAfter {
        fn any_key_pressed(&mut self) -> bool {
            if self.0 == 0 {
                true
            } else {
                self.0 -= 1;
                false
            }
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ms: u32,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    #[test]
    fn test_returns_immediately_when_pressed() {
        let mut delay = CountingDelay::default();
        wait_for_any_key(&mut PressAfter(0), &mut delay, 20);
        assert_eq!(delay.total_ms, 0);
    }

    #[test]
    fn test_polls_until_pressed() {
        let mut delay = CountingDelay::default();
        wait_for_any_key(&mut PressAfter(3), &mut delay, 20);
        assert_eq!(delay.total_ms, 60);
    }
}
