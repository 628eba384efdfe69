//! Monotonic clock and decode time budgets

/// Monotonic millisecond clock
///
/// Readings never decrease. The origin is arbitrary.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Time budget polled by the decoder after every byte
pub trait Budget {
    /// Whether decoding must stop now
    fn exhausted(&self) -> bool;
}

/// Budget that never runs out (live decode)
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Budget for Unbounded {
    fn exhausted(&self) -> bool {
        false
    }
}

/// Budget that runs out once the clock reaches a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct Deadline<'c, C: Clock> {
    clock: &'c C,
    at_ms: u64,
}

impl<'c, C: Clock> Deadline<'c, C> {
    /// Deadline at an absolute clock reading
    pub fn at(clock: &'c C, at_ms: u64) -> Self {
        Self { clock, at_ms }
    }

    /// Deadline `budget_ms` after the current reading
    pub fn after(clock: &'c C, budget_ms: u32) -> Self {
        let now = clock.now_ms();
        Self::at(clock, now.saturating_add(budget_ms as u64))
    }

    /// Absolute expiry instant
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }

    /// Milliseconds left before expiry, zero once expired
    pub fn remaining_ms(&self) -> u64 {
        self.at_ms.saturating_sub(self.clock.now_ms())
    }
}

impl<C: Clock> Budget for Deadline<'_, C> {
    fn exhausted(&self) -> bool {
        self.clock.now_ms() >= self.at_ms
    }
}
