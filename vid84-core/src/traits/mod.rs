//! Hardware abstraction traits
//!
//! These traits define the timing interface between the scheduler and the
//! board. Display and input traits live in `vid84_display`; blocking sleep is
//! `embedded_hal::delay::DelayNs`.

pub mod clock;

pub use clock::{Budget, Clock, Deadline, Unbounded};
