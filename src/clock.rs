//! Time source for the session.
//!
//! The session is one synchronous thread: every wait is a blocking delay
//! and the display window is measured against a monotonic millisecond
//! counter. Both come from the same [`Clock`] so tests can swap in
//! simulated time.

use embedded_hal::delay::DelayNs;

/// Blocking delays plus a monotonic millisecond timestamp.
pub trait Clock: DelayNs {
    fn now_ms(&mut self) -> u64;

    /// Milliseconds since `start`, never negative.
    fn elapsed_since(&mut self, start: u64) -> u64 {
        self.now_ms().saturating_sub(start)
    }
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&mut self) -> u64 {
        (**self).now_ms()
    }
}
