//! Self-power latch.
//!
//! The button press closes the power path only while it is held. The
//! firmware keeps the board alive by driving the hold line of a MOSFET
//! latch high, and switches itself off by releasing it:
//!
//! - `hold()` must be the first thing a session does.
//! - `release()` is the last; anything after it runs on residual charge.

use embedded_hal::digital::OutputPin;

/// Power-hold output (high = stay powered).
pub struct PowerLatch<P> {
    pin: P,
    held: bool,
}

impl<P: OutputPin> PowerLatch<P> {
    /// Wrap the hold pin. The pin is expected to be configured high already.
    pub fn new(pin: P) -> Self {
        Self { pin, held: false }
    }

    /// Assert the hold line. Idempotent.
    pub fn hold(&mut self) {
        let _ = self.pin.set_high();
        self.held = true;
    }

    /// Deassert the hold line, cutting board power.
    pub fn release(&mut self) {
        info!("Power: releasing hold");
        let _ = self.pin.set_low();
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
