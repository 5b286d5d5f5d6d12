//! Two-digit 7-segment display behind a 16-bit constant-current
//! shift-register driver.
//!
//! ## Protocol
//!
//! - 16 bits are clocked in on SDI, one per CLK high-then-low pulse,
//!   MSB first: right digit first, then left digit.
//! - A pulse on LE copies the shift register to the output register.
//! - OE_N (active-low) switches all segments on or off without touching
//!   the latched pattern.
//!
//! The bus itself is the [`ShiftBus`] seam so the bit sequence can be
//! asserted on the host.

pub mod bus;
pub mod glyph;

pub use bus::PinBus;
pub use glyph::{encode, Glyph, SegmentMask};

use crate::config::{FLASH_OFF_MS, FLASH_ON_MS};
use embedded_hal::delay::DelayNs;

/// Bit-serial interface of the display driver chip.
pub trait ShiftBus {
    /// Put `bit` on the data line and pulse the clock high then low.
    fn shift_bit(&mut self, bit: bool);

    /// Pulse latch-enable, committing the shifted pattern to the outputs.
    fn latch(&mut self);

    /// Switch the segment outputs on (`true`) or off.
    fn set_output_enable(&mut self, enabled: bool);
}

impl<T: ShiftBus + ?Sized> ShiftBus for &mut T {
    fn shift_bit(&mut self, bit: bool) {
        (**self).shift_bit(bit)
    }

    fn latch(&mut self) {
        (**self).latch()
    }

    fn set_output_enable(&mut self, enabled: bool) {
        (**self).set_output_enable(enabled)
    }
}

/// Renders glyphs and numbers on the two digits.
pub struct DisplayDriver<B> {
    bus: B,
}

impl<B: ShiftBus> DisplayDriver<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Shift one digit mask out, MSB first.
    ///
    /// Nothing becomes visible until [`Self::load_two_digits`] latches.
    pub fn load_digit(&mut self, mask: SegmentMask) {
        for bit in (0..8).rev() {
            self.bus.shift_bit(mask & (1 << bit) != 0);
        }
    }

    /// Shift both digits (right first, then left) and latch them.
    pub fn load_two_digits(&mut self, left: SegmentMask, right: SegmentMask) {
        self.load_digit(right);
        self.load_digit(left);
        self.bus.latch();
    }

    /// Latch two glyphs and switch the outputs on.
    pub fn show_glyphs(&mut self, left: Glyph, right: Glyph) {
        self.load_two_digits(left.segments(), right.segments());
        self.bus.set_output_enable(true);
    }

    /// Show `value` (0-99) with the left digit blanked below 10.
    ///
    /// Callers clamp; a value above 99 shows `E` on the left.
    pub fn show(&mut self, value: u8) {
        let left = if value < 10 {
            Glyph::Blank
        } else {
            Glyph::digit(value / 10)
        };
        self.show_glyphs(left, Glyph::digit(value % 10));
    }

    /// Clear both digits and switch the outputs off.
    pub fn blank(&mut self) {
        self.load_two_digits(Glyph::Blank.segments(), Glyph::Blank.segments());
        self.bus.set_output_enable(false);
    }

    /// Blink a two-glyph message `times` times (750 ms on, 250 ms off).
    ///
    /// Blocks for the whole cycle and leaves the outputs off.
    pub fn flash_pattern(
        &mut self,
        left: Glyph,
        right: Glyph,
        times: u8,
        delay: &mut impl DelayNs,
    ) {
        self.load_two_digits(left.segments(), right.segments());
        for _ in 0..times {
            self.bus.set_output_enable(true);
            delay.delay_ms(FLASH_ON_MS);
            self.bus.set_output_enable(false);
            delay.delay_ms(FLASH_OFF_MS);
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }
}
