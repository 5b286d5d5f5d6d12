//! GPIO bit-banged [`ShiftBus`] for the display driver chip.

use super::ShiftBus;
use crate::config::LATCH_PULSE_US;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Four GPIO lines wired to the driver chip: SDI, CLK, LE and OE_N.
///
/// Pin errors are discarded; on the nRF52840 they are `Infallible`.
pub struct PinBus<SDI, CLK, LE, OE, D> {
    sdi: SDI,
    clk: CLK,
    le: LE,
    oe_n: OE,
    delay: D,
}

impl<SDI, CLK, LE, OE, D> PinBus<SDI, CLK, LE, OE, D>
where
    SDI: OutputPin,
    CLK: OutputPin,
    LE: OutputPin,
    OE: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the lines and park them: clock and latch low,
    /// outputs disabled.
    pub fn new(sdi: SDI, clk: CLK, le: LE, oe_n: OE, delay: D) -> Self {
        let mut bus = Self {
            sdi,
            clk,
            le,
            oe_n,
            delay,
        };
        let _ = bus.clk.set_low();
        let _ = bus.le.set_low();
        let _ = bus.oe_n.set_high();
        bus
    }

    pub fn release(self) -> (SDI, CLK, LE, OE, D) {
        (self.sdi, self.clk, self.le, self.oe_n, self.delay)
    }
}

impl<SDI, CLK, LE, OE, D> ShiftBus for PinBus<SDI, CLK, LE, OE, D>
where
    SDI: OutputPin,
    CLK: OutputPin,
    LE: OutputPin,
    OE: OutputPin,
    D: DelayNs,
{
    fn shift_bit(&mut self, bit: bool) {
        let _ = if bit {
            self.sdi.set_high()
        } else {
            self.sdi.set_low()
        };
        let _ = self.clk.set_high();
        let _ = self.clk.set_low();
    }

    fn latch(&mut self) {
        let _ = self.le.set_high();
        self.delay.delay_us(LATCH_PULSE_US);
        let _ = self.le.set_low();
    }

    fn set_output_enable(&mut self, enabled: bool) {
        // OE_N is active-low.
        let _ = if enabled {
            self.oe_n.set_low()
        } else {
            self.oe_n.set_high()
        };
    }
}
