//! Battery voltage monitor.
//!
//! The pack voltage reaches the ADC through a resistive divider:
//! ```text
//! VBAT ──[ Rtop ]──┬──[ Rbottom ]── GND
//!                  └── sense pin
//! ```
//! One raw sample per session, converted with
//! `mV = sample * Vref * (Rtop + Rbottom) / (ADCmax + 1) / Rbottom`.

use crate::config::LOW_BATTERY_MV;

/// Source of one raw ADC sample from the sense pin.
pub trait BatterySense {
    fn sample(&mut self) -> u16;
}

impl<T: BatterySense + ?Sized> BatterySense for &mut T {
    fn sample(&mut self) -> u16 {
        (**self).sample()
    }
}

/// ADC reference and divider resistors. Resistors only need a common unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Divider {
    pub vref_mv: u32,
    pub adc_max: u32,
    pub r_top: u32,
    pub r_bottom: u32,
}

impl Divider {
    /// Convert a raw sample to battery millivolts (truncating integer math).
    pub fn millivolts(&self, sample: u16) -> u32 {
        let sample = u64::from(u32::from(sample).min(self.adc_max));
        let total = u64::from(self.r_top) + u64::from(self.r_bottom);
        let scaled = sample * u64::from(self.vref_mv) * total;
        let mv = scaled / (u64::from(self.adc_max) + 1) / u64::from(self.r_bottom);
        mv as u32
    }
}

/// `true` when the battery is strictly below the warning threshold.
pub fn is_low(mv: u32) -> bool {
    mv < LOW_BATTERY_MV
}

/// One battery measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryReading {
    pub raw: u16,
    pub millivolts: u32,
    pub low: bool,
}

/// Samples the divider and classifies the result.
pub struct BatteryMonitor<S> {
    sense: S,
    divider: Divider,
}

impl<S: BatterySense> BatteryMonitor<S> {
    pub fn new(sense: S, divider: Divider) -> Self {
        Self { sense, divider }
    }

    /// Single point sample, no averaging.
    pub fn read_millivolts(&mut self) -> u32 {
        self.read().millivolts
    }

    pub fn read(&mut self) -> BatteryReading {
        let raw = self.sense.sample();
        let millivolts = self.divider.millivolts(raw);
        let low = is_low(millivolts);
        info!("Battery: raw={} mv={} low={}", raw, millivolts, low);
        BatteryReading {
            raw,
            millivolts,
            low,
        }
    }
}
