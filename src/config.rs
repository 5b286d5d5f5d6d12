//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, battery thresholds and storage layout
//! constants live here so they can be tuned in one place.

use crate::battery::Divider;

// Session timing

/// How long the lap count stays visible after the last button activity (ms).
pub const DISPLAY_WINDOW_MS: u64 = 3000;

/// Button debounce time (ms), applied after power-up and after every release.
pub const BUTTON_DEBOUNCE_MS: u32 = 25;

/// Pause between two button polls (ms).
pub const BUTTON_POLL_MS: u32 = 1;

// Display

/// Latch-enable pulse width (µs). The driver chip needs a few µs to settle.
pub const LATCH_PULSE_US: u32 = 5;

/// Visible part of one attention flash (ms).
pub const FLASH_ON_MS: u32 = 750;

/// Blank part of one attention flash (ms).
pub const FLASH_OFF_MS: u32 = 250;

/// Largest value the two digits can show.
pub const MAX_DISPLAY_VALUE: u16 = 99;

// Battery

/// Below this the low-battery warning is shown (mV).
pub const LOW_BATTERY_MV: u32 = 10_000;

/// Number of on/off cycles of the low-battery warning.
pub const LOW_BATTERY_FLASHES: u8 = 3;

/// Reference design: 3.3 V full scale, 10-bit ADC, 615k / 205k divider (4:1).
pub const REFERENCE_DIVIDER: Divider = Divider {
    vref_mv: 3300,
    adc_max: 1023,
    r_top: 615,
    r_bottom: 205,
};

// Persistent lap record

/// Tag stored in front of the count. Anything else means "never initialised".
pub const RECORD_SENTINEL: u16 = 0x4C41;

/// Byte offset of the record inside the persistent region.
pub const RECORD_OFFSET: usize = 0;

/// Flash page index where the record storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for the record. sequential-storage needs two.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 2;

// GPIO pin assignments (nRF52840)
//
// These are logical names; the actual `embassy_nrf::peripherals::*` are
// picked in `hardware.rs`.  Adjust for your custom PCB.
//
//   Power hold      → P0.13  (output, high keeps the MOSFET latch on)
//   Button          → P0.11  (input, pull-up, pressed = low)
//   Button LED      → P0.06  (output, high = lit)
//   Battery sense   → P0.02  (AIN0, via 615k/205k divider)
//   Display SDI     → P0.26
//   Display CLK     → P0.27
//   Display LE      → P0.04
//   Display OE_N    → P0.05  (active-low output enable)
