//! Simulated collaborators for host tests.
//!
//! Everything here is `no_std` and backed by `heapless`, so the same
//! doubles serve unit tests, integration tests and any on-target
//! self-test. Simulated time lives in a shared `Cell<u64>` of
//! nanoseconds: [`SimClock`] advances it, [`ScriptedButton`] reads it.

use crate::battery::BatterySense;
use crate::button::Button;
use crate::clock::Clock;
use crate::display::{Glyph, SegmentMask, ShiftBus};
use crate::error::{Error, Result};
use crate::storage::RecordMedium;
use core::cell::Cell;
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use heapless::Vec;

const NS_PER_MS: u64 = 1_000_000;

// ═══════════════════════════════════════════════════════════════════════════
// Time
// ═══════════════════════════════════════════════════════════════════════════

/// Delays advance the shared time instantly.
pub struct SimClock<'a> {
    now_ns: &'a Cell<u64>,
    start_ns: u64,
}

impl<'a> SimClock<'a> {
    pub fn new(now_ns: &'a Cell<u64>) -> Self {
        Self {
            now_ns,
            start_ns: now_ns.get(),
        }
    }

    /// Simulated milliseconds since this clock was created.
    pub fn elapsed_ms(&self) -> u64 {
        (self.now_ns.get() - self.start_ns) / NS_PER_MS
    }
}

impl DelayNs for SimClock<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + u64::from(ns));
    }
}

impl Clock for SimClock<'_> {
    fn now_ms(&mut self) -> u64 {
        self.now_ns.get() / NS_PER_MS
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Button
// ═══════════════════════════════════════════════════════════════════════════

/// Button that is pressed during scripted `[start, end)` windows (ms).
pub struct ScriptedButton<'a> {
    now_ns: &'a Cell<u64>,
    presses: Vec<(u64, u64), 8>,
}

impl<'a> ScriptedButton<'a> {
    /// A button that is never pressed.
    pub fn new(now_ns: &'a Cell<u64>) -> Self {
        Self {
            now_ns,
            presses: Vec::new(),
        }
    }

    /// Held from power-up until `release_ms`.
    pub fn held_until(self, release_ms: u64) -> Self {
        self.press(0, release_ms)
    }

    /// Pressed from `start_ms` until `end_ms`.
    pub fn press(mut self, start_ms: u64, end_ms: u64) -> Self {
        let _ = self.presses.push((start_ms, end_ms));
        self
    }
}

impl Button for ScriptedButton<'_> {
    fn is_pressed(&mut self) -> bool {
        let now = self.now_ns.get() / NS_PER_MS;
        self.presses
            .iter()
            .any(|&(start, end)| start <= now && now < end)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GPIO
// ═══════════════════════════════════════════════════════════════════════════

/// Output pin that remembers every level it was set to.
#[derive(Default)]
pub struct SimPin {
    high: bool,
    history: Vec<bool, 64>,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Levels in the order they were driven (up to 64).
    pub fn history(&self) -> &[bool] {
        &self.history
    }

    fn set(&mut self, high: bool) {
        self.high = high;
        let _ = self.history.push(high);
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimPin {
    fn set_low(&mut self) -> core::result::Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

/// Error returned by a [`SimInput`] configured to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinFault;

impl embedded_hal::digital::Error for SimPinFault {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Input pin with a settable level.
pub struct SimInput {
    high: bool,
    fail: bool,
}

impl SimInput {
    pub fn new(high: bool) -> Self {
        Self { high, fail: false }
    }

    pub fn set_high(&mut self, high: bool) {
        self.high = high;
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail = fail;
    }
}

impl embedded_hal::digital::ErrorType for SimInput {
    type Error = SimPinFault;
}

impl embedded_hal::digital::InputPin for SimInput {
    fn is_high(&mut self) -> core::result::Result<bool, SimPinFault> {
        if self.fail {
            return Err(SimPinFault);
        }
        Ok(self.high)
    }

    fn is_low(&mut self) -> core::result::Result<bool, SimPinFault> {
        self.is_high().map(|high| !high)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Display bus
// ═══════════════════════════════════════════════════════════════════════════

/// What a [`RecordingBus`] observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// Latch with the (left, right) masks now in the output register.
    Latched(SegmentMask, SegmentMask),
    OutputEnable(bool),
}

/// Models the 16-bit shift register and records latches and enables.
#[derive(Default)]
pub struct RecordingBus {
    shift: u16,
    pending: Vec<bool, 32>,
    last_frame: Vec<bool, 32>,
    latched: Option<(SegmentMask, SegmentMask)>,
    enabled: bool,
    frames: Vec<(SegmentMask, SegmentMask), 64>,
    events: Vec<BusEvent, 128>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits shifted since the last latch.
    pub fn pending_bits(&self) -> &[bool] {
        &self.pending
    }

    /// Bits that made up the most recent latched frame, in shift order.
    pub fn last_frame_bits(&self) -> &[bool] {
        &self.last_frame
    }

    /// Output register contents as (left, right) masks.
    pub fn latched(&self) -> Option<(SegmentMask, SegmentMask)> {
        self.latched
    }

    pub fn output_enabled(&self) -> bool {
        self.enabled
    }

    /// Every latched (left, right) pair in order.
    pub fn frames(&self) -> &[(SegmentMask, SegmentMask)] {
        &self.frames
    }

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Glyphs currently visible, if the outputs are on.
    pub fn shown(&self) -> Option<(Glyph, Glyph)> {
        if !self.enabled {
            return None;
        }
        self.latched
            .map(|(left, right)| (glyph_for(left), glyph_for(right)))
    }

    /// Every latched pair decoded to glyphs.
    pub fn glyph_frames(&self) -> Vec<(Glyph, Glyph), 64> {
        self.frames
            .iter()
            .map(|&(left, right)| (glyph_for(left), glyph_for(right)))
            .collect()
    }
}

/// Reverse lookup of a mask; unknown patterns decode as [`Glyph::Error`].
pub fn glyph_for(mask: SegmentMask) -> Glyph {
    (0..=15u8)
        .map(Glyph::from_id)
        .find(|g| g.segments() == mask)
        .unwrap_or(Glyph::Error)
}

impl ShiftBus for RecordingBus {
    fn shift_bit(&mut self, bit: bool) {
        self.shift = (self.shift << 1) | u16::from(bit);
        let _ = self.pending.push(bit);
    }

    fn latch(&mut self) {
        // First byte shifted travels furthest: it ends up in the high half.
        let left = (self.shift & 0xFF) as u8;
        let right = (self.shift >> 8) as u8;
        self.latched = Some((left, right));
        self.last_frame = core::mem::take(&mut self.pending);
        let _ = self.frames.push((left, right));
        let _ = self.events.push(BusEvent::Latched(left, right));
    }

    fn set_output_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        let _ = self.events.push(BusEvent::OutputEnable(enabled));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Battery
// ═══════════════════════════════════════════════════════════════════════════

/// Battery sense that always returns the same raw sample.
pub struct FixedSense(pub u16);

impl BatterySense for FixedSense {
    fn sample(&mut self) -> u16 {
        self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Persistent medium
// ═══════════════════════════════════════════════════════════════════════════

/// RAM-backed byte region that counts writes and can inject faults.
pub struct MemoryMedium<const N: usize> {
    bytes: [u8; N],
    writes: usize,
    commits: usize,
    erases: usize,
    fail_reads: bool,
    fail_writes: bool,
    corrupted: bool,
}

impl<const N: usize> MemoryMedium<N> {
    /// All bytes 0xFF, like erased EEPROM or flash.
    pub fn erased() -> Self {
        Self {
            bytes: [0xFF; N],
            writes: 0,
            commits: 0,
            erases: 0,
            fail_reads: false,
            fail_writes: false,
            corrupted: false,
        }
    }

    /// Place `data` at `offset` without counting it as a write.
    pub fn preload(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Single-byte writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Reads report [`Error::Corrupted`] until the medium is erased.
    pub fn corrupt(&mut self) {
        self.corrupted = true;
    }

    pub fn erases(&self) -> usize {
        self.erases
    }
}

impl<const N: usize> RecordMedium for MemoryMedium<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()> {
        if self.fail_reads {
            return Err(Error::Storage);
        }
        if self.corrupted {
            return Err(Error::Corrupted);
        }
        let end = offset.checked_add(buf.len()).ok_or(Error::OutOfBounds)?;
        let src = self.bytes.get(offset..end).ok_or(Error::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage);
        }
        let slot = self.bytes.get_mut(offset).ok_or(Error::OutOfBounds)?;
        *slot = byte;
        self.writes += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage);
        }
        self.commits += 1;
        Ok(())
    }

    fn erase(&mut self) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage);
        }
        self.bytes = [0xFF; N];
        self.corrupted = false;
        self.erases += 1;
        Ok(())
    }
}
