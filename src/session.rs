//! The power-up session.
//!
//! A button press powers the board; the firmware runs exactly one
//! session and cuts its own power at the end:
//!
//! ```text
//! PowerLatch → Setup → BatteryCheck → LoadAndIncrement
//!     → ShowAndWaitRelease → DisplayWindow → Teardown → Off
//!                              ↺ reset gesture
//! ```
//!
//! There is no path back to `Setup`; the next session needs the next
//! press. All waiting is blocking on the single thread.

use crate::battery::{BatteryMonitor, BatteryReading, BatterySense};
use crate::button::{wait_for_release, Button};
use crate::clock::Clock;
use crate::config::{
    BUTTON_DEBOUNCE_MS, BUTTON_POLL_MS, DISPLAY_WINDOW_MS, LOW_BATTERY_FLASHES,
    MAX_DISPLAY_VALUE,
};
use crate::display::{DisplayDriver, Glyph, ShiftBus};
use crate::power::PowerLatch;
use crate::storage::{LapRecord, LapStore, RecordMedium};
use embedded_hal::digital::OutputPin;

/// Session states in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Assert the power hold before anything else.
    PowerLatch,
    /// Light the button, let the initiating press stop bouncing.
    Setup,
    /// Sample the battery once; warn if low.
    BatteryCheck,
    /// Load the record and count this press.
    LoadAndIncrement,
    /// Show the count and wait for the initiating press to end.
    ShowAndWaitRelease,
    /// Keep the count visible, accepting reset gestures.
    DisplayWindow,
    /// Blank, persist, release power.
    Teardown,
    /// Power released. Terminal.
    Off,
}

/// Mutable state threaded through every phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub record: LapRecord,
    /// `false` after a failed load, so a read fault never overwrites storage.
    pub persist: bool,
    pub battery: Option<BatteryReading>,
    pub resets: u16,
    pub saved: bool,
    pub bytes_written: usize,
}

impl SessionContext {
    pub const fn new() -> Self {
        Self {
            record: LapRecord::fresh(),
            persist: false,
            battery: None,
            resets: 0,
            saved: false,
            bytes_written: 0,
        }
    }

    /// Value for the two digits.
    pub fn display_value(&self) -> u8 {
        self.record.count.min(MAX_DISPLAY_VALUE) as u8
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionReport {
    pub battery_mv: u32,
    pub battery_low: bool,
    pub count: u16,
    pub resets: u16,
    pub saved: bool,
    pub bytes_written: usize,
}

impl From<&SessionContext> for SessionReport {
    fn from(ctx: &SessionContext) -> Self {
        Self {
            battery_mv: ctx.battery.map_or(0, |b| b.millivolts),
            battery_low: ctx.battery.is_some_and(|b| b.low),
            count: ctx.record.count,
            resets: ctx.resets,
            saved: ctx.saved,
            bytes_written: ctx.bytes_written,
        }
    }
}

/// Every peripheral a session touches, exclusively owned for its lifetime.
pub struct Session<BUS, BTN, LED, PWR, BAT, MED, CLK> {
    pub display: DisplayDriver<BUS>,
    pub button: BTN,
    pub indicator: LED,
    pub power: PowerLatch<PWR>,
    pub battery: BatteryMonitor<BAT>,
    pub store: LapStore<MED>,
    pub clock: CLK,
}

impl<BUS, BTN, LED, PWR, BAT, MED, CLK> Session<BUS, BTN, LED, PWR, BAT, MED, CLK>
where
    BUS: ShiftBus,
    BTN: Button,
    LED: OutputPin,
    PWR: OutputPin,
    BAT: BatterySense,
    MED: RecordMedium,
    CLK: Clock,
{
    /// Run every phase until power is released.
    pub fn run(&mut self) -> SessionReport {
        let mut ctx = SessionContext::new();
        let mut phase = Phase::PowerLatch;

        while phase != Phase::Off {
            let next = self.step(phase, &mut ctx);
            info!("Session: {:?} -> {:?}", phase, next);
            phase = next;
        }

        SessionReport::from(&ctx)
    }

    /// Execute one phase and return the one that follows.
    pub fn step(&mut self, phase: Phase, ctx: &mut SessionContext) -> Phase {
        match phase {
            Phase::PowerLatch => {
                self.power.hold();
                Phase::Setup
            }
            Phase::Setup => {
                let _ = self.indicator.set_high();
                self.clock.delay_ms(BUTTON_DEBOUNCE_MS);
                Phase::BatteryCheck
            }
            Phase::BatteryCheck => {
                self.check_battery(ctx);
                Phase::LoadAndIncrement
            }
            Phase::LoadAndIncrement => {
                self.load_and_increment(ctx);
                Phase::ShowAndWaitRelease
            }
            Phase::ShowAndWaitRelease => {
                self.display.show(ctx.display_value());
                wait_for_release(&mut self.button, &mut self.clock);
                Phase::DisplayWindow
            }
            Phase::DisplayWindow => {
                self.display_window(ctx);
                Phase::Teardown
            }
            Phase::Teardown => {
                self.teardown(ctx);
                Phase::Off
            }
            Phase::Off => Phase::Off,
        }
    }

    fn check_battery(&mut self, ctx: &mut SessionContext) {
        let reading = self.battery.read();
        ctx.battery = Some(reading);
        if reading.low {
            warn!("Battery: low ({} mV)", reading.millivolts);
            self.display.flash_pattern(
                Glyph::LeftBracket,
                Glyph::RightBracket,
                LOW_BATTERY_FLASHES,
                &mut self.clock,
            );
        }
    }

    fn load_and_increment(&mut self, ctx: &mut SessionContext) {
        match self.store.load() {
            Ok(record) => {
                ctx.record = record;
                ctx.persist = true;
            }
            Err(e) => {
                error!("Record: load failed: {:?} - count will not be saved", e);
                ctx.record = LapRecord::fresh();
                ctx.persist = false;
            }
        }
        ctx.record.increment();
        info!("Session: lap {}", ctx.record.count);
    }

    /// Keep the count visible for the display window.
    ///
    /// A press inside the window zeroes the count and, once released,
    /// starts a full window again.
    fn display_window(&mut self, ctx: &mut SessionContext) {
        let mut start = self.clock.now_ms();
        while self.clock.elapsed_since(start) < DISPLAY_WINDOW_MS {
            if self.button.is_pressed() {
                ctx.record.reset();
                ctx.resets = ctx.resets.saturating_add(1);
                info!("Session: reset gesture #{}", ctx.resets);
                self.display.show(ctx.display_value());
                wait_for_release(&mut self.button, &mut self.clock);
                start = self.clock.now_ms();
            } else {
                self.clock.delay_ms(BUTTON_POLL_MS);
            }
        }
    }

    fn teardown(&mut self, ctx: &mut SessionContext) {
        self.display.blank();
        let _ = self.indicator.set_low();

        if ctx.persist {
            match self.store.save(&ctx.record) {
                Ok(written) => {
                    ctx.saved = true;
                    ctx.bytes_written = written;
                }
                Err(e) => error!("Record: save failed: {:?}", e),
            }
        } else {
            warn!("Record: skipping save after failed load");
        }

        self.power.release();
    }
}
