//! Pin mappings and peripheral initialisation for the nRF52840 board.
//!
//! # Pin Assignments
//!
//! ## Power
//! - **P0.13**: POWER_HOLD - high keeps the MOSFET latch closed
//!
//! ## Button
//! - **P0.11**: BUTTON_N - tactile switch to GND, internal pull-up
//! - **P0.06**: BUTTON_LED - ring light in the switch, high = lit
//!
//! ## Battery
//! - **P0.02**: AIN0 - pack voltage through a 615k/205k divider
//!
//! ## Display (constant-current shift-register driver)
//! - **P0.26**: SDI - serial data
//! - **P0.27**: CLK - serial clock
//! - **P0.04**: LE - latch enable
//! - **P0.05**: OE_N - active-low output enable

use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_futures::block_on;
use embassy_nrf::bind_interrupts;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::saadc::{self, ChannelConfig, Gain, Reference, Resolution, Saadc};
use embassy_time::{Delay, Instant};
use embedded_hal::delay::DelayNs;

use lapcount::battery::{BatteryMonitor, BatterySense};
use lapcount::button::ActiveLowButton;
use lapcount::clock::Clock;
use lapcount::config::REFERENCE_DIVIDER;
use lapcount::display::{DisplayDriver, PinBus};
use lapcount::power::PowerLatch;
use lapcount::storage::LapStore;
use lapcount::Session;

use crate::flash::FlashMedium;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
});

/// Display lines in SDI, CLK, LE, OE_N order.
pub type DisplayBus =
    PinBus<Output<'static>, Output<'static>, Output<'static>, Output<'static>, Delay>;

/// The session with every board peripheral plugged in.
pub type BoardSession = Session<
    DisplayBus,
    ActiveLowButton<Input<'static>>,
    Output<'static>,
    Output<'static>,
    SaadcSense,
    FlashMedium<BlockingAsync<Nvmc<'static>>>,
    EmbassyClock,
>;

/// Millisecond clock and blocking delays from the RTC1 time driver.
pub struct EmbassyClock;

impl DelayNs for EmbassyClock {
    fn delay_ns(&mut self, ns: u32) {
        Delay.delay_ns(ns);
    }

    fn delay_us(&mut self, us: u32) {
        Delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        Delay.delay_ms(ms);
    }
}

impl Clock for EmbassyClock {
    fn now_ms(&mut self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Battery divider on AIN0 through the SAADC.
///
/// 10-bit, VDD/4 reference with 1/4 gain: full scale is VDD (3.3 V).
pub struct SaadcSense {
    saadc: Saadc<'static, 1>,
}

impl SaadcSense {
    fn new(saadc: Saadc<'static, 1>) -> Self {
        block_on(saadc.calibrate());
        Self { saadc }
    }
}

impl BatterySense for SaadcSense {
    fn sample(&mut self) -> u16 {
        let mut buf = [0i16; 1];
        block_on(self.saadc.sample(&mut buf));
        // Single-ended readings can dip just below zero near GND.
        buf[0].max(0) as u16
    }
}

/// Bring up the board and hand every peripheral to a session.
///
/// The power hold pin is configured high before anything else so that
/// letting go of the button early cannot cut power.
pub fn init() -> BoardSession {
    let p = embassy_nrf::init(Default::default());

    let power_hold = Output::new(p.P0_13, Level::High, OutputDrive::Standard);

    let bus = PinBus::new(
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_27, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_04, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_05, Level::High, OutputDrive::Standard),
        Delay,
    );

    let mut adc_config = saadc::Config::default();
    adc_config.resolution = Resolution::_10BIT;
    let mut channel = ChannelConfig::single_ended(p.P0_02);
    channel.reference = Reference::VDD1_4;
    channel.gain = Gain::GAIN1_4;
    let saadc = Saadc::new(p.SAADC, Irqs, adc_config, [channel]);

    Session {
        display: DisplayDriver::new(bus),
        button: ActiveLowButton::new(Input::new(p.P0_11, Pull::Up)),
        indicator: Output::new(p.P0_06, Level::Low, OutputDrive::Standard),
        power: PowerLatch::new(power_hold),
        battery: BatteryMonitor::new(SaadcSense::new(saadc), REFERENCE_DIVIDER),
        store: LapStore::new(FlashMedium::new(BlockingAsync::new(Nvmc::new(p.NVMC)))),
        clock: EmbassyClock,
    }
}
