//! lapcount firmware entry point.
//!
//! One press of the button powers the board, runs a single session and
//! lets go of the power latch. There is no scheduler: everything runs
//! to completion on the reset thread.

#![no_std]
#![no_main]

mod flash;
mod hardware;

use cortex_m_rt::entry;
use defmt::info;
use {defmt_rtt as _, panic_probe as _};

#[entry]
fn main() -> ! {
    info!("lapcount starting...");

    let mut session = hardware::init();
    let report = session.run();

    info!(
        "Session done: count={} resets={} saved={} ({} bytes), battery={}mV low={}",
        report.count,
        report.resets,
        report.saved,
        report.bytes_written,
        report.battery_mv,
        report.battery_low
    );

    // Power is released. On USB/bench supply the board stays up, so idle.
    loop {
        cortex_m::asm::wfi();
    }
}
