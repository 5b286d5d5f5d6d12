//! Host-testable library for the lapcount firmware.
//!
//! Everything with real sequencing or encoding logic lives here, behind
//! small hardware traits, so it runs on the host with simulated time,
//! pins and storage (no embedded hardware required).
//!
//! Usage: `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and only wires nRF52840 peripherals to these traits.
//!
//! ## Modules
//!
//! - [`display`]: glyph encoding and the shift-register display driver
//! - [`battery`]: divider sampling and low-battery classification
//! - [`storage`]: the persisted lap record
//! - [`session`]: the power-up state machine tying it all together
//! - [`sim`]: simulated clock, pins, bus and medium for tests

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod battery;
pub mod button;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod power;
pub mod session;
pub mod sim;
pub mod storage;

pub use error::{Error, Result};
pub use session::{Phase, Session, SessionContext, SessionReport};
