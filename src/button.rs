//! Button input and polling helpers.
//!
//! One tactile switch (active-low with pull-up). It both powers the
//! board up and, while the count is shown, acts as the reset gesture.
//! Everything here is polled; there are no edge interrupts.

use crate::clock::Clock;
use crate::config::{BUTTON_DEBOUNCE_MS, BUTTON_POLL_MS};
use embedded_hal::digital::InputPin;

/// Debounce-free view of the switch.
pub trait Button {
    fn is_pressed(&mut self) -> bool;
}

impl<T: Button + ?Sized> Button for &mut T {
    fn is_pressed(&mut self) -> bool {
        (**self).is_pressed()
    }
}

/// Switch to ground on a pulled-up input: pressed reads low.
pub struct ActiveLowButton<P> {
    pin: P,
}

impl<P: InputPin> ActiveLowButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> Button for ActiveLowButton<P> {
    fn is_pressed(&mut self) -> bool {
        // A failed read counts as released so a session can always finish.
        self.pin.is_low().unwrap_or(false)
    }
}

/// Poll until the button is released, then wait out contact bounce.
pub fn wait_for_release(button: &mut impl Button, clock: &mut impl Clock) {
    while button.is_pressed() {
        clock.delay_ms(BUTTON_POLL_MS);
    }
    clock.delay_ms(BUTTON_DEBOUNCE_MS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedButton, SimClock, SimInput};
    use core::cell::Cell;

    #[test]
    fn active_low_reads_pressed_when_low() {
        let mut button = ActiveLowButton::new(SimInput::new(true));
        assert!(!button.is_pressed());

        let mut button = ActiveLowButton::new(SimInput::new(false));
        assert!(button.is_pressed());
    }

    #[test]
    fn failed_read_counts_as_released() {
        let mut input = SimInput::new(false);
        input.fail_reads(true);
        let mut button = ActiveLowButton::new(input);
        assert!(!button.is_pressed());
    }

    #[test]
    fn wait_for_release_returns_after_release_plus_debounce() {
        let now = Cell::new(0);
        let mut clock = SimClock::new(&now);
        let mut button = ScriptedButton::new(&now).held_until(120);

        wait_for_release(&mut button, &mut clock);

        assert_eq!(clock.now_ms(), 120 + u64::from(BUTTON_DEBOUNCE_MS));
    }

    #[test]
    fn wait_for_release_when_already_released_only_debounces() {
        let now = Cell::new(0);
        let mut clock = SimClock::new(&now);
        let mut button = ScriptedButton::new(&now);

        wait_for_release(&mut button, &mut clock);

        assert_eq!(clock.now_ms(), u64::from(BUTTON_DEBOUNCE_MS));
    }
}
