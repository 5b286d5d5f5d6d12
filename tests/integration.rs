//! Integration tests for whole lapcount sessions on simulated hardware.

use core::cell::Cell;

use lapcount::battery::BatteryMonitor;
use lapcount::config::{
    BUTTON_DEBOUNCE_MS, DISPLAY_WINDOW_MS, LOW_BATTERY_FLASHES, RECORD_OFFSET, RECORD_SENTINEL,
    REFERENCE_DIVIDER,
};
use lapcount::display::{DisplayDriver, Glyph};
use lapcount::power::PowerLatch;
use lapcount::sim::{
    BusEvent, FixedSense, MemoryMedium, RecordingBus, ScriptedButton, SimClock, SimPin,
};
use lapcount::storage::{LapRecord, LapStore, RecordMedium, RECORD_LEN};
use lapcount::{Session, SessionReport};

const HEALTHY: u16 = 900;

type Medium = MemoryMedium<32>;

type Bench<'a, M> =
    Session<RecordingBus, ScriptedButton<'a>, SimPin, SimPin, FixedSense, M, SimClock<'a>>;

fn bench<'a, M: RecordMedium>(
    now: &'a Cell<u64>,
    button: ScriptedButton<'a>,
    sample: u16,
    medium: M,
) -> Bench<'a, M> {
    Session {
        display: DisplayDriver::new(RecordingBus::new()),
        button,
        indicator: SimPin::new(),
        power: PowerLatch::new(SimPin::new()),
        battery: BatteryMonitor::new(FixedSense(sample), REFERENCE_DIVIDER),
        store: LapStore::new(medium),
        clock: SimClock::new(now),
    }
}

fn stored(count: u16) -> Medium {
    let mut medium = Medium::erased();
    let record = LapRecord {
        sentinel: RECORD_SENTINEL,
        count,
    };
    medium.preload(RECORD_OFFSET, &record.to_bytes());
    medium
}

fn stored_count(medium: &mut impl RecordMedium) -> u16 {
    LapStore::new(medium).load().expect("record").count
}

const DEBOUNCE: u64 = BUTTON_DEBOUNCE_MS as u64;

#[test]
fn press_counts_one_lap() {
    let now = Cell::new(0);
    let button = ScriptedButton::new(&now).held_until(300);
    let mut s = bench(&now, button, HEALTHY, stored(5));

    let report = s.run();

    assert_eq!(report.count, 6);
    assert!(report.saved);
    assert_eq!(report.bytes_written, 1);
    assert_eq!(stored_count(s.store.medium_mut()), 6);

    // Shown, then blanked at teardown.
    assert_eq!(
        s.display.bus().glyph_frames().as_slice(),
        &[(Glyph::Blank, Glyph::D6), (Glyph::Blank, Glyph::Blank)]
    );
    // Held until 300 ms, release debounce, then a full window.
    assert_eq!(s.clock.elapsed_ms(), 300 + DEBOUNCE + DISPLAY_WINDOW_MS);
    assert_eq!(s.power.pin().history(), &[true, false]);
    assert_eq!(s.indicator.history(), &[true, false]);
}

#[test]
fn reset_gesture_zeroes_and_restarts_window() {
    let now = Cell::new(0);
    let released = 200 + DEBOUNCE;
    let reset_at = released + 1000;
    let button = ScriptedButton::new(&now)
        .held_until(200)
        .press(reset_at, reset_at + 175);
    let mut s = bench(&now, button, HEALTHY, stored(6));

    let report = s.run();

    assert_eq!(report.resets, 1);
    assert_eq!(report.count, 0);
    assert_eq!(stored_count(s.store.medium_mut()), 0);
    assert_eq!(
        s.display.bus().glyph_frames().as_slice(),
        &[
            (Glyph::Blank, Glyph::D7),
            (Glyph::Blank, Glyph::D0),
            (Glyph::Blank, Glyph::Blank),
        ]
    );
    // A full window follows the reset press's release.
    let window_restart = reset_at + 175 + DEBOUNCE;
    assert_eq!(s.clock.elapsed_ms(), window_restart + DISPLAY_WINDOW_MS);
}

#[test]
fn press_held_through_window_start_is_not_a_reset() {
    let now = Cell::new(0);
    let button = ScriptedButton::new(&now).held_until(2500);
    let mut s = bench(&now, button, HEALTHY, stored(10));

    let report = s.run();

    assert_eq!(report.resets, 0);
    assert_eq!(report.count, 11);
    assert_eq!(s.clock.elapsed_ms(), 2500 + DEBOUNCE + DISPLAY_WINDOW_MS);
}

#[test]
fn consecutive_sessions_accumulate() {
    let mut medium = Medium::erased();

    for expected in 1..=3u16 {
        let now = Cell::new(0);
        let button = ScriptedButton::new(&now).held_until(100);
        let report = bench(&now, button, HEALTHY, &mut medium).run();
        assert_eq!(report.count, expected);
        assert!(report.saved);
    }

    assert_eq!(stored_count(&mut medium), 3);
}

#[test]
fn erased_storage_initialises_record() {
    let now = Cell::new(0);
    let mut s = bench(&now, ScriptedButton::new(&now), HEALTHY, Medium::erased());

    let report = s.run();

    assert_eq!(report.count, 1);
    assert_eq!(report.bytes_written, RECORD_LEN);
    let bytes = s.store.medium().bytes();
    assert_eq!(&bytes[RECORD_OFFSET..RECORD_OFFSET + RECORD_LEN], &[0x41, 0x4C, 0x01, 0x00]);
}

#[test]
fn corrupted_record_starts_over() {
    let mut medium = Medium::erased();
    medium.preload(RECORD_OFFSET, &[0x12, 0x34, 0x05, 0x00]);
    let now = Cell::new(0);
    let mut s = bench(&now, ScriptedButton::new(&now), HEALTHY, medium);

    let report = s.run();

    assert_eq!(report.count, 1);
    // Both sentinel bytes and the low count byte change.
    assert_eq!(report.bytes_written, 3);
    assert_eq!(stored_count(s.store.medium_mut()), 1);
}

#[test]
fn counting_resumes_after_corrupted_storage() {
    let mut medium = stored(40);
    medium.corrupt();

    for expected in 1..=2u16 {
        let now = Cell::new(0);
        let report = bench(&now, ScriptedButton::new(&now), HEALTHY, &mut medium).run();
        assert_eq!(report.count, expected);
        assert!(report.saved);
    }

    assert_eq!(medium.erases(), 1);
    assert_eq!(stored_count(&mut medium), 2);
}

#[test]
fn unchanged_record_is_not_rewritten() {
    // 0 -> 1 on power-up, back to 0 by the reset gesture.
    let now = Cell::new(0);
    let button = ScriptedButton::new(&now).held_until(50).press(500, 550);
    let mut s = bench(&now, button, HEALTHY, stored(0));

    let report = s.run();

    assert_eq!(report.count, 0);
    assert!(report.saved);
    assert_eq!(report.bytes_written, 0);
    assert_eq!(s.store.medium().writes(), 0);
    assert_eq!(s.store.medium().commits(), 0);
}

#[test]
fn large_counts_display_ninety_nine() {
    let now = Cell::new(0);
    let mut s = bench(&now, ScriptedButton::new(&now), HEALTHY, stored(150));

    let report = s.run();

    assert_eq!(report.count, 151);
    assert_eq!(s.display.bus().glyph_frames()[0], (Glyph::D9, Glyph::D9));
    assert_eq!(stored_count(s.store.medium_mut()), 151);
}

#[test]
fn saturated_count_stays_put() {
    let now = Cell::new(0);
    let mut s = bench(&now, ScriptedButton::new(&now), HEALTHY, stored(u16::MAX));

    let report = s.run();

    assert_eq!(report.count, u16::MAX);
    assert_eq!(report.bytes_written, 0);
}

#[test]
fn battery_threshold_boundary() {
    // 775 -> 9990 mV, 776 -> 10003 mV.
    assert_eq!(REFERENCE_DIVIDER.millivolts(775), 9990);
    assert_eq!(REFERENCE_DIVIDER.millivolts(776), 10003);

    let now = Cell::new(0);
    let report = bench(&now, ScriptedButton::new(&now), 776, stored(0)).run();
    assert!(!report.battery_low);

    let now = Cell::new(0);
    let mut s = bench(&now, ScriptedButton::new(&now), 775, stored(0));
    let report = s.run();
    assert!(report.battery_low);
    assert_eq!(report.battery_mv, 9990);

    let frames = s.display.bus().glyph_frames();
    assert_eq!(frames[0], (Glyph::LeftBracket, Glyph::RightBracket));
    assert_eq!(frames[1], (Glyph::Blank, Glyph::D1));

    let flashes = s
        .display
        .bus()
        .events()
        .iter()
        .take_while(|e| !matches!(e, BusEvent::Latched(_, r) if *r == Glyph::D1.segments()))
        .filter(|e| **e == BusEvent::OutputEnable(true))
        .count();
    assert_eq!(flashes, usize::from(LOW_BATTERY_FLASHES));
}

#[test]
fn low_battery_still_counts_and_saves() {
    let now = Cell::new(0);
    let mut s = bench(&now, ScriptedButton::new(&now), 600, stored(8));

    let report = s.run();

    assert!(report.battery_low);
    assert_eq!(report.count, 9);
    assert!(report.saved);
    assert!(!s.power.is_held());
}

#[test]
fn shift_order_for_seven_and_forty_two() {
    let mut display = DisplayDriver::new(RecordingBus::new());

    display.show(7);
    // Right digit first, MSB first: 7 = 0xE0, then blank.
    let mut expected = [false; 16];
    expected[..3].copy_from_slice(&[true, true, true]);
    assert_eq!(display.bus().last_frame_bits(), &expected);
    assert_eq!(display.bus().shown(), Some((Glyph::Blank, Glyph::D7)));

    display.show(42);
    // 2 = 0xDA, then 4 = 0x66.
    let bits = |byte: u8| (0..8).rev().map(move |i| byte & (1 << i) != 0);
    let expected: Vec<bool> = bits(0xDA).chain(bits(0x66)).collect();
    assert_eq!(display.bus().last_frame_bits(), expected.as_slice());
    assert_eq!(display.bus().shown(), Some((Glyph::D4, Glyph::D2)));
}

#[test]
fn report_matches_session_outcome() {
    let now = Cell::new(0);
    let report = bench(&now, ScriptedButton::new(&now), HEALTHY, stored(1)).run();

    assert_eq!(
        report,
        SessionReport {
            battery_mv: REFERENCE_DIVIDER.millivolts(HEALTHY),
            battery_low: false,
            count: 2,
            resets: 0,
            saved: true,
            bytes_written: 1,
        }
    );
}
