use std::sync::Arc;

use crate::clock::ManualClock;
use crate::counter::{FrameRate, FrameRateCounter};
use crate::error::SceneError;

fn counter(fps: f64) -> (Arc<ManualClock>, FrameRateCounter) {
    let clock = ManualClock::new(1_000);
    let counter = FrameRateCounter::new(clock.clone(), fps);
    (clock, counter)
}

#[test]
fn due_once_per_period() {
    let (clock, mut counter) = counter(10.0);
    assert!(!counter.is_due());

    clock.advance_msec(99);
    assert!(!counter.is_due());

    clock.advance_msec(1);
    assert!(counter.is_due());
    assert!(!counter.is_due(), "same window must not be due twice");
    assert_eq!(counter.frame(), 1);
}

#[test]
fn frame_count_tracks_simulated_time() {
    let (clock, mut counter) = counter(30.0);
    for _ in 0..1_000 {
        clock.advance_msec(1);
        counter.is_due();
    }
    // floor(1s / 33.3ms) = 30, within one frame.
    let frames = counter.frame();
    assert!((29..=30).contains(&frames), "got {frames} frames");
}

#[test]
fn zero_fps_is_never_due() {
    let (clock, mut counter) = counter(0.0);
    clock.advance_msec(10_000);
    assert!(!counter.is_due());
    assert!(!counter.peek_due());
    assert_eq!(counter.frame(), 0);
}

#[test]
fn peek_does_not_consume() {
    let (clock, mut counter) = counter(10.0);
    clock.advance_msec(100);
    assert!(counter.peek_due());
    assert!(counter.peek_due());
    assert_eq!(counter.frame(), 0);
    assert!(counter.is_due());
}

#[test]
fn frame_rate_change_keeps_cadence_origin() {
    let (clock, mut counter) = counter(10.0);
    clock.advance_msec(100);
    assert!(counter.is_due());

    clock.advance_msec(50);
    counter.set_frame_rate(20.0);
    assert_eq!(counter.frame(), 1);
    assert!(counter.is_due(), "50ms since last frame meets the new 20fps period");
    assert_eq!(counter.frame(), 2);
}

#[test]
fn offset_shifts_readout_not_cadence() {
    let (clock, mut counter) = counter(10.0);
    clock.advance_msec(40);
    assert_eq!(counter.elapsed_usec(), 40_000);

    counter.add_offset(1.5);
    assert_eq!(counter.elapsed_usec(), 1_540_000);
    counter.add_offset_usec(-40_000);
    assert_eq!(counter.elapsed_usec(), 1_500_000);

    clock.advance_msec(59);
    assert!(!counter.is_due());
    clock.advance_msec(1);
    assert!(counter.is_due());

    counter.set_offset(0.0);
    assert_eq!(counter.elapsed_usec(), 100_000);
}

#[test]
fn negative_offset_clamps_to_zero() {
    let (clock, mut counter) = counter(10.0);
    clock.advance_msec(10);
    counter.set_offset_usec(-50_000);
    assert_eq!(counter.elapsed_usec(), 0);
    clock.advance_msec(60);
    assert_eq!(counter.elapsed_usec(), 20_000);
}

#[test]
fn set_time_recomputes_offset() {
    let (clock, mut counter) = counter(10.0);
    clock.advance_msec(300);
    counter.set_time(2.0);
    assert_eq!(counter.elapsed_usec(), 2_000_000);
    assert_eq!(counter.offset_usec(), 1_700_000);

    clock.advance_msec(250);
    assert_eq!(counter.msec(), 2_250);
    assert!((counter.sec() - 2.25).abs() < 1e-9);
}

#[test]
fn reset_clears_frame_offset_but_keeps_life() {
    let (clock, mut counter) = counter(10.0);
    counter.set_life_usec(Some(5_000_000));
    clock.advance_msec(200);
    counter.is_due();
    counter.add_offset(1.0);

    counter.reset();
    assert_eq!(counter.frame(), 0);
    assert_eq!(counter.elapsed_usec(), 0);
    assert_eq!(counter.offset_usec(), 0);
    assert_eq!(counter.life_usec(), Some(5_000_000));
}

#[test]
fn finite_life_expires() {
    let (clock, mut counter) = counter(10.0);
    counter.set_life_usec(Some(1_000_000));
    clock.advance_msec(999);
    assert!(!counter.has_finite_life_expired());
    assert_eq!(counter.remaining_usec(), Some(1_000));

    clock.advance_msec(1);
    assert!(counter.has_finite_life_expired());
    assert_eq!(counter.remaining_usec(), Some(0));

    counter.set_life_usec(None);
    assert!(!counter.has_finite_life_expired());
    assert_eq!(counter.remaining_usec(), None);
}

#[test]
fn pause_freezes_elapsed_and_due() {
    let (clock, mut counter) = counter(10.0);
    clock.advance_msec(80);
    counter.pause();
    clock.advance_msec(500);
    assert_eq!(counter.elapsed_usec(), 80_000);
    assert!(!counter.is_due());

    counter.resume();
    assert_eq!(counter.elapsed_usec(), 80_000);
    clock.advance_msec(20);
    assert!(counter.is_due());
    assert_eq!(counter.elapsed_usec(), 100_000);
}

#[test]
fn usec_wraps_at_32_bits() {
    let (clock, mut counter) = counter(1.0);
    counter.set_time_usec(u64::from(u32::MAX) + 11);
    assert_eq!(counter.usec(), 10);
    clock.advance_usec(1);
    assert_eq!(counter.usec64(), u64::from(u32::MAX) + 12);
}

#[test]
fn frame_rate_validation() {
    assert_eq!(FrameRate::new(12.5).map(FrameRate::fps), Ok(12.5));
    assert_eq!(FrameRate::new(-1.0), Err(SceneError::InvalidFrameRate(-1.0)));
    assert!(FrameRate::new(f64::NAN).is_err());
    assert_eq!(FrameRate::saturating(f64::INFINITY), FrameRate::ZERO);
    assert_eq!(FrameRate::new(4.0).unwrap().interval_usec(), Some(250_000.0));
    assert_eq!(FrameRate::ZERO.interval_usec(), None);
}

#[test]
fn negative_frame_rate_falls_back_to_zero() {
    let (clock, mut counter) = counter(-5.0);
    assert_eq!(counter.frame_rate(), 0.0);
    clock.advance_msec(1_000);
    assert!(!counter.is_due());
}
