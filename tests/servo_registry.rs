#![allow(missing_docs)]
//! Host-level tests for the servo registry lifecycle.

use pico_servo::Error;
use pico_servo::hardware::Channel;
use pico_servo::hardware::sim::SimulatedPwm;
use pico_servo::pwm_params::PwmParamsError;
use pico_servo::servo::{
    DEFAULT_SERVO_MAX_PULSE_US, DEFAULT_SERVO_MIN_PULSE_US, MAX_SERVOS, ServoRegistry,
};

// At 1 MHz the divider clamps to 1.0 and a 20 ms period is 20_000 ticks, so levels read
// directly as microseconds.
fn one_tick_per_us() -> ServoRegistry<SimulatedPwm> {
    ServoRegistry::new(SimulatedPwm::with_sys_clk_hz(1_000_000))
}

fn pico1() -> ServoRegistry<SimulatedPwm> {
    ServoRegistry::new(SimulatedPwm::new())
}

#[test]
fn init_default_records_calibration_and_drives_zero() {
    let mut servos = pico1();
    servos.init_default(15).expect("init");

    let record = *servos.record(15).expect("record");
    assert_eq!(record.pin_id(), 15);
    assert_eq!(record.slice_id(), 7);
    assert_eq!(record.channel(), Channel::B);
    assert_eq!(record.min_pulse_us(), DEFAULT_SERVO_MIN_PULSE_US);
    assert_eq!(record.max_pulse_us(), DEFAULT_SERVO_MAX_PULSE_US);
    assert_eq!(record.wrap_count(), u16::MAX);
    assert!(record.attached());

    let pwm = servos.hardware();
    assert!(pwm.is_pwm_function(15));
    assert!(pwm.is_output_enabled(15));
    let slice = pwm.slice(7);
    assert_eq!(
        (slice.wrap_count, slice.clk_div_int, slice.clk_div_frac),
        (u16::MAX, 38, 2)
    );
    // 1000 µs of 20 ms in 65536 ticks
    assert_eq!(pwm.level(15), 3276);
    assert_eq!(pwm.level(15), record.level_for_angle(0));
}

#[test]
fn set_interpolates_between_calibration_bounds() {
    let mut servos = one_tick_per_us();
    servos.init_default(2).expect("init");

    let mut levels = [0u16; 5];
    for (level, degrees) in levels.iter_mut().zip([0, 45, 90, 135, 180]) {
        servos.set(2, degrees).expect("set");
        *level = servos.hardware().level(2);
    }

    assert_eq!(levels, [1000, 1250, 1500, 1750, 2000]);
}

#[test]
fn set_levels_at_pico1_clock() {
    let mut servos = pico1();
    servos.init_default(2).expect("init");

    servos.set(2, 0).expect("set");
    let min_level = servos.hardware().level(2);
    servos.set(2, 90).expect("set");
    let mid_level = servos.hardware().level(2);
    servos.set(2, 180).expect("set");
    let max_level = servos.hardware().level(2);

    // pulse / period * (wrap + 1), truncated
    assert_eq!((min_level, mid_level, max_level), (3276, 4915, 6553));
    assert!(min_level < mid_level && mid_level < max_level);
}

#[test]
fn set_clamps_angle_above_180() {
    let mut servos = one_tick_per_us();
    servos.init(6, 500, 2500).expect("init");

    servos.set(6, 180).expect("set");
    let at_180 = servos.hardware().level(6);
    servos.set(6, 200).expect("set");
    let at_200 = servos.hardware().level(6);
    servos.set(6, u16::MAX).expect("set");

    assert_eq!(at_180, 2500);
    assert_eq!(at_200, at_180);
    assert_eq!(servos.hardware().level(6), at_180);
}

#[test]
fn level_never_exceeds_wrap_count() {
    let mut servos = one_tick_per_us();
    // 25 ms pulse does not fit a 20 ms period
    servos.init(4, 1000, 25_000).expect("init");

    servos.set(4, 180).expect("set");

    assert_eq!(servos.hardware().level(4), 19_999);
}

#[test]
fn second_init_on_same_pin_fails_and_keeps_first() {
    let mut servos = pico1();
    servos.init(3, 500, 2500).expect("init");
    servos.set(3, 90).expect("set");
    let before = *servos.record(3).expect("record");
    let level_before = servos.hardware().level(3);

    assert_eq!(servos.init(3, 1000, 2000), Err(Error::AlreadyInitialized));
    assert_eq!(servos.init_default(3), Err(Error::AlreadyInitialized));

    assert_eq!(servos.record(3), Some(&before));
    assert_eq!(servos.len(), 1);
    assert_eq!(servos.hardware().level(3), level_before);
    assert_eq!(servos.hardware().slice(1).configure_count, 1);
}

#[test]
fn invalid_calibration_is_rejected_without_side_effects() {
    let mut servos = pico1();

    for (min_us, max_us) in [(0, 2000), (1000, 0), (0, 0), (2000, 1000), (1500, 1500)] {
        assert_eq!(
            servos.init(8, min_us, max_us),
            Err(Error::InvalidCalibration),
            "{min_us}..{max_us}"
        );
    }

    assert!(servos.is_empty());
    assert!(!servos.hardware().is_pwm_function(8));
    assert_eq!(servos.hardware().slice(4).configure_count, 0);
}

#[test]
fn ninth_servo_exceeds_capacity() {
    let mut servos = pico1();
    for pin in 0..8 {
        servos.init_default(pin).expect("init");
    }
    assert!(servos.is_full());
    assert_eq!(servos.capacity(), MAX_SERVOS);

    assert_eq!(servos.init_default(8), Err(Error::CapacityExceeded));
    // capacity is checked before duplicates
    assert_eq!(servos.init_default(0), Err(Error::CapacityExceeded));
    assert!(servos.record(8).is_none());
    assert!(!servos.hardware().is_pwm_function(8));
}

#[test]
fn custom_capacity() {
    let mut servos: ServoRegistry<SimulatedPwm, 2> = ServoRegistry::new(SimulatedPwm::new());
    servos.init_default(0).expect("init");
    servos.init_default(2).expect("init");

    assert_eq!(servos.capacity(), 2);
    assert_eq!(servos.init_default(4), Err(Error::CapacityExceeded));
}

#[test]
fn operations_on_unknown_pin_fail() {
    let mut servos = pico1();
    servos.init_default(1).expect("init");

    assert_eq!(servos.set(9, 90), Err(Error::NotInitialized));
    assert_eq!(servos.attach(9), Err(Error::NotInitialized));
    assert_eq!(servos.detach(9), Err(Error::NotInitialized));
    assert_eq!(servos.release(9), Err(Error::NotInitialized));
    assert_eq!(servos.pins_sharing_slice(9), Err(Error::NotInitialized));
    assert!(servos.set(1, 90).is_ok());
}

#[test]
fn pin_beyond_gpio_range_is_rejected() {
    let mut servos = pico1();

    assert_eq!(servos.init_default(30), Err(Error::InvalidPin));
    assert_eq!(servos.init(40, 500, 2500), Err(Error::InvalidPin));
    assert!(servos.is_empty());
    assert!(!servos.hardware().is_pwm_function(30));
    assert_eq!(servos.hardware().slice(7).configure_count, 0);

    servos.init_default(29).expect("last GPIO");
    assert_eq!(Error::InvalidPin.to_string(), "no such GPIO pin");
}

#[test]
fn unavailable_clock_fails_init_without_side_effects() {
    let mut servos: ServoRegistry<SimulatedPwm> =
        ServoRegistry::new(SimulatedPwm::with_sys_clk_hz(0));

    assert_eq!(
        servos.init_default(5),
        Err(Error::PwmConfigFailed(PwmParamsError::ClockUnavailable))
    );
    assert!(servos.is_empty());
    assert!(!servos.hardware().is_pwm_function(5));
    assert_eq!(servos.hardware().slice(2).configure_count, 0);

    // the clock comes up later
    servos.hardware_mut().set_sys_clk_hz(125_000_000);
    servos.init_default(5).expect("init");
    assert!(servos.hardware().is_output_enabled(5));
}

#[test]
fn too_slow_clock_reports_resolution() {
    let mut servos: ServoRegistry<SimulatedPwm> =
        ServoRegistry::new(SimulatedPwm::with_sys_clk_hz(60));

    assert_eq!(
        servos.init_default(5),
        Err(Error::PwmConfigFailed(PwmParamsError::ResolutionTooLow))
    );
    assert!(servos.is_empty());
}

#[test]
fn detach_then_set_reattaches() {
    let mut servos = one_tick_per_us();
    servos.init_default(12).expect("init");

    servos.detach(12).expect("detach");
    assert!(!servos.hardware().is_slice_enabled(6));
    assert!(!servos.record(12).expect("record").attached());

    servos.set(12, 90).expect("set");
    assert!(servos.hardware().is_slice_enabled(6));
    assert!(servos.record(12).expect("record").attached());
    assert_eq!(servos.hardware().level(12), 1500);
}

#[test]
fn attach_and_detach_are_idempotent() {
    let mut servos = pico1();
    servos.init_default(14).expect("init");

    servos.attach(14).expect("attach while attached");
    assert!(servos.hardware().is_output_enabled(14));

    servos.detach(14).expect("detach");
    servos.detach(14).expect("detach while detached");
    assert!(!servos.hardware().is_output_enabled(14));
    assert!(!servos.record(14).expect("record").attached());
}

#[test]
fn attach_resumes_last_level_without_driving_angle() {
    let mut servos = one_tick_per_us();
    servos.init_default(0).expect("init");
    servos.set(0, 135).expect("set");

    servos.detach(0).expect("detach");
    servos.attach(0).expect("attach");

    assert!(servos.hardware().is_output_enabled(0));
    assert_eq!(servos.hardware().level(0), 1750);
    assert!(servos.record(0).expect("record").attached());
}

#[test]
fn release_frees_a_slot() {
    let mut servos = one_tick_per_us();
    for pin in [0, 2, 4, 6, 8, 10, 12, 14] {
        servos.init_default(pin).expect("init");
    }
    assert_eq!(servos.init_default(1), Err(Error::CapacityExceeded));

    servos.set(4, 180).expect("set");
    servos.release(4).expect("release");

    assert!(servos.record(4).is_none());
    assert_eq!(servos.len(), 7);
    assert_eq!(servos.hardware().level(4), 0);
    assert!(!servos.hardware().is_slice_enabled(2));
    assert_eq!(servos.set(4, 90), Err(Error::NotInitialized));

    servos.init_default(1).expect("slot is free again");
    assert_eq!(servos.init_default(3), Err(Error::CapacityExceeded));
}

#[test]
fn released_pin_can_be_initialized_again() {
    let mut servos = one_tick_per_us();
    servos.init(9, 500, 2500).expect("init");
    servos.release(9).expect("release");

    servos.init_default(9).expect("init again");

    let record = servos.record(9).expect("record");
    assert_eq!(
        (record.min_pulse_us(), record.max_pulse_us()),
        (1000, 2000)
    );
    assert!(servos.hardware().is_output_enabled(9));
    assert_eq!(servos.hardware().level(9), 1000);
}

#[test]
fn records_iterate_in_slot_order() {
    let mut servos = pico1();
    for pin in [7, 3, 11] {
        servos.init_default(pin).expect("init");
    }
    servos.release(3).expect("release");
    servos.init_default(20).expect("init");

    let pins: Vec<u8> = servos.records().map(|record| record.pin_id()).collect();
    assert_eq!(pins, [7, 20, 11]);
}

#[test]
fn errors_describe_themselves() {
    let err = Error::PwmConfigFailed(PwmParamsError::ClockUnavailable);
    assert_eq!(
        err.to_string(),
        "PWM configuration failed: system clock unavailable"
    );
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(Error::CapacityExceeded.to_string(), "no free servo slot");
    assert_eq!(
        Error::from(PwmParamsError::FrequencyUnachievable),
        Error::PwmConfigFailed(PwmParamsError::FrequencyUnachievable)
    );
}
