//! Derivation of PWM slice parameters from a target frequency.
//!
//! A slice divides the system clock by an 8.4 fixed-point divider and counts from 0 up to a
//! 16-bit wrap count. [`compute_pwm_params`] picks the smallest divider that keeps the wrap
//! count within 16 bits, so the period has as many ticks (as much duty-cycle resolution) as
//! the hardware allows.
//!
//! The computation is exact integer arithmetic on the divider's sixteenths, so the result does
//! not depend on float rounding.
//!
//! # Example
//!
//! ```rust
//! use pico_servo::pwm_params::compute_pwm_params;
//!
//! // 50 Hz from a 125 MHz system clock (Pico 1 default).
//! let params = compute_pwm_params(50, 125_000_000)?;
//! assert_eq!((params.clk_div_int(), params.clk_div_frac()), (38, 2)); // 38.125
//! assert_eq!(params.wrap_count, u16::MAX);
//! # Ok::<(), pico_servo::pwm_params::PwmParamsError>(())
//! ```

use fixed::types::U12F4;

/// Number of counter values a 16-bit slice can count through in one period.
const COUNTER_SPAN: u64 = 1 << 16;

/// Divider steps per unit (the divider has 4 fractional bits).
const DIVIDER_STEPS: u64 = 1 << 4;

/// Smallest clock divider the hardware supports (1.0).
pub const MIN_DIVIDER: U12F4 = U12F4::from_bits(1 << 4);

/// Largest clock divider the hardware supports (255 + 15/16).
pub const MAX_DIVIDER: U12F4 = U12F4::from_bits((255 << 4) | 15);

/// Reasons PWM parameters cannot be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum PwmParamsError {
    /// The system clock reads 0 Hz (not yet configured).
    #[display("system clock unavailable")]
    ClockUnavailable,
    /// Even the largest divider cannot slow the clock down to the target frequency.
    #[display("target frequency unachievable with this system clock")]
    FrequencyUnachievable,
    /// The period would be a single tick, leaving no duty-cycle resolution.
    #[display("PWM resolution too low (wrap count would be 0)")]
    ResolutionTooLow,
}

/// Wrap count and clock divider for one PWM slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmParams {
    /// Counter value at which the slice wraps; the period is `wrap_count + 1` ticks.
    pub wrap_count: u16,
    divider: U12F4,
}

impl PwmParams {
    /// The quantized clock divider, in `[1.0, 255.9375]`.
    #[must_use]
    pub const fn divider(&self) -> U12F4 {
        self.divider
    }

    /// Integer part of the clock divider.
    #[must_use]
    pub fn clk_div_int(&self) -> u8 {
        self.divider.saturating_to_num()
    }

    /// Fractional part of the clock divider, in sixteenths.
    #[must_use]
    pub fn clk_div_frac(&self) -> u8 {
        u8::try_from(self.divider.frac().to_bits()).unwrap_or(0)
    }

    /// Frequency (in millihertz) the slice actually produces with these parameters.
    #[must_use]
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "u32 and u16 operands widened to u64 cannot overflow; the divider is at least 16"
    )]
    pub fn output_freq_millihz(&self, sys_clk_hz: u32) -> u64 {
        let ticks_per_period = u64::from(self.wrap_count) + 1;
        let divider_bits = u64::from(self.divider.to_bits());
        u64::from(sys_clk_hz) * 1000 * DIVIDER_STEPS / (divider_bits * ticks_per_period)
    }
}

/// Derive the (wrap count, clock divider) pair that best approximates `target_freq_hz`.
///
/// The ideal divider is `sys_clk_hz / (target_freq_hz * 65536)`, clamped up to 1.0 and
/// floored to a sixteenth. The wrap count is then recomputed from the quantized divider as
/// `round(sys_clk_hz / (divider * target_freq_hz)) - 1`, clamped to `u16::MAX`.
///
/// # Errors
///
/// - [`PwmParamsError::ClockUnavailable`] if `sys_clk_hz` is 0.
/// - [`PwmParamsError::FrequencyUnachievable`] if `target_freq_hz` is 0 or the ideal
///   divider exceeds [`MAX_DIVIDER`].
/// - [`PwmParamsError::ResolutionTooLow`] if the wrap count would be 0.
#[allow(
    clippy::arithmetic_side_effects,
    reason = "u32 inputs widened to u64 cannot overflow; divisors are checked nonzero"
)]
pub fn compute_pwm_params(
    target_freq_hz: u32,
    sys_clk_hz: u32,
) -> Result<PwmParams, PwmParamsError> {
    if sys_clk_hz == 0 {
        return Err(PwmParamsError::ClockUnavailable);
    }
    if target_freq_hz == 0 {
        return Err(PwmParamsError::FrequencyUnachievable);
    }

    let clk_sixteenths = u64::from(sys_clk_hz) * DIVIDER_STEPS;
    let freq = u64::from(target_freq_hz);
    let counts_per_second = freq * COUNTER_SPAN;

    // ideal divider > MAX_DIVIDER, compared exactly in sixteenths
    if clk_sixteenths > u64::from(MAX_DIVIDER.to_bits()) * counts_per_second {
        return Err(PwmParamsError::FrequencyUnachievable);
    }
    let ideal_bits = u16::try_from(clk_sixteenths / counts_per_second)
        .map_err(|_| PwmParamsError::FrequencyUnachievable)?;
    let divider = U12F4::from_bits(ideal_bits).max(MIN_DIVIDER);

    let ticks_denominator = u64::from(divider.to_bits()) * freq;
    let ticks = (clk_sixteenths + ticks_denominator / 2) / ticks_denominator;
    if ticks <= 1 {
        return Err(PwmParamsError::ResolutionTooLow);
    }
    let wrap_count = u16::try_from(ticks - 1).unwrap_or(u16::MAX);

    Ok(PwmParams {
        wrap_count,
        divider,
    })
}
