//! Error and result types shared by the whole crate.

use crate::pwm_params::PwmParamsError;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by [`ServoRegistry`](crate::servo::ServoRegistry) operations.
///
/// Every error is reported before the registry or the hardware is touched, so a
/// failed call leaves all prior state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Error {
    /// Every slot in the registry already holds a servo.
    #[display("no free servo slot")]
    CapacityExceeded,
    /// The pin number is beyond the chip's GPIO range.
    #[display("no such GPIO pin")]
    InvalidPin,
    /// The pin already has a live servo record.
    #[display("servo already initialized on this pin")]
    AlreadyInitialized,
    /// Pulse bounds are zero or not strictly increasing.
    #[display("invalid pulse calibration (need 0 < min_us < max_us)")]
    InvalidCalibration,
    /// The pin has no live servo record.
    #[display("no servo initialized on this pin")]
    NotInitialized,
    /// PWM parameters for the servo frequency could not be derived.
    #[display("PWM configuration failed: {_0}")]
    #[from]
    PwmConfigFailed(#[error(source)] PwmParamsError),
}
