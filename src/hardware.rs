//! The PWM capability the servo registry drives.
//!
//! [`PwmHardware`] is the narrow set of register-level operations the
//! [`ServoRegistry`](crate::servo::ServoRegistry) needs. Two implementations ship with the
//! crate:
//!
//! - [`rp::RpPwm`] writes the RP2040/RP2350 PWM and IO registers (features `pico1`/`pico2`).
//! - [`sim::SimulatedPwm`] models the PWM block in memory for host tests (feature `host`).

#[cfg(all(any(feature = "pico1", feature = "pico2"), not(feature = "host")))]
pub mod rp;
#[cfg(feature = "host")]
pub mod sim;

/// GPIO pin number.
pub type PinId = u8;

/// PWM slice number.
pub type SliceId = u8;

/// One of the two outputs of a PWM slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Channel {
    /// Output A (even GPIO pins).
    A,
    /// Output B (odd GPIO pins).
    B,
}

impl Channel {
    /// The channel that drives `pin` (A for even pins, B for odd pins).
    #[must_use]
    pub const fn for_pin(pin: PinId) -> Self {
        if pin % 2 == 0 { Self::A } else { Self::B }
    }
}

/// Register-level PWM operations.
///
/// Implementations perform the writes immediately and never block. Slices are shared: every
/// call on a slice affects both of its channels (and so both pins routed to it).
pub trait PwmHardware {
    /// Number of GPIO pins; valid pins are `0..PIN_COUNT`. Other methods may panic on
    /// pins outside that range.
    const PIN_COUNT: PinId;

    /// The slice that drives `pin`.
    fn pin_to_slice(&self, pin: PinId) -> SliceId;

    /// The slice channel that drives `pin`.
    fn pin_to_channel(&self, pin: PinId) -> Channel;

    /// Route `pin` to its PWM slice output.
    fn set_pin_function_pwm(&mut self, pin: PinId);

    /// Program a slice's wrap count and clock divider, resetting its counter, and
    /// optionally start it.
    fn configure_slice(
        &mut self,
        slice: SliceId,
        wrap_count: u16,
        clk_div_int: u8,
        clk_div_frac: u8,
        start_enabled: bool,
    );

    /// Start or stop a slice. Both of its channels follow.
    fn set_slice_enabled(&mut self, slice: SliceId, enabled: bool);

    /// Set the compare level (duty cycle in ticks) of the channel that drives `pin`.
    fn set_channel_level(&mut self, pin: PinId, level: u16);

    /// Current system clock frequency, or 0 if the clock is not yet configured.
    fn read_system_clock_hz(&self) -> u32;
}
