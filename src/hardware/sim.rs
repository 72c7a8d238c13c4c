//! An in-memory model of the Pico PWM block for host tests.
//!
//! [`SimulatedPwm`] keeps the state the real registers would hold (per-slice wrap count,
//! divider and enable bit, per-channel compare level, per-pin function) and lets tests read
//! it back. Pins map to slices the way the RP2040 does: `slice = (pin / 2) % 8`, channel A
//! for even pins and B for odd pins.

use super::{Channel, PinId, PwmHardware, SliceId};

/// Number of PWM slices modelled (RP2040, GPIO 0..=29).
pub const SLICE_COUNT: usize = 8;

/// Default simulated system clock (the RP2040 default, 125 MHz).
pub const DEFAULT_SYS_CLK_HZ: u32 = 125_000_000;

/// Register state of one simulated slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceState {
    /// Wrap count (TOP register).
    pub wrap_count: u16,
    /// Integer part of the clock divider.
    pub clk_div_int: u8,
    /// Fractional part of the clock divider, in sixteenths.
    pub clk_div_frac: u8,
    /// Whether the slice is running.
    pub enabled: bool,
    /// Compare levels of channels A and B.
    pub levels: [u16; 2],
    /// How many times the slice has been configured.
    pub configure_count: u32,
}

/// Simulated PWM block.
///
/// # Example
///
/// ```rust
/// use pico_servo::hardware::{PwmHardware, sim::SimulatedPwm};
///
/// let mut pwm = SimulatedPwm::new();
/// pwm.set_pin_function_pwm(3);
/// pwm.configure_slice(1, 19_999, 1, 0, true);
/// pwm.set_channel_level(3, 1500);
///
/// assert!(pwm.is_output_enabled(3));
/// assert_eq!(pwm.level(3), 1500);
/// assert_eq!(pwm.level(2), 0); // other channel of slice 1
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedPwm {
    sys_clk_hz: u32,
    slices: [SliceState; SLICE_COUNT],
    pwm_pins: [bool; 256],
}

impl Default for SimulatedPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPwm {
    /// A PWM block with every slice stopped and a 125 MHz system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_sys_clk_hz(DEFAULT_SYS_CLK_HZ)
    }

    /// A PWM block with the given system clock (0 models an unconfigured clock).
    #[must_use]
    pub const fn with_sys_clk_hz(sys_clk_hz: u32) -> Self {
        Self {
            sys_clk_hz,
            slices: [SliceState {
                wrap_count: 0,
                clk_div_int: 0,
                clk_div_frac: 0,
                enabled: false,
                levels: [0; 2],
                configure_count: 0,
            }; SLICE_COUNT],
            pwm_pins: [false; 256],
        }
    }

    /// Change the simulated system clock.
    pub const fn set_sys_clk_hz(&mut self, sys_clk_hz: u32) {
        self.sys_clk_hz = sys_clk_hz;
    }

    /// Register state of `slice`.
    #[must_use]
    pub fn slice(&self, slice: SliceId) -> SliceState {
        self.slices
            .get(usize::from(slice))
            .copied()
            .unwrap_or_default()
    }

    /// Whether `slice` is running.
    #[must_use]
    pub fn is_slice_enabled(&self, slice: SliceId) -> bool {
        self.slice(slice).enabled
    }

    /// Whether `pin` is routed to PWM and its slice is running.
    #[must_use]
    pub fn is_output_enabled(&self, pin: PinId) -> bool {
        self.is_pwm_function(pin) && self.is_slice_enabled(self.pin_to_slice(pin))
    }

    /// Whether `pin` has been routed to its PWM slice.
    #[must_use]
    pub fn is_pwm_function(&self, pin: PinId) -> bool {
        self.pwm_pins
            .get(usize::from(pin))
            .copied()
            .unwrap_or(false)
    }

    /// Compare level of the channel that drives `pin`.
    #[must_use]
    pub fn level(&self, pin: PinId) -> u16 {
        let levels = self.slice(self.pin_to_slice(pin)).levels;
        match self.pin_to_channel(pin) {
            Channel::A => levels[0],
            Channel::B => levels[1],
        }
    }

    fn slice_mut(&mut self, slice: SliceId) -> Option<&mut SliceState> {
        self.slices.get_mut(usize::from(slice))
    }
}

impl PwmHardware for SimulatedPwm {
    const PIN_COUNT: PinId = 30;

    fn pin_to_slice(&self, pin: PinId) -> SliceId {
        (pin / 2) % 8
    }

    fn pin_to_channel(&self, pin: PinId) -> Channel {
        Channel::for_pin(pin)
    }

    fn set_pin_function_pwm(&mut self, pin: PinId) {
        if let Some(function) = self.pwm_pins.get_mut(usize::from(pin)) {
            *function = true;
        }
    }

    fn configure_slice(
        &mut self,
        slice: SliceId,
        wrap_count: u16,
        clk_div_int: u8,
        clk_div_frac: u8,
        start_enabled: bool,
    ) {
        if let Some(state) = self.slice_mut(slice) {
            state.wrap_count = wrap_count;
            state.clk_div_int = clk_div_int;
            state.clk_div_frac = clk_div_frac;
            state.enabled = start_enabled;
            state.configure_count = state.configure_count.saturating_add(1);
        }
    }

    fn set_slice_enabled(&mut self, slice: SliceId, enabled: bool) {
        if let Some(state) = self.slice_mut(slice) {
            state.enabled = enabled;
        }
    }

    fn set_channel_level(&mut self, pin: PinId, level: u16) {
        let channel = self.pin_to_channel(pin);
        let slice = self.pin_to_slice(pin);
        if let Some(state) = self.slice_mut(slice) {
            match channel {
                Channel::A => state.levels[0] = level,
                Channel::B => state.levels[1] = level,
            }
        }
    }

    fn read_system_clock_hz(&self) -> u32 {
        self.sys_clk_hz
    }
}
