//! [`PwmHardware`] for the RP2040 (Pico 1) and RP2350 (Pico 2) PWM block.
//!
//! Registers are written directly through `embassy_rp::pac`, because the registry addresses
//! slices by number at run time rather than owning a typed `Pwm` driver per slice.

use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pac;
use embassy_rp::pac::pwm::vals::Divmode;

use super::{Channel, PinId, PwmHardware, SliceId};

// IO_BANK0 function select value that routes a GPIO to its PWM slice.
const FUNCSEL_PWM: u8 = 4;

/// Register-level PWM access for the Pico.
///
/// Pins and slices driven through `RpPwm` must not also be handed to an
/// `embassy_rp::pwm::Pwm` driver; both would program the same registers.
///
/// # Example
///
/// ```rust,no_run
/// # #![no_std]
/// # #![no_main]
/// # use panic_probe as _;
/// use pico_servo::{Result, hardware::rp::RpPwm, servo::ServoRegistry};
///
/// fn example() -> Result<()> {
///     let _p = embassy_rp::init(Default::default());
///     let mut servos: ServoRegistry<RpPwm> = ServoRegistry::new(RpPwm::new());
///     servos.init_default(15)?; // GPIO 15 -> PWM slice 7, channel B
///     servos.set(15, 90)?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct RpPwm {
    _private: (),
}

impl RpPwm {
    /// Create the PWM register backend. Call after `embassy_rp::init` so the system clock
    /// is running.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl PwmHardware for RpPwm {
    #[cfg(feature = "pico1")]
    const PIN_COUNT: PinId = 30;
    #[cfg(feature = "pico2")]
    const PIN_COUNT: PinId = 48;

    #[cfg(feature = "pico1")]
    fn pin_to_slice(&self, pin: PinId) -> SliceId {
        (pin / 2) % 8
    }

    // GPIO 32..=47 on the RP2350B wrap around slices 8..=11.
    #[cfg(feature = "pico2")]
    fn pin_to_slice(&self, pin: PinId) -> SliceId {
        match pin.checked_sub(32) {
            None => (pin / 2) % 8,
            Some(high) => 8 | ((high / 2) % 4),
        }
    }

    fn pin_to_channel(&self, pin: PinId) -> Channel {
        Channel::for_pin(pin)
    }

    fn set_pin_function_pwm(&mut self, pin: PinId) {
        let pin = usize::from(pin);
        #[cfg(feature = "pico2")]
        pac::PADS_BANK0.gpio(pin).modify(|w| w.set_iso(false));
        pac::IO_BANK0
            .gpio(pin)
            .ctrl()
            .write(|w| w.set_funcsel(FUNCSEL_PWM));
    }

    fn configure_slice(
        &mut self,
        slice: SliceId,
        wrap_count: u16,
        clk_div_int: u8,
        clk_div_frac: u8,
        start_enabled: bool,
    ) {
        let regs = pac::PWM.ch(usize::from(slice));
        regs.csr().write(|w| {
            w.set_divmode(Divmode::DIV);
            w.set_ph_correct(false);
            w.set_en(false);
        });
        regs.div().write(|w| {
            w.set_int(clk_div_int);
            w.set_frac(clk_div_frac);
        });
        regs.top().write(|w| w.set_top(wrap_count));
        regs.ctr().write(|w| w.set_ctr(0));
        regs.csr().modify(|w| w.set_en(start_enabled));
    }

    fn set_slice_enabled(&mut self, slice: SliceId, enabled: bool) {
        pac::PWM
            .ch(usize::from(slice))
            .csr()
            .modify(|w| w.set_en(enabled));
    }

    fn set_channel_level(&mut self, pin: PinId, level: u16) {
        let regs = pac::PWM.ch(usize::from(self.pin_to_slice(pin)));
        match self.pin_to_channel(pin) {
            Channel::A => regs.cc().modify(|w| w.set_a(level)),
            Channel::B => regs.cc().modify(|w| w.set_b(level)),
        }
    }

    fn read_system_clock_hz(&self) -> u32 {
        clk_sys_freq()
    }
}
