//! A fixed-capacity registry of hobby positional servos (SG90 and similar).
//!
//! This module maps servo angles (0-180°) onto PWM channels. See [`ServoRegistry`] for usage
//! examples.
//!
//! # PWM slices are shared
//!
//! Each slice drives two pins (`slice = (pin / 2) % 8` on the Pico 1). Both pins share the
//! slice's frequency and its enable bit, but each has its own level:
//!
//! - [`detach`](ServoRegistry::detach) stops the whole slice, so the other servo on that
//!   slice goes limp too, while its record still says it is attached.
//! - [`attach`](ServoRegistry::attach) restarts the whole slice.
//! - [`set`](ServoRegistry::set) only ever changes this pin's level.
//!
//! Use [`pins_sharing_slice`](ServoRegistry::pins_sharing_slice) to see which servos a call
//! will affect.

use heapless::Vec;

#[cfg(not(feature = "host"))]
use defmt::{info, warn};

use crate::hardware::{Channel, PinId, PwmHardware, SliceId};
use crate::pwm_params::compute_pwm_params;
use crate::{Error, Result};

/// Maximum number of servos a default [`ServoRegistry`] manages.
pub const MAX_SERVOS: usize = 8;

/// PWM frequency shared by every managed servo (Hz).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;

/// Length of one PWM period (microseconds).
pub const SERVO_PERIOD_US: u32 = 1_000_000 / SERVO_PWM_FREQ_HZ; // 20 ms

/// Default pulse width for 0° (microseconds).
pub const DEFAULT_SERVO_MIN_PULSE_US: u16 = 1_000;

/// Default pulse width for 180° (microseconds).
pub const DEFAULT_SERVO_MAX_PULSE_US: u16 = 2_000;

/// Largest servo angle (degrees). Larger angles are clamped to it.
pub const MAX_DEGREES: u16 = 180;

/// State of one managed servo.
///
/// Records are created by [`ServoRegistry::init`] and only their attached flag changes
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct ServoRecord {
    pin_id: PinId,
    slice_id: SliceId,
    channel: Channel,
    wrap_count: u16,
    min_pulse_us: u16,
    max_pulse_us: u16,
    attached: bool,
}

impl ServoRecord {
    /// GPIO pin driving the servo.
    #[must_use]
    pub const fn pin_id(&self) -> PinId {
        self.pin_id
    }

    /// PWM slice the pin belongs to.
    #[must_use]
    pub const fn slice_id(&self) -> SliceId {
        self.slice_id
    }

    /// Slice channel the pin belongs to.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Wrap count the slice was configured with (ticks per period - 1).
    #[must_use]
    pub const fn wrap_count(&self) -> u16 {
        self.wrap_count
    }

    /// Pulse width for 0° (microseconds).
    #[must_use]
    pub const fn min_pulse_us(&self) -> u16 {
        self.min_pulse_us
    }

    /// Pulse width for 180° (microseconds).
    #[must_use]
    pub const fn max_pulse_us(&self) -> u16 {
        self.max_pulse_us
    }

    /// Whether the slice was last enabled through this servo.
    ///
    /// Detaching another servo on the same slice stops this one's output without clearing
    /// this flag.
    #[must_use]
    pub const fn attached(&self) -> bool {
        self.attached
    }

    /// Compare level for `degrees` (clamped to 0..=180).
    ///
    /// The pulse width is interpolated linearly between the calibration bounds, then scaled
    /// from the 20 ms period into `wrap_count + 1` ticks, truncating. The result never
    /// exceeds `wrap_count`.
    #[must_use]
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "u16 operands widened to u64 cannot overflow; divisor is a nonzero constant"
    )]
    pub fn level_for_angle(&self, degrees: u16) -> u16 {
        let degrees = u64::from(degrees.min(MAX_DEGREES));
        let span_us = u64::from(self.max_pulse_us.saturating_sub(self.min_pulse_us));
        // pulse_us * 180, kept exact
        let pulse_x180 = u64::from(self.min_pulse_us) * u64::from(MAX_DEGREES) + degrees * span_us;
        let ticks_per_period = u64::from(self.wrap_count) + 1;
        let level =
            pulse_x180 * ticks_per_period / (u64::from(MAX_DEGREES) * u64::from(SERVO_PERIOD_US));
        u16::try_from(level)
            .unwrap_or(u16::MAX)
            .min(self.wrap_count)
    }
}

/// A fixed-capacity table of servos driven through a [`PwmHardware`] capability.
///
/// The registry owns the hardware value and up to `N` servo records (default
/// [`MAX_SERVOS`]), each keyed by its GPIO pin. Every operation is synchronous and bounded:
/// a scan of at most `N` slots and a few register writes. All servos run at
/// [`SERVO_PWM_FREQ_HZ`].
///
/// Operations return [`Result`]; `.is_ok()` gives the plain success/failure view. A failed
/// operation changes neither the table nor the hardware.
///
/// # Example
///
/// ```rust
/// use pico_servo::{Error, hardware::sim::SimulatedPwm, servo::ServoRegistry};
///
/// let mut servos: ServoRegistry<SimulatedPwm> = ServoRegistry::new(SimulatedPwm::new());
///
/// servos.init_default(15)?;       // 1000-2000 µs, starts at 0°
/// servos.init(4, 500, 2500)?;     // custom calibration
/// servos.set(15, 90)?;            // move to 90°
/// servos.set(4, 200)?;            // clamped to 180°
/// servos.detach(15)?;             // let the servo relax
/// servos.set(15, 45)?;            // re-attaches, then moves
///
/// assert_eq!(servos.set(7, 10), Err(Error::NotInitialized));
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug)]
pub struct ServoRegistry<H: PwmHardware, const N: usize = MAX_SERVOS> {
    hardware: H,
    slots: [Option<ServoRecord>; N],
}

impl<H: PwmHardware, const N: usize> ServoRegistry<H, N> {
    /// An empty registry driving `hardware`.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub const fn new(hardware: H) -> Self {
        Self {
            hardware,
            slots: [None; N],
        }
    }

    /// Start managing a servo on `pin` with the given pulse calibration.
    ///
    /// Routes the pin to PWM, configures and starts its slice at [`SERVO_PWM_FREQ_HZ`], and
    /// moves the servo to 0°. If the slice already drives another servo, it is reconfigured
    /// with the same parameters and keeps running.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// - [`Error::CapacityExceeded`] if all `N` slots are taken.
    /// - [`Error::InvalidPin`] if the chip has no GPIO `pin`.
    /// - [`Error::AlreadyInitialized`] if `pin` already has a servo.
    /// - [`Error::InvalidCalibration`] unless `0 < min_pulse_us < max_pulse_us`.
    /// - [`Error::PwmConfigFailed`] if the system clock cannot produce the servo frequency.
    pub fn init(&mut self, pin: PinId, min_pulse_us: u16, max_pulse_us: u16) -> Result<()> {
        let free_index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::CapacityExceeded)?;
        if pin >= H::PIN_COUNT {
            return Err(Error::InvalidPin);
        }
        if self.record(pin).is_some() {
            return Err(Error::AlreadyInitialized);
        }
        if min_pulse_us == 0 || max_pulse_us == 0 || min_pulse_us >= max_pulse_us {
            return Err(Error::InvalidCalibration);
        }

        let slice_id = self.hardware.pin_to_slice(pin);
        let channel = self.hardware.pin_to_channel(pin);
        let sys_clk_hz = self.hardware.read_system_clock_hz();
        let params = compute_pwm_params(SERVO_PWM_FREQ_HZ, sys_clk_hz)?;

        self.hardware.set_pin_function_pwm(pin);
        self.hardware.configure_slice(
            slice_id,
            params.wrap_count,
            params.clk_div_int(),
            params.clk_div_frac(),
            true,
        );

        let record = ServoRecord {
            pin_id: pin,
            slice_id,
            channel,
            wrap_count: params.wrap_count,
            min_pulse_us,
            max_pulse_us,
            attached: true,
        };
        let level = record.level_for_angle(0);
        if let Some(slot) = self.slots.get_mut(free_index) {
            *slot = Some(record);
        }
        self.hardware.set_channel_level(pin, level);

        #[cfg(not(feature = "host"))]
        info!(
            "servo pin={} slice={} clk={}Hz div={}.{} top={} pulse={}..{}us",
            pin,
            slice_id,
            sys_clk_hz,
            params.clk_div_int(),
            params.clk_div_frac(),
            params.wrap_count,
            min_pulse_us,
            max_pulse_us
        );
        Ok(())
    }

    /// Start managing a servo on `pin` with the default 1000-2000 µs calibration.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Same as [`init`](Self::init).
    pub fn init_default(&mut self, pin: PinId) -> Result<()> {
        self.init(pin, DEFAULT_SERVO_MIN_PULSE_US, DEFAULT_SERVO_MAX_PULSE_US)
    }

    /// Move the servo on `pin` to `degrees`, clamped to 0..=180.
    ///
    /// A detached servo is re-attached (its slice restarted) first.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if `pin` has no servo.
    pub fn set(&mut self, pin: PinId, degrees: u16) -> Result<()> {
        let record = find_mut(&mut self.slots, pin)?;
        if !record.attached {
            self.hardware.set_slice_enabled(record.slice_id, true);
            record.attached = true;
            #[cfg(not(feature = "host"))]
            info!("servo pin={} re-attached (slice {} enabled)", pin, record.slice_id);
        }
        let level = record.level_for_angle(degrees);
        self.hardware.set_channel_level(pin, level);
        Ok(())
    }

    /// Stop the PWM signal so the servo on `pin` relaxes.
    ///
    /// This stops the whole slice: a servo sharing the slice loses its signal too, although
    /// its record is left as it was. Detaching a detached servo does nothing.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if `pin` has no servo.
    pub fn detach(&mut self, pin: PinId) -> Result<()> {
        let record = find_mut(&mut self.slots, pin)?;
        if !record.attached {
            return Ok(());
        }
        self.hardware.set_slice_enabled(record.slice_id, false);
        record.attached = false;

        #[cfg(not(feature = "host"))]
        {
            let slice_id = record.slice_id;
            if let Some(other) = self
                .records()
                .find(|other| other.slice_id == slice_id && other.pin_id != pin)
            {
                warn!(
                    "servo pin={} detached slice {}, also stopping pin={}",
                    pin, slice_id, other.pin_id
                );
            } else {
                info!("servo pin={} detached (slice {} disabled)", pin, slice_id);
            }
        }
        Ok(())
    }

    /// Restart the PWM signal for the servo on `pin`.
    ///
    /// The servo resumes at the level last programmed; no angle is re-sent. This restarts the
    /// whole slice, so a servo sharing it resumes too. Attaching an attached servo does
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if `pin` has no servo.
    pub fn attach(&mut self, pin: PinId) -> Result<()> {
        let record = find_mut(&mut self.slots, pin)?;
        if record.attached {
            return Ok(());
        }
        self.hardware.set_slice_enabled(record.slice_id, true);
        record.attached = true;
        #[cfg(not(feature = "host"))]
        info!("servo pin={} attached (slice {} enabled)", pin, record.slice_id);
        Ok(())
    }

    /// Stop managing the servo on `pin` and free its slot.
    ///
    /// The pin's level drops to 0 (no pulses) unless another managed servo is driven by the
    /// same compare channel. The slice is stopped only when no other managed servo shares
    /// it. The pin can be initialized again afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if `pin` has no servo.
    pub fn release(&mut self, pin: PinId) -> Result<()> {
        let record = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_some_and(|record| record.pin_id == pin))
            .and_then(Option::take)
            .ok_or(Error::NotInitialized)?;

        // Pins on the same slice and channel share one compare register.
        let channel_shared = self.records().any(|other| {
            other.slice_id == record.slice_id && other.channel == record.channel
        });
        if !channel_shared {
            self.hardware.set_channel_level(pin, 0);
        }
        let slice_shared = self
            .records()
            .any(|other| other.slice_id == record.slice_id);
        if !slice_shared {
            self.hardware.set_slice_enabled(record.slice_id, false);
        }

        #[cfg(not(feature = "host"))]
        info!(
            "servo pin={} released (slice {} {})",
            pin,
            record.slice_id,
            if slice_shared { "still shared" } else { "disabled" }
        );
        Ok(())
    }

    /// The record of the servo on `pin`, if any.
    #[must_use]
    pub fn record(&self, pin: PinId) -> Option<&ServoRecord> {
        self.records().find(|record| record.pin_id == pin)
    }

    /// Live records, in slot order.
    pub fn records(&self) -> impl Iterator<Item = &ServoRecord> + '_ {
        self.slots.iter().flatten()
    }

    /// Other managed pins on the same slice as `pin`.
    ///
    /// These are the servos that [`detach`](Self::detach) and [`attach`](Self::attach) on
    /// `pin` also affect.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] if `pin` has no servo.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pico_servo::{hardware::sim::SimulatedPwm, servo::ServoRegistry};
    ///
    /// let mut servos: ServoRegistry<SimulatedPwm> = ServoRegistry::new(SimulatedPwm::new());
    /// servos.init_default(10)?; // slice 5, channel A
    /// servos.init_default(11)?; // slice 5, channel B
    /// servos.init_default(12)?; // slice 6
    ///
    /// assert_eq!(servos.pins_sharing_slice(10)?.as_slice(), &[11]);
    /// assert!(servos.pins_sharing_slice(12)?.is_empty());
    /// # Ok::<(), pico_servo::Error>(())
    /// ```
    pub fn pins_sharing_slice(&self, pin: PinId) -> Result<Vec<PinId, N>> {
        let slice_id = self.record(pin).ok_or(Error::NotInitialized)?.slice_id;
        Ok(self
            .records()
            .filter(|other| other.slice_id == slice_id && other.pin_id != pin)
            .map(ServoRecord::pin_id)
            .collect())
    }

    /// Number of managed servos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().count()
    }

    /// Whether no servo is managed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Maximum number of managed servos.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The hardware capability.
    #[must_use]
    pub const fn hardware(&self) -> &H {
        &self.hardware
    }

    /// The hardware capability, mutably. Writes made through it bypass the registry's
    /// bookkeeping.
    pub const fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }
}

fn find_mut<const N: usize>(
    slots: &mut [Option<ServoRecord>; N],
    pin: PinId,
) -> Result<&mut ServoRecord> {
    slots
        .iter_mut()
        .flatten()
        .find(|record| record.pin_id == pin)
        .ok_or(Error::NotInitialized)
}
