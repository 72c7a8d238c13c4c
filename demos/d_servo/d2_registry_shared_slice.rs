#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

//! Two servos on one PWM slice (GPIO 10 and 11 both use slice 5).
//!
//! A task keeps sweeping GPIO 11 while main detaches GPIO 10 every few seconds. Detaching
//! stops the whole slice, so GPIO 11 goes limp as well until GPIO 10 is attached again.

use core::{cell::RefCell, convert::Infallible, panic};
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Timer;
use pico_servo::{Result, hardware::rp::RpPwm, servo::ServoRegistry};
use static_cell::StaticCell;
use {
    defmt::{info, warn},
    defmt_rtt as _, panic_probe as _,
};

const STEADY_PIN: u8 = 10;
const SWEEP_PIN: u8 = 11;

type Servos = Mutex<CriticalSectionRawMutex, RefCell<ServoRegistry<RpPwm>>>;

static SERVOS: StaticCell<Servos> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(spawner: Spawner) -> Result<Infallible> {
    let _p = embassy_rp::init(Default::default());
    let servos: &'static Servos = SERVOS.init(Mutex::new(RefCell::new(ServoRegistry::new(
        RpPwm::new(),
    ))));

    servos.lock(|cell| -> Result<()> {
        let mut servos = cell.borrow_mut();
        servos.init_default(STEADY_PIN)?;
        servos.init_default(SWEEP_PIN)?;
        servos.set(STEADY_PIN, 90)
    })?;
    defmt::unwrap!(spawner.spawn(sweep_task(servos)));

    loop {
        Timer::after_secs(5).await;
        servos.lock(|cell| -> Result<()> {
            let mut servos = cell.borrow_mut();
            let sharing = servos.pins_sharing_slice(STEADY_PIN)?;
            info!(
                "Detaching GPIO {}; also stops GPIO {}",
                STEADY_PIN,
                sharing.as_slice()
            );
            servos.detach(STEADY_PIN)
        })?;

        Timer::after_secs(2).await;
        info!("Attaching GPIO {}", STEADY_PIN);
        servos.lock(|cell| cell.borrow_mut().attach(STEADY_PIN))?;
    }
}

// SWEEP_PIN's record stays attached while STEADY_PIN is detached, so set() here only moves
// the level and does not restart the slice.
#[embassy_executor::task]
async fn sweep_task(servos: &'static Servos) -> ! {
    let up = (0..=180).step_by(15);
    let down = (0..180).step_by(15).rev();
    loop {
        for degrees in up.clone().chain(down.clone()) {
            if let Err(err) = servos.lock(|cell| cell.borrow_mut().set(SWEEP_PIN, degrees)) {
                warn!("GPIO {} set failed: {}", SWEEP_PIN, err);
            }
            Timer::after_millis(80).await;
        }
    }
}
