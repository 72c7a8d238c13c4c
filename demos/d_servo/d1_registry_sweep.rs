#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use embassy_executor::Spawner;
use embassy_time::Timer;
use pico_servo::{
    Result,
    hardware::rp::RpPwm,
    servo::{MAX_DEGREES, ServoRegistry},
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let _p = embassy_rp::init(Default::default());
    let mut servos: ServoRegistry<RpPwm> = ServoRegistry::new(RpPwm::new());

    servos.init_default(0)?; // 0 → (0/2) % 8 = slice 0, channel A
    servos.init(2, 500, 2500)?; // 2 → (2/2) % 8 = slice 1, channel A; SG90 range

    loop {
        info!("Sweeping in opposite directions");
        for degrees in (0..=MAX_DEGREES).step_by(10) {
            servos.set(0, degrees)?;
            servos.set(2, MAX_DEGREES.saturating_sub(degrees))?;
            Timer::after_millis(100).await;
        }

        info!("Relaxing");
        servos.detach(0)?;
        servos.detach(2)?;
        Timer::after_secs(2).await;
        // the next set() re-attaches
    }
}
