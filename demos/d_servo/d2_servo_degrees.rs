#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, future, panic};
use embassy_executor::Spawner;
use embassy_time::Timer;
use servo_sweep::{
    Result,
    servo::servo_driver,
    servo_config::{MAX_DEGREES, ServoLimits, SliceConfig},
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let mut servo = servo_driver(p.PIN_22, p.PWM_SLICE3, SliceConfig::SERVO, ServoLimits::SERVO)?;

    // Step by 30 degrees. Include 180 degrees.
    for degrees in (0..=MAX_DEGREES).step_by(30) {
        servo.set_degrees(degrees)?;
        Timer::after_millis(400).await;
    }

    info!("Relaxing servo");
    servo.relax();
    future::pending().await
}
