#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, future, panic};
use embassy_executor::Spawner;
use servo_sweep::{
    Result,
    servo::servo_driver,
    servo_config::{STARTUP_POSITIONS, SERVO_GPIO, ServoLimits, SliceConfig, Sweep},
    servo_driver::StopSignal,
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

// Nothing raises this: the sweep is the device's steady state until reset.
static STOP: StopSignal = StopSignal::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    info!("Starting servo sweep (GPIO {})", SERVO_GPIO);
    // GPIO 22 -> (22 / 2) % 8 = slice 3, channel A
    let mut servo = servo_driver(p.PIN_22, p.PWM_SLICE3, SliceConfig::SERVO, ServoLimits::SERVO)?;

    // 180°, 90°, 0° for 5 s each, then 0° <-> 180° forever.
    servo.run(&STARTUP_POSITIONS, &Sweep::SERVO, &STOP).await?;

    info!("Servo sweep stopped");
    future::pending().await
}
