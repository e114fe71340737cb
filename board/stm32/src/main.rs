#![no_std]
#![no_main]

#[cfg(feature = "micoair743v2")]
mod micoair743v2;
#[cfg(feature = "micoair743v2")]
pub use micoair743v2::*;

#[cfg(feature = "matekf405te")]
mod matekf405te;
#[cfg(feature = "matekf405te")]
pub use matekf405te::*;

#[cfg(not(any(feature = "micoair743v2", feature = "matekf405te")))]
compile_error!("No board feature selected");

use defmt::{info, warn, Debug2Format};
use driver::{Adxl345, TapConfig};
use embassy_executor::Spawner;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

/// Print period of the accelerometer loop
const SAMPLE_PERIOD_MS: u64 = 500;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());
    let board = FlightControllerBoard::new();
    info!("Board: {}", board.name());

    let i2c = board.accelerometer_i2c(p);
    let mut accelerometer = Adxl345::new_i2c(i2c);

    if let Err(err) = accelerometer.init().await {
        defmt::panic!("Failed to initialize ADXL345: {}", Debug2Format(&err));
    }
    // The tap parameters can also be tuned, e.g. double taps with a lower threshold
    if let Err(err) = accelerometer
        .enable_tap_detection(TapConfig::default())
        .await
    {
        defmt::panic!("Failed to enable tap detection: {}", Debug2Format(&err));
    }

    loop {
        match accelerometer.acceleration().await {
            Ok(acceleration) => info!(
                "{} {} {}",
                acceleration.x, acceleration.y, acceleration.z
            ),
            Err(err) => warn!("Acceleration read failed: {}", Debug2Format(&err)),
        }

        match accelerometer.events().await {
            Ok(events) => info!("Tapped: {}", events.tap.unwrap_or(false)),
            Err(err) => warn!("Event read failed: {}", Debug2Format(&err)),
        }

        Timer::after_millis(SAMPLE_PERIOD_MS).await;
    }
}
