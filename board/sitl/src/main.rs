use anyhow::Context;
use driver::{
    Accelerometer, Adxl345, Adxl345Config, FreefallConfig, MotionConfig, TapConfig, TapCount,
};
use hal::AccelSensor;

use board::SitlBoard;
use config::SitlConfig;
use scenario::Scenario;

mod board;
mod config;
mod scenario;

enum State {
    Initializing,
    Running,
    Stopping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SitlConfig::from_env()?;
    let mut board = SitlBoard::new(config.address);
    let i2c = board.take_i2c().context("I2C bus already taken")?;

    let chip = Adxl345::new_i2c_with_address(i2c, config.address).with_config(Adxl345Config {
        tap: Some(TapConfig {
            count: config.tap_count,
            ..Default::default()
        }),
        motion: Some(MotionConfig::default()),
        freefall: Some(FreefallConfig::default()),
        ..Default::default()
    });
    let mut accelerometer = Accelerometer::new(chip);
    let mut scenario = Scenario::new(config.tap_every, config.tap_count == TapCount::Double);

    let mut state = State::Initializing;
    let mut update_cycle_count = 0;
    loop {
        match state {
            State::Initializing => {
                log::info!("Initializing {}...", board.name());
                accelerometer
                    .init()
                    .await
                    .context("Failed to initialize accelerometer")?;
                let rate = accelerometer.set_update_rate(config.rate_hz).await?;
                log::info!("Accelerometer running at {} Hz", rate);
                state = State::Running;
            }
            State::Running => {
                if update_cycle_count >= config.cycles {
                    state = State::Stopping;
                    continue;
                }
                update_cycle_count += 1;

                let step = scenario.step();
                log::debug!("Cycle {}: {:?}", update_cycle_count, step.stimulus);
                step.apply(accelerometer.chip_mut().interface_mut().bus_mut());

                let acceleration = accelerometer.get_acceleration().await?;
                println!(
                    "{} {} {}",
                    acceleration.x, acceleration.y, acceleration.z
                );

                let events = accelerometer.get_events().await?;
                println!("Tapped: {}", events.tap.unwrap_or(false));
                if events.motion == Some(true) {
                    println!("Motion detected");
                }
                if events.freefall == Some(true) {
                    println!("Dropped!");
                }

                tokio::time::sleep(config.period).await;
            }
            State::Stopping => {
                let status = accelerometer.get_status();
                log::info!(
                    "Stopping after {} samples (healthy: {})",
                    status.samples,
                    status.healthy
                );
                break;
            }
        }
    }
    Ok(())
}
