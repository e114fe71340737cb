//! # Driver - sensor chip drivers
//!
//! Register-level drivers for the sensors carried by the flight controller
//! boards. Drivers are generic over the `embedded-hal-async` bus traits so the
//! same code runs on the STM32 boards and against the simulated chips in SITL.
//!
//! ## Features
//!
//! - **sim**: simulated chips implementing the bus traits (always built for tests)
//! - **defmt**: `defmt::Format` for the public configuration types

#![no_std]
#![allow(async_fn_in_trait)]

pub mod accel;
pub mod bus;
pub mod error;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use accel::adxl345::{
    Adxl343, Adxl345, Adxl345Config, DataRate, FreefallConfig, MotionConfig, Range, TapConfig,
    TapCount,
};
pub use accel::{Accelerometer, AccelerometerChip};
pub use bus::{I2cInterface, RegisterInterface, SpiInterface};
pub use error::{Error, Result};
