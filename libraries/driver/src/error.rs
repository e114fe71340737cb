use thiserror::Error;

/// Errors returned by the sensor drivers
///
/// `E` is the error type of the underlying bus.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error<E: core::fmt::Debug> {
    /// The bus transaction failed
    #[error("Bus error: {0:?}")]
    Bus(E),

    /// The device answered with an unexpected identification register
    #[error("Unknown device id: {0:#04x}")]
    UnknownDevice(u8),

    /// The sensor did not produce data in time
    #[error("Timed out waiting for sensor data")]
    Timeout,

    /// The sensor was used before `init` succeeded
    #[error("Sensor not initialized")]
    NotInitialized,
}

/// Type alias for Result with the driver error
pub type Result<T, E> = core::result::Result<T, Error<E>>;
