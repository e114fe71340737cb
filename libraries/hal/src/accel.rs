/// Accelerometer sensor interface
use crate::types::Vector3d;

/// Motion events reported by an accelerometer since the last poll.
///
/// `None` means the event kind is not enabled on the sensor, `Some(fired)`
/// tells whether it triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionEvents {
    /// Single or double tap, depending on how tap detection was enabled
    pub tap: Option<bool>,
    /// Activity above the motion threshold
    pub motion: Option<bool>,
    /// Free-fall
    pub freefall: Option<bool>,
}

impl MotionEvents {
    /// True if any enabled event fired
    pub fn any(&self) -> bool {
        [self.tap, self.motion, self.freefall]
            .iter()
            .any(|event| *event == Some(true))
    }
}

/// Accelerometer status information
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccelStatus {
    /// Whether the last bus transaction succeeded
    pub healthy: bool,

    /// Whether the sensor has been initialized
    pub initialized: bool,

    /// Whether the sensor is currently in calibration mode
    pub calibrating: bool,

    /// The current output data rate in Hz
    pub sample_rate_hz: f32,

    /// Number of successful acceleration reads since init
    pub samples: u32,
}

/// Accelerometer interface
pub trait AccelSensor {
    type Error;

    /// Initialize the accelerometer
    async fn init(&mut self) -> Result<(), Self::Error>;

    /// Get acceleration data (in m/s²)
    async fn get_acceleration(&mut self) -> Result<Vector3d, Self::Error>;

    /// Poll the motion events, clearing them on the sensor
    async fn get_events(&mut self) -> Result<MotionEvents, Self::Error>;

    /// Get detailed information about the sensor status
    fn get_status(&self) -> AccelStatus;

    /// Calibrate the accelerometer
    ///
    /// The device should lie flat and remain stationary during this process
    async fn calibrate(&mut self) -> Result<(), Self::Error>;

    /// Perform a self-test of the sensor
    async fn self_test(&mut self) -> Result<bool, Self::Error>;

    /// Set the output data rate, returning the rate actually applied
    async fn set_update_rate(&mut self, rate_hz: f32) -> Result<f32, Self::Error>;

    /// Reset the sensor to its default state
    async fn reset(&mut self) -> Result<(), Self::Error>;
}
