// Accelerometer driver module providing a unified interface to the supported chips
//
// Chips implement `AccelerometerChip`. `Accelerometer` wraps a chip, keeps a
// snapshot of the latest measurement and exposes it as a `hal::AccelSensor`.

use hal::{AccelSensor, AccelStatus, MotionEvents, Vector3d};

use crate::error::Error;

pub mod adxl345;

/// Accelerometer measurement snapshot
#[derive(Debug, Clone, Copy)]
pub struct AccelMeasurement {
    /// Acceleration in m/s²
    pub acceleration: Vector3d,
    /// Measurement is valid
    pub valid: bool,
}

impl Default for AccelMeasurement {
    fn default() -> Self {
        Self {
            acceleration: Vector3d::zeros(),
            valid: false,
        }
    }
}

/// Interface for accelerometer chip implementations
pub trait AccelerometerChip {
    type Error;

    /// Initialize the chip
    async fn init(&mut self) -> Result<(), Self::Error>;

    /// Read acceleration in m/s²
    async fn read_acceleration(&mut self) -> Result<Vector3d, Self::Error>;

    /// Read and clear the enabled motion events
    async fn read_events(&mut self) -> Result<MotionEvents, Self::Error>;

    /// Perform self-test of the chip
    async fn self_test(&mut self) -> Result<bool, Self::Error>;

    /// Calibrate the chip
    async fn calibrate(&mut self) -> Result<(), Self::Error>;

    /// Reset the chip
    async fn reset(&mut self) -> Result<(), Self::Error>;

    /// Set update rate (in Hz), returning the rate applied
    async fn set_update_rate(&mut self, rate_hz: f32) -> Result<f32, Self::Error>;

    /// Update rate (in Hz) the chip is currently running at
    async fn update_rate(&mut self) -> Result<f32, Self::Error>;

    /// Get the name of the chip
    fn chip_name(&self) -> &'static str;
}

/// Accelerometer driver keeping the latest measurement and sensor health
pub struct Accelerometer<C> {
    chip: C,
    measurement: AccelMeasurement,
    initialized: bool,
    calibrating: bool,
    healthy: bool,
    sample_rate_hz: f32,
    samples: u32,
}

impl<C, E> Accelerometer<C>
where
    C: AccelerometerChip<Error = Error<E>>,
    E: core::fmt::Debug,
{
    /// Create a new accelerometer with the specified chip
    pub fn new(chip: C) -> Self {
        Self {
            chip,
            measurement: AccelMeasurement::default(),
            initialized: false,
            calibrating: false,
            healthy: false,
            sample_rate_hz: 0.0,
            samples: 0,
        }
    }

    /// Access the chip, e.g. to configure chip specific features
    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    /// Latest measurement, without touching the bus
    pub fn latest(&self) -> AccelMeasurement {
        self.measurement
    }

    fn ensure_initialized(&self) -> Result<(), Error<E>> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Record the bus outcome in the health flag
    fn track<T>(&mut self, result: Result<T, Error<E>>) -> Result<T, Error<E>> {
        self.healthy = result.is_ok();
        if let Err(err) = &result {
            log::warn!("{}: {:?}", self.chip.chip_name(), err);
        }
        result
    }

    /// Initialize the accelerometer
    pub async fn init(&mut self) -> Result<(), Error<E>> {
        if self.initialized {
            return Ok(());
        }

        let result = self.chip.init().await;
        self.track(result)?;
        self.mark_initialized().await
    }

    /// Record a freshly initialized chip and the rate it runs at
    async fn mark_initialized(&mut self) -> Result<(), Error<E>> {
        let result = self.chip.update_rate().await;
        self.sample_rate_hz = self.track(result)?;

        self.initialized = true;
        self.samples = 0;
        self.measurement = AccelMeasurement::default();
        log::info!(
            "{} initialized at {} Hz",
            self.chip.chip_name(),
            self.sample_rate_hz
        );
        Ok(())
    }

    /// Read a new measurement and update the snapshot
    pub async fn update_measurement(&mut self) -> Result<Vector3d, Error<E>> {
        self.ensure_initialized()?;

        let result = self.chip.read_acceleration().await;
        let acceleration = self.track(result)?;

        self.measurement = AccelMeasurement {
            acceleration,
            valid: true,
        };
        self.samples = self.samples.wrapping_add(1);
        Ok(acceleration)
    }

    /// Poll the motion events
    pub async fn events(&mut self) -> Result<MotionEvents, Error<E>> {
        self.ensure_initialized()?;

        let result = self.chip.read_events().await;
        self.track(result)
    }

    /// Calibrate the accelerometer
    pub async fn calibrate(&mut self) -> Result<(), Error<E>> {
        self.ensure_initialized()?;

        self.calibrating = true;
        let result = self.chip.calibrate().await;
        self.calibrating = false;
        self.track(result)?;

        self.measurement.valid = false;
        Ok(())
    }

    /// Perform a self-test
    pub async fn self_test(&mut self) -> Result<bool, Error<E>> {
        self.ensure_initialized()?;

        let result = self.chip.self_test().await;
        self.track(result)
    }

    /// Get the sensor status
    pub fn status(&self) -> AccelStatus {
        AccelStatus {
            healthy: self.healthy,
            initialized: self.initialized,
            calibrating: self.calibrating,
            sample_rate_hz: self.sample_rate_hz,
            samples: self.samples,
        }
    }

    /// Set the update rate in Hz
    pub async fn set_update_rate(&mut self, rate_hz: f32) -> Result<f32, Error<E>> {
        self.ensure_initialized()?;

        let result = self.chip.set_update_rate(rate_hz).await;
        let applied = self.track(result)?;

        self.sample_rate_hz = applied;
        Ok(applied)
    }

    /// Reset the sensor
    ///
    /// The chip reset re-runs the chip initialization.
    pub async fn reset(&mut self) -> Result<(), Error<E>> {
        self.initialized = false;

        let result = self.chip.reset().await;
        self.track(result)?;
        self.mark_initialized().await
    }
}

impl<C, E> AccelSensor for Accelerometer<C>
where
    C: AccelerometerChip<Error = Error<E>>,
    E: core::fmt::Debug,
{
    type Error = Error<E>;

    async fn init(&mut self) -> Result<(), Self::Error> {
        Accelerometer::init(self).await
    }

    async fn get_acceleration(&mut self) -> Result<Vector3d, Self::Error> {
        self.update_measurement().await
    }

    async fn get_events(&mut self) -> Result<MotionEvents, Self::Error> {
        self.events().await
    }

    fn get_status(&self) -> AccelStatus {
        self.status()
    }

    async fn calibrate(&mut self) -> Result<(), Self::Error> {
        Accelerometer::calibrate(self).await
    }

    async fn self_test(&mut self) -> Result<bool, Self::Error> {
        Accelerometer::self_test(self).await
    }

    async fn set_update_rate(&mut self, rate_hz: f32) -> Result<f32, Self::Error> {
        Accelerometer::set_update_rate(self, rate_hz).await
    }

    async fn reset(&mut self) -> Result<(), Self::Error> {
        Accelerometer::reset(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::adxl345::{
        Adxl345, Adxl345Config, DataRate, TapConfig, ADXL345_POWER_MEASURE,
        ADXL345_REG_POWER_CTL,
    };
    use super::*;
    use crate::bus::I2cInterface;
    use crate::sim::{SimAdxl345, SimError};
    use embassy_futures::block_on;

    type SimAccelerometer = Accelerometer<Adxl345<I2cInterface<SimAdxl345>>>;

    fn new_accelerometer() -> SimAccelerometer {
        Accelerometer::new(Adxl345::new_i2c(SimAdxl345::new()))
    }

    fn sim(accel: &mut SimAccelerometer) -> &mut SimAdxl345 {
        accel.chip_mut().interface_mut().bus_mut()
    }

    #[test]
    fn test_reads_require_init() {
        let mut accel = new_accelerometer();

        let result = block_on(accel.update_measurement());

        assert_eq!(result, Err(Error::NotInitialized));
        assert!(!accel.status().initialized);
    }

    #[test]
    fn test_measurement_updates_snapshot_and_status() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        sim(&mut accel).set_sample([0, 0, 250]);

        let acceleration = block_on(accel.get_acceleration()).unwrap();
        block_on(accel.get_acceleration()).unwrap();

        let latest = accel.latest();
        assert!(latest.valid);
        assert_eq!(latest.acceleration, acceleration);
        let status = accel.get_status();
        assert!(status.healthy);
        assert_eq!(status.samples, 2);
    }

    #[test]
    fn test_bus_failure_marks_unhealthy() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        sim(&mut accel).fail_next();

        let result = block_on(accel.update_measurement());

        assert_eq!(result, Err(Error::Bus(SimError::Injected)));
        assert!(!accel.status().healthy);

        block_on(accel.update_measurement()).unwrap();
        assert!(accel.status().healthy, "A good read restores health");
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        sim(&mut accel).clear_writes();

        block_on(accel.init()).unwrap();

        assert!(sim(&mut accel).writes().is_empty());
    }

    #[test]
    fn test_events_pass_through() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        block_on(accel.chip_mut().enable_tap_detection(TapConfig::default())).unwrap();
        sim(&mut accel).tap();

        let events = block_on(accel.get_events()).unwrap();

        assert_eq!(events.tap, Some(true));
        assert!(events.any());
    }

    #[test]
    fn test_update_rate_is_recorded() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();

        let applied = block_on(AccelSensor::set_update_rate(&mut accel, 30.0)).unwrap();

        assert_eq!(applied, 50.0);
        assert_eq!(accel.status().sample_rate_hz, 50.0);
    }

    #[test]
    fn test_reset_reinitializes() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();

        block_on(AccelSensor::reset(&mut accel)).unwrap();

        assert!(accel.status().initialized);
        assert!(block_on(AccelSensor::self_test(&mut accel)).unwrap());
    }

    #[test]
    fn test_sample_rate_follows_chip_after_init_and_reset() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        assert_eq!(accel.status().sample_rate_hz, 100.0);

        block_on(AccelSensor::set_update_rate(&mut accel, 30.0)).unwrap();
        assert_eq!(accel.status().sample_rate_hz, 50.0);

        block_on(AccelSensor::reset(&mut accel)).unwrap();
        assert_eq!(accel.status().sample_rate_hz, 100.0);
    }

    #[test]
    fn test_sample_rate_reflects_configured_rate() {
        let chip = Adxl345::new_i2c(SimAdxl345::new()).with_config(Adxl345Config {
            data_rate: Some(DataRate::Hz400),
            ..Default::default()
        });
        let mut accel = Accelerometer::new(chip);

        block_on(accel.init()).unwrap();

        assert_eq!(accel.status().sample_rate_hz, 400.0);
    }

    #[test]
    fn test_reset_initializes_chip_once() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        sim(&mut accel).clear_writes();

        block_on(AccelSensor::reset(&mut accel)).unwrap();

        let measure_writes = sim(&mut accel)
            .writes()
            .iter()
            .filter(|write| **write == (ADXL345_REG_POWER_CTL, ADXL345_POWER_MEASURE))
            .count();
        assert_eq!(measure_writes, 1);
    }

    #[test]
    fn test_calibration_clears_snapshot() {
        let mut accel = new_accelerometer();
        block_on(accel.init()).unwrap();
        sim(&mut accel).set_sample([0, 0, 250]);
        block_on(accel.update_measurement()).unwrap();

        block_on(AccelSensor::calibrate(&mut accel)).unwrap();

        assert!(!accel.latest().valid);
        assert!(!accel.status().calibrating);
    }
}
