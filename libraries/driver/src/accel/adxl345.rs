// ADXL345 / ADXL343 3-axis accelerometer
//
// Both parts share the register map below. Acceleration is read as three
// little-endian i16 words and scaled at 4 mg/LSB, which holds in full
// resolution mode for every range.

use embassy_futures::yield_now;
use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::SpiDevice;
use hal::{MotionEvents, Vector3d, STANDARD_GRAVITY};
use num_traits::float::FloatCore;

use crate::accel::AccelerometerChip;
use crate::bus::{I2cInterface, RegisterInterface, SpiInterface};
use crate::error::{Error, Result};

// ADXL345 I2C addresses (depends on ALT ADDRESS pin state)
pub const ADXL345_DEFAULT_ADDRESS: u8 = 0x53;
pub const ADXL345_ALT_ADDRESS: u8 = 0x1D;

// Register addresses
pub const ADXL345_REG_DEVID: u8 = 0x00;
pub const ADXL345_REG_THRESH_TAP: u8 = 0x1D;
pub const ADXL345_REG_OFSX: u8 = 0x1E;
pub const ADXL345_REG_OFSY: u8 = 0x1F;
pub const ADXL345_REG_OFSZ: u8 = 0x20;
pub const ADXL345_REG_DUR: u8 = 0x21;
pub const ADXL345_REG_LATENT: u8 = 0x22;
pub const ADXL345_REG_WINDOW: u8 = 0x23;
pub const ADXL345_REG_THRESH_ACT: u8 = 0x24;
pub const ADXL345_REG_THRESH_INACT: u8 = 0x25;
pub const ADXL345_REG_TIME_INACT: u8 = 0x26;
pub const ADXL345_REG_ACT_INACT_CTL: u8 = 0x27;
pub const ADXL345_REG_THRESH_FF: u8 = 0x28;
pub const ADXL345_REG_TIME_FF: u8 = 0x29;
pub const ADXL345_REG_TAP_AXES: u8 = 0x2A;
pub const ADXL345_REG_ACT_TAP_STATUS: u8 = 0x2B;
pub const ADXL345_REG_BW_RATE: u8 = 0x2C;
pub const ADXL345_REG_POWER_CTL: u8 = 0x2D;
pub const ADXL345_REG_INT_ENABLE: u8 = 0x2E;
pub const ADXL345_REG_INT_MAP: u8 = 0x2F;
pub const ADXL345_REG_INT_SOURCE: u8 = 0x30;
pub const ADXL345_REG_DATA_FORMAT: u8 = 0x31;
pub const ADXL345_REG_DATAX0: u8 = 0x32;
pub const ADXL345_REG_DATAX1: u8 = 0x33;
pub const ADXL345_REG_DATAY0: u8 = 0x34;
pub const ADXL345_REG_DATAY1: u8 = 0x35;
pub const ADXL345_REG_DATAZ0: u8 = 0x36;
pub const ADXL345_REG_DATAZ1: u8 = 0x37;
pub const ADXL345_REG_FIFO_CTL: u8 = 0x38;
pub const ADXL345_REG_FIFO_STATUS: u8 = 0x39;

// Chip ID for verification (same on the ADXL343)
pub const ADXL345_DEVICE_ID: u8 = 0xE5;

// Interrupt bits, shared by INT_ENABLE, INT_MAP and INT_SOURCE
pub const ADXL345_INT_DATA_READY: u8 = 0b1000_0000;
pub const ADXL345_INT_SINGLE_TAP: u8 = 0b0100_0000;
pub const ADXL345_INT_DOUBLE_TAP: u8 = 0b0010_0000;
pub const ADXL345_INT_ACTIVITY: u8 = 0b0001_0000;
pub const ADXL345_INT_INACTIVITY: u8 = 0b0000_1000;
pub const ADXL345_INT_FREE_FALL: u8 = 0b0000_0100;

// POWER_CTL bits
pub const ADXL345_POWER_MEASURE: u8 = 0x08;

// DATA_FORMAT bits
pub const ADXL345_FORMAT_FULL_RES: u8 = 0x08;
const FORMAT_RANGE_MASK: u8 = 0x03;
const FORMAT_LOW_NIBBLE: u8 = 0x0F;

// BW_RATE bits
const BW_RATE_MASK: u8 = 0x0F;

// Activity detection on X, Y and Z, dc-coupled
const ACT_INACT_CTL_ACT_XYZ: u8 = 0b0111_0000;
// Tap detection on X, Y and Z
const TAP_AXES_XYZ: u8 = 0b0000_0111;

/// Conversion factor: 4 mg per LSB
pub const ADXL345_MG2G_MULTIPLIER: f32 = 0.004;
/// Offset registers: 15.6 mg per LSB
pub const ADXL345_OFFSET_G_PER_LSB: f32 = 0.0156;

/// Samples averaged by `calibrate`
const CALIBRATION_SAMPLES: i32 = 16;
/// INT_SOURCE polls before giving up on DATA_READY
const DATA_READY_POLL_LIMIT: u32 = 1000;

/// Output data rates (BW_RATE low nibble)
///
/// The bandwidth is half the output data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    Hz0_10 = 0b0000,
    Hz0_20 = 0b0001,
    Hz0_39 = 0b0010,
    Hz0_78 = 0b0011,
    Hz1_56 = 0b0100,
    Hz3_13 = 0b0101,
    Hz6_25 = 0b0110,
    Hz12_5 = 0b0111,
    Hz25 = 0b1000,
    Hz50 = 0b1001,
    Hz100 = 0b1010,
    Hz200 = 0b1011,
    Hz400 = 0b1100,
    Hz800 = 0b1101,
    Hz1600 = 0b1110,
    Hz3200 = 0b1111,
}

impl DataRate {
    /// All rates, slowest first
    pub const ALL: [DataRate; 16] = [
        DataRate::Hz0_10,
        DataRate::Hz0_20,
        DataRate::Hz0_39,
        DataRate::Hz0_78,
        DataRate::Hz1_56,
        DataRate::Hz3_13,
        DataRate::Hz6_25,
        DataRate::Hz12_5,
        DataRate::Hz25,
        DataRate::Hz50,
        DataRate::Hz100,
        DataRate::Hz200,
        DataRate::Hz400,
        DataRate::Hz800,
        DataRate::Hz1600,
        DataRate::Hz3200,
    ];

    /// Decode the low nibble of BW_RATE
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & BW_RATE_MASK) as usize]
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Output data rate in Hz
    pub fn hz(self) -> f32 {
        match self {
            DataRate::Hz0_10 => 0.10,
            DataRate::Hz0_20 => 0.20,
            DataRate::Hz0_39 => 0.39,
            DataRate::Hz0_78 => 0.78,
            DataRate::Hz1_56 => 1.56,
            DataRate::Hz3_13 => 3.13,
            DataRate::Hz6_25 => 6.25,
            DataRate::Hz12_5 => 12.5,
            DataRate::Hz25 => 25.0,
            DataRate::Hz50 => 50.0,
            DataRate::Hz100 => 100.0,
            DataRate::Hz200 => 200.0,
            DataRate::Hz400 => 400.0,
            DataRate::Hz800 => 800.0,
            DataRate::Hz1600 => 1600.0,
            DataRate::Hz3200 => 3200.0,
        }
    }

    /// The slowest rate at or above `rate_hz`, capped at 3200 Hz
    pub fn at_least(rate_hz: f32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.hz() >= rate_hz)
            .unwrap_or(DataRate::Hz3200)
    }
}

/// Measurement range in ±g (DATA_FORMAT low two bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
    G2 = 0b00,
    G4 = 0b01,
    G8 = 0b10,
    G16 = 0b11,
}

impl Range {
    pub fn from_bits(bits: u8) -> Self {
        match bits & FORMAT_RANGE_MASK {
            0b00 => Range::G2,
            0b01 => Range::G4,
            0b10 => Range::G8,
            _ => Range::G16,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Number of taps that raise the tap event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapCount {
    Single,
    Double,
}

/// Tap detection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapConfig {
    pub count: TapCount,
    /// Acceleration threshold, 62.5 mg/LSB
    pub threshold: u8,
    /// Maximum time above threshold to count as a tap, 625 µs/LSB
    pub duration: u8,
    /// Wait after the first tap before the window opens, 1.25 ms/LSB (double tap only)
    pub latency: u8,
    /// Window in which the second tap must occur, 1.25 ms/LSB (double tap only)
    pub window: u8,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            count: TapCount::Single,
            threshold: 20,
            duration: 50,
            latency: 20,
            window: 255,
        }
    }
}

/// Activity detection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Activity threshold, 62.5 mg/LSB
    pub threshold: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self { threshold: 18 }
    }
}

/// Free-fall detection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FreefallConfig {
    /// All axes must stay below this, 62.5 mg/LSB
    pub threshold: u8,
    /// For at least this long, 5 ms/LSB
    pub time: u8,
}

impl Default for FreefallConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            time: 25,
        }
    }
}

/// Configuration applied by `init`
///
/// `None` leaves the chip's current setting untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Adxl345Config {
    pub data_rate: Option<DataRate>,
    pub range: Option<Range>,
    pub tap: Option<TapConfig>,
    pub motion: Option<MotionConfig>,
    pub freefall: Option<FreefallConfig>,
}

/// Event detections currently enabled on the chip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EnabledEvents {
    tap: Option<TapCount>,
    motion: bool,
    freefall: bool,
}

/// ADXL345 accelerometer driver
pub struct Adxl345<IFACE> {
    iface: IFACE,
    config: Adxl345Config,
    enabled: EnabledEvents,
}

/// The ADXL343 is register compatible with the ADXL345
pub type Adxl343<IFACE> = Adxl345<IFACE>;

impl<I2C: I2c> Adxl345<I2cInterface<I2C>> {
    /// Create a driver for a chip at the default I2C address (0x53)
    pub fn new_i2c(i2c: I2C) -> Self {
        Self::new_i2c_with_address(i2c, ADXL345_DEFAULT_ADDRESS)
    }

    /// Create a driver for a chip at the given I2C address
    pub fn new_i2c_with_address(i2c: I2C, addr: u8) -> Self {
        Self::new(I2cInterface::new(i2c, addr))
    }
}

impl<SPI: SpiDevice> Adxl345<SpiInterface<SPI>> {
    /// Create a driver for a chip on a 4-wire SPI bus
    pub fn new_spi(spi: SPI) -> Self {
        Self::new(SpiInterface::new(spi))
    }
}

impl<IFACE: RegisterInterface> Adxl345<IFACE> {
    /// Create a driver over an existing register interface
    pub fn new(iface: IFACE) -> Self {
        Self {
            iface,
            config: Adxl345Config::default(),
            enabled: EnabledEvents::default(),
        }
    }

    /// Set the configuration applied by `init`
    pub fn with_config(mut self, config: Adxl345Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Adxl345Config {
        &self.config
    }

    /// Access the register interface
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.iface
    }

    /// Give back the register interface
    pub fn release(self) -> IFACE {
        self.iface
    }

    async fn read_register(&mut self, reg: u8) -> Result<u8, IFACE::Error> {
        self.iface.read_register(reg).await.map_err(Error::Bus)
    }

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), IFACE::Error> {
        self.iface.write_register(reg, value).await.map_err(Error::Bus)
    }

    async fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), IFACE::Error> {
        self.iface.read_registers(reg, data).await.map_err(Error::Bus)
    }

    /// Read the device identification register
    pub async fn device_id(&mut self) -> Result<u8, IFACE::Error> {
        self.read_register(ADXL345_REG_DEVID).await
    }

    /// Verify the chip, enable measurement and apply the configuration
    pub async fn init(&mut self) -> Result<(), IFACE::Error> {
        let device_id = self.device_id().await?;
        if device_id != ADXL345_DEVICE_ID {
            log::warn!("ADXL345: unexpected device id {:#04x}", device_id);
            return Err(Error::UnknownDevice(device_id));
        }

        self.write_register(ADXL345_REG_INT_ENABLE, 0).await?;
        self.enabled = EnabledEvents::default();
        self.write_register(ADXL345_REG_POWER_CTL, ADXL345_POWER_MEASURE)
            .await?;

        let config = self.config;
        if let Some(data_rate) = config.data_rate {
            self.set_data_rate(data_rate).await?;
        }
        if let Some(range) = config.range {
            self.set_range(range).await?;
        }
        if let Some(tap) = config.tap {
            self.enable_tap_detection(tap).await?;
        }
        if let Some(motion) = config.motion {
            self.enable_motion_detection(motion).await?;
        }
        if let Some(freefall) = config.freefall {
            self.enable_freefall_detection(freefall).await?;
        }

        log::debug!("ADXL345: initialized");
        Ok(())
    }

    /// Raw x, y, z samples
    pub async fn raw_acceleration(&mut self) -> Result<[i16; 3], IFACE::Error> {
        let mut buffer = [0u8; 6];
        self.read_registers(ADXL345_REG_DATAX0, &mut buffer).await?;

        Ok([
            i16::from_le_bytes([buffer[0], buffer[1]]),
            i16::from_le_bytes([buffer[2], buffer[3]]),
            i16::from_le_bytes([buffer[4], buffer[5]]),
        ])
    }

    /// The x, y, z acceleration in m/s²
    pub async fn acceleration(&mut self) -> Result<Vector3d, IFACE::Error> {
        let [x, y, z] = self.raw_acceleration().await?;
        log::trace!("ADXL345: raw sample {} {} {}", x, y, z);

        let scale = ADXL345_MG2G_MULTIPLIER * STANDARD_GRAVITY;
        Ok(Vector3d::new(
            x as f32 * scale,
            y as f32 * scale,
            z as f32 * scale,
        ))
    }

    /// The output data rate
    pub async fn data_rate(&mut self) -> Result<DataRate, IFACE::Error> {
        let bw_rate = self.read_register(ADXL345_REG_BW_RATE).await?;
        Ok(DataRate::from_bits(bw_rate))
    }

    /// Set the output data rate, leaving normal power mode selected
    pub async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), IFACE::Error> {
        log::debug!("ADXL345: data rate {} Hz", rate.hz());
        self.write_register(ADXL345_REG_BW_RATE, rate.bits()).await
    }

    /// The measurement range
    pub async fn range(&mut self) -> Result<Range, IFACE::Error> {
        let data_format = self.read_register(ADXL345_REG_DATA_FORMAT).await?;
        Ok(Range::from_bits(data_format))
    }

    /// Set the measurement range
    ///
    /// Full resolution is always enabled so the 4 mg/LSB scale holds for
    /// every range. The upper DATA_FORMAT bits are preserved.
    pub async fn set_range(&mut self, range: Range) -> Result<(), IFACE::Error> {
        let mut data_format = self.read_register(ADXL345_REG_DATA_FORMAT).await?;

        data_format &= !FORMAT_LOW_NIBBLE;
        data_format |= range.bits();
        data_format |= ADXL345_FORMAT_FULL_RES;

        log::debug!("ADXL345: range {:?}", range);
        self.write_register(ADXL345_REG_DATA_FORMAT, data_format)
            .await
    }

    /// Start or stop measuring (standby)
    pub async fn set_measuring(&mut self, measuring: bool) -> Result<(), IFACE::Error> {
        let mut power_ctl = self.read_register(ADXL345_REG_POWER_CTL).await?;
        if measuring {
            power_ctl |= ADXL345_POWER_MEASURE;
        } else {
            power_ctl &= !ADXL345_POWER_MEASURE;
        }
        self.write_register(ADXL345_REG_POWER_CTL, power_ctl).await
    }

    /// The x, y, z offset trim, 15.6 mg/LSB
    pub async fn offsets(&mut self) -> Result<[i8; 3], IFACE::Error> {
        let mut buffer = [0u8; 3];
        self.read_registers(ADXL345_REG_OFSX, &mut buffer).await?;
        Ok(buffer.map(|b| b as i8))
    }

    /// Set the x, y, z offset trim, 15.6 mg/LSB
    pub async fn set_offsets(&mut self, offsets: [i8; 3]) -> Result<(), IFACE::Error> {
        self.write_register(ADXL345_REG_OFSX, offsets[0] as u8).await?;
        self.write_register(ADXL345_REG_OFSY, offsets[1] as u8).await?;
        self.write_register(ADXL345_REG_OFSZ, offsets[2] as u8).await
    }

    /// Interrupts are disabled while detection settings change
    async fn suspend_interrupts(&mut self) -> Result<u8, IFACE::Error> {
        let active = self.read_register(ADXL345_REG_INT_ENABLE).await?;
        self.write_register(ADXL345_REG_INT_ENABLE, 0).await?;
        Ok(active)
    }

    async fn clear_interrupts(&mut self, bits: u8) -> Result<(), IFACE::Error> {
        let active = self.read_register(ADXL345_REG_INT_ENABLE).await?;
        self.write_register(ADXL345_REG_INT_ENABLE, active & !bits)
            .await
    }

    /// Enable single or double tap detection on all axes
    pub async fn enable_tap_detection(&mut self, config: TapConfig) -> Result<(), IFACE::Error> {
        let mut active = self.suspend_interrupts().await?;

        self.write_register(ADXL345_REG_TAP_AXES, TAP_AXES_XYZ).await?;
        self.write_register(ADXL345_REG_THRESH_TAP, config.threshold)
            .await?;
        self.write_register(ADXL345_REG_DUR, config.duration).await?;

        match config.count {
            TapCount::Single => active |= ADXL345_INT_SINGLE_TAP,
            TapCount::Double => {
                self.write_register(ADXL345_REG_LATENT, config.latency)
                    .await?;
                self.write_register(ADXL345_REG_WINDOW, config.window)
                    .await?;
                active |= ADXL345_INT_DOUBLE_TAP;
            }
        }

        self.write_register(ADXL345_REG_INT_ENABLE, active).await?;
        self.enabled.tap = Some(config.count);

        log::debug!("ADXL345: tap detection enabled ({:?})", config.count);
        Ok(())
    }

    pub async fn disable_tap_detection(&mut self) -> Result<(), IFACE::Error> {
        self.clear_interrupts(ADXL345_INT_SINGLE_TAP | ADXL345_INT_DOUBLE_TAP)
            .await?;
        self.enabled.tap = None;
        Ok(())
    }

    /// Enable activity detection on all axes
    pub async fn enable_motion_detection(
        &mut self,
        config: MotionConfig,
    ) -> Result<(), IFACE::Error> {
        let active = self.suspend_interrupts().await?;

        self.write_register(ADXL345_REG_ACT_INACT_CTL, ACT_INACT_CTL_ACT_XYZ)
            .await?;
        self.write_register(ADXL345_REG_THRESH_ACT, config.threshold)
            .await?;
        self.write_register(ADXL345_REG_INT_ENABLE, active | ADXL345_INT_ACTIVITY)
            .await?;
        self.enabled.motion = true;

        log::debug!("ADXL345: motion detection enabled");
        Ok(())
    }

    pub async fn disable_motion_detection(&mut self) -> Result<(), IFACE::Error> {
        self.clear_interrupts(ADXL345_INT_ACTIVITY).await?;
        self.enabled.motion = false;
        Ok(())
    }

    /// Enable free-fall detection
    pub async fn enable_freefall_detection(
        &mut self,
        config: FreefallConfig,
    ) -> Result<(), IFACE::Error> {
        let active = self.suspend_interrupts().await?;

        self.write_register(ADXL345_REG_THRESH_FF, config.threshold)
            .await?;
        self.write_register(ADXL345_REG_TIME_FF, config.time).await?;
        self.write_register(ADXL345_REG_INT_ENABLE, active | ADXL345_INT_FREE_FALL)
            .await?;
        self.enabled.freefall = true;

        log::debug!("ADXL345: freefall detection enabled");
        Ok(())
    }

    pub async fn disable_freefall_detection(&mut self) -> Result<(), IFACE::Error> {
        self.clear_interrupts(ADXL345_INT_FREE_FALL).await?;
        self.enabled.freefall = false;
        Ok(())
    }

    /// Poll the enabled events
    ///
    /// Reading INT_SOURCE clears the latched sources on the chip, so each
    /// event is reported once.
    pub async fn events(&mut self) -> Result<MotionEvents, IFACE::Error> {
        let source = self.read_register(ADXL345_REG_INT_SOURCE).await?;

        let tap = self.enabled.tap.map(|count| match count {
            TapCount::Single => source & ADXL345_INT_SINGLE_TAP != 0,
            TapCount::Double => source & ADXL345_INT_DOUBLE_TAP != 0,
        });

        Ok(MotionEvents {
            tap,
            motion: self
                .enabled
                .motion
                .then_some(source & ADXL345_INT_ACTIVITY != 0),
            freefall: self
                .enabled
                .freefall
                .then_some(source & ADXL345_INT_FREE_FALL != 0),
        })
    }

    async fn wait_data_ready(&mut self) -> Result<(), IFACE::Error> {
        for _ in 0..DATA_READY_POLL_LIMIT {
            let source = self.read_register(ADXL345_REG_INT_SOURCE).await?;
            if source & ADXL345_INT_DATA_READY != 0 {
                return Ok(());
            }
            yield_now().await;
        }
        Err(Error::Timeout)
    }

    /// Null the offsets with the board lying flat, +Z up
    ///
    /// Polling DATA_READY reads INT_SOURCE, so events latched before the
    /// calibration are lost.
    pub async fn calibrate_offsets(&mut self) -> Result<[i8; 3], IFACE::Error> {
        self.set_offsets([0; 3]).await?;

        let mut sum = [0i32; 3];
        for _ in 0..CALIBRATION_SAMPLES {
            self.wait_data_ready().await?;
            let sample = self.raw_acceleration().await?;
            for (total, axis) in sum.iter_mut().zip(sample) {
                *total += axis as i32;
            }
        }

        let one_g = FloatCore::round(1.0 / ADXL345_MG2G_MULTIPLIER) as i32;
        let target = [0, 0, one_g];
        let lsb_ratio = ADXL345_MG2G_MULTIPLIER / ADXL345_OFFSET_G_PER_LSB;

        let mut offsets = [0i8; 3];
        for axis in 0..3 {
            let error = (sum[axis] as f32 / CALIBRATION_SAMPLES as f32) - target[axis] as f32;
            let trim = -FloatCore::round(error * lsb_ratio);
            offsets[axis] = trim.clamp(i8::MIN as f32, i8::MAX as f32) as i8;
        }

        log::debug!("ADXL345: calibrated offsets {:?}", offsets);
        self.set_offsets(offsets).await?;
        Ok(offsets)
    }

    /// Restore the power-on register values and re-run `init`
    pub async fn reset_registers(&mut self) -> Result<(), IFACE::Error> {
        self.write_register(ADXL345_REG_POWER_CTL, 0).await?;
        self.write_register(ADXL345_REG_INT_ENABLE, 0).await?;
        self.write_register(ADXL345_REG_INT_MAP, 0).await?;
        self.write_register(ADXL345_REG_DATA_FORMAT, 0).await?;
        self.write_register(ADXL345_REG_BW_RATE, DataRate::Hz100.bits())
            .await?;
        self.set_offsets([0; 3]).await?;
        self.enabled = EnabledEvents::default();

        self.init().await
    }
}

impl<IFACE: RegisterInterface> AccelerometerChip for Adxl345<IFACE> {
    type Error = Error<IFACE::Error>;

    async fn init(&mut self) -> core::result::Result<(), Self::Error> {
        Adxl345::init(self).await
    }

    async fn read_acceleration(&mut self) -> core::result::Result<Vector3d, Self::Error> {
        self.acceleration().await
    }

    async fn read_events(&mut self) -> core::result::Result<MotionEvents, Self::Error> {
        self.events().await
    }

    async fn self_test(&mut self) -> core::result::Result<bool, Self::Error> {
        // Verify chip ID as a simple self-test
        Ok(self.device_id().await? == ADXL345_DEVICE_ID)
    }

    async fn calibrate(&mut self) -> core::result::Result<(), Self::Error> {
        self.calibrate_offsets().await.map(|_| ())
    }

    async fn reset(&mut self) -> core::result::Result<(), Self::Error> {
        self.reset_registers().await
    }

    async fn set_update_rate(&mut self, rate_hz: f32) -> core::result::Result<f32, Self::Error> {
        let rate = DataRate::at_least(rate_hz);
        self.set_data_rate(rate).await?;
        Ok(rate.hz())
    }

    async fn update_rate(&mut self) -> core::result::Result<f32, Self::Error> {
        Ok(self.data_rate().await?.hz())
    }

    fn chip_name(&self) -> &'static str {
        "ADXL345"
    }
}
