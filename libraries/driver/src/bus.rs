// Register access over the buses the sensors are wired to
//
// Drivers talk to their chip through `RegisterInterface` only, so one chip
// implementation serves both the I2C and the SPI wiring.

use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::{Operation, SpiDevice};

/// SPI command bit selecting a register read
const SPI_READ: u8 = 0x80;
/// SPI command bit selecting a multi-byte (auto-increment) transfer
const SPI_MULTI_BYTE: u8 = 0x40;

/// Common interface for register-based bus devices with async support
pub trait RegisterInterface {
    /// Error type produced by the concrete bus
    type Error: core::fmt::Debug;

    /// Read consecutive registers starting at `reg`
    async fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), Self::Error>;

    /// Write to a single register
    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Read a single register
    async fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0u8; 1];
        self.read_registers(reg, &mut buffer).await?;
        Ok(buffer[0])
    }
}

/// Register access over I2C
pub struct I2cInterface<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> I2cInterface<I2C> {
    /// Create a new interface for the device at the given 7-bit address
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// The 7-bit address of the device
    pub fn address(&self) -> u8 {
        self.addr
    }

    /// Access the bus the interface wraps
    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterInterface for I2cInterface<I2C> {
    type Error = I2C::Error;

    async fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.addr, &[reg], data).await
    }

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.addr, &[reg, value]).await
    }
}

/// Register access over SPI (mode 3, chip select handled by the device)
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiInterface<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Access the bus the interface wraps
    pub fn bus_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Give back the bus
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> RegisterInterface for SpiInterface<SPI> {
    type Error = SPI::Error;

    async fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        let mut command = reg | SPI_READ;
        if data.len() > 1 {
            command |= SPI_MULTI_BYTE;
        }
        self.spi
            .transaction(&mut [Operation::Write(&[command]), Operation::Read(data)])
            .await
    }

    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.spi.write(&[reg & !(SPI_READ | SPI_MULTI_BYTE), value]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimAdxl345, SimError};
    use embassy_futures::block_on;

    #[test]
    fn test_i2c_burst_read_auto_increments() {
        let mut sim = SimAdxl345::new();
        sim.set_sample([0x0102, -2, 0x7FFF]);
        let mut iface = I2cInterface::new(sim, SimAdxl345::DEFAULT_ADDRESS);

        let mut buffer = [0u8; 6];
        block_on(iface.read_registers(0x32, &mut buffer)).unwrap();

        assert_eq!(buffer, [0x02, 0x01, 0xFE, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_i2c_wrong_address_is_not_acknowledged() {
        let mut iface = I2cInterface::new(SimAdxl345::new(), 0x1D);

        let result = block_on(iface.read_register(0x00));

        assert_eq!(result, Err(SimError::NoAcknowledge));
    }

    #[test]
    fn test_spi_write_then_read_back() {
        let mut iface = SpiInterface::new(SimAdxl345::new());

        block_on(iface.write_register(0x1D, 42)).unwrap();
        let value = block_on(iface.read_register(0x1D)).unwrap();

        assert_eq!(value, 42);
        assert_eq!(iface.bus_mut().register(0x1D), 42);
    }

    #[test]
    fn test_spi_single_byte_read_does_not_increment() {
        let mut sim = SimAdxl345::new();
        sim.set_sample([7, 8, 9]);
        let mut iface = SpiInterface::new(sim);

        let value = block_on(iface.read_register(0x34)).unwrap();
        assert_eq!(value, 8);

        let mut buffer = [0u8; 2];
        block_on(iface.read_registers(0x36, &mut buffer)).unwrap();
        assert_eq!(buffer, [9, 0]);
    }

    #[test]
    fn test_spi_read_is_framed_with_read_bit() {
        let mut iface = SpiInterface::new(SimAdxl345::new());

        let device_id = block_on(iface.read_register(0x00)).unwrap();

        assert_eq!(device_id, 0xE5);
        assert!(iface.bus_mut().writes().is_empty(), "A read must not write");
    }

    #[test]
    fn test_alternate_address_is_acknowledged() {
        let mut iface = I2cInterface::new(SimAdxl345::with_address(0x1D), 0x1D);

        assert_eq!(block_on(iface.read_register(0x00)), Ok(0xE5));
    }

    #[test]
    fn test_spi_release_returns_bus() {
        let mut iface = SpiInterface::new(SimAdxl345::new());
        block_on(iface.write_register(0x1E, 3)).unwrap();

        let sim = iface.release();

        assert_eq!(sim.register(0x1E), 3);
    }
}
