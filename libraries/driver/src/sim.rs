// Register-level model of the ADXL345 used by SITL and the unit tests
//
// The model answers on I2C and on SPI, keeps the register file, latches
// interrupt sources the way the chip does and records every register write.

use embedded_hal_async::i2c::{self, I2c};
use embedded_hal_async::spi::{self, SpiDevice};
use heapless::Vec;

use crate::accel::adxl345::*;

/// Number of registers modelled (0x00 to FIFO_STATUS)
pub const REGISTER_COUNT: usize = ADXL345_REG_FIFO_STATUS as usize + 1;

/// Number of register writes kept in the history, older writes are dropped
pub const WRITE_HISTORY_LEN: usize = 64;

/// Interrupt sources latched until INT_SOURCE is read
const LATCHED_SOURCES: u8 = ADXL345_INT_SINGLE_TAP
    | ADXL345_INT_DOUBLE_TAP
    | ADXL345_INT_ACTIVITY
    | ADXL345_INT_INACTIVITY
    | ADXL345_INT_FREE_FALL;

/// Power-on value of BW_RATE (100 Hz)
const BW_RATE_RESET: u8 = 0x0A;

/// SPI command byte fields
const SPI_READ: u8 = 0x80;
const SPI_MULTI_BYTE: u8 = 0x40;
const SPI_ADDRESS_MASK: u8 = 0x3F;

/// Errors the simulated bus can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// I2C transfer addressed another device
    NoAcknowledge,
    /// Failure injected with [`SimAdxl345::fail_next`]
    Injected,
    /// SPI operation the chip does not support
    Unsupported,
}

impl i2c::Error for SimError {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            SimError::NoAcknowledge => {
                i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address)
            }
            SimError::Injected => i2c::ErrorKind::Bus,
            SimError::Unsupported => i2c::ErrorKind::Other,
        }
    }
}

impl spi::Error for SimError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

/// Simulated ADXL345
pub struct SimAdxl345 {
    registers: [u8; REGISTER_COUNT],
    address: u8,
    pointer: u8,
    /// Raw sample before the offset registers are applied
    sample: [i16; 3],
    /// A sample was pushed and not read yet
    fresh: bool,
    /// Report DATA_READY on every poll, as a chip free-running at its ODR
    streaming: bool,
    fail_next: bool,
    writes: Vec<(u8, u8), WRITE_HISTORY_LEN>,
}

impl Default for SimAdxl345 {
    fn default() -> Self {
        Self::new()
    }
}

impl SimAdxl345 {
    /// The address the ADXL345 answers on with ALT ADDRESS low
    pub const DEFAULT_ADDRESS: u8 = ADXL345_DEFAULT_ADDRESS;

    /// Create a chip in its power-on state at the default address
    pub fn new() -> Self {
        Self::with_address(Self::DEFAULT_ADDRESS)
    }

    /// Create a chip in its power-on state at the given address
    pub fn with_address(address: u8) -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[ADXL345_REG_DEVID as usize] = ADXL345_DEVICE_ID;
        registers[ADXL345_REG_BW_RATE as usize] = BW_RATE_RESET;

        Self {
            registers,
            address,
            pointer: 0,
            sample: [0; 3],
            fresh: false,
            streaming: true,
            fail_next: false,
            writes: Vec::new(),
        }
    }

    /// Set the raw acceleration the chip measures, in 4 mg LSB
    pub fn set_sample(&mut self, sample: [i16; 3]) {
        self.sample = sample;
        self.fresh = true;
    }

    /// Choose whether DATA_READY is reported on every poll
    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// Overwrite a register, bypassing the read-only checks
    pub fn set_register(&mut self, reg: u8, value: u8) {
        if let Some(slot) = self.registers.get_mut(reg as usize) {
            *slot = value;
        }
    }

    /// Peek a register without side effects
    pub fn register(&self, reg: u8) -> u8 {
        match reg {
            ADXL345_REG_DATAX0..=ADXL345_REG_DATAZ1 => {
                let offset = (reg - ADXL345_REG_DATAX0) as usize;
                let value = self.output_axis(offset / 2).to_le_bytes();
                value[offset % 2]
            }
            ADXL345_REG_INT_SOURCE => {
                let mut value = self.registers[reg as usize];
                if self.streaming || self.fresh {
                    value |= ADXL345_INT_DATA_READY;
                }
                value
            }
            _ => self.registers.get(reg as usize).copied().unwrap_or(0),
        }
    }

    /// The last [`WRITE_HISTORY_LEN`] register writes seen on the bus, oldest first
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Make the next bus transaction fail
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    /// A single tap on the device
    pub fn tap(&mut self) {
        self.latch(ADXL345_INT_SINGLE_TAP);
    }

    /// Two taps within the configured window
    pub fn double_tap(&mut self) {
        self.latch(ADXL345_INT_SINGLE_TAP | ADXL345_INT_DOUBLE_TAP);
    }

    /// Movement above the activity threshold
    pub fn shake(&mut self) {
        self.latch(ADXL345_INT_ACTIVITY);
    }

    /// All axes below the free-fall threshold for long enough
    pub fn free_fall(&mut self) {
        self.latch(ADXL345_INT_FREE_FALL);
    }

    /// Event sources only latch when their interrupt is enabled
    fn latch(&mut self, sources: u8) {
        let enabled = self.registers[ADXL345_REG_INT_ENABLE as usize];
        self.registers[ADXL345_REG_INT_SOURCE as usize] |= sources & enabled;
    }

    fn take_failure(&mut self) -> Result<(), SimError> {
        if core::mem::take(&mut self.fail_next) {
            Err(SimError::Injected)
        } else {
            Ok(())
        }
    }

    /// Output of one axis: the sample plus the 15.6 mg offset trim
    fn output_axis(&self, axis: usize) -> i16 {
        let trim = self.registers[ADXL345_REG_OFSX as usize + axis] as i8 as i32;
        let value = self.sample[axis] as i32 + trim * 39 / 10;
        value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    fn read_reg(&mut self, reg: u8) -> u8 {
        let value = self.register(reg);
        match reg {
            ADXL345_REG_INT_SOURCE => {
                self.registers[reg as usize] &= !LATCHED_SOURCES;
            }
            ADXL345_REG_DATAX0..=ADXL345_REG_DATAZ1 => self.fresh = false,
            _ => {}
        }
        value
    }

    fn write_reg(&mut self, reg: u8, value: u8) {
        if self.writes.is_full() {
            self.writes.remove(0);
        }
        let _ = self.writes.push((reg, value));

        let writable = matches!(
            reg,
            ADXL345_REG_THRESH_TAP..=ADXL345_REG_TAP_AXES
                | ADXL345_REG_BW_RATE..=ADXL345_REG_INT_MAP
                | ADXL345_REG_DATA_FORMAT
                | ADXL345_REG_FIFO_CTL
        );
        if writable {
            self.registers[reg as usize] = value;
        }
    }
}

impl i2c::ErrorType for SimAdxl345 {
    type Error = SimError;
}

impl I2c for SimAdxl345 {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.take_failure()?;
        if address != self.address {
            return Err(SimError::NoAcknowledge);
        }

        for operation in operations.iter_mut() {
            match operation {
                i2c::Operation::Write(bytes) => {
                    if let Some((&reg, values)) = bytes.split_first() {
                        self.pointer = reg;
                        for &value in values {
                            self.write_reg(self.pointer, value);
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                i2c::Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.read_reg(self.pointer);
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Decoded SPI command byte
#[derive(Clone, Copy)]
struct SpiCommand {
    read: bool,
    multi_byte: bool,
}

impl spi::ErrorType for SimAdxl345 {
    type Error = SimError;
}

impl SpiDevice for SimAdxl345 {
    async fn transaction(
        &mut self,
        operations: &mut [spi::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        self.take_failure()?;

        // Set by the command byte
        let mut command = None;

        for operation in operations.iter_mut() {
            match operation {
                spi::Operation::Write(bytes) => {
                    let mut bytes = bytes.iter();
                    if command.is_none() {
                        let Some(&byte) = bytes.next() else {
                            continue;
                        };
                        self.pointer = byte & SPI_ADDRESS_MASK;
                        command = Some(SpiCommand {
                            read: byte & SPI_READ != 0,
                            multi_byte: byte & SPI_MULTI_BYTE != 0,
                        });
                    }
                    let Some(SpiCommand { read, multi_byte }) = command else {
                        continue;
                    };
                    // MOSI is ignored while the chip shifts data out
                    if read {
                        continue;
                    }
                    for &value in bytes {
                        self.write_reg(self.pointer, value);
                        if multi_byte {
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                spi::Operation::Read(buffer) => {
                    let Some(SpiCommand {
                        read: true,
                        multi_byte,
                    }) = command
                    else {
                        return Err(SimError::Unsupported);
                    };
                    for byte in buffer.iter_mut() {
                        *byte = self.read_reg(self.pointer);
                        if multi_byte {
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                spi::Operation::DelayNs(_) => {}
                _ => return Err(SimError::Unsupported),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn test_interrupt_source_clears_on_read() {
        let mut sim = SimAdxl345::new();
        sim.set_register(ADXL345_REG_INT_ENABLE, ADXL345_INT_SINGLE_TAP);
        sim.set_streaming(false);
        sim.tap();

        let mut first = [0u8; 1];
        block_on(sim.write_read(SimAdxl345::DEFAULT_ADDRESS, &[ADXL345_REG_INT_SOURCE], &mut first))
            .unwrap();
        let mut second = [0u8; 1];
        block_on(sim.write_read(SimAdxl345::DEFAULT_ADDRESS, &[ADXL345_REG_INT_SOURCE], &mut second))
            .unwrap();

        assert_eq!(first[0], ADXL345_INT_SINGLE_TAP);
        assert_eq!(second[0], 0, "Latched sources must clear after a read");
    }

    #[test]
    fn test_events_only_latch_when_enabled() {
        let mut sim = SimAdxl345::new();
        sim.set_register(ADXL345_REG_INT_ENABLE, ADXL345_INT_FREE_FALL);

        sim.tap();
        sim.shake();
        sim.free_fall();

        let latched = sim.register(ADXL345_REG_INT_SOURCE) & LATCHED_SOURCES;
        assert_eq!(latched, ADXL345_INT_FREE_FALL);
    }

    #[test]
    fn test_read_only_registers_ignore_writes() {
        let mut sim = SimAdxl345::new();

        block_on(I2c::write(&mut sim, SimAdxl345::DEFAULT_ADDRESS, &[ADXL345_REG_DEVID, 0x00]))
            .unwrap();

        assert_eq!(sim.register(ADXL345_REG_DEVID), ADXL345_DEVICE_ID);
        assert_eq!(sim.writes(), &[(ADXL345_REG_DEVID, 0x00)]);
    }

    #[test]
    fn test_offsets_shift_output() {
        let mut sim = SimAdxl345::new();
        sim.set_sample([100, 0, 0]);
        sim.set_register(ADXL345_REG_OFSX, (-10i8) as u8);

        let low = sim.register(ADXL345_REG_DATAX0);
        let high = sim.register(ADXL345_REG_DATAX1);

        assert_eq!(i16::from_le_bytes([low, high]), 61);
    }

    #[test]
    fn test_write_history_keeps_latest_writes() {
        let mut sim = SimAdxl345::new();

        for value in 0..=WRITE_HISTORY_LEN as u8 {
            block_on(I2c::write(&mut sim, SimAdxl345::DEFAULT_ADDRESS, &[ADXL345_REG_OFSX, value]))
                .unwrap();
        }

        let writes = sim.writes();
        assert_eq!(writes.len(), WRITE_HISTORY_LEN);
        assert_eq!(writes[0], (ADXL345_REG_OFSX, 1));
        assert_eq!(
            writes[WRITE_HISTORY_LEN - 1],
            (ADXL345_REG_OFSX, WRITE_HISTORY_LEN as u8)
        );
    }

    #[test]
    fn test_spi_read_needs_read_bit() {
        let mut sim = SimAdxl345::new();

        let mut buffer = [0u8; 1];
        let result = block_on(SpiDevice::transaction(&mut sim, &mut [
            spi::Operation::Write(&[ADXL345_REG_DEVID]),
            spi::Operation::Read(&mut buffer),
        ]));
        assert_eq!(result, Err(SimError::Unsupported));

        block_on(SpiDevice::transaction(&mut sim, &mut [
            spi::Operation::Write(&[ADXL345_REG_DEVID | SPI_READ]),
            spi::Operation::Read(&mut buffer),
        ]))
        .unwrap();
        assert_eq!(buffer[0], ADXL345_DEVICE_ID);
    }

    #[test]
    fn test_spi_read_command_does_not_write() {
        let mut sim = SimAdxl345::new();

        block_on(SpiDevice::write(&mut sim, &[ADXL345_REG_THRESH_TAP | SPI_READ, 42])).unwrap();

        assert_eq!(sim.register(ADXL345_REG_THRESH_TAP), 0);
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn test_injected_failure_affects_one_transaction() {
        let mut sim = SimAdxl345::new();
        sim.fail_next();

        let mut buffer = [0u8; 1];
        let first = block_on(I2c::read(&mut sim, SimAdxl345::DEFAULT_ADDRESS, &mut buffer));
        let second = block_on(I2c::read(&mut sim, SimAdxl345::DEFAULT_ADDRESS, &mut buffer));

        assert_eq!(first, Err(SimError::Injected));
        assert_eq!(second, Ok(()));
    }
}
