use driver::sim::SimAdxl345;

/// Simulated board: the accelerometer hangs off the I2C bus
pub struct SitlBoard {
    i2c: Option<SimAdxl345>,
}

impl SitlBoard {
    /// Create the board with an ADXL345 at `address`
    pub fn new(address: u8) -> Self {
        SitlBoard {
            i2c: Some(SimAdxl345::with_address(address)),
        }
    }

    pub fn name(&self) -> &str {
        "SITL"
    }

    /// Hand out the I2C bus, once
    pub fn take_i2c(&mut self) -> Option<SimAdxl345> {
        self.i2c.take()
    }
}
