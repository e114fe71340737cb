use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::mode::Async;
use embassy_stm32::time::Hertz;
use embassy_stm32::{bind_interrupts, peripherals, Peripherals};

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

#[derive(Default)]
pub struct FlightControllerBoard {}

impl FlightControllerBoard {
    pub fn new() -> Self {
        FlightControllerBoard {}
    }

    pub fn name(&self) -> &str {
        "MatekF405TE"
    }

    /// I2C1 on the external pads: PB8 (SCL), PB9 (SDA)
    pub fn accelerometer_i2c(&self, p: Peripherals) -> I2c<'static, Async> {
        I2c::new(
            p.I2C1,
            p.PB8,
            p.PB9,
            Irqs,
            p.DMA1_CH6,
            p.DMA1_CH0,
            Hertz(400_000),
            Default::default(),
        )
    }
}
