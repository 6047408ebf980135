// EA DOG-M081 character display (ST7036 controller, 1 line by 8 chars) on
// a bit banged SPI plus register select line. Generic over embedded-hal
// output pins, so a different panel or board only needs this file swapped.

use embedded_hal::digital::v2::OutputPin;
use library::Screen;

// For 5V operation.
const CONTRAST: u8 = 0x28;

pub struct DogLcd<SI, CLK, CSB, RS> {
    si: SI,
    clk: CLK,
    csb: CSB,
    rs: RS,
}

impl<SI, CLK, CSB, RS> DogLcd<SI, CLK, CSB, RS>
where
    SI: OutputPin,
    CLK: OutputPin,
    CSB: OutputPin,
    RS: OutputPin,
{
    pub fn new(si: SI, clk: CLK, csb: CSB, rs: RS) -> Self {
        let mut lcd = Self { si, clk, csb, rs };
        let _ = lcd.si.set_high();
        let _ = lcd.clk.set_high();
        let _ = lcd.csb.set_high();
        let _ = lcd.rs.set_high();
        lcd
    }

    /// One time bring up. Command values and execution times follow the
    /// ST7036 datasheet flow for the single line M081 model.
    pub fn init(&mut self) {
        // The commands that follow live in instruction set 1.
        self.instruction_set(1);
        // Bias 1/4.
        self.command(0x1d, 30);
        // Contrast, low and high nibbles.
        self.command(0x50 | (CONTRAST >> 4), 30);
        self.command(0x70 | (CONTRAST & 0x0f), 30);
        // Amplification ratio for the follower control.
        self.command(0x69, 30);
        self.instruction_set(0);
        // Clear the display; the only slow command in the set.
        self.command(0x01, 1100);
        // Cursor left to right, no autoscroll.
        self.command(0x04 | 0x02, 30);
        // Display on, no cursor, no blink.
        self.command(0x08 | 0x04, 30);
    }

    /// Function set; the M081 template is 0x30, `set` is 0..=3.
    fn instruction_set(&mut self, set: u8) {
        self.command(0x30 | set, 30);
    }

    fn command(&mut self, value: u8, execution_us: u32) {
        let _ = self.rs.set_low();
        self.execute(value, execution_us);
    }

    fn execute(&mut self, value: u8, execution_us: u32) {
        self.transfer(value);
        arduino_hal::delay_us(execution_us);
    }

    fn transfer(&mut self, value: u8) {
        let _ = self.csb.set_low();
        for bit in (0..8).rev() {
            if value & (1 << bit) != 0 {
                let _ = self.si.set_high();
            } else {
                let _ = self.si.set_low();
            }
            // Data is latched on the rising clock edge.
            let _ = self.clk.set_low();
            arduino_hal::delay_us(1);
            let _ = self.clk.set_high();
            arduino_hal::delay_us(1);
        }
        let _ = self.csb.set_high();
    }
}

impl<SI, CLK, CSB, RS> Screen for DogLcd<SI, CLK, CSB, RS>
where
    SI: OutputPin,
    CLK: OutputPin,
    CSB: OutputPin,
    RS: OutputPin,
{
    fn home(&mut self) {
        // Set DDRAM address 0.
        self.command(0x80, 30);
    }

    fn put_char(&mut self, c: u8) {
        let _ = self.rs.set_high();
        self.execute(c, 30);
    }
}
