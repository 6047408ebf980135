#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

// Reciprocal frequency counter. The inverted square wave input feeds both
// D21 (INT0, slow edge path) and D47 (T5, fast batch path); the measured
// frequency comes out on an 8 character DOG-M081 panel a few times a
// second. All measurement policy and formatting is in the library crate;
// this crate is interrupts, registers and wiring.

mod events;
mod lcd;
mod timebase;

use panic_halt as _;

use lcd::DogLcd;
use library::{frequency_dhz, FrequencyDisplay};
use timebase::TICK_RATE;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);

    // Wait for stable power before touching the panel.
    arduino_hal::delay_ms(100);

    // Both measurement inputs idle as floating inputs; the signal
    // conditioning stage in front of them drives the levels.
    pins.d21.into_floating_input();
    pins.d47.into_floating_input();

    timebase::init(dp.TC0);
    events::init(dp.TC5, dp.EXINT);
    unsafe {
        avr_device::interrupt::enable();
    }

    let mut serial = arduino_hal::default_serial!(dp, pins, 57600);
    ufmt::uwriteln!(&mut serial, "freq counter up, {} ticks/s", TICK_RATE).unwrap();

    let mut panel = DogLcd::new(
        pins.d51.into_output(), // SI
        pins.d52.into_output(), // CLK
        pins.d53.into_output(), // CSB
        pins.d49.into_output(), // RS
    );
    panel.init();
    let mut display = FrequencyDisplay::new(panel);

    loop {
        arduino_hal::delay_ms(100);

        // Snapshot of the latest completed window; poll also services the
        // fast mode watchdog.
        let (log2_events, period) = events::poll();
        let freq = frequency_dhz::<TICK_RATE>(log2_events, period);

        #[cfg(feature = "debug")]
        {
            let mode = match events::mode() {
                library::Mode::Slow => 's',
                library::Mode::Fast => 'f',
            };
            ufmt::uwriteln!(&mut serial, "{} n={} p={} f={}", mode, log2_events, period, freq)
                .unwrap();
        }

        display.show(freq);
    }
}
