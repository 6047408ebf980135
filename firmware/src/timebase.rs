// Time keeping. TC0 free runs from the system clock through the /64
// prescaler and we count its overflows; everything downstream works in
// ticks and only converts to a frequency when the display needs one.
//
// ╔═══════════╦═══════════════╦═══════════════════╗
// ║ PRESCALER ║   TICK RATE   ║ Overflow Interval ║
// ╠═══════════╬═══════════════╬═══════════════════╣
// ║        64 ║ 250000 tick/s ║            1024us ║
// ╚═══════════╩═══════════════╩═══════════════════╝

use avr_device::interrupt::CriticalSection;
use library::{combine_ticks, Tick};
use portable_atomic::{AtomicU32, Ordering};

pub const CPU_FREQ: u32 = 16_000_000;
pub const PRESCALER: u32 = 64;
pub const TICK_RATE: u32 = CPU_FREQ / PRESCALER;

static OVERFLOWS: AtomicU32 = AtomicU32::new(0);

pub fn init(tc0: arduino_hal::pac::TC0) {
    // TCCR0A stays at its reset value: normal (free running) mode.
    tc0.tccr0b.write(|w| w.cs0().prescale_64());
    tc0.timsk0.write(|w| w.toie0().set_bit());
}

#[avr_device::interrupt(atmega2560)]
fn TIMER0_OVF() {
    OVERFLOWS.fetch_add(1, Ordering::Relaxed);
}

/// Current tick count. The critical section token proves interrupts are
/// disabled: the value combines the overflow count with the live hardware
/// counter and a racing overflow interrupt would tear it. A pending
/// overflow that has not been serviced yet is folded in by combine_ticks.
pub fn ticks(_cs: CriticalSection) -> Tick {
    let tc0 = unsafe { &*arduino_hal::pac::TC0::ptr() };
    let overflows = OVERFLOWS.load(Ordering::Relaxed);
    let count = tc0.tcnt0.read().bits();
    let pending = tc0.tifr0.read().tov0().bit_is_set();
    combine_ticks(overflows, count, pending)
}
