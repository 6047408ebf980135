// Event counting on two parallel paths. INT0 interrupts on individual
// falling edges for the slow path; TC5, clocked from the same signal on the
// T5 pin, counts batches of 2^n edges in CTC mode and fires its compare
// interrupt at each window boundary for the fast path. All policy lives in
// library::Engine; this module wires the engine's hardware seam to the
// registers and forwards the interrupts.
//
// INT0 has the highest vector priority of the three interrupts involved,
// so the edge handler still gets serviced when a fast input keeps the
// controller saturated. That is what makes the emergency switch in the
// engine reachable at all.

use avr_device::interrupt::Mutex;
use core::cell::RefCell;

use crate::timebase;
use library::{BatchThreshold, CounterHw, Engine, Tick};

static ENGINE: Mutex<RefCell<Option<Engine<BatchRegs>>>> = Mutex::new(RefCell::new(None));

/// Register level implementation of the engine's hardware seam. Only ever
/// used from interrupt context or inside a critical section, which is what
/// keeps a handler from seeing itself half reconfigured.
pub struct BatchRegs;

impl CounterHw for BatchRegs {
    fn set_batch_threshold(&mut self, threshold: BatchThreshold) {
        // The software wrap count in `threshold.wraps` stays engine side;
        // the hardware only sees the compare value.
        let tc5 = unsafe { &*arduino_hal::pac::TC5::ptr() };
        tc5.ocr5a.write(|w| unsafe { w.bits(threshold.compare) });
    }

    fn zero_event_count(&mut self) {
        let tc5 = unsafe { &*arduino_hal::pac::TC5::ptr() };
        tc5.tcnt5.write(|w| unsafe { w.bits(0) });
    }

    fn set_edge_irq(&mut self, enabled: bool) {
        // INT0 mask bit; all other external interrupts stay off.
        let exint = unsafe { &*arduino_hal::pac::EXINT::ptr() };
        exint.eimsk.write(|w| unsafe { w.bits(enabled as u8) });
    }
}

pub fn init(tc5: arduino_hal::pac::TC5, exint: arduino_hal::pac::EXINT) {
    // The conditioned input signal is inverted, so falling edges here are
    // rising edges of the measured signal. ISC01 selects falling edge for
    // INT0; the mask bit is managed by the engine.
    exint.eicra.write(|w| unsafe { w.bits(0b10) });

    // TC5 in CTC mode, clocked by falling edges on T5.
    tc5.tccr5a.write(|w| unsafe { w.bits(0) });
    tc5.tccr5b.write(|w| w.wgm5().bits(0b01).cs5().ext_falling());
    tc5.timsk5.write(|w| w.ocie5a().set_bit());
    // Drop any compare flag raised before setup finished.
    tc5.tifr5.write(|w| w.ocf5a().set_bit());

    avr_device::interrupt::free(|cs| {
        // Engine::new programs OCR5A, zeroes TCNT5 and unmasks INT0
        // through BatchRegs.
        ENGINE.borrow(cs).replace(Some(Engine::new(BatchRegs)));
    });
}

#[avr_device::interrupt(atmega2560)]
fn INT0() {
    avr_device::interrupt::free(|cs| {
        let now = timebase::ticks(cs);
        if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
            engine.on_edge(now);
        }
    });
}

#[avr_device::interrupt(atmega2560)]
fn TIMER5_COMPA() {
    avr_device::interrupt::free(|cs| {
        let now = timebase::ticks(cs);
        if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
            engine.on_batch(now);
        }
    });
}

/// Atomic snapshot of the latest completed measurement, `(log2_events,
/// period)`, plus one watchdog service tick. Called once per display cycle.
pub fn poll() -> (u8, Tick) {
    avr_device::interrupt::free(|cs| {
        match ENGINE.borrow(cs).borrow_mut().as_mut() {
            Some(engine) => engine.poll(),
            None => (0, 0),
        }
    })
}

#[cfg(feature = "debug")]
pub fn mode() -> library::Mode {
    avr_device::interrupt::free(|cs| {
        match ENGINE.borrow(cs).borrow_mut().as_mut() {
            Some(engine) => engine.mode(),
            None => library::Mode::Slow,
        }
    })
}
