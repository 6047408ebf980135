// Reciprocal counting: wait for a fixed number of input edges and measure
// the time they took, instead of counting edges in a fixed gate time. Event
// counts are powers of two so the frequency math stays shifts and one
// divide. Two counting paths exist in parallel: the edge interrupt times
// single events (slow), the hardware event counter times batches of
// 2^log2_events (fast). Whichever is selected publishes measurements; the
// other keeps running so a switch loses no window.

use crate::ticks::{Tick, NO_PERIOD};

/// Shortest acceptable measurement window. At 10_000 ticks a period carries
/// four significant decimal digits, which is what the display shows.
pub const MIN_PERIOD: Tick = 10_000;

/// Retune downward only above three times the minimum. The dead band keeps
/// a steady signal near a boundary from toggling between adjacent event
/// exponents every window.
pub const MAX_PERIOD_FACTOR: Tick = 3;

/// A slow-mode period below this means single-edge timing can no longer
/// keep up and the engine must bail to fast mode immediately.
pub const EMERGENCY_PERIOD: Tick = 100;

/// Largest supported event exponent (about one million events per window).
pub const MAX_LOG2_EVENTS: u8 = 20;

/// Polling cycles of fast-mode silence tolerated before falling back to
/// slow mode.
pub const WATCHDOG_TOP: i8 = 4;

/// Native width of the hardware event counter. Exponents above this are
/// counted with a software high-order wrap count on top of a full-scale
/// compare value.
const HW_COUNTER_BITS: u8 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Slow,
    Fast,
}

/// Compare configuration for one batch window of 2^log2 events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BatchThreshold {
    /// Compare register value; the counter fires after `compare + 1` events.
    pub compare: u16,
    /// Software wraps that must also elapse before the window is complete.
    pub wraps: u8,
}

impl BatchThreshold {
    pub fn for_events(log2: u8) -> Self {
        if log2 <= HW_COUNTER_BITS {
            Self {
                compare: ((1u32 << log2) - 1) as u16,
                wraps: 0,
            }
        } else {
            Self {
                compare: u16::MAX,
                wraps: ((1u16 << (log2 - HW_COUNTER_BITS)) - 1) as u8,
            }
        }
    }
}

/// Hardware operations the engine needs. The firmware implements this over
/// the timer and external-interrupt registers; tests implement it over plain
/// state. All three are only ever called from interrupt context or inside a
/// critical section, so a handler never sees itself half-reconfigured.
pub trait CounterHw {
    fn set_batch_threshold(&mut self, threshold: BatchThreshold);
    fn zero_event_count(&mut self);
    fn set_edge_irq(&mut self, enabled: bool);
}

/// Per-mode measurement record. `period` and `log2_events` are the published
/// pair read by the polling loop; the rest is bookkeeping for the window in
/// progress.
#[derive(Clone, Copy)]
struct Counter {
    period: Tick,
    log2_events: u8,
    first_time: bool,
    current_log2_events: u8,
    prev_ticks: Tick,
}

impl Counter {
    const fn new(current_log2_events: u8) -> Self {
        Self {
            period: NO_PERIOD,
            log2_events: 0,
            first_time: true,
            current_log2_events,
            prev_ticks: 0,
        }
    }
}

/// The dual-mode measurement engine. Interrupt handlers drive `on_edge` and
/// `on_batch`; the main loop calls `poll` once per display cycle inside a
/// critical section.
pub struct Engine<H: CounterHw> {
    hw: H,
    slow: Counter,
    fast: Counter,
    mode: Mode,
    /// Software high-order count of compare events within the current
    /// window, used when the event exponent exceeds the counter width.
    wraps_seen: u8,
    wrap_target: u8,
    watchdog: i8,
}

impl<H: CounterHw> Engine<H> {
    /// Starts in slow mode with the batch counter primed for two events, so
    /// either path can take over as soon as the signal shows up.
    pub fn new(hw: H) -> Self {
        let mut engine = Self {
            hw,
            slow: Counter::new(0),
            fast: Counter::new(1),
            mode: Mode::Slow,
            wraps_seen: 0,
            wrap_target: 0,
            watchdog: WATCHDOG_TOP,
        };
        engine.program_batch(1);
        engine.hw.zero_event_count();
        engine.hw.set_edge_irq(true);
        engine
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Edge interrupt handler body: one input event in slow mode.
    ///
    /// Runs regardless of the selected mode while the edge interrupt is
    /// enabled. `log2_events` stays 0 here, one event per window.
    pub fn on_edge(&mut self, now: Tick) {
        if self.slow.first_time {
            // A period needs two edges.
            self.slow.first_time = false;
            self.slow.prev_ticks = now;
            return;
        }
        let period = now.wrapping_sub(self.slow.prev_ticks);
        self.slow.period = period;
        self.slow.prev_ticks = now;

        if period < EMERGENCY_PERIOD {
            // The batch handler only reacts at window boundaries, which is
            // too late when the frequency jumps up abruptly. The edge vector
            // outranks the timer vectors, so this handler still runs when
            // the input is saturating the controller.
            self.hw.set_edge_irq(false);
            self.fast = Counter::new(1);
            self.fast.prev_ticks = now;
            self.program_batch(1);
            self.hw.zero_event_count();
            self.mode = Mode::Fast;
        }
    }

    /// Batch compare handler body: 2^current_log2_events input events have
    /// elapsed (or one hardware-counter wrap of a longer window).
    pub fn on_batch(&mut self, now: Tick) {
        self.watchdog = WATCHDOG_TOP;

        if self.wraps_seen != self.wrap_target {
            // Window spans multiple hardware counter rounds; not done yet.
            self.wraps_seen = self.wraps_seen.wrapping_add(1);
            return;
        }
        self.wraps_seen = 0;

        if self.fast.first_time {
            self.fast.first_time = false;
            self.fast.prev_ticks = now;
            return;
        }

        let mut log2 = self.fast.current_log2_events;
        self.fast.log2_events = log2;
        let mut period = now.wrapping_sub(self.fast.prev_ticks);
        self.fast.period = period;
        self.fast.prev_ticks = now;

        // Retune the next window toward [MIN_PERIOD, 3*MIN_PERIOD],
        // doubling or halving the event count. The loops track the implied
        // period so one long window can move the exponent several steps.
        if period < MIN_PERIOD && log2 < MAX_LOG2_EVENTS {
            loop {
                log2 += 1;
                period *= 2;
                if period >= MIN_PERIOD || log2 == MAX_LOG2_EVENTS {
                    break;
                }
            }
            self.program_batch(log2);
            self.fast.current_log2_events = log2;
            // A window this short means the signal is far beyond what edge
            // timing can track; make sure fast mode is selected.
            self.hw.set_edge_irq(false);
            self.mode = Mode::Fast;
        } else if period > MAX_PERIOD_FACTOR * MIN_PERIOD && log2 > 1 {
            loop {
                log2 -= 1;
                period /= 2;
                if period <= MAX_PERIOD_FACTOR * MIN_PERIOD || log2 == 1 {
                    break;
                }
            }
            self.program_batch(log2);
            self.fast.current_log2_events = log2;
        }

        if self.mode == Mode::Fast {
            if period > MAX_PERIOD_FACTOR * MIN_PERIOD && log2 == 1 {
                // Even two events per window is too slow. Hand over to the
                // edge interrupt, seeding it with the estimated single-event
                // period so the display has something until the first edge
                // pair arrives.
                self.hw.set_edge_irq(true);
                self.slow.period = period / 2;
                self.slow.prev_ticks = now;
                self.slow.first_time = true;
                self.mode = Mode::Slow;
            }
        } else if self.slow.period < MIN_PERIOD {
            // The signal sped back up past what slow mode resolves well.
            self.hw.set_edge_irq(false);
            self.mode = Mode::Fast;
        }
    }

    /// Main-loop entry, once per display cycle under a critical section.
    /// Returns the published `(log2_events, period)` pair of the selected
    /// mode, then services the fast-activity watchdog.
    pub fn poll(&mut self) -> (u8, Tick) {
        let active = match self.mode {
            Mode::Slow => &self.slow,
            Mode::Fast => &self.fast,
        };
        let measurement = (active.log2_events, active.period);

        // The batch handler reloads the watchdog on every compare event; if
        // it underruns, fast mode has gone silent (a stopped signal fires no
        // completion that could notice itself) and only a forced fallback
        // recovers.
        let expired = self.watchdog < 0;
        self.watchdog = self.watchdog.saturating_sub(1);
        if expired && self.mode == Mode::Fast {
            self.watchdog = WATCHDOG_TOP;
            self.force_slow();
        }
        measurement
    }

    fn force_slow(&mut self) {
        self.hw.set_edge_irq(true);
        self.slow = Counter::new(0);
        self.mode = Mode::Slow;
        self.fast.first_time = true;
        self.fast.current_log2_events = 1;
        self.program_batch(1);
        self.hw.zero_event_count();
    }

    fn program_batch(&mut self, log2: u8) {
        let threshold = BatchThreshold::for_events(log2);
        self.wrap_target = threshold.wraps;
        self.wraps_seen = 0;
        self.hw.set_batch_threshold(threshold);
    }
}
