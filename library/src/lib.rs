#![no_std]

// Hardware independent half of the frequency counter: tick composition,
// the dual-mode measurement engine, the fixed point frequency math and the
// display formatting. Everything here runs and is tested on the host; the
// firmware crate supplies interrupts, registers and the actual panel.

pub mod counter;
pub mod display;
pub mod freq;
pub mod ticks;

pub use counter::{BatchThreshold, CounterHw, Engine, Mode};
pub use display::{FrequencyDisplay, Screen, COLUMNS};
pub use freq::{frequency_dhz, widen_exponent};
pub use ticks::{combine_ticks, Tick, NO_PERIOD};
