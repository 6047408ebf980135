/// Time is counted in ticks of the prescaled hardware timer. One tick is 64
/// cpu cycles; the counter wraps modulo 2^32 and all period math is
/// wrapping subtraction on this type.
pub type Tick = u32;

/// Stored in a counter that has not completed a measurement window yet.
/// A period this long computes to 0 dHz, which the display renders as
/// dashes, so no separate "invalid" flag is needed downstream.
pub const NO_PERIOD: Tick = Tick::MAX;

/// Combine the software overflow count with the live 8-bit hardware counter
/// into a single tick value.
///
/// The overflow interrupt may not have run yet when this is evaluated: if
/// the overflow flag is pending and the hardware counter has already wrapped
/// back to a small value, the overflow belongs to the count we are reading
/// and must be applied here. A pending flag together with `count == 255`
/// means the wrap happened after the counter was sampled, and the plain
/// overflow count is the right one.
///
/// Callers must hold interrupts disabled across sampling all three inputs.
pub fn combine_ticks(overflows: u32, count: u8, overflow_pending: bool) -> Tick {
    let mut high = overflows;
    if overflow_pending && count < 255 {
        high = high.wrapping_add(1);
    }
    (high << 8) | count as Tick
}
