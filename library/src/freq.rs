use crate::ticks::Tick;

/// Smallest event exponent whose scaled numerator `(10 * tick_rate) << n`
/// no longer fits in a u32. Below this the whole division runs in 32 bits,
/// which is several times faster than 64-bit math on an 8-bit core.
///
/// Derived from the tick rate instead of hard-coded: at 250_000 ticks/s
/// (16 MHz / 64) the numerator for n = 10 is 2_560_000_000 and still fits,
/// n = 11 does not, so this returns 11. A 20 MHz build (312_500 ticks/s)
/// lands on the same threshold.
pub const fn widen_exponent(tick_rate: u32) -> u8 {
    let base = 10 * tick_rate as u64;
    let mut n: u8 = 0;
    while n < 20 && (base << (n + 1)) <= u32::MAX as u64 {
        n += 1;
    }
    n + 1
}

/// Frequency of the measurement `(log2_events, period)` in tenths of a Hz.
///
/// The signal made 2^log2_events full cycles in `period` ticks, so the
/// frequency in dHz is `10 * TICK_RATE * 2^log2_events / period`, rounded
/// to the nearest integer by adding half the divisor first.
///
/// Returns 0 both for a zero period (no window measured, and the division
/// would trap) and for periods too long to reach a single dHz; the display
/// shows dashes for 0.
pub fn frequency_dhz<const TICK_RATE: u32>(log2_events: u8, period: Tick) -> u32 {
    if period == 0 {
        return 0;
    }
    let base = 10 * TICK_RATE;
    if log2_events < widen_exponent(TICK_RATE) {
        let numerator = base << log2_events;
        match numerator.checked_add(period / 2) {
            Some(rounded) => rounded / period,
            // The rounding addend alone can push past u32 when the period is
            // enormous; the result is 0 or 1 dHz, computed wide.
            None => wide_quotient(base, log2_events, period),
        }
    } else {
        wide_quotient(base, log2_events, period)
    }
}

fn wide_quotient(base: u32, log2_events: u8, period: Tick) -> u32 {
    let numerator = (base as u64) << log2_events;
    ((numerator + (period as u64) / 2) / period as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tick rate of a 20 MHz part with the /64 prescaler; keeps the expected
    // values round and exercises the same widening threshold as 16 MHz.
    const RATE: u32 = 312_500;

    #[test]
    fn widen_threshold_derivation() {
        assert_eq!(widen_exponent(312_500), 11);
        assert_eq!(widen_exponent(250_000), 11);
        // One decade slower clock buys three more narrow exponents.
        assert_eq!(widen_exponent(31_250), 14);
    }

    #[test]
    fn one_tenth_hz() {
        // One cycle in ten seconds.
        assert_eq!(frequency_dhz::<RATE>(0, 3_125_000), 1);
    }

    #[test]
    fn fast_batch_32khz() {
        // 1024 cycles in 10_000 ticks (32 ms).
        assert_eq!(frequency_dhz::<RATE>(10, 10_000), 320_000);
    }

    #[test]
    fn zero_period_is_sentinel() {
        assert_eq!(frequency_dhz::<RATE>(0, 0), 0);
        assert_eq!(frequency_dhz::<RATE>(20, 0), 0);
    }

    #[test]
    fn unmeasured_counter_reads_zero() {
        assert_eq!(frequency_dhz::<RATE>(0, u32::MAX), 0);
    }

    #[test]
    fn rounding_is_half_up() {
        // 312_500 * 10 / 4_000_000 = 0.78125 dHz, rounds to 1.
        assert_eq!(frequency_dhz::<RATE>(0, 4_000_000), 1);
        // 312_500 * 10 / 7_000_000 = 0.446 dHz, rounds to 0.
        assert_eq!(frequency_dhz::<RATE>(0, 7_000_000), 0);
    }

    #[test]
    fn narrow_path_overflow_falls_back() {
        // Numerator fits u32 but numerator + period/2 does not; the result
        // must still be the correctly rounded tiny value, not a wrapped one.
        let period = u32::MAX - 2;
        assert_eq!(frequency_dhz::<RATE>(10, period), 1);
    }

    #[test]
    fn paths_agree_at_the_threshold() {
        // n = 10 runs narrow, n = 11 runs wide; doubling the event count at
        // the same period must exactly double the result.
        let narrow = frequency_dhz::<RATE>(10, 20_000);
        let wide = frequency_dhz::<RATE>(11, 20_000);
        assert_eq!(wide, 2 * narrow);
    }

    #[test]
    fn max_exponent_window() {
        // 2^20 events over ~33.5 seconds of ticks.
        let f = frequency_dhz::<RATE>(20, 10_485_760);
        assert_eq!(f, 312_500);
    }

    #[test]
    fn round_trip_reconstructs_period() {
        for &(n, p) in &[(0u8, 31_250u32), (4, 12_345), (10, 10_007), (12, 29_999), (20, 10_485_760)] {
            let f = frequency_dhz::<RATE>(n, p);
            let numerator = (10 * RATE as u64) << n;
            // f = round(numerator / p) means |f*p - numerator| <= p/2.
            let diff = (f as u64 * p as u64).abs_diff(numerator);
            assert!(diff * 2 <= p as u64 + 1, "n={} p={} f={} diff={}", n, p, f, diff);
        }
    }
}
