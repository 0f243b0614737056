// Tick / price conversions on a Decimal grid
// ----------------------------------------------------------------------------
// price(tick) = 1.0001^tick, sqrt_price(tick) = 1.0001^(tick/2).
//
// Notes:
// - sqrt_price is built from |tick| bit by bit against precomputed powers of sqrt(1.0001),
//   the same decomposition TickMath.getSqrtRatioAtTick uses, then inverted for negative ticks.
// - Rounding rule: sqrt_price_to_tick returns the greatest tick whose sqrt price is <= the
//   input (floor). It is a binary search over tick_to_sqrt_price, so the round trip
//   sqrt_price_to_tick(tick_to_sqrt_price(t)) == t holds exactly on [MIN_TICK, MAX_TICK].
// - tick_to_price is only defined for |tick| <= PRICE_TICK_BOUND. Further out the squared
//   price runs past 28 significant digits (or the Decimal range) and neighbouring ticks
//   collapse onto the same value, so the strictly increasing property would break.
// - Q64.96 values do not fit a Decimal mantissa, they travel as U256 until converted here.

use primitive_types::U256;
use rust_decimal::{Decimal, MathematicalOps};

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Widest |tick| for which `tick_to_price` stays strictly increasing (price ~1e-20 .. ~1e20).
pub const PRICE_TICK_BOUND: i32 = 460_000;

const MAX_DECIMAL_SCALE: u32 = 28;
const Q96_SHIFT: usize = 96;

/// sqrt(1.0001)^(2^i) as (mantissa, scale), i = 0..19. Enough bits for |MAX_TICK|.
const SQRT_RATIO_STEPS: [(i128, u32); 20] = [
    (10000499987500624960940234170, 28),
    (10001000000000000000000000000, 28),
    (10002000100000000000000000000, 28),
    (10004000600040001000000000000, 28),
    (10008002800560070005600280008, 28),
    (10016012005601820436880091441, 28),
    (10032049649635980146665286908, 28),
    (10064202017276139201565339084, 28),
    (10128816224454510970780956319, 28),
    (10259291810877293436587086086, 28),
    (10525306846073389483865893704, 28),
    (11078208420399936138992158111, 28),
    (12272670180582004820505038151, 28),
    (15061843336134673881079559812, 28),
    (22685912468226448269256098593, 28),
    (51465062451603222225379917515, 28),
    (26486526531474198664033811813, 27),
    (70153608770248664495301748849, 26),
    (49215288234891103363368386178, 23),
    (24221445960434106565057179909, 17),
];

/// sqrt(1.0001^tick). Ticks outside [MIN_TICK, MAX_TICK] are clamped to the nearest bound.
pub fn tick_to_sqrt_price(tick: i32) -> Decimal {
    let tick = tick.clamp(MIN_TICK, MAX_TICK);
    let abs_tick = tick.unsigned_abs();

    let mut ratio = Decimal::ONE;
    for (bit, &(mantissa, scale)) in SQRT_RATIO_STEPS.iter().enumerate() {
        if abs_tick & (1u32 << bit) != 0 {
            // |MAX_TICK| tops out near 1.8e19, far inside the Decimal range
            ratio *= Decimal::from_i128_with_scale(mantissa, scale);
        }
    }

    if tick < 0 {
        Decimal::ONE / ratio
    } else {
        ratio
    }
}

/// Floor inverse of [`tick_to_sqrt_price`]. Values below the minimum sqrt price map to MIN_TICK.
pub fn sqrt_price_to_tick(sqrt_price: Decimal) -> i32 {
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if tick_to_sqrt_price(mid) <= sqrt_price { lo = mid; } else { hi = mid - 1; }
    }
    lo
}

/// 1.0001^tick, or `None` outside [-PRICE_TICK_BOUND, PRICE_TICK_BOUND].
pub fn tick_to_price(tick: i32) -> Option<Decimal> {
    if !(-PRICE_TICK_BOUND..=PRICE_TICK_BOUND).contains(&tick) {
        return None;
    }
    let sqrt_price = tick_to_sqrt_price(tick);
    sqrt_price.checked_mul(sqrt_price)
}

/// floor(log_1.0001(price)), clamped to the tick range. `None` for non-positive prices.
pub fn price_to_tick(price: Decimal) -> Option<i32> {
    if price <= Decimal::ZERO {
        return None;
    }
    price.sqrt().map(sqrt_price_to_tick)
}

/// Q64.96 fixed point -> Decimal, keeping as many fractional digits as the mantissa allows.
/// `None` when the integer part alone exceeds the 96-bit mantissa.
pub fn q96_to_decimal(value: U256) -> Option<Decimal> {
    for scale in (0..=MAX_DECIMAL_SCALE).rev() {
        let scaled = match value.checked_mul(U256::exp10(scale as usize)) {
            Some(v) => v,
            None => continue,
        };
        let quotient = scaled >> Q96_SHIFT;
        if quotient.bits() <= 96 {
            return Some(Decimal::from_i128_with_scale(quotient.as_u128() as i128, scale));
        }
    }
    None
}

/// Decimal -> Q64.96 (floored). `None` for negative input.
pub fn decimal_to_q96(value: Decimal) -> Option<U256> {
    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    let mantissa = U256::from(value.mantissa().unsigned_abs());
    let shifted = mantissa.checked_mul(U256::one() << Q96_SHIFT)?;
    Some(shifted / U256::exp10(value.scale() as usize))
}
