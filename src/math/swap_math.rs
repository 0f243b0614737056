// Constant-liquidity swap step
// ----------------------------------------------------------------------------
// Within one liquidity segment the reserves follow
//   amount0 = L * (sb - sa) / (sa * sb)
//   amount1 = L * (sb - sa)
// with sa < sb the sqrt prices bounding the move.
//
// Notes:
// - Amounts are truncated to whole token units.
// - An amount that does not fit a Decimal saturates to Decimal::MAX: the segment can absorb
//   whatever input is left. This only happens with sqrt prices near the tick extremes.

use rust_decimal::Decimal;

use super::pool::SwapDirection;

#[inline]
fn ordered(sqrt_a: Decimal, sqrt_b: Decimal) -> (Decimal, Decimal) {
    if sqrt_a < sqrt_b { (sqrt_a, sqrt_b) } else { (sqrt_b, sqrt_a) }
}

/// Token0 reserve change between two sqrt prices. Divides by sb before sa so the
/// product sa * sb never has to be formed (it underflows near MIN_TICK).
pub fn amount0_delta(sqrt_a: Decimal, sqrt_b: Decimal, liquidity: Decimal) -> Decimal {
    if liquidity.is_zero() { return Decimal::ZERO; }
    let (sa, sb) = ordered(sqrt_a, sqrt_b);
    if sa.is_zero() || sa == sb { return Decimal::ZERO; }

    (sb - sa)
        .checked_div(sb)
        .and_then(|fraction| liquidity.checked_mul(fraction))
        .and_then(|scaled| scaled.checked_div(sa))
        .map(|amount| amount.trunc())
        .unwrap_or(Decimal::MAX)
}

/// Token1 reserve change between two sqrt prices.
pub fn amount1_delta(sqrt_a: Decimal, sqrt_b: Decimal, liquidity: Decimal) -> Decimal {
    if liquidity.is_zero() { return Decimal::ZERO; }
    let (sa, sb) = ordered(sqrt_a, sqrt_b);
    if sa == sb { return Decimal::ZERO; }

    liquidity
        .checked_mul(sb - sa)
        .map(|amount| amount.trunc())
        .unwrap_or(Decimal::MAX)
}

/// Outcome of one bounded price movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapStep {
    /// Input consumed by this step, capped by the remaining input.
    pub amount_in: Decimal,
    /// Output released moving the price all the way to the target.
    pub amount_out: Decimal,
}

/// Amounts for moving from `sqrt_price_current` to `sqrt_price_target` at constant liquidity.
pub fn compute_swap_step(
    sqrt_price_current: Decimal,
    sqrt_price_target: Decimal,
    liquidity: Decimal,
    amount_remaining: Decimal,
    direction: SwapDirection,
) -> SwapStep {
    let (sqrt_a, sqrt_b) = match direction {
        SwapDirection::ZeroForOne => (sqrt_price_target, sqrt_price_current),
        SwapDirection::OneForZero => (sqrt_price_current, sqrt_price_target),
    };
    let amount0 = amount0_delta(sqrt_a, sqrt_b, liquidity);
    let amount1 = amount1_delta(sqrt_a, sqrt_b, liquidity);

    match direction {
        SwapDirection::ZeroForOne => SwapStep { amount_in: amount_remaining.min(amount0), amount_out: amount1 },
        SwapDirection::OneForZero => SwapStep { amount_in: amount_remaining.min(amount1), amount_out: amount0 },
    }
}
