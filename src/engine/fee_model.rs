// fee_model.rs
// ============================================================================
// Direction-asymmetric fee schedule driven by realised price impact.
//
// delta = (p_new - p_old) / p_old, computed as (s_new / s_old)^2 - 1 on sqrt prices.
//   delta >  threshold  -> buy pressure:  buy  = base + c*|delta|, sell = base - c*|delta|
//   delta < -threshold  -> sell pressure: sell = base + c*|delta|, buy  = base - c*|delta|
// A discounted side that would go negative falls back to the unadjusted base fee.
// Pressure only counts when it matches the trade: buy pressure on a ZeroForOne trade, sell
// pressure on a OneForZero trade. Anything else is charged the base fee on both sides.
//
// The chosen side's fee is handed to the pool as an *additive* adjustment on top of the pool's
// own tier rate, so the rate applied in a swap is base + selected fee.

use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::pool::SwapDirection;

/// Default relative move that triggers a fee skew (2%).
pub const DEFAULT_PRICE_THRESHOLD: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeeModelParams {
    pub base_fee: Decimal,
    pub c_value: Decimal,
    pub price_threshold: Decimal,
}

impl FeeModelParams {
    pub fn new(base_fee: Decimal, c_value: Decimal) -> Self {
        Self { base_fee, c_value, price_threshold: DEFAULT_PRICE_THRESHOLD }
    }

    pub fn with_threshold(mut self, price_threshold: Decimal) -> Self {
        self.price_threshold = price_threshold;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PricePressure { Buy, Sell, Neutral }

impl PricePressure {
    pub fn classify(delta: Decimal, threshold: Decimal) -> Self {
        if delta > threshold {
            PricePressure::Buy
        } else if delta < -threshold {
            PricePressure::Sell
        } else {
            PricePressure::Neutral
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirectionalFees {
    pub buy_fee: Decimal,
    pub sell_fee: Decimal,
}

impl DirectionalFees {
    /// ZeroForOne trades pay the buy side, OneForZero the sell side.
    pub fn for_direction(&self, direction: SwapDirection) -> Decimal {
        match direction {
            SwapDirection::ZeroForOne => self.buy_fee,
            SwapDirection::OneForZero => self.sell_fee,
        }
    }
}

/// Relative price change between two sqrt prices. Saturates if the ratio overflows.
pub fn price_delta(old_sqrt_price: Decimal, new_sqrt_price: Decimal) -> Decimal {
    new_sqrt_price
        .checked_div(old_sqrt_price)
        .and_then(|ratio| ratio.checked_mul(ratio))
        .map(|growth| growth - Decimal::ONE)
        .unwrap_or(Decimal::MAX)
}

#[inline]
fn discounted(base_fee: Decimal, skew: Decimal) -> Decimal {
    let fee = base_fee.saturating_sub(skew);
    if fee < Decimal::ZERO { base_fee } else { fee }
}

/// Pressure in the same direction as the trade, or `Neutral`.
pub fn trade_pressure(delta: Decimal, threshold: Decimal, direction: SwapDirection) -> PricePressure {
    match (PricePressure::classify(delta, threshold), direction) {
        (PricePressure::Buy, SwapDirection::ZeroForOne) => PricePressure::Buy,
        (PricePressure::Sell, SwapDirection::OneForZero) => PricePressure::Sell,
        _ => PricePressure::Neutral,
    }
}

pub fn directional_fees(params: &FeeModelParams, delta: Decimal, direction: SwapDirection) -> DirectionalFees {
    let base = params.base_fee;
    let skew = || params.c_value.saturating_mul(delta.abs());

    match trade_pressure(delta, params.price_threshold, direction) {
        PricePressure::Buy => {
            let skew = skew();
            DirectionalFees { buy_fee: base.saturating_add(skew), sell_fee: discounted(base, skew) }
        }
        PricePressure::Sell => {
            let skew = skew();
            DirectionalFees { buy_fee: discounted(base, skew), sell_fee: base.saturating_add(skew) }
        }
        PricePressure::Neutral => DirectionalFees { buy_fee: base, sell_fee: base },
    }
}

/// Returns the adjustment to pass to the pool and whether it had to be clamped.
/// A negative total (base + adjustment) is replaced by -base, i.e. a zero net fee.
pub fn guard_fee_adjustment(base_fee: Decimal, fee_adjustment: Decimal) -> (Decimal, bool) {
    if base_fee + fee_adjustment < Decimal::ZERO {
        (-base_fee, true)
    } else {
        (fee_adjustment, false)
    }
}
