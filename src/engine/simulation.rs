// simulation.rs
// ============================================================================
// Replays a historical swap stream against a pool under the dynamic fee model.
//
// Per record, in order:
//   1. direction from sign(amount0), size = |amount0| or |amount1|
//   2. delta between the pool's current price and the record's post-trade price
//   3. directional fees from delta when the pressure matches the trade, pick the trade's side
//   4. clamp a negative total fee to zero and count it
//   5. execute the swap, accumulate LP returns and |delta|
//
// The pool is mutated in place. Independent runs need independent pools (see sweep.rs).

use rust_decimal::Decimal;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::fee_model::{directional_fees, guard_fee_adjustment, price_delta, FeeModelParams};
use crate::math::pool::{Pool, PoolError, SwapDirection};
use crate::models::SwapRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("swap sequence is empty; average price efficiency is undefined")]
    EmptySwapSequence,
    #[error("swap record {index} is invalid: {reason}")]
    InvalidSwapRecord { index: usize, reason: String },
    #[error("parameter grid is empty")]
    EmptyParameterGrid,
    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationResult {
    pub negative_fee_count: u64,
    pub total_lp_returns: Decimal,
    pub avg_price_efficiency: Decimal,
    pub swap_count: usize,
    pub total_amount_in: Decimal,
    pub partial_fills: usize,
}

pub fn simulate(
    pool: &mut Pool,
    swaps: &[SwapRecord],
    params: &FeeModelParams,
) -> Result<SimulationResult, SimulationError> {
    if swaps.is_empty() {
        return Err(SimulationError::EmptySwapSequence);
    }

    let base_fee = params.base_fee;
    let mut result = SimulationResult::default();
    let mut price_efficiency = Decimal::ZERO;

    for (index, record) in swaps.iter().enumerate() {
        let direction = SwapDirection::from_amount0(record.amount0);
        let amount_in = match direction {
            SwapDirection::ZeroForOne => record.amount0.abs(),
            SwapDirection::OneForZero => record.amount1.abs(),
        };

        let new_sqrt_price = record.sqrt_price().ok_or_else(|| SimulationError::InvalidSwapRecord {
            index,
            reason: format!("sqrtPriceX96 {} does not fit a decimal", record.sqrt_price_x96),
        })?;
        let delta = price_delta(pool.sqrt_price(), new_sqrt_price);

        let fees = directional_fees(params, delta, direction);
        let (fee_adjustment, clamped) = guard_fee_adjustment(base_fee, fees.for_direction(direction));
        if clamped {
            result.negative_fee_count += 1;
            log::warn!(
                "swap {} (ts {}, log {}): negative fee {} clamped to zero",
                index, record.timestamp, record.log_index, base_fee + fees.for_direction(direction)
            );
        }

        let swap = pool.swap(amount_in, direction, fee_adjustment)?;
        if swap.is_partial(amount_in) {
            result.partial_fills += 1;
        }

        let lp_return = swap.amount_in.saturating_mul(base_fee + fee_adjustment);
        result.total_lp_returns = result.total_lp_returns.saturating_add(lp_return);
        result.total_amount_in = result.total_amount_in.saturating_add(swap.amount_in);
        price_efficiency = price_efficiency.saturating_add(delta.abs());

        log::debug!(
            "swap {}: {:?} in={} filled={} delta={} fees(buy={}, sell={}) adj={}",
            index, direction, amount_in, swap.amount_in, delta, fees.buy_fee, fees.sell_fee, fee_adjustment
        );
    }

    result.swap_count = swaps.len();
    result.avg_price_efficiency = price_efficiency / Decimal::from(swaps.len());
    Ok(result)
}
