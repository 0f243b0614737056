// sweep.rs
// ============================================================================
// Sweeps the fee-skew coefficient c over a grid. Each trial replays the same history against
// its own clone of a never-swapped template pool, so no state leaks between coefficients.

use rust_decimal::Decimal;

use crate::engine::fee_model::FeeModelParams;
use crate::engine::simulation::{simulate, SimulationError, SimulationResult};
use crate::math::pool::Pool;
use crate::models::SwapRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepPoint {
    pub c_value: Decimal,
    pub result: SimulationResult,
}

/// `steps` evenly spaced values from `min` to `max` inclusive.
pub fn c_value_grid(min: Decimal, max: Decimal, steps: usize) -> Vec<Decimal> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let intervals = Decimal::from(steps - 1);
            (0..steps)
                .map(|i| {
                    if i == steps - 1 {
                        max
                    } else {
                        min + (max - min) * Decimal::from(i) / intervals
                    }
                })
                .collect()
        }
    }
}

pub fn run_sweep(
    template: &Pool,
    swaps: &[SwapRecord],
    base_fee: Decimal,
    c_values: &[Decimal],
    price_threshold: Decimal,
) -> Result<Vec<SweepPoint>, SimulationError> {
    if c_values.is_empty() {
        return Err(SimulationError::EmptyParameterGrid);
    }

    let mut points = Vec::with_capacity(c_values.len());
    for &c_value in c_values {
        let mut pool = template.clone();
        let params = FeeModelParams::new(base_fee, c_value).with_threshold(price_threshold);
        let result = simulate(&mut pool, swaps, &params)?;

        log::info!(
            "c={:.2}: negative fees: {}, LP returns: {:.2}, price efficiency: {:.6}",
            c_value, result.negative_fee_count, result.total_lp_returns, result.avg_price_efficiency
        );
        points.push(SweepPoint { c_value, result });
    }
    Ok(points)
}

/// Highest LP return among coefficients that never needed the negative-fee clamp.
/// Earlier grid points win ties.
pub fn optimal_c_value(points: &[SweepPoint]) -> Option<&SweepPoint> {
    points
        .iter()
        .filter(|p| p.result.negative_fee_count == 0)
        .fold(None, |best: Option<&SweepPoint>, p| match best {
            Some(b) if p.result.total_lp_returns <= b.result.total_lp_returns => Some(b),
            _ => Some(p),
        })
}
