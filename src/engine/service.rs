use std::time::Instant;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::bootstrap::AppState;
use crate::engine::sweep::{c_value_grid, optimal_c_value, run_sweep, SweepPoint};

#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub window_hours: u64,
    pub c_values: Vec<Decimal>,
    pub price_threshold: Decimal,
}

impl SweepRequest {
    pub fn from_defaults(state: &AppState) -> Self {
        Self {
            window_hours: state.window_hours,
            c_values: c_value_grid(state.c_min, state.c_max, state.c_steps),
            price_threshold: state.price_threshold,
        }
    }
}

pub struct FeeSweepReport {
    pub timestamp_utc: String,
    pub pool_id: String,
    pub swaps_fetched: usize,
    pub base_fee: Decimal,
    pub points: Vec<SweepPoint>,
    pub optimal: Option<SweepPoint>,
    pub recommended_action: String,
}

pub async fn run_fee_sweep(state: &AppState, request: SweepRequest) -> Result<FeeSweepReport> {
    let end_time = chrono::Utc::now().timestamp();
    let start_time = end_time - (request.window_hours as i64) * 60 * 60;

    let fetch_start = Instant::now();
    log::info!("Fetching pool {} and swaps in [{}, {}]", state.pool_id, start_time, end_time);

    let (snapshot, swaps) = tokio::try_join!(
        state.subgraph.fetch_pool_snapshot(&state.pool_id),
        state.subgraph.fetch_swaps(&state.pool_id, start_time, end_time, state.swap_page_size),
    )?;
    log::info!("Fetched {} swaps in {:?}", swaps.len(), fetch_start.elapsed());

    let template = state.build_template_pool(&snapshot)
        .context("Failed to seed template pool")?;
    let base_fee = template.base_fee();
    let swaps_fetched = swaps.len();

    let sweep_start = Instant::now();
    let points = tokio::task::spawn_blocking(move || {
        run_sweep(&template, &swaps, base_fee, &request.c_values, request.price_threshold)
    })
    .await
    .context("Sweep task panicked")?
    .context("Sweep failed")?;
    log::info!("Sweep over {} coefficients finished in {:?}", points.len(), sweep_start.elapsed());

    let optimal = optimal_c_value(&points).cloned();
    let recommended_action = match &optimal {
        Some(best) => format!("USE_C_VALUE_{:.4}", best.c_value),
        None => "NO_VALID_C_VALUE: increase the base fee or adjust the c range".to_string(),
    };

    Ok(FeeSweepReport {
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        pool_id: state.pool_id.clone(),
        swaps_fetched,
        base_fee,
        points,
        optimal,
        recommended_action,
    })
}
