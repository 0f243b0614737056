use std::sync::Arc;

use num_traits::{FromPrimitive, ToPrimitive};
use rocket::{get, State};
use rust_decimal::Decimal;

use crate::bootstrap::AppState;
use crate::engine::service::{run_fee_sweep, SweepRequest};
use crate::engine::sweep::{c_value_grid, SweepPoint};
use crate::web::dto::{FeeSweepQuery, FeeSweepResponse, SweepPointDto};

const MAX_WINDOW_HOURS: u64 = 24 * 30;
const MAX_C_STEPS: usize = 200;

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn point_dto(point: &SweepPoint) -> SweepPointDto {
    SweepPointDto {
        c_value: to_f64(point.c_value),
        negative_fee_count: point.result.negative_fee_count,
        lp_returns: to_f64(point.result.total_lp_returns),
        avg_price_efficiency: to_f64(point.result.avg_price_efficiency),
        partial_fills: point.result.partial_fills,
    }
}

/// Query overrides on top of the configured defaults.
fn sweep_request(query: &FeeSweepQuery, state: &AppState) -> SweepRequest {
    let defaults = SweepRequest::from_defaults(state);
    let decimal = |v: Option<f64>, fallback: Decimal| v.and_then(Decimal::from_f64).unwrap_or(fallback);

    let c_min = decimal(query.c_min, state.c_min);
    let c_max = decimal(query.c_max, state.c_max).max(c_min);
    let c_steps = query.c_steps.unwrap_or(state.c_steps).clamp(1, MAX_C_STEPS);

    SweepRequest {
        window_hours: query.window_hours.unwrap_or(defaults.window_hours).clamp(1, MAX_WINDOW_HOURS),
        c_values: c_value_grid(c_min, c_max, c_steps),
        price_threshold: decimal(query.price_threshold, defaults.price_threshold).abs(),
    }
}

#[get("/api/v1/fee-sweep?<query..>")]
pub async fn fee_sweep(
    query: FeeSweepQuery,
    app_state: &State<Arc<AppState>>,
) -> rocket::serde::json::Json<FeeSweepResponse> {
    let request = sweep_request(&query, app_state);

    match run_fee_sweep(app_state, request).await {
        Ok(report) => {
            rocket::serde::json::Json(FeeSweepResponse {
                timestamp_utc: report.timestamp_utc,
                pool_id: report.pool_id,
                swaps_fetched: report.swaps_fetched,
                base_fee: to_f64(report.base_fee),
                points: report.points.iter().map(point_dto).collect(),
                optimal_c_value: report.optimal.map(|p| to_f64(p.c_value)),
                recommended_action: report.recommended_action,
            })
        }
        Err(e) => {
            log::error!("Fee sweep failed: {:#}", e);
            rocket::serde::json::Json(FeeSweepResponse {
                timestamp_utc: chrono::Utc::now().to_rfc3339(),
                pool_id: app_state.pool_id.clone(),
                swaps_fetched: 0,
                base_fee: 0.0,
                points: Vec::new(),
                optimal_c_value: None,
                recommended_action: format!("ERROR: {}", e),
            })
        }
    }
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
