use rocket::serde::{Deserialize, Serialize};

#[derive(Deserialize, rocket::FromForm)]
pub struct FeeSweepQuery {
    pub window_hours: Option<u64>,
    pub c_min: Option<f64>,
    pub c_max: Option<f64>,
    pub c_steps: Option<usize>,
    pub price_threshold: Option<f64>,
}

#[derive(Serialize)]
pub struct SweepPointDto {
    pub c_value: f64,
    pub negative_fee_count: u64,
    pub lp_returns: f64,
    pub avg_price_efficiency: f64,
    pub partial_fills: usize,
}

#[derive(Serialize)]
pub struct FeeSweepResponse {
    pub timestamp_utc: String,
    pub pool_id: String,
    pub swaps_fetched: usize,
    pub base_fee: f64,
    pub points: Vec<SweepPointDto>,
    pub optimal_c_value: Option<f64>,
    pub recommended_action: String,
}
