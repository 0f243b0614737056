use std::time::Duration;

use rust_decimal::Decimal;

use crate::chain::subgraph_client::SubgraphClient;
use crate::config::{Config, PositionSpec};
use crate::math::pool::{Pool, PoolError};
use crate::math::tick_math::price_to_tick;
use crate::models::PoolSnapshot;

/// A configured LP position resolved to ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionPlan {
    pub lower_tick: i32,
    pub upper_tick: i32,
    pub liquidity: Decimal,
}

pub struct AppState {
    pub subgraph: SubgraphClient,
    pub pool_id: String,
    pub positions: Vec<PositionPlan>,

    // Sweep defaults (overridable per request)
    pub window_hours: u64,
    pub swap_page_size: u32,
    pub c_min: Decimal,
    pub c_max: Decimal,
    pub c_steps: usize,
    pub price_threshold: Decimal,
}

pub fn resolve_positions(specs: &[PositionSpec]) -> Result<Vec<PositionPlan>, String> {
    specs
        .iter()
        .map(|spec| {
            let lower_tick = price_to_tick(spec.lower_price)
                .ok_or_else(|| format!("no tick for price {}", spec.lower_price))?;
            let upper_tick = price_to_tick(spec.upper_price)
                .ok_or_else(|| format!("no tick for price {}", spec.upper_price))?;
            Ok(PositionPlan { lower_tick, upper_tick, liquidity: spec.liquidity })
        })
        .collect()
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let subgraph = SubgraphClient::new(
            config.subgraph_url.clone(),
            Duration::from_secs(config.subgraph_timeout_secs),
        )?;
        let positions = resolve_positions(&config.lp_positions)?;

        for p in &positions {
            log::info!("LP position ticks [{}, {}) liquidity {}", p.lower_tick, p.upper_tick, p.liquidity);
        }

        Ok(AppState {
            subgraph,
            pool_id: config.pool_id.clone(),
            positions,
            window_hours: config.window_hours,
            swap_page_size: config.swap_page_size,
            c_min: config.c_min,
            c_max: config.c_max,
            c_steps: config.c_steps,
            price_threshold: config.price_threshold,
        })
    }

    /// Never-swapped pool seeded from `snapshot` plus the configured positions.
    pub fn build_template_pool(&self, snapshot: &PoolSnapshot) -> Result<Pool, PoolError> {
        build_template_pool(snapshot, &self.positions)
    }
}

pub fn build_template_pool(snapshot: &PoolSnapshot, positions: &[PositionPlan]) -> Result<Pool, PoolError> {
    let mut pool = Pool::from_snapshot(snapshot)?;
    for p in positions {
        pool.add_position(p.lower_tick, p.upper_tick, p.liquidity)?;
    }
    Ok(pool)
}
