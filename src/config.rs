use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Mainnet USDC/WETH 0.3% pool.
const DEFAULT_POOL_ID: &str = "0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8";
const DEFAULT_LP_POSITIONS: &str = "1500:2500:1000000000000000000,1800:2200:2000000000000000000";

/// Simulated LP range expressed in prices; converted to ticks at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSpec {
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub liquidity: Decimal,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub subgraph_url: String,
    pub pool_id: String,
    pub port: u16,
    pub subgraph_timeout_secs: u64,

    // History window
    pub window_hours: u64,
    pub swap_page_size: u32,

    // Sweep grid
    pub c_min: Decimal,
    pub c_max: Decimal,
    pub c_steps: usize,
    pub price_threshold: Decimal,

    pub lp_positions: Vec<PositionSpec>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn env_decimal(key: &str, default: &str) -> Result<Decimal, Box<dyn std::error::Error>> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Decimal::from_str(raw.trim()).map_err(|e| format!("{} is not a decimal ({}): {}", key, raw, e).into())
}

/// Parses `lower:upper:liquidity` entries separated by commas.
pub fn parse_position_specs(raw: &str) -> Result<Vec<PositionSpec>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(format!("position '{}' must be lower_price:upper_price:liquidity", entry));
            }
            let field = |s: &str| Decimal::from_str(s).map_err(|e| format!("position '{}': {}", entry, e));
            let spec = PositionSpec {
                lower_price: field(parts[0])?,
                upper_price: field(parts[1])?,
                liquidity: field(parts[2])?,
            };
            if spec.lower_price <= Decimal::ZERO || spec.lower_price >= spec.upper_price {
                return Err(format!("position '{}' needs 0 < lower_price < upper_price", entry));
            }
            Ok(spec)
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load configuration files (secrets first, then sweep settings)
        dotenv::from_filename("secrets.env").ok();
        dotenv::from_filename("config/sweep.env").ok();
        dotenv::dotenv().ok();

        let subgraph_url = env::var("SUBGRAPH_URL")
            .map_err(|_| "SUBGRAPH_URL must be set")?;
        url::Url::parse(&subgraph_url)
            .map_err(|e| format!("SUBGRAPH_URL is not a valid URL: {}", e))?;

        let lp_positions = parse_position_specs(
            &env::var("LP_POSITIONS").unwrap_or_else(|_| DEFAULT_LP_POSITIONS.to_string()),
        )?;

        let config = Config {
            subgraph_url,
            pool_id: env::var("POOL_ID").unwrap_or_else(|_| DEFAULT_POOL_ID.to_string()),
            port: env_or("PORT", 8000),
            subgraph_timeout_secs: env_or("SUBGRAPH_TIMEOUT_SECS", 10),

            window_hours: env_or("WINDOW_HOURS", 24),
            swap_page_size: env_or("SWAP_PAGE_SIZE", 1000),

            c_min: env_decimal("C_MIN", "0.1")?,
            c_max: env_decimal("C_MAX", "2.0")?,
            c_steps: env_or("C_STEPS", 20),
            price_threshold: env_decimal("PRICE_THRESHOLD", "0.02")?,

            lp_positions,
        };

        if config.c_steps == 0 {
            return Err("C_STEPS must be at least 1".into());
        }
        Ok(config)
    }
}
