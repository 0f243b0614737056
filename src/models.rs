use primitive_types::U256;
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::math::tick_math::q96_to_decimal;

/// Pool state as reported by the data source, used to seed a fresh `Pool`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolSnapshot {
    pub sqrt_price: Decimal,
    pub tick: i32,
    pub liquidity: Decimal,
    pub fee_tier: u32,
    pub token0_decimals: u8,
    pub token1_decimals: u8,
}

/// One historical trade. Amounts are signed from the pool's point of view:
/// positive = paid into the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRecord {
    pub timestamp: i64,
    pub amount0: Decimal,
    pub amount1: Decimal,
    pub sqrt_price_x96: U256, // pool sqrt price right after the trade
    pub tick: i32,
    pub log_index: u64,
}

impl SwapRecord {
    /// Post-trade sqrt price as a Decimal, `None` if it does not fit.
    pub fn sqrt_price(&self) -> Option<Decimal> {
        q96_to_decimal(self.sqrt_price_x96)
    }
}
