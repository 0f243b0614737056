// Concentrated-liquidity pool state + exact-input swap loop
// ----------------------------------------------------------------------------
// A pool holds the current sqrt price, the tick derived from it, the liquidity active at that
// tick, and the positions contributing it. Swaps walk position boundaries one step at a time.
//
// Notes:
// - `liquidity` is a cached aggregate over positions with lower <= tick < upper. It is refreshed
//   after every price movement and cannot be set directly.
// - Positions are frozen once the pool has swapped; reuse a cloned template pool per run.
// - Running out of liquidity or hitting the tick limit is a partial fill, not an error.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::swap_math::compute_swap_step;
use super::tick_math::{sqrt_price_to_tick, tick_to_sqrt_price, MAX_TICK, MIN_TICK};
use crate::models::PoolSnapshot;

const FEE_DENOMINATOR_PPM: u32 = 1_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("invalid tick range [{lower}, {upper}): lower must be below upper")]
    InvalidTickRange { lower: i32, upper: i32 },
    #[error("tick {0} is outside [-887272, 887272]")]
    TickOutOfRange(i32),
    #[error("liquidity must be non-negative, got {0}")]
    NegativeLiquidity(Decimal),
    #[error("sqrt price must be positive, got {0}")]
    NonPositiveSqrtPrice(Decimal),
    #[error("swap amount must be non-negative, got {0}")]
    NegativeAmountIn(Decimal),
    #[error("positions cannot be added after the pool has executed a swap")]
    PositionsFrozen,
}

/// Trade direction: ZeroForOne sells token0 for token1 (price falls), OneForZero the reverse.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SwapDirection { ZeroForOne, OneForZero }

impl SwapDirection {
    /// Historical swaps carry signed amounts; a positive amount0 means token0 was paid in.
    pub fn from_amount0(amount0: Decimal) -> Self {
        if amount0 > Decimal::ZERO { SwapDirection::ZeroForOne } else { SwapDirection::OneForZero }
    }

    #[inline]
    pub fn is_zero_for_one(self) -> bool {
        matches!(self, SwapDirection::ZeroForOne)
    }

    fn sqrt_price_limit(self) -> Decimal {
        match self {
            SwapDirection::ZeroForOne => tick_to_sqrt_price(MIN_TICK),
            SwapDirection::OneForZero => tick_to_sqrt_price(MAX_TICK),
        }
    }
}

/// Liquidity over the half-open tick range [lower_tick, upper_tick).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LiquidityPosition {
    pub lower_tick: i32,
    pub upper_tick: i32,
    pub liquidity: Decimal,
}

impl LiquidityPosition {
    pub fn new(lower_tick: i32, upper_tick: i32, liquidity: Decimal) -> Result<Self, PoolError> {
        for tick in [lower_tick, upper_tick] {
            if !(MIN_TICK..=MAX_TICK).contains(&tick) {
                return Err(PoolError::TickOutOfRange(tick));
            }
        }
        if lower_tick >= upper_tick {
            return Err(PoolError::InvalidTickRange { lower: lower_tick, upper: upper_tick });
        }
        if liquidity.is_sign_negative() && !liquidity.is_zero() {
            return Err(PoolError::NegativeLiquidity(liquidity));
        }
        Ok(Self { lower_tick, upper_tick, liquidity })
    }

    #[inline]
    pub fn contains(&self, tick: i32) -> bool {
        self.lower_tick <= tick && tick < self.upper_tick
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapResult {
    /// Input consumed across all steps; below the requested amount on a partial fill.
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub fee_amount: Decimal,
    pub steps: usize,
    pub sqrt_price: Decimal,
    pub tick: i32,
    pub liquidity: Decimal,
}

impl SwapResult {
    pub fn is_partial(&self, requested: Decimal) -> bool {
        self.amount_in < requested
    }
}

#[derive(Clone, Debug)]
pub struct Pool {
    sqrt_price: Decimal,
    tick: i32,
    liquidity: Decimal,
    fee_tier: u32, // ppm
    token0_decimals: u8,
    token1_decimals: u8,
    positions: Vec<LiquidityPosition>,
    boundaries: BTreeMap<i32, usize>, // tick -> number of position edges there
    frozen: bool,
}

impl Pool {
    pub fn new(
        sqrt_price: Decimal,
        tick: i32,
        liquidity: Decimal,
        fee_tier: u32,
        token0_decimals: u8,
        token1_decimals: u8,
    ) -> Result<Self, PoolError> {
        if sqrt_price <= Decimal::ZERO {
            return Err(PoolError::NonPositiveSqrtPrice(sqrt_price));
        }
        if !(MIN_TICK..=MAX_TICK).contains(&tick) {
            return Err(PoolError::TickOutOfRange(tick));
        }
        if liquidity.is_sign_negative() && !liquidity.is_zero() {
            return Err(PoolError::NegativeLiquidity(liquidity));
        }
        Ok(Self {
            sqrt_price,
            tick,
            liquidity,
            fee_tier,
            token0_decimals,
            token1_decimals,
            positions: Vec::new(),
            boundaries: BTreeMap::new(),
            frozen: false,
        })
    }

    pub fn from_snapshot(snapshot: &PoolSnapshot) -> Result<Self, PoolError> {
        Self::new(
            snapshot.sqrt_price,
            snapshot.tick,
            snapshot.liquidity,
            snapshot.fee_tier,
            snapshot.token0_decimals,
            snapshot.token1_decimals,
        )
    }

    pub fn sqrt_price(&self) -> Decimal { self.sqrt_price }
    pub fn tick(&self) -> i32 { self.tick }
    pub fn liquidity(&self) -> Decimal { self.liquidity }
    pub fn fee_tier(&self) -> u32 { self.fee_tier }
    pub fn token0_decimals(&self) -> u8 { self.token0_decimals }
    pub fn token1_decimals(&self) -> u8 { self.token1_decimals }
    pub fn positions(&self) -> &[LiquidityPosition] { &self.positions }

    /// Base fee rate implied by the fee tier (3000 ppm -> 0.003).
    pub fn base_fee(&self) -> Decimal {
        Decimal::from(self.fee_tier) / Decimal::from(FEE_DENOMINATOR_PPM)
    }

    /// Appends a position. The cached liquidity is left alone until the tick next moves.
    pub fn add_position(&mut self, lower_tick: i32, upper_tick: i32, liquidity: Decimal) -> Result<(), PoolError> {
        if self.frozen {
            return Err(PoolError::PositionsFrozen);
        }
        let position = LiquidityPosition::new(lower_tick, upper_tick, liquidity)?;
        *self.boundaries.entry(position.lower_tick).or_insert(0) += 1;
        *self.boundaries.entry(position.upper_tick).or_insert(0) += 1;
        self.positions.push(position);
        Ok(())
    }

    /// Sum of liquidity over positions whose range contains `tick`.
    pub fn active_liquidity_at(&self, tick: i32) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.contains(tick))
            .map(|p| p.liquidity)
            .sum()
    }

    pub fn update_liquidity(&mut self, new_tick: i32) {
        self.liquidity = self.active_liquidity_at(new_tick);
    }

    /// Nearest position boundary strictly beyond the current tick, or the tick limit.
    pub fn next_initialized_tick(&self, direction: SwapDirection) -> i32 {
        match direction {
            SwapDirection::ZeroForOne => self.boundaries
                .range(..self.tick)
                .next_back()
                .map(|(&t, _)| t)
                .unwrap_or(MIN_TICK),
            SwapDirection::OneForZero => self.boundaries
                .range(self.tick.saturating_add(1)..)
                .next()
                .map(|(&t, _)| t)
                .unwrap_or(MAX_TICK),
        }
    }

    /// Exact-input swap. `fee_adjustment` is added to the tier's base rate for this swap only.
    pub fn swap(
        &mut self,
        amount_in: Decimal,
        direction: SwapDirection,
        fee_adjustment: Decimal,
    ) -> Result<SwapResult, PoolError> {
        if amount_in.is_sign_negative() && !amount_in.is_zero() {
            return Err(PoolError::NegativeAmountIn(amount_in));
        }
        self.frozen = true;

        let sqrt_price_limit = direction.sqrt_price_limit();
        let fee_rate = self.base_fee() + fee_adjustment;

        let mut amount_remaining = amount_in;
        let mut amount_out = Decimal::ZERO;
        let mut fee_amount = Decimal::ZERO;
        let mut steps = 0usize;

        while amount_remaining > Decimal::ZERO {
            let next_tick = self.next_initialized_tick(direction);
            let sqrt_price_next = tick_to_sqrt_price(next_tick);

            // nearer of the boundary and the absolute limit
            let sqrt_price_target = match direction {
                SwapDirection::ZeroForOne => sqrt_price_next.max(sqrt_price_limit),
                SwapDirection::OneForZero => sqrt_price_next.min(sqrt_price_limit),
            };

            let step = compute_swap_step(self.sqrt_price, sqrt_price_target, self.liquidity, amount_remaining, direction);
            if step.amount_in.is_zero() {
                break;
            }

            amount_remaining -= step.amount_in;
            let fee = step.amount_in.saturating_mul(fee_rate);
            let net_in = step.amount_in - fee;
            fee_amount = fee_amount.saturating_add(fee);
            amount_out = amount_out.saturating_add(step.amount_out);
            steps += 1;

            self.sqrt_price = sqrt_price_target;
            self.tick = sqrt_price_to_tick(self.sqrt_price);
            self.update_liquidity(self.tick);

            log::debug!(
                "swap step {}: in={} net_in={} out={} -> tick {} liquidity {}",
                steps, step.amount_in, net_in, step.amount_out, self.tick, self.liquidity
            );
        }

        Ok(SwapResult {
            amount_in: amount_in - amount_remaining,
            amount_out,
            fee_amount,
            steps,
            sqrt_price: self.sqrt_price,
            tick: self.tick,
            liquidity: self.liquidity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

    fn unit_pool() -> Pool {
        Pool::new(Decimal::ONE, 0, Decimal::ZERO, 3000, 18, 6).unwrap()
    }

    /// Unit-by-unit scan over position edges, the behaviour the boundary index replaces.
    fn scan_next_tick(pool: &Pool, direction: SwapDirection) -> i32 {
        let mut current = pool.tick();
        loop {
            current += if direction.is_zero_for_one() { -1 } else { 1 };
            if pool.positions().iter().any(|p| p.lower_tick == current || p.upper_tick == current) {
                return current;
            }
            if current <= MIN_TICK || current >= MAX_TICK {
                return if direction.is_zero_for_one() { MIN_TICK } else { MAX_TICK };
            }
        }
    }

    #[test]
    fn constructor_rejects_bad_state() {
        assert_eq!(Pool::new(Decimal::ZERO, 0, Decimal::ZERO, 3000, 18, 6).unwrap_err(), PoolError::NonPositiveSqrtPrice(Decimal::ZERO));
        assert_eq!(Pool::new(Decimal::ONE, MAX_TICK + 1, Decimal::ZERO, 3000, 18, 6).unwrap_err(), PoolError::TickOutOfRange(MAX_TICK + 1));
        assert!(matches!(Pool::new(Decimal::ONE, 0, dec("-1"), 3000, 18, 6), Err(PoolError::NegativeLiquidity(_))));
    }

    #[test]
    fn base_fee_from_tier() {
        assert_eq!(unit_pool().base_fee(), dec("0.003"));
    }

    #[test]
    fn add_position_validates_range() {
        let mut pool = unit_pool();
        assert_eq!(pool.add_position(10, 10, dec("1")), Err(PoolError::InvalidTickRange { lower: 10, upper: 10 }));
        assert_eq!(pool.add_position(MIN_TICK - 1, 0, dec("1")), Err(PoolError::TickOutOfRange(MIN_TICK - 1)));
        assert!(pool.add_position(-10, 10, dec("1")).is_ok());
        assert_eq!(pool.positions().len(), 1);
    }

    #[test]
    fn boundary_index_matches_linear_scan() {
        let mut pool = unit_pool();
        pool.add_position(-300, 120, dec("5")).unwrap();
        pool.add_position(-40, 40, dec("7")).unwrap();
        pool.add_position(-40, 900, dec("1")).unwrap();
        pool.add_position(500, 900, dec("2")).unwrap();

        for direction in [SwapDirection::ZeroForOne, SwapDirection::OneForZero] {
            assert_eq!(pool.next_initialized_tick(direction), scan_next_tick(&pool, direction));
        }
        // past every boundary the limit is returned
        let mut far = pool.clone();
        far.tick = 1000;
        assert_eq!(far.next_initialized_tick(SwapDirection::OneForZero), MAX_TICK);
        assert_eq!(far.next_initialized_tick(SwapDirection::OneForZero), scan_next_tick(&far, SwapDirection::OneForZero));
        assert_eq!(far.next_initialized_tick(SwapDirection::ZeroForOne), 900);
    }

    #[test]
    fn zero_amount_is_a_no_op() {
        let mut pool = unit_pool();
        pool.add_position(-10, 10, dec("100")).unwrap();
        pool.update_liquidity(0);
        let res = pool.swap(Decimal::ZERO, SwapDirection::ZeroForOne, Decimal::ZERO).unwrap();
        assert_eq!(res.amount_in, Decimal::ZERO);
        assert_eq!(res.steps, 0);
        assert_eq!(pool.tick(), 0);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut pool = unit_pool();
        assert_eq!(pool.swap(dec("-1"), SwapDirection::OneForZero, Decimal::ZERO), Err(PoolError::NegativeAmountIn(dec("-1"))));
    }

    #[test]
    fn direction_from_signed_amount0() {
        assert_eq!(SwapDirection::from_amount0(dec("1.5")), SwapDirection::ZeroForOne);
        assert_eq!(SwapDirection::from_amount0(dec("-1.5")), SwapDirection::OneForZero);
        assert_eq!(SwapDirection::from_amount0(Decimal::ZERO), SwapDirection::OneForZero);
    }
}
