use dynamic_fee_amm::math::tick_math::*;
use primitive_types::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn sampled_ticks() -> Vec<i32> {
    let mut ticks: Vec<i32> = (MIN_TICK..=MAX_TICK).step_by(997).collect();
    ticks.extend(-1000..=1000);
    ticks.extend([MIN_TICK, MIN_TICK + 1, MAX_TICK - 1, MAX_TICK]);
    ticks
}

#[test]
fn test_round_trip_across_tick_range() {
    println!("=== TICK ROUND TRIP ===");
    let ticks = sampled_ticks();
    for &tick in &ticks {
        let sqrt_price = tick_to_sqrt_price(tick);
        assert_eq!(
            sqrt_price_to_tick(sqrt_price),
            tick,
            "round trip failed at tick {} (sqrt price {})",
            tick,
            sqrt_price
        );
    }
    println!("  {} ticks checked", ticks.len());
}

#[test]
fn test_sqrt_price_strictly_increasing() {
    for &tick in sampled_ticks().iter().filter(|&&t| t < MAX_TICK) {
        assert!(
            tick_to_sqrt_price(tick) < tick_to_sqrt_price(tick + 1),
            "sqrt price not increasing between {} and {}",
            tick,
            tick + 1
        );
    }
}

#[test]
fn test_price_strictly_increasing_where_defined() {
    let mut ticks: Vec<i32> = (-PRICE_TICK_BOUND..PRICE_TICK_BOUND).step_by(13).collect();
    ticks.extend(-PRICE_TICK_BOUND..-PRICE_TICK_BOUND + 2000);
    ticks.extend(PRICE_TICK_BOUND - 2000..PRICE_TICK_BOUND);

    let mut pairs = 0usize;
    for tick in ticks {
        if let (Some(price), Some(next)) = (tick_to_price(tick), tick_to_price(tick + 1)) {
            assert!(price < next, "price not increasing between {} ({}) and {} ({})", tick, price, tick + 1, next);
            pairs += 1;
        }
    }
    println!("  {} price pairs checked", pairs);
    assert!(tick_to_price(-PRICE_TICK_BOUND - 1).is_none());
    assert!(tick_to_price(PRICE_TICK_BOUND + 1).is_none());
}

// Every tick in range; slow without optimisations (`cargo test --release -- --ignored`).
#[test]
#[ignore]
fn test_round_trip_and_monotonicity_every_tick() {
    let mut previous_sqrt = Decimal::ZERO;
    let mut previous_price: Option<Decimal> = None;
    for tick in MIN_TICK..=MAX_TICK {
        let sqrt_price = tick_to_sqrt_price(tick);
        assert_eq!(sqrt_price_to_tick(sqrt_price), tick, "round trip failed at tick {}", tick);
        assert!(sqrt_price > previous_sqrt, "sqrt price not increasing at tick {}", tick);
        previous_sqrt = sqrt_price;

        let price = tick_to_price(tick);
        if let (Some(prev), Some(current)) = (previous_price, price) {
            assert!(current > prev, "price not increasing at tick {}", tick);
        }
        previous_price = price;
    }
}

#[test]
fn test_price_to_tick_known_values() {
    // floor(ln(p) / ln(1.0001))
    let cases = [
        ("2", 6931),
        ("0.5", -6932),
        ("1500", 73135),
        ("1800", 74959),
        ("2200", 76965),
        ("2500", 78244),
        ("3000", 80067),
    ];
    for (price, expected) in cases {
        let tick = price_to_tick(dec(price)).unwrap();
        println!("  price {:>6} -> tick {}", price, tick);
        assert_eq!(tick, expected, "price {}", price);
    }
}

#[test]
fn test_price_between_ticks_floors() {
    let lower = tick_to_sqrt_price(100);
    let upper = tick_to_sqrt_price(101);
    let midpoint = (lower + upper) / Decimal::TWO;
    assert_eq!(sqrt_price_to_tick(midpoint), 100);

    let lower = tick_to_sqrt_price(-101);
    let upper = tick_to_sqrt_price(-100);
    let midpoint = (lower + upper) / Decimal::TWO;
    assert_eq!(sqrt_price_to_tick(midpoint), -101);
}

#[test]
fn test_out_of_range_inputs_clamp() {
    assert_eq!(tick_to_sqrt_price(MAX_TICK + 500), tick_to_sqrt_price(MAX_TICK));
    assert_eq!(tick_to_sqrt_price(MIN_TICK - 500), tick_to_sqrt_price(MIN_TICK));
    assert_eq!(sqrt_price_to_tick(Decimal::ZERO), MIN_TICK);
    assert_eq!(sqrt_price_to_tick(Decimal::MAX), MAX_TICK);
    assert_eq!(price_to_tick(Decimal::ZERO), None);
    assert_eq!(price_to_tick(dec("-1")), None);
}

#[test]
fn test_q96_reported_price_maps_to_tick() {
    // sqrtPriceX96 as a pool reports it right at tick 50
    let reported = U256::from_dec_str("79426470787362580746886972460").unwrap();
    let sqrt_price = q96_to_decimal(reported).unwrap();
    println!("  sqrtPriceX96 {} -> {}", reported, sqrt_price);

    assert!((sqrt_price - dec("1.0025030023012655314771480808")).abs() < dec("0.000000000000000000001"));
    // the reported value is floored, so it may sit a hair under the tick boundary
    let tick = sqrt_price_to_tick(sqrt_price);
    assert!(tick == 49 || tick == 50, "unexpected tick {}", tick);

    let encoded = decimal_to_q96(tick_to_sqrt_price(50)).unwrap();
    let difference = if encoded > reported { encoded - reported } else { reported - encoded };
    assert!(difference < U256::from(1_000_000u64), "q96 mismatch: {} vs {}", encoded, reported);
}
