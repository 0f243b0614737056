use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use primitive_types::U256;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::math::tick_math::q96_to_decimal;
use crate::models::{PoolSnapshot, SwapRecord};

const POOL_QUERY: &str = r#"
query ($poolId: ID!) {
    pool(id: $poolId) {
        tick
        sqrtPrice
        liquidity
        feeTier
        token0 { decimals }
        token1 { decimals }
    }
}"#;

const SWAPS_QUERY: &str = r#"
query ($poolId: String!, $startTime: Int!, $endTime: Int!, $first: Int!) {
    swaps(
        where: {pool: $poolId, timestamp_gte: $startTime, timestamp_lte: $endTime}
        orderBy: timestamp
        orderDirection: asc
        first: $first
    ) {
        timestamp
        amount0
        amount1
        sqrtPriceX96
        tick
        logIndex
    }
}"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PoolData {
    pool: Option<PoolDto>,
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    decimals: String,
}

// The subgraph encodes every BigInt/BigDecimal as a string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolDto {
    tick: Option<String>,
    sqrt_price: String,
    liquidity: String,
    fee_tier: String,
    token0: TokenDto,
    token1: TokenDto,
}

#[derive(Debug, Deserialize)]
struct SwapsData {
    swaps: Vec<SwapDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapDto {
    timestamp: String,
    amount0: String,
    amount1: String,
    sqrt_price_x96: String,
    tick: String,
    log_index: Option<String>,
}

impl TryFrom<PoolDto> for PoolSnapshot {
    type Error = anyhow::Error;

    fn try_from(dto: PoolDto) -> Result<Self> {
        let sqrt_price_x96 = U256::from_dec_str(&dto.sqrt_price)
            .map_err(|e| anyhow!("invalid sqrtPrice {:?}: {:?}", dto.sqrt_price, e))?;
        let sqrt_price = q96_to_decimal(sqrt_price_x96)
            .context("sqrtPrice does not fit a decimal")?;
        let tick = dto.tick
            .context("pool has no tick (not initialised?)")?
            .parse()
            .context("Failed to parse pool tick")?;

        Ok(PoolSnapshot {
            sqrt_price,
            tick,
            liquidity: Decimal::from_str(&dto.liquidity).context("Failed to parse pool liquidity")?,
            fee_tier: dto.fee_tier.parse().context("Failed to parse feeTier")?,
            token0_decimals: dto.token0.decimals.parse().context("Failed to parse token0 decimals")?,
            token1_decimals: dto.token1.decimals.parse().context("Failed to parse token1 decimals")?,
        })
    }
}

impl TryFrom<SwapDto> for SwapRecord {
    type Error = anyhow::Error;

    fn try_from(dto: SwapDto) -> Result<Self> {
        Ok(SwapRecord {
            timestamp: dto.timestamp.parse().context("Failed to parse swap timestamp")?,
            amount0: Decimal::from_str(&dto.amount0).context("Failed to parse amount0")?,
            amount1: Decimal::from_str(&dto.amount1).context("Failed to parse amount1")?,
            sqrt_price_x96: U256::from_dec_str(&dto.sqrt_price_x96)
                .map_err(|e| anyhow!("invalid sqrtPriceX96 {:?}: {:?}", dto.sqrt_price_x96, e))?,
            tick: dto.tick.parse().context("Failed to parse swap tick")?,
            log_index: match dto.log_index {
                Some(v) => v.parse().context("Failed to parse logIndex")?,
                None => 0,
            },
        })
    }
}

/// Reads pool state and swap history from a Uniswap V3 subgraph.
#[derive(Clone)]
pub struct SubgraphClient {
    client: Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, url })
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        let response: GraphQlResponse<T> = self.client
            .post(&self.url)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .context("Failed to reach subgraph")?
            .error_for_status()
            .context("Subgraph returned an error status")?
            .json()
            .await
            .context("Failed to parse subgraph response")?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(anyhow!("subgraph query failed: {}", messages.join("; ")));
        }
        response.data.context("subgraph response has no data")
    }

    pub async fn fetch_pool_snapshot(&self, pool_id: &str) -> Result<PoolSnapshot> {
        let data: PoolData = self.query(POOL_QUERY, json!({ "poolId": pool_id })).await?;
        let pool = data.pool.with_context(|| format!("pool {} not found", pool_id))?;
        pool.try_into()
    }

    /// Swaps in [start_ts, end_ts], oldest first, at most `page_size` of them.
    pub async fn fetch_swaps(
        &self,
        pool_id: &str,
        start_ts: i64,
        end_ts: i64,
        page_size: u32,
    ) -> Result<Vec<SwapRecord>> {
        let variables = json!({
            "poolId": pool_id,
            "startTime": start_ts,
            "endTime": end_ts,
            "first": page_size,
        });
        let data: SwapsData = self.query(SWAPS_QUERY, variables).await?;

        if data.swaps.len() as u64 >= page_size as u64 {
            log::warn!(
                "Swap page is full ({} records); history after the last record is not included",
                data.swaps.len()
            );
        }

        data.swaps.into_iter().map(SwapRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_response_deserialization() {
        // sqrtPrice = 2^96 * 2, i.e. price 4
        let json_response = r#"{
            "data": {
                "pool": {
                    "tick": "13862",
                    "sqrtPrice": "158456325028528675187087900672",
                    "liquidity": "21000000000000000000",
                    "feeTier": "3000",
                    "token0": { "decimals": "6" },
                    "token1": { "decimals": "18" }
                }
            }
        }"#;

        let response: GraphQlResponse<PoolData> = serde_json::from_str(json_response)
            .expect("Failed to deserialize pool response");
        let dto = response.data.and_then(|d| d.pool).expect("pool missing");
        let snapshot = PoolSnapshot::try_from(dto).expect("conversion failed");

        assert_eq!(snapshot.sqrt_price, Decimal::TWO);
        assert_eq!(snapshot.tick, 13862);
        assert_eq!(snapshot.liquidity, Decimal::from_str("21000000000000000000").unwrap());
        assert_eq!(snapshot.fee_tier, 3000);
        assert_eq!(snapshot.token0_decimals, 6);
        assert_eq!(snapshot.token1_decimals, 18);
    }

    #[test]
    fn test_swaps_response_deserialization() {
        let json_response = r#"{
            "data": {
                "swaps": [
                    {
                        "timestamp": "1700000000",
                        "amount0": "-1523.441",
                        "amount1": "0.75",
                        "sqrtPriceX96": "1771595571142957166518320255467520",
                        "tick": "200000",
                        "logIndex": "42"
                    }
                ]
            }
        }"#;

        let response: GraphQlResponse<SwapsData> = serde_json::from_str(json_response)
            .expect("Failed to deserialize swaps response");
        let records: Vec<SwapRecord> = response.data.expect("data missing").swaps
            .into_iter()
            .map(SwapRecord::try_from)
            .collect::<Result<_>>()
            .expect("conversion failed");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.amount0, Decimal::from_str("-1523.441").unwrap());
        assert_eq!(record.log_index, 42);
        assert!(record.sqrt_price().is_some());
    }

    #[test]
    fn test_graphql_errors_are_collected() {
        let json_response = r#"{ "errors": [ { "message": "bad query" } ] }"#;
        let response: GraphQlResponse<SwapsData> = serde_json::from_str(json_response)
            .expect("Failed to deserialize error response");
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "bad query");
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let dto = SwapDto {
            timestamp: "not-a-number".to_string(),
            amount0: "1".to_string(),
            amount1: "-1".to_string(),
            sqrt_price_x96: "79228162514264337593543950336".to_string(),
            tick: "0".to_string(),
            log_index: None,
        };
        assert!(SwapRecord::try_from(dto).is_err());
    }
}
