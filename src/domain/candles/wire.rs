//! Wire types for the `ticks_history` call in candle style.

use serde::{Deserialize, Serialize};

use crate::shared::serde_util::number_or_string;
use crate::shared::{End, Granularity, Symbol};

/// Outbound `ticks_history` request. `req_id` is attached by the WS layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicksHistoryRequest {
    pub ticks_history: Symbol,
    pub start: i64,
    pub end: End,
    pub granularity: Granularity,
    pub count: u32,
    pub style: String,
}

/// Body of a `candles` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<WireCandle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCandle {
    pub epoch: i64,
    #[serde(deserialize_with = "number_or_string::deserialize")]
    pub open: f64,
    #[serde(deserialize_with = "number_or_string::deserialize")]
    pub high: f64,
    #[serde(deserialize_with = "number_or_string::deserialize")]
    pub low: f64,
    #[serde(deserialize_with = "number_or_string::deserialize")]
    pub close: f64,
}
