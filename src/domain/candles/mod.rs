//! Candles domain: OHLC bars, page requests, backward history walk.
//!
//! A [`CandleSource`] serves one bounded page per [`FetchRequest`]; the
//! [`HistoryWalker`] pages backward from the newest bar and stitches the
//! pages into one ascending [`CandleSeries`].

#[cfg(feature = "ws-native")]
pub mod client;
pub mod convert;
pub mod export;
pub mod state;
pub mod walker;
pub mod wire;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DerivError;
use crate::shared::{End, Granularity, Symbol};

pub use state::CandleSeries;
pub use walker::{HistoryWalker, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};

// ─── Candle ──────────────────────────────────────────────────────────────────

/// One OHLC bar. `epoch` is the bar's opening instant in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub epoch: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Opening instant as UTC; `None` if the epoch is out of chrono's range.
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.epoch, 0)
    }
}

// ─── FetchRequest ────────────────────────────────────────────────────────────

/// Parameters for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub symbol: Symbol,
    /// Inclusive lower bound.
    pub start: i64,
    /// Inclusive upper bound.
    pub end: End,
    pub granularity: Granularity,
    /// Maximum bars to return.
    pub count: u32,
}

impl FetchRequest {
    pub fn new(
        symbol: impl Into<Symbol>,
        start: i64,
        end: End,
        granularity: Granularity,
        count: u32,
    ) -> Result<Self, DerivError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(DerivError::Validation("symbol must not be empty".into()));
        }
        if count == 0 {
            return Err(DerivError::Validation(
                "count must be greater than zero".into(),
            ));
        }
        if let End::Epoch(end) = end {
            if start > end {
                return Err(DerivError::Validation(format!(
                    "start {} is after end {}",
                    start, end
                )));
            }
        }
        Ok(Self {
            symbol,
            start,
            end,
            granularity,
            count,
        })
    }
}

// ─── CandleSource ────────────────────────────────────────────────────────────

/// Anything that can serve one bounded page of candles.
///
/// Implementations return candles in whatever order the provider supplied
/// them and report provider-side failures as [`DerivError::Provider`].
pub trait CandleSource {
    fn fetch_page(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<Vec<Candle>, DerivError>> + Send;
}
