//! Candles sub-client: single pages and full history walks.

use super::{Candle, CandleSeries, FetchRequest, HistoryWalker};
use crate::client::DerivClient;
use crate::error::DerivError;
use crate::shared::{Granularity, Symbol};

/// Sub-client for candle history.
pub struct Candles<'a> {
    pub(crate) client: &'a DerivClient,
}

impl<'a> Candles<'a> {
    /// Fetch one page, in the order the provider returned it.
    pub async fn fetch_page(&self, request: &FetchRequest) -> Result<Vec<Candle>, DerivError> {
        self.client.request_page(request).await
    }

    /// A walker configured with the client's page size and page limit.
    pub fn walker(&self) -> HistoryWalker<'a, DerivClient> {
        HistoryWalker::new(self.client)
            .page_size(self.client.page_size)
            .max_pages(self.client.max_pages)
    }

    /// Full ascending history from `start` to the newest bar.
    pub async fn fetch_all(
        &self,
        symbol: impl Into<Symbol>,
        start: i64,
        granularity: Granularity,
    ) -> Result<CandleSeries, DerivError> {
        self.walker().fetch_all(symbol, start, granularity).await
    }

    /// Same as [`fetch_all`](Self::fetch_all) with an explicit page size.
    pub async fn fetch_all_with_page_size(
        &self,
        symbol: impl Into<Symbol>,
        start: i64,
        granularity: Granularity,
        page_size: u32,
    ) -> Result<CandleSeries, DerivError> {
        self.walker()
            .page_size(page_size)
            .fetch_all(symbol, start, granularity)
            .await
    }
}
