//! Backward pagination over a [`CandleSource`].
//!
//! The walk starts at the newest bar and moves an `end` cursor backward one
//! page at a time:
//!
//! 1. Fetch `(symbol, start, end, granularity, page_size)`.
//! 2. An empty page ends the walk.
//! 3. Sort the page by `epoch` (stable; providers make no order promise).
//!    Bars repeating an epoch are dropped, keeping the first one received.
//! 4. A page shorter than `page_size` ends the walk.
//! 5. Otherwise the next `end` is `oldest - granularity`. If that falls
//!    before `start` the walk is over as well.
//!
//! Pages depend on the previous cursor, so requests are strictly sequential.

use futures_util::stream::{self, Stream, TryStreamExt};

use super::{Candle, CandleSeries, CandleSource, FetchRequest};
use crate::error::DerivError;
use crate::shared::{End, Granularity, Symbol};

/// Bars requested per page unless overridden.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Non-empty pages a walk accepts before failing with
/// [`DerivError::PageLimitExceeded`].
pub const DEFAULT_MAX_PAGES: Option<u32> = Some(10_000);

struct Cursor {
    /// `None` once history is exhausted.
    end: Option<End>,
    fetched: u32,
}

/// Walks history backward through a [`CandleSource`].
///
/// ```ignore
/// let series = HistoryWalker::new(&source)
///     .page_size(500)
///     .fetch_all("R_50", start, Granularity::HOUR_1)
///     .await?;
/// ```
pub struct HistoryWalker<'a, S> {
    source: &'a S,
    page_size: u32,
    max_pages: Option<u32>,
}

impl<S> Clone for HistoryWalker<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for HistoryWalker<'_, S> {}

impl<'a, S> HistoryWalker<'a, S>
where
    S: CandleSource + Sync,
{
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// `None` removes the limit.
    pub fn max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Stream of sorted pages, newest page first.
    ///
    /// The stream ends when history is exhausted and yields at most one
    /// error, after which it is finished.
    pub fn pages(
        &self,
        symbol: Symbol,
        start: i64,
        granularity: Granularity,
    ) -> impl Stream<Item = Result<Vec<Candle>, DerivError>> + Send + 'a {
        let walker = *self;
        let init = Cursor {
            end: Some(End::Latest),
            fetched: 0,
        };

        stream::try_unfold(init, move |cursor| {
            walker.next_page(symbol.clone(), start, granularity, cursor)
        })
    }

    async fn next_page(
        self,
        symbol: Symbol,
        start: i64,
        granularity: Granularity,
        cursor: Cursor,
    ) -> Result<Option<(Vec<Candle>, Cursor)>, DerivError> {
        let Some(end) = cursor.end else {
            return Ok(None);
        };

        let request = FetchRequest::new(symbol, start, end, granularity, self.page_size)?;
        let mut page = self.source.fetch_page(&request).await?;
        let fetched = cursor.fetched + 1;

        let Some(oldest) = page.iter().map(|c| c.epoch).min() else {
            tracing::debug!(symbol = %request.symbol, %end, page = fetched, "Empty page, history exhausted");
            return Ok(None);
        };
        if let Some(max) = self.max_pages {
            if fetched > max {
                tracing::warn!(symbol = %request.symbol, max_pages = max, "Page limit reached");
                return Err(DerivError::PageLimitExceeded { max_pages: max });
            }
        }

        let received = page.len();
        page.sort_by_key(|c| c.epoch);
        page.dedup_by_key(|c| c.epoch);
        if page.len() < received {
            tracing::warn!(
                symbol = %request.symbol,
                %end,
                dropped = received - page.len(),
                "Dropped candles with duplicate epochs"
            );
        }

        // Short page means the provider ran out of bars.
        let next = if received < self.page_size as usize {
            None
        } else {
            oldest
                .checked_sub(i64::from(granularity.seconds()))
                .filter(|next_end| *next_end >= start)
                .map(End::Epoch)
        };

        tracing::debug!(
            symbol = %request.symbol,
            %end,
            page = fetched,
            len = page.len(),
            oldest,
            next = ?next,
            "Fetched page"
        );

        Ok(Some((page, Cursor { end: next, fetched })))
    }

    /// Walk the whole range and merge every page into one ascending series.
    ///
    /// All-or-nothing: any error aborts the walk and drops the pages merged
    /// so far.
    pub async fn fetch_all(
        &self,
        symbol: impl Into<Symbol>,
        start: i64,
        granularity: Granularity,
    ) -> Result<CandleSeries, DerivError> {
        let symbol = symbol.into();
        let pages = self.pages(symbol.clone(), start, granularity);
        futures_util::pin_mut!(pages);

        let mut series = CandleSeries::new();
        let mut count = 0u32;
        while let Some(page) = pages.try_next().await? {
            series.prepend_page(page)?;
            count += 1;
        }

        tracing::info!(
            %symbol,
            %granularity,
            pages = count,
            candles = series.len(),
            "History walk complete"
        );
        Ok(series)
    }
}
