//! Candle series container: ascending, duplicate-free, built by prepending
//! older pages.

use super::Candle;
use crate::error::DerivError;

/// Candles ordered by strictly increasing `epoch`.
///
/// The walker grows it by prepending each older page; every mutation keeps
/// the ordering invariant or fails without touching the series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a page that lies entirely before the current series.
    ///
    /// The page must already be sorted ascending.
    pub fn prepend_page(&mut self, page: Vec<Candle>) -> Result<(), DerivError> {
        if let Some(pair) = page.windows(2).find(|w| w[0].epoch >= w[1].epoch) {
            return Err(DerivError::UnexpectedResponse(format!(
                "page is not strictly ascending at epoch {}",
                pair[1].epoch
            )));
        }
        if let (Some(page_newest), Some(series_oldest)) = (page.last(), self.oldest()) {
            if page_newest.epoch >= series_oldest.epoch {
                return Err(DerivError::OverlappingPage {
                    page_newest: page_newest.epoch,
                    series_oldest: series_oldest.epoch,
                });
            }
        }

        let mut merged = page;
        merged.append(&mut self.candles);
        self.candles = merged;
        Ok(())
    }

    pub fn oldest(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn into_vec(self) -> Vec<Candle> {
        self.candles
    }

    pub fn epochs(&self) -> Vec<i64> {
        self.candles.iter().map(|c| c.epoch).collect()
    }

    pub fn is_strictly_ascending(&self) -> bool {
        self.candles.windows(2).all(|w| w[0].epoch < w[1].epoch)
    }
}

impl TryFrom<Vec<Candle>> for CandleSeries {
    type Error = DerivError;

    /// Sort by epoch and reject duplicate epochs.
    fn try_from(mut candles: Vec<Candle>) -> Result<Self, Self::Error> {
        candles.sort_by_key(|c| c.epoch);
        if let Some(pair) = candles.windows(2).find(|w| w[0].epoch == w[1].epoch) {
            return Err(DerivError::Validation(format!(
                "duplicate candle at epoch {}",
                pair[0].epoch
            )));
        }
        Ok(Self { candles })
    }
}

impl IntoIterator for CandleSeries {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
