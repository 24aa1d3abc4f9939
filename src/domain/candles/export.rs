//! CSV persistence for candle series.
//!
//! Layout: header `epoch,open,high,low,close`, one row per candle, ascending.

use std::io;
use std::path::Path;

use super::{Candle, CandleSeries};
use crate::error::DerivError;

const HEADER: [&str; 5] = ["epoch", "open", "high", "low", "close"];

/// Write the series to any writer. The header is written even for an
/// empty series.
pub fn write_csv<W: io::Write>(series: &CandleSeries, writer: W) -> Result<(), DerivError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for candle in series {
        writer.serialize(candle)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the series to `path`, creating parent directories as needed.
pub fn write_csv_file<P: AsRef<Path>>(series: &CandleSeries, path: P) -> Result<(), DerivError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(series, io::BufWriter::new(file))?;

    tracing::info!(path = %path.display(), candles = series.len(), "Saved candles");
    Ok(())
}

/// Load a file written by [`write_csv_file`].
///
/// Rows are sorted by epoch; a duplicate epoch is a validation error.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<CandleSeries, DerivError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let candles = reader
        .deserialize::<Candle>()
        .collect::<Result<Vec<_>, _>>()?;
    CandleSeries::try_from(candles)
}
