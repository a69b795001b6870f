//! CSV output for fetched candles.
//!
//! Columns: `date,open,high,low,close,volume,rsi`. Dates are RFC 3339 UTC;
//! `rsi` is blank during the warmup region.

use std::io::Write;

use crate::domain::candle::Candle;
use crate::domain::error::AlphaChartError;
use crate::domain::indicator::IndicatorSeries;

pub const HEADER: [&str; 7] = ["date", "open", "high", "low", "close", "volume", "rsi"];

pub fn write_candles<W: Write>(
    out: W,
    candles: &[Candle],
    rsi: &IndicatorSeries,
) -> Result<(), AlphaChartError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER).map_err(csv_error)?;

    for (i, candle) in candles.iter().enumerate() {
        let rsi_cell = rsi
            .values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| format!("{:.2}", p.value))
            .unwrap_or_default();
        wtr.write_record([
            candle.date.to_rfc3339(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
            rsi_cell,
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

fn csv_error(err: csv::Error) -> AlphaChartError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => AlphaChartError::Io(e),
        other => AlphaChartError::Io(std::io::Error::other(format!("CSV write error: {:?}", other))),
    }
}
