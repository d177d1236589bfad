//! CSV export for hourly dispatch timeseries.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::result::Timeseries;

/// Column header for CSV timeseries export.
const HEADER: &str = "hour,load_mw,served_mw,pv_mw,bess_mw,chp_mw,unserved_mw";

/// Exports the hourly timeseries to a CSV file at the given path.
///
/// Writes a header row followed by one data row per simulated hour.
/// Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `timeseries` - Complete hourly dispatch columns
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(timeseries: &Timeseries, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(timeseries, buf)
}

/// Writes the hourly timeseries as CSV to any writer.
///
/// # Arguments
///
/// * `timeseries` - Complete hourly dispatch columns
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(timeseries: &Timeseries, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(','))?;

    // Data rows
    for i in 0..timeseries.len() {
        wtr.write_record(&[
            timeseries.hour[i].to_string(),
            format!("{:.4}", timeseries.load_mw[i]),
            format!("{:.4}", timeseries.served_mw[i]),
            format!("{:.4}", timeseries.pv_mw[i]),
            format!("{:.4}", timeseries.bess_mw[i]),
            format!("{:.4}", timeseries.chp_mw[i]),
            format!("{:.4}", timeseries.unserved_mw[i]),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
