use crate::error::{ProcessingError, Result};
use crate::models::{FinalResult, StationStats};
use crate::utils::constants::TEMPERATURE_SCALE;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// `<station>=<min>/<mean>/<max>` per line
    Text,
    /// Array of station objects
    Json,
}

/// Format a scaled integer with as many decimals as `scale` has zeros
/// (`-82` at scale 10 is `"-8.2"`).
pub fn format_scaled(value: i64, scale: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let scale = scale.unsigned_abs().max(1);
    let decimals = scale.ilog10() as usize;

    if decimals == 0 {
        return format!("{}{}", sign, magnitude);
    }
    format!(
        "{}{}.{:0width$}",
        sign,
        magnitude / scale,
        magnitude % scale,
        width = decimals
    )
}

/// Mean of `sum / count` in scaled units, rounding halves toward positive infinity.
pub fn rounded_mean(sum: i64, count: u64) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = i128::from(count);
    ((2 * i128::from(sum) + count).div_euclid(2 * count)) as i64
}

/// Render `min/mean/max` for one station.
pub fn format_stats(stats: &StationStats, scale: i64) -> String {
    format!(
        "{}/{}/{}",
        format_scaled(i64::from(stats.min), scale),
        format_scaled(rounded_mean(stats.sum, stats.count), scale),
        format_scaled(i64::from(stats.max), scale)
    )
}

#[derive(Debug, Serialize)]
struct StationRow {
    station: String,
    min: f64,
    mean: f64,
    max: f64,
    count: u64,
}

impl StationRow {
    fn new(station: &[u8], stats: &StationStats, scale: i64) -> Self {
        let scale = scale as f64;
        Self {
            station: String::from_utf8_lossy(station).into_owned(),
            min: f64::from(stats.min) / scale,
            mean: rounded_mean(stats.sum, stats.count) as f64 / scale,
            max: f64::from(stats.max) / scale,
            count: stats.count,
        }
    }
}

pub struct ReportWriter {
    format: ReportFormat,
    scale: i64,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            format: ReportFormat::Text,
            scale: TEMPERATURE_SCALE,
        }
    }

    pub fn with_format(mut self, format: &str) -> Result<Self> {
        self.format = match format.to_lowercase().as_str() {
            "text" => ReportFormat::Text,
            "json" => ReportFormat::Json,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported output format: {}",
                    format
                )))
            }
        };
        Ok(self)
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Write the report for `result` to `out`, stations in ascending order
    pub fn write<W: Write>(&self, result: &FinalResult, out: W) -> Result<()> {
        let mut out = BufWriter::new(out);
        match self.format {
            ReportFormat::Text => {
                for (station, stats) in result.iter() {
                    out.write_all(station)?;
                    writeln!(out, "={}", format_stats(stats, self.scale))?;
                }
            }
            ReportFormat::Json => {
                let rows: Vec<StationRow> = result
                    .iter()
                    .map(|(station, stats)| StationRow::new(station, stats, self.scale))
                    .collect();
                serde_json::to_writer_pretty(&mut out, &rows)?;
                writeln!(out)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_to_path(&self, result: &FinalResult, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(result, file)
    }

    pub fn render(&self, result: &FinalResult) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(result, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
