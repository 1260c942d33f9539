pub mod report_writer;

pub use report_writer::{format_scaled, format_stats, rounded_mean, ReportFormat, ReportWriter};
