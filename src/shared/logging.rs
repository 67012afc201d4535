//! Tracing setup: stdout plus an optional daily log file.

use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn log_file_name(date: NaiveDate) -> String {
    format!("biomathforge_{}.log", date.format("%Y%m%d"))
}

/// Install the global subscriber. `RUST_LOG` controls the filter (default `info`).
/// Returns the log file path when `log_dir` is given.
pub fn init(log_dir: Option<&Path>) -> std::io::Result<Option<PathBuf>> {
    let (file_layer, file_path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(chrono::Local::now().date_naive()));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(log_file_name(date), "biomathforge_20250307.log");
    }
}
