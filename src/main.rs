use std::path::PathBuf;

use scentroid_sl50::{export, Collector, OutputSink, UnitSettings};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;

const DEFAULT_SETTINGS_PATH: &str = "sl50.json";

/// Prints the envelope to stdout, one JSON document per evaluation
struct StdoutSink;

impl OutputSink for StdoutSink {
    fn set_output(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Setting output {}", name);
        println!("{}", serde_json::to_string(&value)?);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = setup_logging();
    info!("Starting scentroid-sl50");

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    let settings = match UnitSettings::from_file(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings from {}: {}", settings_path.display(), e);
            return Err(Box::new(e));
        }
    };

    let collector = match Collector::from_settings(&settings) {
        Ok(collector) => collector,
        Err(e) => {
            error!("Failed to create collector: {}", e);
            return Err(Box::new(e));
        }
    };

    let evaluation = match collector.eval(&mut StdoutSink) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            error!("Evaluation failed: {}", e);
            eprintln!("Evaluation failed: {}", e);
            return Err(Box::new(e));
        }
    };

    if !evaluation.is_complete() {
        warn!("Record for {} is partial: {:?}", collector.entity(), evaluation.completeness);
    }

    if let Some(dir) = &settings.csv_export {
        if let Err(e) = export::append_readings(dir, &evaluation.record) {
            warn!("Failed to append readings to {}: {}", dir.display(), e);
        }
    }

    info!("Shutting down");
    Ok(())
}

fn setup_logging() -> WorkerGuard {
    // Daily rotated file log next to the working directory
    let file_appender = rolling::daily("logs", "scentroid-sl50.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .init();

    guard
}
