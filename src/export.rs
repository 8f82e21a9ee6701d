use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use crate::collector::data::OutputRecord;

pub const READINGS_FILE: &str = "readings.csv";

#[derive(Serialize)]
struct ReadingRow<'a> {
    datetime: &'a str,
    entity: &'a str,
    field: &'a str,
    amount: f64,
}

/// Append one row per reading to `readings.csv` under `dir`, writing the
/// header only when the file is new.
pub fn append_readings(dir: &Path, record: &OutputRecord) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(READINGS_FILE);

    let is_new = !path.exists();
    let file: File = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
    for reading in &record.data.values {
        writer.serialize(ReadingRow {
            datetime: &record.data.datetime,
            entity: &record.entity,
            field: &reading.field,
            amount: reading.amount,
        })?;
    }
    writer.flush()?;

    info!("Appended {} readings to {}", record.data.values.len(), path.display());
    Ok(path)
}
