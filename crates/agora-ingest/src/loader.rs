//! CSV loading.
//!
//! Rows are read one at a time and fed to a [`GraphBuilder`]. A bad row is
//! skipped and reported in the result; only I/O failures and an unreadable
//! header abort the load.

use crate::builder::{GraphBuilder, IngestResult};
use crate::error::IngestError;
use crate::record::InteractionRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// How to read the interaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Loads an interaction log from a CSV file.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<IngestResult, IngestError> {
    info!(path = %path.display(), "loading interaction log");
    let file = File::open(path)?;
    read_csv(file, options)
}

/// Reads an interaction log from any CSV source with a header row.
pub fn read_csv<R: Read>(reader: R, options: &LoadOptions) -> Result<IngestResult, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut builder = GraphBuilder::new();
    let mut row = csv::StringRecord::new();

    loop {
        match csv_reader.read_record(&mut row) {
            Ok(false) => break,
            Ok(true) => {
                let line = row.position().map_or(0, |p| p.line());
                match row.deserialize::<InteractionRecord>(Some(&headers)) {
                    Ok(record) => builder.add_or_skip(line, record),
                    Err(e) => builder.count_unparsed(line, e.to_string()),
                }
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                builder.count_unparsed(line, e.to_string());
            }
        }
    }

    Ok(builder.build())
}
