//! Record source: a JSON-lines file read once before distribution.
//!
//! One record per line, each line a JSON object. Rows that fail to parse
//! are skipped with a warning; a row without the key field gets the
//! partitioner's fallback hash as its key (see `Record::from_json_line`).

use anyhow::Context;
use corelib::record::Record;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

pub fn load_records(path: &Path, key_field: &str) -> anyhow::Result<Vec<Record>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open record file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match Record::from_json_line(&line, key_field) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(line = number + 1, %err, "skipping unparseable record");
                skipped += 1;
            }
        }
    }
    info!(
        count = records.len(),
        skipped,
        file = %path.display(),
        "loaded records"
    );
    Ok(records)
}
