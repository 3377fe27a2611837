use crate::error::Result;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One predicted word per line, surrounding whitespace removed.
pub fn read_predictions(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let predictions = reader
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()))
        .collect::<std::io::Result<Vec<String>>>()?;
    info!("Read {} predictions from {}", predictions.len(), path.display());
    Ok(predictions)
}
