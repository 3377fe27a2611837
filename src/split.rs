use crate::error::{Error, Result};
use log::info;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads a JSON document from disk.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Loads the instance indices belonging to `split_label` from a split file
/// mapping labels to index lists.
pub fn load_split_indices(split_path: &Path, split_label: &str) -> Result<HashSet<usize>> {
    let mut splits: HashMap<String, Vec<usize>> = read_json(split_path)?;
    let indices: HashSet<usize> = splits
        .remove(split_label)
        .ok_or_else(|| Error::split_not_found(split_label))?
        .into_iter()
        .collect();
    info!(
        "Split '{}' selects {} instances ({})",
        split_label,
        indices.len(),
        split_path.display()
    );
    Ok(indices)
}

/// Keeps the entries whose position is in `indices`, in dataset order.
pub fn select<'a, T: 'a>(
    dataset: Vec<T>,
    indices: &'a HashSet<usize>,
) -> impl Iterator<Item = T> + 'a {
    dataset
        .into_iter()
        .enumerate()
        .filter(move |(i, _)| indices.contains(i))
        .map(|(_, entry)| entry)
}
