use crate::error::{Error, Result};

/// Row-major dense matrix, one row per vocabulary entry. Starts empty and
/// grows a row at a time.
pub struct Matrix {
    pub n_rows: usize,
    pub n_cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn new(n_cols: usize) -> Self {
        Self {
            data: Vec::new(),
            n_rows: 0,
            n_cols,
        }
    }
    /// Appends `values` (exactly `n_cols` long) and returns its row index.
    pub fn push_row(&mut self, values: &[f32]) -> usize {
        debug_assert_eq!(values.len(), self.n_cols);
        self.data.extend_from_slice(values);
        self.n_rows += 1;
        self.n_rows - 1
    }
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }
}

/// Fails unless every length in `actual` equals `expected`.
pub fn ensure_aligned(expected: usize, actual: &[usize]) -> Result<()> {
    match actual.iter().find(|&&len| len != expected) {
        Some(&len) => Err(Error::length_mismatch(expected, len)),
        None => Ok(()),
    }
}

pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}
