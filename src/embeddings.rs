use crate::error::{Error, Result};
use crate::utils::Matrix;
use log::info;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

/// Upper bound on vocabulary slots reserved up front from a file header.
const PREALLOC_WORDS: usize = 1 << 20;

/// Anything that can tell how close two words are.
///
/// Implementations must fail with [`Error::OutOfVocabulary`] when either word
/// is unknown; callers decide what an unknown word is worth.
pub trait WordSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> Result<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Binary,
    Text,
}

/// Pre-trained word vectors, stored unit-normalized so cosine similarity is
/// a plain dot product.
pub struct WordVectors {
    vocab: HashMap<String, usize>,
    vectors: Matrix,
}

impl WordVectors {
    pub fn load(path: &Path, format: VectorFormat) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let vectors = match format {
            VectorFormat::Binary => Self::from_word2vec_binary(reader)?,
            VectorFormat::Text => Self::from_word2vec_text(reader)?,
        };
        info!(
            "Loaded {} word vectors of dimension {} from {}",
            vectors.len(),
            vectors.dim(),
            path.display()
        );
        Ok(vectors)
    }

    /// Parses the word2vec binary layout: a `<vocab> <dim>` header line, then
    /// for every word its bytes, a space and `dim` little-endian f32 values.
    pub fn from_word2vec_binary<R: BufRead>(mut reader: R) -> Result<Self> {
        let (n_words, dim) = read_header(&mut reader)?;
        let mut table = Self::empty(n_words, dim);

        let mut word_buf: Vec<u8> = Vec::new();
        let mut value_buf = [0u8; 4];
        for i in 0..n_words {
            word_buf.clear();
            reader.read_until(b' ', &mut word_buf)?;
            if word_buf.last() != Some(&b' ') {
                return Err(truncated(n_words, i));
            }
            // records may be separated by a newline
            let word_bytes = word_buf[..word_buf.len() - 1]
                .strip_prefix(b"\n")
                .unwrap_or(&word_buf[..word_buf.len() - 1]);
            let word = String::from_utf8(word_bytes.to_vec())
                .map_err(|e| Error::invalid_embeddings(format!("word {} is not UTF-8: {}", i, e)))?;

            // sized by the bytes actually read, never by the header
            let mut values = Vec::new();
            for _ in 0..dim {
                reader.read_exact(&mut value_buf).map_err(|e| match e.kind() {
                    ErrorKind::UnexpectedEof => truncated(n_words, i),
                    _ => Error::Io(e),
                })?;
                values.push(f32::from_le_bytes(value_buf));
            }
            table.insert(word, values);
        }
        Ok(table)
    }

    /// Parses the word2vec text layout: a `<vocab> <dim>` header line, then one
    /// `word v1 v2 ... vdim` line per word.
    pub fn from_word2vec_text<R: BufRead>(mut reader: R) -> Result<Self> {
        let (n_words, dim) = read_header(&mut reader)?;
        let mut table = Self::empty(n_words, dim);

        let mut lines = reader.lines();
        for i in 0..n_words {
            let line = lines.next().ok_or_else(|| truncated(n_words, i))??;
            let mut parts = line.trim_end().split(' ');
            let word = parts.next().unwrap_or_default().to_string();
            let values = parts
                .map(|p| {
                    p.parse::<f32>()
                        .map_err(|e| Error::invalid_embeddings(format!("bad value for '{}': {}", word, e)))
                })
                .collect::<Result<Vec<f32>>>()?;
            if values.len() != dim {
                return Err(Error::invalid_embeddings(format!(
                    "'{}' has {} values, expected {}",
                    word,
                    values.len(),
                    dim
                )));
            }
            table.insert(word, values);
        }
        Ok(table)
    }

    /// Builds a table from in-memory vectors, all of the same dimension.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let pairs: Vec<(String, Vec<f32>)> = pairs.into_iter().map(|(w, v)| (w.into(), v)).collect();
        let dim = pairs.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut table = Self::empty(pairs.len(), dim);
        for (word, values) in pairs {
            if values.len() != dim {
                return Err(Error::invalid_embeddings(format!(
                    "'{}' has {} values, expected {}",
                    word,
                    values.len(),
                    dim
                )));
            }
            table.insert(word, values);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.n_cols
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vocab.contains_key(word)
    }

    fn empty(n_words: usize, dim: usize) -> Self {
        Self {
            vocab: HashMap::with_capacity(n_words.min(PREALLOC_WORDS)),
            vectors: Matrix::new(dim),
        }
    }

    fn insert(&mut self, word: String, mut values: Vec<f32>) {
        // first occurrence wins
        if self.vocab.contains_key(&word) {
            return;
        }
        normalize(&mut values);
        let row = self.vectors.push_row(&values);
        self.vocab.insert(word, row);
    }

    fn vector(&self, word: &str) -> Result<&[f32]> {
        self.vocab
            .get(word)
            .map(|&row| self.vectors.row(row))
            .ok_or_else(|| Error::out_of_vocabulary(word))
    }
}

impl WordSimilarity for WordVectors {
    fn similarity(&self, a: &str, b: &str) -> Result<f32> {
        let va = self.vector(a)?;
        let vb = self.vector(b)?;
        let dot: f32 = va.iter().zip(vb).map(|(x, y)| x * y).sum();
        // rounding can push unit vectors slightly past 1
        Ok(dot.clamp(-1.0, 1.0))
    }
}

/// Reads `<vocab> <dim>`, rejecting tables whose byte size overflows `usize`.
fn read_header<R: BufRead>(reader: &mut R) -> Result<(usize, usize)> {
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let mut fields = header.split_whitespace().map(str::parse::<usize>);
    let (n_words, dim) = match (fields.next(), fields.next()) {
        (Some(Ok(n_words)), Some(Ok(dim))) => (n_words, dim),
        _ => {
            return Err(Error::invalid_embeddings(format!(
                "bad header line '{}'",
                header.trim_end()
            )))
        }
    };
    n_words
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .ok_or_else(|| {
            Error::invalid_embeddings(format!("{} words of dimension {} is too large", n_words, dim))
        })?;
    Ok((n_words, dim))
}

fn truncated(n_words: usize, read: usize) -> Error {
    Error::invalid_embeddings(format!("expected {} words, file ended after {}", n_words, read))
}

fn normalize(row: &mut [f32]) {
    let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        row.iter_mut().for_each(|x| *x /= norm);
    }
}
