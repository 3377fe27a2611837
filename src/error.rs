//! Error types for multisubs evaluation.

use thiserror::Error;

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for evaluation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Ground truth and predictions are not aligned.
    #[error("Number of ground truth words do not match predicted: {expected} vs. {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Word similarity was requested from an evaluator built without embeddings.
    #[error(
        "Cannot compute word similarity because the word vectors have not been loaded. \
         Construct the evaluator with an embedding table to use this metric."
    )]
    MissingEmbeddings,

    /// Word is not in the embedding vocabulary.
    #[error("Word '{0}' not in vocabulary")]
    OutOfVocabulary(String),

    /// Split label is not defined in the split file.
    #[error("Split '{0}' not found in split file")]
    SplitNotFound(String),

    /// Nothing to score.
    #[error("Cannot compute a mean over zero instances")]
    EmptyInput,

    /// Embedding file could not be parsed.
    #[error("Invalid embedding file: {0}")]
    InvalidEmbeddings(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Error::LengthMismatch { expected, actual }
    }

    pub fn out_of_vocabulary(word: impl Into<String>) -> Self {
        Error::OutOfVocabulary(word.into())
    }

    pub fn split_not_found(label: impl Into<String>) -> Self {
        Error::SplitNotFound(label.into())
    }

    pub fn invalid_embeddings(msg: impl Into<String>) -> Self {
        Error::InvalidEmbeddings(msg.into())
    }
}
