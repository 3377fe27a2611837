//! Scoring for the MultiSubs word-level tasks: fill-in-the-blank (exact match
//! accuracy and word vector similarity) and lexical translation (Ambiguous
//! Lexical Index).
//!
//! Words are expected to be case-normalized already; the loaders lower-case
//! the ground truth they extract.

pub mod blank;
pub mod embeddings;
pub mod error;
pub mod predictions;
pub mod score;
pub mod split;
pub mod translation;
mod utils;

#[cfg(feature = "python")]
mod python;

pub use crate::blank::FillInTheBlankEvaluator;
pub use crate::embeddings::{VectorFormat, WordSimilarity, WordVectors};
pub use crate::error::{Error, Result};
pub use crate::translation::{LexicalTranslationEvaluator, TranslationGroundTruth, WordAli};
