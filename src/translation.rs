//! Lexical translation task: ground truth loading and the Ambiguous Lexical
//! Index (ALI).
//!
//! ALI rewards a predicted translation found among the instance's positive
//! targets (+1), penalizes one found among the known translations of the
//! source word that are wrong for this instance (-1), and is neutral
//! otherwise (0). Scores are averaged per source word first, then across
//! source words, so every ambiguous word weighs the same.

use crate::error::Result;
use crate::split::{load_split_indices, read_json, select};
use crate::utils::{ensure_aligned, mean};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

#[derive(Deserialize)]
struct TranslationEntry {
    word: String,
    target: String,
    #[serde(rename = "positiveTargets")]
    positive_targets: Vec<String>,
}

/// Ground truth for the instances of one split, aligned by position.
#[derive(Debug, Default, Clone)]
pub struct TranslationGroundTruth {
    pub sources: Vec<String>,
    pub targets: Vec<String>,
    pub positives: Vec<HashSet<String>>,
    pub negatives: Vec<HashSet<String>>,
}

impl TranslationGroundTruth {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn push(&mut self, entry: TranslationEntry, dictionary: &HashMap<String, Vec<String>>) {
        let source = entry.word.to_lowercase();
        let positive: HashSet<String> = entry
            .positive_targets
            .iter()
            .map(|trg| trg.to_lowercase())
            .collect();
        let negative: HashSet<String> = dictionary
            .get(&source)
            .into_iter()
            .flatten()
            .map(|trg| trg.to_lowercase())
            .filter(|trg| !positive.contains(trg))
            .collect();

        self.sources.push(source);
        self.targets.push(entry.target.to_lowercase());
        self.positives.push(positive);
        self.negatives.push(negative);
    }
}

/// Loads source words, reference targets and the positive/negative target
/// sets of every instance in `split_label`, all lower-cased.
///
/// The negative set of an instance holds every dictionary translation of its
/// source word that is not a positive target. A source word missing from the
/// dictionary gets an empty negative set.
pub fn load_ground_truth(
    dataset_path: &Path,
    split_path: &Path,
    split_label: &str,
    dictionary_path: &Path,
) -> Result<TranslationGroundTruth> {
    let dataset: Vec<TranslationEntry> = read_json(dataset_path)?;
    let indices = load_split_indices(split_path, split_label)?;
    let dictionary: HashMap<String, Vec<String>> = read_json(dictionary_path)?;
    info!(
        "Loaded translation dictionary with {} source words from {}",
        dictionary.len(),
        dictionary_path.display()
    );
    let total = dataset.len();

    let mut ground_truth = TranslationGroundTruth::default();
    for entry in select(dataset, &indices) {
        ground_truth.push(entry, &dictionary);
    }
    info!(
        "Loaded {} of {} lexical translation instances from {}",
        ground_truth.len(),
        total,
        dataset_path.display()
    );
    Ok(ground_truth)
}

/// ALI of a single instance. Positive targets are checked before negative ones.
pub fn ali_score(predicted: &str, positive: &HashSet<String>, negative: &HashSet<String>) -> i8 {
    if positive.contains(predicted) {
        1
    } else if negative.contains(predicted) {
        -1
    } else {
        0
    }
}

/// ALI of one source word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordAli {
    pub mean: f64,
    /// Instance index (position in the evaluated lists) to raw score.
    pub scores: BTreeMap<usize, i8>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalTranslationEvaluator;

impl LexicalTranslationEvaluator {
    pub fn new() -> Self {
        LexicalTranslationEvaluator
    }

    /// Returns the overall ALI (mean of per-source-word means) and the
    /// per-source-word breakdown.
    pub fn compute_ali<S, P>(
        &self,
        sources: &[S],
        predictions: &[P],
        positives: &[HashSet<String>],
        negatives: &[HashSet<String>],
    ) -> Result<(f64, BTreeMap<String, WordAli>)>
    where
        S: AsRef<str>,
        P: AsRef<str>,
    {
        ensure_aligned(
            sources.len(),
            &[predictions.len(), positives.len(), negatives.len()],
        )?;

        let mut by_word: BTreeMap<&str, BTreeMap<usize, i8>> = BTreeMap::new();
        let instances = sources.iter().zip(predictions).zip(positives.iter().zip(negatives));
        for (i, ((src, pred), (positive, negative))) in instances.enumerate() {
            let score = ali_score(pred.as_ref(), positive, negative);
            by_word.entry(src.as_ref()).or_default().insert(i, score);
        }

        let mut ali_dict = BTreeMap::new();
        let mut word_means = Vec::with_capacity(by_word.len());
        for (word, scores) in by_word {
            let values: Vec<f64> = scores.values().map(|&s| s as f64).collect();
            let word_mean = mean(&values)?;
            word_means.push(word_mean);
            ali_dict.insert(
                word.to_string(),
                WordAli {
                    mean: word_mean,
                    scores,
                },
            );
        }

        let ali = mean(&word_means)?;
        debug!(
            "ALI {:.4} over {} source words ({} instances)",
            ali,
            word_means.len(),
            sources.len()
        );
        Ok((ali, ali_dict))
    }
}
