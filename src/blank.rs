//! Fill-in-the-blank task: ground truth loading, exact match accuracy and
//! embedding based word similarity.

use crate::embeddings::{VectorFormat, WordSimilarity, WordVectors};
use crate::error::{Error, Result};
use crate::split::{load_split_indices, read_json, select};
use crate::utils::{ensure_aligned, mean};
use log::{info, warn};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Deserialize)]
struct BlankEntry {
    word: String,
}

/// Loads the lower-cased ground truth words of the instances in `split_label`.
pub fn load_ground_truth(
    dataset_path: &Path,
    split_path: &Path,
    split_label: &str,
) -> Result<Vec<String>> {
    let dataset: Vec<BlankEntry> = read_json(dataset_path)?;
    let indices = load_split_indices(split_path, split_label)?;
    let total = dataset.len();

    let ground_truth: Vec<String> = select(dataset, &indices)
        .map(|entry| entry.word.to_lowercase())
        .collect();
    info!(
        "Loaded {} of {} fill-in-the-blank instances from {}",
        ground_truth.len(),
        total,
        dataset_path.display()
    );
    Ok(ground_truth)
}

pub struct FillInTheBlankEvaluator {
    model: Option<Arc<dyn WordSimilarity>>,
}

impl FillInTheBlankEvaluator {
    /// Without a model only [`compute_accuracy`](Self::compute_accuracy) is usable.
    pub fn new(model: Option<Arc<dyn WordSimilarity>>) -> Self {
        FillInTheBlankEvaluator { model }
    }

    pub fn from_word2vec(path: &Path, format: VectorFormat) -> Result<Self> {
        let vectors = WordVectors::load(path, format)?;
        Ok(Self::new(Some(Arc::new(vectors))))
    }

    pub fn has_embeddings(&self) -> bool {
        self.model.is_some()
    }

    /// Exact match accuracy. Returns the mean and one 0/1 score per instance.
    pub fn compute_accuracy<G, P>(&self, ground_truth: &[G], predictions: &[P]) -> Result<(f64, Vec<f64>)>
    where
        G: AsRef<str>,
        P: AsRef<str>,
    {
        ensure_aligned(ground_truth.len(), &[predictions.len()])?;

        let scores: Vec<f64> = ground_truth
            .iter()
            .zip(predictions)
            .map(|(gt, pred)| if gt.as_ref() == pred.as_ref() { 1.0 } else { 0.0 })
            .collect();
        Ok((mean(&scores)?, scores))
    }

    /// Cosine similarity between the ground truth and predicted word vectors.
    /// A pair with an out of vocabulary word scores 0.0.
    pub fn compute_word_similarity<G, P>(
        &self,
        ground_truth: &[G],
        predictions: &[P],
    ) -> Result<(f64, Vec<f64>)>
    where
        G: AsRef<str>,
        P: AsRef<str>,
    {
        let model = self.model.as_deref().ok_or(Error::MissingEmbeddings)?;
        ensure_aligned(ground_truth.len(), &[predictions.len()])?;

        let mut n_oov = 0;
        let mut scores = Vec::with_capacity(ground_truth.len());
        for (gt, pred) in ground_truth.iter().zip(predictions) {
            match model.similarity(gt.as_ref(), pred.as_ref()) {
                Ok(sim) => scores.push(sim as f64),
                Err(Error::OutOfVocabulary(_)) => {
                    n_oov += 1;
                    scores.push(0.0);
                }
                Err(e) => return Err(e),
            }
        }
        if n_oov > 0 {
            warn!(
                "{} of {} word pairs were out of vocabulary and scored 0.0",
                n_oov,
                scores.len()
            );
        }
        Ok((mean(&scores)?, scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn close_enough(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn json_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Similarity lookup keyed on unordered word pairs.
    struct FixedSimilarity(HashMap<(String, String), f32>);

    impl WordSimilarity for FixedSimilarity {
        fn similarity(&self, a: &str, b: &str) -> Result<f32> {
            if a == b {
                return Ok(1.0);
            }
            self.0
                .get(&(a.to_string(), b.to_string()))
                .or_else(|| self.0.get(&(b.to_string(), a.to_string())))
                .copied()
                .ok_or_else(|| Error::out_of_vocabulary(b))
        }
    }

    fn evaluator_with_vectors() -> FillInTheBlankEvaluator {
        let vectors = WordVectors::from_pairs([
            ("cat", vec![1.0, 0.0, 0.0]),
            ("dog", vec![0.8, 0.6, 0.0]),
            ("puppy", vec![0.6, 0.8, 0.0]),
            ("chair", vec![0.0, 0.0, 1.0]),
            ("sofa", vec![0.0, 0.6, 0.8]),
        ])
        .unwrap();
        FillInTheBlankEvaluator::new(Some(Arc::new(vectors)))
    }

    #[test]
    fn test_exact_match_accuracy() {
        let evaluator = FillInTheBlankEvaluator::new(None);
        let (mean_acc, scores) = evaluator
            .compute_accuracy(&["cat", "dog"], &["cat", "puppy"])
            .unwrap();
        assert!(close_enough(mean_acc, 0.5, 1e-12), "Expected 0.5, got {}", mean_acc);
        assert_eq!(scores, vec![1.0, 0.0]);
    }

    #[test]
    fn test_accuracy_is_bounded() {
        let evaluator = FillInTheBlankEvaluator::new(None);
        let gt = ["cat", "dog", "chair", "table"];
        let pred = ["cat", "puppy", "sofa", "table"];
        let (mean_acc, scores) = evaluator.compute_accuracy(&gt, &pred).unwrap();
        assert!(scores.iter().all(|&s| s == 0.0 || s == 1.0));
        assert!((0.0..=1.0).contains(&mean_acc));
    }

    #[test]
    fn test_accuracy_length_mismatch() {
        let evaluator = FillInTheBlankEvaluator::new(None);
        let result = evaluator.compute_accuracy(&["cat", "dog"], &["cat"]);
        assert!(matches!(
            result,
            Err(Error::LengthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_similarity_without_embeddings_is_a_configuration_error() {
        let evaluator = FillInTheBlankEvaluator::new(None);
        assert!(!evaluator.has_embeddings());
        let result = evaluator.compute_word_similarity(&["cat"], &["cat"]);
        assert!(matches!(result, Err(Error::MissingEmbeddings)));
    }

    #[test]
    fn test_similarity_per_instance() {
        let evaluator = evaluator_with_vectors();
        let gt = ["cat", "dog", "chair"];
        let pred = ["cat", "puppy", "sofa"];
        let (mean_sim, scores) = evaluator.compute_word_similarity(&gt, &pred).unwrap();

        assert!(close_enough(scores[0], 1.0, 1e-6), "Expected 1.0, got {}", scores[0]);
        assert!(close_enough(scores[1], 0.96, 1e-6), "Expected 0.96, got {}", scores[1]);
        assert!(close_enough(scores[2], 0.8, 1e-6), "Expected 0.8, got {}", scores[2]);
        assert!(close_enough(mean_sim, (1.0 + 0.96 + 0.8) / 3.0, 1e-6));
    }

    #[test]
    fn test_out_of_vocabulary_scores_zero_and_stays_in_mean() {
        let evaluator = evaluator_with_vectors();
        let gt = ["cat", "table"];
        let pred = ["cat", "cow"];
        let (mean_sim, scores) = evaluator.compute_word_similarity(&gt, &pred).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[1], 0.0);
        assert!(close_enough(mean_sim, 0.5, 1e-6), "Expected 0.5, got {}", mean_sim);
    }

    #[test]
    fn test_similarity_uses_injected_model() {
        let mut pairs = HashMap::new();
        pairs.insert(("table".to_string(), "desk".to_string()), -0.25f32);
        let evaluator = FillInTheBlankEvaluator::new(Some(Arc::new(FixedSimilarity(pairs))));
        let (mean_sim, scores) = evaluator
            .compute_word_similarity(&["table", "desk"], &["desk", "lamp"])
            .unwrap();
        assert_eq!(scores, vec![-0.25, 0.0]);
        assert!(close_enough(mean_sim, -0.125, 1e-9));
        assert!(scores.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_similarity_length_mismatch() {
        let evaluator = evaluator_with_vectors();
        let result = evaluator.compute_word_similarity(&["cat"], &["cat", "dog"]);
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn test_load_ground_truth_filters_and_lowercases() {
        let dataset = json_file(
            r#"[{"word": "Cat", "sent": "the _ sat"},
                {"word": "dog"},
                {"word": "CHAIR"},
                {"word": "table"}]"#,
        );
        let splits = json_file(r#"{"testSubset": [2, 0], "train": [1, 3]}"#);
        let gt = load_ground_truth(dataset.path(), splits.path(), "testSubset").unwrap();
        assert_eq!(gt, vec!["cat", "chair"]);
    }

    #[test]
    fn test_load_ground_truth_unknown_split() {
        let dataset = json_file(r#"[{"word": "cat"}]"#);
        let splits = json_file(r#"{"train": [0]}"#);
        let result = load_ground_truth(dataset.path(), splits.path(), "val");
        assert!(matches!(result, Err(Error::SplitNotFound(_))));
    }
}
