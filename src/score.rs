use crate::blank::FillInTheBlankEvaluator;
use crate::error::{Error, Result};
use crate::predictions::read_predictions;
use crate::translation::{LexicalTranslationEvaluator, TranslationGroundTruth, WordAli};
use crate::utils::ensure_aligned;
use futures::future::join_all;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::join;

#[derive(Debug, Clone, Serialize)]
pub struct BlankScores {
    pub mean_accuracy: f64,
    pub accuracies: Vec<f64>,
    /// Present only when the evaluator has word vectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarities: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AliScores {
    pub score: f64,
    pub words: BTreeMap<String, WordAli>,
}

impl AliScores {
    /// Source words ordered by the index of their first instance.
    pub fn words_by_first_appearance(&self) -> Vec<(&str, &WordAli)> {
        let mut words: Vec<(&str, &WordAli)> =
            self.words.iter().map(|(w, ali)| (w.as_str(), ali)).collect();
        words.sort_by_key(|(_, ali)| ali.scores.keys().next().copied());
        words
    }
}

/// Scores of one prediction file.
#[derive(Debug, Clone)]
pub struct FileReport<T> {
    pub prediction_file: PathBuf,
    pub scores: T,
}

pub async fn score_fill_in_the_blank(
    evaluator: &FillInTheBlankEvaluator,
    ground_truth: &[String],
    predictions: &[String],
) -> Result<BlankScores> {
    ensure_aligned(ground_truth.len(), &[predictions.len()])?;

    let (accuracy, similarity) = join!(
        async { evaluator.compute_accuracy(ground_truth, predictions) },
        async {
            if evaluator.has_embeddings() {
                Some(evaluator.compute_word_similarity(ground_truth, predictions))
            } else {
                None
            }
        }
    );

    let (mean_accuracy, accuracies) = accuracy?;
    let (mean_similarity, similarities) = match similarity.transpose()? {
        Some((mean, scores)) => (Some(mean), Some(scores)),
        None => (None, None),
    };
    Ok(BlankScores {
        mean_accuracy,
        accuracies,
        mean_similarity,
        similarities,
    })
}

pub async fn score_lexical_translation(
    evaluator: &LexicalTranslationEvaluator,
    ground_truth: &TranslationGroundTruth,
    predictions: &[String],
) -> Result<AliScores> {
    ensure_aligned(ground_truth.len(), &[predictions.len()])?;
    let (score, words) = evaluator.compute_ali(
        &ground_truth.sources,
        predictions,
        &ground_truth.positives,
        &ground_truth.negatives,
    )?;
    Ok(AliScores { score, words })
}

/// Reads and scores every fill-in-the-blank prediction file. Results keep the
/// order of `prediction_files`; a failing file does not stop the others.
pub async fn score_blank_files(
    evaluator: &FillInTheBlankEvaluator,
    ground_truth: &[String],
    prediction_files: &[PathBuf],
) -> Vec<Result<FileReport<BlankScores>>> {
    let tasks = prediction_files.iter().map(|path| async move {
        let predictions = read_predictions(path)?;
        let scores = score_fill_in_the_blank(evaluator, ground_truth, &predictions).await?;
        debug!("{}: accuracy {:.4}", path.display(), scores.mean_accuracy);
        Ok::<_, Error>(report(path, scores))
    });
    join_all(tasks).await
}

/// Reads and scores every lexical translation prediction file. Results keep the
/// order of `prediction_files`; a failing file does not stop the others.
pub async fn score_translation_files(
    evaluator: &LexicalTranslationEvaluator,
    ground_truth: &TranslationGroundTruth,
    prediction_files: &[PathBuf],
) -> Vec<Result<FileReport<AliScores>>> {
    let tasks = prediction_files.iter().map(|path| async move {
        let predictions = read_predictions(path)?;
        let scores = score_lexical_translation(evaluator, ground_truth, &predictions).await?;
        debug!("{}: ALI {:.4}", path.display(), scores.score);
        Ok::<_, Error>(report(path, scores))
    });
    join_all(tasks).await
}

fn report<T>(path: &Path, scores: T) -> FileReport<T> {
    FileReport {
        prediction_file: path.to_path_buf(),
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::WordVectors;
    use std::collections::HashSet;
    use std::io::Write;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    fn close_enough(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn prediction_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn translation_ground_truth() -> TranslationGroundTruth {
        let set = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<HashSet<_>>();
        TranslationGroundTruth {
            sources: strings(&["seal", "seal", "bank"]),
            targets: strings(&["selo", "foca", "banco"]),
            positives: vec![set(&["selo", "sello"]), set(&["foca"]), set(&["banco"])],
            negatives: vec![set(&["foca"]), set(&["selo", "sello"]), set(&["orilla"])],
        }
    }

    #[test]
    fn test_blank_scores_without_vectors() {
        let evaluator = FillInTheBlankEvaluator::new(None);
        let rt = Runtime::new().expect("Failed to create async runtime");
        let scores = rt
            .block_on(score_fill_in_the_blank(
                &evaluator,
                &strings(&["cat", "dog"]),
                &strings(&["cat", "puppy"]),
            ))
            .unwrap();
        assert!(close_enough(scores.mean_accuracy, 0.5, 1e-12));
        assert!(scores.mean_similarity.is_none() && scores.similarities.is_none());
    }

    #[test]
    fn test_blank_scores_with_vectors() {
        let vectors =
            WordVectors::from_pairs([("cat", vec![1.0, 0.0]), ("dog", vec![0.0, 1.0])]).unwrap();
        let evaluator = FillInTheBlankEvaluator::new(Some(Arc::new(vectors)));
        let rt = Runtime::new().expect("Failed to create async runtime");
        let scores = rt
            .block_on(score_fill_in_the_blank(
                &evaluator,
                &strings(&["cat", "dog"]),
                &strings(&["cat", "cat"]),
            ))
            .unwrap();
        let mean_similarity = scores.mean_similarity.unwrap();
        assert!(
            close_enough(mean_similarity, 0.5, 1e-6),
            "Expected 0.5, got {}",
            mean_similarity
        );
        assert_eq!(scores.similarities.unwrap().len(), 2);
    }

    #[test]
    fn test_blank_files_keep_order_and_isolate_failures() {
        let evaluator = FillInTheBlankEvaluator::new(None);
        let ground_truth = strings(&["cat", "dog"]);
        let good = prediction_file("cat\ndog\n");
        let short = prediction_file("cat\n");
        let files = vec![good.path().to_path_buf(), short.path().to_path_buf()];

        let rt = Runtime::new().expect("Failed to create async runtime");
        let reports = rt.block_on(score_blank_files(&evaluator, &ground_truth, &files));

        assert_eq!(reports.len(), 2);
        let first = reports[0].as_ref().unwrap();
        assert_eq!(first.prediction_file, files[0]);
        assert_eq!(first.scores.mean_accuracy, 1.0);
        assert!(matches!(
            reports[1],
            Err(Error::LengthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_translation_files() {
        let evaluator = LexicalTranslationEvaluator::new();
        let ground_truth = translation_ground_truth();
        let mfs = prediction_file("selo\nselo\nbanco\n");
        let files = vec![mfs.path().to_path_buf()];

        let rt = Runtime::new().expect("Failed to create async runtime");
        let reports = rt.block_on(score_translation_files(&evaluator, &ground_truth, &files));

        let report = reports[0].as_ref().unwrap();
        // seal: (1 - 1) / 2 = 0, bank: 1
        assert!(close_enough(report.scores.score, 0.5, 1e-12));
        assert_eq!(report.scores.words["seal"].scores.len(), 2);
    }

    #[test]
    fn test_words_follow_first_appearance() {
        let evaluator = LexicalTranslationEvaluator::new();
        let set = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<HashSet<_>>();
        let ground_truth = TranslationGroundTruth {
            sources: strings(&["seal", "bank", "seal", "arm"]),
            targets: strings(&["selo", "banco", "foca", "brazo"]),
            positives: vec![set(&["selo"]), set(&["banco"]), set(&["foca"]), set(&["brazo"])],
            negatives: vec![set(&["foca"]), set(&["orilla"]), set(&["selo"]), set(&["arma"])],
        };
        let rt = Runtime::new().expect("Failed to create async runtime");
        let scores = rt
            .block_on(score_lexical_translation(
                &evaluator,
                &ground_truth,
                &strings(&["selo", "banco", "foca", "arma"]),
            ))
            .unwrap();

        let order: Vec<&str> = scores
            .words_by_first_appearance()
            .into_iter()
            .map(|(word, _)| word)
            .collect();
        assert_eq!(order, vec!["seal", "bank", "arm"]);
    }

    #[test]
    fn test_ali_report_json_layout() {
        let evaluator = LexicalTranslationEvaluator::new();
        let rt = Runtime::new().expect("Failed to create async runtime");
        let scores = rt
            .block_on(score_lexical_translation(
                &evaluator,
                &translation_ground_truth(),
                &strings(&["selo", "rubbish", "orilla"]),
            ))
            .unwrap();

        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["words"]["bank"]["mean"], -1.0);
        assert_eq!(json["words"]["seal"]["scores"]["0"], 1);
        assert_eq!(json["words"]["seal"]["scores"]["1"], 0);
        assert!(json["score"].is_number());
    }
}
