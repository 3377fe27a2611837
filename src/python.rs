use crate::blank::{self, FillInTheBlankEvaluator};
use crate::embeddings::VectorFormat;
use crate::error::Error;
use crate::score::score_blank_files;
use crate::translation::{self, LexicalTranslationEvaluator};
use numpy::{IntoPyArray, PyArray1};
use once_cell::sync::Lazy;
use pyo3::exceptions::{PyIOError, PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::runtime::Runtime;

static RUNTIME: Lazy<Runtime> =
    Lazy::new(|| Runtime::new().expect("Failed to create async runtime"));

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        let msg = err.to_string();
        match err {
            Error::MissingEmbeddings => PyRuntimeError::new_err(msg),
            Error::SplitNotFound(_) => PyKeyError::new_err(msg),
            Error::Io(_) => PyIOError::new_err(msg),
            Error::LengthMismatch { .. }
            | Error::OutOfVocabulary(_)
            | Error::EmptyInput
            | Error::InvalidEmbeddings(_)
            | Error::Json(_) => PyValueError::new_err(msg),
        }
    }
}

#[pyclass(name = "FillInTheBlankEvaluator")]
struct PyFillInTheBlankEvaluator {
    inner: FillInTheBlankEvaluator,
}

#[pymethods]
impl PyFillInTheBlankEvaluator {
    #[new]
    #[pyo3(signature = (w2v_model_path=None, binary=true))]
    fn new(py: Python<'_>, w2v_model_path: Option<PathBuf>, binary: bool) -> PyResult<Self> {
        let format = if binary {
            VectorFormat::Binary
        } else {
            VectorFormat::Text
        };
        let inner = match w2v_model_path {
            Some(path) => py.allow_threads(|| FillInTheBlankEvaluator::from_word2vec(&path, format))?,
            None => FillInTheBlankEvaluator::new(None),
        };
        Ok(Self { inner })
    }

    fn compute_accuracy<'py>(
        &self,
        py: Python<'py>,
        groundtruth_list: Vec<String>,
        prediction_list: Vec<String>,
    ) -> PyResult<(f64, Bound<'py, PyArray1<f64>>)> {
        let (mean, scores) = self.inner.compute_accuracy(&groundtruth_list, &prediction_list)?;
        Ok((mean, scores.into_pyarray(py)))
    }

    fn compute_word_similarity<'py>(
        &self,
        py: Python<'py>,
        groundtruth_list: Vec<String>,
        prediction_list: Vec<String>,
    ) -> PyResult<(f64, Bound<'py, PyArray1<f64>>)> {
        let (mean, scores) = py.allow_threads(|| {
            self.inner
                .compute_word_similarity(&groundtruth_list, &prediction_list)
        })?;
        Ok((mean, scores.into_pyarray(py)))
    }

    /// Scores several prediction files against the same ground truth. Returns
    /// `(mean_accuracy, mean_similarity)` per file; similarity is None without
    /// word vectors.
    fn evaluate_files(
        &self,
        py: Python<'_>,
        groundtruth_list: Vec<String>,
        prediction_files: Vec<PathBuf>,
    ) -> PyResult<Vec<(f64, Option<f64>)>> {
        let reports = py.allow_threads(|| {
            RUNTIME.block_on(score_blank_files(
                &self.inner,
                &groundtruth_list,
                &prediction_files,
            ))
        });
        reports
            .into_iter()
            .map(|report| {
                let report = report?;
                Ok((report.scores.mean_accuracy, report.scores.mean_similarity))
            })
            .collect()
    }
}

#[pyclass(name = "LexicalTranslationEvaluator")]
struct PyLexicalTranslationEvaluator {
    inner: LexicalTranslationEvaluator,
}

#[pymethods]
impl PyLexicalTranslationEvaluator {
    #[new]
    fn new() -> Self {
        Self {
            inner: LexicalTranslationEvaluator::new(),
        }
    }

    /// Returns the overall ALI and a dict
    /// `{source_word: {"mean": float, "scores": {instance_index: score}}}`.
    fn compute_ali<'py>(
        &self,
        py: Python<'py>,
        gold_source_words: Vec<String>,
        predicted_target_words: Vec<String>,
        positive_target_sets: Vec<HashSet<String>>,
        negative_target_sets: Vec<HashSet<String>>,
    ) -> PyResult<(f64, Bound<'py, PyDict>)> {
        let (ali, by_word) = self.inner.compute_ali(
            &gold_source_words,
            &predicted_target_words,
            &positive_target_sets,
            &negative_target_sets,
        )?;

        let ali_dict = PyDict::new(py);
        for (word, word_ali) in by_word {
            let entry = PyDict::new(py);
            entry.set_item("mean", word_ali.mean)?;
            entry.set_item("scores", word_ali.scores)?;
            ali_dict.set_item(word, entry)?;
        }
        Ok((ali, ali_dict))
    }
}

#[pyfunction]
#[pyo3(signature = (dataset_json_filepath, split_json_filepath, split_label="testSubset"))]
fn load_fill_in_the_blank(
    dataset_json_filepath: PathBuf,
    split_json_filepath: PathBuf,
    split_label: &str,
) -> PyResult<Vec<String>> {
    Ok(blank::load_ground_truth(
        &dataset_json_filepath,
        &split_json_filepath,
        split_label,
    )?)
}

#[pyfunction]
fn load_lexical_translation(
    dataset_json_filepath: PathBuf,
    split_json_filepath: PathBuf,
    split_label: &str,
    dict_json_filepath: PathBuf,
) -> PyResult<(
    Vec<String>,
    Vec<String>,
    Vec<HashSet<String>>,
    Vec<HashSet<String>>,
)> {
    let gt = translation::load_ground_truth(
        &dataset_json_filepath,
        &split_json_filepath,
        split_label,
        &dict_json_filepath,
    )?;
    Ok((gt.sources, gt.targets, gt.positives, gt.negatives))
}

#[pymodule]
fn multisubs_eval(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFillInTheBlankEvaluator>()?;
    m.add_class::<PyLexicalTranslationEvaluator>()?;
    m.add_function(wrap_pyfunction!(load_fill_in_the_blank, m)?)?;
    m.add_function(wrap_pyfunction!(load_lexical_translation, m)?)?;
    Ok(())
}
