use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info};
use multisubs_eval::score::{score_blank_files, score_translation_files, FileReport};
use multisubs_eval::{
    blank, translation, FillInTheBlankEvaluator, LexicalTranslationEvaluator, Result, VectorFormat,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Evaluate MultiSubs fill-in-the-blank and lexical translation predictions
#[derive(Parser)]
#[command(name = "multisubs-eval", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exact match accuracy and word similarity for fill-in-the-blank
    Blank(BlankArgs),
    /// Ambiguous Lexical Index for lexical translation
    Translation(TranslationArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Dataset JSON file
    #[arg(long, short)]
    dataset: PathBuf,

    /// Split definition JSON file
    #[arg(long, short)]
    splits: PathBuf,

    /// Split to evaluate on
    #[arg(long, short = 'l', default_value = "testSubset")]
    split_label: String,

    /// Write the detailed scores next to each prediction file as JSON
    #[arg(long)]
    dump: bool,

    /// Prediction files, one word per line
    #[arg(required = true)]
    predictions: Vec<PathBuf>,
}

#[derive(Args)]
struct BlankArgs {
    #[command(flatten)]
    split: SplitArgs,

    /// Word vectors; without them only accuracy is computed
    #[arg(long, short = 'w')]
    word_vectors: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Binary)]
    vector_format: Format,
}

#[derive(Args)]
struct TranslationArgs {
    #[command(flatten)]
    split: SplitArgs,

    /// Source word to translations dictionary JSON file
    #[arg(long = "dict")]
    dictionary: PathBuf,

    /// Number of per-word ALI lines to print, in order of first appearance
    #[arg(long, default_value_t = 11)]
    sample: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Binary,
    Text,
}

impl From<Format> for VectorFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Binary => VectorFormat::Binary,
            Format::Text => VectorFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Blank(args) => run_blank(args).await,
        Commands::Translation(args) => run_translation(args).await,
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every prediction file was scored.
async fn run_blank(args: BlankArgs) -> Result<bool> {
    info!("Setting up evaluator...");
    let evaluator = match &args.word_vectors {
        Some(path) => FillInTheBlankEvaluator::from_word2vec(path, args.vector_format.into())?,
        None => FillInTheBlankEvaluator::new(None),
    };

    info!("Loading dataset...");
    let split = &args.split;
    let ground_truth = blank::load_ground_truth(&split.dataset, &split.splits, &split.split_label)?;

    let reports = score_blank_files(&evaluator, &ground_truth, &split.predictions).await;
    let mut all_ok = true;
    for report in reports {
        match report {
            Ok(report) => {
                println!("\nEvaluating {}...", report.prediction_file.display());
                println!("Mean accuracy: {:.4}", report.scores.mean_accuracy);
                if let Some(mean_similarity) = report.scores.mean_similarity {
                    println!("Mean word similarity: {:.4}", mean_similarity);
                }
                if split.dump && !dump_or_log(&report, "eval-blank.json") {
                    all_ok = false;
                }
            }
            Err(e) => {
                error!("{}", e);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

/// Returns whether every prediction file was scored.
async fn run_translation(args: TranslationArgs) -> Result<bool> {
    let evaluator = LexicalTranslationEvaluator::new();

    info!("Loading dataset...");
    let split = &args.split;
    let ground_truth = translation::load_ground_truth(
        &split.dataset,
        &split.splits,
        &split.split_label,
        &args.dictionary,
    )?;

    let reports = score_translation_files(&evaluator, &ground_truth, &split.predictions).await;
    let mut all_ok = true;
    for report in reports {
        match report {
            Ok(report) => {
                println!("\nEvaluating {}...", report.prediction_file.display());
                println!("Mean ALI: {:.4}", report.scores.score);
                println!("Sample per-word ALI:");
                let words = report.scores.words_by_first_appearance();
                for (word, word_ali) in words.into_iter().take(args.sample) {
                    println!(
                        "{}: {:.2} ({} instances)",
                        word,
                        word_ali.mean,
                        word_ali.scores.len()
                    );
                }
                if split.dump && !dump_or_log(&report, "eval-ali.json") {
                    all_ok = false;
                }
            }
            Err(e) => {
                error!("{}", e);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

/// Writes the scores next to the prediction file. A failure is logged and
/// reported as `false` so the remaining files still get scored.
fn dump_or_log<T: Serialize>(report: &FileReport<T>, suffix: &str) -> bool {
    match dump(report, suffix) {
        Ok(()) => true,
        Err(e) => {
            error!("{}: {}", report.prediction_file.display(), e);
            false
        }
    }
}

fn dump<T: Serialize>(report: &FileReport<T>, suffix: &str) -> Result<()> {
    let path = with_suffix(&report.prediction_file, suffix);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(writer, &report.scores)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
