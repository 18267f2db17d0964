use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use varfold_cv::{
    Classifier, ClassifierOptions, CrossValidation, FoldMode, MetricsReporter,
    RandomForestClassifier, ResamplingClassifier, ResultWriter,
};
use varfold_data::{Dataset, DatasetReader, ExperimentName, SyntheticConfig, imbalance};

#[derive(Parser)]
#[command(name = "varfold")]
#[command(about = "Cross-validated evaluation of classifiers on imbalanced variant datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared run and output options.
#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Run folds in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Worker threads per resampling ensemble
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Print the report as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+); nothing is written without it
    #[arg(long)]
    experiment: Option<String>,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Cross-validate on folds pre-assigned by a fold-id column
    Grouped {
        /// Input CSV files, evaluated one after another
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Name of the integer fold-id column
        #[arg(long, default_value = "fold")]
        fold_column: String,

        /// Number of folds (fold-ids must lie in 0..folds)
        #[arg(long, default_value_t = 10)]
        folds: usize,

        /// Label column (defaults to the last column)
        #[arg(long)]
        label: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Generate, imbalance, and cross-validate a synthetic dataset
    Synthetic {
        /// Number of generated records before imbalancing
        #[arg(long, default_value_t = 10_000)]
        examples: usize,

        /// Number of numeric attributes
        #[arg(long, default_value_t = 20)]
        attributes: usize,

        /// Minority-class records kept after imbalancing
        #[arg(long, default_value_t = 50)]
        minority: usize,

        /// Number of stratified folds
        #[arg(long, default_value_t = 5)]
        folds: usize,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Run one classifier and emit its report and artifacts.
fn evaluate<C, F>(
    dataset: &Dataset,
    cv: &CrossValidation,
    factory: F,
    run: &RunArgs,
    experiment: Option<ExperimentName>,
) -> Result<()>
where
    C: Classifier,
    F: Fn(usize) -> C + Sync,
{
    let result = cv
        .run(dataset, factory)
        .with_context(|| format!("cross-validation of {} failed", dataset.name()))?;
    let report = MetricsReporter::summarize(&result.metrics);

    if run.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        println!("{report}");
    }

    if let Some(experiment) = experiment {
        let writer = ResultWriter::new(&run.output_dir, experiment)?;
        writer.write_predictions(&result.predictions)?;
        writer.write_report(&report)?;
    }
    Ok(())
}

fn experiment_name(run: &RunArgs, suffix: Option<&str>) -> Result<Option<ExperimentName>> {
    let Some(name) = &run.experiment else {
        return Ok(None);
    };
    let base = ExperimentName::new(name.as_str())?;
    Ok(Some(match suffix {
        Some(suffix) => base.with_suffix(suffix),
        None => base,
    }))
}

fn load_dataset(path: &Path, label: Option<&str>) -> Result<Dataset> {
    let mut reader = DatasetReader::new(path);
    if let Some(label) = label {
        reader = reader.with_label(label);
    }
    reader
        .read()
        .with_context(|| format!("failed to load {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Grouped {
            paths,
            fold_column,
            folds,
            label,
            run,
        } => {
            let options = ClassifierOptions::new(2, 10)?
                .with_distribution_spread(0.0)
                .with_oversample_percent(0.0)
                .with_workers(run.workers)
                .with_seed(cli.seed);
            let base = ResamplingClassifier::new(options);
            let cv = CrossValidation::new(folds)?
                .with_seed(cli.seed)
                .with_mode(FoldMode::grouped(fold_column))
                .with_parallel(run.parallel);

            for path in &paths {
                let dataset = load_dataset(path, label.as_deref())?;
                info!(
                    dataset = dataset.name(),
                    records = dataset.len(),
                    attributes = dataset.schema().len(),
                    "dataset ready"
                );
                let suffix = (paths.len() > 1).then(|| dataset.name().to_string());
                let experiment = experiment_name(&run, suffix.as_deref())?;
                evaluate(&dataset, &cv, |fold| base.for_fold(fold), &run, experiment)?;
            }
        }

        Command::Synthetic {
            examples,
            attributes,
            minority,
            folds,
            run,
        } => {
            let generated = SyntheticConfig::new(examples, attributes)?
                .with_seed(cli.seed)
                .generate()
                .context("failed to generate synthetic data")?;
            let dataset = imbalance(&generated, minority, cli.seed)?;
            info!(
                records = dataset.len(),
                class_counts = ?dataset.class_counts(),
                "imbalanced dataset ready"
            );

            let cv = CrossValidation::new(folds)?
                .with_seed(cli.seed)
                .with_mode(FoldMode::Stratified)
                .with_parallel(run.parallel);

            let resampling = ResamplingClassifier::new(
                ClassifierOptions::new(10, 10)?
                    .with_distribution_spread(0.0)
                    .with_oversample_percent(200.0)
                    .with_workers(run.workers)
                    .with_seed(cli.seed),
            );
            evaluate(
                &dataset,
                &cv,
                |fold| resampling.for_fold(fold),
                &run,
                experiment_name(&run, Some("resampling"))?,
            )?;

            let forest = RandomForestClassifier::new(ClassifierOptions::new(1, 10)?.with_seed(cli.seed));
            evaluate(
                &dataset,
                &cv,
                |fold| forest.for_fold(fold),
                &run,
                experiment_name(&run, Some("forest"))?,
            )?;
        }
    }

    Ok(())
}
