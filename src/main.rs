use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scan_sweep::bulk::{bulk_accuracy, BulkAccuracyReport};
use scan_sweep::config::{AppConfig, ExecutionMode};
use scan_sweep::observability;
use scan_sweep::ocr::TesseractOcr;
use scan_sweep::preprocessing::{load_grayscale, save_image, StandardImageOps};
use scan_sweep::scoring::accuracy_against;
use scan_sweep::search::{reference_text_from_image, SearchCoordinator};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "scan-sweep")]
#[command(about = "Find the preprocessing of a scanned document that OCRs best")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep every preprocessing candidate and keep the best image
    Best {
        /// Noisy scan to preprocess
        noisy: PathBuf,

        /// Clean version of the scan; switches scoring from confidence to accuracy
        #[arg(short, long)]
        clean: Option<PathBuf>,

        /// Where to write the best image
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override SEARCH_EXECUTION (auto, parallel, sequential)
        #[arg(short, long)]
        execution: Option<ExecutionMode>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// OCR accuracy of an image against the OCR of its clean version
    Accuracy {
        image: PathBuf,
        clean: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Average Otsu accuracy over paired noisy/clean directories
    Bulk {
        noisy_dir: PathBuf,
        clean_dir: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct BestReport {
    method: String,
    parameters: String,
    score: f64,
    scoring: &'static str,
    candidates_evaluated: usize,
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct AccuracyReport {
    image: PathBuf,
    clean: PathBuf,
    accuracy: f64,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Commands::Best {
        execution: Some(execution),
        ..
    } = &cli.command
    {
        config.search.execution = *execution;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    observability::init_tracing_with_config(&config.observability)?;
    info!("{}", config.summary());

    let ocr = Arc::new(TesseractOcr::new(config.ocr.clone()));
    ocr.check_available()?;

    match cli.command {
        Commands::Best {
            noisy,
            clean,
            output,
            json,
            ..
        } => run_best(&config, ocr, &noisy, clean.as_deref(), output, json),
        Commands::Accuracy { image, clean, json } => run_accuracy(&ocr, image, clean, json),
        Commands::Bulk {
            noisy_dir,
            clean_dir,
            json,
        } => run_bulk(&ocr, &noisy_dir, &clean_dir, json),
    }
}

fn run_best(
    config: &AppConfig,
    ocr: Arc<TesseractOcr>,
    noisy: &Path,
    clean: Option<&Path>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let noisy_image = load_grayscale(noisy)?;
    let reference = match clean {
        Some(clean) => Some(reference_text_from_image(&*ocr, &load_grayscale(clean)?)?),
        None => None,
    };

    let search = SearchCoordinator::new(Arc::new(StandardImageOps), ocr, config.search.clone());
    let best = search.find_best_image(&noisy_image, None, reference.as_deref())?;

    if let Some(path) = &output {
        save_image(path, &best.image)?;
        info!(path = %path.display(), "Best image saved");
    }

    let report = BestReport {
        method: best.method,
        parameters: best.parameters,
        score: best.score,
        scoring: if reference.is_some() {
            "accuracy"
        } else {
            "confidence"
        },
        candidates_evaluated: search.progress().evaluated,
        output,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Best method: {}", report.method);
        println!("Parameters:  {}", report.parameters);
        println!("Score:       {:.2} ({})", report.score, report.scoring);
        if let Some(path) = &report.output {
            println!("Saved to:    {}", path.display());
        }
    }
    Ok(())
}

fn run_accuracy(ocr: &TesseractOcr, image: PathBuf, clean: PathBuf, json: bool) -> Result<()> {
    let reference = reference_text_from_image(ocr, &load_grayscale(&clean)?)?;
    let accuracy = accuracy_against(ocr, &load_grayscale(&image)?, &reference)?;

    let report = AccuracyReport {
        image,
        clean,
        accuracy,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Accuracy: {:.2}%", report.accuracy);
    }
    Ok(())
}

fn run_bulk(ocr: &TesseractOcr, noisy_dir: &Path, clean_dir: &Path, json: bool) -> Result<()> {
    let report: BulkAccuracyReport = bulk_accuracy(&StandardImageOps, ocr, noisy_dir, clean_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for pair in &report.pairs {
            println!("{:>7.2}%  {}", pair.accuracy, pair.noisy.display());
        }
        println!(
            "Average accuracy: {:.2}% over {} comparisons",
            report.average_accuracy, report.comparisons
        );
    }
    Ok(())
}
