//! Thin CLI driver: text source → pipeline → top-N → presenter.
//!
//! Exits non-zero when the text source fails; the pipeline itself only
//! fails on cancellation, worker panics, or a configured token limit.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mapfreq::{
    BarChart, FileSource, RunSpec, StdinSource, TextSource, TopSelector, ValidationEngine,
    WordCountConfig, WordCountPipeline,
};

#[derive(Debug, Parser)]
#[command(name = "mapfreq", about = "Count word frequencies with a parallel map/reduce pipeline")]
struct Cli {
    /// Text file to analyze; reads stdin when omitted.
    file: Option<PathBuf>,

    /// URL to download the text from instead of a file.
    #[cfg(feature = "fetch")]
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Number of top tokens to show.
    #[arg(short = 'n', long, default_value_t = 10)]
    top: usize,

    /// Lowercase tokens before counting.
    #[arg(long)]
    fold_case: bool,

    /// Worker-pool size for the parallel phases.
    #[arg(long)]
    workers: Option<usize>,

    /// Tokens per map task.
    #[arg(long)]
    batch_size: Option<usize>,

    /// JSON run specification; flags override its settings.
    #[arg(long, value_name = "FILE")]
    spec: Option<PathBuf>,

    /// Width in cells of the longest chart bar.
    #[arg(long, default_value_t = 40)]
    chart_width: usize,

    /// Print the ranked list as JSON instead of a chart.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let text = read_source(&cli)?;

    let pipeline = WordCountPipeline::with_config(config);
    let table = pipeline.run(&text)?;
    let ranked = TopSelector::new().select(&table, cli.top);

    let mut stdout = io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut stdout, &ranked)?;
        writeln!(stdout)?;
    } else {
        BarChart::new()
            .with_width(cli.chart_width)
            .render(&ranked, &mut stdout)?;
    }
    Ok(())
}

/// Build the run configuration from the optional spec file plus flag
/// overrides.
fn load_config(cli: &Cli) -> anyhow::Result<WordCountConfig> {
    let mut config = match &cli.spec {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read spec {}", path.display()))?;
            let spec: RunSpec = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse spec {}", path.display()))?;
            let report = ValidationEngine::with_defaults().validate(&spec);
            for warning in report.warnings() {
                eprintln!("warning: {warning}");
            }
            if report.has_errors() {
                for error in report.errors() {
                    eprintln!("error: {error}");
                }
                bail!("invalid run spec {}", path.display());
            }
            spec.to_config()
        }
        None => WordCountConfig::default(),
    };

    if cli.fold_case {
        config.case = mapfreq::CasePolicy::Fold;
    }
    if let Some(workers) = cli.workers {
        config.workers = Some(workers);
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = Some(batch_size);
    }
    Ok(config)
}

/// Acquire the input text from the configured source.
fn read_source(cli: &Cli) -> anyhow::Result<String> {
    #[cfg(feature = "fetch")]
    if let Some(url) = &cli.url {
        return Ok(mapfreq::HttpSource::new(url).fetch()?);
    }

    let text = match &cli.file {
        Some(path) => FileSource::new(path).fetch()?,
        None => StdinSource.fetch()?,
    };
    Ok(text)
}
