use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trial_docs::config::{find_config_file, load_config, Config};
use trial_docs::models::{PairingRequirement, SearchCriteria};
use trial_docs::pipeline::{Orchestrator, RunOptions};
use trial_docs::sources::ClinicalTrialsSource;
use trial_docs::ui;
use trial_docs::utils::{ProgressReporter, ValidationError};

/// Exit status for invalid arguments
const EXIT_USAGE: u8 = 2;

/// Trial Docs - Download Protocol and ICF document pairs from ClinicalTrials.gov
#[derive(Parser, Debug)]
#[command(name = "trial-docs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Download paired Protocol and ICF documents from ClinicalTrials.gov", long_about = None)]
struct Cli {
    /// Condition or disease to search for (e.g. "diabetes")
    #[arg(long, short)]
    subject: Option<String>,

    /// Investigator name to search for (e.g. "Frank Moler")
    #[arg(long, short)]
    investigator: Option<String>,

    /// Number of studies to download
    #[arg(long, short = 'n', default_value_t = 5)]
    pairs: usize,

    /// Output directory (default: ./clinical_trial_documents)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Suppress progress output; the summary is still printed
    #[arg(long, short)]
    quiet: bool,

    /// Download studies with a protocol even if they have no ICF
    #[arg(long)]
    no_icf: bool,

    /// Do not write manifest.json
    #[arg(long)]
    no_manifest: bool,

    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delay between requests in milliseconds (0 disables pacing)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Studies requested per search page
    #[arg(long)]
    page_size: Option<usize>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn requirement(&self) -> PairingRequirement {
        PairingRequirement::from_require_icf(!self.no_icf)
    }

    /// Command-line flags take precedence over file and environment settings
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.downloads.default_path = output.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.rate_limits.request_delay_ms = delay_ms;
        }
        if let Some(page_size) = self.page_size {
            config.api.page_size = page_size;
        }
        if self.no_manifest {
            config.downloads.write_manifest = false;
        }
    }

    fn run_options(&self, config: &Config) -> Result<RunOptions, ValidationError> {
        let criteria = SearchCriteria::new(self.subject.clone(), self.investigator.clone())?;

        Ok(
            RunOptions::new(criteria, self.pairs, config.downloads.default_path.clone())?
                .requirement(self.requirement())
                .page_size(config.api.page_size)
                .multipliers(
                    config.downloads.search_multiplier,
                    config.downloads.scan_multiplier,
                )
                .write_manifest(config.downloads.write_manifest),
        )
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let log_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("trial_docs={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_settings(cli: &Cli) -> Result<Config> {
    let config_path = find_config_file(cli.config.as_deref())?;
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let mut config = load_config(config_path.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = load_settings(&cli)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let options = match cli.run_options(&config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let color = ui::is_terminal();
    if !cli.quiet {
        println!("{}", ui::render_banner(&options, color));
    }

    let source = ClinicalTrialsSource::from_config(&config)
        .context("Failed to create ClinicalTrials.gov client")?;

    let report = Orchestrator::new(Arc::new(source), ProgressReporter::new(cli.quiet))
        .run(&options)
        .await;

    println!("{}", ui::render_summary(&report, color));

    if let Some(error) = &report.search_error {
        tracing::error!("search did not complete: {}", error);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
