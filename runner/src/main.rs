mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scan_core::{probe, HarnessConfig, ScanHarness, SuiteFile};
use tracing_subscriber::EnvFilter;

/// Run submission suites against the scan and static-analysis services.
#[derive(Parser)]
#[command(name = "scan-runner", version, about)]
struct Cli {
    /// Harness configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Suite file listing the cases to run.
    #[arg(short, long, default_value = "config/tdvf-suite.toml")]
    suite: PathBuf,

    /// Run only one of the suites.
    #[arg(long, value_enum)]
    only: Option<SuiteKind>,

    /// Skip the network reachability check before the run.
    #[arg(long)]
    skip_probe: bool,

    #[arg(long, default_value = probe::DEFAULT_PROBE_TARGET)]
    probe_target: String,

    /// Log filter, overridden by RUST_LOG.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SuiteKind {
    Scan,
    Analysis,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("run aborted: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every case passed.
fn run(cli: &Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;

    let suite = SuiteFile::load(&cli.suite)?;
    if suite.is_empty() {
        tracing::warn!(suite = %cli.suite.display(), "suite file has no cases");
    }

    if !cli.skip_probe {
        let local = probe::check_reachability(cli.probe_target.as_str())
            .with_context(|| format!("network probe to {} failed", cli.probe_target))?;
        tracing::info!(%local, target = %cli.probe_target, "network reachable");
    }

    tracing::info!(
        host = %config.host,
        username = %config.username,
        delay_ms = config.inter_call_delay_ms,
        "starting run"
    );
    let harness = ScanHarness::new(config);

    let mut reports = Vec::new();
    if cli.only != Some(SuiteKind::Analysis) {
        reports.push(harness.run_scan_suite(&suite.scan));
    }
    if cli.only != Some(SuiteKind::Scan) {
        reports.push(harness.run_analysis_suite(&suite.analysis));
    }

    for report in &reports {
        print!("{}", report::render(report));
    }
    Ok(reports.iter().all(|r| r.is_success()))
}
