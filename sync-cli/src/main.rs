mod report;
mod wiring;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bridge_traits::time::SystemClock;
use clap::{ArgAction, Parser, ValueEnum};
use core_auth::{CachedAuthenticator, CredentialCache, Credentials, EnvTokenSource};
use core_runtime::config::{SyncSettingsBuilder, DEFAULT_LOG_DIR};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_sync::{ArtifactWriter, Reconciler, SyncError};
use tracing::{info, warn};

/// Log line format for the debug log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

/// Reconcile local listings against the marketplace.
#[derive(Debug, Parser)]
#[command(
    name = "listing-sync",
    version,
    about = "Reconcile local listings against the marketplace"
)]
struct Cli {
    /// Do not auth, fetch remote, upsert, or delete; simulate actions
    #[arg(long)]
    dry_run: bool,

    /// Write a CSV summary to this path
    #[arg(long, value_name = "PATH")]
    summary_csv: Option<PathBuf>,

    /// Only process local items changed on/after YYYY-MM-DD
    #[arg(long, value_name = "YYYY-MM-DD")]
    since: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Directory for run artifacts and the debug log
    #[arg(long, env = "EBT_LOG_DIR", default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,

    /// Debug log line format
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormatArg,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(
        LoggingConfig::default()
            .with_verbosity(cli.verbose)
            .with_format(cli.log_format.into())
            .with_log_dir(&cli.log_dir),
    )
    .context("failed to initialise logging")?;

    let mut builder = SyncSettingsBuilder::from_env()
        .context("invalid sync settings in environment")?
        .dry_run(cli.dry_run)
        .log_dir(&cli.log_dir);
    if let Some(since) = &cli.since {
        builder = builder.since(since.as_str());
    }
    if let Some(path) = &cli.summary_csv {
        builder = builder.summary_csv(path);
    }
    let settings = builder.build().context("invalid sync settings")?;

    let registry = wiring::registry_from_env();
    let bindings = match registry.bind(&settings.overrides) {
        Ok(bindings) => bindings,
        Err(err @ SyncError::MissingBindings { .. }) => {
            warn!(error = %err, "Binding failed");
            report::print_binding_help(&err);
            return Ok(ExitCode::from(2));
        }
        Err(other) => return Err(other.into()),
    };

    report::print_header(&bindings.table(), &settings);

    let credentials = Credentials::from_env();
    info!(
        client_id = %redact_if_sensitive("client_id", &credentials.client_id),
        configured = credentials.is_configured(),
        "Credentials loaded"
    );
    let cache = Arc::new(CredentialCache::new(Arc::new(SystemClock)));
    let authenticator = Arc::new(CachedAuthenticator::new(
        Arc::new(EnvTokenSource::from_env()),
        cache,
        credentials.clone(),
    ));

    let summary = Reconciler::new(bindings, settings.clone())
        .with_authenticator(authenticator, &credentials)
        .run()
        .await;

    report::print_counts(&summary);

    let writer = ArtifactWriter::new(&settings.log_dir);
    let json_path = writer
        .write_run(&summary)
        .await
        .context("failed to write run artifacts")?;

    if let Some(csv_path) = &settings.summary_csv {
        writer
            .write_csv(&summary, csv_path)
            .await
            .context("failed to write CSV summary")?;
        println!("Summary CSV: {}", csv_path.display());
    }

    report::print_footer(&summary, &json_path);
    info!(run_id = %summary.run_id(), errors = summary.counts().errors, "Run complete");

    Ok(if summary.has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}
