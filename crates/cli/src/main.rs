mod command;
mod config;
mod progress;

use std::process::ExitCode;
use std::sync::Arc;

use prismic_migrate_client::{Endpoints, PrismicDestination, PrismicSource};
use prismic_migrate_core::events::EventBus;
use prismic_migrate_core::pipeline::{CloneRunner, Migrator};
use prismic_migrate_core::stage::Stage;
use prismic_migrate_core::MigrationContext;
use tracing_subscriber::EnvFilter;

use crate::command::Command;
use crate::config::{LogFormat, MigrationConfig};

const EVENT_BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let command = Command::from_args(std::env::args().skip(1))?;
    let config = MigrationConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    init_tracing(&config);

    tracing::info!(
        %command,
        source = %config.source_repository,
        destination = %config.destination_repository,
        out_dir = %config.out_dir.display(),
        rewrite_mode = %config.rewrite_mode,
        "Starting Prismic migration"
    );

    let source = PrismicSource::new(
        Endpoints::prismic(&config.source_repository),
        config.source_credentials(),
    )?;
    let destination = PrismicDestination::new(
        Endpoints::prismic(&config.destination_repository),
        config.destination_credentials(),
    )?;
    let stage = Stage::new(
        &config.out_dir,
        &config.source_repository,
        &config.destination_repository,
    )?;
    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let reporter = progress::spawn_reporter(&events);

    let ctx = MigrationContext::new(
        Arc::new(source),
        Arc::new(destination),
        stage,
        events,
        config.pipeline_settings(),
    );

    let outcome = run(command, ctx).await;
    reporter.abort();

    match outcome {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(err) => {
            tracing::error!(error = %err, "Migration aborted");
            Err(err)
        }
    }
}

/// Run the selected phases. `Ok(false)` when items were left behind.
async fn run(command: Command, ctx: MigrationContext) -> anyhow::Result<bool> {
    if command.clones() {
        let report = CloneRunner::new(ctx.clone()).run().await?;
        tracing::info!(
            assets_downloaded = report.assets_downloaded,
            assets_reused = report.assets_reused,
            custom_types = report.custom_types,
            documents = ?report.documents,
            "Clone finished"
        );
    }

    if !command.creates() {
        return Ok(true);
    }

    let report = Migrator::new(ctx).run().await?;
    println!("{report}");
    if report.is_clean() {
        tracing::info!("Migration finished");
        Ok(true)
    } else {
        tracing::warn!(
            failures = report.failures.len(),
            pass2_skipped = report.pass2_skipped,
            "Migration finished with items left behind; rerun to retry them"
        );
        Ok(false)
    }
}

fn init_tracing(config: &MigrationConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
