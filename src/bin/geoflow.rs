//! Pipeline process entry point.
//!
//! Subcommands:
//! - `serve`   - run the record import API (default)
//! - `run`     - execute one full pipeline run (ingest, then consolidate)
//! - `migrate` - bootstrap schemas and tables, then exit

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use geoflow_core::config::GeoflowConfig;
use geoflow_core::consolidation::PostgresConsolidation;
use geoflow_core::database::{initialize_schema, DatabaseConnection};
use geoflow_core::geocoder::HttpGeocoder;
use geoflow_core::ingestion::{
    CancellationToken, Checkpointer, CheckpointerConfig, PostgresSourceRecordStore,
    PostgresStagingStore, PostgresWatermarkStore,
};
use geoflow_core::logging::init_structured_logging;
use geoflow_core::pipeline::Pipeline;
use geoflow_core::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let command = std::env::args().nth(1).unwrap_or_else(|| "serve".to_string());
    let config = GeoflowConfig::from_env().context("failed to load configuration")?;

    let connection = DatabaseConnection::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    initialize_schema(connection.pool())
        .await
        .context("failed to bootstrap schema")?;

    match command.as_str() {
        "migrate" => {
            info!("schema bootstrap complete, exiting");
            Ok(())
        }
        "run" => run_pipeline_once(&config, &connection).await,
        "serve" => serve(&config, &connection).await,
        other => bail!("unknown command '{other}', expected serve | run | migrate"),
    }
}

async fn run_pipeline_once(
    config: &GeoflowConfig,
    connection: &DatabaseConnection,
) -> anyhow::Result<()> {
    let pool = connection.pool().clone();

    let geocoder = Arc::new(
        HttpGeocoder::new(config.geocoder.clone()).context("failed to build geocoder client")?,
    );
    let checkpointer = Arc::new(Checkpointer::with_config(
        Arc::new(PostgresSourceRecordStore::new(pool.clone())),
        Arc::new(PostgresWatermarkStore::new(pool.clone())),
        Arc::new(PostgresStagingStore::new(pool.clone())),
        geocoder,
        CheckpointerConfig {
            default_batch_size: config.ingestion.batch_size,
            watermark_key: config.ingestion.watermark_key.clone(),
        },
    ));
    let pipeline = Pipeline::new(checkpointer, Arc::new(PostgresConsolidation::new(pool)));

    let outcome = pipeline.run(&CancellationToken::new()).await?;
    info!(
        attempted = outcome.ingestion.attempted,
        succeeded = outcome.ingestion.succeeded,
        failed = outcome.ingestion.failed,
        failed_ids = ?outcome.ingestion.failed_ids,
        watermark = outcome.ingestion.watermark,
        consolidated = outcome.consolidation.consolidated,
        rejected = outcome.consolidation.rejected,
        "pipeline run finished"
    );

    Ok(())
}

async fn serve(config: &GeoflowConfig, connection: &DatabaseConnection) -> anyhow::Result<()> {
    let state = AppState::new(Arc::new(PostgresSourceRecordStore::new(
        connection.pool().clone(),
    )));
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(&config.web.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.web.bind_address))?;
    info!(bind_address = %config.web.bind_address, "record import API listening");

    axum::serve(listener, app).await.context("server error")
}
