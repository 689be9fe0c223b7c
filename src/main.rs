use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use books_app::modules;
use books_db::PgDatabase;
use books_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Books REST API
#[derive(Debug, Parser)]
#[command(name = "books-app", version, about)]
struct Cli {
    /// Address to bind; overrides `server.host`
    #[arg(long)]
    host: Option<String>,

    /// REST API port; overrides `server.port`
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load settings")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    books_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "books-app bootstrap starting"
    );

    let db = PgDatabase::connect(&settings.database).context("failed to create database pool")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::new(db));

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = books_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
