use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, path::Path, sync::Arc};
use studymate::ai::{Dispatcher, HttpTransport};
use studymate::config::{self, CliArgs};
use studymate::{AppState, create_app, db, run_migrations};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sets up console logging plus a daily JSON log file in `log_dir`
///
/// The returned guard flushes the file writer when dropped, so it has to
/// live until shutdown.
fn init_tracing(debug: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if debug { "studymate=debug,tower_http=debug" } else { "studymate=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "studymate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
    if let Err(e) = result {
        eprintln!("tracing init failed: {e}");
    }
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before clap reads them
    if dotenv::dotenv().is_ok() {
        println!("Loaded .env file");
    }

    let args = CliArgs::parse();
    let log_dir = config::get_config_dir_path().map(|dir| dir.join("logs"));
    let _guard = init_tracing(args.debug, log_dir.as_deref());

    let config = config::get_config(args);
    if config.api_key.is_none() {
        warn!("No gateway API key configured, AI requests will likely be rejected");
    }

    // Initialize the database pool and bring the schema up to date
    let pool = db::init_pool(&config.database_url)
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    {
        let mut conn = pool.get().context("Failed to get a database connection")?;
        run_migrations(&mut conn)?;
    }

    let ladder = config.model_ladder()?;
    let transport = HttpTransport::new(config.gateway_url.clone(), config.api_key.clone(), config.request_timeout())
        .context("Failed to build the gateway client")?;
    let dispatcher = Dispatcher::new(transport, ladder, config.retry_policy());

    let app = create_app(AppState { pool: Arc::new(pool), ai: Arc::new(dispatcher) });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on {}", addr);
    println!("Starting server, press Ctrl+C to stop");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
