use clap::Parser;
use lungseg::api::{create_router, AppState};
use lungseg::config::AppConfig;
use lungseg::error::{LungsegError, Result};
use lungseg::ml::Autoencoder;
use lungseg::render::MaskRenderer;
use lungseg::services::Janitor;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lungseg", version, about = "Chest X-ray lung segmentation service")]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config);

    // Model load is fatal: never bind the listener without a runnable graph.
    info!("loading model from {}", config.model.path.display());
    let engine = Arc::new(Autoencoder::load(&config.model.path)?);

    let renderer = Arc::new(MaskRenderer::new(&config.storage.output_dir));
    renderer.check_output_dir()?;

    Janitor::new(&config.storage.output_dir, config.cleanup.interval_secs).spawn();

    let state = AppState::new(
        engine,
        renderer,
        config.model.path.display().to_string(),
    );
    let app = create_router(state);

    let port = cli.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port)
        .parse()
        .map_err(|e| LungsegError::Internal(format!("invalid listen address: {e}")))?;

    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!("could not install ctrl-c handler: {e}"),
    }
}

fn init_logging(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},lungseg=debug", config.logging.level)));

    // Optional daily-rotating file layer.
    //
    // Important: `tracing_appender::rolling::daily` will panic (and in our
    // release build, abort) if it can't create the initial log file, so
    // writability is preflighted first.
    let file_layer = config.logging.dir.as_ref().and_then(|log_dir| {
        if std::fs::create_dir_all(log_dir).is_err() {
            eprintln!(
                "Warning: could not create log directory {}, file logging disabled",
                log_dir.display()
            );
            return None;
        }
        let test_path = log_dir.join(".lungseg_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(log_dir, "lungseg.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the life of the process.
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not write to log directory {} ({e}), file logging disabled",
                    log_dir.display()
                );
                None
            }
        }
    });

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}
