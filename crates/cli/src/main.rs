//! `lifemix` -- turn photos and short clips into a song.
//!
//! Uploads the given media with the chosen song parameters, prints the
//! generated lyrics and preview, then checks for the finished audio until
//! it is ready. Ctrl-C stops the download checks.
//!
//! # Environment variables
//!
//! | Variable                       | Default                 | Description                     |
//! |--------------------------------|-------------------------|---------------------------------|
//! | `LIFEMIX_API_URL`              | `http://localhost:5000` | Generation service base URL     |
//! | `LIFEMIX_POLL_INTERVAL_SECS`   | `10`                    | Seconds between download checks |
//! | `LIFEMIX_REQUEST_TIMEOUT_SECS` | `300`                   | HTTP request timeout            |
//! | `RUST_LOG`                     | `lifemix_cli=info,...`  | Log filter                      |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lifemix_cli::app;
use lifemix_cli::args::Args;
use lifemix_cli::config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the result.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifemix_cli=info,lifemix_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = ClientConfig::from_env()?.with_overrides(&args)?;

    let summary = app::run(args, config, shutdown_signal()).await?;
    tracing::info!(
        job_id = %summary.job_id,
        ready = summary.download.ready,
        interrupted = summary.interrupted,
        "Done",
    );
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C)");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}
