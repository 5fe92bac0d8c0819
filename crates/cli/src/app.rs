//! One generation attempt from the command line: load media, submit,
//! follow the download poller, optionally save the finished audio.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use lifemix_client::api::SongGenApi;
use lifemix_client::events::JobEvent;
use lifemix_client::poller::PollConfig;
use lifemix_client::workflow::JobClient;
use lifemix_core::media::MediaKind;
use lifemix_core::params::Tempo;
use lifemix_core::result::DownloadState;
use lifemix_core::session::Session;
use tokio::sync::broadcast::error::RecvError;

use crate::args::Args;
use crate::config::ClientConfig;
use crate::render;

/// What happened during a run.
#[derive(Debug)]
pub struct RunSummary {
    pub job_id: String,
    pub download: DownloadState,
    pub poll_error: Option<String>,
    pub saved_to: Option<PathBuf>,
    /// Polling was stopped by `shutdown` before a terminal outcome.
    pub interrupted: bool,
}

/// Run one submission. Resolves once the artifact is ready, polling
/// fails, or `shutdown` completes.
pub async fn run<S>(args: Args, config: ClientConfig, shutdown: S) -> Result<RunSummary>
where
    S: Future<Output = ()>,
{
    tracing::info!(
        api_url = %config.api_url,
        poll_interval_secs = config.poll_interval.as_secs_f64(),
        "Starting lifemix",
    );

    let api = Arc::new(
        SongGenApi::with_timeout(config.api_url.clone(), config.request_timeout)
            .context("Failed to build HTTP client")?,
    );
    check_health(&api).await;

    let mut session = Session::new();
    load_media(&mut session, &args.media).await?;
    apply_params(&mut session, &args);

    let client = JobClient::new(
        api.clone(),
        PollConfig {
            interval: config.poll_interval,
        },
    );
    let mut events = client.subscribe();

    let submission = match client.submit(&mut session).await {
        Ok(submission) => submission,
        Err(e) => {
            let message = session
                .error()
                .map(str::to_string)
                .unwrap_or_else(|| e.user_message());
            eprintln!("{}", render::error_alert(&message));
            bail!(message);
        }
    };

    println!("{}", render::result_panel(&submission.result));
    println!("{}", render::download_line(session.download()));

    let job_id = submission.result.id.clone();
    let mut interrupted = false;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(JobEvent::Polled { job_id: id, attempt, outcome }) if id == job_id => {
                    tracing::debug!(job_id = %id, attempt, ?outcome, "Download status checked");
                    if session.apply_poll(&id, &outcome) {
                        break;
                    }
                }
                Ok(JobEvent::PollCancelled { job_id: id }) if id == job_id => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed job events");
                }
                Err(RecvError::Closed) => break,
            },
            () = &mut shutdown => {
                tracing::info!(job_id = %job_id, "Interrupted, stopping download polling");
                interrupted = true;
                client.shutdown().await;
                break;
            }
        }
    }
    drop(submission.poll);

    let download = session.download().clone();
    let mut saved_to = None;

    if download.ready {
        println!("{}", render::download_line(&download));
        if let (Some(path), Some(url)) = (&args.output, download.final_audio_url.as_deref()) {
            let bytes = api
                .fetch_artifact(url)
                .await
                .with_context(|| format!("Failed to download {url}"))?;
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved audio");
            saved_to = Some(path.clone());
        }
    } else if let Some(reason) = session.poll_error() {
        eprintln!("Download unavailable: {reason}");
    }

    Ok(RunSummary {
        job_id,
        download,
        poll_error: session.poll_error().map(str::to_string),
        saved_to,
        interrupted,
    })
}

async fn check_health(api: &SongGenApi) {
    match api.health().await {
        Ok(true) => tracing::debug!("Generation service is healthy"),
        Ok(false) => tracing::warn!("Generation service reports it is not healthy"),
        Err(e) => tracing::warn!(error = %e, "Generation service health check failed"),
    }
}

/// Read every accepted file into the session. Unsupported types are
/// skipped, mirroring the picker's accept filter.
async fn load_media(session: &mut Session, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid media path {}", path.display()))?;

        if let Err(e) = MediaKind::from_file_name(file_name) {
            tracing::warn!(path = %path.display(), error = %e, "Skipping unsupported media file");
            continue;
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        tracing::debug!(file = file_name, bytes = bytes.len(), "Loaded media");
        session.media.add(file_name, bytes)?;
    }
    Ok(())
}

fn apply_params(session: &mut Session, args: &Args) {
    let tempo = Tempo::new(args.bpm);
    if i64::from(tempo.bpm()) != args.bpm {
        tracing::warn!(requested = args.bpm, bpm = tempo.bpm(), "Tempo clamped to supported range");
    }
    session.params.tempo = tempo;

    for tag in &args.tags {
        if !session.params.tags.add(tag) {
            tracing::debug!(tag = %tag, "Ignoring blank or duplicate tag");
        }
    }

    session.params.language = args.language;
    session.params.voice = args.singer;
}
