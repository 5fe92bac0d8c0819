//! Integration tests for the submit-then-poll workflow against an
//! in-process fake generation service.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{spawn_service, DownloadReply, TestServer};
use lifemix_client::api::{SongGenApi, SongGenApiError};
use lifemix_client::events::JobEvent;
use lifemix_client::poller::{PollConfig, PollTermination};
use lifemix_client::workflow::{JobClient, JobClientError};
use lifemix_core::error::CoreError;
use lifemix_core::params::{Language, Tempo, UploadMetadata, VoiceType};
use lifemix_core::result::PollOutcome;
use lifemix_core::session::{Phase, Session};

const FAST_POLL: Duration = Duration::from_millis(40);

fn job_client(server: &TestServer) -> JobClient {
    job_client_polling_every(server, FAST_POLL)
}

fn job_client_polling_every(server: &TestServer, interval: Duration) -> JobClient {
    JobClient::new(
        Arc::new(SongGenApi::new(server.url.clone()).unwrap()),
        PollConfig { interval },
    )
}

fn session_with_jpeg() -> Session {
    let mut session = Session::new();
    session
        .media
        .add("beach.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0])
        .unwrap();
    session.params.tempo = Tempo::new(100);
    session.params.tags.add("pop");
    session.params.language = Language::En;
    session.params.voice = VoiceType::Female;
    session
}

// ---------------------------------------------------------------------------
// Test: one POST with one part per media item plus metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_sends_media_parts_and_metadata() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = session_with_jpeg();
    session.media.add("waves.MP4", b"\x00\x00\x00\x18ftyp".to_vec()).unwrap();

    let submission = client.submit(&mut session).await.unwrap();
    submission.poll.cancel();

    assert_eq!(server.state.upload_count(), 1);
    let parts = server.state.uploads.lock().unwrap()[0].clone();
    assert_eq!(parts.len(), 3);

    let images: Vec<_> = parts.iter().filter(|p| p.name == "images").collect();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].file_name.as_deref(), Some("beach.jpg"));
    assert_eq!(images[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(images[0].data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    assert_eq!(images[1].file_name.as_deref(), Some("waves.MP4"));
    assert_eq!(images[1].content_type.as_deref(), Some("video/mp4"));

    let metadata = parts.iter().find(|p| p.name == "metadata").unwrap();
    let metadata: serde_json::Value = serde_json::from_slice(&metadata.data).unwrap();
    assert_eq!(
        metadata,
        serde_json::json!({
            "bpm": 100,
            "tags": ["pop"],
            "language": "en",
            "singer": "female",
        })
    );
}

#[tokio::test]
async fn metadata_part_decodes_back_to_session_parameters() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = session_with_jpeg();
    session.params.tags.add("city pop");
    session.params.language = Language::Ja;

    let _submission = client.submit(&mut session).await.unwrap();

    let parts = server.state.uploads.lock().unwrap()[0].clone();
    let raw = parts.iter().find(|p| p.name == "metadata").unwrap();
    let decoded = UploadMetadata::from_json(std::str::from_utf8(&raw.data).unwrap()).unwrap();

    assert_eq!(
        lifemix_core::params::GenerationParameters::try_from(decoded).unwrap(),
        session.params
    );
}

// ---------------------------------------------------------------------------
// Test: submission result lands in the session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_submit_records_result() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();

    assert_eq!(submission.result.id, "abc");
    assert_eq!(session.phase(), Phase::Submitted);
    assert_eq!(session.result().unwrap().title, "Sunset Drive");
    assert!(!session.download().ready);
    assert!(session.error().is_none());
}

// ---------------------------------------------------------------------------
// Test: HTTP 500 on upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_failure_surfaces_message_and_no_result() {
    let server = spawn_service().await;
    server.state.fail_uploads_with(500);
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    let err = client.submit(&mut session).await.err().unwrap();

    assert_matches!(
        err,
        JobClientError::Transport(SongGenApiError::ApiError { status: 500, .. })
    );
    assert_eq!(session.error(), Some("HTTP error! status: 500"));
    assert!(session.result().is_none());
    assert_eq!(session.phase(), Phase::Failed);

    tokio::time::sleep(FAST_POLL * 4).await;
    assert_eq!(server.state.download_count(), 0);
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let client = JobClient::new(
        Arc::new(SongGenApi::new("http://127.0.0.1:1").unwrap()),
        PollConfig::default(),
    );
    let mut session = session_with_jpeg();

    let err = client.submit(&mut session).await.err().unwrap();

    assert_matches!(err, JobClientError::Transport(SongGenApiError::Request(_)));
    assert!(session.error().is_some());
    assert!(session.result().is_none());
}

#[tokio::test]
async fn empty_media_is_rejected_without_request() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = Session::new();

    let err = client.submit(&mut session).await.err().unwrap();

    assert_matches!(err, JobClientError::Core(_));
    assert_eq!(server.state.upload_count(), 0);
}

// ---------------------------------------------------------------------------
// Test: polling until ready
// ---------------------------------------------------------------------------

#[tokio::test]
async fn polls_download_until_ready_then_stops() {
    let server = spawn_service().await;
    server.state.script_downloads([
        DownloadReply::Pending,
        DownloadReply::Pending,
        DownloadReply::Ready("https://cdn.example/abc/final.mp3".into()),
    ]);
    let client = job_client(&server);
    let mut events = client.subscribe();
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();
    let termination = submission.poll.wait().await;

    assert_eq!(
        termination,
        PollTermination::Ready {
            audio_url: "https://cdn.example/abc/final.mp3".into()
        }
    );

    // Feed the events back into the session the way a front end would.
    while let Ok(event) = events.try_recv() {
        if let JobEvent::Polled { job_id, outcome, .. } = event {
            session.apply_poll(&job_id, &outcome);
        }
    }
    assert!(session.download().ready);
    assert_eq!(
        session.download().final_audio_url.as_deref(),
        Some("https://cdn.example/abc/final.mp3")
    );

    tokio::time::sleep(FAST_POLL * 4).await;
    let ids = server.state.download_ids.lock().unwrap().clone();
    assert_eq!(ids, vec!["abc", "abc", "abc"]);
}

// ---------------------------------------------------------------------------
// Test: poll errors stop polling permanently
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_error_stops_polling_and_is_reported() {
    let server = spawn_service().await;
    server.state.script_downloads([
        DownloadReply::Pending,
        DownloadReply::Status(503),
        DownloadReply::Ready("https://cdn.example/abc/final.mp3".into()),
    ]);
    let client = job_client(&server);
    let mut events = client.subscribe();
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();
    let termination = submission.poll.wait().await;

    assert_matches!(termination, PollTermination::Failed { .. });

    tokio::time::sleep(FAST_POLL * 4).await;
    assert_eq!(server.state.download_count(), 2);

    while let Ok(event) = events.try_recv() {
        if let JobEvent::Polled { job_id, outcome, .. } = event {
            session.apply_poll(&job_id, &outcome);
        }
    }
    assert!(session.poll_error().is_some());
    assert!(!session.download().ready);
}

#[tokio::test]
async fn unparseable_status_body_stops_polling() {
    let server = spawn_service().await;
    server.state.script_downloads([DownloadReply::Garbage]);
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();

    assert_matches!(submission.poll.wait().await, PollTermination::Failed { .. });
    tokio::time::sleep(FAST_POLL * 4).await;
    assert_eq!(server.state.download_count(), 1);
}

// ---------------------------------------------------------------------------
// Test: cancellation paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_stops_further_download_requests() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();
    tokio::time::sleep(FAST_POLL * 3).await;

    submission.poll.cancel();
    assert_eq!(submission.poll.wait().await, PollTermination::Cancelled);

    let seen = server.state.download_count();
    assert!(seen >= 1);
    tokio::time::sleep(FAST_POLL * 4).await;
    assert_eq!(server.state.download_count(), seen);
}

#[tokio::test]
async fn new_submission_cancels_previous_poller() {
    let server = spawn_service().await;
    let interval = Duration::from_millis(250);
    let client = job_client_polling_every(&server, interval);
    let mut session = session_with_jpeg();

    let first = client.submit(&mut session).await.unwrap();
    let second = client.submit(&mut session).await.unwrap();

    assert_eq!(first.poll.wait().await, PollTermination::Cancelled);
    assert!(!second.poll.is_finished());
    assert_eq!(session.result().unwrap().id, second.result.id);

    tokio::time::sleep(interval * 2).await;
    let ids = server.state.download_ids.lock().unwrap().clone();
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|id| id == &second.result.id));
}

#[tokio::test]
async fn shutdown_cancels_active_poller() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();
    client.shutdown().await;

    assert_eq!(submission.poll.wait().await, PollTermination::Cancelled);
}

#[tokio::test]
async fn submit_after_shutdown_is_refused_without_request() {
    let server = spawn_service().await;
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    client.shutdown().await;
    let err = client.submit(&mut session).await.unwrap_err();

    assert_matches!(err, JobClientError::Core(CoreError::Conflict(_)));
    assert_eq!(server.state.upload_count(), 0);
    assert_eq!(session.phase(), Phase::Editing);
    assert!(session.can_submit());
}

#[tokio::test]
async fn dropped_submit_does_not_leave_session_in_flight() {
    let server = spawn_service().await;
    server.state.delay_uploads(Duration::from_secs(30));
    let client = job_client(&server);
    let mut session = session_with_jpeg();

    let attempt = tokio::time::timeout(Duration::from_millis(200), client.submit(&mut session)).await;
    assert!(attempt.is_err());

    assert_eq!(session.phase(), Phase::Editing);
    assert!(session.can_submit());
    assert!(session.result().is_none());
    session.begin_submission().unwrap();
}

#[tokio::test]
async fn submitted_event_precedes_poll_events() {
    let server = spawn_service().await;
    server.state.script_downloads([DownloadReply::Ready("https://cdn.example/abc/final.mp3".into())]);
    let client = job_client(&server);
    let mut events = client.subscribe();
    let mut session = session_with_jpeg();

    let submission = client.submit(&mut session).await.unwrap();
    submission.poll.wait().await;

    assert_matches!(
        events.recv().await,
        Ok(JobEvent::Submitted { job_id, title }) if job_id == "abc" && title == "Sunset Drive"
    );
    assert_matches!(
        events.recv().await,
        Ok(JobEvent::Polled { attempt: 1, outcome: PollOutcome::Ready { .. }, .. })
    );
}
