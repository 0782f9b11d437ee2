//! End-to-end sessions against a local tokio-tungstenite server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use meeting_pipeline::audio::{AudioPayload, SessionMetadata};
use meeting_pipeline::config::AppConfig;
use meeting_pipeline::connection::{ConnectionError, ConnectionStatus, WsConnector};
use meeting_pipeline::error::SessionError;
use meeting_pipeline::events::{event_channel, SessionEvent, SessionOutcome};
use meeting_pipeline::pipeline::{SessionCommand, SessionOrchestrator, StageStatus};

/// What the test backend does after it has received the upload.
enum Script {
    RunToCompletion,
    CloseAfterFirstStage,
}

/// Accept one client, check the upload, then play `script`.
/// Returns the header JSON the client sent.
async fn serve_once(listener: TcpListener, script: Script) -> serde_json::Value {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

    let header = match ws.next().await.unwrap().unwrap() {
        Message::Text(text) => serde_json::from_str::<serde_json::Value>(text.as_str()).unwrap(),
        other => panic!("expected header frame, got {other:?}"),
    };
    let audio = match ws.next().await.unwrap().unwrap() {
        Message::Binary(bytes) => bytes,
        other => panic!("expected audio frame, got {other:?}"),
    };
    assert_eq!(header["audio"]["bytes"], audio.len());

    match script {
        Script::RunToCompletion => {
            for frame in [
                "1단계 완료",
                r#"2단계 완료: [{"title":"Budget 2025","type":"xlsx","score":92},{"title":"Hiring plan","type":"docx"}]"#,
                r#"3단계 완료: {"a":{"insight":"Budget is tight","score":0.8},"b":{"insight":"Hire two","score":0.6}}"#,
                "4단계 완료: <h1>Report</h1>",
            ] {
                ws.send(Message::text(frame)).await.unwrap();
            }
            // Wait for the client to hang up.
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        }
        Script::CloseAfterFirstStage => {
            ws.send(Message::text("1단계 완료")).await.unwrap();
            ws.close(None).await.unwrap();
        }
    }

    header
}

fn metadata() -> SessionMetadata {
    SessionMetadata {
        title: "Quarterly planning".into(),
        author: "seo".into(),
        participants: vec!["lee".into(), "park".into()],
        purpose: "budget".into(),
        additional_info: String::new(),
    }
}

/// Run one session against `url` and return every event up to and
/// including `SessionEnded`.
async fn run_session(url: String) -> Vec<SessionEvent> {
    let mut config = AppConfig::default();
    config.server.ws_url = url;
    config.server.connect_timeout_secs = 5;

    let (events_tx, mut events_rx) = event_channel();
    let (command_tx, command_rx) = mpsc::channel(8);
    let mut orchestrator = SessionOrchestrator::new(Arc::new(WsConnector), &config, Arc::new(events_tx));
    let task = tokio::spawn(async move {
        orchestrator.run(command_rx).await;
        orchestrator
    });

    command_tx.send(SessionCommand::SetMetadata(metadata())).await.unwrap();
    command_tx
        .send(SessionCommand::AttachAudio(AudioPayload::new(vec![7u8; 256], "audio/webm")))
        .await
        .unwrap();

    let mut events = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events_rx.recv().await {
            let done = matches!(event, SessionEvent::SessionEnded(_));
            events.push(event);
            if done {
                break;
            }
        }
    })
    .await
    .expect("session did not end");

    command_tx.send(SessionCommand::Shutdown).await.unwrap();
    let orchestrator = task.await.unwrap();
    assert_eq!(orchestrator.controller().status(), ConnectionStatus::Disconnected);
    events
}

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

#[tokio::test]
async fn full_session_over_a_real_socket() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(serve_once(listener, Script::RunToCompletion));

    let events = run_session(url).await;
    let header = server.await.unwrap();

    assert_eq!(header["type"], "session");
    assert_eq!(header["title"], "Quarterly planning");
    assert_eq!(header["participants"][1], "park");
    assert_eq!(header["audio"]["mimeType"], "audio/webm");

    assert_eq!(events.first(), Some(&SessionEvent::StatusChanged(ConnectionStatus::Connecting)));
    assert_eq!(events.last(), Some(&SessionEvent::SessionEnded(SessionOutcome::Completed)));

    let documents = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::DocumentsReceived(docs) => Some(docs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, 1);
    assert_eq!(documents[0].relevance_score, Some(92.0));
    assert_eq!(documents[1].relevance_score, None);

    let insights = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::InsightsReceived(insights) => Some(insights.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(insights[0].text, "Budget is tight");
    assert_eq!(insights[1].id, 2);

    assert!(events.contains(&SessionEvent::StageUpdated {
        stage: 5,
        status: StageStatus::Completed
    }));
    assert!(events.contains(&SessionEvent::CurrentStepChanged(5)));

    // A voluntary disconnect is not reported as a close.
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::ConnectionClosed { .. })));
}

#[tokio::test]
async fn server_hangup_mid_pipeline_fails_the_session() {
    let (listener, url) = listen().await;
    let server = tokio::spawn(serve_once(listener, Script::CloseAfterFirstStage));

    let events = run_session(url).await;
    server.await.unwrap();

    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::ConnectionClosed { .. })));
    assert!(matches!(
        events.last(),
        Some(SessionEvent::SessionEnded(SessionOutcome::Failed(SessionError::Connection(
            ConnectionError::ClosedEarly { .. }
        ))))
    ));
    // Default policy: progress is discarded.
    assert_eq!(events.iter().rev().nth(1), Some(&SessionEvent::CurrentStepChanged(0)));
}

#[tokio::test]
async fn nothing_listening_fails_without_hanging() {
    let (listener, url) = listen().await;
    drop(listener);

    let events = run_session(url).await;

    assert!(events.contains(&SessionEvent::StatusChanged(ConnectionStatus::Error)));
    assert!(matches!(
        events.iter().rev().nth(1),
        Some(SessionEvent::ConnectionFailed(ConnectionError::Handshake(_)))
    ));
    assert!(matches!(
        events.last(),
        Some(SessionEvent::SessionEnded(SessionOutcome::Failed(_)))
    ));
}
