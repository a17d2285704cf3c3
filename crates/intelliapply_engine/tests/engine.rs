use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use intelliapply_engine::{
    ClientSettings, EngineEvent, EngineHandle, EngineSettings, FailureKind, JobStatus,
    ReqwestApiClient, StaticToken, TaskState,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn engine_for(server: &MockServer) -> EngineHandle {
    intelliapply_logging::initialize_for_tests();
    let client = ReqwestApiClient::new(
        ClientSettings {
            base_url: server.uri(),
            token_retry_delay: Duration::from_millis(1),
            ..ClientSettings::default()
        },
        Arc::new(StaticToken::new(Some("tok".to_string()))),
    )
    .expect("client");
    EngineHandle::new(
        Arc::new(client),
        EngineSettings {
            poll_interval: Duration::from_millis(20),
            message_clear_delay: Duration::from_millis(20),
            progress_cycle_interval: Duration::from_millis(20),
            reload_timeout: Duration::from_secs(2),
        },
    )
}

async fn wait_for(
    engine: &EngineHandle,
    timeout: Duration,
    mut wanted: impl FnMut(&EngineEvent) -> bool,
) -> Option<EngineEvent> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        while let Some(event) = engine.try_recv() {
            if wanted(&event) {
                return Some(event);
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    None
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

async fn mount_status(server: &MockServer, task_id: &str, state: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/jobs/refresh/status/{task_id}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": state, "message": state})),
        )
        .mount(server)
        .await;
}

async fn mount_counts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/jobs/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "by_status": {"pending": 1, "interested": 0, "applied": 1, "ignored": 0}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn refresh_is_polled_to_completion_then_reloaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "abc123",
            "message": "Job refresh scheduled"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/refresh/status/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "running", "message": "Scraping"})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_status(&server, "abc123", "completed").await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/matched"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 42, "title": "Rust Engineer", "company": "Acme", "relevance_score": 0.85, "status": "pending"}
        ])))
        .mount(&server)
        .await;
    mount_counts(&server).await;

    let engine = engine_for(&server);
    engine.start_refresh();
    let accepted = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::RefreshRequested(_))
    })
    .await;
    let task_id = match accepted {
        Some(EngineEvent::RefreshRequested(Ok(accepted))) => accepted.task_id,
        other => panic!("unexpected refresh outcome: {other:?}"),
    };
    assert_eq!(task_id, "abc123");

    engine.start_polling(task_id);
    let mut states = Vec::new();
    let finished = wait_for(&engine, WAIT, |event| match event {
        EngineEvent::PollUpdate {
            result: Ok(status), ..
        } => {
            states.push(status.status);
            status.status.is_terminal()
        }
        _ => false,
    })
    .await;
    assert!(finished.is_some());
    assert_eq!(
        states,
        vec![TaskState::Running, TaskState::Running, TaskState::Completed]
    );

    // No further polls once the task finished.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(requests_to(&server, "/api/jobs/refresh/status/abc123").await, 3);

    engine.reload_all(7);
    let reloaded = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::Reloaded { .. })
    })
    .await;
    match reloaded {
        Some(EngineEvent::Reloaded {
            request_id,
            jobs: Ok(jobs),
            counts: Ok(counts),
        }) => {
            assert_eq!(request_id, 7);
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].id, 42);
            assert_eq!(counts.total, 2);
        }
        other => panic!("unexpected reload outcome: {other:?}"),
    }
    engine.shutdown();
}

#[tokio::test]
async fn teardown_stops_polling() {
    let server = MockServer::start().await;
    mount_status(&server, "t-run", "running").await;

    let engine = engine_for(&server);
    engine.start_polling("t-run");
    let first = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::PollUpdate { .. })
    })
    .await;
    assert!(first.is_some());

    engine.teardown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = requests_to(&server, "/api/jobs/refresh/status/t-run").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(requests_to(&server, "/api/jobs/refresh/status/t-run").await, settled);

    while engine.try_recv().is_some() {}
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(engine.try_recv().is_none());
    engine.shutdown();
}

#[tokio::test]
async fn restarting_poll_replaces_previous_loop() {
    let server = MockServer::start().await;
    mount_status(&server, "old", "running").await;
    mount_status(&server, "new", "running").await;

    let engine = engine_for(&server);
    engine.start_polling("old");
    let old_update = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::PollUpdate { task_id, .. } if task_id == "old")
    })
    .await;
    assert!(old_update.is_some());

    engine.start_polling("new");
    let new_update = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::PollUpdate { task_id, .. } if task_id == "new")
    })
    .await;
    assert!(new_update.is_some());

    tokio::time::sleep(Duration::from_millis(30)).await;
    let old_polls = requests_to(&server, "/api/jobs/refresh/status/old").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(requests_to(&server, "/api/jobs/refresh/status/old").await, old_polls);
    assert!(requests_to(&server, "/api/jobs/refresh/status/new").await > 1);
    engine.shutdown();
}

#[tokio::test]
async fn reload_reports_each_half_separately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/matched"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;
    mount_counts(&server).await;

    let engine = engine_for(&server);
    engine.reload_all(1);
    match wait_for(&engine, WAIT, |event| matches!(event, EngineEvent::Reloaded { .. })).await {
        Some(EngineEvent::Reloaded {
            request_id,
            jobs: Err(err),
            counts: Ok(counts),
        }) => {
            assert_eq!(request_id, 1);
            assert_eq!(err.kind, FailureKind::MalformedPayload);
            assert_eq!(counts.by_status.applied, 1);
        }
        other => panic!("unexpected reload outcome: {other:?}"),
    }
    engine.shutdown();
}

#[tokio::test]
async fn status_update_reports_result() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/jobs/42/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.update_job_status(42, JobStatus::Applied);
    let event = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::StatusUpdated { .. })
    })
    .await;
    assert_eq!(
        event,
        Some(EngineEvent::StatusUpdated {
            job_id: 42,
            result: Ok(())
        })
    );
    engine.shutdown();
}

#[tokio::test]
async fn message_clear_fires_unless_torn_down() {
    let server = MockServer::start().await;
    let engine = engine_for(&server);

    engine.schedule_message_clear(3);
    let due = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::MessageClearDue { .. })
    })
    .await;
    assert_eq!(due, Some(EngineEvent::MessageClearDue { token: 3 }));

    engine.schedule_message_clear(4);
    engine.teardown();
    let late = wait_for(&engine, Duration::from_millis(150), |event| {
        matches!(event, EngineEvent::MessageClearDue { .. })
    })
    .await;
    assert_eq!(late, None);
    engine.shutdown();
}

#[tokio::test]
async fn progress_cycle_ticks_until_stopped() {
    let server = MockServer::start().await;
    let engine = engine_for(&server);

    engine.start_progress_cycle();
    let tick = wait_for(&engine, WAIT, |event| {
        matches!(event, EngineEvent::ProgressTick)
    })
    .await;
    assert_eq!(tick, Some(EngineEvent::ProgressTick));

    engine.stop_progress_cycle();
    tokio::time::sleep(Duration::from_millis(50)).await;
    while engine.try_recv().is_some() {}
    let late = wait_for(&engine, Duration::from_millis(100), |event| {
        matches!(event, EngineEvent::ProgressTick)
    })
    .await;
    assert_eq!(late, None);
    engine.shutdown();
}

#[tokio::test]
async fn shutdown_disconnects_the_event_stream() {
    let server = MockServer::start().await;
    let engine = engine_for(&server);
    engine.shutdown();

    let events = engine.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline {
            match events.recv_timeout(Duration::from_millis(20)) {
                Err(mpsc::RecvTimeoutError::Disconnected) => return true,
                Ok(_) | Err(mpsc::RecvTimeoutError::Timeout) => {}
            }
        }
        false
    })
    .await
    .expect("join");
    assert!(outcome);
    assert!(engine.try_recv().is_none());
}
