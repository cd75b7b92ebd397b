//! End-to-end facade scenarios over real child processes.

use std::time::Duration;

use procvisor::{Config, ProcessRequest, ResourceLimits, Supervisor, SupervisorError};

fn request(program: &str, args: &[&str]) -> ProcessRequest {
    ProcessRequest {
        command: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        requested_by: "some_user".to_string(),
        resource_limits: ResourceLimits::default(),
    }
}

async fn collect_output(
    supervisor: &Supervisor,
    id: &procvisor::ProcessId,
) -> Vec<u8> {
    let mut sub = supervisor.subscribe_output(id).await.expect("subscribe");
    let mut bytes = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(record) = sub.recv().await {
            bytes.extend_from_slice(&record.content);
        }
    })
    .await
    .expect("output stream should close");
    bytes
}

#[tokio::test]
async fn unknown_ids_are_rejected_by_every_operation() {
    let this = Supervisor::new(Config::default());
    let other = Supervisor::new(Config::default());

    // A perfectly valid identifier, but minted by a different supervisor.
    let foreign = other
        .start_process(request("echo", &["hello"]))
        .await
        .expect("spawn");

    assert!(matches!(
        this.stop_process(&foreign).await.unwrap_err(),
        SupervisorError::UnknownProcess { .. }
    ));
    assert!(matches!(
        this.get_status(&foreign).await.unwrap_err(),
        SupervisorError::UnknownProcess { .. }
    ));
    assert!(matches!(
        this.subscribe_output(&foreign).await.unwrap_err(),
        SupervisorError::UnknownProcess { .. }
    ));
}

#[tokio::test]
async fn spawn_failure_is_returned_to_the_caller() {
    let supervisor = Supervisor::new(Config::default());
    let err = supervisor
        .start_process(request("/definitely/not/a/binary", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, SupervisorError::SpawnFailed { .. }));
}

#[tokio::test]
async fn subscriber_receives_the_full_output() {
    let supervisor = Supervisor::new(Config::default());
    let id = supervisor
        .start_process(request("echo", &["hello"]))
        .await
        .expect("spawn");

    assert_eq!(collect_output(&supervisor, &id).await, b"hello\n");
}

#[tokio::test]
async fn early_and_late_subscribers_observe_the_same_bytes() {
    let supervisor = Supervisor::new(Config::default());
    let id = supervisor
        .start_process(request(
            "bash",
            &["-c", "echo to stdout; echo to stderr 1>&2"],
        ))
        .await
        .expect("spawn");

    let early = collect_output(&supervisor, &id).await;
    // The stream is fully drained by now; this one joins after EOF.
    let late = collect_output(&supervisor, &id).await;

    let mut early_sorted = early.clone();
    let mut late_sorted = late.clone();
    early_sorted.sort_unstable();
    late_sorted.sort_unstable();
    assert_eq!(early_sorted, late_sorted);
    assert_eq!(early.len(), b"to stdout\nto stderr\n".len());
}

#[tokio::test]
async fn status_reflects_the_running_child() {
    let supervisor = Supervisor::new(Config::default());
    let id = supervisor
        .start_process(request("sleep", &["10"]))
        .await
        .expect("spawn");

    let status = supervisor.get_status(&id).await.expect("status");
    assert!(status.pid > 0);
    assert_eq!(status.started_by, "some_user");
    assert!(matches!(status.state, 'R' | 'S'));
    assert!(status.finished_at.is_none());

    supervisor.stop_process(&id).await.expect("cleanup");
}

#[tokio::test]
async fn killed_child_becomes_a_zombie_but_stays_queryable() {
    let supervisor = Supervisor::new(Config::default());
    let id = supervisor
        .start_process(request("sleep", &["10"]))
        .await
        .expect("spawn");

    supervisor.stop_process(&id).await.expect("stop");
    // Idempotent: the second kill also reports success.
    supervisor.stop_process(&id).await.expect("second stop");

    // The child is never reaped, so /proc keeps answering.
    let mut state = ' ';
    for _ in 0..100 {
        state = supervisor.get_status(&id).await.expect("status").state;
        if state == 'Z' {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state, 'Z');
}

#[tokio::test]
async fn finished_at_is_recorded_once_the_output_drains() {
    let supervisor = Supervisor::new(Config::default());
    let id = supervisor
        .start_process(request("echo", &["hello"]))
        .await
        .expect("spawn");

    collect_output(&supervisor, &id).await;

    let mut finished = None;
    for _ in 0..100 {
        finished = supervisor.get_status(&id).await.expect("status").finished_at;
        if finished.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(finished.is_some());
}

#[tokio::test]
async fn shutdown_kills_children_and_closes_streams() {
    let supervisor = Supervisor::new(Config::default());
    let first = supervisor
        .start_process(request("sleep", &["30"]))
        .await
        .expect("spawn");
    let second = supervisor
        .start_process(request("sleep", &["30"]))
        .await
        .expect("spawn");

    let mut sub_first = supervisor.subscribe_output(&first).await.expect("subscribe");
    let mut sub_second = supervisor.subscribe_output(&second).await.expect("subscribe");

    supervisor.shutdown().await;

    // SIGKILL closes the children's pipes; both streams must end.
    tokio::time::timeout(Duration::from_secs(10), async {
        while sub_first.recv().await.is_some() {}
        while sub_second.recv().await.is_some() {}
    })
    .await
    .expect("streams should close after shutdown");
}
