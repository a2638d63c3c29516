use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::reconciler::{ReconcileOutcome, Reconciler};
use super::scheduler::SchedulerCommand;
use super::test_support::{settle, target, targets, ChannelSource, RecordingDestination};
use crate::error::SyncError;
use targetsync_types::{Snapshot, Target};

fn snapshot(addresses: &[&str]) -> Snapshot {
    targets(addresses).into_iter().collect()
}

fn drain(rx: &mut mpsc::Receiver<SchedulerCommand>) -> Vec<SchedulerCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = rx.try_recv() {
        commands.push(command);
    }
    commands
}

fn reconciler(
    destination: Arc<RecordingDestination>,
) -> (Reconciler, mpsc::Receiver<SchedulerCommand>, Arc<ChannelSource>) {
    let source = ChannelSource::new();
    let (tx, rx) = mpsc::channel(100);
    (Reconciler::new(source.clone(), destination, tx), rx, source)
}

#[tokio::test]
async fn test_adds_missing_targets_in_one_batch() {
    let destination = RecordingDestination::new();
    let (reconciler, mut rx, _) = reconciler(destination.clone());

    let outcome = reconciler.reconcile(&snapshot(&["1", "2"])).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome { added: 2, reconfirmed: 2, remove_requested: 0 });
    assert_eq!(destination.adds(), vec![targets(&["1", "2"])]);
    assert_eq!(
        drain(&mut rx),
        vec![
            SchedulerCommand::Reconfirm(target("1")),
            SchedulerCommand::Reconfirm(target("2")),
        ]
    );
}

#[tokio::test]
async fn test_requests_removal_of_stale_targets() {
    let destination = RecordingDestination::with_targets(&targets(&["1", "2", "3"]));
    let (reconciler, mut rx, _) = reconciler(destination.clone());

    let outcome = reconciler.reconcile(&snapshot(&["1"])).await.unwrap();

    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.remove_requested, 2);
    // Nothing is removed directly; that is the scheduler's job
    assert!(destination.calls().is_empty());
    assert_eq!(
        drain(&mut rx),
        vec![
            SchedulerCommand::Reconfirm(target("1")),
            SchedulerCommand::Remove(target("2")),
            SchedulerCommand::Remove(target("3")),
        ]
    );
}

#[tokio::test]
async fn test_converged_snapshot_issues_no_calls() {
    let destination = RecordingDestination::with_targets(&targets(&["1", "2"]));
    let (reconciler, mut rx, _) = reconciler(destination.clone());

    let outcome = reconciler.reconcile(&snapshot(&["1", "2"])).await.unwrap();

    assert_eq!(outcome.added + outcome.remove_requested, 0);
    assert!(destination.calls().is_empty());
    assert!(drain(&mut rx).iter().all(|c| matches!(c, SchedulerCommand::Reconfirm(_))));
}

#[tokio::test]
async fn test_diff_uses_full_identity_key() {
    let destination = RecordingDestination::with_targets(&[Target::new("10.0.0.1", 80)]);
    let (reconciler, mut rx, _) = reconciler(destination.clone());

    let desired: Snapshot = vec![Target::new("10.0.0.1", 8080)].into_iter().collect();
    reconciler.reconcile(&desired).await.unwrap();

    assert_eq!(destination.adds(), vec![vec![Target::new("10.0.0.1", 8080)]]);
    assert!(drain(&mut rx).contains(&SchedulerCommand::Remove(Target::new("10.0.0.1", 80))));
}

#[tokio::test]
async fn test_add_failure_is_fatal() {
    let destination = RecordingDestination::new();
    destination.fail_next_adds(1);
    let (reconciler, _rx, _) = reconciler(destination.clone());

    let err = reconciler.reconcile(&snapshot(&["1"])).await.unwrap_err();
    assert!(matches!(err, SyncError::Destination(_)));
}

#[tokio::test]
async fn test_destination_read_failure_is_fatal() {
    let destination = RecordingDestination::new();
    destination.fail_next_gets(1);
    let (reconciler, mut rx, _) = reconciler(destination.clone());

    let err = reconciler.reconcile(&snapshot(&["1"])).await.unwrap_err();
    assert!(matches!(err, SyncError::Destination(_)));
    assert!(destination.calls().is_empty());
    // Reconfirmations follow the destination read
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_closed_scheduler_is_reported() {
    let destination = RecordingDestination::new();
    let (reconciler, rx, _) = reconciler(destination);
    drop(rx);

    let err = reconciler.reconcile(&snapshot(&["1"])).await.unwrap_err();
    assert!(matches!(err, SyncError::SchedulerClosed));
}

#[tokio::test(start_paused = true)]
async fn test_run_processes_snapshots_until_cancelled() {
    let destination = RecordingDestination::new();
    let (reconciler, mut rx, source) = reconciler(destination.clone());
    let scope = CancellationToken::new();
    let task = tokio::spawn(reconciler.run(scope.clone()));

    source.push(&targets(&["1"]));
    settle().await;
    source.push(&targets(&["1", "2"]));
    settle().await;

    assert_eq!(destination.adds(), vec![targets(&["1"]), targets(&["2"])]);
    assert_eq!(drain(&mut rx).len(), 3);

    scope.cancel();
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_run_ends_with_error_on_add_failure() {
    let destination = RecordingDestination::new();
    destination.fail_next_adds(1);
    let (reconciler, _rx, source) = reconciler(destination.clone());
    let task = tokio::spawn(reconciler.run(CancellationToken::new()));

    source.push(&targets(&["1"]));
    let result = task.await.unwrap();

    assert!(matches!(result, Err(SyncError::Destination(_))));
    assert!(destination.targets().is_empty());
}
