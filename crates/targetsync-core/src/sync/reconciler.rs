//! Source → destination diffing for one leader term.
//!
//! Each pass reads the destination before notifying the scheduler, so
//! reconfirmations for a snapshot are sent only after `get_targets` returns.
//! A target that disappears and comes back just under the removal delay can
//! therefore still be removed if that read is slow; it is re-added on the
//! next snapshot that lists it.

use futures::StreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::scheduler::SchedulerCommand;
use super::traits::{TargetDestination, TargetSource};
use crate::error::{SyncError, SyncResult};
use targetsync_types::{Snapshot, Target};

/// Counts from a single diff pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Targets passed to `add_targets`
    pub added: usize,
    /// Reconfirmations sent to the scheduler
    pub reconfirmed: usize,
    /// Remove requests sent to the scheduler
    pub remove_requested: usize,
}

pub struct Reconciler {
    source: Arc<dyn TargetSource>,
    destination: Arc<dyn TargetDestination>,
    commands: mpsc::Sender<SchedulerCommand>,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn TargetSource>,
        destination: Arc<dyn TargetDestination>,
        commands: mpsc::Sender<SchedulerCommand>,
    ) -> Self {
        Self { source, destination, commands }
    }

    /// Subscribe to the source and reconcile every snapshot in order until
    /// `scope` is cancelled.
    ///
    /// Returns `Ok(())` only on cancellation. Any destination failure, or the
    /// source stream ending early, ends the term with an error.
    pub async fn run(self, scope: CancellationToken) -> SyncResult<()> {
        let mut snapshots = self.source.subscribe(scope.clone()).await?;

        loop {
            tracing::debug!("[Reconciler] Waiting for targets from source");
            let next = tokio::select! {
                biased;

                () = scope.cancelled() => return Ok(()),
                next = snapshots.next() => next,
            };

            let Some(snapshot) = next else {
                if scope.is_cancelled() {
                    return Ok(());
                }
                return Err(SyncError::SourceClosed);
            };
            tracing::debug!("[Reconciler] Received {} targets from source", snapshot.len());

            match self.reconcile(&snapshot).await {
                Ok(outcome) => {
                    tracing::debug!("[Reconciler] Pass complete: {:?}", outcome);
                },
                Err(_) if scope.is_cancelled() => return Ok(()),
                Err(e) => {
                    tracing::error!("[Reconciler] Reconciliation failed: {}", e);
                    return Err(e);
                },
            }
        }
    }

    /// One diff pass: reconfirm everything in `snapshot`, add what the
    /// destination lacks in a single batch, then request removal of what the
    /// snapshot lacks.
    pub async fn reconcile(&self, snapshot: &Snapshot) -> SyncResult<ReconcileOutcome> {
        let current: BTreeSet<Target> = self.destination.get_targets().await?.into_iter().collect();
        tracing::debug!("[Reconciler] Fetched {} targets from destination", current.len());

        let mut outcome = ReconcileOutcome::default();
        let mut to_add = Vec::new();
        for target in snapshot {
            self.notify(SchedulerCommand::Reconfirm(target.clone())).await?;
            outcome.reconfirmed += 1;

            if !current.contains(target) {
                to_add.push(target.clone());
            }
        }

        if !to_add.is_empty() {
            tracing::debug!("[Reconciler] Adding targets to destination: {:?}", to_add);
            self.destination.add_targets(&to_add).await?;
            tracing::info!("[Reconciler] Added {} targets to destination", to_add.len());
            outcome.added = to_add.len();
        }

        for target in current.iter().filter(|target| !snapshot.contains(target)) {
            self.notify(SchedulerCommand::Remove(target.clone())).await?;
            outcome.remove_requested += 1;
        }

        Ok(outcome)
    }

    async fn notify(&self, command: SchedulerCommand) -> SyncResult<()> {
        self.commands.send(command).await.map_err(|_| SyncError::SchedulerClosed)
    }
}
