//! One contiguous period of held leadership.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::reconciler::Reconciler;
use super::scheduler::RemovalScheduler;
use super::traits::{TargetDestination, TargetSource};
use crate::error::{SyncError, SyncResult};
use targetsync_types::SyncConfig;

/// Reconciler + scheduler pair running under a child scope.
///
/// Dropping the term without [`stop`](Self::stop) still cancels its scope, but
/// does not wait for in-flight destination calls.
pub(crate) struct LeaderTerm {
    id: u64,
    scope: CancellationToken,
    reconciler: Option<JoinHandle<SyncResult<()>>>,
    scheduler: Option<JoinHandle<()>>,
}

enum TaskExit {
    Reconciler(Result<SyncResult<()>, JoinError>),
    Scheduler(Result<(), JoinError>),
}

impl LeaderTerm {
    pub fn start(
        id: u64,
        parent: &CancellationToken,
        source: Arc<dyn TargetSource>,
        destination: Arc<dyn TargetDestination>,
        config: &SyncConfig,
    ) -> Self {
        let scope = parent.child_token();
        let (commands_tx, commands_rx) = mpsc::channel(config.channel_capacity);

        let scheduler = RemovalScheduler::new(Arc::clone(&destination), config);
        let scheduler = tokio::spawn(scheduler.run(commands_rx, scope.clone()));

        let reconciler = Reconciler::new(source, destination, commands_tx);
        let reconciler = tokio::spawn(reconciler.run(scope.clone()));

        tracing::debug!("[Term {}] Started", id);
        Self { id, scope, reconciler: Some(reconciler), scheduler: Some(scheduler) }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves once either task ends by itself. Pending forever after both
    /// have been observed.
    ///
    /// The scheduler only returns on its own once the reconciler is gone, so
    /// a clean scheduler exit defers to the reconciler's result. A scheduler
    /// panic is reported directly.
    pub async fn finished(&mut self) -> SyncResult<()> {
        let exit = tokio::select! {
            biased;

            result = join(&mut self.reconciler) => TaskExit::Reconciler(result),
            result = join(&mut self.scheduler) => TaskExit::Scheduler(result),
        };

        match exit {
            TaskExit::Reconciler(result) => {
                self.reconciler = None;
                flatten(result)
            },
            TaskExit::Scheduler(Err(e)) => {
                self.scheduler = None;
                tracing::error!("[Term {}] Scheduler task failed: {}", self.id, e);
                Err(SyncError::TermPanicked(e.to_string()))
            },
            TaskExit::Scheduler(Ok(())) => {
                self.scheduler = None;
                match self.reconciler.take() {
                    Some(handle) => match flatten(handle.await) {
                        Ok(()) => Err(SyncError::SchedulerClosed),
                        Err(e) => Err(e),
                    },
                    None => Err(SyncError::SchedulerClosed),
                }
            },
        }
    }

    /// Cancel the scope and wait for both tasks. In-flight destination calls
    /// complete before this returns.
    pub async fn stop(mut self) {
        self.scope.cancel();

        if let Some(handle) = self.reconciler.take() {
            if let Err(e) = flatten(handle.await) {
                tracing::debug!("[Term {}] Reconciler ended with: {}", self.id, e);
            }
        }
        if let Some(handle) = self.scheduler.take() {
            if let Err(e) = handle.await {
                tracing::error!("[Term {}] Scheduler task panicked: {}", self.id, e);
            }
        }
        tracing::debug!("[Term {}] Stopped", self.id);
    }
}

impl Drop for LeaderTerm {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

/// Await a task handle; pending forever once it has been taken.
async fn join<T>(handle: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match handle.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn flatten(result: Result<SyncResult<()>, tokio::task::JoinError>) -> SyncResult<()> {
    result.unwrap_or_else(|e| Err(SyncError::TermPanicked(e.to_string())))
}
