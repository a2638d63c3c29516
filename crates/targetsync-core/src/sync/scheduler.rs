//! Debounced removal scheduler.
//!
//! A target that disappears from the source is not removed right away: it is
//! queued with a deadline of `now + remove_delay`. If the reconciler reconfirms
//! the target before that deadline the entry is dropped. A single timer tracks
//! the earliest deadline; when it fires, due entries are removed one target at
//! a time, oldest first.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use super::queue::RemovalQueue;
use super::traits::TargetDestination;
use targetsync_types::{SyncConfig, Target};

/// Roughly 30 years; stands in for "never" when a deadline is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + delay`, saturating to a far-future instant instead of overflowing.
pub(super) fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Notification sent from the reconciler to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// The target is in the latest snapshot; cancel any pending removal.
    Reconfirm(Target),
    /// The target is in the destination but not in the latest snapshot.
    Remove(Target),
}

/// Owns the pending removals of one leader term.
pub struct RemovalScheduler {
    destination: Arc<dyn TargetDestination>,
    remove_delay: Duration,
    retry_delay: Duration,
    idle_timeout: Duration,
    queue: RemovalQueue,
}

impl RemovalScheduler {
    pub fn new(destination: Arc<dyn TargetDestination>, config: &SyncConfig) -> Self {
        Self {
            destination,
            remove_delay: config.remove_delay(),
            retry_delay: config.remove_retry_delay(),
            idle_timeout: config.idle_timeout(),
            queue: RemovalQueue::default(),
        }
    }

    /// Process commands and timer wake-ups until `scope` is cancelled or the
    /// command channel closes. Pending removals are discarded on exit.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SchedulerCommand>, scope: CancellationToken) {
        let timer = sleep_until(deadline_after(Instant::now(), self.idle_timeout));
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                () = scope.cancelled() => {
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("[Scheduler] Command channel closed");
                        break;
                    };
                    if let Some(wake_at) = self.handle(command, Instant::now()) {
                        timer.as_mut().reset(wake_at);
                    }
                }
                () = &mut timer => {
                    let wake_at = self.drain(&scope).await;
                    timer.as_mut().reset(wake_at);
                }
            }
        }

        if !self.queue.is_empty() {
            tracing::debug!("[Scheduler] Discarding {} pending removals", self.queue.len());
        }
    }

    /// Apply one command. Returns the new timer deadline if the earliest
    /// pending deadline changed.
    fn handle(&mut self, command: SchedulerCommand, now: Instant) -> Option<Instant> {
        match command {
            SchedulerCommand::Remove(target) => {
                let key = target.key();
                if self.queue.contains(&key) {
                    return None;
                }

                let deadline = deadline_after(now, self.remove_delay);
                let is_earliest = self.queue.next_deadline().map_or(true, |head| deadline < head);
                tracing::debug!(
                    "[Scheduler] Scheduling {} for removal in {:?}",
                    target,
                    self.remove_delay
                );
                self.queue.schedule(target, deadline);

                is_earliest.then_some(deadline)
            },
            SchedulerCommand::Reconfirm(target) => {
                let key = target.key();
                let was_head = self.queue.is_head(&key);
                self.queue.cancel(&key)?;
                tracing::debug!("[Scheduler] {} reappeared, removal cancelled", target);

                was_head.then(|| self.next_wake(now))
            },
        }
    }

    /// Remove every due target, oldest first. Stops at the first failure and
    /// returns when the timer should fire next.
    async fn drain(&mut self, scope: &CancellationToken) -> Instant {
        while let Some((target, deadline)) = self.queue.peek() {
            if scope.is_cancelled() || deadline > Instant::now() {
                break;
            }

            let target = target.clone();
            tracing::debug!("[Scheduler] Processing target removal: {}", target);
            match self.destination.remove_targets(std::slice::from_ref(&target)).await {
                Ok(()) => {
                    tracing::info!("[Scheduler] Removed {} from destination", target);
                    self.queue.pop();
                },
                Err(e) => {
                    tracing::warn!(
                        "[Scheduler] Target removal unsuccessful {}: {} (retrying in {:?})",
                        target,
                        e,
                        self.retry_delay
                    );
                    return deadline_after(Instant::now(), self.retry_delay);
                },
            }
        }

        self.next_wake(Instant::now())
    }

    fn next_wake(&self, now: Instant) -> Instant {
        self.queue.next_deadline().unwrap_or_else(|| deadline_after(now, self.idle_timeout))
    }
}
