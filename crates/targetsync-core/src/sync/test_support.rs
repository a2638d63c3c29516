//! In-process collaborators for sync engine tests.

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use super::traits::{LeadershipStream, Locker, SnapshotStream, TargetDestination, TargetSource};
use crate::error::{DestinationError, DestinationResult, SyncError, SyncResult};
use targetsync_types::{LockOptions, Snapshot, SyncConfig, Target};

pub fn target(address: &str) -> Target {
    Target::new(address, 80)
}

pub fn targets(addresses: &[&str]) -> Vec<Target> {
    addresses.iter().map(|a| target(a)).collect()
}

pub fn sync_config(remove_delay_secs: u64) -> SyncConfig {
    SyncConfig {
        remove_delay_secs,
        term_restart_delay_secs: 2,
        ..SyncConfig::default()
    }
}

/// Let spawned tasks run. With a paused clock this also advances time by 10ms.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[derive(Default)]
struct SourceState {
    latest: Option<Snapshot>,
    subscribers: Vec<mpsc::UnboundedSender<Snapshot>>,
    subscriptions: usize,
}

/// Fans every pushed snapshot out to all live subscriptions. A new
/// subscription first receives the latest snapshot, like a catalog query.
#[derive(Default)]
pub struct ChannelSource {
    state: Mutex<SourceState>,
}

impl ChannelSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, targets: &[Target]) {
        let snapshot: Snapshot = targets.iter().cloned().collect();
        let mut state = self.state.lock();
        state.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        state.latest = Some(snapshot);
    }

    pub fn subscriptions(&self) -> usize {
        self.state.lock().subscriptions
    }
}

#[async_trait]
impl TargetSource for ChannelSource {
    async fn subscribe(&self, scope: CancellationToken) -> SyncResult<SnapshotStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        if let Some(latest) = &state.latest {
            let _ = tx.send(latest.clone());
        }
        state.subscribers.push(tx);
        state.subscriptions += 1;
        drop(state);

        Ok(UnboundedReceiverStream::new(rx).take_until(scope.cancelled_owned()).boxed())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationCall {
    Add(Vec<Target>),
    Remove(Vec<Target>),
}

#[derive(Default)]
struct DestinationState {
    targets: BTreeSet<Target>,
    calls: Vec<(Instant, DestinationCall)>,
    failed_calls: usize,
    fail_adds: usize,
    fail_removes: usize,
    fail_gets: usize,
    panic_removes: usize,
}

/// Destination that records every successful mutation with its time.
#[derive(Default)]
pub struct RecordingDestination {
    state: Mutex<DestinationState>,
}

impl RecordingDestination {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_targets(targets: &[Target]) -> Arc<Self> {
        let destination = Self::default();
        destination.state.lock().targets = targets.iter().cloned().collect();
        Arc::new(destination)
    }

    pub fn targets(&self) -> Vec<Target> {
        self.state.lock().targets.iter().cloned().collect()
    }

    pub fn calls(&self) -> Vec<DestinationCall> {
        self.state.lock().calls.iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, DestinationCall)> {
        self.state.lock().calls.clone()
    }

    pub fn removes(&self) -> Vec<Vec<Target>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DestinationCall::Remove(targets) => Some(targets),
                DestinationCall::Add(_) => None,
            })
            .collect()
    }

    pub fn adds(&self) -> Vec<Vec<Target>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DestinationCall::Add(targets) => Some(targets),
                DestinationCall::Remove(_) => None,
            })
            .collect()
    }

    pub fn failed_calls(&self) -> usize {
        self.state.lock().failed_calls
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn fail_next_adds(&self, n: usize) {
        self.state.lock().fail_adds = n;
    }

    pub fn fail_next_removes(&self, n: usize) {
        self.state.lock().fail_removes = n;
    }

    pub fn fail_next_gets(&self, n: usize) {
        self.state.lock().fail_gets = n;
    }

    /// The next `n` removals panic inside the calling task.
    pub fn panic_next_removes(&self, n: usize) {
        self.state.lock().panic_removes = n;
    }
}

fn take_failure(budget: &mut usize) -> bool {
    if *budget == 0 {
        return false;
    }
    *budget -= 1;
    true
}

#[async_trait]
impl TargetDestination for RecordingDestination {
    async fn get_targets(&self) -> DestinationResult<Vec<Target>> {
        let mut state = self.state.lock();
        if take_failure(&mut state.fail_gets) {
            return Err(DestinationError::Unavailable("injected get failure".to_string()));
        }
        Ok(state.targets.iter().cloned().collect())
    }

    async fn add_targets(&self, targets: &[Target]) -> DestinationResult<()> {
        let mut state = self.state.lock();
        if take_failure(&mut state.fail_adds) {
            state.failed_calls += 1;
            return Err(DestinationError::Rejected("injected add failure".to_string()));
        }
        state.targets.extend(targets.iter().cloned());
        state.calls.push((Instant::now(), DestinationCall::Add(targets.to_vec())));
        Ok(())
    }

    async fn remove_targets(&self, targets: &[Target]) -> DestinationResult<()> {
        let mut state = self.state.lock();
        if take_failure(&mut state.panic_removes) {
            drop(state);
            panic!("injected remove panic");
        }
        if take_failure(&mut state.fail_removes) {
            state.failed_calls += 1;
            return Err(DestinationError::Unavailable("injected remove failure".to_string()));
        }
        for target in targets {
            state.targets.remove(target);
        }
        state.calls.push((Instant::now(), DestinationCall::Remove(targets.to_vec())));
        Ok(())
    }
}

/// Locker whose leadership stream is driven by the test.
pub struct ScriptedLocker {
    tx: Mutex<Option<mpsc::UnboundedSender<bool>>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<bool>>>,
}

impl ScriptedLocker {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self { tx: Mutex::new(Some(tx)), rx: Mutex::new(Some(rx)) })
    }

    /// A locker that reports leadership immediately.
    pub fn elected() -> Arc<Self> {
        let locker = Self::new();
        locker.set(true);
        locker
    }

    pub fn set(&self, elected: bool) {
        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(elected);
        }
    }

    /// End the leadership stream without cancellation.
    pub fn close(&self) {
        self.tx.lock().take();
    }
}

#[async_trait]
impl Locker for ScriptedLocker {
    async fn lock(
        &self,
        scope: CancellationToken,
        _options: &LockOptions,
    ) -> SyncResult<LeadershipStream> {
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or_else(|| SyncError::Locker("lock already taken".to_string()))?;
        Ok(UnboundedReceiverStream::new(rx).take_until(scope.cancelled_owned()).boxed())
    }
}
