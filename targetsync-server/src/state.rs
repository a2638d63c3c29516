use tokio::sync::watch;

use targetsync_core::SyncerState;

/// Shared state for the probe handlers.
#[derive(Clone)]
pub struct AppState {
    syncer: watch::Receiver<SyncerState>,
}

impl AppState {
    pub fn new(syncer: watch::Receiver<SyncerState>) -> Self {
        Self { syncer }
    }

    pub fn syncer_state(&self) -> SyncerState {
        *self.syncer.borrow()
    }
}
