//! Leadership lifecycle: the top-level control loop.

use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use super::scheduler::deadline_after;
use super::self_register::register_self;
use super::term::LeaderTerm;
use super::traits::{Locker, TargetDestination, TargetSource};
use crate::error::{SyncError, SyncResult};
use targetsync_types::{SyncConfig, TermFailurePolicy};

/// Externally observable state of a [`Syncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncerState {
    /// Not started yet, or waiting for self-registration
    Registering,
    /// Following the locker without holding the lock
    Idle,
    /// Holding the lock
    Leading,
    /// `run` has returned
    Stopped,
}

impl SyncerState {
    /// Startup work is done and the control loop is live.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Idle | Self::Leading)
    }
}

impl fmt::Display for SyncerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Registering => write!(f, "registering"),
            Self::Idle => write!(f, "idle"),
            Self::Leading => write!(f, "leading"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Wires a source, a destination and a locker together.
pub struct Syncer {
    config: SyncConfig,
    local_addr: Option<String>,
    locker: Arc<dyn Locker>,
    source: Arc<dyn TargetSource>,
    destination: Arc<dyn TargetDestination>,
    state: watch::Sender<SyncerState>,
}

impl Syncer {
    pub fn new(
        config: SyncConfig,
        locker: Arc<dyn Locker>,
        source: Arc<dyn TargetSource>,
        destination: Arc<dyn TargetDestination>,
    ) -> Self {
        let (state, _) = watch::channel(SyncerState::Registering);
        Self { config, local_addr: None, locker, source, destination, state }
    }

    /// Register `addr` in the destination at startup, once it shows up in the
    /// source. An empty address disables self-registration.
    pub fn with_local_addr(mut self, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        self.local_addr = (!addr.is_empty()).then_some(addr);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn state(&self) -> SyncerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncerState> {
        self.state.subscribe()
    }

    /// Run until `shutdown` is cancelled (`Ok`) or a fatal error occurs.
    ///
    /// The lock is released on every exit path.
    pub async fn run(&self, shutdown: CancellationToken) -> SyncResult<()> {
        let result = self.run_inner(&shutdown).await;
        self.set_state(SyncerState::Stopped);
        result
    }

    async fn run_inner(&self, shutdown: &CancellationToken) -> SyncResult<()> {
        if let Some(addr) = &self.local_addr {
            self.set_state(SyncerState::Registering);
            let registered =
                register_self(&*self.source, &*self.destination, addr, shutdown).await?;
            if registered.is_none() {
                return Ok(());
            }
        }

        self.set_state(SyncerState::Idle);

        let lock_scope = shutdown.child_token();
        let _release_lock = lock_scope.clone().drop_guard();
        tracing::debug!("[Syncer] Creating lock: {:?}", self.config.lock_options);
        let mut elected = self.locker.lock(lock_scope.clone(), &self.config.lock_options).await?;

        let mut term: Option<LeaderTerm> = None;
        let mut leading = false;
        let mut restart_at: Option<Instant> = None;
        let mut next_term_id = 1_u64;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    if let Some(active) = term.take() {
                        active.stop().await;
                    }
                    tracing::info!("[Syncer] Shutdown requested, stopping");
                    return Ok(());
                }
                event = elected.next() => match event {
                    None => {
                        if let Some(active) = term.take() {
                            active.stop().await;
                        }
                        tracing::error!("[Syncer] Lock channel closed");
                        return Err(SyncError::LockerClosed);
                    },
                    Some(true) => {
                        if !leading {
                            leading = true;
                            tracing::info!("[Syncer] Lock acquired, starting leader actions");
                            term = Some(self.start_term(&lock_scope, &mut next_term_id));
                            self.set_state(SyncerState::Leading);
                        }
                    },
                    Some(false) => {
                        if leading {
                            leading = false;
                            restart_at = None;
                            tracing::info!("[Syncer] Lock lost, stopping leader actions");
                            if let Some(active) = term.take() {
                                active.stop().await;
                            }
                            self.set_state(SyncerState::Idle);
                        }
                    },
                },
                result = term_finished(&mut term) => {
                    if let Some(finished) = term.take() {
                        finished.stop().await;
                    }
                    let err = match result {
                        Ok(()) => continue,
                        Err(e) => e,
                    };

                    match self.config.on_term_failure {
                        TermFailurePolicy::Abort => {
                            tracing::error!("[Syncer] Leader term failed, aborting: {}", err);
                            return Err(SyncError::TermFailed(Box::new(err)));
                        },
                        TermFailurePolicy::Restart => {
                            let delay = self.config.term_restart_delay();
                            tracing::error!(
                                "[Syncer] Leader term failed, restarting in {:?}: {}",
                                delay,
                                err
                            );
                            restart_at = Some(deadline_after(Instant::now(), delay));
                        },
                    }
                }
                () = sleep_until(restart_at.unwrap_or_else(Instant::now)), if leading && restart_at.is_some() => {
                    restart_at = None;
                    tracing::info!("[Syncer] Restarting leader actions");
                    term = Some(self.start_term(&lock_scope, &mut next_term_id));
                }
            }
        }
    }

    fn start_term(&self, parent: &CancellationToken, next_id: &mut u64) -> LeaderTerm {
        let id = *next_id;
        *next_id += 1;
        let term = LeaderTerm::start(
            id,
            parent,
            Arc::clone(&self.source),
            Arc::clone(&self.destination),
            &self.config,
        );
        tracing::debug!("[Syncer] Leader term {} running", term.id());
        term
    }

    fn set_state(&self, state: SyncerState) {
        self.state.send_replace(state);
    }
}

async fn term_finished(term: &mut Option<LeaderTerm>) -> SyncResult<()> {
    match term.as_mut() {
        Some(active) => active.finished().await,
        None => std::future::pending().await,
    }
}
