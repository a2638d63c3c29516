//! Leader election with a Consul session and a KV lock.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::client::ConsulClient;
use crate::error::{ConsulError, SyncResult};
use crate::sync::{LeadershipStream, Locker};
use targetsync_types::{ConsulConfig, LockOptions};

/// Consul rejects session TTLs below 10s.
const MIN_SESSION_TTL: Duration = Duration::from_secs(10);
const LEADERSHIP_BUFFER: usize = 4;

enum TermEnd {
    Cancelled,
    Closed,
    Lost,
}

/// Holds `options.key` through a TTL session renewed every TTL/2, or every
/// `renew_interval` when one is set.
///
/// Emits `true` when the key is acquired and `false` when the session or the
/// key is lost, then contends again with a fresh session.
#[derive(Debug, Clone)]
pub struct ConsulLocker {
    client: ConsulClient,
    session_name: String,
    retry_delay: Duration,
    renew_interval: Option<Duration>,
    tasks: TaskTracker,
}

impl ConsulLocker {
    pub fn new(config: &ConsulConfig) -> Result<Self, ConsulError> {
        Ok(Self::with_client(ConsulClient::new(config)?, config))
    }

    pub fn with_client(client: ConsulClient, config: &ConsulConfig) -> Self {
        Self {
            client,
            session_name: format!("targetsync-{}", config.service_name),
            retry_delay: config.retry_delay(),
            renew_interval: None,
            tasks: TaskTracker::new(),
        }
    }

    /// Renew and re-check the key at a fixed period instead of TTL/2.
    pub fn with_renew_interval(mut self, period: Duration) -> Self {
        self.renew_interval = Some(period);
        self
    }

    /// Wait until every lock whose scope was cancelled has released its key
    /// and destroyed its session.
    pub async fn wait_released(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    async fn contend(
        self,
        key: String,
        ttl: Duration,
        tx: mpsc::Sender<bool>,
        scope: CancellationToken,
    ) {
        let ttl = ttl.max(MIN_SESSION_TTL);

        loop {
            let created = tokio::select! {
                biased;

                () = scope.cancelled() => return,
                created = self.client.create_session(&self.session_name, ttl) => created,
            };
            let session = match created {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("[Locker] Session create failed: {}", e);
                    if !self.pause(&scope).await {
                        return;
                    }
                    continue;
                },
            };
            tracing::debug!("[Locker] Session {} created (ttl {:?})", session, ttl);

            let (end, held) = self.hold(&key, &session, ttl, &tx, &scope).await;
            self.cleanup(&key, &session, held).await;

            match end {
                TermEnd::Cancelled | TermEnd::Closed => return,
                TermEnd::Lost => {
                    if !self.pause(&scope).await {
                        return;
                    }
                },
            }
        }
    }

    /// Renew and (re)acquire on every tick. Returns how the session ended and
    /// whether the key was held at that point.
    async fn hold(
        &self,
        key: &str,
        session: &str,
        ttl: Duration,
        tx: &mpsc::Sender<bool>,
        scope: &CancellationToken,
    ) -> (TermEnd, bool) {
        let period = self.renew_interval.unwrap_or(ttl / 2);
        let mut ticker = interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut leading = false;

        loop {
            tokio::select! {
                biased;

                () = scope.cancelled() => return (TermEnd::Cancelled, leading),
                _ = ticker.tick() => {},
            }

            let renewed = match self.client.renew_session(session).await {
                Ok(renewed) => renewed,
                Err(e) => {
                    tracing::warn!("[Locker] Session {} renew failed: {}", session, e);
                    false
                },
            };
            let held = renewed
                && match self.client.acquire(key, session).await {
                    Ok(held) => held,
                    Err(e) => {
                        tracing::warn!("[Locker] Acquire of {} failed: {}", key, e);
                        false
                    },
                };

            if held && !leading {
                leading = true;
                tracing::info!("[Locker] Acquired {}", key);
                if tx.send(true).await.is_err() {
                    return (TermEnd::Closed, leading);
                }
            } else if !held && leading {
                tracing::warn!("[Locker] Lost {}", key);
                let _ = tx.send(false).await;
                return (TermEnd::Lost, false);
            } else if !renewed {
                return (TermEnd::Lost, false);
            }
        }
    }

    async fn cleanup(&self, key: &str, session: &str, held: bool) {
        if held {
            if let Err(e) = self.client.release(key, session).await {
                tracing::warn!("[Locker] Release of {} failed: {}", key, e);
            }
        }
        if let Err(e) = self.client.destroy_session(session).await {
            tracing::debug!("[Locker] Session {} destroy failed: {}", session, e);
        }
    }

    /// Sleep `retry_delay`; false if cancelled first.
    async fn pause(&self, scope: &CancellationToken) -> bool {
        tokio::select! {
            () = scope.cancelled() => false,
            () = tokio::time::sleep(self.retry_delay) => true,
        }
    }
}

#[async_trait]
impl Locker for ConsulLocker {
    async fn lock(
        &self,
        scope: CancellationToken,
        options: &LockOptions,
    ) -> SyncResult<LeadershipStream> {
        let (tx, rx) = mpsc::channel(LEADERSHIP_BUFFER);
        self.tasks.spawn(self.clone().contend(options.key.clone(), options.ttl(), tx, scope));
        Ok(ReceiverStream::new(rx).boxed())
    }
}
