//! Catalog membership from Consul health checks.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::client::{ConsulClient, ServiceEntry};
use crate::error::{ConsulError, SyncResult};
use crate::sync::{SnapshotStream, TargetSource};
use targetsync_types::{ConsulConfig, Snapshot};

const SNAPSHOT_BUFFER: usize = 16;

/// Passing instances of one Consul service, tracked with blocking queries.
#[derive(Debug, Clone)]
pub struct ConsulSource {
    client: ConsulClient,
    service: String,
    tag: Option<String>,
    wait: Duration,
    retry_delay: Duration,
}

impl ConsulSource {
    pub fn new(config: &ConsulConfig) -> Result<Self, ConsulError> {
        Ok(Self::with_client(ConsulClient::new(config)?, config))
    }

    pub fn with_client(client: ConsulClient, config: &ConsulConfig) -> Self {
        Self {
            client,
            service: config.service_name.clone(),
            tag: config.tag.clone(),
            wait: config.wait(),
            retry_delay: config.retry_delay(),
        }
    }

    async fn watch(self, tx: mpsc::Sender<Snapshot>, scope: CancellationToken) {
        let mut index = 0_u64;
        tracing::info!("[Consul] Watching service {} at {}", self.service, self.client.base_url());

        loop {
            let result = tokio::select! {
                biased;

                () = scope.cancelled() => break,
                result = self.client.health_service(&self.service, self.tag.as_deref(), index, self.wait) => result,
            };

            let (entries, new_index) = match result {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        "[Consul] Query for {} failed, retrying in {:?}: {}",
                        self.service,
                        self.retry_delay,
                        e
                    );
                    tokio::select! {
                        () = scope.cancelled() => break,
                        () = tokio::time::sleep(self.retry_delay) => continue,
                    }
                },
            };

            if new_index < index {
                tracing::debug!("[Consul] Index went backwards ({} -> {}), resetting", index, new_index);
                index = 0;
                continue;
            }
            if new_index == index {
                continue;
            }
            index = new_index;

            let snapshot: Snapshot = entries.iter().map(ServiceEntry::target).collect();
            tracing::debug!("[Consul] {} passing instances at index {}", snapshot.len(), index);
            if tx.send(snapshot).await.is_err() {
                break;
            }
        }
        tracing::debug!("[Consul] Watch on {} stopped", self.service);
    }
}

#[async_trait]
impl TargetSource for ConsulSource {
    async fn subscribe(&self, scope: CancellationToken) -> SyncResult<SnapshotStream> {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        tokio::spawn(self.clone().watch(tx, scope));
        Ok(ReceiverStream::new(rx).boxed())
    }
}
