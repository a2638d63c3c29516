//! Locker for single-replica deployments.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::SyncResult;
use crate::sync::{LeadershipStream, Locker};
use targetsync_types::LockOptions;

/// Reports leadership once and holds it until the scope is cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticLocker;

#[async_trait]
impl Locker for StaticLocker {
    async fn lock(
        &self,
        scope: CancellationToken,
        options: &LockOptions,
    ) -> SyncResult<LeadershipStream> {
        tracing::warn!("[Locker] Static lock for {} -- every replica leads", options.key);
        let stream = async_stream::stream! {
            yield true;
            scope.cancelled().await;
        };
        Ok(stream.boxed())
    }
}
