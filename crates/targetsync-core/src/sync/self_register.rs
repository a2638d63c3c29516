//! Startup self-registration.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::traits::{TargetDestination, TargetSource};
use crate::error::{SyncError, SyncResult};
use targetsync_types::Target;

/// Wait until a snapshot contains a target whose address is `local_addr`, then
/// add that target to the destination once.
///
/// Runs on every replica regardless of leadership; destinations tolerate the
/// duplicate adds. Returns `Ok(None)` if `shutdown` fires first.
pub async fn register_self(
    source: &dyn TargetSource,
    destination: &dyn TargetDestination,
    local_addr: &str,
    shutdown: &CancellationToken,
) -> SyncResult<Option<Target>> {
    let scope = shutdown.child_token();
    let _subscription = scope.clone().drop_guard();

    tracing::info!("[Register] Local addr {} -- waiting until present in source", local_addr);
    let mut snapshots = source.subscribe(scope.clone()).await?;

    loop {
        let next = tokio::select! {
            biased;

            () = scope.cancelled() => return Ok(None),
            next = snapshots.next() => next,
        };
        let Some(snapshot) = next else {
            return Err(SyncError::SourceClosed);
        };

        let Some(target) = snapshot.find_address(local_addr) else {
            tracing::debug!(
                "[Register] {} not among {} source targets yet",
                local_addr,
                snapshot.len()
            );
            continue;
        };

        destination.add_targets(std::slice::from_ref(target)).await?;
        tracing::info!("[Register] Added {} to destination", target);
        return Ok(Some(target.clone()));
    }
}
