//! Collaborator contracts consumed by the sync engine.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::error::{DestinationResult, SyncResult};
use targetsync_types::{LockOptions, Snapshot, Target};

/// Full-membership snapshots, in emission order.
pub type SnapshotStream = BoxStream<'static, Snapshot>;

/// Level-triggered leadership: the latest value is the current state.
pub type LeadershipStream = BoxStream<'static, bool>;

/// Produces the desired membership.
#[async_trait]
pub trait TargetSource: Send + Sync {
    /// Start a subscription bound to `scope`.
    ///
    /// The stream keeps emitting complete snapshots until `scope` is
    /// cancelled, then ends. Fetch failures are retried by the implementation
    /// and never surface as items.
    async fn subscribe(&self, scope: CancellationToken) -> SyncResult<SnapshotStream>;
}

/// Holds the externally visible membership (e.g. a load-balancer target group).
///
/// Adding a present target and removing an absent one must both succeed.
#[async_trait]
pub trait TargetDestination: Send + Sync {
    async fn get_targets(&self) -> DestinationResult<Vec<Target>>;
    async fn add_targets(&self, targets: &[Target]) -> DestinationResult<()>;
    async fn remove_targets(&self, targets: &[Target]) -> DestinationResult<()>;
}

/// Leader election.
#[async_trait]
pub trait Locker: Send + Sync {
    /// Contend for the lock described by `options` until `scope` is cancelled.
    ///
    /// `true` means this replica holds the lock. The stream ending before
    /// `scope` is cancelled is a fatal locker failure.
    async fn lock(
        &self,
        scope: CancellationToken,
        options: &LockOptions,
    ) -> SyncResult<LeadershipStream>;
}
