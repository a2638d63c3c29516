//! In-process destination.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeSet;

use crate::error::DestinationResult;
use crate::sync::TargetDestination;
use targetsync_types::Target;

/// Destination backed by a set in memory. Every change is logged, which makes
/// it a dry run for a real load balancer.
#[derive(Debug, Default)]
pub struct MemoryDestination {
    targets: RwLock<BTreeSet<Target>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: impl IntoIterator<Item = Target>) -> Self {
        Self { targets: RwLock::new(targets.into_iter().collect()) }
    }

    pub fn snapshot(&self) -> Vec<Target> {
        self.targets.read().iter().cloned().collect()
    }
}

#[async_trait]
impl TargetDestination for MemoryDestination {
    async fn get_targets(&self) -> DestinationResult<Vec<Target>> {
        Ok(self.snapshot())
    }

    async fn add_targets(&self, targets: &[Target]) -> DestinationResult<()> {
        let mut current = self.targets.write();
        for target in targets {
            if current.insert(target.clone()) {
                tracing::info!("[Destination] Added {}", target);
            }
        }
        Ok(())
    }

    async fn remove_targets(&self, targets: &[Target]) -> DestinationResult<()> {
        let mut current = self.targets.write();
        for target in targets {
            if current.remove(target) {
                tracing::info!("[Destination] Removed {}", target);
            }
        }
        Ok(())
    }
}
