//! Leadership-gated reconciliation.
//!
//! ## Leader term
//! While this replica holds the lock a [`LeaderTerm`](term) runs two tasks:
//! - the **reconciler**, which diffs every source snapshot against the
//!   destination, adds missing targets immediately and asks the scheduler to
//!   remove stale ones;
//! - the **removal scheduler**, which delays each removal by `remove_delay` and
//!   drops it if the target shows up again in the meantime.
//!
//! Both share one bounded command channel, so notifications from one diff pass
//! are applied in the order they were produced.
//!
//! ## Lifecycle
//! [`Syncer::run`] optionally registers this replica first, then follows the
//! locker: a term starts on `true`, is torn down on `false`, and nothing
//! survives a term. A new term always starts from a fresh diff.

mod queue;
mod reconciler;
mod scheduler;
mod self_register;
mod syncer;
mod term;
mod traits;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod reconciler_tests;

pub use reconciler::{ReconcileOutcome, Reconciler};
pub use scheduler::{RemovalScheduler, SchedulerCommand};
pub use self_register::register_self;
pub use syncer::{Syncer, SyncerState};
pub use traits::{LeadershipStream, Locker, SnapshotStream, TargetDestination, TargetSource};
