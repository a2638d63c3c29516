//! Consul adapters: catalog membership as a [`TargetSource`](crate::TargetSource)
//! and session locks as a [`Locker`](crate::Locker).
//!
//! Both spawn their own task per subscription and end their stream once the
//! scope they were handed is cancelled.

mod client;
mod locker;
mod source;


pub use client::{ConsulClient, NodeInfo, ServiceEntry, ServiceInfo};
pub use locker::ConsulLocker;
pub use source::ConsulSource;
