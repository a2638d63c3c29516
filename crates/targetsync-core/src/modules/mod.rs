//! Configuration loading and the adapters that need no external service.

pub mod config;
pub mod memory;
pub mod static_locker;

pub use config::{load_config, parse_config};
pub use memory::MemoryDestination;
pub use static_locker::StaticLocker;
