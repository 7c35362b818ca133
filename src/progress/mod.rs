//! Per-device progress: the durable record and its storage service.

pub mod record;
pub mod store;

pub use record::{ProgressRecord, ProgressSummary};
pub use store::{JsonFileStore, MemoryStore, Persistence, ProgressStore};
