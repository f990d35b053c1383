//! Storage backends for probe results
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` allows swapping implementations
//! - **Per-writer connections**: `BackendConnector` opens one connection per
//!   writer, so writers fail independently
//! - **Async**: All operations are async for use from the writer tasks
//!
//! ## Backends
//!
//! - **InfluxDB** (default): line protocol over the 1.x HTTP API
//! - **In-Memory**: no persistence, for tests and dry runs

pub mod backend;
pub mod error;
pub mod influx;
pub mod memory;
pub mod point;

pub use backend::{BackendConnector, HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use influx::{InfluxBackend, InfluxConnector};
pub use memory::MemoryBackend;
pub use point::{FieldValue, Point};
