//! Order reconciliation and query module
//!
//! - **storage**: redb persistence of the whole collection in one slot
//! - **codec**: versioned document decode/encode with shape repair
//! - **migration**: startup normalization of timestamps and duplicate ids
//! - **merge**: last-write-wins with the status rank guard
//! - **limiter**: active orders per client
//! - **code**: `X001`-style codes
//! - **search**: name / phone / code lookup
//! - **sync**: pluggable remote fetch and push
//! - **manager**: the `OrdersManager` service tying these together
//!
//! # Architecture
//!
//! ```text
//! UI / bulk writer / remote ─► OrdersManager ─► merge ─► OrderStorage (redb)
//!                                  │
//!                                  └─► search / limiter (read side)
//! ```
//!
//! # Data Flow
//!
//! 1. Store opens, decode repairs shape, migration pass runs once
//! 2. Every write reads the stored collection inside a redb transaction
//! 3. Incoming records are reconciled against it by id
//! 4. The merged collection is committed atomically

pub mod code;
pub mod codec;
pub mod limiter;
pub mod manager;
pub mod merge;
pub mod migration;
pub mod search;
pub mod storage;
pub mod sync;

// Re-exports
pub use codec::{Decoded, DocState, SCHEMA_VERSION};
pub use limiter::{ClientLimiter, LimitExceeded};
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use merge::{merge_all, reconcile};
pub use migration::MigrationReport;
pub use search::SearchQuery;
pub use storage::{OrderStorage, StorageError, StorageResult};
pub use sync::{MemoryRemote, NoopRemote, RemoteOrders};

// Re-export shared types for convenience
pub use shared::order::{NewOrder, Order, OrderEdits, OrderFlags, OrderStatus};
