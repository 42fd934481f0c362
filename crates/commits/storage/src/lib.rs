//! Commitment store adapters.
//!
//! [`CommitmentStore`] is the persistence contract used by the daemon:
//! - [`memory::InMemoryCommitmentStore`] for tests and single-process runs
//! - `postgres::PostgresCommitmentStore` (feature `postgres`) as the durable
//!   backend
//!
//! Stores assign `id` and `created_at`; `created_at` never goes backwards
//! across successive creates on the same store.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryCommitmentStore;
pub use traits::{CommitmentStore, ListOrder};
