//! commitsd library
//!
//! Maps `user.promises.to/...` addresses onto the expression parser and a
//! commitment store, and serves the results as JSON:
//! - address splitting ([`address`])
//! - the parse → store → score pipeline ([`service`])
//! - REST handlers ([`api`])
//! - configuration and server lifecycle

pub mod address;
pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod service;

pub use address::CommitmentAddress;
pub use config::DaemonConfig;
pub use error::{AddressError, ApiError, DaemonError, ServiceError};
pub use server::Server;
pub use service::CommitmentService;
