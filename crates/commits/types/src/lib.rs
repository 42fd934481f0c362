//! Commitment record model.
//!
//! A commitment is published by visiting `user.promises.to/<expression>` or
//! `user.commits.to/<expression>`. The types here are shared by:
//! - the expression parser (produces [`CommitmentDraft`])
//! - the stores (turn drafts into [`CommitmentRecord`]s)
//! - the credit engine and the daemon (read records)

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod grouping;
mod kind;
mod record;
mod user;

pub use error::FieldError;
pub use grouping::group_by_user;
pub use kind::CommitmentKind;
pub use record::{CommitmentDraft, CommitmentId, CommitmentRecord};
pub use user::UserHandle;
