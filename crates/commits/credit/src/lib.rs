//! Lateness / credit scoring.
//!
//! A record's credit is a signed number of policy-weighted hours:
//! - no deadline, or open and not yet due: `0`
//! - open and overdue: `-late_rate * hours_overdue`, unbounded
//! - completed: `+early_rate * hours_early`, or `-late_rate * hours_late`
//!
//! Higher is better. [`CreditValue`] is totally ordered so it can be used
//! directly as a sort key.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod engine;
mod error;
mod policy;
mod standing;
mod value;

pub use engine::{rank, CreditEngine, ScoredCommitment, Timeliness};
pub use error::PolicyError;
pub use policy::CreditPolicy;
pub use standing::UserStanding;
pub use value::CreditValue;
