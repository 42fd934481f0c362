//! API request handlers

mod health;
mod promises;
mod standings;

pub use health::*;
pub use promises::*;
pub use standings::*;
