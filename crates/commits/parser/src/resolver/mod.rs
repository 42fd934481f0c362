//! Date/time phrase resolution.
//!
//! A resolver looks at the text following a deadline keyword and reports at
//! most one timestamp together with the byte span of the phrase it consumed.

mod iso;
mod natural;

pub use iso::IsoDateResolver;
pub use natural::NaturalDateResolver;

use chrono::{DateTime, Utc};
use std::ops::Range;

use crate::ResolverError;

/// A timestamp found in a phrase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved instant.
    pub at: DateTime<Utc>,
    /// Byte range of the phrase that produced `at`.
    pub span: Range<usize>,
}

/// Resolves free text to a concrete timestamp.
///
/// Implementations must be deterministic for a given phrase and reference
/// time. `Ok(None)` means no date was found; `Err` means the resolver could
/// not run.
pub trait PhraseResolver: Send + Sync {
    fn resolve(
        &self,
        phrase: &str,
        reference_now: DateTime<Utc>,
    ) -> Result<Option<Resolution>, ResolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn PhraseResolver) {}
    }
}
