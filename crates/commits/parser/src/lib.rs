//! Promise expression parser.
//!
//! Given the path text a user typed after `bob.promises.to/`, the parser
//! produces a [`commits_types::CommitmentDraft`]:
//!
//! ```text
//! quit-smoking-by-2030-01-01
//! └──────────┘ └┘ └────────┘
//!  action text  │  deadline phrase, handed to a PhraseResolver
//!               deadline keyword
//! ```
//!
//! Deadline phrases are resolved through the [`PhraseResolver`] trait so that
//! callers and tests can substitute their own resolver. Two are shipped:
//! [`IsoDateResolver`] and the best-effort English [`NaturalDateResolver`].

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod config;
mod decode;
mod error;
mod expression;
pub mod resolver;

pub use config::ParserConfig;
pub use decode::decode_strict;
pub use error::{ParseError, ParserConfigError, ResolverError};
pub use expression::{Modifier, ParsedCommitment, PromiseParser};
pub use resolver::{IsoDateResolver, NaturalDateResolver, PhraseResolver, Resolution};
