//! Originator identity translation for Tally.
//!
//! Events arrive tagged with the caller's raw bearer token. Those tokens are
//! credentials and must never reach storage or logs in the clear. This crate
//! maps a token to two safe forms:
//!
//! - a **storage id** used as the `source` partition key (the token's region
//!   code, falling back to the token itself when no region is known), and
//! - a **display form** for logs (the region code, or just the first and last
//!   character of the token).
//!
//! The token → region lookup is consumed through the [`Authenticator`]
//! trait. The process builds one [`TokenTable`] at startup and injects it
//! into an [`OriginatorTranslator`]; it is never reconfigured afterwards.

mod authenticator;
mod translator;

use thiserror::Error;

pub use authenticator::{Authenticator, TokenTable, UNMAPPED_REGION};
pub use translator::{OriginatorTranslator, Resolution, OBFUSCATION_MARKER};

/// Errors produced by identity translation and token table setup.
///
/// None of the variants carry a raw token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The caller asked for the display form of an empty token.
    #[error("originator token cannot be empty")]
    EmptyToken,
    /// An entry in a token list is not of the form `token=region`.
    #[error("token table entry {index} is malformed, expected `token=region`")]
    MalformedTokenEntry {
        /// Zero-based position of the entry in the list.
        index: usize,
    },
    /// The same token appears twice in a token list.
    #[error("token table entry {index} repeats an earlier token")]
    DuplicateToken {
        /// Zero-based position of the repeated entry.
        index: usize,
    },
}
