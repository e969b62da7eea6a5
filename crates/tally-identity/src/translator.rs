//! Storage and display forms of an originator token.

use std::sync::Arc;

use crate::authenticator::{Authenticator, UNMAPPED_REGION};
use crate::IdentityError;

/// Placed between the first and last character of an unmapped token's
/// display form.
pub const OBFUSCATION_MARKER: &str = "...";

/// Outcome of looking a token up in the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The token belongs to this region.
    Mapped(String),
    /// The token is unknown, stale, or recognised without a region.
    Unmapped,
}

/// Translates raw originator tokens into storage and log-safe forms.
///
/// Holds the process-wide authenticator. Cloning is cheap and every clone
/// shares the same lookup table.
#[derive(Clone)]
pub struct OriginatorTranslator {
    authenticator: Arc<dyn Authenticator>,
}

impl OriginatorTranslator {
    /// Creates a translator backed by `authenticator`.
    ///
    /// Construct it once during startup, before any event is saved, and
    /// share it; the authenticator is never swapped afterwards.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Looks `token` up, folding the unmapped sentinel into
    /// [`Resolution::Unmapped`].
    pub fn resolve(&self, token: &str) -> Resolution {
        match self.authenticator.authenticate(token) {
            Some(region) if region != UNMAPPED_REGION => Resolution::Mapped(region),
            _ => Resolution::Unmapped,
        }
    }

    /// Returns the identifier stored as an event's `source`.
    ///
    /// This is the token's region code. Unmapped tokens fall back to the raw
    /// token so events are still partitioned by originator; the result must
    /// therefore be treated as sensitive and never logged.
    pub fn storage_id(&self, token: &str) -> String {
        match self.resolve(token) {
            Resolution::Mapped(region) => region,
            Resolution::Unmapped => token.to_string(),
        }
    }

    /// Returns a form of `token` that is safe to write to logs.
    ///
    /// Mapped tokens display as their region code. Unmapped tokens display
    /// as their first and last character joined by [`OBFUSCATION_MARKER`];
    /// nothing from the interior of the token is ever included.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyToken`] if `token` is empty.
    pub fn display(&self, token: &str) -> Result<String, IdentityError> {
        let mut chars = token.chars();
        let first = chars.next().ok_or(IdentityError::EmptyToken)?;
        let last = chars.next_back().unwrap_or(first);

        Ok(match self.resolve(token) {
            Resolution::Mapped(region) => region,
            Resolution::Unmapped => format!("{first}{OBFUSCATION_MARKER}{last}"),
        })
    }
}

impl std::fmt::Debug for OriginatorTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginatorTranslator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenTable;

    fn translator() -> OriginatorTranslator {
        OriginatorTranslator::new(Arc::new(TokenTable::from_pairs([
            ("ontario-token", "ON"),
            ("pending-token", UNMAPPED_REGION),
        ])))
    }

    #[test]
    fn storage_id_uses_region_when_mapped() {
        assert_eq!(translator().storage_id("ontario-token"), "ON");
    }

    #[test]
    fn storage_id_falls_back_to_token() {
        let t = translator();
        assert_eq!(t.storage_id("pending-token"), "pending-token");
        assert_eq!(t.storage_id("unknown-token"), "unknown-token");
    }

    #[test]
    fn display_uses_region_when_mapped() {
        assert_eq!(translator().display("ontario-token").as_deref(), Ok("ON"));
    }

    #[test]
    fn display_obfuscates_unmapped_tokens() {
        let t = translator();
        assert_eq!(t.display("pending-token").as_deref(), Ok("p...n"));
        assert_eq!(t.display("unknown-token").as_deref(), Ok("u...n"));
    }

    #[test]
    fn display_handles_short_and_multibyte_tokens() {
        let t = translator();
        assert_eq!(t.display("x").as_deref(), Ok("x...x"));
        assert_eq!(t.display("ab").as_deref(), Ok("a...b"));
        assert_eq!(t.display("été-jeton-ü").as_deref(), Ok("é...ü"));
    }

    #[test]
    fn display_rejects_empty_token() {
        assert_eq!(translator().display(""), Err(IdentityError::EmptyToken));
    }

    #[test]
    fn resolve_treats_sentinel_as_unmapped() {
        let t = translator();
        assert_eq!(t.resolve("pending-token"), Resolution::Unmapped);
        assert_eq!(t.resolve("nope"), Resolution::Unmapped);
        assert_eq!(t.resolve("ontario-token"), Resolution::Mapped("ON".into()));
    }
}
