//! The token → region lookup contract and its table-backed implementation.

use std::collections::HashMap;

use crate::IdentityError;

/// Region code meaning "token recognised but not yet mapped to a region".
///
/// Callers must treat it exactly like an unknown token.
pub const UNMAPPED_REGION: &str = "302";

/// Looks up the region code a bearer token belongs to.
///
/// Implementations are shared process-wide and read concurrently, so they
/// must be immutable after construction.
pub trait Authenticator: Send + Sync {
    /// Returns the token's region code, or `None` if the token is unknown or
    /// stale. A returned [`UNMAPPED_REGION`] is a recognised token without a
    /// region.
    fn authenticate(&self, token: &str) -> Option<String>;
}

/// Immutable token → region table.
///
/// Built once during startup from configuration. `Debug` prints only the
/// number of entries.
#[derive(Clone, Default)]
pub struct TokenTable {
    regions: HashMap<String, String>,
}

impl TokenTable {
    /// Builds a table from `(token, region)` pairs. Later pairs win.
    pub fn from_pairs<I, T, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, R)>,
        T: Into<String>,
        R: Into<String>,
    {
        Self {
            regions: pairs
                .into_iter()
                .map(|(token, region)| (token.into(), region.into()))
                .collect(),
        }
    }

    /// Parses the `token=region:token=region` format used by the
    /// `KEY_CLAIM_TOKEN` environment variable.
    ///
    /// Empty entries (e.g. a trailing `:`) are skipped. Whitespace around
    /// tokens and regions is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedTokenEntry`] for an entry without
    /// `=` or with an empty side, and [`IdentityError::DuplicateToken`] when
    /// a token appears twice. Errors identify entries by position only.
    pub fn parse(list: &str) -> Result<Self, IdentityError> {
        let mut regions = HashMap::new();

        for (index, entry) in list.split(':').enumerate() {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            let (token, region) = entry
                .split_once('=')
                .map(|(t, r)| (t.trim(), r.trim()))
                .filter(|(t, r)| !t.is_empty() && !r.is_empty())
                .ok_or(IdentityError::MalformedTokenEntry { index })?;

            if regions
                .insert(token.to_string(), region.to_string())
                .is_some()
            {
                return Err(IdentityError::DuplicateToken { index });
            }
        }

        Ok(Self { regions })
    }

    /// Number of tokens in the table.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the table holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl std::fmt::Debug for TokenTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTable")
            .field("tokens", &self.regions.len())
            .finish()
    }
}

impl Authenticator for TokenTable {
    fn authenticate(&self, token: &str) -> Option<String> {
        self.regions.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_colon_separated_pairs() {
        let table = TokenTable::parse("alpha=204:beta=302: gamma = 059 :").expect("should parse");
        assert_eq!(table.len(), 3);
        assert_eq!(table.authenticate("alpha").as_deref(), Some("204"));
        assert_eq!(table.authenticate("beta").as_deref(), Some(UNMAPPED_REGION));
        assert_eq!(table.authenticate("gamma").as_deref(), Some("059"));
        assert_eq!(table.authenticate("delta"), None);
    }

    #[test]
    fn parse_empty_list_gives_empty_table() {
        let table = TokenTable::parse("").expect("should parse");
        assert!(table.is_empty());
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        assert_eq!(
            TokenTable::parse("alpha=204:secret-token").unwrap_err(),
            IdentityError::MalformedTokenEntry { index: 1 }
        );
        assert_eq!(
            TokenTable::parse("=204").unwrap_err(),
            IdentityError::MalformedTokenEntry { index: 0 }
        );
        assert_eq!(
            TokenTable::parse("alpha=").unwrap_err(),
            IdentityError::MalformedTokenEntry { index: 0 }
        );
    }

    #[test]
    fn parse_rejects_duplicate_tokens() {
        assert_eq!(
            TokenTable::parse("alpha=204:alpha=059").unwrap_err(),
            IdentityError::DuplicateToken { index: 1 }
        );
    }

    #[test]
    fn errors_and_debug_never_echo_tokens() {
        let err = TokenTable::parse("super-secret-token").unwrap_err();
        assert!(!err.to_string().contains("super-secret-token"));

        let table = TokenTable::from_pairs([("super-secret-token", "204")]);
        let debug = format!("{table:?}");
        assert!(!debug.contains("super-secret-token"), "{debug}");
        assert!(debug.contains("tokens: 1"), "{debug}");
    }
}
