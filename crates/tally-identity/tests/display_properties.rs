//! Property tests: the display form never leaks the interior of a token.

use std::sync::Arc;

use proptest::prelude::*;
use tally_identity::{OriginatorTranslator, TokenTable, OBFUSCATION_MARKER, UNMAPPED_REGION};

fn translator_with(token: &str, region: &str) -> OriginatorTranslator {
    OriginatorTranslator::new(Arc::new(TokenTable::from_pairs([(token, region)])))
}

fn assert_only_edges(token: &str, shown: &str) -> Result<(), TestCaseError> {
    let first = token.chars().next().expect("non-empty token");
    let last = token.chars().last().expect("non-empty token");
    prop_assert_eq!(shown, format!("{first}{OBFUSCATION_MARKER}{last}"));
    Ok(())
}

proptest! {
    #[test]
    fn unknown_tokens_show_only_first_and_last_char(token in "\\PC{1,64}") {
        let t = OriginatorTranslator::new(Arc::new(TokenTable::default()));
        let shown = t.display(&token).unwrap();
        assert_only_edges(&token, &shown)?;
    }

    #[test]
    fn sentinel_tokens_show_only_first_and_last_char(token in "[A-Za-z0-9]{3,64}") {
        let t = translator_with(&token, UNMAPPED_REGION);
        let shown = t.display(&token).unwrap();
        assert_only_edges(&token, &shown)?;
        prop_assert_eq!(t.storage_id(&token), token);
    }

    #[test]
    fn mapped_tokens_show_region(token in "[A-Za-z0-9]{1,64}", region in "[0-9]{3}") {
        prop_assume!(region != UNMAPPED_REGION);
        let t = translator_with(&token, &region);
        prop_assert_eq!(t.display(&token).unwrap(), region.clone());
        prop_assert_eq!(t.storage_id(&token), region);
    }
}
