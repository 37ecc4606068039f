#![forbid(unsafe_code)]

//! Property-based invariant tests for records and string normalization.
//!
//! 1. Digit/punctuation/whitespace strings are always locale-shared
//! 2. Any string containing a letter is never locale-shared
//! 3. Remainder + localized string reassembles the UI string
//! 4. Removing an absent string is the identity
//! 5. Markdown stripping is the identity on text without markup characters
//! 6. drain_matching preserves publish order and partitions the queue
//! 7. take_best_match never returns an ineligible record

use locshot_i18n::{
    LocalizationRecord, RecordStore, remove_markdown_formatting,
    string_has_only_locale_shared_content, ui_string_by_removing_localized_string,
};
use proptest::prelude::*;

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Locale-shared detection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn symbols_and_digits_are_locale_shared(s in "[0-9 .,:;!?()\\-—–…%⌘]{0,24}") {
        prop_assert!(string_has_only_locale_shared_content(&s));
    }

    #[test]
    fn any_letter_makes_it_translatable(
        prefix in "[0-9 .,]{0,8}",
        letter in "[a-zA-ZäöüßéÀ]",
        suffix in "[0-9 .,]{0,8}",
    ) {
        let s = format!("{prefix}{letter}{suffix}");
        prop_assert!(!string_has_only_locale_shared_content(&s));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Remainder computation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn remainder_reassembles(
        before in "[a-z ()]{0,10}",
        localized in "[A-Z][a-z]{1,8}",
        after in "[a-z ()]{0,10}",
    ) {
        let ui = format!("{before}{localized}{after}");
        let remainder = ui_string_by_removing_localized_string(&ui, &localized);
        prop_assert_eq!(remainder, format!("{before}{after}"));
    }

    #[test]
    fn removing_absent_is_identity(ui in "[a-z ]{0,20}", localized in "[A-Z]{1,5}") {
        prop_assert_eq!(ui_string_by_removing_localized_string(&ui, &localized), ui);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Markdown stripping
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn markup_free_text_is_unchanged(s in "[A-Za-z0-9 .,()!?]{0,40}") {
        prop_assert_eq!(remove_markdown_formatting(&s), s);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6–7. Store ordering
// ═════════════════════════════════════════════════════════════════════════

fn records(results: &[u8]) -> Vec<LocalizationRecord> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| LocalizationRecord::new(format!("k{i}"), "dev", "Main", format!("r{r}")))
        .collect()
}

proptest! {
    #[test]
    fn drain_partitions_in_order(results in proptest::collection::vec(0u8..4, 0..40)) {
        let store = RecordStore::default();
        let all = records(&results);
        for r in &all {
            store.publish(r.clone());
        }
        let drained = store.drain_matching(|r| r.result_string == "r0");
        let kept = store.clear();

        let expected_drained: Vec<_> = all.iter().filter(|r| r.result_string == "r0").cloned().collect();
        let expected_kept: Vec<_> = all.iter().filter(|r| r.result_string != "r0").cloned().collect();
        prop_assert_eq!(drained, expected_drained);
        prop_assert_eq!(kept, expected_kept);
    }

    #[test]
    fn best_match_respects_eligibility(results in proptest::collection::vec(0u8..4, 0..40)) {
        let store = RecordStore::default();
        for r in records(&results) {
            store.publish(r);
        }
        let eligible = results.iter().filter(|r| **r >= 2).count();
        let mut taken = 0;
        while let Some(r) = store.take_best_match(|r| (r.result_string != "r0" && r.result_string != "r1").then_some(r.result_string.clone())) {
            prop_assert!(r.result_string == "r2" || r.result_string == "r3");
            taken += 1;
        }
        prop_assert_eq!(taken, eligible);
        prop_assert_eq!(store.pending_len(), results.len() - eligible);
    }
}
