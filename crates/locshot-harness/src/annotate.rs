#![forbid(unsafe_code)]

//! Annotation passes: place queued localization records on the elements
//! that display them.
//!
//! # Algorithm
//!
//! Depth-first, pre-order from the given root. For every element:
//!
//! 1. Collect candidate strings: the element's user-facing attributes, then
//!    strings of auxiliary holders it represents (tooltips).
//! 2. Normalize each candidate with [`remove_markdown_formatting`] and drop
//!    candidates with no locale-specific content.
//! 3. Skip a candidate when an annotation from the same attribute was made
//!    against exactly this string. Otherwise take at most one record from
//!    the store. A record is eligible when it is not system-origin, its
//!    normalized result string is non-empty, has locale-specific content,
//!    occurs in the candidate, and is not already annotated on this element
//!    (same key and result, or the same normalized result from the same
//!    attribute). Best match: an exact match beats containment, then the
//!    longer result string, then the oldest record.
//! 4. Append one [`AnnotationElement`] per match after the element's
//!    existing children, carrying the remainder of the candidate when the
//!    match covered only part of it.
//! 5. Descend into the element children that existed before step 4.
//!
//! Elements without an automation surface are counted as skipped, and
//! their subtree is still walked.
//!
//! Matched records leave the store and every matched candidate stays
//! covered while it shows the same string, so running a second pass without
//! new publishes adds nothing. A candidate whose text changed is matched
//! afresh.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, trace};

use locshot_a11y::{AccessibilityTree, AnnotationElement, Attribute, AuxiliaryHolders, NodeId};
use locshot_i18n::{
    LocalizationRecord, RecordStore, remove_markdown_formatting,
    string_has_only_locale_shared_content, ui_string_by_removing_localized_string,
};

/// One annotation added during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedAnnotation {
    /// Element the annotation was attached under.
    pub parent: NodeId,
    /// The annotation node itself.
    pub node: NodeId,
    pub element: AnnotationElement,
}

/// Summary of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationPass {
    /// Elements whose strings were examined.
    pub visited: usize,
    /// Elements without an automation surface.
    pub skipped: usize,
    /// Candidate strings that carried locale-specific content.
    pub candidates: usize,
    pub annotations: Vec<PlacedAnnotation>,
    /// Unmatched records discarded by the store at the end of the pass.
    pub expired: usize,
}

impl AnnotationPass {
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }
}

/// Runs annotation passes against one record store.
#[derive(Debug, Clone)]
pub struct AnnotationEngine {
    store: Arc<RecordStore>,
}

impl AnnotationEngine {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Annotate the subtree under `root`.
    ///
    /// Takes the tree exclusively for the whole pass. Advances the store's
    /// pass counter when done.
    pub fn annotate<T>(
        &self,
        tree: &mut T,
        holders: &AuxiliaryHolders,
        root: NodeId,
    ) -> AnnotationPass
    where
        T: AccessibilityTree + ?Sized,
    {
        let _span = info_span!("annotate", root = root.index()).entered();
        let mut pass = AnnotationPass::default();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            // Children are read before any annotation is appended.
            let children = tree.element_children(node);
            match tree.ui_strings(node) {
                Some(mut strings) => {
                    pass.visited += 1;
                    strings.extend(holders.ui_strings_for_element(node));
                    self.annotate_node(tree, node, strings, &mut pass);
                }
                None => {
                    pass.skipped += 1;
                    debug!(node = node.index(), "no automation surface, skipped");
                }
            }
            stack.extend(children.into_iter().rev());
        }

        pass.expired = self.store.end_pass();
        info!(
            visited = pass.visited,
            skipped = pass.skipped,
            candidates = pass.candidates,
            annotations = pass.annotations.len(),
            expired = pass.expired,
            pending = self.store.pending_len(),
            "annotation pass finished"
        );
        pass
    }

    fn annotate_node<T>(
        &self,
        tree: &mut T,
        node: NodeId,
        strings: Vec<(Attribute, String)>,
        pass: &mut AnnotationPass,
    ) where
        T: AccessibilityTree + ?Sized,
    {
        let existing = tree.annotations(node);
        let mut fresh: Vec<AnnotationElement> = Vec::new();
        let mut records: Vec<LocalizationRecord> = Vec::new();

        for (attribute, raw) in strings {
            let candidate = remove_markdown_formatting(&raw);
            if string_has_only_locale_shared_content(&candidate) {
                continue;
            }
            pass.candidates += 1;

            let (previous, placed, source) = (&existing, &fresh, &attribute);
            let from_attribute = move || {
                previous
                    .iter()
                    .chain(placed)
                    .filter(move |a| a.source_attribute.as_ref() == Some(source))
            };
            if from_attribute().any(|a| matched_ui_string(a) == candidate.trim()) {
                trace!(node = node.index(), %attribute, "already annotated");
                continue;
            }

            let annotated = |record: &LocalizationRecord| {
                let result = remove_markdown_formatting(&record.result_string);
                existing
                    .iter()
                    .chain(&fresh)
                    .any(|a| a.same_match(&record.key, &record.result_string))
                    || from_attribute()
                        .any(|a| remove_markdown_formatting(&a.translated_string) == result)
            };
            let Some(record) = self.store.take_best_match(|record| {
                if record.is_system_origin || annotated(record) {
                    return None;
                }
                match_score(&candidate, &record.result_string)
            }) else {
                continue;
            };

            let matched = remove_markdown_formatting(&record.result_string);
            let remainder = ui_string_by_removing_localized_string(&candidate, &matched);
            let element = AnnotationElement::new(&record.key, &record.result_string)
                .development_string(&record.development_string)
                .table(&record.table)
                .source(attribute)
                .merged(candidate.as_str(), remainder);
            debug!(node = node.index(), annotation = %element.description(), "matched");
            fresh.push(element);
            records.push(record);
        }

        if fresh.is_empty() {
            return;
        }
        let ids = tree.add_annotations(node, fresh.clone());
        for ((id, element), record) in ids.into_iter().zip(fresh).zip(records) {
            pass.annotations.push(PlacedAnnotation {
                parent: node,
                node: id,
                element,
            });
            self.store.note_matched(record);
        }
    }
}

/// The normalized candidate an annotation was matched against.
fn matched_ui_string(annotation: &AnnotationElement) -> String {
    match &annotation.merged_ui_string {
        Some(merged) => merged.trim().to_string(),
        None => remove_markdown_formatting(&annotation.translated_string)
            .trim()
            .to_string(),
    }
}

/// Rank of `result` as the string shown by `candidate`, or `None` when it
/// cannot be. Higher is better.
pub fn match_score(candidate: &str, result: &str) -> Option<(bool, usize)> {
    let result = remove_markdown_formatting(result);
    if result.is_empty()
        || string_has_only_locale_shared_content(&result)
        || !candidate.contains(result.as_str())
    {
        return None;
    }
    Some((result == candidate, result.chars().count()))
}

#[cfg(test)]
mod tests {
    use locshot_a11y::{AxTree, Role};
    use locshot_i18n::StoreConfig;

    use super::*;

    fn engine() -> AnnotationEngine {
        AnnotationEngine::new(Arc::new(RecordStore::new(StoreConfig::default())))
    }

    #[test]
    fn exact_beats_longer_containment() {
        assert!(match_score("OK", "OK") > match_score("OK", "O"));
        assert!(match_score("Cancel (⌘.)", "Cancel (⌘.)") > match_score("Cancel (⌘.)", "Cancel"));
        assert_eq!(match_score("Cancel", "Cancel (⌘.)"), None);
        assert_eq!(match_score("— 123", "123"), None);
        assert_eq!(match_score("x", ""), None);
    }

    #[test]
    fn markup_in_result_is_ignored_for_matching() {
        assert_eq!(match_score("Save now", "**Save** now"), Some((true, 8)));
    }

    #[test]
    fn empty_store_adds_nothing() {
        let mut tree = AxTree::new();
        let root = tree.add_labeled(None, Role::Window, "Hallo");
        let pass = engine().annotate(&mut tree, &AuxiliaryHolders::new(), root);
        assert_eq!(pass.visited, 1);
        assert_eq!(pass.candidates, 1);
        assert!(pass.annotations.is_empty());
        assert!(tree.all_annotations().is_empty());
    }

    #[test]
    fn opaque_nodes_are_counted_and_walked() {
        let engine = engine();
        engine
            .store()
            .publish(LocalizationRecord::new("ok", "OK", "Main", "Okay"));
        let mut tree = AxTree::new();
        let root = tree.add_opaque_node(None, Role::Group);
        let button = tree.add_labeled(Some(root), Role::Button, "Okay");
        let pass = engine.annotate(&mut tree, &AuxiliaryHolders::new(), root);
        assert_eq!(pass.skipped, 1);
        assert_eq!(pass.annotations.len(), 1);
        assert_eq!(pass.annotations[0].parent, button);
    }

    #[test]
    fn system_flagged_records_never_match() {
        let engine = engine();
        engine
            .store()
            .publish(LocalizationRecord::new("menu", "File", "AppKit", "Ablage").system_origin(true));
        let mut tree = AxTree::new();
        let root = tree.add_labeled(None, Role::MenuItem, "Ablage");
        let pass = engine.annotate(&mut tree, &AuxiliaryHolders::new(), root);
        assert!(pass.annotations.is_empty());
        assert_eq!(engine.store().system_len(), 1);
    }

    #[test]
    fn each_pass_is_counted() {
        let engine = engine();
        let mut tree = AxTree::new();
        let root = tree.add_node(None, Role::Window);
        engine.annotate(&mut tree, &AuxiliaryHolders::new(), root);
        engine.annotate(&mut tree, &AuxiliaryHolders::new(), root);
        assert_eq!(engine.store().passes(), 2);
    }

    #[test]
    fn pass_serializes_to_json() {
        let engine = engine();
        engine
            .store()
            .publish(LocalizationRecord::new("greeting", "Hello", "Main", "Hallo"));
        let mut tree = AxTree::new();
        let root = tree.add_labeled(None, Role::StaticText, "Hallo");
        let pass = engine.annotate(&mut tree, &AuxiliaryHolders::new(), root);
        let json = serde_json::to_value(&pass).unwrap();
        assert_eq!(json["annotations"][0]["element"]["localization_key"], "greeting");
        assert_eq!(json["visited"], 1);
    }
}
