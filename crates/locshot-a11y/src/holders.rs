//! Strings displayed by objects that are not in the accessibility tree.
//!
//! Tooltips are the common case: the string belongs to an owner object the
//! automation surface never exposes, but it is shown next to (and should be
//! annotated on) some element that is exposed. Each holder records its
//! strings and, when known, the element that represents it on screen.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::Serialize;

use crate::attribute::Attribute;
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HolderId(u32);

#[derive(Debug, Clone)]
struct Holder {
    name: String,
    strings: BTreeMap<Attribute, String>,
    element: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct AuxiliaryHolders {
    holders: Vec<Holder>,
    by_element: AHashMap<NodeId, Vec<HolderId>>,
}

impl AuxiliaryHolders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a holder. `name` is only used in logs.
    pub fn add_holder(&mut self, name: impl Into<String>) -> HolderId {
        let id = HolderId(self.holders.len() as u32);
        self.holders.push(Holder {
            name: name.into(),
            strings: BTreeMap::new(),
            element: None,
        });
        id
    }

    /// Shorthand for a tooltip holder represented by `element`.
    pub fn add_tooltip(&mut self, element: NodeId, tooltip: impl Into<String>) -> HolderId {
        let id = self.add_holder("tooltip");
        self.set_string(id, Attribute::ToolTip, tooltip);
        self.attach(id, element);
        id
    }

    pub fn set_string(&mut self, holder: HolderId, attribute: Attribute, value: impl Into<String>) {
        if let Some(h) = self.holders.get_mut(holder.0 as usize) {
            h.strings.insert(attribute, value.into());
        }
    }

    /// Record that `element` represents `holder` on screen.
    pub fn attach(&mut self, holder: HolderId, element: NodeId) {
        let Some(h) = self.holders.get_mut(holder.0 as usize) else {
            return;
        };
        if let Some(previous) = h.element.replace(element)
            && let Some(list) = self.by_element.get_mut(&previous)
        {
            list.retain(|&id| id != holder);
        }
        self.by_element.entry(element).or_default().push(holder);
    }

    pub fn name(&self, holder: HolderId) -> Option<&str> {
        self.holders.get(holder.0 as usize).map(|h| h.name.as_str())
    }

    /// Element that shows `holder`'s strings, if any.
    pub fn representing_accessibility_element(&self, holder: HolderId) -> Option<NodeId> {
        self.holders.get(holder.0 as usize)?.element
    }

    /// First holder attached to `element` that carries a tooltip.
    pub fn representing_tooltip_holder(&self, element: NodeId) -> Option<HolderId> {
        self.holders_for_element(element).iter().copied().find(|&id| {
            self.holders
                .get(id.0 as usize)
                .is_some_and(|h| h.strings.contains_key(&Attribute::ToolTip))
        })
    }

    pub fn holders_for_element(&self, element: NodeId) -> &[HolderId] {
        self.by_element.get(&element).map_or(&[][..], Vec::as_slice)
    }

    /// Every non-empty string held for `element`, holder by holder.
    pub fn ui_strings_for_element(&self, element: NodeId) -> Vec<(Attribute, String)> {
        self.holders_for_element(element)
            .iter()
            .filter_map(|id| self.holders.get(id.0 as usize))
            .flat_map(|h| h.strings.iter())
            .filter(|(_, s)| !s.is_empty())
            .map(|(a, s)| (a.clone(), s.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
