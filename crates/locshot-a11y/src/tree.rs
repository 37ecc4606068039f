//! The accessibility tree surface and an in-memory implementation.
//!
//! [`AccessibilityTree`] is the slice of a UI-automation API the annotation
//! engine relies on: enumerate element children, read user-facing strings,
//! and append annotation children. [`AxTree`] implements it for hosts that
//! build their tree in process, and for tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::AnnotationElement;
use crate::attribute::{Attribute, AxValue, Notification, pure_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Window,
    Group,
    Toolbar,
    Button,
    CheckBox,
    MenuItem,
    StaticText,
    TextField,
    Image,
    Annotation,
    Unknown,
}

/// What the annotation engine needs from an automation tree.
pub trait AccessibilityTree {
    /// Children that are real elements, in order. Annotation children are
    /// excluded.
    fn element_children(&self, node: NodeId) -> Vec<NodeId>;

    /// User-facing strings of `node`, or `None` when it has no automation
    /// surface.
    fn ui_strings(&self, node: NodeId) -> Option<Vec<(Attribute, String)>>;

    /// Annotations already attached under `node`.
    fn annotations(&self, node: NodeId) -> Vec<AnnotationElement>;

    /// Append annotation children after the existing children of `parent`.
    fn add_annotations(
        &mut self,
        parent: NodeId,
        annotations: Vec<AnnotationElement>,
    ) -> Vec<NodeId>;
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        role: Role,
        /// `None` when the element implements no automation surface.
        surface: Option<BTreeMap<Attribute, AxValue>>,
    },
    Annotation(AnnotationElement),
}

#[derive(Debug, Clone)]
struct AxNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// In-memory accessibility tree.
///
/// Removed nodes leave a tombstone so `NodeId`s stay stable.
#[derive(Debug, Clone, Default)]
pub struct AxTree {
    nodes: Vec<Option<AxNode>>,
}

impl AxTree {
    pub fn new() -> Self {
        Self::default()
    }

    // -- building ----------------------------------------------------------

    /// Add an element with an (initially empty) automation surface.
    pub fn add_node(&mut self, parent: Option<NodeId>, role: Role) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                role,
                surface: Some(BTreeMap::new()),
            },
        )
    }

    /// Add an element that implements no automation surface.
    pub fn add_opaque_node(&mut self, parent: Option<NodeId>, role: Role) -> NodeId {
        self.push(parent, NodeKind::Element { role, surface: None })
    }

    /// Convenience: an element with a single label.
    pub fn add_labeled(&mut self, parent: Option<NodeId>, role: Role, label: &str) -> NodeId {
        let id = self.add_node(parent, role);
        self.set_attribute(id, Attribute::Label, label);
        id
    }

    /// Set an attribute. Returns `false` for annotations, opaque elements,
    /// and unknown ids.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        attribute: Attribute,
        value: impl Into<AxValue>,
    ) -> bool {
        match self.node_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element {
                surface: Some(surface),
                ..
            }) => {
                surface.insert(attribute, value.into());
                true
            }
            _ => false,
        }
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(AxNode {
            parent,
            children: Vec::new(),
            kind,
        }));
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
        {
            p.children.push(id);
        }
        id
    }

    // -- reading -----------------------------------------------------------

    /// First live node without a parent.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| matches!(n, Some(node) if node.parent.is_none()))
            .map(|(i, _)| NodeId(i as u32))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Number of live nodes, annotations included.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    /// All children in order, annotations included.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn role(&self, node: NodeId) -> Option<Role> {
        match &self.node(node)?.kind {
            NodeKind::Element { role, .. } => Some(*role),
            NodeKind::Annotation(_) => Some(Role::Annotation),
        }
    }

    pub fn is_annotation(&self, node: NodeId) -> bool {
        self.annotation(node).is_some()
    }

    pub fn annotation(&self, node: NodeId) -> Option<&AnnotationElement> {
        match &self.node(node)?.kind {
            NodeKind::Annotation(a) => Some(a),
            NodeKind::Element { .. } => None,
        }
    }

    /// Read an attribute the way an automation client would. Annotation
    /// nodes answer for their custom attributes.
    pub fn attribute(&self, node: NodeId, attribute: &Attribute) -> Option<AxValue> {
        match &self.node(node)?.kind {
            NodeKind::Element { surface, .. } => surface.as_ref()?.get(attribute).cloned(),
            NodeKind::Annotation(a) => a
                .attributes()
                .into_iter()
                .find(|(name, _)| name == attribute)
                .map(|(_, value)| AxValue::Text(value)),
        }
    }

    /// Every annotation in the tree with the node it is attached to, in
    /// depth-first order.
    pub fn all_annotations(&self) -> Vec<(NodeId, &AnnotationElement)> {
        let mut out = Vec::new();
        let Some(root) = self.root() else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for &child in self.children(id) {
                if let Some(a) = self.annotation(child) {
                    out.push((id, a));
                }
            }
            stack.extend(self.element_children(id).into_iter().rev());
        }
        out
    }

    /// Short description of an annotation node for logs.
    pub fn annotation_description(&self, node: NodeId) -> Option<String> {
        self.annotation(node).map(AnnotationElement::description)
    }

    // -- mutation ----------------------------------------------------------

    /// Remove every annotation node. Returns how many were removed.
    pub fn clear_annotations(&mut self) -> usize {
        let doomed: Vec<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|&id| self.is_annotation(id))
            .collect();
        for &id in &doomed {
            self.remove_leaf(id);
        }
        doomed.len()
    }

    /// Tell the tree an element's content changed.
    ///
    /// Annotations under `node` that were derived from the changed
    /// attribute no longer describe what is shown and are removed. Returns
    /// how many were removed.
    pub fn post_notification(&mut self, node: NodeId, notification: Notification) -> usize {
        let Some(changed) = notification.attribute() else {
            return 0;
        };
        let stale: Vec<NodeId> = self
            .children(node)
            .iter()
            .copied()
            .filter(|&child| {
                self.annotation(child)
                    .is_some_and(|a| a.source_attribute.as_ref() == Some(&changed))
            })
            .collect();
        for &id in &stale {
            self.remove_leaf(id);
        }
        if !stale.is_empty() {
            debug!(node = node.0, ?notification, removed = stale.len(), "stale annotations removed");
        }
        stale.len()
    }

    fn remove_leaf(&mut self, id: NodeId) {
        let parent = self.parent(id);
        if let Some(parent) = parent
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|&c| c != id);
        }
        if let Some(slot) = self.nodes.get_mut(id.index()) {
            *slot = None;
        }
    }

    fn node(&self, id: NodeId) -> Option<&AxNode> {
        self.nodes.get(id.index())?.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut AxNode> {
        self.nodes.get_mut(id.index())?.as_mut()
    }
}

impl AccessibilityTree for AxTree {
    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| !self.is_annotation(c))
            .collect()
    }

    fn ui_strings(&self, node: NodeId) -> Option<Vec<(Attribute, String)>> {
        let NodeKind::Element {
            surface: Some(surface),
            ..
        } = &self.node(node)?.kind
        else {
            return None;
        };
        Some(
            Attribute::user_facing()
                .into_iter()
                .filter_map(|attr| {
                    let text = pure_string(surface.get(&attr)?)?;
                    Some((attr, text))
                })
                .filter(|(_, text)| !text.is_empty())
                .collect(),
        )
    }

    fn annotations(&self, node: NodeId) -> Vec<AnnotationElement> {
        self.children(node)
            .iter()
            .filter_map(|&c| self.annotation(c).cloned())
            .collect()
    }

    fn add_annotations(
        &mut self,
        parent: NodeId,
        annotations: Vec<AnnotationElement>,
    ) -> Vec<NodeId> {
        if !self.contains(parent) {
            return Vec::new();
        }
        annotations
            .into_iter()
            .map(|a| self.push(Some(parent), NodeKind::Annotation(a)))
            .collect()
    }
}
