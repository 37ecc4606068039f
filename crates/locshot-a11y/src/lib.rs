#![forbid(unsafe_code)]

//! Accessibility surface: the tree external tooling reads, and the
//! annotation nodes locshot adds to it.
//!
//! # Role in locshot
//! The screenshot harness finds localized strings on screen by reading the
//! accessibility tree. This crate defines what the annotation engine needs
//! from that tree ([`AccessibilityTree`]), an in-memory implementation
//! ([`AxTree`]), the synthetic [`AnnotationElement`] nodes, and the registry
//! of [`AuxiliaryHolders`] for strings that live outside the tree
//! (tooltips and similar).
//!
//! # How it fits in the system
//! `locshot-harness` walks an `AccessibilityTree`, matches strings against
//! records from `locshot-i18n`, and calls
//! [`AccessibilityTree::add_annotations`]. The harness reads results back
//! through [`AxTree::attribute`], the same path any other client uses.

pub mod annotation;
pub mod attribute;
pub mod holders;
pub mod tree;

pub use annotation::AnnotationElement;
pub use attribute::{Attribute, AttributedText, AxValue, Notification, TextRun, pure_string};
pub use holders::{AuxiliaryHolders, HolderId};
pub use tree::{AccessibilityTree, AxTree, NodeId, Role};
