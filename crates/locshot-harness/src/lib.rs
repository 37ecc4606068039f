#![forbid(unsafe_code)]

//! Localization screenshot harness.
//!
//! # Role in locshot
//! This crate ties the pieces together for a test run. A
//! [`HarnessSession`] owns a [`RecordStore`](locshot_i18n::RecordStore) and
//! an [`InterceptionEngine`](locshot_core::InterceptionEngine); installing
//! the [`LocalizationProducer`] wraps the app's localization lookup so every
//! resolved string is queued, and each [`HarnessSession::verify`] runs an
//! [`AnnotationEngine`] pass that attaches annotation nodes under the
//! elements displaying those strings. A screenshot tool then finds
//! annotations through the ordinary accessibility API.
//!
//! # Ambient concerns
//! - [`config`]: [`HarnessConfig`] with `LOCSHOT_*` environment overrides.
//! - [`logging`]: `tracing-subscriber` setup filtered by `LOCSHOT_LOG`.
//! - [`report`]: JSONL event log of a session.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use locshot_a11y::{AuxiliaryHolders, AxTree, Role};
//! use locshot_core::ClassRegistry;
//! use locshot_harness::{HarnessConfig, HarnessSession};
//! use locshot_i18n::LocalizationRecord;
//!
//! let mut session = HarnessSession::new(Arc::new(ClassRegistry::new()), HarnessConfig::default());
//! session
//!     .store()
//!     .publish(LocalizationRecord::new("greeting", "Hello", "Main", "Hallo"));
//!
//! let mut tree = AxTree::new();
//! let root = tree.add_node(None, Role::Window);
//! tree.add_labeled(Some(root), Role::StaticText, "Hallo");
//!
//! let pass = session.verify(&mut tree, &AuxiliaryHolders::new(), root).unwrap();
//! assert_eq!(pass.annotations.len(), 1);
//! assert!(session.teardown().unwrap().unmatched.is_empty());
//! ```

pub mod annotate;
pub mod config;
pub mod error;
pub mod logging;
pub mod producer;
pub mod report;
pub mod session;

pub use annotate::{AnnotationEngine, AnnotationPass, PlacedAnnotation, match_score};
pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use producer::LocalizationProducer;
pub use report::{JsonlReporter, ReportEvent};
pub use session::{BoxedReporter, HarnessSession, TeardownReport};
