#![forbid(unsafe_code)]

//! Localization records, their store, and UI string normalization.
//!
//! # Role in locshot
//! `locshot-i18n` holds what the localization subsystem reported while the
//! app ran: every resolved `(key, development string, table, result)` goes
//! into a [`RecordStore`] until an annotation pass finds the element that
//! displays it.
//!
//! # How it fits in the system
//! The producer shim in `locshot-harness` publishes records from inside an
//! intercepted lookup. The annotation engine drains them and uses the
//! helpers in [`strings`] to compare records against what elements show.
//! This crate depends on neither the interception engine nor the
//! accessibility tree.

pub mod record;
pub mod store;
pub mod strings;

pub use record::LocalizationRecord;
pub use store::{PendingRecord, RecordStore, StoreConfig};
pub use strings::{
    remove_markdown_formatting, string_has_only_locale_shared_content,
    ui_string_by_removing_localized_string,
};
