#![forbid(unsafe_code)]

//! Core: class model, class search, and method interception.
//!
//! # Role in locshot
//! `locshot-core` is the instrumentation layer. It models a dynamically
//! dispatched object system (classes with superclass chains, declared
//! protocols, and per-class method tables) and lets test code redirect
//! calls on it without touching the program that defined the classes.
//!
//! # Primary responsibilities
//! - **ClassUniverse**: the injectable set of loaded classes.
//! - **Class search**: structural queries over that universe.
//! - **InterceptionEngine**: an explicit `(class, method)` registry of
//!   installed interceptors, consulted on every dispatch.
//! - **RecursionTracker**: per-receiver call depth for interceptors that
//!   re-enter their own entry point.
//!
//! # How it fits in the system
//! `locshot-harness` uses the engine to wrap the localization lookup so
//! every resolved string is published to the record store in
//! `locshot-i18n`. Nothing here knows about localization or accessibility.

pub mod class;
pub mod error;
pub mod intercept;
pub mod method;
pub mod object;
pub mod recursion;
pub mod search;
pub mod universe;

pub use class::{ClassBuilder, ClassDescriptor, ClassId};
pub use error::InterceptError;
pub use intercept::{
    InterceptionConfig, InterceptionEngine, InterceptionRecord, InterceptionReport, LayeringPolicy,
};
pub use method::{Call, Implementation, MethodId};
pub use object::{Object, ObjectId, Value};
pub use recursion::RecursionTracker;
pub use search::{
    ClassSearchCriteria, class_declares_method, class_hierarchy, class_inherits_method,
    class_overrides_method, list_methods, search_classes,
};
pub use universe::{ClassRegistry, ClassUniverse};
