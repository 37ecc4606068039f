//! Structural queries over the loaded class universe.
//!
//! A [`ClassSearchCriteria`] is a conjunction; every field left as `None`
//! matches anything. [`search_classes`] enumerates the universe exactly once
//! per call and never caches, since modules can load between calls.

use std::sync::Arc;

use ahash::AHashSet;

use crate::class::{ClassDescriptor, ClassId};
use crate::method::MethodId;
use crate::universe::ClassUniverse;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSearchCriteria {
    /// Owning module must equal this.
    pub module: Option<String>,
    /// Class name must start with this.
    pub name_prefix: Option<String>,
    /// Class or one of its ancestors must declare this protocol.
    pub protocol: Option<String>,
    /// Class must descend (strictly) from this class.
    pub superclass: Option<ClassId>,
}

impl ClassSearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn descends_from(mut self, class: &ClassDescriptor) -> Self {
        self.superclass = Some(class.id());
        self
    }

    /// True when `class` satisfies every set criterion.
    pub fn matches(&self, class: &ClassDescriptor) -> bool {
        if let Some(module) = &self.module
            && class.module() != module
        {
            return false;
        }
        if let Some(prefix) = &self.name_prefix
            && !class.name().starts_with(prefix.as_str())
        {
            return false;
        }
        if let Some(protocol) = &self.protocol
            && !class.conforms_to(protocol)
        {
            return false;
        }
        if let Some(ancestor) = self.superclass
            && !class.is_subclass_of(ancestor)
        {
            return false;
        }
        true
    }
}

/// Every loaded class matching `criteria`, each at most once.
pub fn search_classes(
    universe: &dyn ClassUniverse,
    criteria: &ClassSearchCriteria,
) -> Vec<Arc<ClassDescriptor>> {
    let mut seen = AHashSet::new();
    let found: Vec<_> = universe
        .all_classes()
        .into_iter()
        .filter(|class| criteria.matches(class))
        .filter(|class| seen.insert(class.id()))
        .collect();
    tracing::trace!(?criteria, matches = found.len(), "class search");
    found
}

/// True when `method` resolves on `class` or anywhere in its ancestry.
pub fn class_declares_method(class: &ClassDescriptor, method: &MethodId) -> bool {
    class
        .ancestors()
        .any(|c| c.declared_method(method).is_some())
}

/// True when `class` itself declares `method`, shadowing any ancestor.
pub fn class_overrides_method(class: &ClassDescriptor, method: &MethodId) -> bool {
    class.declared_method(method).is_some()
}

/// True when `method` resolves only through an ancestor.
pub fn class_inherits_method(class: &ClassDescriptor, method: &MethodId) -> bool {
    !class_overrides_method(class, method)
        && class
            .ancestors()
            .skip(1)
            .any(|c| c.declared_method(method).is_some())
}

/// Ancestry rendered as `Button -> View -> Object`.
pub fn class_hierarchy(class: &ClassDescriptor) -> String {
    class
        .ancestors()
        .map(ClassDescriptor::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Every method reachable from `class`, paired with the class that declares
/// it. Overridden ancestor methods are omitted.
pub fn list_methods(class: &ClassDescriptor) -> Vec<(String, MethodId)> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for c in class.ancestors() {
        for method in c.declared_methods() {
            if seen.insert(method.clone()) {
                out.push((c.name().to_string(), method.clone()));
            }
        }
    }
    out
}
