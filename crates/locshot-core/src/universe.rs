//! The set of classes currently loaded into the process.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::class::ClassDescriptor;

/// Source of "every loaded class".
///
/// Searches enumerate this once per call and never cache, so an
/// implementation may grow between calls as modules load.
pub trait ClassUniverse: Send + Sync {
    fn all_classes(&self) -> Vec<Arc<ClassDescriptor>>;
}

impl ClassUniverse for Vec<Arc<ClassDescriptor>> {
    fn all_classes(&self) -> Vec<Arc<ClassDescriptor>> {
        self.clone()
    }
}

/// Thread-safe universe that modules register their classes into.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<Vec<Arc<ClassDescriptor>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class. Registering the same descriptor twice is a no-op.
    pub fn register(&self, class: Arc<ClassDescriptor>) -> Arc<ClassDescriptor> {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        if !classes.iter().any(|c| c.id() == class.id()) {
            debug!(class = class.name(), module = class.module(), "class registered");
            classes.push(Arc::clone(&class));
        }
        class
    }

    /// Register every class of a module at once.
    pub fn load_module<I>(&self, classes: I)
    where
        I: IntoIterator<Item = Arc<ClassDescriptor>>,
    {
        for class in classes {
            self.register(class);
        }
    }

    /// First registered class with this exact name.
    pub fn class_named(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClassUniverse for ClassRegistry {
    fn all_classes(&self) -> Vec<Arc<ClassDescriptor>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let registry = ClassRegistry::new();
        let view = ClassDescriptor::builder("View").build();
        registry.register(Arc::clone(&view));
        registry.register(Arc::clone(&view));
        assert_eq!(registry.len(), 1);
        assert!(registry.class_named("View").is_some());
        assert!(registry.class_named("Window").is_none());
    }

    #[test]
    fn later_loads_are_visible() {
        let registry = ClassRegistry::new();
        assert!(registry.is_empty());
        let view = ClassDescriptor::builder("View").build();
        registry.load_module([Arc::clone(&view)]);
        let button = ClassDescriptor::builder("Button").superclass(&view).build();
        registry.load_module([button]);
        assert_eq!(registry.all_classes().len(), 2);
    }
}
