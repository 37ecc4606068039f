//! Class descriptors: name, owning module, ancestry, protocols, methods.
//!
//! A descriptor is immutable once built. Interception never edits a class's
//! own method table; installed interceptors live in the
//! [`InterceptionEngine`](crate::InterceptionEngine) registry instead.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::method::{Implementation, MethodId};

static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque handle to a loaded class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

/// Module assigned to classes built without an explicit one.
pub const DEFAULT_MODULE: &str = "main";

pub struct ClassDescriptor {
    id: ClassId,
    name: String,
    module: String,
    superclass: Option<Arc<ClassDescriptor>>,
    protocols: Vec<String>,
    methods: BTreeMap<MethodId, Implementation>,
}

impl ClassDescriptor {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            module: DEFAULT_MODULE.to_string(),
            superclass: None,
            protocols: Vec::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn superclass(&self) -> Option<&Arc<ClassDescriptor>> {
        self.superclass.as_ref()
    }

    /// Protocols declared by this class itself (not its ancestors).
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// This class followed by each superclass up to the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Implementation declared directly on this class.
    pub fn declared_method(&self, method: &MethodId) -> Option<&Implementation> {
        self.methods.get(method)
    }

    pub fn declared_methods(&self) -> impl Iterator<Item = &MethodId> {
        self.methods.keys()
    }

    /// True when this class or any ancestor declares `protocol`.
    pub fn conforms_to(&self, protocol: &str) -> bool {
        self.ancestors()
            .any(|c| c.protocols.iter().any(|p| p == protocol))
    }

    /// True when `ancestor` appears strictly above this class.
    pub fn is_subclass_of(&self, ancestor: ClassId) -> bool {
        self.ancestors().skip(1).any(|c| c.id == ancestor)
    }

    /// Number of superclasses above this class.
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("protocols", &self.protocols)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Iterator returned by [`ClassDescriptor::ancestors`].
pub struct Ancestors<'a> {
    next: Option<&'a ClassDescriptor>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ClassDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.superclass.as_deref();
        Some(current)
    }
}

#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    module: String,
    superclass: Option<Arc<ClassDescriptor>>,
    protocols: Vec<String>,
    methods: BTreeMap<MethodId, Implementation>,
}

impl ClassBuilder {
    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    #[must_use]
    pub fn superclass(mut self, superclass: &Arc<ClassDescriptor>) -> Self {
        self.superclass = Some(Arc::clone(superclass));
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<MethodId>, imp: Implementation) -> Self {
        self.methods.insert(method.into(), imp);
        self
    }

    pub fn build(self) -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor {
            id: ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed)),
            name: self.name,
            module: self.module,
            superclass: self.superclass,
            protocols: self.protocols,
            methods: self.methods,
        })
    }
}
