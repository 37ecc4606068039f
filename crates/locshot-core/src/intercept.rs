//! Method interception through an explicit `(class, method)` registry.
//!
//! Dispatch ([`InterceptionEngine::send`]) walks the receiver's ancestry and,
//! at each level, prefers an installed interceptor over the class's own
//! declared implementation. Installing an interceptor therefore covers the
//! patched class and every descendant that does not override the method.
//!
//! # Invariants
//!
//! - At most one [`InterceptionRecord`] per `(class, method)`.
//! - A record's `original` is fixed at first install and never changes,
//!   even when further interceptors are layered on top.
//! - Installs are serialized: the read-original, build, and insert steps
//!   happen under one write lock, so two racing installs cannot both wrap
//!   the same pre-patch original.
//! - Records are never removed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use locshot_core::{
//!     ClassDescriptor, ClassRegistry, Implementation, InterceptionEngine, MethodId, Object, Value,
//! };
//!
//! let registry = Arc::new(ClassRegistry::new());
//! let title = MethodId::new("title");
//! let button = registry.register(
//!     ClassDescriptor::builder("Button")
//!         .method(title.clone(), Implementation::constant("title", "OK".into()))
//!         .build(),
//! );
//!
//! let engine = InterceptionEngine::new(registry);
//! engine
//!     .intercept(&button, &title, |_, _, original| {
//!         Implementation::new("shout", move |call| match original.call(call) {
//!             Value::Str(s) => Value::Str(s.to_uppercase() + "!"),
//!             other => other,
//!         })
//!     })
//!     .unwrap();
//!
//! let ok = Object::new(&button);
//! assert_eq!(engine.send(&ok, &title, &[]).unwrap(), Value::from("OK!"));
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::AHashMap;
use tracing::{debug, info, info_span};

use crate::class::{ClassDescriptor, ClassId};
use crate::error::InterceptError;
use crate::method::{Call, Implementation, MethodId};
use crate::object::{Object, Value};
use crate::recursion::RecursionTracker;
use crate::search::{ClassSearchCriteria, class_overrides_method, search_classes};
use crate::universe::ClassUniverse;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What [`InterceptionEngine::intercept`] does on an already patched pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayeringPolicy {
    /// Fail with [`InterceptError::AlreadyIntercepted`].
    #[default]
    Reject,
    /// Stack the new interceptor on top of the installed one.
    Layer,
}

impl LayeringPolicy {
    /// Parse `reject` / `layer` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "layer" => Some(Self::Layer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptionConfig {
    pub layering: LayeringPolicy,
}

// ---------------------------------------------------------------------------
// Records and reports
// ---------------------------------------------------------------------------

/// One installed interception.
#[derive(Debug, Clone)]
pub struct InterceptionRecord {
    class: Arc<ClassDescriptor>,
    method: MethodId,
    original: Implementation,
    installed: Implementation,
    layers: u32,
}

impl InterceptionRecord {
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    /// Implementation that resolved for this class before the first install.
    pub fn original(&self) -> &Implementation {
        &self.original
    }

    /// Outermost interceptor currently installed.
    pub fn installed(&self) -> &Implementation {
        &self.installed
    }

    /// Number of interceptors stacked on this pair (1 unless layered).
    pub fn layers(&self) -> u32 {
        self.layers
    }
}

/// Outcome of [`InterceptionEngine::intercept_on_class_and_subclasses`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptionReport {
    /// Classes that received their own interceptor (base class first).
    pub patched: Vec<String>,
    /// Descendants left alone because they inherit the patched method.
    pub inherited: Vec<String>,
    /// Descendants skipped because they were already intercepted.
    pub already_intercepted: Vec<String>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

type RecordKey = (ClassId, MethodId);

pub struct InterceptionEngine {
    universe: Arc<dyn ClassUniverse>,
    config: InterceptionConfig,
    records: RwLock<AHashMap<RecordKey, InterceptionRecord>>,
    recursion: RecursionTracker,
}

impl InterceptionEngine {
    pub fn new(universe: Arc<dyn ClassUniverse>) -> Self {
        Self::with_config(universe, InterceptionConfig::default())
    }

    pub fn with_config(universe: Arc<dyn ClassUniverse>, config: InterceptionConfig) -> Self {
        Self {
            universe,
            config,
            records: RwLock::new(AHashMap::new()),
            recursion: RecursionTracker::new(),
        }
    }

    pub fn universe(&self) -> &Arc<dyn ClassUniverse> {
        &self.universe
    }

    pub fn config(&self) -> InterceptionConfig {
        self.config
    }

    pub fn recursion(&self) -> &RecursionTracker {
        &self.recursion
    }

    // -- installation ------------------------------------------------------

    /// Replace the implementation of `method` on `class`.
    ///
    /// `factory` gets the class, the method, and the implementation that
    /// resolved for `class` at patch time, and returns the interceptor to
    /// install. It runs under the registry write lock and must not install
    /// interceptions itself. Returns the installed interceptor.
    pub fn intercept<F>(
        &self,
        class: &Arc<ClassDescriptor>,
        method: &MethodId,
        factory: F,
    ) -> Result<Implementation, InterceptError>
    where
        F: FnOnce(&ClassDescriptor, &MethodId, Implementation) -> Implementation,
    {
        self.install(class, method, self.config.layering, factory)
    }

    /// Like [`intercept`](Self::intercept) but always layers: on a patched
    /// pair the factory receives the currently installed interceptor.
    pub fn intercept_layered<F>(
        &self,
        class: &Arc<ClassDescriptor>,
        method: &MethodId,
        factory: F,
    ) -> Result<Implementation, InterceptError>
    where
        F: FnOnce(&ClassDescriptor, &MethodId, Implementation) -> Implementation,
    {
        self.install(class, method, LayeringPolicy::Layer, factory)
    }

    /// Patch `base`, then every descendant matching `criteria` that
    /// overrides `method`, each wrapping its own pre-patch implementation.
    ///
    /// Descendants that inherit the method are left alone; dispatch on them
    /// already reaches the nearest patched ancestor. Descendants that are
    /// already intercepted are skipped and reported. Failure to patch `base`
    /// is returned as an error.
    ///
    /// A superclass set on `criteria` narrows the descendants further: only
    /// classes below both `base` and that class are considered.
    pub fn intercept_on_class_and_subclasses<F>(
        &self,
        base: &Arc<ClassDescriptor>,
        criteria: &ClassSearchCriteria,
        method: &MethodId,
        factory: F,
    ) -> Result<InterceptionReport, InterceptError>
    where
        F: Fn(&ClassDescriptor, &MethodId, Implementation) -> Implementation,
    {
        let _span = info_span!("intercept_hierarchy", base = base.name(), %method).entered();
        let mut report = InterceptionReport::default();

        self.intercept(base, method, &factory)?;
        report.patched.push(base.name().to_string());

        let narrower = criteria.superclass;
        let criteria = criteria.clone().descends_from(base);
        let mut subclasses = search_classes(self.universe.as_ref(), &criteria);
        if let Some(narrower) = narrower {
            subclasses.retain(|class| class.is_subclass_of(narrower));
        }
        subclasses.sort_by(|a, b| a.depth().cmp(&b.depth()).then(a.name().cmp(b.name())));

        for sub in subclasses {
            if self.is_intercepted(&sub, method) {
                debug!(class = sub.name(), "already intercepted, skipping");
                report.already_intercepted.push(sub.name().to_string());
                continue;
            }
            if !class_overrides_method(&sub, method) {
                report.inherited.push(sub.name().to_string());
                continue;
            }
            match self.install(&sub, method, LayeringPolicy::Reject, &factory) {
                Ok(_) => report.patched.push(sub.name().to_string()),
                Err(InterceptError::AlreadyIntercepted { class, .. }) => {
                    report.already_intercepted.push(class);
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            patched = report.patched.len(),
            inherited = report.inherited.len(),
            skipped = report.already_intercepted.len(),
            "hierarchy intercepted"
        );
        Ok(report)
    }

    fn install<F>(
        &self,
        class: &Arc<ClassDescriptor>,
        method: &MethodId,
        policy: LayeringPolicy,
        factory: F,
    ) -> Result<Implementation, InterceptError>
    where
        F: FnOnce(&ClassDescriptor, &MethodId, Implementation) -> Implementation,
    {
        let mut records = self.write_records();
        let key = (class.id(), method.clone());

        if let Some(record) = records.get_mut(&key) {
            if policy == LayeringPolicy::Reject {
                return Err(InterceptError::AlreadyIntercepted {
                    class: class.name().to_string(),
                    method: method.to_string(),
                });
            }
            let installed = factory(class.as_ref(), method, record.installed.clone());
            record.installed = installed.clone();
            record.layers += 1;
            info!(class = class.name(), %method, layers = record.layers, "interceptor layered");
            return Ok(installed);
        }

        let original = resolve_in(&records, class, method).ok_or_else(|| {
            InterceptError::ClassMissingMethod {
                class: class.name().to_string(),
                method: method.to_string(),
            }
        })?;
        let installed = factory(class.as_ref(), method, original.clone());
        records.insert(
            key,
            InterceptionRecord {
                class: Arc::clone(class),
                method: method.clone(),
                original,
                installed: installed.clone(),
                layers: 1,
            },
        );
        info!(class = class.name(), %method, "interceptor installed");
        Ok(installed)
    }

    // -- registry queries --------------------------------------------------

    pub fn is_intercepted(&self, class: &ClassDescriptor, method: &MethodId) -> bool {
        self.read_records()
            .contains_key(&(class.id(), method.clone()))
    }

    pub fn record(&self, class: &ClassDescriptor, method: &MethodId) -> Option<InterceptionRecord> {
        self.read_records()
            .get(&(class.id(), method.clone()))
            .cloned()
    }

    /// All installed records, ordered by class name then method.
    pub fn records(&self) -> Vec<InterceptionRecord> {
        let mut out: Vec<_> = self.read_records().values().cloned().collect();
        out.sort_by(|a, b| {
            a.class
                .name()
                .cmp(b.class.name())
                .then_with(|| a.method.cmp(&b.method))
        });
        out
    }

    pub fn interception_count(&self) -> usize {
        self.read_records().len()
    }

    /// Implementation dispatch would run for `method` on `class` right now.
    pub fn resolve(&self, class: &ClassDescriptor, method: &MethodId) -> Option<Implementation> {
        resolve_in(&self.read_records(), class, method)
    }

    // -- dispatch ----------------------------------------------------------

    pub fn responds_to(&self, receiver: &Object, method: &MethodId) -> bool {
        self.resolve(receiver.class(), method).is_some()
    }

    /// Invoke `method` on `receiver`.
    ///
    /// The registry lock is released before the implementation runs, so
    /// implementations may dispatch further messages.
    pub fn send(
        &self,
        receiver: &Object,
        method: &MethodId,
        args: &[Value],
    ) -> Result<Value, InterceptError> {
        let imp = self
            .resolve(receiver.class(), method)
            .ok_or_else(|| does_not_respond(receiver.class(), method))?;
        Ok(imp.call(&Call::new(self, receiver, method, args)))
    }

    /// Invoke the implementation `class`'s superclass resolves for `method`.
    ///
    /// Used by overriding implementations that forward to inherited
    /// behaviour; patched ancestors are honoured.
    pub fn send_super(
        &self,
        receiver: &Object,
        class: &ClassDescriptor,
        method: &MethodId,
        args: &[Value],
    ) -> Result<Value, InterceptError> {
        let imp = class
            .superclass()
            .and_then(|sup| self.resolve(sup, method))
            .ok_or_else(|| does_not_respond(class, method))?;
        Ok(imp.call(&Call::new(self, receiver, method, args)))
    }

    /// Run `block` with the recursion depth for `(receiver, key)`.
    ///
    /// See [`RecursionTracker::count`].
    pub fn count_recursions<R>(
        &self,
        receiver: &Object,
        key: &str,
        block: impl FnOnce(usize) -> R,
    ) -> R {
        self.recursion.count(receiver.id(), key, block)
    }

    fn read_records(&self) -> RwLockReadGuard<'_, AHashMap<RecordKey, InterceptionRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, AHashMap<RecordKey, InterceptionRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InterceptionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptionEngine")
            .field("config", &self.config)
            .field("interceptions", &self.interception_count())
            .finish()
    }
}

fn resolve_in(
    records: &AHashMap<RecordKey, InterceptionRecord>,
    class: &ClassDescriptor,
    method: &MethodId,
) -> Option<Implementation> {
    class.ancestors().find_map(|c| {
        records
            .get(&(c.id(), method.clone()))
            .map(|r| r.installed.clone())
            .or_else(|| c.declared_method(method).cloned())
    })
}

fn does_not_respond(class: &ClassDescriptor, method: &MethodId) -> InterceptError {
    InterceptError::DoesNotRespond {
        class: class.name().to_string(),
        method: method.to_string(),
    }
}
