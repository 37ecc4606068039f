#![forbid(unsafe_code)]

//! Producer shim: publishes a record for every resolved localized string.
//!
//! The shim intercepts the localization lookup
//! (`localizedStringForKey:value:table:` by default) on the bundle class and
//! on every subclass that overrides it. The interceptor always calls the
//! implementation it wrapped and returns its result unchanged. Only the
//! outermost lookup on a receiver publishes: an overriding subclass that
//! forwards to its superclass, or a lookup that falls back to itself, yields
//! one record, not one per level.

use std::sync::Arc;

use tracing::{debug, trace};

use locshot_core::{
    Call, ClassDescriptor, ClassSearchCriteria, Implementation, InterceptError, InterceptionEngine,
    InterceptionReport, MethodId, Value,
};
use locshot_i18n::{LocalizationRecord, RecordStore, record::DEFAULT_TABLE};

use crate::config::HarnessConfig;

/// Argument layout of the lookup: key, fallback value, table.
const ARG_KEY: usize = 0;
const ARG_VALUE: usize = 1;
const ARG_TABLE: usize = 2;

#[derive(Debug)]
struct Inner {
    store: Arc<RecordStore>,
    method: MethodId,
    system_tables: Vec<String>,
    system_modules: Vec<String>,
}

/// Publishes lookups into a [`RecordStore`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LocalizationProducer {
    inner: Arc<Inner>,
}

impl LocalizationProducer {
    pub fn new(store: Arc<RecordStore>, config: &HarnessConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                method: MethodId::new(&config.lookup_method),
                system_tables: config.system_tables.clone(),
                system_modules: config.system_modules.clone(),
            }),
        }
    }

    /// Lookup method this producer wraps.
    pub fn method(&self) -> &MethodId {
        &self.inner.method
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.inner.store
    }

    /// Intercept the lookup on `bundle_class` and its overriding subclasses
    /// matching `criteria`.
    pub fn install(
        &self,
        engine: &InterceptionEngine,
        bundle_class: &Arc<ClassDescriptor>,
        criteria: &ClassSearchCriteria,
    ) -> Result<InterceptionReport, InterceptError> {
        let method = self.inner.method.clone();
        engine.intercept_on_class_and_subclasses(
            bundle_class,
            criteria,
            &method,
            |class, _, original| {
                let producer = self.clone();
                let label = format!("locshot.publish[{}]", class.name());
                Implementation::new(label, move |call: &Call<'_>| {
                    producer.wrapped_lookup(call, &original)
                })
            },
        )
    }

    fn wrapped_lookup(&self, call: &Call<'_>, original: &Implementation) -> Value {
        call.engine()
            .count_recursions(call.receiver(), self.inner.method.as_str(), |depth| {
                let result = original.call(call);
                if depth == 0 {
                    self.publish_lookup(call, &result);
                } else {
                    trace!(depth, "nested lookup, not published");
                }
                result
            })
    }

    /// Build and publish the record for one completed lookup. Returns
    /// whether it was queued for matching.
    pub fn publish_lookup(&self, call: &Call<'_>, result: &Value) -> bool {
        let Some(record) = self.record_for(call, result) else {
            return false;
        };
        self.inner.store.publish(record)
    }

    /// Record describing a completed lookup, or `None` when the lookup had
    /// no key or returned no string.
    pub fn record_for(&self, call: &Call<'_>, result: &Value) -> Option<LocalizationRecord> {
        let key = call.arg(ARG_KEY).as_str()?;
        let result = result.as_str()?;
        let development = call
            .arg(ARG_VALUE)
            .as_str()
            .filter(|v| !v.is_empty())
            .unwrap_or(key);
        let table = call
            .arg(ARG_TABLE)
            .as_str()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TABLE);
        let module = call.receiver().class().module();
        let system = self.is_system(table, module);
        if system {
            debug!(key, table, module, "lookup from system table or module");
        }
        Some(LocalizationRecord::new(key, development, table, result).system_origin(system))
    }

    fn is_system(&self, table: &str, module: &str) -> bool {
        self.inner.system_tables.iter().any(|t| t == table)
            || self.inner.system_modules.iter().any(|m| m == module)
    }
}
