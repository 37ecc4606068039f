#![forbid(unsafe_code)]

//! Session lifecycle: setup, producer install, verification passes,
//! teardown.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, warn};

use locshot_a11y::{AccessibilityTree, AuxiliaryHolders, NodeId};
use locshot_core::{
    ClassDescriptor, ClassSearchCriteria, ClassUniverse, InterceptionEngine, InterceptionReport,
};
use locshot_i18n::{LocalizationRecord, RecordStore};

use crate::annotate::{AnnotationEngine, AnnotationPass};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::producer::LocalizationProducer;
use crate::report::{JsonlReporter, ReportEvent};

pub type BoxedReporter = JsonlReporter<Box<dyn Write + Send>>;

/// What a session leaves behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub passes: u64,
    /// Records placed on screen, in match order.
    pub matched: Vec<LocalizationRecord>,
    /// Records still queued when the session ended, oldest first.
    pub unmatched: Vec<LocalizationRecord>,
    /// Records evicted because the queue was full.
    pub dropped: u64,
    /// Records discarded after surviving too many passes.
    pub expired: u64,
}

/// Owns the record store and the interception engine for one test run.
#[derive(Debug)]
pub struct HarnessSession {
    config: HarnessConfig,
    store: Arc<RecordStore>,
    engine: InterceptionEngine,
    annotator: AnnotationEngine,
    producer: Option<LocalizationProducer>,
    reporter: Option<BoxedReporter>,
}

impl HarnessSession {
    pub fn new(universe: Arc<dyn ClassUniverse>, config: HarnessConfig) -> Self {
        let store = Arc::new(RecordStore::new(config.store));
        let engine = InterceptionEngine::with_config(universe, config.interception);
        let annotator = AnnotationEngine::new(Arc::clone(&store));
        info!(
            capacity = config.store.capacity,
            expire_after_passes = ?config.store.expire_after_passes,
            "harness session created"
        );
        Self {
            config,
            store,
            engine,
            annotator,
            producer: None,
            reporter: None,
        }
    }

    /// Session configured from the environment.
    pub fn from_env(universe: Arc<dyn ClassUniverse>) -> Result<Self> {
        Ok(Self::new(universe, HarnessConfig::from_env()?))
    }

    /// Attach a JSONL reporter and write the `session.start` line.
    pub fn with_reporter(mut self, mut reporter: BoxedReporter) -> Result<Self> {
        reporter.emit(&ReportEvent::SessionStart {
            store_capacity: self.config.store.capacity,
            expire_after_passes: self.config.store.expire_after_passes,
            lookup_method: &self.config.lookup_method,
        })?;
        self.reporter = Some(reporter);
        Ok(self)
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn engine(&self) -> &InterceptionEngine {
        &self.engine
    }

    pub fn producer(&self) -> Option<&LocalizationProducer> {
        self.producer.as_ref()
    }

    /// Wrap the localization lookup on `bundle_class` and its overriding
    /// subclasses so every resolved string is published.
    pub fn install_producer(
        &mut self,
        bundle_class: &Arc<ClassDescriptor>,
        criteria: &ClassSearchCriteria,
    ) -> Result<InterceptionReport> {
        if self.producer.is_some() {
            return Err(HarnessError::ProducerInstalled);
        }
        let producer = LocalizationProducer::new(Arc::clone(&self.store), &self.config);
        let report = producer.install(&self.engine, bundle_class, criteria)?;
        self.producer = Some(producer);
        Ok(report)
    }

    /// Run one annotation pass over the subtree under `root`.
    pub fn verify<T>(
        &mut self,
        tree: &mut T,
        holders: &AuxiliaryHolders,
        root: NodeId,
    ) -> Result<AnnotationPass>
    where
        T: AccessibilityTree + ?Sized,
    {
        let index = self.store.passes();
        let pass = self.annotator.annotate(tree, holders, root);
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.emit_pass(index, &pass, self.store.pending_len())?;
        }
        Ok(pass)
    }

    /// End the session. Unmatched records are drained and returned.
    pub fn teardown(mut self) -> Result<TeardownReport> {
        let _span = info_span!("teardown").entered();
        let report = TeardownReport {
            passes: self.store.passes(),
            matched: self.store.matched(),
            unmatched: self.store.clear(),
            dropped: self.store.dropped_count(),
            expired: self.store.expired_count(),
        };
        if !report.unmatched.is_empty() {
            warn!(unmatched = report.unmatched.len(), "records never found on screen");
        }
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.emit_teardown(&report)?;
        }
        info!(
            passes = report.passes,
            matched = report.matched.len(),
            "harness session finished"
        );
        Ok(report)
    }
}
