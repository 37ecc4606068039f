#![forbid(unsafe_code)]

//! Structured log output of the interception engine.
//!
//! 1. A hierarchy install runs inside an `intercept_hierarchy` span
//! 2. Each installed interceptor logs its class and method
//! 3. The summary event carries patched / inherited / skipped counts
//! 4. Layering logs the new layer count
//!
//! Run:
//!   cargo test -p locshot-core --test tracing_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use locshot_core::{
    ClassDescriptor, ClassRegistry, ClassSearchCriteria, Implementation, InterceptionEngine,
    MethodId,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedEvent {
    message: Option<String>,
    fields: HashMap<String, String>,
    span: Option<String>,
}

#[derive(Default)]
struct Capture {
    spans: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        self.events.lock().unwrap().push(CapturedEvent {
            message: fields.get("message").cloned(),
            fields,
            span: ctx.event_span(event).map(|s| s.name().to_string()),
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> (Vec<String>, Vec<CapturedEvent>) {
    let layer = Capture::default();
    let spans = Arc::clone(&layer.spans);
    let events = Arc::clone(&layer.events);
    tracing::subscriber::with_default(tracing_subscriber::registry().with(layer), f);
    let spans = spans.lock().unwrap().clone();
    let events = events.lock().unwrap().clone();
    (spans, events)
}

fn draw() -> MethodId {
    MethodId::new("draw")
}

fn setup() -> (InterceptionEngine, Arc<ClassDescriptor>) {
    let registry = Arc::new(ClassRegistry::new());
    let view = registry.register(
        ClassDescriptor::builder("View")
            .method(draw(), Implementation::constant("view.draw", "view".into()))
            .build(),
    );
    registry.register(
        ClassDescriptor::builder("Button")
            .superclass(&view)
            .method(draw(), Implementation::constant("button.draw", "button".into()))
            .build(),
    );
    registry.register(ClassDescriptor::builder("Label").superclass(&view).build());
    (InterceptionEngine::new(registry), view)
}

fn events_with<'a>(events: &'a [CapturedEvent], message: &str) -> Vec<&'a CapturedEvent> {
    events
        .iter()
        .filter(|e| e.message.as_deref() == Some(message))
        .collect()
}

#[test]
fn hierarchy_install_is_logged_inside_its_span() {
    let (engine, view) = setup();
    let (spans, events) = capture(|| {
        engine
            .intercept_on_class_and_subclasses(
                &view,
                &ClassSearchCriteria::new(),
                &draw(),
                |_, _, original| original,
            )
            .unwrap();
    });

    assert!(spans.iter().any(|s| s == "intercept_hierarchy"), "{spans:?}");

    let installed = events_with(&events, "interceptor installed");
    let classes: Vec<_> = installed
        .iter()
        .map(|e| e.fields["class"].as_str())
        .collect();
    assert_eq!(classes, ["View", "Button"]);
    assert!(installed.iter().all(|e| e.fields["method"] == "draw"));
    assert!(
        installed
            .iter()
            .all(|e| e.span.as_deref() == Some("intercept_hierarchy"))
    );

    let summary = events_with(&events, "hierarchy intercepted");
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].fields["patched"], "2");
    assert_eq!(summary[0].fields["inherited"], "1");
    assert_eq!(summary[0].fields["skipped"], "0");
}

#[test]
fn layering_logs_layer_count() {
    let (engine, view) = setup();
    engine.intercept(&view, &draw(), |_, _, o| o).unwrap();
    let (_, events) = capture(|| {
        engine.intercept_layered(&view, &draw(), |_, _, o| o).unwrap();
    });

    let layered = events_with(&events, "interceptor layered");
    assert_eq!(layered.len(), 1);
    assert_eq!(layered[0].fields["layers"], "2");
}
