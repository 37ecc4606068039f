#![forbid(unsafe_code)]

//! Property-based invariant tests for class search and hierarchy interception.
//!
//! 1. A superclass criterion returns exactly the strict descendants
//! 2. Search results never contain a class twice
//! 3. Every descendant is either patched or inherits after a hierarchy install
//! 4. A pass-through interceptor leaves every dispatch result unchanged
//!
//! Run:
//!   cargo test -p locshot-core --test proptest_search_invariants

use std::sync::Arc;

use locshot_core::{
    ClassDescriptor, ClassRegistry, ClassSearchCriteria, ClassUniverse, Implementation,
    InterceptionEngine, MethodId, Object, Value, search_classes,
};
use proptest::prelude::*;

fn render() -> MethodId {
    MethodId::new("render")
}

/// One class per entry. Class `i + 1` descends from class `parent % (i + 1)`
/// and declares `render` when `overrides` is set. Class 0 always declares it.
fn build(shape: &[(usize, bool)]) -> (Arc<ClassRegistry>, Vec<Arc<ClassDescriptor>>) {
    let registry = Arc::new(ClassRegistry::new());
    let root = registry.register(
        ClassDescriptor::builder("C0")
            .method(render(), Implementation::constant("c0", Value::from("C0")))
            .build(),
    );
    let mut classes = vec![root];
    for (i, &(parent, overrides)) in shape.iter().enumerate() {
        let name = format!("C{}", i + 1);
        let mut builder =
            ClassDescriptor::builder(name.as_str()).superclass(&classes[parent % (i + 1)]);
        if overrides {
            let imp = Implementation::constant(name.as_str(), Value::from(name.as_str()));
            builder = builder.method(render(), imp);
        }
        classes.push(registry.register(builder.build()));
    }
    (registry, classes)
}

fn shape_strategy() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0usize..32, any::<bool>()), 0..20)
}

fn strict_descendants(classes: &[Arc<ClassDescriptor>], base: &ClassDescriptor) -> Vec<String> {
    let mut out: Vec<String> = classes
        .iter()
        .filter(|c| c.id() != base.id() && c.ancestors().any(|a| a.id() == base.id()))
        .map(|c| c.name().to_string())
        .collect();
    out.sort();
    out
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Search
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn superclass_criterion_is_strict_descent(shape in shape_strategy(), pick in 0usize..32) {
        let (registry, classes) = build(&shape);
        let base = &classes[pick % classes.len()];

        let criteria = ClassSearchCriteria::new().descends_from(base);
        let mut found: Vec<String> = search_classes(registry.as_ref(), &criteria)
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        found.sort();

        prop_assert_eq!(found, strict_descendants(&classes, base));
    }

    #[test]
    fn search_results_are_unique(shape in shape_strategy()) {
        let (registry, _) = build(&shape);
        let found = search_classes(registry.as_ref(), &ClassSearchCriteria::new());
        let mut ids: Vec<_> = found.iter().map(|c| c.id()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), found.len());
        prop_assert_eq!(found.len(), registry.all_classes().len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Hierarchy interception
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn hierarchy_install_accounts_for_every_descendant(shape in shape_strategy()) {
        let (registry, classes) = build(&shape);
        let engine = InterceptionEngine::new(registry);

        let report = engine
            .intercept_on_class_and_subclasses(
                &classes[0],
                &ClassSearchCriteria::new(),
                &render(),
                |_: &ClassDescriptor, _: &MethodId, original: Implementation| original,
            )
            .unwrap();

        prop_assert!(report.already_intercepted.is_empty());
        prop_assert_eq!(report.patched.len() + report.inherited.len(), classes.len());
        let overriding = 1 + shape.iter().filter(|(_, o)| *o).count();
        prop_assert_eq!(report.patched.len(), overriding);
        prop_assert_eq!(engine.interception_count(), overriding);
    }

    #[test]
    fn pass_through_interceptor_preserves_dispatch(shape in shape_strategy()) {
        let (registry, classes) = build(&shape);
        let engine = InterceptionEngine::new(registry);
        let objects: Vec<Object> = classes.iter().map(Object::new).collect();
        let before: Vec<Value> = objects
            .iter()
            .map(|o| engine.send(o, &render(), &[]).unwrap())
            .collect();

        engine
            .intercept_on_class_and_subclasses(
                &classes[0],
                &ClassSearchCriteria::new(),
                &render(),
                |class: &ClassDescriptor, _: &MethodId, original: Implementation| {
                    Implementation::new(format!("pass<{}>", class.name()), move |call| {
                        original.call(call)
                    })
                },
            )
            .unwrap();

        let after: Vec<Value> = objects
            .iter()
            .map(|o| engine.send(o, &render(), &[]).unwrap())
            .collect();
        prop_assert_eq!(before, after);
    }
}
