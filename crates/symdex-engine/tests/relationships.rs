//! Relationship resolution: inheritance vs composition, decoration,
//! structural protocol satisfaction, and import-aware cross-file linking.

use std::sync::Arc;

use symdex_core::graph::{ProjectIndex, RelationKind, RelationTarget, SymbolKind};
use symdex_core::output::IndexSnapshot;
use symdex_core::resolve::{NullResolver, WorkspaceResolver};
use symdex_core::tree::ParseTree;
use symdex_engine::test_utils::*;
use symdex_engine::Indexer;

fn index_one(tree: ParseTree) -> ProjectIndex {
    Indexer::new(Arc::new(NullResolver))
        .index(&[tree])
        .expect("indexing failed")
}

fn index_workspace(trees: Vec<ParseTree>) -> ProjectIndex {
    let resolver = WorkspaceResolver::new(trees.iter().map(|t| t.path.clone()));
    Indexer::new(Arc::new(resolver))
        .index(&trees)
        .expect("indexing failed")
}

#[test]
fn first_base_extends_rest_compose() {
    let index = index_one(tree(
        "m.py",
        vec![
            class_def("A", &[], vec![]),
            class_def("B", &[], vec![]),
            class_def("C", &[], vec![]),
            class_def("D", &["A", "B", "C"], vec![]),
        ],
    ));

    let d = index.symbol_by_qualified_name("m.D").unwrap().symbol_id;
    let a = index.symbol_by_qualified_name("m.A").unwrap().symbol_id;
    let edges: Vec<_> = index.relations().filter(|r| r.from == d).collect();
    assert_eq!(edges.len(), 3);

    let extends: Vec<_> = edges
        .iter()
        .filter(|r| r.kind == RelationKind::Extends)
        .collect();
    assert_eq!(extends.len(), 1);
    assert_eq!(extends[0].to, RelationTarget::Resolved(a));

    let composes = edges
        .iter()
        .filter(|r| r.kind == RelationKind::Composes)
        .count();
    assert_eq!(composes, 2);
}

#[test]
fn subscripted_mixin_base_resolves_by_base_name() {
    let index = index_one(tree(
        "m.py",
        vec![
            class_def("Base", &[], vec![]),
            class_def("LoggerMixin", &[], vec![]),
            class_def("Service", &["Base", "LoggerMixin[int]"], vec![]),
        ],
    ));
    let service = index.symbol_by_qualified_name("m.Service").unwrap().symbol_id;
    let mixin = index
        .symbol_by_qualified_name("m.LoggerMixin")
        .unwrap()
        .symbol_id;
    let compose = index
        .relations()
        .find(|r| r.from == service && r.kind == RelationKind::Composes)
        .unwrap();
    assert_eq!(compose.to, RelationTarget::Resolved(mixin));
}

#[test]
fn stacked_decorators_keep_source_order_and_both_edges() {
    let index = index_one(tree(
        "m.py",
        vec![decorated(
            &["@retry(times=3, delay=0.5)", "@timer"],
            function_def("fetch", &[("url", Some("str"), false)], None, vec![]),
        )],
    ));

    let fetch = index.symbol_by_qualified_name("m.fetch").unwrap();
    assert_eq!(fetch.decorators.len(), 2);
    assert_eq!(fetch.decorators[0].name, "retry");
    assert_eq!(
        fetch.decorators[0].arguments.as_deref(),
        Some("times=3, delay=0.5")
    );
    assert_eq!(fetch.decorators[1].name, "timer");
    // Source order: earlier decorator starts earlier.
    assert!(fetch.decorators[0].span.start < fetch.decorators[1].span.start);

    let decorates: Vec<_> = index
        .relations()
        .filter(|r| r.kind == RelationKind::Decorates && r.from == fetch.symbol_id)
        .collect();
    assert_eq!(decorates.len(), 2);
}

#[test]
fn unresolvable_base_is_a_warning_not_a_failure() {
    let index = index_one(tree(
        "m.py",
        vec![class_def("Client", &["MissingBase"], vec![])],
    ));

    let client = index.symbol_by_qualified_name("m.Client").unwrap().symbol_id;
    let edges: Vec<_> = index.relations().filter(|r| r.from == client).collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].kind, RelationKind::Extends);
    assert_eq!(
        edges[0].to,
        RelationTarget::Unresolved("MissingBase".to_string())
    );

    // The file still indexes cleanly; the snapshot surfaces a warning.
    assert_eq!(index.file_by_path("m.py").unwrap().status.as_str(), "clean");
    let snapshot = IndexSnapshot::from_index_at(&index, "t0".to_string());
    assert_eq!(snapshot.warnings.len(), 1);
    assert_eq!(snapshot.warnings[0].code, "unresolved_reference");
}

#[test]
fn explicit_protocol_base_yields_implements() {
    let index = index_one(tree(
        "m.py",
        vec![
            class_def(
                "Runnable",
                &["Protocol"],
                vec![function_def("run", &[("self", None, false)], None, vec![])],
            ),
            class_def(
                "Worker",
                &["Runnable"],
                vec![function_def("run", &[("self", None, false)], None, vec![])],
            ),
        ],
    ));

    let runnable = index.symbol_by_qualified_name("m.Runnable").unwrap();
    assert_eq!(runnable.kind, SymbolKind::Protocol);

    let worker = index.symbol_by_qualified_name("m.Worker").unwrap().symbol_id;
    let edges: Vec<_> = index.relations().filter(|r| r.from == worker).collect();
    // One Implements edge; the structural pass does not duplicate it.
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].kind, RelationKind::Implements);
    assert_eq!(edges[0].to, RelationTarget::Resolved(runnable.symbol_id));
}

#[test]
fn structural_conformance_is_computed_opportunistically() {
    let index = index_one(tree(
        "m.py",
        vec![
            class_def(
                "Closeable",
                &["Protocol"],
                vec![function_def("close", &[("self", None, false)], None, vec![])],
            ),
            // No declared relationship to Closeable at all.
            class_def(
                "Connection",
                &[],
                vec![
                    function_def("close", &[("self", None, false)], None, vec![]),
                    function_def("send", &[("self", None, false)], None, vec![]),
                ],
            ),
            // Does not satisfy the protocol.
            class_def(
                "Buffer",
                &[],
                vec![function_def("write", &[("self", None, false)], None, vec![])],
            ),
        ],
    ));

    let closeable = index.symbol_by_qualified_name("m.Closeable").unwrap().symbol_id;
    let connection = index
        .symbol_by_qualified_name("m.Connection")
        .unwrap()
        .symbol_id;
    let buffer = index.symbol_by_qualified_name("m.Buffer").unwrap().symbol_id;

    let implements: Vec<_> = index
        .relations()
        .filter(|r| r.kind == RelationKind::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert_eq!(implements[0].from, connection);
    assert_eq!(implements[0].to, RelationTarget::Resolved(closeable));
    assert!(!implements.iter().any(|r| r.from == buffer));
}

#[test]
fn protocol_without_members_matches_nothing() {
    let index = index_one(tree(
        "m.py",
        vec![
            class_def("Marker", &["Protocol"], vec![]),
            class_def("Anything", &[], vec![]),
        ],
    ));
    let implements = index
        .relations()
        .filter(|r| r.kind == RelationKind::Implements)
        .count();
    assert_eq!(implements, 0);
}

#[test]
fn decorator_imported_under_alias_resolves_across_files() {
    let index = index_workspace(vec![
        tree(
            "decorators.py",
            vec![function_def("retry", &[("times", Some("int"), true)], None, vec![])],
        ),
        tree(
            "app.py",
            vec![
                from_import("decorators", &[("retry", Some("retrying"))]),
                decorated(
                    &["@retrying(times=3)"],
                    function_def("fetch", &[], None, vec![]),
                ),
            ],
        ),
    ]);

    let retry = index
        .symbol_by_qualified_name("decorators.retry")
        .unwrap()
        .symbol_id;
    let fetch = index.symbol_by_qualified_name("app.fetch").unwrap().symbol_id;
    let edge = index
        .relations()
        .find(|r| r.kind == RelationKind::Decorates && r.from == fetch)
        .unwrap();
    assert_eq!(edge.to, RelationTarget::Resolved(retry));
}

#[test]
fn dotted_base_resolves_through_module_import() {
    let index = index_workspace(vec![
        tree("base.py", vec![class_def("Base", &[], vec![])]),
        tree(
            "child.py",
            vec![
                import_stmt("base"),
                class_def("Child", &["base.Base"], vec![]),
            ],
        ),
    ]);

    let base = index.symbol_by_qualified_name("base.Base").unwrap().symbol_id;
    let child = index.symbol_by_qualified_name("child.Child").unwrap().symbol_id;
    let edge = index
        .relations()
        .find(|r| r.from == child && r.kind == RelationKind::Extends)
        .unwrap();
    assert_eq!(edge.to, RelationTarget::Resolved(base));
}

#[test]
fn imported_protocol_base_becomes_implements_after_resolution() {
    let index = index_workspace(vec![
        tree(
            "protocols.py",
            vec![class_def(
                "Serializable",
                &["Protocol"],
                vec![function_def("dump", &[("self", None, false)], None, vec![])],
            )],
        ),
        tree(
            "model.py",
            vec![
                from_import("protocols", &[("Serializable", None)]),
                class_def(
                    "Record",
                    &["Serializable"],
                    vec![function_def("dump", &[("self", None, false)], None, vec![])],
                ),
            ],
        ),
    ]);

    let proto = index
        .symbol_by_qualified_name("protocols.Serializable")
        .unwrap()
        .symbol_id;
    let record = index.symbol_by_qualified_name("model.Record").unwrap().symbol_id;
    let edges: Vec<_> = index.relations().filter(|r| r.from == record).collect();
    assert_eq!(edges.len(), 1);
    // Started as an unresolved Extends; resolution discovered the target is
    // a protocol and reclassified the edge.
    assert_eq!(edges[0].kind, RelationKind::Implements);
    assert_eq!(edges[0].to, RelationTarget::Resolved(proto));
}

#[test]
fn annotations_produce_intra_module_reference_edges() {
    let index = index_one(tree(
        "m.py",
        vec![
            class_def("Token", &[], vec![]),
            function_def(
                "parse",
                &[("tok", Some("Token"), false)],
                Some("Token"),
                vec![],
            ),
        ],
    ));
    let token = index.symbol_by_qualified_name("m.Token").unwrap().symbol_id;
    let parse = index.symbol_by_qualified_name("m.parse").unwrap().symbol_id;
    let references: Vec<_> = index
        .relations()
        .filter(|r| r.kind == RelationKind::References && r.from == parse)
        .collect();
    assert_eq!(references.len(), 2);
    assert!(references
        .iter()
        .all(|r| r.to == RelationTarget::Resolved(token)));
}

#[test]
fn builtin_decorators_produce_no_edges() {
    let index = index_one(tree(
        "m.py",
        vec![class_def(
            "Config",
            &[],
            vec![decorated(
                &["@property"],
                function_def("value", &[("self", None, false)], None, vec![]),
            )],
        )],
    ));
    let decorates = index
        .relations()
        .filter(|r| r.kind == RelationKind::Decorates)
        .count();
    assert_eq!(decorates, 0);
    // The decorator list still round-trips.
    let value = index.symbol_by_qualified_name("m.Config.value").unwrap();
    assert_eq!(value.decorators.len(), 1);
    assert_eq!(value.decorators[0].name, "property");
}
