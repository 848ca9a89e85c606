// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end reconciliation runs against the in-memory document.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use grevit_core::{
    Column, Component, ComponentCollection, ComponentKind, ComponentType, Door, Level, Line,
    Parameter, ParameterValue, Point, Wall,
};
use grevit_sync::{
    default_router, BuildRequest, BuilderRouter, ComponentBuilder, CreationError, ElementId,
    MemoryDocument, MemoryElement, NativeDocument, Reconciler, SkipReason, SyncError,
};

fn line(gid: &str, x: f64) -> Component {
    Component::new(Line {
        from: Point::new(x, 0.0, 0.0),
        to: Point::new(x, 10.0, 0.0),
        view: String::new(),
    })
    .with_gid(gid)
}

fn wall(gid: &str) -> Component {
    Component::new(Wall {
        curve: Some(Box::new(line("", 0.0))),
        height: 3.0,
        ..Default::default()
    })
    .with_gid(gid)
    .with_style("Basic Wall", "Generic - 200mm")
}

fn door(gid: &str, host: &str) -> Component {
    Component::new(Door {
        location_point: Point::new(0.0, 5.0, 0.0),
        reference_gid: host.to_string(),
    })
    .with_gid(gid)
    .with_style("Single-Flush", "0915 x 2134mm")
    .stalled()
}

fn reconciler() -> Reconciler<MemoryDocument> {
    Reconciler::new(default_router())
}

fn only_tagged(doc: &MemoryDocument, gid: &str) -> ElementId {
    let tagged = doc.tagged(gid);
    assert_eq!(tagged.len(), 1, "expected one element tagged {gid}");
    tagged[0].id
}

#[test]
fn resending_updates_in_place() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    let collection =
        ComponentCollection::new(vec![line("a", 0.0), line("b", 1.0)]).with_update(true);

    let first = engine.run(&mut doc, &collection).unwrap();
    assert_eq!(first.created, 2);
    let a = only_tagged(&doc, "a");

    let second = engine.run(&mut doc, &collection).unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 2);
    assert_eq!(doc.len(), 2);
    assert_eq!(only_tagged(&doc, "a"), a);
}

#[test]
fn without_update_every_send_creates() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    let collection = ComponentCollection::new(vec![line("a", 0.0)]);

    engine.run(&mut doc, &collection).unwrap();
    engine.run(&mut doc, &collection).unwrap();

    assert_eq!(doc.tagged("a").len(), 2);
}

#[test]
fn ambiguous_gid_is_banned_and_recreated() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    let plain = ComponentCollection::new(vec![line("dup", 0.0)]);

    // Two sends without update leave two elements tagged with the same GID.
    engine.run(&mut doc, &plain).unwrap();
    engine.run(&mut doc, &plain).unwrap();
    assert_eq!(doc.len(), 2);

    let third = engine
        .run(&mut doc, &plain.clone().with_update(true))
        .unwrap();

    assert_eq!(third.banned, vec!["dup".to_string()]);
    assert_eq!(third.created, 1);
    assert_eq!(third.updated, 0);
    assert_eq!(doc.len(), 3);
}

#[test]
fn deferred_door_is_hosted_on_wall_from_same_run() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();

    // The door comes first in the list but must wait for its wall.
    let collection = ComponentCollection::new(vec![door("d1", "w1"), wall("w1")]);
    let report = engine.run(&mut doc, &collection).unwrap();

    assert_eq!(report.created, 2);
    let wall_id = only_tagged(&doc, "w1");
    let door_id = only_tagged(&doc, "d1");
    assert!(wall_id < door_id);
    assert_eq!(doc.element(door_id).unwrap().host, Some(wall_id));
}

#[test]
fn deferred_reference_falls_back_to_scanned_elements() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    engine
        .run(&mut doc, &ComponentCollection::new(vec![wall("w1")]))
        .unwrap();
    let wall_id = only_tagged(&doc, "w1");

    let report = engine
        .run(
            &mut doc,
            &ComponentCollection::new(vec![door("d1", "w1")]).with_update(true),
        )
        .unwrap();

    assert_eq!(report.created, 1);
    let door_id = only_tagged(&doc, "d1");
    assert_eq!(doc.element(door_id).unwrap().host, Some(wall_id));
}

#[test]
fn unresolved_reference_is_skipped() {
    let mut doc = MemoryDocument::new();
    let report = reconciler()
        .run(
            &mut doc,
            &ComponentCollection::new(vec![door("d1", "missing"), line("a", 0.0)]),
        )
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::UnresolvedReference("missing".to_string())
    );
    assert!(doc.tagged("d1").is_empty());
}

#[test]
fn stalled_component_without_reference_form_is_a_no_op() {
    let mut doc = MemoryDocument::new();
    let report = reconciler()
        .run(
            &mut doc,
            &ComponentCollection::new(vec![line("a", 0.0).stalled()]),
        )
        .unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.created, 0);
    assert_eq!(report.skipped[0].reason, SkipReason::NotReferenceDependent);
    assert!(doc.is_empty());
}

#[test]
fn sweep_deletes_only_stale_elements() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();

    engine
        .run(
            &mut doc,
            &ComponentCollection::new(vec![line("A", 0.0), line("B", 1.0)]),
        )
        .unwrap();
    let a = only_tagged(&doc, "A");

    let report = engine
        .run(
            &mut doc,
            &ComponentCollection::new(vec![line("A", 0.0), line("C", 2.0)])
                .with_update(true)
                .with_delete(true),
        )
        .unwrap();

    assert_eq!(
        report.sweep.as_ref().unwrap().deleted,
        vec!["B".to_string()]
    );
    assert_eq!(report.deleted(), 1);
    assert!(doc.tagged("B").is_empty());
    assert_eq!(only_tagged(&doc, "A"), a);
    only_tagged(&doc, "C");
    assert_eq!(doc.len(), 2);
}

#[test]
fn sweep_removes_old_element_when_type_changes() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    engine
        .run(&mut doc, &ComponentCollection::new(vec![line("x", 0.0)]))
        .unwrap();
    let old = only_tagged(&doc, "x");

    let level = Component::new(Level {
        name: "Level 1".into(),
        ..Default::default()
    })
    .with_gid("x");
    engine
        .run(
            &mut doc,
            &ComponentCollection::new(vec![level])
                .with_update(true)
                .with_delete(true),
        )
        .unwrap();

    let new = only_tagged(&doc, "x");
    assert_ne!(old, new);
    assert!(!doc.contains(old));
    assert_eq!(
        doc.element(new).unwrap().component_type(),
        ComponentType::Level
    );
}

#[test]
fn no_sweep_without_delete_flag() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    engine
        .run(&mut doc, &ComponentCollection::new(vec![line("B", 0.0)]))
        .unwrap();

    let report = engine
        .run(
            &mut doc,
            &ComponentCollection::new(vec![line("A", 0.0)]).with_update(true),
        )
        .unwrap();

    assert!(report.sweep.is_none());
    assert_eq!(doc.len(), 2);
}

/// Inserts an element and then fails, to prove the rollback.
struct Exploding;

impl ComponentBuilder<MemoryDocument> for Exploding {
    fn build(
        &self,
        document: &mut MemoryDocument,
        request: BuildRequest<'_, ElementId>,
    ) -> Result<Option<ElementId>, CreationError> {
        document.insert(MemoryElement {
            id: 0,
            category: "Columns".into(),
            family: String::new(),
            type_name: String::new(),
            kind: request.component.kind.clone(),
            host: None,
            tag: None,
            parameters: BTreeMap::new(),
        });
        Err(CreationError::host("column family is not loaded"))
    }

    fn supported_types(&self) -> Vec<ComponentType> {
        vec![ComponentType::Column]
    }
}

#[test]
fn one_failing_component_does_not_stop_the_run() {
    let mut router = default_router();
    router.register(Box::new(Exploding));
    let engine = Reconciler::new(router);
    let mut doc = MemoryDocument::new();

    let collection = ComponentCollection::new(vec![
        line("first", 0.0),
        Component::new(Column::default()).with_gid("second"),
        line("third", 2.0),
    ]);
    let report = engine.run(&mut doc, &collection).unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.created, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].component_type, ComponentType::Column);
    let message = &report.failed[0].message;
    assert!(message.contains("column family is not loaded"));
    assert!(!report.is_clean());

    assert_eq!(doc.len(), 2);
    only_tagged(&doc, "first");
    only_tagged(&doc, "third");
    assert!(!doc.in_transaction());
}

#[test]
fn missing_level_fails_only_that_component() {
    let mut doc = MemoryDocument::new();
    let mut on_level = wall("w1");
    if let ComponentKind::Wall(k) = &mut on_level.kind {
        k.level_bottom = "Level 1".into();
    }

    let report = reconciler()
        .run(&mut doc, &ComponentCollection::new(vec![on_level.clone()]))
        .unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(doc.is_empty());

    let level = Component::new(Level {
        name: "Level 1".into(),
        height: 0.0,
        add_view: false,
    });
    let report = reconciler()
        .run(&mut doc, &ComponentCollection::new(vec![level, on_level]))
        .unwrap();
    assert_eq!(report.created, 2);
}

#[test]
fn unregistered_type_is_skipped() {
    let engine = Reconciler::new(BuilderRouter::<MemoryDocument>::new());
    let mut doc = MemoryDocument::new();

    let report = engine
        .run(&mut doc, &ComponentCollection::new(vec![line("a", 0.0)]))
        .unwrap();

    assert_eq!(report.skipped[0].reason, SkipReason::NotRegistered);
    assert!(doc.is_empty());
}

#[test]
fn parameters_are_type_checked() {
    let mut doc = MemoryDocument::new();
    let component = line("a", 0.0)
        .with_parameter(Parameter::text("Comments", "from grasshopper"))
        .with_parameter(Parameter::double("Offset", 1.5))
        .with_parameter(Parameter::integer("Offset", 2))
        .with_parameter(Parameter::text("-1001203", "M-1"))
        .with_parameter(Parameter::boolean("Unknown", true));

    let report = reconciler()
        .run(&mut doc, &ComponentCollection::new(vec![component]))
        .unwrap();

    assert_eq!(report.parameters_applied, 3);
    assert_eq!(report.parameters_skipped, 2);

    let element = doc.element(only_tagged(&doc, "a")).unwrap();
    assert_eq!(
        element.parameters.get("Offset"),
        Some(&ParameterValue::Double(1.5))
    );
    assert_eq!(
        element.parameters.get("Mark"),
        Some(&ParameterValue::Text("M-1".into()))
    );
}

#[test]
fn coordinates_are_scaled_into_native_units() {
    let mut doc = MemoryDocument::new();
    reconciler()
        .run(
            &mut doc,
            &ComponentCollection::new(vec![line("a", 1.0)]).with_scale(3.28084),
        )
        .unwrap();

    let element = doc.element(only_tagged(&doc, "a")).unwrap();
    let ComponentKind::Line(stored) = &element.kind else {
        panic!("expected a line");
    };
    assert_relative_eq!(stored.from.x, 3.28084);
    assert_relative_eq!(stored.to.y, 32.8084);
}

#[test]
fn refused_transaction_aborts_the_run() {
    let mut doc = MemoryDocument::new();
    doc.refuse_transactions(true);

    let result = reconciler().run(&mut doc, &ComponentCollection::new(vec![line("a", 0.0)]));
    assert!(matches!(result, Err(SyncError::Transaction { .. })));
}

#[test]
fn unstartable_sweep_is_reported_not_fatal() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    engine
        .run(&mut doc, &ComponentCollection::new(vec![line("B", 0.0)]))
        .unwrap();

    doc.refuse_transactions(true);
    let report = engine
        .run(
            &mut doc,
            &ComponentCollection::new(Vec::new())
                .with_update(true)
                .with_delete(true),
        )
        .unwrap();

    let sweep = report.sweep.as_ref().unwrap();
    assert!(sweep.deleted.is_empty());
    assert_eq!(sweep.failures.len(), 1);
    assert_eq!(sweep.failures[0].gid, "B");
    assert!(!report.is_clean());
    only_tagged(&doc, "B");
}

#[test]
fn pinned_orphan_does_not_block_the_others() {
    let mut doc = MemoryDocument::new();
    let engine = reconciler();
    engine
        .run(
            &mut doc,
            &ComponentCollection::new(vec![line("A", 0.0), line("B", 1.0), line("C", 2.0)]),
        )
        .unwrap();
    let b = only_tagged(&doc, "B");
    doc.pin(b);

    let report = engine
        .run(
            &mut doc,
            &ComponentCollection::new(Vec::new())
                .with_update(true)
                .with_delete(true),
        )
        .unwrap();

    let sweep = report.sweep.as_ref().unwrap();
    assert_eq!(sweep.deleted, vec!["A".to_string(), "C".to_string()]);
    assert_eq!(sweep.failures.len(), 1);
    assert_eq!(sweep.failures[0].gid, "B");
    assert_eq!(doc.len(), 1);
}

#[test]
fn catalog_lists_placed_family_types() {
    let mut doc = MemoryDocument::new();
    reconciler()
        .run(
            &mut doc,
            &ComponentCollection::new(vec![wall("w1"), door("d1", "w1")]),
        )
        .unwrap();

    let catalog = doc.catalog();
    assert_eq!(
        catalog.types_of("Basic Wall"),
        &["Generic - 200mm".to_string()]
    );
    assert_eq!(
        catalog.types_of("Single-Flush"),
        &["0915 x 2134mm".to_string()]
    );
    assert!(catalog.category("Doors").is_some());
    assert_eq!(doc.scan_tagged_elements().unwrap().len(), 2);
}
