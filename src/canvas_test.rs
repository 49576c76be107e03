#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{Package, Pad, PadShape};
use crate::layer::{BOTTOM_COPPER, DisplayMode, TOP_COPPER, TOP_SILKSCREEN};

fn unit_tri(canvas: &mut Canvas, layer: LayerId, x: f64) {
    canvas.add_triangle(
        layer,
        Coordf::new(x, 0.0),
        Coordf::new(x + 1.0, 0.0),
        Coordf::new(x, 1.0),
        ColorP::FromLayer,
        TriangleFlags::empty(),
    );
}

fn make_package(pads: usize) -> Package {
    let pads = (0..pads)
        .map(|i| Pad {
            uuid: Uuid::from_u128(100 + i as u128),
            name: String::new(),
            placement: Placement::at(i as i64 * 100, 0),
            shape: PadShape::Circle { diameter: 40 },
            layers: vec![TOP_COPPER],
            drill: None,
        })
        .collect();
    Package { uuid: Uuid::from_u128(1), name: "p".into(), pads, lines: Vec::new(), polygons: Vec::new(), texts: Vec::new() }
}

fn layer_order(frame: &SceneFrame) -> Vec<LayerId> {
    frame.layers.iter().map(|l| l.layer).collect()
}

// =============================================================
// Scopes
// =============================================================

#[test]
fn transform_scope_applies_and_restores() {
    let mut canvas = Canvas::default();
    {
        let mut placed = canvas.transform_scope(&Placement::at(100, 0));
        placed.draw_line(Coordf::new(0.0, 0.0), Coordf::new(10.0, 0.0), ColorP::FromLayer, TOP_COPPER, 0.0);
        assert_eq!(placed.transforms().depth(), 1);
    }
    assert_eq!(canvas.transforms().depth(), 0);
    assert!(canvas.transforms().current().is_identity());
    let t = canvas.buffer().layer_triangles(TOP_COPPER)[0];
    assert_eq!(t.p0, Coordf::new(100.0, 0.0));
    assert_eq!(t.p1, Coordf::new(110.0, 0.0));
    assert!(t.is_line());
}

#[test]
fn flipped_scope_swaps_board_layers() {
    let mut canvas = Canvas::default();
    {
        let mut placed = canvas.placed_scope(&Placement::IDENTITY, true);
        placed.draw_box(Coordf::new(0.0, 0.0), Coordf::new(5.0, 5.0), ColorP::FromLayer, TOP_SILKSCREEN);
    }
    canvas.draw_box(Coordf::new(0.0, 0.0), Coordf::new(5.0, 5.0), ColorP::FromLayer, TOP_SILKSCREEN);
    assert_eq!(canvas.buffer().layer_triangles(layer::BOTTOM_SILKSCREEN).len(), 4);
    assert_eq!(canvas.buffer().layer_triangles(TOP_SILKSCREEN).len(), 4);
}

#[test]
fn object_scope_attributes_triangles_and_restores_type() {
    let mut canvas = Canvas::default();
    let obj = ObjectRef::new(Uuid::from_u128(7), ObjectType::Annotation);
    canvas.triangle_type_current = TriangleType::Track;
    {
        let mut scope = canvas.object_scope(obj);
        assert_eq!(scope.triangle_type_current, TriangleType::None);
        scope.triangle_type_current = TriangleType::Annotation;
        unit_tri(&mut scope, TOP_COPPER, 0.0);
    }
    assert_eq!(canvas.triangle_type_current, TriangleType::Track);
    assert_eq!(canvas.buffer().depth(), 0);
    let owned = canvas.buffer().object_triangles(&obj, TOP_COPPER);
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].kind, TriangleType::Annotation);
}

// =============================================================
// Annotations, removal, visibility
// =============================================================

#[test]
fn add_line_then_remove() {
    let mut canvas = Canvas::default();
    let pts = [Coordi::new(0, 0), Coordi::new(100, 0), Coordi::new(100, 100)];
    let obj = canvas.add_line(&pts, 0, ColorP::Annotation, layer::ANNOTATION);
    assert_eq!(obj.kind, ObjectType::Annotation);
    assert_eq!(canvas.buffer().visible_triangles(layer::ANNOTATION).count(), 2);
    assert!(canvas.buffer().layer_triangles(layer::ANNOTATION).iter().all(|t| t.kind == TriangleType::Annotation));

    assert!(canvas.remove_obj(&obj));
    assert_eq!(canvas.buffer().visible_triangles(layer::ANNOTATION).count(), 0);
    assert!(!canvas.remove_obj(&obj));
}

#[test]
fn remove_sub_object_keeps_siblings() {
    let pkg = make_package(2);
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Package(&pkg)).unwrap();
    let pad0 = ObjectRef::with_sub(pkg.uuid, ObjectType::Pad, 0);

    assert!(canvas.remove_obj(&pad0));
    assert!(!canvas.selectables().contains(&SelectableRef::new(pkg.uuid, ObjectType::Pad, 0)));
    assert!(canvas.selectables().contains(&SelectableRef::new(pkg.uuid, ObjectType::Pad, 1)));
    assert_eq!(canvas.targets().len(), 1);
    assert_eq!(canvas.targets()[0].vertex, 1);
}

#[test]
fn hide_show_round_trip_is_identical() {
    let pkg = make_package(2);
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Package(&pkg)).unwrap();
    let before = canvas.snapshot();
    let pad = ObjectRef::with_sub(pkg.uuid, ObjectType::Pad, 1);

    assert!(canvas.hide_obj(&pad));
    assert!(canvas.is_hidden(&pad));
    assert!(canvas.snapshot().triangle_count() < before.triangle_count());

    assert!(canvas.show_obj(&pad));
    assert_eq!(canvas.snapshot().layers, before.layers);
    assert!(!canvas.hide_obj(&ObjectRef::new(Uuid::from_u128(99), ObjectType::Track)));
}

#[test]
fn set_flags_marks_one_object() {
    let pkg = make_package(2);
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Package(&pkg)).unwrap();
    let pad = ObjectRef::with_sub(pkg.uuid, ObjectType::Pad, 0);
    assert!(canvas.set_flags(&pad, TriangleFlags::HIGHLIGHT, TriangleFlags::empty()));
    let lit = canvas.buffer().layer_triangles(TOP_COPPER).iter().filter(|t| t.flags.contains(TriangleFlags::HIGHLIGHT)).count();
    assert_eq!(lit, canvas.buffer().object_triangles(&pad, TOP_COPPER).len());

    canvas.set_flags_all(TriangleFlags::empty(), TriangleFlags::HIGHLIGHT);
    assert!(canvas.buffer().layer_triangles(TOP_COPPER).iter().all(|t| !t.flags.contains(TriangleFlags::HIGHLIGHT)));
}

#[test]
fn type_mask_filters_bbox_and_snapshot() {
    let mut canvas = Canvas::default();
    unit_tri(&mut canvas, TOP_COPPER, 0.0);
    canvas.triangle_type_current = TriangleType::Via;
    unit_tri(&mut canvas, TOP_COPPER, 100.0);

    assert_eq!(canvas.get_bbox(true).max.x, 101.0);
    canvas.set_type_visible(TriangleType::Via, false);
    assert!(!canvas.is_type_visible(TriangleType::Via));
    assert_eq!(canvas.get_bbox(true).max.x, 1.0);
    assert_eq!(canvas.get_bbox(false).max.x, 101.0);
    assert_eq!(canvas.snapshot().triangle_count(), 1);
}

#[test]
fn empty_canvas_bbox_is_empty() {
    assert!(Canvas::default().get_bbox(false).is_empty());
}

// =============================================================
// Layers and snapshots
// =============================================================

#[test]
fn snapshot_orders_layers_and_puts_work_layer_last() {
    let mut canvas = Canvas::default();
    for layer in [TOP_SILKSCREEN, BOTTOM_COPPER, TOP_COPPER] {
        unit_tri(&mut canvas, layer, 0.0);
    }
    canvas.set_work_layer(BOTTOM_COPPER);
    assert_eq!(layer_order(&canvas.snapshot()), vec![TOP_COPPER, TOP_SILKSCREEN, BOTTOM_COPPER]);

    canvas.set_work_layer(TOP_COPPER);
    canvas.set_flip_view(true);
    let frame = canvas.snapshot();
    assert!(frame.flip_view);
    assert_eq!(layer_order(&frame), vec![TOP_SILKSCREEN, BOTTOM_COPPER, TOP_COPPER]);
}

#[test]
fn hidden_layers_are_left_out() {
    let mut canvas = Canvas::default();
    unit_tri(&mut canvas, TOP_COPPER, 0.0);
    unit_tri(&mut canvas, TOP_SILKSCREEN, 0.0);
    let mut display = canvas.layer_display(TOP_SILKSCREEN);
    display.visible = false;
    display.mode = DisplayMode::Outline;
    canvas.set_layer_display(TOP_SILKSCREEN, display);
    assert_eq!(layer_order(&canvas.snapshot()), vec![TOP_COPPER]);
    assert_eq!(canvas.layer_display(TOP_SILKSCREEN).mode, DisplayMode::Outline);
}

#[test]
fn layer_colour_reaches_the_frame() {
    let mut canvas = Canvas::default();
    unit_tri(&mut canvas, TOP_COPPER, 0.0);
    let red = Color::new(1.0, 0.0, 0.0);
    canvas.set_layer_color(TOP_COPPER, red);
    assert_eq!(canvas.get_layer_color(TOP_COPPER), red);
    assert_eq!(canvas.snapshot().layer(TOP_COPPER).unwrap().color, red);
}

#[test]
fn overlay_layers_are_memoized() {
    let mut canvas = Canvas::default();
    let a = canvas.get_overlay_layer(TOP_COPPER, false);
    let b = canvas.get_overlay_layer(TOP_COPPER, true);
    assert_eq!(a, canvas.config().first_overlay_layer);
    assert_ne!(a, b);
    assert_eq!(canvas.get_overlay_layer(TOP_COPPER, false), a);
}

// =============================================================
// Push contract
// =============================================================

#[test]
fn push_is_requested_once_per_mutation_batch() {
    let pkg = make_package(1);
    let mut canvas = Canvas::default();
    assert!(!canvas.needs_push());
    canvas.update(DomainObject::Package(&pkg)).unwrap();
    let generation = canvas.generation();
    assert!(canvas.take_push());
    assert!(!canvas.take_push());
    assert_eq!(canvas.snapshot().generation, generation);

    canvas.set_flip_view(true);
    assert!(canvas.needs_push());
    assert!(canvas.generation() > generation);
}

#[test]
fn shared_fragment_cache_is_used_by_both_canvases() {
    let cache = Arc::new(SharedFragmentCache::new());
    let pkg = make_package(3);
    let mut a = Canvas::with_shared_fragments(CanvasConfig::default(), Arc::clone(&cache));
    let mut b = Canvas::with_shared_fragments(CanvasConfig::default(), Arc::clone(&cache));
    a.update(DomainObject::Package(&pkg)).unwrap();
    b.update(DomainObject::Package(&pkg)).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(a.fragment_count(), 1);
    assert_eq!(a.snapshot().layers, b.snapshot().layers);
}
