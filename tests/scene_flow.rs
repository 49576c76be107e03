//! End-to-end flows through the public API: a board loaded from JSON,
//! rendered, queried, edited and handed to a backend.

#![allow(clippy::float_cmp)]

use eda_canvas::backend::{RenderBackend, SceneFrame, ViewOverlay};
use eda_canvas::camera::Camera;
use eda_canvas::canvas::Canvas;
use eda_canvas::doc::{Board, DomainObject, Item, ObjectType};
use eda_canvas::engine::{Action, Engine};
use eda_canvas::geom::{Coordf, Coordi};
use eda_canvas::input::Modifiers;
use eda_canvas::layer::{BOTTOM_COPPER, TOP_COPPER};
use eda_canvas::selectables::SelectableRef;
use eda_canvas::target::snap_to_grid;
use serde_json::json;
use uuid::Uuid;

// =============================================================
// Helpers
// =============================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn uuid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Board with two instances of a one-pad package (the second flipped),
/// a track and a via.
fn make_board() -> Board {
    let package = json!({
        "uuid": uuid(100),
        "name": "TP",
        "pads": [{
            "uuid": uuid(101),
            "name": "1",
            "placement": { "shift": { "x": 100, "y": 0 } },
            "shape": "rect", "width": 40, "height": 20,
            "drill": 10
        }],
        "lines": [{ "uuid": uuid(102), "from": { "x": -60, "y": -30 }, "to": { "x": 160, "y": -30 }, "width": 5, "layer": 20 }]
    });
    serde_json::from_value(json!({
        "uuid": uuid(1),
        "name": "demo",
        "packages": [
            { "uuid": uuid(10), "placement": { "shift": { "x": 0, "y": 0 } }, "package": package },
            { "uuid": uuid(11), "placement": { "shift": { "x": 1000, "y": 0 } }, "flip": true, "package": package }
        ],
        "tracks": [{ "uuid": uuid(20), "from": { "x": 100, "y": 0 }, "to": { "x": 900, "y": 0 }, "width": 10, "layer": 0 }],
        "vias": [{ "uuid": uuid(30), "position": { "x": 500, "y": 0 }, "diameter": 30, "drill": 12 }],
        "outline": [{ "x": -200, "y": -200 }, { "x": 1200, "y": -200 }, { "x": 1200, "y": 200 }, { "x": -200, "y": 200 }]
    }))
    .unwrap()
}

#[derive(Default)]
struct Recorder {
    frames: Vec<SceneFrame>,
    draws: usize,
}

impl RenderBackend for Recorder {
    fn push(&mut self, frame: &SceneFrame) {
        self.frames.push(frame.clone());
    }

    fn draw(&mut self, _camera: &Camera, _overlay: &ViewOverlay) {
        self.draws += 1;
    }
}

// =============================================================
// Scene build
// =============================================================

#[test]
fn pad_selectable_is_centred_on_its_document_position() {
    init_tracing();
    let board = make_board();
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Board(&board)).unwrap();

    let pad = canvas.selectables().get(&SelectableRef::new(uuid(10), ObjectType::Pad, 0)).unwrap();
    assert_eq!(pad.bbox.center(), Coordf::new(100.0, 0.0));

    // flipped instance: mirrored about its origin
    let flipped = canvas.selectables().get(&SelectableRef::new(uuid(11), ObjectType::Pad, 0)).unwrap();
    assert_eq!(flipped.bbox.center(), Coordf::new(900.0, 0.0));
}

#[test]
fn repeated_footprints_tessellate_once() {
    let board = make_board();
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Board(&board)).unwrap();
    // package art, pad, via
    assert_eq!(canvas.fragment_count(), 3);
    canvas.update(DomainObject::Board(&board)).unwrap();
    assert_eq!(canvas.fragment_count(), 3);
}

#[test]
fn flipped_copper_lands_on_the_bottom() {
    let board = make_board();
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Board(&board)).unwrap();
    let bottom_xs: Vec<f64> = canvas.buffer().visible_triangles(BOTTOM_COPPER).map(|t| t.p0.x).collect();
    // the flipped pad plus the via's bottom copper
    assert!(bottom_xs.iter().any(|&x| x > 850.0 && x < 950.0));
    assert!(bottom_xs.iter().all(|&x| x < 150.0 || x > 450.0));
    assert!(canvas.buffer().visible_triangles(TOP_COPPER).all(|t| t.p0.x < 950.0));
}

#[test]
fn hide_and_show_restore_identical_frames() {
    let board = make_board();
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Board(&board)).unwrap();
    let before = canvas.snapshot();
    let bp = eda_canvas::buffer::ObjectRef::new(uuid(11), ObjectType::BoardPackage);

    canvas.hide_obj(&bp);
    assert!(canvas.snapshot().triangle_count() < before.triangle_count());
    canvas.show_obj(&bp);
    assert_eq!(canvas.snapshot().layers, before.layers);
}

#[test]
fn moving_a_track_keeps_everything_else() {
    let mut board = make_board();
    let mut canvas = Canvas::default();
    canvas.update(DomainObject::Board(&board)).unwrap();
    let via_key = SelectableRef::new(uuid(30), ObjectType::Via, 0);
    let via_bbox = canvas.selectables().get(&via_key).unwrap().bbox;

    board.tracks[0].to = Coordi::new(900, 100);
    canvas.update_item(Item::Track(&board.tracks[0])).unwrap();

    assert_eq!(canvas.selectables().get(&via_key).unwrap().bbox, via_bbox);
    let ends: Vec<Coordi> = canvas.targets().iter().filter(|t| t.kind == ObjectType::Track).map(|t| t.p).collect();
    assert_eq!(ends, vec![Coordi::new(100, 0), Coordi::new(900, 100)]);
    assert!(canvas.selectables().is_consistent());
}

// =============================================================
// Interaction
// =============================================================

#[test]
fn screen_mapping_matches_the_documented_convention() {
    let mut camera = Camera::new(800.0, 600.0);
    camera.scale = 1e-4;
    camera.offset = Coordf::new(400.0, 300.0);
    let p = camera.screen2canvas(Coordf::new(0.0, 0.0));
    assert!((p.x + 4_000_000.0).abs() < 1e-6);
    assert!((p.y - 3_000_000.0).abs() < 1e-6);
}

#[test]
fn cursor_snaps_to_a_pad_and_skips_it_when_locked() {
    init_tracing();
    let board = make_board();
    let mut engine = Engine::default();
    engine.set_size(800.0, 600.0);
    engine.camera.center_and_zoom(Coordi::new(0, 0), 1.0);
    engine.set_grid_spacing(30);
    engine.update(DomainObject::Board(&board)).unwrap();

    let near_pad = Coordf::new(400.0 + 112.0, 300.0 - 8.0);
    let actions = engine.on_cursor_move(near_pad, Modifiers::default());
    assert_eq!(actions.first(), Some(&Action::CursorMoved(Coordi::new(100, 0))));
    assert_eq!(engine.get_current_target().unwrap().kind, ObjectType::Pad);

    // selecting the owning instance locks its pad out of targeting; the
    // track end at the same point takes over
    engine.set_selection(&[SelectableRef::new(uuid(10), ObjectType::BoardPackage, 0)], false);
    engine.set_selection_allowed(false);
    engine.on_cursor_move(Coordf::new(400.0 + 113.0, 300.0 - 8.0), Modifiers::default());
    assert_eq!(engine.get_cursor_pos(), Coordi::new(100, 0));
    let target = engine.get_current_target().unwrap();
    assert_eq!(target.kind, ObjectType::Track);
    assert_eq!(target.path, vec![uuid(20)]);
}

#[test]
fn snap_is_idempotent() {
    for (x, y) in [(0.4, -0.6), (1_249_999.0, 625_000.0), (-3_750_001.2, 17.0)] {
        let once = snap_to_grid(Coordf::new(x, y), 1_250_000);
        assert_eq!(snap_to_grid(once.to_f(), 1_250_000), once);
    }
}

#[test]
fn overlay_layers_are_stable() {
    let mut canvas = Canvas::default();
    let a = canvas.get_overlay_layer(TOP_COPPER, false);
    assert_eq!(canvas.get_overlay_layer(TOP_COPPER, false), a);
    assert_ne!(canvas.get_overlay_layer(TOP_COPPER, true), a);
}

#[test]
fn backend_sees_one_push_per_mutation() {
    let board = make_board();
    let mut engine = Engine::default();
    engine.update(DomainObject::Board(&board)).unwrap();
    let mut backend = Recorder::default();
    engine.render(&mut backend);
    engine.render(&mut backend);
    assert_eq!(backend.frames.len(), 1);
    assert_eq!(backend.draws, 2);
    assert!(backend.frames[0].triangle_count() > 0);
}
