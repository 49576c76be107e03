#![allow(clippy::float_cmp)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

fn approx(a: Coordf, b: Coordf, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
}

fn viewport() -> Camera {
    Camera::new(800.0, 600.0)
}

// --- Mapping ---

#[test]
fn screen_origin_maps_with_inverted_y() {
    let cam = Camera { scale: 1e-4, offset: Coordf::new(400.0, 300.0), ..viewport() };
    let p = cam.screen2canvas(Coordf::new(0.0, 0.0));
    assert!(approx(p, Coordf::new(-4_000_000.0, 3_000_000.0), 1e-6));
}

#[test]
fn document_y_up_is_screen_y_down() {
    let cam = Camera { scale: 1.0, offset: Coordf::new(0.0, 100.0), ..viewport() };
    let up = cam.canvas2screen(Coordf::new(0.0, 10.0));
    assert_eq!(up.y, 90.0);
}

#[test]
fn roundtrip_within_tolerance() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let cam = Camera {
            scale: rng.random_range(1e-7..10.0),
            offset: Coordf::new(rng.random_range(-1e4..1e4), rng.random_range(-1e4..1e4)),
            ..viewport()
        };
        let p = Coordf::new(rng.random_range(-1e8..1e8), rng.random_range(-1e8..1e8));
        let back = cam.screen2canvas(cam.canvas2screen(p));
        let tol = 1e-9 * (p.mag() + cam.offset.mag() / cam.scale) + 1e-9;
        assert!(approx(back, p, tol));
    }
}

#[test]
fn screen_distance_scales_inversely() {
    let cam = Camera { scale: 0.5, ..viewport() };
    assert_eq!(cam.screen_dist_to_canvas(30.0), 60.0);
}

// --- Zoom helpers ---

#[test]
fn center_and_zoom_centers_point() {
    let mut cam = viewport();
    cam.center_and_zoom(Coordi::new(1_000_000, -500_000), 7.6e-5);
    let s = cam.canvas2screen(Coordf::new(1_000_000.0, -500_000.0));
    assert!(approx(s, Coordf::new(400.0, 300.0), 1e-9));
    assert_eq!(cam.scale, 7.6e-5);
}

#[test]
fn zoom_to_bbox_fits_limiting_axis() {
    let mut cam = viewport();
    let bb = BBox::from_corners(Coordf::new(0.0, 0.0), Coordf::new(1600.0, 300.0));
    assert!(cam.zoom_to_bbox(&bb));
    assert_eq!(cam.scale, 0.5);
    assert!(approx(cam.canvas2screen(Coordf::new(800.0, 150.0)), Coordf::new(400.0, 300.0), 1e-9));
}

#[test]
fn zoom_to_flat_bbox_uses_other_axis() {
    let mut cam = viewport();
    let bb = BBox::from_corners(Coordf::new(0.0, 0.0), Coordf::new(400.0, 0.0));
    assert!(cam.zoom_to_bbox(&bb));
    assert_eq!(cam.scale, 2.0);
}

#[test]
fn zoom_to_point_keeps_scale() {
    let mut cam = Camera { scale: 3.0, ..viewport() };
    let bb = BBox::EMPTY.including(Coordf::new(10.0, 10.0));
    assert!(cam.zoom_to_bbox(&bb));
    assert_eq!(cam.scale, 3.0);
}

#[test]
fn zoom_to_empty_bbox_is_noop() {
    let mut cam = viewport();
    let before = cam;
    assert!(!cam.zoom_to_bbox(&BBox::EMPTY));
    assert_eq!(cam, before);
}

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut cam = Camera { scale: 1e-3, offset: Coordf::new(123.0, 456.0), ..viewport() };
    let screen = Coordf::new(250.0, 80.0);
    let before = cam.screen2canvas(screen);
    cam.zoom_at(screen, 1.25);
    assert!(approx(cam.screen2canvas(screen), before, 1e-6));
    assert!((cam.scale - 1.25e-3).abs() < 1e-15);
}

#[test]
fn zoom_is_clamped() {
    let mut cam = viewport();
    cam.zoom_at(Coordf::new(0.0, 0.0), 1e12);
    assert_eq!(cam.scale, MAX_SCALE);
}

#[test]
fn pan_shifts_offset() {
    let mut cam = viewport();
    cam.pan(Coordf::new(5.0, -3.0));
    assert_eq!(cam.offset, Coordf::new(5.0, -3.0));
}
