#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn empty_lookup_gives_defaults() {
    let cfg = CanvasConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg, CanvasConfig::default());
    assert_eq!(cfg.pick_radius_px, 30.0);
    assert_eq!(cfg.fine_grid_divisor, 10);
    assert_eq!(cfg.first_overlay_layer, 30_000);
}

#[test]
fn overrides_are_parsed() {
    let cfg = CanvasConfig::from_lookup(lookup_from(&[
        ("CANVAS_PICK_RADIUS_PX", "12.5"),
        ("CANVAS_GRID_SPACING", " 100000 "),
        ("CANVAS_FINE_GRID_DIVISOR", "4"),
        ("CANVAS_DEFAULT_SCALE", "1e-4"),
        ("CANVAS_FIRST_OVERLAY_LAYER", "50000"),
        ("CANVAS_CIRCLE_SEGMENTS", "64"),
        ("CANVAS_COMPACT_MIN_DEAD", "0"),
    ]))
    .unwrap();
    assert_eq!(cfg.pick_radius_px, 12.5);
    assert_eq!(cfg.grid_spacing, 100_000);
    assert_eq!(cfg.fine_grid_divisor, 4);
    assert_eq!(cfg.default_scale, 1e-4);
    assert_eq!(cfg.first_overlay_layer, 50_000);
    assert_eq!(cfg.circle_segments, 64);
    assert_eq!(cfg.compact_min_dead, 0);
}

#[test]
fn unparseable_value_is_rejected() {
    let err = CanvasConfig::from_lookup(lookup_from(&[("CANVAS_GRID_SPACING", "fine")])).unwrap_err();
    let ConfigError::Invalid { var, value, .. } = err;
    assert_eq!(var, "CANVAS_GRID_SPACING");
    assert_eq!(value, "fine");
}

#[test]
fn non_positive_grid_is_rejected() {
    let err = CanvasConfig::from_lookup(lookup_from(&[("CANVAS_GRID_SPACING", "0")])).unwrap_err();
    assert!(err.to_string().contains("CANVAS_GRID_SPACING"));
}

#[test]
fn negative_pick_radius_is_rejected() {
    assert!(CanvasConfig::from_lookup(lookup_from(&[("CANVAS_PICK_RADIUS_PX", "-1")])).is_err());
}

#[test]
fn too_few_circle_segments_rejected() {
    assert!(CanvasConfig::from_lookup(lookup_from(&[("CANVAS_CIRCLE_SEGMENTS", "2")])).is_err());
}

#[test]
fn default_validates() {
    assert!(CanvasConfig::default().validate().is_ok());
}
