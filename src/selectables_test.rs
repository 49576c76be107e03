use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

fn key(kind: ObjectType, vertex: u32) -> SelectableRef {
    SelectableRef::new(Uuid::from_u128(7), kind, vertex)
}

fn square(x: f64, y: f64, half: f64) -> BBox {
    BBox::around(Coordf::new(x, y), half)
}

// =============================================================
// add / remove
// =============================================================

#[test]
fn add_then_lookup() {
    let mut sel = Selectables::new();
    let k = key(ObjectType::Pad, 0);
    assert_eq!(sel.add(k, square(0.0, 0.0, 1.0)).unwrap(), 0);
    assert!(sel.contains(&k));
    assert_eq!(sel.get(&k).unwrap().bbox, square(0.0, 0.0, 1.0));
    assert!(sel.is_consistent());
}

#[test]
fn duplicate_key_is_rejected_and_index_unchanged() {
    let mut sel = Selectables::new();
    let k = key(ObjectType::Pad, 0);
    sel.add(k, square(0.0, 0.0, 1.0)).unwrap();
    let err = sel.add(k, square(5.0, 5.0, 1.0)).unwrap_err();
    assert_eq!(err, SceneError::DuplicateKey { key: k });
    assert_eq!(sel.len(), 1);
    assert_eq!(sel.get(&k).unwrap().bbox, square(0.0, 0.0, 1.0));
}

#[test]
fn same_uuid_different_vertex_is_distinct() {
    let mut sel = Selectables::new();
    sel.add(key(ObjectType::PolygonVertex, 0), square(0.0, 0.0, 1.0)).unwrap();
    sel.add(key(ObjectType::PolygonVertex, 1), square(0.0, 0.0, 1.0)).unwrap();
    assert_eq!(sel.len(), 2);
}

#[test]
fn remove_fixes_up_moved_entry() {
    let mut sel = Selectables::new();
    let a = key(ObjectType::Pad, 0);
    let b = key(ObjectType::Pad, 1);
    let c = key(ObjectType::Pad, 2);
    sel.add(a, square(0.0, 0.0, 1.0)).unwrap();
    sel.add(b, square(10.0, 0.0, 1.0)).unwrap();
    sel.add(c, square(20.0, 0.0, 1.0)).unwrap();
    sel.set_flag(&c, SelectableFlags::SELECTED, true);

    assert!(sel.remove(&a).is_some());
    assert!(sel.is_consistent());
    assert!(sel.get_flag(&c, SelectableFlags::SELECTED));
    assert_eq!(sel.get(&c).unwrap().bbox, square(20.0, 0.0, 1.0));
    assert!(sel.remove(&a).is_none());
}

#[test]
fn remove_owned_by_only_touches_that_uuid() {
    let mut sel = Selectables::new();
    let other = SelectableRef::new(Uuid::from_u128(9), ObjectType::Track, 0);
    sel.add(key(ObjectType::Pad, 0), square(0.0, 0.0, 1.0)).unwrap();
    sel.add(key(ObjectType::BoardPackage, 0), square(0.0, 0.0, 5.0)).unwrap();
    sel.add(other, square(0.0, 0.0, 1.0)).unwrap();
    assert_eq!(sel.remove_owned_by(Uuid::from_u128(7)), 2);
    assert_eq!(sel.len(), 1);
    assert!(sel.contains(&other));
    assert!(sel.is_consistent());
}

#[test]
fn clear_resets_everything() {
    let mut sel = Selectables::new();
    sel.add(key(ObjectType::Via, 0), square(0.0, 0.0, 1.0)).unwrap();
    sel.clear();
    assert!(sel.is_empty());
    assert!(sel.is_consistent());
    assert!(sel.add(key(ObjectType::Via, 0), square(0.0, 0.0, 1.0)).is_ok());
}

#[test]
fn random_add_remove_keeps_bijection() {
    let mut rng = StdRng::seed_from_u64(0x5e1e_c7ab);
    let mut sel = Selectables::new();
    let mut live = std::collections::HashSet::new();
    for _ in 0..2000 {
        let k = SelectableRef::new(Uuid::from_u128(rng.random_range(0..16)), ObjectType::Pad, rng.random_range(0..8));
        if rng.random_bool(0.6) {
            let res = sel.add(k, square(0.0, 0.0, 1.0));
            assert_eq!(res.is_ok(), live.insert(k));
        } else {
            assert_eq!(sel.remove(&k).is_some(), live.remove(&k));
        }
        assert!(sel.is_consistent());
        assert_eq!(sel.len(), live.len());
    }
    assert!(live.iter().all(|k| sel.contains(k)));
}

// =============================================================
// Flags
// =============================================================

#[test]
fn flags_on_unknown_key_are_ignored() {
    let mut sel = Selectables::new();
    assert!(!sel.set_flag(&key(ObjectType::Pad, 0), SelectableFlags::SELECTED, true));
    assert!(!sel.get_flag(&key(ObjectType::Pad, 0), SelectableFlags::SELECTED));
}

#[test]
fn with_flag_and_clear_flags() {
    let mut sel = Selectables::new();
    let a = key(ObjectType::Pad, 0);
    let b = key(ObjectType::Pad, 1);
    sel.add(a, square(0.0, 0.0, 1.0)).unwrap();
    sel.add(b, square(0.0, 0.0, 1.0)).unwrap();
    sel.set_flag(&a, SelectableFlags::SELECTED | SelectableFlags::PRELIGHT, true);
    sel.set_flag(&b, SelectableFlags::PRELIGHT, true);
    assert_eq!(sel.with_flag(SelectableFlags::SELECTED), vec![a]);
    sel.clear_flags(SelectableFlags::PRELIGHT);
    assert!(sel.with_flag(SelectableFlags::PRELIGHT).is_empty());
    assert!(sel.get_flag(&a, SelectableFlags::SELECTED));
}

// =============================================================
// Spatial queries
// =============================================================

#[test]
fn query_point_and_box() {
    let mut sel = Selectables::new();
    let a = key(ObjectType::Pad, 0);
    let b = key(ObjectType::Pad, 1);
    sel.add(a, square(0.0, 0.0, 1.0)).unwrap();
    sel.add(b, square(10.0, 0.0, 1.0)).unwrap();
    assert_eq!(sel.query_point(Coordf::new(0.5, 0.5)), vec![a]);
    assert!(sel.query_point(Coordf::new(5.0, 0.0)).is_empty());
    assert_eq!(sel.query_near(Coordf::new(5.0, 0.0), 4.0).len(), 2);
    let enclosing = BBox::from_corners(Coordf::new(-2.0, -2.0), Coordf::new(2.0, 2.0));
    assert_eq!(sel.query_enclosed(&enclosing), vec![a]);
}

#[test]
fn pick_prefers_smallest_area() {
    let mut sel = Selectables::new();
    let package = key(ObjectType::BoardPackage, 0);
    let pad = key(ObjectType::Pad, 0);
    sel.add(package, square(0.0, 0.0, 100.0)).unwrap();
    sel.add(pad, square(10.0, 0.0, 5.0)).unwrap();
    assert_eq!(sel.pick(Coordf::new(10.0, 0.0), 0.0, &SelectionFilter::new()), Some(pad));
    assert_eq!(sel.pick(Coordf::new(-50.0, 0.0), 0.0, &SelectionFilter::new()), Some(package));
    assert_eq!(sel.pick(Coordf::new(500.0, 0.0), 0.0, &SelectionFilter::new()), None);
}

#[test]
fn pick_respects_filter() {
    let mut sel = Selectables::new();
    let package = key(ObjectType::BoardPackage, 0);
    sel.add(package, square(0.0, 0.0, 100.0)).unwrap();
    sel.add(key(ObjectType::Pad, 0), square(0.0, 0.0, 5.0)).unwrap();
    let mut filter = SelectionFilter::new();
    filter.set_enabled(ObjectType::Pad, false);
    assert_eq!(sel.pick(Coordf::new(0.0, 0.0), 0.0, &filter), Some(package));
    filter.set_enabled(ObjectType::Pad, true);
    assert!(filter.allows(ObjectType::Pad));
}

#[test]
fn display_names_kind_and_vertex() {
    let s = key(ObjectType::Pad, 3).to_string();
    assert!(s.starts_with("Pad("));
    assert!(s.ends_with("#3)"));
}
