//! Snap targets and the nearest-target search.

#[cfg(test)]
#[path = "target_test.rs"]
mod target_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::doc::ObjectType;
use crate::geom::{Coordf, Coordi};
use crate::selectables::{SelectableFlags, SelectableRef, Selectables};

/// A snap candidate: a document point with the identity of what it belongs to.
///
/// `path` is the owning uuid chain, outermost first: a pad target on a board
/// carries `[board package, pad]`, a pin target `[schematic symbol, pin]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: ObjectType,
    pub path: Vec<Uuid>,
    pub vertex: u32,
    pub p: Coordi,
}

impl Target {
    #[must_use]
    pub fn new(kind: ObjectType, path: Vec<Uuid>, vertex: u32, p: Coordi) -> Self {
        Self { kind, path, vertex, p }
    }

    /// Selectable keys whose SELECTED flag blocks this target while selection
    /// is locked. A pin or pad is not selectable itself; its owning instance
    /// is. A polygon edge maps to the vertex it starts at.
    #[must_use]
    pub fn exclusion_keys(&self) -> Vec<SelectableRef> {
        let Some(&owner) = self.path.first() else {
            return Vec::new();
        };
        let mut keys = vec![SelectableRef::new(owner, self.kind, self.vertex)];
        match self.kind {
            ObjectType::SymbolPin => keys.push(SelectableRef::new(owner, ObjectType::SchematicSymbol, 0)),
            ObjectType::Pad => keys.push(SelectableRef::new(owner, ObjectType::BoardPackage, 0)),
            ObjectType::PolygonEdge => keys.push(SelectableRef::new(owner, ObjectType::PolygonVertex, self.vertex)),
            _ => {}
        }
        keys
    }

    fn is_excluded(&self, selectables: &Selectables) -> bool {
        self.exclusion_keys().iter().any(|k| selectables.get_flag(k, SelectableFlags::SELECTED))
    }
}

/// Index and distance of the closest eligible target to `p`.
///
/// With `selection_allowed == false`, targets whose underlying selectable is
/// SELECTED are skipped. The caller decides whether the distance is within
/// its pick radius.
#[must_use]
pub fn nearest_target(
    targets: &[Target],
    p: Coordf,
    selectables: &Selectables,
    selection_allowed: bool,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, t) in targets.iter().enumerate() {
        let d_sq = (t.p.to_f() - p).mag_sq();
        if best.is_some_and(|(_, b)| d_sq >= b) {
            continue;
        }
        if !selection_allowed && t.is_excluded(selectables) {
            continue;
        }
        best = Some((i, d_sq));
    }
    best.map(|(i, d_sq)| (i, d_sq.sqrt()))
}

/// First target exactly at `p`.
#[must_use]
pub fn target_at(targets: &[Target], p: Coordi) -> Option<usize> {
    targets.iter().position(|t| t.p == p)
}

/// Round `p` to the nearest multiple of `spacing` on both axes.
/// Non-positive spacing only rounds to the nearest document unit.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn snap_to_grid(p: Coordf, spacing: i64) -> Coordi {
    if spacing <= 0 {
        return p.round();
    }
    let sp = spacing as f64;
    let snap = |v: f64| ((v / sp).round() as i64).saturating_mul(spacing);
    Coordi::new(snap(p.x), snap(p.y))
}
