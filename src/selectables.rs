//! Hit-test proxies for the interactive parts of the scene.
//!
//! Three containers move together: `items` (bbox + flags, dense), `items_ref`
//! (index to key) and `items_map` (key to index). Every mutation goes through
//! methods here so the two maps stay mutually inverse over the live entries.
//! Removal is swap-remove with the moved entry's map slot fixed up.

#[cfg(test)]
#[path = "selectables_test.rs"]
mod selectables_test;

use std::collections::{HashMap, HashSet};
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::doc::ObjectType;
use crate::error::SceneError;
use crate::geom::{BBox, Coordf};

/// Key of a selectable: owning object uuid, kind, and vertex/sub-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectableRef {
    pub uuid: Uuid,
    pub kind: ObjectType,
    pub vertex: u32,
}

impl SelectableRef {
    #[must_use]
    pub fn new(uuid: Uuid, kind: ObjectType, vertex: u32) -> Self {
        Self { uuid, kind, vertex }
    }
}

impl fmt::Display for SelectableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({}#{})", self.kind, self.uuid, self.vertex)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SelectableFlags: u8 {
        const SELECTED = 0b01;
        const PRELIGHT = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selectable {
    /// Bounding box in document space.
    pub bbox: BBox,
    pub flags: SelectableFlags,
}

/// Per-kind enable switch consulted by picking and box selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    disabled: HashSet<ObjectType>,
}

impl SelectionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&mut self, kind: ObjectType, enabled: bool) {
        if enabled {
            self.disabled.remove(&kind);
        } else {
            self.disabled.insert(kind);
        }
    }

    #[must_use]
    pub fn allows(&self, kind: ObjectType) -> bool {
        !self.disabled.contains(&kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selectables {
    items: Vec<Selectable>,
    items_ref: Vec<SelectableRef>,
    items_map: HashMap<SelectableRef, usize>,
}

impl Selectables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Register a selectable.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateKey`] if `key` is already present; the index is
    /// left unchanged.
    pub fn add(&mut self, key: SelectableRef, bbox: BBox) -> Result<usize, SceneError> {
        if self.items_map.contains_key(&key) {
            warn!(%key, "rejected duplicate selectable");
            return Err(SceneError::DuplicateKey { key });
        }
        let idx = self.items.len();
        self.items.push(Selectable { bbox, flags: SelectableFlags::empty() });
        self.items_ref.push(key);
        self.items_map.insert(key, idx);
        Ok(idx)
    }

    /// Remove one entry, returning it if it existed.
    pub fn remove(&mut self, key: &SelectableRef) -> Option<Selectable> {
        let idx = self.items_map.remove(key)?;
        let removed = self.items.swap_remove(idx);
        self.items_ref.swap_remove(idx);
        if let Some(moved) = self.items_ref.get(idx) {
            self.items_map.insert(*moved, idx);
        }
        Some(removed)
    }

    /// Remove every entry whose key matches `pred`. Returns how many went.
    pub fn remove_where(&mut self, pred: impl Fn(&SelectableRef) -> bool) -> usize {
        let doomed: Vec<SelectableRef> = self.items_ref.iter().filter(|k| pred(k)).copied().collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Remove every entry owned by `uuid`.
    pub fn remove_owned_by(&mut self, uuid: Uuid) -> usize {
        self.remove_where(|k| k.uuid == uuid)
    }

    #[must_use]
    pub fn get(&self, key: &SelectableRef) -> Option<&Selectable> {
        self.items_map.get(key).map(|&i| &self.items[i])
    }

    #[must_use]
    pub fn contains(&self, key: &SelectableRef) -> bool {
        self.items_map.contains_key(key)
    }

    /// Set or clear `flag` on `key`. Returns `false` for unknown keys.
    pub fn set_flag(&mut self, key: &SelectableRef, flag: SelectableFlags, value: bool) -> bool {
        match self.items_map.get(key) {
            Some(&i) => {
                self.items[i].flags.set(flag, value);
                true
            }
            None => false,
        }
    }

    /// `false` for unknown keys.
    #[must_use]
    pub fn get_flag(&self, key: &SelectableRef, flag: SelectableFlags) -> bool {
        self.get(key).is_some_and(|s| s.flags.contains(flag))
    }

    /// Clear `flags` on every entry.
    pub fn clear_flags(&mut self, flags: SelectableFlags) {
        for item in &mut self.items {
            item.flags.remove(flags);
        }
    }

    /// Keys carrying `flag`, in insertion-independent sorted order.
    #[must_use]
    pub fn with_flag(&self, flag: SelectableFlags) -> Vec<SelectableRef> {
        let mut keys: Vec<SelectableRef> = self
            .items
            .iter()
            .zip(&self.items_ref)
            .filter(|(s, _)| s.flags.contains(flag))
            .map(|(_, k)| *k)
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SelectableRef, &Selectable)> {
        self.items_ref.iter().zip(&self.items)
    }

    /// Keys whose bbox contains `p`.
    #[must_use]
    pub fn query_point(&self, p: Coordf) -> Vec<SelectableRef> {
        self.iter().filter(|(_, s)| s.bbox.contains(p)).map(|(k, _)| *k).collect()
    }

    /// Keys whose bbox overlaps the square of half-size `tolerance` around `p`.
    #[must_use]
    pub fn query_near(&self, p: Coordf, tolerance: f64) -> Vec<SelectableRef> {
        self.query_box(&BBox::around(p, tolerance))
    }

    /// Keys whose bbox overlaps `area`.
    #[must_use]
    pub fn query_box(&self, area: &BBox) -> Vec<SelectableRef> {
        self.iter().filter(|(_, s)| s.bbox.overlaps(area)).map(|(k, _)| *k).collect()
    }

    /// Keys whose bbox lies entirely inside `area`.
    #[must_use]
    pub fn query_enclosed(&self, area: &BBox) -> Vec<SelectableRef> {
        self.iter().filter(|(_, s)| area.encloses(&s.bbox)).map(|(k, _)| *k).collect()
    }

    /// Single pick under the cursor: the innermost (smallest-area) selectable
    /// near `p` that the filter allows. Equal areas go to the later entry.
    #[must_use]
    pub fn pick(&self, p: Coordf, tolerance: f64, filter: &SelectionFilter) -> Option<SelectableRef> {
        let area = BBox::around(p, tolerance);
        let mut best: Option<(f64, SelectableRef)> = None;
        for (key, sel) in self.iter() {
            if !filter.allows(key.kind) || !sel.bbox.overlaps(&area) {
                continue;
            }
            let a = sel.bbox.area();
            if best.is_none_or(|(best_area, _)| a <= best_area) {
                best = Some((a, *key));
            }
        }
        best.map(|(_, k)| k)
    }

    /// Reset all three containers together.
    pub fn clear(&mut self) {
        self.items.clear();
        self.items_ref.clear();
        self.items_map.clear();
    }

    /// `items_map` and `items_ref` are inverse bijections over `items`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.items.len() == self.items_ref.len()
            && self.items_map.len() == self.items_ref.len()
            && self.items_ref.iter().enumerate().all(|(i, k)| self.items_map.get(k) == Some(&i))
    }
}
