//! Scene buffer: per-layer triangle storage and the `object_refs` arena.
//!
//! Every object that emits triangles gets an arena slot. Triangles are tagged
//! with the slot and generation of the innermost object that emitted them.
//! Re-rendering an object invalidates its slot (bumping the generation) and
//! all of its descendants in O(subtree), then appends the replacement
//! triangles; nothing is shifted. Dead triangles stay in storage until
//! [`SceneBuffer::compact`] drops them and rebuilds every range from the tags.
//!
//! Ranges are per layer, half-open, and cover every live triangle emitted
//! while the object was on the object stack (its own and its descendants').
//! Hidden objects keep their triangles; the render predicate skips them.

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::doc::ObjectType;
use crate::geom::BBox;
use crate::layer::LayerId;
use crate::triangle::{OwnerTag, Triangle, TriangleFlags};

/// Identity of a logical object in the scene: uuid, kind, optional sub-index
/// (a pad's index inside its package, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub uuid: Uuid,
    pub kind: ObjectType,
    pub sub: Option<u32>,
}

impl ObjectRef {
    #[must_use]
    pub fn new(uuid: Uuid, kind: ObjectType) -> Self {
        Self { uuid, kind, sub: None }
    }

    #[must_use]
    pub fn with_sub(uuid: Uuid, kind: ObjectType, sub: u32) -> Self {
        Self { uuid, kind, sub: Some(sub) }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(s) => write!(f, "{:?}({}/{s})", self.kind, self.uuid),
            None => write!(f, "{:?}({})", self.kind, self.uuid),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    object: ObjectRef,
    generation: u32,
    live: bool,
    hidden: bool,
    parent: Option<u32>,
    children: Vec<u32>,
    /// Live triangles tagged with this slot.
    owned: usize,
    ranges: BTreeMap<LayerId, Range<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferStats {
    pub live_triangles: usize,
    pub dead_triangles: usize,
    pub objects: usize,
    pub degenerate_dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SceneBuffer {
    layers: BTreeMap<LayerId, Vec<Triangle>>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    object_refs: HashMap<ObjectRef, u32>,
    stack: Vec<u32>,
    live: usize,
    dead: usize,
    degenerate_dropped: usize,
}

impl SceneBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all triangles and objects.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.slots.clear();
        self.free.clear();
        self.object_refs.clear();
        self.stack.clear();
        self.live = 0;
        self.dead = 0;
        self.degenerate_dropped = 0;
    }

    // --- Object stack ---

    /// Open `object` as a child of the current stack top and make it current.
    ///
    /// An object that is already live is invalidated first, so re-rendering
    /// replaces exactly its own triangles.
    pub fn begin_object(&mut self, object: ObjectRef) {
        self.invalidate(&object);
        let parent = self.stack.last().copied();
        let slot = if let Some(idx) = self.free.pop() {
            let s = &mut self.slots[idx as usize];
            s.object = object;
            s.live = true;
            s.hidden = false;
            s.parent = parent;
            s.children.clear();
            s.owned = 0;
            s.ranges.clear();
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                object,
                generation: 0,
                live: true,
                hidden: false,
                parent,
                children: Vec::new(),
                owned: 0,
                ranges: BTreeMap::new(),
            });
            idx
        };
        if let Some(p) = parent {
            self.slots[p as usize].children.push(slot);
        }
        self.object_refs.insert(object, slot);
        self.stack.push(slot);
    }

    /// Make an existing live object current again without invalidating it,
    /// so new triangles extend its ranges. Returns `false` if it is not live.
    pub fn enter(&mut self, object: &ObjectRef) -> bool {
        match self.object_refs.get(object) {
            Some(&slot) => {
                self.stack.push(slot);
                true
            }
            None => false,
        }
    }

    /// Close the current object.
    pub fn end_object(&mut self) {
        self.stack.pop();
    }

    /// The object triangles are currently attributed to.
    #[must_use]
    pub fn current_object(&self) -> Option<ObjectRef> {
        self.stack.last().map(|&s| self.slots[s as usize].object)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    // --- Triangles ---

    /// Append `tri` to `layer`, tagging it with the current object and
    /// extending the ranges of every object on the stack. Degenerate
    /// triangles are dropped. Returns whether the triangle was stored.
    pub fn push(&mut self, layer: LayerId, mut tri: Triangle) -> bool {
        if tri.is_degenerate() {
            self.degenerate_dropped += 1;
            trace!(layer, "dropped degenerate triangle");
            return false;
        }
        tri.owner = self.stack.last().map(|&slot| OwnerTag { slot, generation: self.slots[slot as usize].generation });
        let tris = self.layers.entry(layer).or_default();
        let idx = tris.len();
        tris.push(tri);
        for &slot in &self.stack {
            extend_range(&mut self.slots[slot as usize].ranges, layer, idx);
        }
        if let Some(&top) = self.stack.last() {
            self.slots[top as usize].owned += 1;
        }
        self.live += 1;
        true
    }

    /// Raw storage for one layer, dead triangles included.
    #[must_use]
    pub fn layer_triangles(&self, layer: LayerId) -> &[Triangle] {
        self.layers.get(&layer).map_or(&[], Vec::as_slice)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.keys().copied()
    }

    /// Triangle not superseded by a re-render or removal.
    #[must_use]
    pub fn is_live(&self, tri: &Triangle) -> bool {
        match tri.owner {
            None => true,
            Some(tag) => self
                .slots
                .get(tag.slot as usize)
                .is_some_and(|s| s.live && s.generation == tag.generation),
        }
    }

    /// Live and not hidden through its owner or any ancestor.
    #[must_use]
    pub fn is_shown(&self, tri: &Triangle) -> bool {
        if !self.is_live(tri) {
            return false;
        }
        let mut cur = tri.owner.map(|t| t.slot);
        while let Some(slot) = cur {
            let s = &self.slots[slot as usize];
            if s.hidden {
                return false;
            }
            cur = s.parent;
        }
        true
    }

    /// Live triangles of `layer` that are not hidden.
    pub fn visible_triangles(&self, layer: LayerId) -> impl Iterator<Item = &Triangle> + '_ {
        self.layer_triangles(layer).iter().filter(|t| self.is_shown(t))
    }

    // --- Objects ---

    #[must_use]
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.object_refs.contains_key(object)
    }

    /// Per-layer ranges of a live object; `None` once it is gone.
    #[must_use]
    pub fn ranges(&self, object: &ObjectRef) -> Option<&BTreeMap<LayerId, Range<usize>>> {
        self.object_refs.get(object).map(|&s| &self.slots[s as usize].ranges)
    }

    /// Live triangles of `object` (and its descendants) on `layer`.
    pub fn object_triangles(&self, object: &ObjectRef, layer: LayerId) -> Vec<&Triangle> {
        let Some(&slot) = self.object_refs.get(object) else {
            return Vec::new();
        };
        let Some(range) = self.slots[slot as usize].ranges.get(&layer) else {
            return Vec::new();
        };
        self.layer_triangles(layer)[range.clone()]
            .iter()
            .filter(|t| self.is_live(t) && self.owned_by(t, slot))
            .collect()
    }

    /// Invalidate `object` and its descendants. Their triangles become dead
    /// and their refs disappear. Returns `false` if the object was not live.
    pub fn invalidate(&mut self, object: &ObjectRef) -> bool {
        let Some(&slot) = self.object_refs.get(object) else {
            return false;
        };
        if let Some(parent) = self.slots[slot as usize].parent {
            self.slots[parent as usize].children.retain(|&c| c != slot);
        }
        let mut pending = vec![slot];
        while let Some(s) = pending.pop() {
            let entry = &mut self.slots[s as usize];
            entry.live = false;
            entry.generation = entry.generation.wrapping_add(1);
            self.live -= entry.owned;
            self.dead += entry.owned;
            entry.owned = 0;
            entry.ranges.clear();
            pending.append(&mut entry.children);
            self.object_refs.remove(&entry.object);
            self.free.push(s);
        }
        true
    }

    /// Hide or show `object`. Returns `false` for unknown objects.
    pub fn set_hidden(&mut self, object: &ObjectRef, hidden: bool) -> bool {
        match self.object_refs.get(object) {
            Some(&s) => {
                self.slots[s as usize].hidden = hidden;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_hidden(&self, object: &ObjectRef) -> bool {
        self.object_refs.get(object).is_some_and(|&s| self.slots[s as usize].hidden)
    }

    /// Un-hide every object.
    pub fn show_all(&mut self) {
        for s in &mut self.slots {
            s.hidden = false;
        }
    }

    /// Set then clear flag bits on every live triangle of `object`.
    pub fn set_flags(&mut self, object: &ObjectRef, set: TriangleFlags, clear: TriangleFlags) -> bool {
        let Some(&slot) = self.object_refs.get(object) else {
            return false;
        };
        let ranges: Vec<(LayerId, Range<usize>)> =
            self.slots[slot as usize].ranges.iter().map(|(l, r)| (*l, r.clone())).collect();
        for (layer, range) in ranges {
            let members: Vec<usize> = range
                .filter(|&i| {
                    let t = &self.layer_triangles(layer)[i];
                    self.is_live(t) && self.owned_by(t, slot)
                })
                .collect();
            if let Some(tris) = self.layers.get_mut(&layer) {
                for i in members {
                    tris[i].flags.insert(set);
                    tris[i].flags.remove(clear);
                }
            }
        }
        true
    }

    /// Set then clear flag bits on every stored triangle.
    pub fn set_flags_all(&mut self, set: TriangleFlags, clear: TriangleFlags) {
        for tri in self.layers.values_mut().flatten() {
            tri.flags.insert(set);
            tri.flags.remove(clear);
        }
    }

    /// Extents of live triangles accepted by `filter`.
    pub fn bbox(&self, filter: impl Fn(LayerId, &Triangle) -> bool) -> BBox {
        let mut bb = BBox::EMPTY;
        for (&layer, tris) in &self.layers {
            for t in tris.iter().filter(|t| self.is_live(t) && filter(layer, t)) {
                bb = bb.union(t.bbox());
            }
        }
        bb
    }

    // --- Maintenance ---

    /// Drop dead triangles and rebuild every range from the owner tags.
    pub fn compact(&mut self) {
        let dropped = self.dead;
        let mut layers = std::mem::take(&mut self.layers);
        for tris in layers.values_mut() {
            tris.retain(|t| self.is_live(t));
        }
        layers.retain(|_, tris| !tris.is_empty());
        for s in &mut self.slots {
            s.ranges.clear();
        }
        for (&layer, tris) in &layers {
            for (idx, t) in tris.iter().enumerate() {
                let mut cur = t.owner.map(|o| o.slot);
                while let Some(slot) = cur {
                    let s = &mut self.slots[slot as usize];
                    extend_range(&mut s.ranges, layer, idx);
                    cur = s.parent;
                }
            }
        }
        self.layers = layers;
        self.dead = 0;
        debug!(dropped, live = self.live, "compacted scene buffer");
    }

    /// Compact when dead triangles exceed both `min_dead` and the live count.
    pub fn maybe_compact(&mut self, min_dead: usize) -> bool {
        if self.dead > min_dead && self.dead > self.live {
            self.compact();
            return true;
        }
        false
    }

    #[must_use]
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            live_triangles: self.live,
            dead_triangles: self.dead,
            objects: self.object_refs.len(),
            degenerate_dropped: self.degenerate_dropped,
        }
    }

    fn owned_by(&self, tri: &Triangle, ancestor: u32) -> bool {
        let mut cur = tri.owner.map(|t| t.slot);
        while let Some(slot) = cur {
            if slot == ancestor {
                return true;
            }
            cur = self.slots[slot as usize].parent;
        }
        false
    }
}

fn extend_range(ranges: &mut BTreeMap<LayerId, Range<usize>>, layer: LayerId, idx: usize) {
    ranges
        .entry(layer)
        .and_modify(|r| {
            r.start = r.start.min(idx);
            r.end = r.end.max(idx + 1);
        })
        .or_insert(idx..idx + 1);
}
