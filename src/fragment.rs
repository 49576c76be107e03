//! Content-addressed cache of placement-independent tessellation results.
//!
//! A [`Fragment`] is the triangle list produced for a sub-object in its own
//! local frame (a pad shape, a package's silkscreen). It is keyed by a
//! [`Fingerprint`]: a SHA-256 digest over every input that influences the
//! triangles (geometry, style, layers, tessellation resolution) but never the
//! placement. The caller applies the active transform when emitting the
//! fragment, so identical footprint instances share one entry.
//!
//! Entries are never evicted. A changed sub-object hashes to a new
//! fingerprint and simply misses; nothing is cleared wholesale.

#[cfg(test)]
#[path = "fragment_test.rs"]
mod fragment_test;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::geom::{BBox, Coordf, Coordi};
use crate::layer::LayerId;
use crate::tessellate::Tri;
use crate::triangle::{ColorP, TriangleFlags, TriangleType};

/// SHA-256 digest identifying a fragment's inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Incremental fingerprint construction. Every field is written with a type
/// tag (and strings with their length). Variable-length lists must be
/// preceded by a section name and their count, otherwise two different
/// lists can flatten to the same field sequence.
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    /// Start a fingerprint for fragments of the given kind (e.g. `"pad"`).
    #[must_use]
    pub fn new(kind: &str) -> Self {
        let mut b = Self { hasher: Sha256::new() };
        b = b.str(kind);
        b
    }

    #[must_use]
    pub fn i64(mut self, v: i64) -> Self {
        self.hasher.update([b'i']);
        self.hasher.update(v.to_le_bytes());
        self
    }

    #[must_use]
    pub fn f64(mut self, v: f64) -> Self {
        self.hasher.update([b'f']);
        self.hasher.update(v.to_bits().to_le_bytes());
        self
    }

    #[must_use]
    pub fn bool(mut self, v: bool) -> Self {
        self.hasher.update([b'b', u8::from(v)]);
        self
    }

    #[must_use]
    pub fn layer(self, layer: LayerId) -> Self {
        self.i64(i64::from(layer))
    }

    #[must_use]
    pub fn coord(self, c: Coordi) -> Self {
        self.i64(c.x).i64(c.y)
    }

    #[must_use]
    pub fn str(mut self, s: &str) -> Self {
        self.hasher.update([b's']);
        self.hasher.update((s.len() as u64).to_le_bytes());
        self.hasher.update(s.as_bytes());
        self
    }

    #[must_use]
    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finalize().into())
    }
}

/// One triangle of a fragment, in the fragment's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentTriangle {
    pub layer: LayerId,
    pub p: Tri,
    pub color: ColorP,
    pub kind: TriangleType,
    pub flags: TriangleFlags,
}

/// Placement-independent tessellation result plus its local extents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub triangles: Vec<FragmentTriangle>,
    pub extents: BBox,
}

impl Fragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append filled triangles on `layer`.
    pub fn extend(&mut self, layer: LayerId, tris: Vec<Tri>, color: ColorP, kind: TriangleType) {
        for p in tris {
            self.extents = self.extents.including(p[0]).including(p[1]).including(p[2]);
            self.triangles.push(FragmentTriangle { layer, p, color, kind, flags: TriangleFlags::empty() });
        }
    }

    /// Append a hairline segment on `layer`.
    pub fn hairline(&mut self, layer: LayerId, a: Coordf, b: Coordf, color: ColorP, kind: TriangleType) {
        self.extents = self.extents.including(a).including(b);
        self.triangles.push(FragmentTriangle { layer, p: [a, b, a], color, kind, flags: TriangleFlags::LINE });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Single-threaded fragment cache owned by a canvas.
#[derive(Debug, Default)]
pub struct FragmentCache {
    entries: HashMap<Fingerprint, Arc<Fragment>>,
    hits: u64,
    misses: u64,
}

impl FragmentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached fragment for `fp`, invoking `builder` only on a miss.
    pub fn get_or_compute(&mut self, fp: Fingerprint, builder: impl FnOnce() -> Fragment) -> Arc<Fragment> {
        if let Some(frag) = self.entries.get(&fp) {
            self.hits += 1;
            trace!(%fp, "fragment cache hit");
            return Arc::clone(frag);
        }
        self.misses += 1;
        let frag = Arc::new(builder());
        trace!(%fp, triangles = frag.len(), "fragment cache miss");
        self.entries.insert(fp, Arc::clone(&frag));
        frag
    }

    #[must_use]
    pub fn get(&self, fp: &Fingerprint) -> Option<Arc<Fragment>> {
        self.entries.get(fp).cloned()
    }

    /// Drop one entry. Returns `true` if it was present.
    pub fn invalidate(&mut self, fp: &Fingerprint) -> bool {
        self.entries.remove(fp).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats { hits: self.hits, misses: self.misses, entries: self.entries.len() }
    }
}

/// Thread-safe fragment cache for background tessellation.
///
/// At most one builder runs per fingerprint: concurrent callers for the same
/// fingerprint block on the in-flight computation and receive its result.
/// The map lock is held only to look up or insert the per-entry cell, never
/// while a builder runs.
#[derive(Debug, Default)]
pub struct SharedFragmentCache {
    entries: Mutex<HashMap<Fingerprint, Arc<OnceLock<Arc<Fragment>>>>>,
}

impl SharedFragmentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&self, fp: Fingerprint, builder: impl FnOnce() -> Fragment) -> Arc<Fragment> {
        let cell = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(fp).or_default())
        };
        Arc::clone(cell.get_or_init(|| {
            trace!(%fp, "shared fragment cache miss");
            Arc::new(builder())
        }))
    }

    /// Number of fingerprints seen, including ones still being computed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The cache a canvas draws fragments from: its own, or one shared with
/// background rebuilds.
#[derive(Debug)]
pub enum FragmentStore {
    Local(FragmentCache),
    Shared(Arc<SharedFragmentCache>),
}

impl Default for FragmentStore {
    fn default() -> Self {
        Self::Local(FragmentCache::new())
    }
}

impl FragmentStore {
    pub fn get_or_compute(&mut self, fp: Fingerprint, builder: impl FnOnce() -> Fragment) -> Arc<Fragment> {
        match self {
            Self::Local(cache) => cache.get_or_compute(fp, builder),
            Self::Shared(cache) => cache.get_or_compute(fp, builder),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Local(cache) => cache.len(),
            Self::Shared(cache) => cache.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
