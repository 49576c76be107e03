//! Scene state and the mutation entry points the document layer calls.
//!
//! `Canvas` owns the scene buffer, the selectables index, the target list,
//! the fragment cache, the transform stack and the layer model. The
//! per-kind tessellation lives in [`render`](crate::render); this module
//! holds the shared emission helpers, the scoped guards, and the push
//! contract with the backend.

#[cfg(test)]
#[path = "canvas_test.rs"]
mod canvas_test;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::backend::{LayerFrame, SceneFrame};
use crate::buffer::{ObjectRef, SceneBuffer};
use crate::config::CanvasConfig;
use crate::doc::{DomainObject, Item, ObjectType};
use crate::error::SceneError;
use crate::fragment::{Fragment, FragmentStore, SharedFragmentCache};
use crate::geom::{BBox, Coordf, Coordi};
use crate::layer::{self, LayerDisplay, LayerId, LayerModel};
use crate::placement::Placement;
use crate::selectables::{SelectableRef, Selectables, SelectionFilter};
use crate::target::Target;
use crate::tessellate::{self, Tri};
use crate::transform::TransformStack;
use crate::triangle::{Color, ColorP, Triangle, TriangleFlags, TriangleType};

pub struct Canvas {
    pub(crate) config: CanvasConfig,
    pub(crate) buffer: SceneBuffer,
    pub(crate) selectables: Selectables,
    pub(crate) targets: Vec<Target>,
    pub(crate) fragments: FragmentStore,
    pub(crate) transforms: TransformStack,
    pub(crate) layers: LayerModel,
    /// Type tag given to triangles emitted by `add_triangle`.
    pub(crate) triangle_type_current: TriangleType,
    types_visible: u32,
    selection_filter: SelectionFilter,
    /// Emitted board layers go to the opposite side (inside a flipped package).
    pub(crate) flip_layers: bool,
    flip_view: bool,
    work_layer: LayerId,
    root: Option<ObjectRef>,
    dirty: bool,
    generation: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            layers: LayerModel::new(config.first_overlay_layer),
            config,
            buffer: SceneBuffer::new(),
            selectables: Selectables::new(),
            targets: Vec::new(),
            fragments: FragmentStore::default(),
            transforms: TransformStack::new(),
            triangle_type_current: TriangleType::None,
            types_visible: u32::MAX,
            selection_filter: SelectionFilter::new(),
            flip_layers: false,
            flip_view: false,
            work_layer: layer::TOP_COPPER,
            root: None,
            dirty: false,
            generation: 0,
        }
    }

    /// A canvas drawing fragments from a cache shared with other canvases
    /// (background rebuilds of the same document).
    #[must_use]
    pub fn with_shared_fragments(config: CanvasConfig, cache: Arc<SharedFragmentCache>) -> Self {
        Self { fragments: FragmentStore::Shared(cache), ..Self::new(config) }
    }

    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // --- Document updates ---

    /// Rebuild the whole scene from a root object.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateKey`] if the object produces two selectables with
    /// the same key. Rendering stops there; the transform and object stacks
    /// are balanced and a push is still requested for what was built.
    pub fn update(&mut self, obj: DomainObject<'_>) -> Result<(), SceneError> {
        self.clear_scene();
        let root = ObjectRef::new(obj.uuid(), obj.kind());
        self.root = Some(root);
        let result = self.object_scope(root).render_root(obj);
        self.request_push();
        let stats = self.buffer.stats();
        debug!(
            %root,
            generation = self.generation,
            triangles = stats.live_triangles,
            selectables = self.selectables.len(),
            targets = self.targets.len(),
            "scene rebuilt"
        );
        result
    }

    /// Re-render one child of the current root, replacing exactly its own
    /// triangles, selectables and targets.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateKey`] as for [`update`](Self::update).
    pub fn update_item(&mut self, item: Item<'_>) -> Result<(), SceneError> {
        let uuid = item.uuid();
        self.selectables.remove_owned_by(uuid);
        self.targets.retain(|t| t.path.first() != Some(&uuid));
        let result = match self.root.filter(|r| self.buffer.contains(r)) {
            Some(root) => self.enter_scope(root).render_item(item),
            None => self.render_item(item),
        };
        if self.buffer.maybe_compact(self.config.compact_min_dead) {
            debug!(item = %uuid, "compacted after item update");
        }
        self.request_push();
        debug!(item = %uuid, kind = ?item.kind(), generation = self.generation, "item updated");
        result
    }

    /// Remove an object's triangles, selectables and targets. An object ref
    /// with a sub-index only takes that sub-object's selectable and targets.
    pub fn remove_obj(&mut self, obj: &ObjectRef) -> bool {
        let removed = self.buffer.invalidate(obj);
        let owned_by = |t: &Target| match obj.sub {
            Some(v) => t.path.first() == Some(&obj.uuid) && t.kind == obj.kind && t.vertex == v,
            None => t.path.first() == Some(&obj.uuid),
        };
        let targets_before = self.targets.len();
        self.targets.retain(|t| !owned_by(t));
        let selectables_removed = match obj.sub {
            Some(v) => usize::from(self.selectables.remove(&SelectableRef::new(obj.uuid, obj.kind, v)).is_some()),
            None => self.selectables.remove_owned_by(obj.uuid),
        };
        let changed = removed || selectables_removed > 0 || self.targets.len() != targets_before;
        if changed {
            self.request_push();
        }
        changed
    }

    pub fn hide_obj(&mut self, obj: &ObjectRef) -> bool {
        self.set_hidden(obj, true)
    }

    pub fn show_obj(&mut self, obj: &ObjectRef) -> bool {
        self.set_hidden(obj, false)
    }

    pub fn show_all_obj(&mut self) {
        self.buffer.show_all();
        self.request_push();
    }

    #[must_use]
    pub fn is_hidden(&self, obj: &ObjectRef) -> bool {
        self.buffer.is_hidden(obj)
    }

    fn set_hidden(&mut self, obj: &ObjectRef, hidden: bool) -> bool {
        let known = self.buffer.set_hidden(obj, hidden);
        if known {
            self.request_push();
        }
        known
    }

    /// Set then clear triangle flag bits over an object's ranges.
    pub fn set_flags(&mut self, obj: &ObjectRef, set: TriangleFlags, clear: TriangleFlags) -> bool {
        let known = self.buffer.set_flags(obj, set, clear);
        if known {
            self.request_push();
        }
        known
    }

    pub fn set_flags_all(&mut self, set: TriangleFlags, clear: TriangleFlags) {
        self.buffer.set_flags_all(set, clear);
        self.request_push();
    }

    fn clear_scene(&mut self) {
        self.buffer.clear();
        self.selectables.clear();
        self.targets.clear();
        self.transforms.reset();
        self.flip_layers = false;
        self.root = None;
    }

    // --- Primitives ---

    /// Append one triangle in document space to `layer`, attributed to the
    /// current object and tagged with the current triangle type.
    pub fn add_triangle(&mut self, layer: LayerId, p0: Coordf, p1: Coordf, p2: Coordf, color: ColorP, flags: TriangleFlags) {
        let tri = Triangle { kind: self.triangle_type_current, ..Triangle::new(p0, p1, p2, color, flags) };
        self.buffer.push(layer, tri);
    }

    /// Add a free-standing annotation polyline and return its ref, which
    /// `remove_obj` accepts.
    pub fn add_line(&mut self, points: &[Coordi], width: i64, color: ColorP, layer: LayerId) -> ObjectRef {
        let obj = ObjectRef::new(Uuid::new_v4(), ObjectType::Annotation);
        {
            let mut scope = self.object_scope(obj);
            scope.triangle_type_current = TriangleType::Annotation;
            for seg in points.windows(2) {
                scope.emit_line(layer, seg[0], seg[1], width, color);
            }
        }
        self.request_push();
        obj
    }

    /// Segment under the current transform. Zero width draws a hairline.
    pub fn draw_line(&mut self, a: Coordf, b: Coordf, color: ColorP, layer: LayerId, width: f64) {
        if width > 0.0 {
            let tris = tessellate::line(a, b, width, self.config.circle_segments);
            self.emit_tris(layer, &tris, color);
        } else {
            self.emit_hairline(layer, a, b, color);
        }
    }

    /// Diagonal cross of half-size `size` centred on `p`.
    pub fn draw_cross(&mut self, p: Coordf, size: f64, color: ColorP, layer: LayerId) {
        self.emit_hairline(layer, p + Coordf::new(-size, -size), p + Coordf::new(size, size), color);
        self.emit_hairline(layer, p + Coordf::new(-size, size), p + Coordf::new(size, -size), color);
    }

    /// Axis-aligned plus of half-size `size` centred on `p`.
    pub fn draw_plus(&mut self, p: Coordf, size: f64, color: ColorP, layer: LayerId) {
        self.emit_hairline(layer, p + Coordf::new(-size, 0.0), p + Coordf::new(size, 0.0), color);
        self.emit_hairline(layer, p + Coordf::new(0.0, -size), p + Coordf::new(0.0, size), color);
    }

    /// Outline of the box spanned by two corners.
    pub fn draw_box(&mut self, a: Coordf, b: Coordf, color: ColorP, layer: LayerId) {
        let corners = [a, Coordf::new(b.x, a.y), b, Coordf::new(a.x, b.y)];
        for (&p, &q) in corners.iter().zip(corners.iter().cycle().skip(1)) {
            self.emit_hairline(layer, p, q, color);
        }
    }

    /// Arc from `a0` to `a1` (radians, counter-clockwise).
    pub fn draw_arc(&mut self, center: Coordf, radius: f64, a0: f64, a1: f64, color: ColorP, layer: LayerId, width: f64) {
        let pts = tessellate::arc_points(center, radius, a0, a1, self.config.circle_segments);
        for seg in pts.windows(2) {
            self.draw_line(seg[0], seg[1], color, layer, width);
        }
    }

    // --- Queries ---

    /// Extents of the scene. With `visible_only`, hidden objects, hidden
    /// layers and masked triangle types are left out. Empty scenes give
    /// [`BBox::EMPTY`].
    #[must_use]
    pub fn get_bbox(&self, visible_only: bool) -> BBox {
        self.buffer.bbox(|layer, t| !visible_only || self.is_triangle_visible(layer, t))
    }

    /// The render predicate.
    #[must_use]
    pub fn is_triangle_visible(&self, layer: LayerId, tri: &Triangle) -> bool {
        self.buffer.is_shown(tri) && self.layers.is_visible(layer) && self.is_type_visible(tri.kind)
    }

    #[must_use]
    pub fn buffer(&self) -> &SceneBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn selectables(&self) -> &Selectables {
        &self.selectables
    }

    pub fn selectables_mut(&mut self) -> &mut Selectables {
        &mut self.selectables
    }

    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    #[must_use]
    pub fn transforms(&self) -> &TransformStack {
        &self.transforms
    }

    /// Number of fragments the cache holds.
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    // --- Layers and visibility ---

    pub fn get_overlay_layer(&mut self, layer: LayerId, ignore_flip: bool) -> LayerId {
        self.layers.get_overlay_layer(layer, ignore_flip)
    }

    #[must_use]
    pub fn layers(&self) -> &LayerModel {
        &self.layers
    }

    pub fn set_type_visible(&mut self, kind: TriangleType, visible: bool) {
        if visible {
            self.types_visible |= kind.mask();
        } else {
            self.types_visible &= !kind.mask();
        }
        self.request_push();
    }

    #[must_use]
    pub fn is_type_visible(&self, kind: TriangleType) -> bool {
        self.types_visible & kind.mask() != 0
    }

    pub fn set_layer_display(&mut self, layer: LayerId, display: LayerDisplay) {
        self.layers.set_display(layer, display);
        self.request_push();
    }

    #[must_use]
    pub fn layer_display(&self, layer: LayerId) -> LayerDisplay {
        self.layers.display(layer)
    }

    pub fn set_layer_color(&mut self, layer: LayerId, color: Color) {
        self.layers.set_color(layer, color);
        self.request_push();
    }

    #[must_use]
    pub fn get_layer_color(&self, layer: LayerId) -> Color {
        self.layers.color(layer)
    }

    /// The layer drawn on top of all others.
    pub fn set_work_layer(&mut self, layer: LayerId) {
        self.work_layer = layer;
        self.request_push();
    }

    #[must_use]
    pub fn work_layer(&self) -> LayerId {
        self.work_layer
    }

    /// View the board from below: layers are drawn in reverse order.
    pub fn set_flip_view(&mut self, flip: bool) {
        self.flip_view = flip;
        self.request_push();
    }

    #[must_use]
    pub fn flip_view(&self) -> bool {
        self.flip_view
    }

    #[must_use]
    pub fn selection_filter(&self) -> &SelectionFilter {
        &self.selection_filter
    }

    pub fn selection_filter_mut(&mut self) -> &mut SelectionFilter {
        &mut self.selection_filter
    }

    // --- Push contract ---

    /// Mark the scene as needing re-upload. Every call starts a new generation.
    pub fn request_push(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }

    #[must_use]
    pub fn needs_push(&self) -> bool {
        self.dirty
    }

    /// Clear the pending push, returning whether one was pending.
    pub fn take_push(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Owned copy of what the backend draws: visible triangles on visible
    /// layers, bottom to top (top to bottom when flipped), work layer last.
    #[must_use]
    pub fn snapshot(&self) -> SceneFrame {
        let mut layers: Vec<LayerFrame> = self
            .buffer
            .layer_ids()
            .filter(|&l| self.layers.is_visible(l))
            .filter_map(|layer| {
                let triangles: Vec<Triangle> = self
                    .buffer
                    .layer_triangles(layer)
                    .iter()
                    .filter(|t| self.buffer.is_shown(t) && self.is_type_visible(t.kind))
                    .copied()
                    .collect();
                (!triangles.is_empty()).then(|| LayerFrame {
                    layer,
                    display: self.layers.display(layer),
                    color: self.layers.color(layer),
                    triangles,
                })
            })
            .collect();
        if self.flip_view {
            layers.reverse();
        }
        if let Some(pos) = layers.iter().position(|l| l.layer == self.work_layer) {
            let work = layers.remove(pos);
            layers.push(work);
        }
        SceneFrame { generation: self.generation, layers, flip_view: self.flip_view, work_layer: self.work_layer }
    }

    // --- Scopes ---

    /// Enter `placement` relative to the active transform until the guard drops.
    pub fn transform_scope(&mut self, placement: &Placement) -> TransformScope<'_> {
        self.placed_scope(placement, false)
    }

    /// As [`transform_scope`](Self::transform_scope); `flip` also swaps board
    /// layers to the opposite side for everything emitted inside.
    pub(crate) fn placed_scope(&mut self, placement: &Placement, flip: bool) -> TransformScope<'_> {
        self.transforms.save();
        self.transforms.accumulate(placement);
        let flip_layers = self.flip_layers;
        self.flip_layers ^= flip;
        TransformScope { canvas: self, flip_layers }
    }

    /// Open `obj` (replacing any earlier rendering of it) as the owner of
    /// everything emitted until the guard drops.
    pub fn object_scope(&mut self, obj: ObjectRef) -> ObjectScope<'_> {
        self.buffer.begin_object(obj);
        let triangle_type = std::mem::take(&mut self.triangle_type_current);
        ObjectScope { canvas: self, entered: true, triangle_type }
    }

    /// Re-open a live object without invalidating it.
    fn enter_scope(&mut self, obj: ObjectRef) -> ObjectScope<'_> {
        let entered = self.buffer.enter(&obj);
        let triangle_type = self.triangle_type_current;
        ObjectScope { canvas: self, entered, triangle_type }
    }

    // --- Emission under the active transform ---

    pub(crate) fn map_layer(&self, layer: LayerId) -> LayerId {
        if self.flip_layers { layer::flip(layer) } else { layer }
    }

    pub(crate) fn emit_tris(&mut self, layer: LayerId, tris: &[Tri], color: ColorP) {
        let layer = self.map_layer(layer);
        for t in tris {
            let [a, b, c] = t.map(|p| self.transforms.apply(p));
            self.add_triangle(layer, a, b, c, color, TriangleFlags::empty());
        }
    }

    pub(crate) fn emit_hairline(&mut self, layer: LayerId, a: Coordf, b: Coordf, color: ColorP) {
        let layer = self.map_layer(layer);
        let a = self.transforms.apply(a);
        let b = self.transforms.apply(b);
        self.add_triangle(layer, a, b, a, color, TriangleFlags::LINE);
    }

    /// Document-unit segment; non-positive width is a hairline.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn emit_line(&mut self, layer: LayerId, a: Coordi, b: Coordi, width: i64, color: ColorP) {
        self.draw_line(a.to_f(), b.to_f(), color, layer, width as f64);
    }

    /// Place a cached fragment under the active transform.
    pub(crate) fn emit_fragment(&mut self, frag: &Fragment) {
        for ft in &frag.triangles {
            let layer = self.map_layer(ft.layer);
            let [p0, p1, p2] = ft.p.map(|p| self.transforms.apply(p));
            let tri = Triangle { kind: ft.kind, ..Triangle::new(p0, p1, p2, ft.color, ft.flags) };
            self.buffer.push(layer, tri);
        }
    }

    /// Register a selectable whose local bbox is mapped through the active transform.
    pub(crate) fn add_selectable(&mut self, key: SelectableRef, local: BBox) -> Result<(), SceneError> {
        let bbox = self.transforms.current().transform_bbox(&local);
        self.selectables.add(key, bbox)?;
        Ok(())
    }

    pub(crate) fn add_target(&mut self, kind: ObjectType, path: Vec<Uuid>, vertex: u32, local: Coordi) {
        let p = self.transforms.current().transform_i(local);
        self.targets.push(Target::new(kind, path, vertex, p));
    }
}

/// Guard returned by [`Canvas::transform_scope`]; restores the previous
/// transform (and layer side) on drop.
#[must_use]
pub struct TransformScope<'a> {
    canvas: &'a mut Canvas,
    flip_layers: bool,
}

impl Deref for TransformScope<'_> {
    type Target = Canvas;
    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl DerefMut for TransformScope<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        self.canvas
    }
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.canvas.transforms.restore();
        self.canvas.flip_layers = self.flip_layers;
    }
}

/// Guard returned by [`Canvas::object_scope`]; closes the object on drop.
/// Triangle type starts untyped inside the scope and is restored after.
#[must_use]
pub struct ObjectScope<'a> {
    canvas: &'a mut Canvas,
    entered: bool,
    triangle_type: TriangleType,
}

impl Deref for ObjectScope<'_> {
    type Target = Canvas;
    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl DerefMut for ObjectScope<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        self.canvas
    }
}

impl Drop for ObjectScope<'_> {
    fn drop(&mut self) {
        if self.entered {
            self.canvas.buffer.end_object();
        }
        self.canvas.triangle_type_current = self.triangle_type;
    }
}
