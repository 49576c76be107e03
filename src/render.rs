//! Per-kind tessellation of domain objects into the scene.
//!
//! Each object kind gets one function that opens its object scope, enters
//! its placement, emits triangles, and registers selectables and targets.
//! Shapes repeated across instances (pads, vias, package art, symbol bodies)
//! go through the fragment cache keyed by a fingerprint of everything that
//! shapes their local geometry.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::sync::Arc;

use uuid::Uuid;

use crate::buffer::ObjectRef;
use crate::canvas::Canvas;
use crate::consts::TEXT_ADVANCE_RATIO;
use crate::doc::{
    Board, BoardPackage, DomainObject, Item, Line, ObjectType, Package, Pad, PadShape, Polygon, SchematicSymbol,
    Sheet, Symbol, SymbolPin, Text, Track, Via,
};
use crate::error::SceneError;
use crate::fragment::{FingerprintBuilder, Fragment};
use crate::geom::{BBox, Coordf, Coordi};
use crate::layer::{self, LayerId};
use crate::placement::Placement;
use crate::selectables::SelectableRef;
use crate::tessellate;
use crate::triangle::{ColorP, TriangleType};

impl Canvas {
    pub(crate) fn render_root(&mut self, obj: DomainObject<'_>) -> Result<(), SceneError> {
        match obj {
            DomainObject::Symbol(sym) => self.render_symbol(sym),
            DomainObject::Sheet(sheet) => self.render_sheet(sheet),
            DomainObject::Package(pkg) => self.render_package(pkg),
            DomainObject::Board(board) => self.render_board(board),
        }
    }

    pub(crate) fn render_item(&mut self, item: Item<'_>) -> Result<(), SceneError> {
        match item {
            Item::SchematicSymbol(sym) => self.render_schematic_symbol(sym),
            Item::BoardPackage(bp) => self.render_board_package(bp),
            Item::Track(track) => self.render_track(track),
            Item::Via(via) => self.render_via(via),
            Item::Polygon(poly) => self.render_polygon(poly),
            Item::Line(line) => self.render_line(line),
            Item::Text(text) => self.render_text(text),
        }
    }

    // --- Schematic ---

    /// Symbol editor: every line, pin and text is editable on its own.
    fn render_symbol(&mut self, sym: &Symbol) -> Result<(), SceneError> {
        for line in &sym.lines {
            self.render_line(line)?;
        }
        for (i, pin) in (0u32..).zip(&sym.pins) {
            self.render_pin(sym.uuid, pin, i, true)?;
        }
        for text in &sym.texts {
            self.render_text(text)?;
        }
        Ok(())
    }

    fn render_sheet(&mut self, sheet: &Sheet) -> Result<(), SceneError> {
        for sym in &sheet.symbols {
            self.render_schematic_symbol(sym)?;
        }
        for line in &sheet.lines {
            self.render_line(line)?;
        }
        for text in &sheet.texts {
            self.render_text(text)?;
        }
        Ok(())
    }

    fn render_schematic_symbol(&mut self, ss: &SchematicSymbol) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::new(ss.uuid, ObjectType::SchematicSymbol));
        let mut placed = scope.transform_scope(&ss.placement);
        let body = placed.symbol_body(&ss.symbol);
        placed.emit_fragment(&body);
        let mut extents = body.extents;
        for (i, pin) in (0u32..).zip(&ss.symbol.pins) {
            placed.render_pin(ss.uuid, pin, i, false)?;
            extents = extents.including(pin.position.to_f()).including(pin.body_end().to_f());
        }
        for text in &ss.symbol.texts {
            placed.triangle_type_current = TriangleType::Text;
            placed.emit_text_frame(text);
            extents = text_corners(text).into_iter().fold(extents, BBox::including);
        }
        placed.add_selectable(SelectableRef::new(ss.uuid, ObjectType::SchematicSymbol, 0), extents)
    }

    /// Pin stroke from its connection point to the body. The connection
    /// point is a target addressed by `[owner, pin]`.
    fn render_pin(&mut self, owner: Uuid, pin: &SymbolPin, index: u32, selectable: bool) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::with_sub(owner, ObjectType::SymbolPin, index));
        scope.triangle_type_current = TriangleType::Pin;
        scope.emit_line(layer::SYMBOL, pin.position, pin.body_end(), 0, ColorP::Pin);
        scope.add_target(ObjectType::SymbolPin, vec![owner, pin.uuid], index, pin.position);
        if selectable {
            let bbox = BBox::from_corners(pin.position.to_f(), pin.body_end().to_f());
            scope.add_selectable(SelectableRef::new(owner, ObjectType::SymbolPin, index), bbox)?;
        }
        Ok(())
    }

    fn symbol_body(&mut self, sym: &Symbol) -> Arc<Fragment> {
        let fp = lines_fingerprint(FingerprintBuilder::new("symbol-body"), &sym.lines)
            .i64(self.segments_i64())
            .finish();
        let segments = self.config.circle_segments;
        self.fragments.get_or_compute(fp, || {
            let mut frag = Fragment::new();
            for line in &sym.lines {
                line_into(&mut frag, line, segments);
            }
            frag
        })
    }

    // --- Packages and boards ---

    /// Package editor: pads, lines, polygons and texts are editable on their own.
    fn render_package(&mut self, pkg: &Package) -> Result<(), SceneError> {
        for (i, pad) in (0u32..).zip(&pkg.pads) {
            self.render_pad(pkg.uuid, pad, i)?;
        }
        for line in &pkg.lines {
            self.render_line(line)?;
        }
        for poly in &pkg.polygons {
            self.render_polygon(poly)?;
        }
        for text in &pkg.texts {
            self.render_text(text)?;
        }
        Ok(())
    }

    fn render_board(&mut self, board: &Board) -> Result<(), SceneError> {
        self.triangle_type_current = TriangleType::Outline;
        let n = board.outline.len();
        for i in 0..n {
            let (a, b) = (board.outline[i], board.outline[(i + 1) % n]);
            self.emit_line(layer::OUTLINE, a, b, 0, ColorP::FromLayer);
        }
        for bp in &board.packages {
            self.render_board_package(bp)?;
        }
        for track in &board.tracks {
            self.render_track(track)?;
        }
        for via in &board.vias {
            self.render_via(via)?;
        }
        for poly in &board.polygons {
            self.render_polygon(poly)?;
        }
        for text in &board.texts {
            self.render_text(text)?;
        }
        Ok(())
    }

    /// A flipped package is mirrored and drawn on the opposite board side.
    fn render_board_package(&mut self, bp: &BoardPackage) -> Result<(), SceneError> {
        let placement = Placement { mirror: bp.placement.mirror ^ bp.flip, ..bp.placement };
        let mut scope = self.object_scope(ObjectRef::new(bp.uuid, ObjectType::BoardPackage));
        let mut placed = scope.placed_scope(&placement, bp.flip);
        let art = placed.package_art(&bp.package);
        placed.emit_fragment(&art);
        for (i, pad) in (0u32..).zip(&bp.package.pads) {
            placed.render_pad(bp.uuid, pad, i)?;
        }
        placed.triangle_type_current = TriangleType::Text;
        for text in &bp.package.texts {
            placed.emit_text_frame(text);
        }
        placed.add_selectable(SelectableRef::new(bp.uuid, ObjectType::BoardPackage, 0), package_extents(&bp.package))
    }

    fn package_art(&mut self, pkg: &Package) -> Arc<Fragment> {
        let fp = lines_fingerprint(FingerprintBuilder::new("package-art"), &pkg.lines);
        let fp = pkg
            .polygons
            .iter()
            .fold(fp.str("polygons").i64(pkg.polygons.len() as i64), |fp, poly| {
                poly.vertices.iter().fold(fp.layer(poly.layer).i64(vertex_count(poly)), |fp, v| fp.coord(*v))
            })
            .i64(self.segments_i64())
            .finish();
        let segments = self.config.circle_segments;
        self.fragments.get_or_compute(fp, || {
            let mut frag = Fragment::new();
            for line in &pkg.lines {
                line_into(&mut frag, line, segments);
            }
            for poly in &pkg.polygons {
                let pts: Vec<Coordf> = poly.vertices.iter().map(|v| v.to_f()).collect();
                frag.extend(poly.layer, tessellate::polygon(&pts), ColorP::FromLayer, TriangleType::Polygon);
            }
            frag
        })
    }

    /// Pad `index` of the package instance `owner`. Selectable as
    /// `(owner, Pad, index)`; its centre is a target addressed by `[owner, pad]`.
    fn render_pad(&mut self, owner: Uuid, pad: &Pad, index: u32) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::with_sub(owner, ObjectType::Pad, index));
        let mut placed = scope.transform_scope(&pad.placement);
        let frag = placed.pad_fragment(pad);
        placed.emit_fragment(&frag);
        placed.emit_pad_label(pad);
        placed.add_target(ObjectType::Pad, vec![owner, pad.uuid], index, Coordi::new(0, 0));
        placed.add_selectable(SelectableRef::new(owner, ObjectType::Pad, index), shape_bbox(pad.shape))
    }

    fn pad_fragment(&mut self, pad: &Pad) -> Arc<Fragment> {
        let fp = shape_fingerprint(FingerprintBuilder::new("pad"), pad.shape);
        let fp = pad
            .layers
            .iter()
            .fold(fp.i64(pad.layers.len() as i64), |fp, l| fp.layer(*l))
            .i64(pad.drill.unwrap_or(0))
            .i64(self.segments_i64())
            .finish();
        let segments = self.config.circle_segments;
        self.fragments.get_or_compute(fp, || {
            let mut frag = Fragment::new();
            for &layer in &pad.layers {
                frag.extend(layer, shape_tris(pad.shape, segments), ColorP::Pad, TriangleType::Pad);
            }
            if let Some(drill) = pad.drill {
                let hole = tessellate::circle(Coordf::new(0.0, 0.0), drill as f64 / 2.0, segments);
                frag.extend(layer::HOLES, hole, ColorP::Hole, TriangleType::Pad);
            }
            frag
        })
    }

    /// Frame of the pad name on an overlay of the pad's first copper layer,
    /// so labels can be hidden without hiding copper.
    fn emit_pad_label(&mut self, pad: &Pad) {
        let Some(&base) = pad.layers.first() else { return };
        if pad.name.is_empty() {
            return;
        }
        let bbox = shape_bbox(pad.shape);
        let h = bbox.width().min(bbox.height()) / 2.0;
        let w = pad.name.chars().count() as f64 * h * TEXT_ADVANCE_RATIO;
        let mapped = self.map_layer(base);
        self.triangle_type_current = TriangleType::Pad;
        let overlay = self.get_overlay_layer(mapped, false);
        self.draw_box(Coordf::new(-w / 2.0, -h / 2.0), Coordf::new(w / 2.0, h / 2.0), ColorP::Frame, overlay);
    }

    fn render_track(&mut self, track: &Track) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::new(track.uuid, ObjectType::Track));
        scope.triangle_type_current = TriangleType::Track;
        scope.emit_line(track.layer, track.from, track.to, track.width, ColorP::FromLayer);
        scope.add_target(ObjectType::Track, vec![track.uuid], 0, track.from);
        scope.add_target(ObjectType::Track, vec![track.uuid], 1, track.to);
        let bbox = BBox::from_corners(track.from.to_f(), track.to.to_f()).inflate(track.width as f64 / 2.0);
        scope.add_selectable(SelectableRef::new(track.uuid, ObjectType::Track, 0), bbox)
    }

    fn render_via(&mut self, via: &Via) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::new(via.uuid, ObjectType::Via));
        let mut placed = scope.transform_scope(&Placement::at(via.position.x, via.position.y));
        let fp = FingerprintBuilder::new("via").i64(via.diameter).i64(via.drill).i64(placed.segments_i64()).finish();
        let segments = placed.config.circle_segments;
        let (diameter, drill) = (via.diameter as f64, via.drill as f64);
        let frag = placed.fragments.get_or_compute(fp, || {
            let mut frag = Fragment::new();
            let center = Coordf::new(0.0, 0.0);
            for copper in [layer::TOP_COPPER, layer::BOTTOM_COPPER] {
                frag.extend(copper, tessellate::circle(center, diameter / 2.0, segments), ColorP::FromLayer, TriangleType::Via);
            }
            frag.extend(layer::HOLES, tessellate::circle(center, drill / 2.0, segments), ColorP::Hole, TriangleType::Via);
            frag
        });
        placed.emit_fragment(&frag);
        placed.add_target(ObjectType::Via, vec![via.uuid], 0, Coordi::new(0, 0));
        let bbox = BBox::around(Coordf::new(0.0, 0.0), diameter / 2.0);
        placed.add_selectable(SelectableRef::new(via.uuid, ObjectType::Via, 0), bbox)
    }

    // --- Primitives shared by both domains ---

    /// Filled polygon. Each vertex is selectable and a target; each edge
    /// midpoint is a target.
    fn render_polygon(&mut self, poly: &Polygon) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::new(poly.uuid, ObjectType::Polygon));
        scope.triangle_type_current = TriangleType::Polygon;
        let pts: Vec<Coordf> = poly.vertices.iter().map(|v| v.to_f()).collect();
        scope.emit_tris(poly.layer, &tessellate::polygon(&pts), ColorP::FromLayer);
        let n = poly.vertices.len();
        for (i, &v) in (0u32..).zip(&poly.vertices) {
            let next = poly.vertices[(i as usize + 1) % n];
            let mid = Coordi::new((v.x + next.x) / 2, (v.y + next.y) / 2);
            scope.add_target(ObjectType::PolygonVertex, vec![poly.uuid], i, v);
            scope.add_target(ObjectType::PolygonEdge, vec![poly.uuid], i, mid);
            scope.add_selectable(SelectableRef::new(poly.uuid, ObjectType::PolygonVertex, i), BBox::around(v.to_f(), 0.0))?;
        }
        Ok(())
    }

    fn render_line(&mut self, line: &Line) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::new(line.uuid, ObjectType::Line));
        scope.triangle_type_current = line_type(line.layer);
        scope.emit_line(line.layer, line.from, line.to, line.width, ColorP::FromLayer);
        scope.add_target(ObjectType::Line, vec![line.uuid], 0, line.from);
        scope.add_target(ObjectType::Line, vec![line.uuid], 1, line.to);
        let bbox = BBox::from_corners(line.from.to_f(), line.to.to_f()).inflate(line.width as f64 / 2.0);
        scope.add_selectable(SelectableRef::new(line.uuid, ObjectType::Line, 0), bbox)
    }

    fn render_text(&mut self, text: &Text) -> Result<(), SceneError> {
        let mut scope = self.object_scope(ObjectRef::new(text.uuid, ObjectType::Text));
        scope.triangle_type_current = TriangleType::Text;
        scope.emit_text_frame(text);
        scope.add_target(ObjectType::Text, vec![text.uuid], 0, text.origin);
        scope.add_selectable(SelectableRef::new(text.uuid, ObjectType::Text, 0), BBox::of_points(text_corners(text)))
    }

    fn emit_text_frame(&mut self, text: &Text) {
        let c = text_corners(text);
        for (&p, &q) in c.iter().zip(c.iter().cycle().skip(1)) {
            self.emit_hairline(text.layer, p, q, ColorP::FromLayer);
        }
    }

    fn segments_i64(&self) -> i64 {
        self.config.circle_segments as i64
    }
}

fn line_into(frag: &mut Fragment, line: &Line, segments: usize) {
    let kind = line_type(line.layer);
    if line.width > 0 {
        let tris = tessellate::line(line.from.to_f(), line.to.to_f(), line.width as f64, segments);
        frag.extend(line.layer, tris, ColorP::FromLayer, kind);
    } else {
        frag.hairline(line.layer, line.from.to_f(), line.to.to_f(), ColorP::FromLayer, kind);
    }
}

/// Line records behind a section tag and count, so a following section
/// cannot be read as more lines.
fn lines_fingerprint(fp: FingerprintBuilder, lines: &[Line]) -> FingerprintBuilder {
    lines
        .iter()
        .fold(fp.str("lines").i64(lines.len() as i64), |fp, l| fp.coord(l.from).coord(l.to).i64(l.width).layer(l.layer))
}

fn line_type(layer: LayerId) -> TriangleType {
    match layer {
        layer::TOP_SILKSCREEN | layer::BOTTOM_SILKSCREEN => TriangleType::Silkscreen,
        layer::OUTLINE => TriangleType::Outline,
        _ => TriangleType::None,
    }
}

fn vertex_count(poly: &Polygon) -> i64 {
    poly.vertices.len() as i64
}

fn shape_fingerprint(fp: FingerprintBuilder, shape: PadShape) -> FingerprintBuilder {
    match shape {
        PadShape::Rect { width, height } => fp.str("rect").i64(width).i64(height),
        PadShape::Circle { diameter } => fp.str("circle").i64(diameter),
    }
}

fn shape_tris(shape: PadShape, segments: usize) -> Vec<tessellate::Tri> {
    let center = Coordf::new(0.0, 0.0);
    match shape {
        PadShape::Rect { width, height } => tessellate::rect(center, width as f64, height as f64),
        PadShape::Circle { diameter } => tessellate::circle(center, diameter as f64 / 2.0, segments),
    }
}

/// Copper extents of a pad shape around the pad origin.
fn shape_bbox(shape: PadShape) -> BBox {
    let center = Coordf::new(0.0, 0.0);
    match shape {
        PadShape::Rect { width, height } => {
            let half = Coordf::new(width as f64 / 2.0, height as f64 / 2.0);
            BBox::from_corners(center - half, center + half)
        }
        PadShape::Circle { diameter } => BBox::around(center, diameter as f64 / 2.0),
    }
}

/// Package-local extents: pads, lines and polygons.
fn package_extents(pkg: &Package) -> BBox {
    let pads = pkg.pads.iter().map(|p| p.placement.transform_bbox(&shape_bbox(p.shape)));
    let lines = pkg
        .lines
        .iter()
        .map(|l| BBox::from_corners(l.from.to_f(), l.to.to_f()).inflate(l.width as f64 / 2.0));
    let polys = pkg.polygons.iter().map(|p| BBox::of_points(p.vertices.iter().map(|v| v.to_f())));
    pads.chain(lines).chain(polys).fold(BBox::EMPTY, BBox::union)
}

/// Corners of a text's extent frame in its parent frame, counter-clockwise
/// from the origin.
fn text_corners(text: &Text) -> [Coordf; 4] {
    let h = text.size as f64;
    let w = text.text.chars().count() as f64 * h * TEXT_ADVANCE_RATIO;
    let pl = Placement::new(text.origin, text.angle, false);
    [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| pl.transform(Coordf::new(x, y)))
}
