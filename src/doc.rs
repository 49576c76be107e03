//! Document model: the closed set of CAD objects the scene is built from.
//!
//! The document layer owns these values and passes them by reference to
//! [`Canvas::update`](crate::canvas::Canvas::update) (a whole root object) or
//! [`Canvas::update_item`](crate::canvas::Canvas::update_item) (one child of the
//! current root). Every object carries a stable uuid; geometry is in integer
//! document units. Nothing here knows about triangles.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geom::Coordi;
use crate::layer::{LayerId, TOP_COPPER};
use crate::placement::Placement;

/// Kind tag shared by object refs, selectable keys, and targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Symbol,
    SymbolPin,
    SchematicSymbol,
    Sheet,
    Line,
    Text,
    Package,
    Pad,
    Board,
    BoardPackage,
    Track,
    Via,
    Polygon,
    PolygonVertex,
    PolygonEdge,
    Annotation,
}

/// A straight segment. Zero width draws a hairline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub uuid: Uuid,
    pub from: Coordi,
    pub to: Coordi,
    #[serde(default)]
    pub width: i64,
    pub layer: LayerId,
}

/// A text label. Drawn as its extent frame: `size` high, advancing
/// `size * TEXT_ADVANCE_RATIO` per character from `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub uuid: Uuid,
    pub text: String,
    pub origin: Coordi,
    pub size: i64,
    /// Counter-clockwise rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    pub layer: LayerId,
}

/// Direction a pin points from its connection point towards the symbol body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinOrientation {
    #[default]
    Right,
    Up,
    Left,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPin {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    /// Connection point; the snap target for wiring.
    pub position: Coordi,
    pub length: i64,
    #[serde(default)]
    pub orientation: PinOrientation,
}

impl SymbolPin {
    /// End of the pin that touches the symbol body.
    #[must_use]
    pub fn body_end(&self) -> Coordi {
        let (dx, dy) = match self.orientation {
            PinOrientation::Right => (self.length, 0),
            PinOrientation::Up => (0, self.length),
            PinOrientation::Left => (-self.length, 0),
            PinOrientation::Down => (0, -self.length),
        };
        self.position + Coordi::new(dx, dy)
    }
}

/// A schematic symbol definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub pins: Vec<SymbolPin>,
    #[serde(default)]
    pub texts: Vec<Text>,
}

/// A placed symbol on a schematic sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchematicSymbol {
    pub uuid: Uuid,
    #[serde(default)]
    pub placement: Placement,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbols: Vec<SchematicSymbol>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub texts: Vec<Text>,
}

/// Copper shape of a pad, centred on the pad's placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum PadShape {
    Rect { width: i64, height: i64 },
    Circle { diameter: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub placement: Placement,
    #[serde(flatten)]
    pub shape: PadShape,
    /// Copper layers the shape is drawn on.
    #[serde(default = "default_pad_layers")]
    pub layers: Vec<LayerId>,
    /// Plated hole diameter for through-hole pads.
    #[serde(default)]
    pub drill: Option<i64>,
}

fn default_pad_layers() -> Vec<LayerId> {
    vec![TOP_COPPER]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub uuid: Uuid,
    pub vertices: Vec<Coordi>,
    pub layer: LayerId,
}

/// A footprint definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pads: Vec<Pad>,
    /// Silkscreen and outline lines.
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    #[serde(default)]
    pub texts: Vec<Text>,
}

/// A placed footprint on a board. `flip` puts it on the bottom side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPackage {
    pub uuid: Uuid,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub flip: bool,
    pub package: Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub uuid: Uuid,
    pub from: Coordi,
    pub to: Coordi,
    pub width: i64,
    pub layer: LayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    pub uuid: Uuid,
    pub position: Coordi,
    pub diameter: i64,
    pub drill: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub packages: Vec<BoardPackage>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    #[serde(default)]
    pub texts: Vec<Text>,
    /// Closed board outline.
    #[serde(default)]
    pub outline: Vec<Coordi>,
}

/// A root object handed to `Canvas::update`.
#[derive(Debug, Clone, Copy)]
pub enum DomainObject<'a> {
    Symbol(&'a Symbol),
    Sheet(&'a Sheet),
    Package(&'a Package),
    Board(&'a Board),
}

impl DomainObject<'_> {
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Symbol(s) => s.uuid,
            Self::Sheet(s) => s.uuid,
            Self::Package(p) => p.uuid,
            Self::Board(b) => b.uuid,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectType {
        match self {
            Self::Symbol(_) => ObjectType::Symbol,
            Self::Sheet(_) => ObjectType::Sheet,
            Self::Package(_) => ObjectType::Package,
            Self::Board(_) => ObjectType::Board,
        }
    }
}

/// One direct child of a sheet or board, re-rendered on its own by
/// `Canvas::update_item`.
#[derive(Debug, Clone, Copy)]
pub enum Item<'a> {
    SchematicSymbol(&'a SchematicSymbol),
    BoardPackage(&'a BoardPackage),
    Track(&'a Track),
    Via(&'a Via),
    Polygon(&'a Polygon),
    Line(&'a Line),
    Text(&'a Text),
}

impl Item<'_> {
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::SchematicSymbol(s) => s.uuid,
            Self::BoardPackage(p) => p.uuid,
            Self::Track(t) => t.uuid,
            Self::Via(v) => v.uuid,
            Self::Polygon(p) => p.uuid,
            Self::Line(l) => l.uuid,
            Self::Text(t) => t.uuid,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectType {
        match self {
            Self::SchematicSymbol(_) => ObjectType::SchematicSymbol,
            Self::BoardPackage(_) => ObjectType::BoardPackage,
            Self::Track(_) => ObjectType::Track,
            Self::Via(_) => ObjectType::Via,
            Self::Polygon(_) => ObjectType::Polygon,
            Self::Line(_) => ObjectType::Line,
            Self::Text(_) => ObjectType::Text,
        }
    }
}
