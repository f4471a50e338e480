use serde::{Serialize, Serializer};

use crate::geometry::PolyArea;

/// Board coordinate in nanometres.
pub type Coord = i64;

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Wrapper that rounds f64 to 6 decimal places on serialization.
fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

// ─── Ids ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LayerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ComponentId(pub usize);

// ─── Points and boxes ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: Coord, dy: Coord) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BBox {
    pub minx: Coord,
    pub miny: Coord,
    pub maxx: Coord,
    pub maxy: Coord,
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            minx: Coord::MAX,
            miny: Coord::MAX,
            maxx: Coord::MIN,
            maxy: Coord::MIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.minx > self.maxx || self.miny > self.maxy
    }

    pub fn expand_point(&mut self, x: Coord, y: Coord) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    /// Grow by a point with a round footprint of radius `r`.
    pub fn expand_disc(&mut self, p: Point, r: Coord) {
        self.expand_point(p.x.saturating_sub(r), p.y.saturating_sub(r));
        self.expand_point(p.x.saturating_add(r), p.y.saturating_add(r));
    }
}

// ─── Layers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Copper,
    Silk,
    Paste,
    Mask,
    Mechanical,
    Doc,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Internal,
    Global,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Plane layers carry a single generated polygon punctured by antipads.
    pub plane: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<NetId>,
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: LayerKind, side: Side) -> Self {
        Self {
            name: name.into(),
            kind,
            side,
            purpose: None,
            plane: false,
            net: None,
        }
    }

    pub fn with_purpose(mut self, purpose: &str) -> Self {
        self.purpose = Some(purpose.to_string());
        self
    }
}

// ─── Nets and components ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Net {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refdes: Option<String>,
    pub footprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub pos: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub side: Side,
}

// ─── Primitives ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub layer: LayerId,
    pub start: Point,
    pub end: Point,
    pub width: Coord,
    pub clearance: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<NetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Arc {
    pub layer: LayerId,
    pub center: Point,
    pub radius: Coord,
    /// Degrees, counter-clockwise from +x.
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub start_angle: f64,
    /// Always positive.
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub sweep: f64,
    pub width: Coord,
    pub clearance: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<NetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Polygon {
    pub layer: LayerId,
    pub area: PolyArea,
    pub clearance: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<NetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRole {
    Free,
    Designator,
    Comment,
}

#[derive(Debug, Clone, Serialize)]
pub struct Text {
    pub layer: LayerId,
    pub pos: Point,
    pub height: Coord,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub mirrored: bool,
    pub string: String,
    pub role: TextRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
}

// ─── Padstacks ───────────────────────────────────────────────────────

/// Shapes are relative to the padstack position, already rotated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Circle { center: Point, diameter: Coord },
    Line { start: Point, end: Point, thickness: Coord },
    Polygon { points: Vec<Point> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PadLevel {
    Top,
    Internal,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeRole {
    Copper,
    Mask,
    Paste,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackShape {
    pub level: PadLevel,
    pub role: ShapeRole,
    pub shape: Shape,
}

/// Copper group offsets of a blind/buried hole from the top and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HoleSpan {
    pub top: usize,
    pub bottom: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hole {
    pub diameter: Coord,
    pub plated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<HoleSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub start: Point,
    pub end: Point,
    pub thickness: Coord,
    pub plated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PadstackKind {
    Pad,
    Via,
}

#[derive(Debug, Clone, Serialize)]
pub struct Padstack {
    pub kind: PadstackKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pos: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub shapes: Vec<StackShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<Hole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    pub clearance: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<NetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thermals: Vec<LayerId>,
}

impl Padstack {
    pub fn shapes_on(&self, level: PadLevel, role: ShapeRole) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(move |s| s.level == level && s.role == role)
            .map(|s| &s.shape)
    }

    pub fn is_drilled(&self) -> bool {
        self.hole.is_some() || self.slot.is_some()
    }
}

// ─── Board ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    pub width: Coord,
    pub height: Coord,
    pub layers: Vec<Layer>,
    /// Copper layers, top to bottom.
    pub copper_stack: Vec<LayerId>,
    pub nets: Vec<Net>,
    pub components: Vec<Component>,
    pub lines: Vec<Line>,
    pub arcs: Vec<Arc>,
    pub polygons: Vec<Polygon>,
    pub padstacks: Vec<Padstack>,
    pub texts: Vec<Text>,
    /// Board shape, when the file defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<PolyArea>,
}

impl Board {
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        self.layers.push(layer);
        LayerId(self.layers.len() - 1)
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    pub fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        &mut self.layers[id.0]
    }

    pub fn find_layer_by_purpose(&self, purpose: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.purpose.as_deref() == Some(purpose))
            .map(LayerId)
    }

    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.nets.iter().position(|n| n.name == name).map(NetId)
    }

    pub fn plane_layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.plane)
            .map(|(i, _)| LayerId(i))
    }

    /// Position of a copper layer within the stack, counted from the top.
    pub fn copper_index(&self, id: LayerId) -> Option<usize> {
        self.copper_stack.iter().position(|&l| l == id)
    }
}
