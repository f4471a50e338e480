use std::collections::{BTreeMap, HashMap, HashSet};

use super::keywords::{self, FieldKey, LayerName};
use super::tree::{FieldRef, Value};
use crate::types::{Board, Layer, LayerId, LayerKind, Side};

/// Highest layer slot number stored in the board header.
const MAX_SLOT: usize = 128;

/// `V7_LAYER` values carry this base; the low byte is the classic id.
const V7_BASE: i64 = 0x0100_0000;

/// A layer as named by a record, before it is bound to a board layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRef {
    Top,
    /// Internal signal layer, 1-based.
    Mid(u8),
    Bottom,
    TopOverlay,
    BottomOverlay,
    TopPaste,
    BottomPaste,
    TopSolder,
    BottomSolder,
    /// Internal plane layer, 1-based.
    Plane(u8),
    DrillGuide,
    KeepOut,
    Mechanical(u8),
    Assembly,
    DrillDrawing,
    MultiLayer,
}

impl LayerRef {
    pub fn from_id(id: i64) -> Option<Self> {
        Some(match id {
            1 => Self::Top,
            2..=31 => Self::Mid((id - 1) as u8),
            32 => Self::Bottom,
            33 => Self::TopOverlay,
            34 => Self::BottomOverlay,
            35 => Self::TopPaste,
            36 => Self::BottomPaste,
            37 => Self::TopSolder,
            38 => Self::BottomSolder,
            39..=54 => Self::Plane((id - 38) as u8),
            55 => Self::DrillGuide,
            56 => Self::KeepOut,
            57..=71 => Self::Mechanical((id - 56) as u8),
            72 => Self::Assembly,
            73 => Self::DrillDrawing,
            74 => Self::MultiLayer,
            _ => return None,
        })
    }

    pub fn from_v7(id: i64) -> Option<Self> {
        Self::from_id(if id >= V7_BASE { id & 0xFF } else { id })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let fixed = match LayerName::lookup(name.as_bytes()) {
            LayerName::Top => Self::Top,
            LayerName::Bottom => Self::Bottom,
            LayerName::TopOverlay => Self::TopOverlay,
            LayerName::BottomOverlay => Self::BottomOverlay,
            LayerName::TopPaste => Self::TopPaste,
            LayerName::BottomPaste => Self::BottomPaste,
            LayerName::TopSolder => Self::TopSolder,
            LayerName::BottomSolder => Self::BottomSolder,
            LayerName::DrillGuide => Self::DrillGuide,
            LayerName::KeepOut => Self::KeepOut,
            LayerName::DrillDrawing => Self::DrillDrawing,
            LayerName::MultiLayer => Self::MultiLayer,
            LayerName::Unknown => {
                let numbered = |prefix, max: usize| {
                    keywords::indexed(name, prefix, "")
                        .filter(|n| (1..=max).contains(n))
                        .map(|n| n as u8)
                };
                return numbered("MID", 30)
                    .map(Self::Mid)
                    .or_else(|| numbered("PLANE", 16).map(Self::Plane))
                    .or_else(|| numbered("MECHANICAL", 15).map(Self::Mechanical));
            }
        };
        Some(fixed)
    }

    /// Numeric ids and names are both accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().parse::<i64>() {
            Ok(id) => Self::from_id(id),
            Err(_) => Self::from_name(s),
        }
    }

    /// Interpret a `LAYER` or `V7_LAYER` field.
    pub fn from_field(field: &FieldRef<'_>) -> Option<Self> {
        let v7 = field.key() == FieldKey::V7Layer;
        match field.value() {
            Value::Int(id) if v7 => Self::from_v7(id),
            Value::Int(id) => Self::from_id(id),
            _ => {
                let s = field.str();
                match s.trim().parse::<i64>() {
                    Ok(id) if v7 => Self::from_v7(id),
                    _ => Self::parse(&s),
                }
            }
        }
    }

    pub fn is_copper(self) -> bool {
        matches!(self, Self::Top | Self::Mid(_) | Self::Bottom | Self::Plane(_))
    }

    /// Board side of a layer, for component placement.
    pub fn side(self) -> Side {
        match self {
            Self::Top | Self::TopOverlay | Self::TopPaste | Self::TopSolder => Side::Top,
            Self::Bottom | Self::BottomOverlay | Self::BottomPaste | Self::BottomSolder => {
                Side::Bottom
            }
            Self::Mid(_) | Self::Plane(_) => Side::Internal,
            _ => Side::Global,
        }
    }
}

// ─── Layer stack ─────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
struct Slot {
    name: Option<String>,
    prev: usize,
    next: usize,
}

/// Layer stack as described by the board header.
#[derive(Debug, Default)]
pub struct StackDef {
    slots: BTreeMap<usize, Slot>,
    toggle: Option<String>,
    plane_nets: BTreeMap<u8, String>,
}

/// An internal copper layer in stack order.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalLayer {
    pub layer: LayerRef,
    pub name: String,
}

impl StackDef {
    pub fn read<'t>(fields: impl Iterator<Item = FieldRef<'t>>) -> Self {
        let mut def = Self::default();
        for field in fields {
            if field.key() == FieldKey::ToggleLayers {
                def.toggle = Some(field.str().into_owned());
                continue;
            }
            if field.key() != FieldKey::Unknown {
                continue;
            }
            let raw = field.raw_key();
            if let Some(n) = keywords::indexed(&raw, "PLANE", "NETNAME") {
                if let Ok(n) = u8::try_from(n) {
                    def.plane_nets.insert(n, field.str().into_owned());
                }
                continue;
            }
            let slot_field = ["NAME", "PREV", "NEXT"]
                .into_iter()
                .find_map(|suffix| keywords::indexed(&raw, "LAYER", suffix).map(|n| (n, suffix)));
            let Some((n, suffix)) = slot_field.filter(|(n, _)| (1..=MAX_SLOT).contains(n)) else {
                continue;
            };
            let slot = def.slots.entry(n).or_default();
            match suffix {
                "NAME" => slot.name = Some(field.str().into_owned()),
                "PREV" => slot.prev = field.int().unwrap_or(0).max(0) as usize,
                _ => slot.next = field.int().unwrap_or(0).max(0) as usize,
            }
        }
        def
    }

    /// Slots in chain order, starting at the head.
    ///
    /// Each slot is visited at most once, so a corrupt chain terminates.
    fn chain(&self) -> Vec<usize> {
        let Some(head) = self
            .slots
            .iter()
            .find(|(_, s)| s.prev == 0 && s.next != 0)
            .map(|(&n, _)| n)
        else {
            return Vec::new();
        };
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut cur = head;
        while order.len() < self.slots.len() && visited.insert(cur) {
            order.push(cur);
            match self.slots.get(&cur) {
                Some(slot) if slot.next != 0 => cur = slot.next,
                _ => break,
            }
        }
        order
    }

    fn slot_name(&self, n: usize) -> Option<String> {
        self.slots
            .get(&n)
            .and_then(|s| s.name.clone())
            .filter(|s| !s.is_empty())
    }

    /// Internal copper and plane layers, top to bottom.
    pub fn internal_layers(&self) -> Vec<InternalLayer> {
        let chain = self.chain();
        let slots: Vec<usize> = if chain.is_empty() {
            self.toggled_planes()
        } else {
            chain
        };
        slots
            .into_iter()
            .filter_map(|n| {
                let layer = LayerRef::from_id(n as i64)?;
                let default = match layer {
                    LayerRef::Mid(k) => format!("Mid-Layer {k}"),
                    LayerRef::Plane(k) => format!("Internal Plane {k}"),
                    _ => return None,
                };
                Some(InternalLayer {
                    layer,
                    name: self.slot_name(n).unwrap_or(default),
                })
            })
            .collect()
    }

    /// Legacy boards enable planes through a flag string indexed by slot.
    fn toggled_planes(&self) -> Vec<usize> {
        let Some(toggle) = &self.toggle else {
            return Vec::new();
        };
        let flags = toggle.as_bytes();
        (39..=43)
            .filter(|&slot| flags.get(slot - 1) == Some(&b'1'))
            .collect()
    }

    pub fn plane_net(&self, plane: u8) -> Option<&str> {
        self.plane_nets
            .get(&plane)
            .map(String::as_str)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("(No Net)"))
    }
}

// ─── Resolver ────────────────────────────────────────────────────────

/// Binds layer references to board layers, creating optional layers on
/// first use.
#[derive(Debug, Default)]
pub struct LayerResolver {
    bound: HashMap<LayerRef, LayerId>,
    /// Plane layers with the net name their header assigns.
    pub plane_nets: Vec<(LayerId, String)>,
}

impl LayerResolver {
    /// Create the copper stack and the fixed non-copper layers.
    pub fn build(board: &mut Board, stack: &StackDef) -> Self {
        let mut resolver = Self::default();

        let top = resolver.bind(board, LayerRef::Top, Layer::new("Top Layer", LayerKind::Copper, Side::Top));
        board.copper_stack.push(top);
        for internal in stack.internal_layers() {
            let mut layer = Layer::new(internal.name, LayerKind::Copper, Side::Internal);
            if let LayerRef::Plane(k) = internal.layer {
                layer.plane = true;
                let id = LayerId(board.layers.len());
                if let Some(net) = stack.plane_net(k) {
                    resolver.plane_nets.push((id, net.to_string()));
                }
            }
            let id = resolver.bind(board, internal.layer, layer);
            board.copper_stack.push(id);
        }
        let bottom = resolver.bind(
            board,
            LayerRef::Bottom,
            Layer::new("Bottom Layer", LayerKind::Copper, Side::Bottom),
        );
        board.copper_stack.push(bottom);

        for r in [
            LayerRef::TopOverlay,
            LayerRef::BottomOverlay,
            LayerRef::TopPaste,
            LayerRef::BottomPaste,
            LayerRef::TopSolder,
            LayerRef::BottomSolder,
        ] {
            if let Some(layer) = optional_layer(r) {
                resolver.bind(board, r, layer);
            }
        }
        board.add_layer(Layer::new("Board Outline", LayerKind::Outline, Side::Global).with_purpose("outline"));
        resolver
    }

    fn bind(&mut self, board: &mut Board, r: LayerRef, layer: Layer) -> LayerId {
        let id = board.add_layer(layer);
        self.bound.insert(r, id);
        id
    }

    /// Board layer of a reference. Multi-layer and internal layers that the
    /// stack does not define have none.
    pub fn resolve(&mut self, board: &mut Board, r: LayerRef) -> Option<LayerId> {
        if let Some(&id) = self.bound.get(&r) {
            return Some(id);
        }
        let layer = optional_layer(r)?;
        Some(self.bind(board, r, layer))
    }

    /// Copper layer of a pad/via side.
    pub fn copper(&self, r: LayerRef) -> Option<LayerId> {
        self.bound.get(&r).copied()
    }
}

/// Non-copper layers that exist only once something is drawn on them.
fn optional_layer(r: LayerRef) -> Option<Layer> {
    let layer = match r {
        LayerRef::TopOverlay => Layer::new("Top Overlay", LayerKind::Silk, Side::Top),
        LayerRef::BottomOverlay => Layer::new("Bottom Overlay", LayerKind::Silk, Side::Bottom),
        LayerRef::TopPaste => Layer::new("Top Paste", LayerKind::Paste, Side::Top),
        LayerRef::BottomPaste => Layer::new("Bottom Paste", LayerKind::Paste, Side::Bottom),
        LayerRef::TopSolder => Layer::new("Top Solder", LayerKind::Mask, Side::Top),
        LayerRef::BottomSolder => Layer::new("Bottom Solder", LayerKind::Mask, Side::Bottom),
        LayerRef::DrillGuide => {
            Layer::new("Drill Guide", LayerKind::Doc, Side::Global).with_purpose("drill_guide")
        }
        LayerRef::KeepOut => {
            Layer::new("Keep-Out Layer", LayerKind::Doc, Side::Global).with_purpose("keepout")
        }
        LayerRef::Mechanical(k) => Layer::new(format!("Mechanical {k}"), LayerKind::Mechanical, Side::Global)
            .with_purpose(&format!("mech{k}")),
        LayerRef::Assembly => {
            Layer::new("Assembly", LayerKind::Doc, Side::Global).with_purpose("assembly")
        }
        LayerRef::DrillDrawing => {
            Layer::new("Drill Drawing", LayerKind::Doc, Side::Global).with_purpose("drill_drawing")
        }
        LayerRef::Top
        | LayerRef::Bottom
        | LayerRef::Mid(_)
        | LayerRef::Plane(_)
        | LayerRef::MultiLayer => return None,
    };
    Some(layer)
}
