use std::collections::HashMap;

use log::warn;
use serde::Serialize;

use super::layers::{LayerRef, LayerResolver};
use super::rules::Clearances;
use super::tree::{Record, Tree};
use super::units::YFlip;
use crate::geometry::Rect;
use crate::types::{Board, ComponentId, Coord, LayerId, LayerKind, NetId, Point};
use crate::ImportOptions;

/// A record that could not be imported, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub object: String,
    pub message: String,
}

/// Where the board size comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Outline or sheet size; the board keeps its coordinates.
    Explicit,
    /// Only one of the sheet dimensions.
    Partial,
    Absent,
}

/// Plane cutout applied once the plane polygon exists.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredHole {
    pub layer: LayerId,
    pub rect: Rect,
    pub object: String,
}

pub struct Context<'a> {
    pub tree: &'a Tree,
    pub opts: &'a ImportOptions,
    pub board: Board,
    pub flip: YFlip,
    pub layers: LayerResolver,
    pub clearances: Clearances,
    net_ids: HashMap<i64, NetId>,
    component_ids: HashMap<i64, ComponentId>,
    /// Drilled padstacks (by index) and their nets, for thermal lookup.
    pub object_nets: Vec<(usize, NetId)>,
    pub deferred: Vec<DeferredHole>,
    pub extent: Extent,
    /// Offset applied when the board was normalized to its bounding box.
    pub shift: (Coord, Coord),
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Context<'a> {
    pub fn new(tree: &'a Tree, opts: &'a ImportOptions) -> Self {
        Self {
            tree,
            opts,
            board: Board::default(),
            flip: YFlip::default(),
            layers: LayerResolver::default(),
            clearances: Clearances::default(),
            net_ids: HashMap::new(),
            component_ids: HashMap::new(),
            object_nets: Vec::new(),
            deferred: Vec::new(),
            extent: Extent::Absent,
            shift: (0, 0),
            diagnostics: Vec::new(),
        }
    }

    pub fn diag(&mut self, object: impl Into<String>, message: impl Into<String>) {
        let d = Diagnostic {
            object: object.into(),
            message: message.into(),
        };
        warn!("PcbDoc: {}: {}", d.object, d.message);
        self.diagnostics.push(d);
    }

    /// Name used for a record in diagnostics, e.g. `Track #3`.
    pub fn object(&self, rec: &Record) -> String {
        format!("{} #{}", self.tree.name(&rec.name), rec.index)
    }

    /// The first binding of an id wins.
    pub fn bind_net(&mut self, ordinal: usize, id: NetId) {
        self.net_ids.entry(ordinal as i64).or_insert(id);
    }

    pub fn bind_component(&mut self, ordinal: usize, id: ComponentId) {
        self.component_ids.entry(ordinal as i64).or_insert(id);
    }

    /// Net referenced by a record; absent or negative ids mean "no net".
    ///
    /// An id no net record was bound to is an error.
    pub fn net(&self, raw: Option<i64>) -> Result<Option<NetId>, String> {
        resolve(&self.net_ids, raw).map_err(|id| format!("NET {id} does not name a net"))
    }

    pub fn component(&self, raw: Option<i64>) -> Result<Option<ComponentId>, String> {
        resolve(&self.component_ids, raw)
            .map_err(|id| format!("COMPONENT {id} does not name a component"))
    }

    /// Source coordinates to board coordinates.
    pub fn point(&self, x: Coord, y: Coord) -> Point {
        Point::new(x, self.flip.apply(y))
    }

    pub fn resolve_layer(&mut self, r: LayerRef) -> Option<LayerId> {
        self.layers.resolve(&mut self.board, r)
    }

    pub fn is_plane(&self, layer: LayerId) -> bool {
        self.board.layer(layer).plane
    }

    /// Clearance of an object with `net`; zero off copper.
    pub fn clearance(&self, layer: Option<LayerId>, net: Option<NetId>) -> Coord {
        if layer.is_some_and(|l| self.board.layer(l).kind != LayerKind::Copper) {
            return 0;
        }
        self.clearances.effective(net, self.opts.default_clearance)
    }

    pub fn finish(self) -> (Board, Vec<Diagnostic>) {
        (self.board, self.diagnostics)
    }
}

fn resolve<T: Copy>(ids: &HashMap<i64, T>, raw: Option<i64>) -> Result<Option<T>, i64> {
    match raw {
        Some(id) if id >= 0 => ids.get(&id).copied().map(Some).ok_or(id),
        _ => Ok(None),
    }
}
