//! Conversion of the administrative records: board header, nets, classes,
//! rules, components and texts.

use log::debug;

use super::context::{Context, Extent};
use super::keywords::{self, FieldKey, RecordKind};
use super::layers::{LayerRef, LayerResolver, StackDef};
use super::rules;
use super::tree::FieldRef;
use super::units::YFlip;
use crate::geometry::{arc_points, normalize_deg, PolyArea};
use crate::types::{Arc, Component, ComponentId, Coord, Line, Net, NetId, Point, Side, Text, TextRole};

/// Outline width of board edges.
const OUTLINE_WIDTH: Coord = 0;

/// Arc segment of an outline, in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSeg {
    pub center: Point,
    pub radius: Coord,
    pub start: f64,
    pub end: f64,
}

impl ArcSeg {
    /// Counter-clockwise sweep from start to end, in `(0, 360]`.
    pub fn sweep(&self) -> f64 {
        let s = normalize_deg(self.end - self.start);
        if s == 0.0 {
            360.0
        } else {
            s
        }
    }

    /// Mirrored into the board frame: start and sweep.
    pub fn mirrored(&self) -> (f64, f64) {
        (normalize_deg(-self.end), self.sweep())
    }
}

/// Outline vertex; `arc` bends the segment towards the next vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Point,
    pub arc: Option<ArcSeg>,
}

#[derive(Default)]
struct RawVertex {
    x: Option<Coord>,
    y: Option<Coord>,
    kind: Option<i64>,
    cx: Option<Coord>,
    cy: Option<Coord>,
    r: Option<Coord>,
    sa: Option<f64>,
    ea: Option<f64>,
}

/// Collect `VX<i>`/`VY<i>` vertices with their optional arc parameters.
pub fn read_vertices<'t>(fields: impl Iterator<Item = FieldRef<'t>>) -> Vec<Vertex> {
    let mut raw: Vec<RawVertex> = Vec::new();
    for f in fields {
        if f.key() != FieldKey::Unknown {
            continue;
        }
        let key = f.raw_key();
        let Some((prefix, i)) = ["VX", "VY", "KIND", "CX", "CY", "SA", "EA", "R"]
            .into_iter()
            .find_map(|p| keywords::indexed(&key, p, "").map(|i| (p, i)))
        else {
            continue;
        };
        if i > 4096 {
            continue;
        }
        if raw.len() <= i {
            raw.resize_with(i + 1, RawVertex::default);
        }
        let v = &mut raw[i];
        match prefix {
            "VX" => v.x = f.coord(),
            "VY" => v.y = f.coord(),
            "KIND" => v.kind = f.int(),
            "CX" => v.cx = f.coord(),
            "CY" => v.cy = f.coord(),
            "R" => v.r = f.coord(),
            "SA" => v.sa = f.f64(),
            _ => v.ea = f.f64(),
        }
    }
    raw.into_iter()
        .filter_map(|v| {
            let pos = Point::new(v.x?, v.y?);
            let is_arc = match v.kind {
                Some(kind) => kind == 1,
                None => v.r.is_some_and(|r| r > 0),
            };
            let arc = match (is_arc, v.cx, v.cy, v.r) {
                (true, Some(cx), Some(cy), Some(r)) if r > 0 => Some(ArcSeg {
                    center: Point::new(cx, cy),
                    radius: r,
                    start: v.sa.unwrap_or(0.0),
                    end: v.ea.unwrap_or(360.0),
                }),
                _ => None,
            };
            Some(Vertex { pos, arc })
        })
        .collect()
}

/// Closed contour through the vertices, arcs flattened, in board coordinates.
pub fn contour(ctx: &Context<'_>, vertices: &[Vertex]) -> Vec<Point> {
    let mut out = Vec::new();
    for (i, v) in vertices.iter().enumerate() {
        out.push(ctx.point(v.pos.x, v.pos.y));
        let Some(arc) = v.arc else { continue };
        let mut pts = arc_points(arc.center, arc.radius, arc.start, arc.sweep());
        // walk the arc away from this vertex
        let next = vertices[(i + 1) % vertices.len()].pos;
        if let (Some(first), Some(last)) = (pts.first(), pts.last()) {
            if dist2(*first, next) < dist2(*last, next) {
                pts.reverse();
            }
        }
        let inner = pts.len().saturating_sub(1);
        out.extend(pts[1..inner.max(1)].iter().map(|p| ctx.point(p.x, p.y)));
    }
    out
}

fn dist2(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

// ─── Board header ────────────────────────────────────────────────────

pub fn board(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    let rec = tree.records(RecordKind::Board).first();
    let stack = rec.map(|r| StackDef::read(tree.fields(r))).unwrap_or_default();
    ctx.layers = LayerResolver::build(&mut ctx.board, &stack);
    let Some(rec) = rec else {
        ctx.extent = Extent::Absent;
        return;
    };

    let vertices = read_vertices(tree.fields(rec));
    if vertices.len() >= 3 {
        outline(ctx, &vertices);
        return;
    }

    let mut width = None;
    let mut height = None;
    for f in tree.fields(rec) {
        match f.key() {
            FieldKey::SheetWidth => width = f.coord(),
            FieldKey::SheetHeight => height = f.coord(),
            _ => {}
        }
    }
    ctx.extent = match (width, height) {
        (Some(w), Some(h)) => {
            ctx.board.width = w;
            ctx.board.height = h;
            ctx.flip = YFlip::new(h);
            Extent::Explicit
        }
        (None, None) => Extent::Absent,
        _ => {
            let object = ctx.object(rec);
            ctx.diag(object, "only one of SHEETWIDTH/SHEETHEIGHT; sizing from contents");
            Extent::Partial
        }
    };
}

fn outline(ctx: &mut Context<'_>, vertices: &[Vertex]) {
    let mut max = Point::new(0, 0);
    for v in vertices {
        max.x = max.x.max(v.pos.x);
        max.y = max.y.max(v.pos.y);
        if let Some(a) = v.arc {
            for p in arc_points(a.center, a.radius, a.start, a.sweep()) {
                max.x = max.x.max(p.x);
                max.y = max.y.max(p.y);
            }
        }
    }
    ctx.board.width = max.x;
    ctx.board.height = max.y;
    ctx.flip = YFlip::new(max.y);
    ctx.extent = Extent::Explicit;

    let Some(layer) = ctx.board.find_layer_by_purpose("outline") else {
        return;
    };
    for (i, v) in vertices.iter().enumerate() {
        match v.arc {
            Some(a) => {
                let (start_angle, sweep) = a.mirrored();
                let center = ctx.point(a.center.x, a.center.y);
                ctx.board.arcs.push(Arc {
                    layer,
                    center,
                    radius: a.radius,
                    start_angle,
                    sweep,
                    width: OUTLINE_WIDTH,
                    clearance: 0,
                    net: None,
                    component: None,
                });
            }
            None => {
                let next = vertices[(i + 1) % vertices.len()].pos;
                let (start, end) = (ctx.point(v.pos.x, v.pos.y), ctx.point(next.x, next.y));
                ctx.board.lines.push(Line {
                    layer,
                    start,
                    end,
                    width: OUTLINE_WIDTH,
                    clearance: 0,
                    net: None,
                    component: None,
                });
            }
        }
    }
    let area = PolyArea::from_outline(contour(ctx, vertices));
    ctx.board.outline = Some(area);
}

// ─── Nets and classes ────────────────────────────────────────────────

pub fn nets(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Net) {
        let name = tree
            .fields(rec)
            .find(|f| f.key() == FieldKey::Name)
            .map(|f| f.str().trim().to_string())
            .filter(|n| !n.is_empty());
        let Some(name) = name else {
            let object = ctx.object(rec);
            ctx.diag(object, "net without NAME");
            continue;
        };
        let id = match ctx.board.net_by_name(&name) {
            Some(id) => id,
            None => {
                ctx.board.nets.push(Net { name, class: None });
                NetId(ctx.board.nets.len() - 1)
            }
        };
        ctx.bind_net(rec.index, id);
    }

    let plane_nets = std::mem::take(&mut ctx.layers.plane_nets);
    for (layer, name) in &plane_nets {
        match ctx.board.net_by_name(name) {
            Some(net) => ctx.board.layer_mut(*layer).net = Some(net),
            None => {
                let object = ctx.board.layer(*layer).name.clone();
                ctx.diag(object, format!("plane net '{name}' is not defined"));
            }
        }
    }
    ctx.layers.plane_nets = plane_nets;
}

pub fn classes(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Class) {
        let mut name = None;
        let mut kind = 0;
        let mut superclass = false;
        let mut members = Vec::new();
        for f in tree.fields(rec) {
            match f.key() {
                FieldKey::Name => name = Some(f.str().into_owned()),
                FieldKey::Kind => kind = f.int().unwrap_or(-1),
                FieldKey::SuperClass => superclass = f.bool().unwrap_or(false),
                FieldKey::Unknown if keywords::indexed(&f.raw_key(), "M", "").is_some() => {
                    members.push(f.str().into_owned())
                }
                _ => {}
            }
        }
        if kind != 0 || superclass {
            continue;
        }
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            let object = ctx.object(rec);
            ctx.diag(object, "net class without NAME");
            continue;
        };
        for member in members {
            match ctx.board.net_by_name(&member) {
                Some(id) => {
                    let net = &mut ctx.board.nets[id.0];
                    if net.class.is_none() {
                        net.class = Some(name.clone());
                    }
                }
                None => debug!("PcbDoc: class {name}: unknown member net {member}"),
            }
        }
    }
}

pub fn clearance_rules(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Rule) {
        let result = rules::read_rule(tree.fields(rec))
            .and_then(|rule| match rule {
                Some(rule) => ctx.clearances.apply(&rule, &ctx.board.nets),
                None => Ok(()),
            });
        if let Err(message) = result {
            let object = ctx.object(rec);
            ctx.diag(object, message);
        }
    }
}

// ─── Components and texts ────────────────────────────────────────────

pub fn components(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Component) {
        let mut x = None;
        let mut y = None;
        let mut rotation = 0.0;
        let mut side = Side::Top;
        let mut footprint = String::new();
        let mut refdes = None;
        let mut comment = None;
        for f in tree.fields(rec) {
            match f.key() {
                FieldKey::X => x = f.coord(),
                FieldKey::Y => y = f.coord(),
                FieldKey::Rotation => rotation = f.f64().unwrap_or(0.0),
                FieldKey::Layer => {
                    if LayerRef::from_field(&f).map(LayerRef::side) == Some(Side::Bottom) {
                        side = Side::Bottom;
                    }
                }
                FieldKey::Pattern => footprint = f.str().into_owned(),
                FieldKey::SourceDesignator => refdes = Some(f.str().into_owned()),
                FieldKey::Comment => comment = Some(f.str().into_owned()),
                _ => {}
            }
        }
        let (Some(x), Some(y)) = (x, y) else {
            let object = ctx.object(rec);
            ctx.diag(object, "component with missing or invalid X/Y");
            continue;
        };
        let pos = ctx.point(x, y);
        ctx.board.components.push(Component {
            refdes: refdes.filter(|s| !s.is_empty()),
            footprint,
            comment: comment.filter(|s| !s.is_empty()),
            pos,
            rotation: normalize_deg(-rotation),
            side,
        });
        let id = ComponentId(ctx.board.components.len() - 1);
        ctx.bind_component(rec.index, id);
    }
}

pub fn texts(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Text) {
        let object = ctx.object(rec);
        let mut string = String::new();
        let mut x = None;
        let mut y = None;
        let mut height = None;
        let mut rotation = 0.0;
        let mut mirrored = false;
        let mut layer = None;
        let mut component = None;
        let mut designator = false;
        let mut comment = false;
        for f in tree.fields(rec) {
            match f.key() {
                FieldKey::Text => string = f.str().into_owned(),
                FieldKey::X => x = f.coord(),
                FieldKey::Y => y = f.coord(),
                FieldKey::Height => height = f.coord(),
                FieldKey::Rotation => rotation = f.f64().unwrap_or(0.0),
                FieldKey::Mirror => mirrored = f.bool().unwrap_or(false),
                FieldKey::Layer | FieldKey::V7Layer => layer = LayerRef::from_field(&f),
                FieldKey::Component => component = f.int(),
                FieldKey::IsDesignator => designator = f.bool().unwrap_or(false),
                FieldKey::IsComment => comment = f.bool().unwrap_or(false),
                _ => {}
            }
        }
        let (Some(x), Some(y), Some(height)) = (x, y, height) else {
            ctx.diag(object, "text with missing or invalid X/Y/HEIGHT");
            continue;
        };
        let Some(layer) = layer.and_then(|r| ctx.resolve_layer(r)) else {
            ctx.diag(object, "text on an unknown layer");
            continue;
        };
        let component = match ctx.component(component) {
            Ok(c) => c,
            Err(message) => {
                ctx.diag(object, message);
                continue;
            }
        };
        let role = if designator {
            TextRole::Designator
        } else if comment {
            TextRole::Comment
        } else {
            TextRole::Free
        };

        if let Some(ComponentId(i)) = component {
            let c = &mut ctx.board.components[i];
            let special = string.starts_with('.');
            if role == TextRole::Designator && c.refdes.is_none() && !special && !string.is_empty() {
                c.refdes = Some(string.clone());
            }
            if string.eq_ignore_ascii_case(".Designator") {
                if let Some(r) = &c.refdes {
                    string = r.clone();
                }
            } else if string.eq_ignore_ascii_case(".Comment") {
                if let Some(r) = &c.comment {
                    string = r.clone();
                }
            }
        }

        let pos = ctx.point(x, y);
        ctx.board.texts.push(Text {
            layer,
            pos,
            height,
            rotation: normalize_deg(-rotation),
            mirrored,
            string,
            role,
            component,
        });
    }
}
