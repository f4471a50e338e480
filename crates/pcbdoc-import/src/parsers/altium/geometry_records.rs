//! Conversion of the geometric records: pads, tracks, arcs, vias, polygons
//! and fills.

use super::context::{Context, DeferredHole};
use super::convert::{contour, read_vertices};
use super::keywords::{FieldKey, RecordKind};
use super::layers::LayerRef;
use super::padstack::{build_pad, via_shapes, LevelDef, PadDef, PadShape};
use super::tree::{FieldRef, Record, Value};
use crate::geometry::{normalize_deg, rotate_about, PolyArea, Rect};
use crate::types::{
    Arc, ComponentId, Coord, Hole, HoleSpan, LayerId, Line, NetId, PadLevel, Padstack,
    PadstackKind, Point, Polygon,
};

/// Layer, net and component shared by every primitive.
#[derive(Default)]
struct Owner {
    layer: Option<LayerRef>,
    net: Option<i64>,
    component: Option<i64>,
}

impl Owner {
    /// Consume the field if it is one of the owner keys.
    fn take(&mut self, f: &FieldRef<'_>) -> bool {
        match f.key() {
            FieldKey::Layer => {
                // V7_LAYER is authoritative when both are present
                if self.layer.is_none() {
                    self.layer = LayerRef::from_field(f);
                }
            }
            FieldKey::V7Layer => {
                if let Some(r) = LayerRef::from_field(f) {
                    self.layer = Some(r);
                }
            }
            FieldKey::Net => self.net = f.int(),
            FieldKey::Component => self.component = f.int(),
            _ => return false,
        }
        true
    }
}

/// Bind a record's layer, reporting records without a usable one.
fn record_layer(ctx: &mut Context<'_>, rec: &Record, r: Option<LayerRef>) -> Option<LayerId> {
    let layer = r.and_then(|r| ctx.resolve_layer(r));
    if layer.is_none() {
        let object = ctx.object(rec);
        ctx.diag(object, "missing or unsupported LAYER");
    }
    layer
}

/// Resolve a record's net and component, reporting dangling references.
fn owner_refs(
    ctx: &mut Context<'_>,
    rec: &Record,
    owner: &Owner,
) -> Option<(Option<NetId>, Option<ComponentId>)> {
    let refs = ctx
        .net(owner.net)
        .and_then(|net| Ok((net, ctx.component(owner.component)?)));
    match refs {
        Ok(refs) => Some(refs),
        Err(message) => {
            let object = ctx.object(rec);
            ctx.diag(object, message);
            None
        }
    }
}

fn is_manual(f: &FieldRef<'_>) -> bool {
    match f.value() {
        Value::Int(mode) => mode == 2,
        _ => {
            let s = f.str();
            let s = s.trim();
            s.eq_ignore_ascii_case("Manual") || s == "2"
        }
    }
}

// ─── Pads ────────────────────────────────────────────────────────────

#[derive(Default)]
struct PadLevels {
    shape: Option<PadShape>,
    shapes: [Option<PadShape>; 3],
    sizes: [(Option<Coord>, Option<Coord>); 3],
    /// A shape field held a value that names no shape.
    invalid_shape: bool,
}

impl PadLevels {
    fn read_shape(&mut self, f: &FieldRef<'_>) -> Option<PadShape> {
        let shape = PadShape::from_field(f);
        self.invalid_shape |= shape.is_none();
        shape
    }

    fn top(&self) -> Option<LevelDef> {
        let (sx, sy) = self.sizes[0];
        Some(LevelDef {
            shape: self.shapes[0].or(self.shape).unwrap_or(PadShape::Round),
            sx: sx?,
            sy: sy?,
        })
    }

    /// Level `i`, copying whatever it does not define from the top level.
    fn level(&self, i: usize, top: LevelDef) -> LevelDef {
        let (sx, sy) = self.sizes[i];
        match (sx, sy) {
            (Some(sx), Some(sy)) => LevelDef {
                shape: self.shapes[i].unwrap_or(top.shape),
                sx,
                sy,
            },
            _ => top,
        }
    }
}

pub fn pads(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Pad) {
        let mut owner = Owner::default();
        let mut name = None;
        let mut x = None;
        let mut y = None;
        let mut rotation = 0.0;
        let mut levels = PadLevels::default();
        let mut hole = 0;
        let mut plated = true;
        let mut slot_size = None;
        let mut slot_rotation = 0.0;
        let mut mask_manual = false;
        let mut mask_value = None;
        let mut paste_manual = false;
        let mut paste_value = None;
        for f in tree.fields(rec) {
            if owner.take(&f) {
                continue;
            }
            match f.key() {
                FieldKey::Name => name = Some(f.str().into_owned()),
                FieldKey::X => x = f.coord(),
                FieldKey::Y => y = f.coord(),
                FieldKey::Rotation => rotation = f.f64().unwrap_or(0.0),
                FieldKey::Shape => levels.shape = levels.read_shape(&f),
                FieldKey::TopShape => levels.shapes[0] = levels.read_shape(&f),
                FieldKey::MidShape => levels.shapes[1] = levels.read_shape(&f),
                FieldKey::BotShape => levels.shapes[2] = levels.read_shape(&f),
                FieldKey::TopXSize => levels.sizes[0].0 = f.coord(),
                FieldKey::TopYSize => levels.sizes[0].1 = f.coord(),
                FieldKey::MidXSize => levels.sizes[1].0 = f.coord(),
                FieldKey::MidYSize => levels.sizes[1].1 = f.coord(),
                FieldKey::BotXSize => levels.sizes[2].0 = f.coord(),
                FieldKey::BotYSize => levels.sizes[2].1 = f.coord(),
                FieldKey::HoleSize => hole = f.coord().unwrap_or(0),
                FieldKey::Plated => plated = f.bool().unwrap_or(true),
                FieldKey::SlotSize => slot_size = f.coord(),
                FieldKey::SlotRotation => slot_rotation = f.f64().unwrap_or(0.0),
                FieldKey::SolderMaskExpansionMode => mask_manual = is_manual(&f),
                FieldKey::SolderMaskExpansionManual => mask_value = f.coord(),
                FieldKey::PasteMaskExpansionMode => paste_manual = is_manual(&f),
                FieldKey::PasteMaskExpansionManual => paste_value = f.coord(),
                _ => {}
            }
        }

        let object = ctx.object(rec);
        let (Some(x), Some(y)) = (x, y) else {
            ctx.diag(object, "pad with missing or invalid X/Y");
            continue;
        };
        if levels.invalid_shape {
            ctx.diag(object, "pad with an invalid SHAPE value");
            continue;
        }
        let Some(top) = levels.top() else {
            ctx.diag(object, "pad with missing or invalid TOPXSIZE/TOPYSIZE");
            continue;
        };
        // same rule as vias: no internal level without inner copper
        let inner = ctx.board.copper_stack.len() > 2;
        let (top, internal, bottom, hole) = match owner.layer {
            Some(LayerRef::MultiLayer) => (
                Some(top),
                inner.then(|| levels.level(1, top)),
                Some(levels.level(2, top)),
                hole,
            ),
            Some(LayerRef::Top) => (Some(top), None, None, 0),
            Some(LayerRef::Bottom) => (None, None, Some(levels.level(2, top)), 0),
            _ => {
                ctx.diag(object, "pad on a layer other than top, bottom or multi-layer");
                continue;
            }
        };
        let Some((net, component)) = owner_refs(ctx, rec, &owner) else {
            continue;
        };

        let mask = match (mask_manual, mask_value) {
            (true, Some(v)) => v,
            _ => ctx.opts.default_mask_expansion,
        };
        let paste = match (paste_manual, paste_value) {
            (true, Some(v)) => v,
            _ => ctx.opts.default_paste_expansion,
        };
        let geo = build_pad(&PadDef {
            top,
            internal,
            bottom,
            mask,
            paste,
            rotation: normalize_deg(-rotation),
            hole,
            plated,
            slot: slot_size.map(|s| (s, normalize_deg(-(slot_rotation + rotation)))),
        });

        let padstack = Padstack {
            kind: PadstackKind::Pad,
            name: name.filter(|n| !n.is_empty()),
            pos: ctx.point(x, y),
            rotation: normalize_deg(-rotation),
            shapes: geo.shapes,
            hole: geo.hole,
            slot: geo.slot,
            clearance: ctx.clearance(None, net),
            net,
            component,
            thermals: Vec::new(),
        };
        push_padstack(ctx, padstack);
    }
}

fn push_padstack(ctx: &mut Context<'_>, padstack: Padstack) {
    if let (true, Some(net)) = (padstack.is_drilled(), padstack.net) {
        ctx.object_nets.push((ctx.board.padstacks.len(), net));
    }
    ctx.board.padstacks.push(padstack);
}

// ─── Tracks and arcs ─────────────────────────────────────────────────

pub fn tracks(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Track) {
        let mut owner = Owner::default();
        let mut ends = [None; 4];
        let mut width = None;
        for f in tree.fields(rec) {
            if owner.take(&f) {
                continue;
            }
            match f.key() {
                FieldKey::X1 => ends[0] = f.coord(),
                FieldKey::Y1 => ends[1] = f.coord(),
                FieldKey::X2 => ends[2] = f.coord(),
                FieldKey::Y2 => ends[3] = f.coord(),
                FieldKey::Width => width = f.coord(),
                _ => {}
            }
        }
        let ([Some(x1), Some(y1), Some(x2), Some(y2)], Some(width)) = (ends, width) else {
            let object = ctx.object(rec);
            ctx.diag(object, "track with missing or invalid X1/Y1/X2/Y2/WIDTH");
            continue;
        };
        let Some(layer) = record_layer(ctx, rec, owner.layer) else {
            continue;
        };
        let Some((net, component)) = owner_refs(ctx, rec, &owner) else {
            continue;
        };
        let line = Line {
            layer,
            start: ctx.point(x1, y1),
            end: ctx.point(x2, y2),
            width,
            clearance: ctx.clearance(Some(layer), net),
            net,
            component,
        };
        ctx.board.lines.push(line);
    }
}

pub fn arcs(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Arc) {
        let mut owner = Owner::default();
        let mut x = None;
        let mut y = None;
        let mut radius = None;
        let mut width = None;
        let mut start = 0.0;
        let mut end = 360.0;
        for f in tree.fields(rec) {
            if owner.take(&f) {
                continue;
            }
            match f.key() {
                FieldKey::X => x = f.coord(),
                FieldKey::Y => y = f.coord(),
                FieldKey::Radius => radius = f.coord(),
                FieldKey::Width => width = f.coord(),
                FieldKey::StartAngle => start = f.f64().unwrap_or(0.0),
                FieldKey::EndAngle => end = f.f64().unwrap_or(360.0),
                _ => {}
            }
        }
        let (Some(x), Some(y), Some(radius), Some(width)) = (x, y, radius, width) else {
            let object = ctx.object(rec);
            ctx.diag(object, "arc with missing or invalid X/Y/RADIUS/WIDTH");
            continue;
        };
        let Some(layer) = record_layer(ctx, rec, owner.layer) else {
            continue;
        };
        let Some((net, component)) = owner_refs(ctx, rec, &owner) else {
            continue;
        };
        let sweep = match normalize_deg(end - start) {
            s if s == 0.0 => 360.0,
            s => s,
        };
        let arc = Arc {
            layer,
            center: ctx.point(x, y),
            radius,
            start_angle: normalize_deg(-end),
            sweep,
            width,
            clearance: ctx.clearance(Some(layer), net),
            net,
            component,
        };
        ctx.board.arcs.push(arc);
    }
}

// ─── Vias ────────────────────────────────────────────────────────────

/// Copper levels a via reaches and its span when it is blind or buried.
fn via_span(
    ctx: &Context<'_>,
    start: Option<LayerRef>,
    end: Option<LayerRef>,
) -> Result<(Vec<PadLevel>, Option<HoleSpan>), String> {
    let count = ctx.board.copper_stack.len();
    let (lo, hi) = match (start, end) {
        (None, None) => (0, count - 1),
        (Some(a), Some(b)) => {
            let index = |r: LayerRef| {
                if !r.is_copper() {
                    return Err(format!("via layer {r:?} is not a copper layer"));
                }
                ctx.layers
                    .copper(r)
                    .and_then(|id| ctx.board.copper_index(id))
                    .ok_or_else(|| format!("via layer {r:?} is not in the layer stack"))
            };
            let (a, b) = (index(a)?, index(b)?);
            (a.min(b), a.max(b))
        }
        _ => return Err("via with only one of STARTLAYER/ENDLAYER".to_string()),
    };
    let mut levels = Vec::new();
    if lo == 0 {
        levels.push(PadLevel::Top);
    }
    if (lo..=hi).any(|k| k > 0 && k < count - 1) {
        levels.push(PadLevel::Internal);
    }
    if hi == count - 1 {
        levels.push(PadLevel::Bottom);
    }
    let span = (lo != 0 || hi != count - 1).then(|| HoleSpan {
        top: lo,
        bottom: count - 1 - hi,
    });
    Ok((levels, span))
}

pub fn vias(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Via) {
        let mut owner = Owner::default();
        let mut x = None;
        let mut y = None;
        let mut diameter = None;
        let mut hole = None;
        let mut start = None;
        let mut end = None;
        let mut open_top = false;
        let mut open_bottom = false;
        for f in tree.fields(rec) {
            if owner.take(&f) {
                continue;
            }
            match f.key() {
                FieldKey::X => x = f.coord(),
                FieldKey::Y => y = f.coord(),
                FieldKey::Diameter => diameter = f.coord(),
                FieldKey::HoleSize => hole = f.coord(),
                FieldKey::StartLayer => start = LayerRef::from_field(&f),
                FieldKey::EndLayer => end = LayerRef::from_field(&f),
                FieldKey::TentingTop => open_top = f.bool() == Some(false),
                FieldKey::TentingBottom => open_bottom = f.bool() == Some(false),
                _ => {}
            }
        }
        let object = ctx.object(rec);
        let (Some(x), Some(y), Some(diameter), Some(hole)) = (x, y, diameter, hole) else {
            ctx.diag(object, "via with missing or invalid X/Y/DIAMETER/HOLESIZE");
            continue;
        };
        let (levels, span) = match via_span(ctx, start, end) {
            Ok(v) => v,
            Err(message) => {
                ctx.diag(object, message);
                continue;
            }
        };
        let Some((net, component)) = owner_refs(ctx, rec, &owner) else {
            continue;
        };
        let opening = diameter + 2 * ctx.opts.default_mask_expansion;
        let mask_top = (open_top && levels.contains(&PadLevel::Top)).then_some(opening);
        let mask_bottom = (open_bottom && levels.contains(&PadLevel::Bottom)).then_some(opening);

        let padstack = Padstack {
            kind: PadstackKind::Via,
            name: None,
            pos: ctx.point(x, y),
            rotation: 0.0,
            shapes: via_shapes(diameter, &levels, mask_top, mask_bottom),
            hole: Some(Hole {
                diameter: hole,
                plated: true,
                span,
            }),
            slot: None,
            clearance: ctx.clearance(None, net),
            net,
            component,
            thermals: Vec::new(),
        };
        push_padstack(ctx, padstack);
    }
}

// ─── Polygons and fills ──────────────────────────────────────────────

pub fn polygons(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Polygon) {
        let mut owner = Owner::default();
        for f in tree.fields(rec) {
            owner.take(&f);
        }
        let vertices = read_vertices(tree.fields(rec));
        let object = ctx.object(rec);
        if vertices.len() < 3 {
            ctx.diag(object, "polygon with fewer than 3 vertices");
            continue;
        }
        let Some(layer) = record_layer(ctx, rec, owner.layer) else {
            continue;
        };
        if ctx.is_plane(layer) {
            ctx.diag(object, "polygon on a plane layer");
            continue;
        }
        let Some((net, component)) = owner_refs(ctx, rec, &owner) else {
            continue;
        };
        let polygon = Polygon {
            layer,
            area: PolyArea::from_outline(contour(ctx, &vertices)),
            clearance: ctx.clearance(Some(layer), net),
            net,
            component,
        };
        ctx.board.polygons.push(polygon);
    }
}

pub fn fills(ctx: &mut Context<'_>) {
    let tree = ctx.tree;
    for rec in tree.records(RecordKind::Fill) {
        let mut owner = Owner::default();
        let mut corners = [None; 4];
        let mut rotation = 0.0;
        for f in tree.fields(rec) {
            if owner.take(&f) {
                continue;
            }
            match f.key() {
                FieldKey::X1 => corners[0] = f.coord(),
                FieldKey::Y1 => corners[1] = f.coord(),
                FieldKey::X2 => corners[2] = f.coord(),
                FieldKey::Y2 => corners[3] = f.coord(),
                FieldKey::Rotation => rotation = f.f64().unwrap_or(0.0),
                _ => {}
            }
        }
        let object = ctx.object(rec);
        let [Some(x1), Some(y1), Some(x2), Some(y2)] = corners else {
            ctx.diag(object, "fill with missing or invalid X1/Y1/X2/Y2");
            continue;
        };
        let Some(layer) = record_layer(ctx, rec, owner.layer) else {
            continue;
        };
        let source = Rect::new(Point::new(x1, y1), Point::new(x2, y2));
        let center = source.center();
        let points: Vec<Point> = source
            .contour()
            .into_iter()
            .map(|p| rotate_about(p, center, rotation))
            .map(|p| ctx.point(p.x, p.y))
            .collect();
        if ctx.is_plane(layer) {
            // cutouts are axis-aligned; a rotated fill cuts its bounding rect
            let rect = Rect::from_bbox(&PolyArea::from_outline(points).bbox());
            ctx.deferred.push(DeferredHole {
                layer,
                rect,
                object,
            });
            continue;
        }
        let Some((net, component)) = owner_refs(ctx, rec, &owner) else {
            continue;
        };
        let polygon = Polygon {
            layer,
            area: PolyArea::from_outline(points),
            clearance: ctx.clearance(Some(layer), net),
            net,
            component,
        };
        ctx.board.polygons.push(polygon);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::parsers::altium::ascii;
    use crate::parsers::altium::convert;
    use crate::parsers::altium::tree::Tree;
    use crate::parsers::altium::units::mil;
    use crate::types::{LayerKind, NetId, Shape, ShapeRole};
    use crate::ImportOptions;

    const HEADER: &str = "RECORD=Board|SHEETWIDTH=1000mil|SHEETHEIGHT=1000mil\
|LAYER1NEXT=2|LAYER2PREV=1|LAYER2NEXT=39|LAYER39PREV=2|LAYER39NEXT=32|LAYER32PREV=39\
|PLANE1NETNAME=GND\nRECORD=Net|NAME=GND\nRECORD=Net|NAME=SIG\n";

    fn tree(body: &str) -> Tree {
        tree_with(HEADER, body)
    }

    fn tree_with(header: &str, body: &str) -> Tree {
        let mut tree = Tree::new();
        let text = format!("{header}{body}");
        ascii::parse(text.as_bytes(), 4096, &mut tree).unwrap();
        tree
    }

    fn run<'a>(tree: &'a Tree, opts: &'a ImportOptions) -> Context<'a> {
        let mut ctx = Context::new(tree, opts);
        convert::board(&mut ctx);
        convert::nets(&mut ctx);
        pads(&mut ctx);
        tracks(&mut ctx);
        arcs(&mut ctx);
        vias(&mut ctx);
        polygons(&mut ctx);
        fills(&mut ctx);
        ctx
    }

    #[test]
    fn test_stack_from_header() {
        let t = tree("");
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.copper_stack.len(), 4);
        let plane = ctx.board.copper_stack[2];
        assert!(ctx.is_plane(plane));
        assert_eq!(ctx.board.layer(plane).net, Some(NetId(0)));
    }

    #[test]
    fn test_multilayer_pad_copies_levels() {
        let t = tree(
            "RECORD=Pad|NAME=1|LAYER=MULTILAYER|NET=0|X=100mil|Y=100mil|SHAPE=ROUND\
|TOPXSIZE=60mil|TOPYSIZE=60mil|HOLESIZE=35mil|ROTATION=0\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        let pad = &ctx.board.padstacks[0];
        assert_eq!(pad.name.as_deref(), Some("1"));
        assert_eq!(pad.pos, Point::new(mil(100.0), mil(900.0)));
        for level in [PadLevel::Top, PadLevel::Internal, PadLevel::Bottom] {
            assert_eq!(
                pad.shapes_on(level, ShapeRole::Copper).next(),
                Some(&Shape::Circle {
                    center: Point::default(),
                    diameter: mil(60.0)
                })
            );
        }
        // default expansion of 4 mil on each side
        assert_eq!(
            pad.shapes_on(PadLevel::Top, ShapeRole::Mask).next(),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(68.0)
            })
        );
        assert_eq!(pad.shapes_on(PadLevel::Internal, ShapeRole::Mask).count(), 0);
        assert_eq!(pad.shapes_on(PadLevel::Top, ShapeRole::Paste).count(), 0);
        assert_eq!(pad.hole.as_ref().map(|h| h.diameter), Some(mil(35.0)));
        assert_eq!(ctx.object_nets, vec![(0, NetId(0))]);
        assert_eq!(pad.clearance, mil(10.0));
    }

    #[test]
    fn test_smd_pads_and_manual_expansion() {
        let t = tree(
            "RECORD=Pad|NAME=A|LAYER=TOP|X=0|Y=0|TOPSHAPE=RECTANGLE|TOPXSIZE=20mil|TOPYSIZE=40mil\
|HOLESIZE=0|SOLDERMASKEXPANSIONMODE=Manual|SOLDERMASKEXPANSION_MANUAL=1mil\
|PASTEMASKEXPANSIONMODE=Manual|PASTEMASKEXPANSION_MANUAL=-2mil\n\
RECORD=Pad|NAME=B|LAYER=BOTTOM|X=0|Y=0|TOPSHAPE=ROUND|TOPXSIZE=20mil|TOPYSIZE=20mil\
|BOTSHAPE=ROUND|BOTXSIZE=30mil|BOTYSIZE=30mil\n\
RECORD=Pad|NAME=C|LAYER=MID1|X=0|Y=0|TOPXSIZE=20mil|TOPYSIZE=20mil\n\
RECORD=Pad|NAME=D|LAYER=TOP|X=0|Y=0\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.padstacks.len(), 2);
        assert_eq!(ctx.diagnostics.len(), 2);

        let a = &ctx.board.padstacks[0];
        assert!(!a.is_drilled());
        assert_eq!(a.shapes_on(PadLevel::Bottom, ShapeRole::Copper).count(), 0);
        let Some(Shape::Polygon { points }) = a.shapes_on(PadLevel::Top, ShapeRole::Mask).next()
        else {
            panic!("expected a polygon mask");
        };
        let width = points.iter().map(|p| p.x).max().unwrap() - points.iter().map(|p| p.x).min().unwrap();
        assert_eq!(width, mil(22.0));
        let Some(Shape::Polygon { points }) = a.shapes_on(PadLevel::Top, ShapeRole::Paste).next()
        else {
            panic!("expected a polygon paste");
        };
        let height = points.iter().map(|p| p.y).max().unwrap() - points.iter().map(|p| p.y).min().unwrap();
        assert_eq!(height, mil(36.0));

        let b = &ctx.board.padstacks[1];
        assert_eq!(b.shapes_on(PadLevel::Top, ShapeRole::Copper).count(), 0);
        assert_eq!(
            b.shapes_on(PadLevel::Bottom, ShapeRole::Copper).next(),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(30.0)
            })
        );
        assert!(ctx.object_nets.is_empty());
    }

    #[test]
    fn test_slotted_pad() {
        let t = tree(
            "RECORD=Pad|LAYER=MULTILAYER|X=0|Y=0|SHAPE=ROUND|TOPXSIZE=80mil|TOPYSIZE=40mil\
|HOLESIZE=20mil|SLOTSIZE=60mil|SLOTROTATION=90\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        let pad = &ctx.board.padstacks[0];
        assert!(pad.hole.is_none());
        let slot = pad.slot.as_ref().unwrap();
        assert_eq!(slot.thickness, mil(20.0));
        // 90 degrees in the file becomes a vertical slot on the board
        assert_eq!(slot.start.x, 0);
        assert_eq!((slot.end.y - slot.start.y).abs(), mil(40.0));
    }

    #[test]
    fn test_tracks_and_arcs() {
        let t = tree(
            "RECORD=Track|LAYER=TOP|NET=1|X1=0|Y1=0|X2=100mil|Y2=0|WIDTH=10mil\n\
RECORD=Track|LAYER=TOPOVERLAY|X1=0|Y1=0|X2=100mil|Y2=0|WIDTH=10mil\n\
RECORD=Track|LAYER=TOP|X1=0|Y1=0|X2=100mil\n\
RECORD=Track|LAYER=MID9|X1=0|Y1=0|X2=1|Y2=1|WIDTH=1\n\
RECORD=Arc|LAYER=BOTTOM|X=500mil|Y=500mil|RADIUS=50mil|STARTANGLE=0|ENDANGLE=90|WIDTH=8mil\n\
RECORD=Arc|LAYER=BOTTOM|X=500mil|Y=500mil|RADIUS=50mil|STARTANGLE=45|ENDANGLE=45|WIDTH=8mil\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.lines.len(), 2);
        assert_eq!(ctx.diagnostics.len(), 2);
        let copper = &ctx.board.lines[0];
        assert_eq!(copper.net, Some(NetId(1)));
        assert_eq!(copper.clearance, mil(10.0));
        assert_eq!(copper.end, Point::new(mil(100.0), mil(1000.0)));
        let silk = &ctx.board.lines[1];
        assert_eq!(ctx.board.layer(silk.layer).kind, LayerKind::Silk);
        assert_eq!(silk.clearance, 0);

        let quarter = &ctx.board.arcs[0];
        assert_abs_diff_eq!(quarter.start_angle, 270.0);
        assert_abs_diff_eq!(quarter.sweep, 90.0);
        assert_abs_diff_eq!(ctx.board.arcs[1].sweep, 360.0);
    }

    #[test]
    fn test_via_spans() {
        let t = tree(
            "RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil|NET=1\n\
RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil|STARTLAYER=TOP|ENDLAYER=MID1\n\
RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil|STARTLAYER=BOTTOM|ENDLAYER=PLANE1\n\
RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil|STARTLAYER=TOP|ENDLAYER=BOTTOM\
|TENTINGTOP=FALSE|TENTINGBOTTOM=TRUE\n\
RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil|STARTLAYER=TOP\n\
RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil|STARTLAYER=TOP|ENDLAYER=TOPOVERLAY\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.padstacks.len(), 4);
        assert_eq!(ctx.diagnostics.len(), 2);

        let through = &ctx.board.padstacks[0];
        assert_eq!(through.hole.as_ref().unwrap().span, None);
        assert_eq!(through.shapes.len(), 3);

        let blind = &ctx.board.padstacks[1];
        assert_eq!(
            blind.hole.as_ref().unwrap().span,
            Some(HoleSpan { top: 0, bottom: 2 })
        );
        assert_eq!(blind.shapes_on(PadLevel::Bottom, ShapeRole::Copper).count(), 0);

        let buried = &ctx.board.padstacks[2];
        assert_eq!(
            buried.hole.as_ref().unwrap().span,
            Some(HoleSpan { top: 2, bottom: 0 })
        );
        assert_eq!(buried.shapes_on(PadLevel::Top, ShapeRole::Copper).count(), 0);

        let tented = &ctx.board.padstacks[3];
        assert_eq!(tented.hole.as_ref().unwrap().span, None);
        assert_eq!(
            tented.shapes_on(PadLevel::Top, ShapeRole::Mask).next(),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(32.0)
            })
        );
        assert_eq!(tented.shapes_on(PadLevel::Bottom, ShapeRole::Mask).count(), 0);
    }

    #[test]
    fn test_polygons_and_fills() {
        let t = tree(
            "RECORD=Polygon|LAYER=TOP|NET=1|VX0=0|VY0=0|VX1=100mil|VY1=0|VX2=100mil|VY2=100mil\n\
RECORD=Polygon|LAYER=TOP|VX0=0|VY0=0|VX1=100mil|VY1=0\n\
RECORD=Polygon|LAYER=PLANE1|VX0=0|VY0=0|VX1=100mil|VY1=0|VX2=100mil|VY2=100mil\n\
RECORD=Fill|LAYER=TOP|X1=0|Y1=0|X2=100mil|Y2=50mil|ROTATION=90\n\
RECORD=Fill|LAYER=PLANE1|X1=200mil|Y1=200mil|X2=300mil|Y2=300mil\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.polygons.len(), 2);
        assert_eq!(ctx.diagnostics.len(), 2);
        let triangle = &ctx.board.polygons[0];
        let leg = mil(100.0) as f64;
        assert_abs_diff_eq!(triangle.area.area(), leg * leg / 2.0, epsilon = 1.0);

        let fill = &ctx.board.polygons[1];
        let bbox = fill.area.bbox();
        assert_eq!(bbox.maxx - bbox.minx, mil(50.0));
        assert_eq!(bbox.maxy - bbox.miny, mil(100.0));

        assert_eq!(ctx.deferred.len(), 1);
        assert_eq!(
            ctx.deferred[0].rect,
            Rect::new(
                Point::new(mil(200.0), mil(700.0)),
                Point::new(mil(300.0), mil(800.0))
            )
        );
    }

    #[test]
    fn test_dangling_references_skip_the_object() {
        let t = tree(
            "RECORD=Track|LAYER=TOP|NET=5|X1=0|Y1=0|X2=100mil|Y2=0|WIDTH=10mil\n\
RECORD=Track|LAYER=TOP|NET=-1|X1=0|Y1=0|X2=100mil|Y2=0|WIDTH=10mil\n\
RECORD=Arc|LAYER=TOP|COMPONENT=0|X=0|Y=0|RADIUS=10mil|WIDTH=1mil\n\
RECORD=Pad|LAYER=TOP|NET=1|COMPONENT=4|X=0|Y=0|TOPXSIZE=20mil|TOPYSIZE=20mil\n\
RECORD=Via|NET=7|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil\n\
RECORD=Polygon|LAYER=TOP|NET=2|VX0=0|VY0=0|VX1=100mil|VY1=0|VX2=100mil|VY2=100mil\n\
RECORD=Fill|LAYER=TOP|NET=3|X1=0|Y1=0|X2=100mil|Y2=50mil\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.lines.len(), 1);
        assert_eq!(ctx.board.lines[0].net, None);
        assert!(ctx.board.arcs.is_empty());
        assert!(ctx.board.padstacks.is_empty());
        assert!(ctx.board.polygons.is_empty());
        assert_eq!(ctx.diagnostics.len(), 6);
        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.object == "Track #0" && d.message.contains("NET 5")));
        assert!(ctx
            .diagnostics
            .iter()
            .any(|d| d.object == "Arc #0" && d.message.contains("COMPONENT 0")));
    }

    #[test]
    fn test_invalid_pad_shape_is_reported() {
        let t = tree(
            "RECORD=Pad|LAYER=TOP|X=0|Y=0|SHAPE=HEXAGON|TOPXSIZE=20mil|TOPYSIZE=20mil\n\
RECORD=Pad|LAYER=TOP|X=0|Y=0|TOPSHAPE=7|TOPXSIZE=20mil|TOPYSIZE=20mil\n\
RECORD=Pad|LAYER=TOP|X=0|Y=0|TOPXSIZE=20mil|TOPYSIZE=20mil\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        // a pad without any shape field is round
        assert_eq!(ctx.board.padstacks.len(), 1);
        assert_eq!(
            ctx.board.padstacks[0].shapes_on(PadLevel::Top, ShapeRole::Copper).next(),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(20.0)
            })
        );
        assert_eq!(ctx.diagnostics.len(), 2);
        assert!(ctx.diagnostics.iter().all(|d| d.message.contains("SHAPE")));
    }

    #[test]
    fn test_round_pad_mask_shrunk_away() {
        let t = tree(
            "RECORD=Pad|LAYER=TOP|X=0|Y=0|SHAPE=ROUND|TOPXSIZE=20mil|TOPYSIZE=20mil\
|SOLDERMASKEXPANSIONMODE=Manual|SOLDERMASKEXPANSION_MANUAL=-10mil\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        let pad = &ctx.board.padstacks[0];
        assert_eq!(pad.shapes_on(PadLevel::Top, ShapeRole::Copper).count(), 1);
        assert_eq!(pad.shapes_on(PadLevel::Top, ShapeRole::Mask).count(), 0);
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_two_layer_board_has_no_internal_level() {
        let t = tree_with(
            "RECORD=Board|SHEETWIDTH=1000mil|SHEETHEIGHT=1000mil\n",
            "RECORD=Pad|LAYER=MULTILAYER|X=0|Y=0|SHAPE=ROUND|TOPXSIZE=60mil|TOPYSIZE=60mil\
|HOLESIZE=30mil\n\
RECORD=Via|X=0|Y=0|DIAMETER=24mil|HOLESIZE=12mil\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.board.copper_stack.len(), 2);
        for padstack in &ctx.board.padstacks {
            assert_eq!(padstack.shapes_on(PadLevel::Internal, ShapeRole::Copper).count(), 0);
            assert_eq!(padstack.shapes_on(PadLevel::Top, ShapeRole::Copper).count(), 1);
            assert_eq!(padstack.shapes_on(PadLevel::Bottom, ShapeRole::Copper).count(), 1);
        }
    }

    #[test]
    fn test_rotated_plane_fill_defers_its_bounding_rect() {
        let t = tree(
            "RECORD=Fill|LAYER=PLANE1|X1=200mil|Y1=200mil|X2=300mil|Y2=250mil|ROTATION=90\n",
        );
        let opts = ImportOptions::default();
        let ctx = run(&t, &opts);
        assert_eq!(ctx.deferred.len(), 1);
        let rect = ctx.deferred[0].rect;
        assert_eq!(rect.width(), mil(50.0));
        assert_eq!(rect.height(), mil(100.0));
        assert_eq!(rect.center(), Point::new(mil(250.0), mil(775.0)));
    }
}
