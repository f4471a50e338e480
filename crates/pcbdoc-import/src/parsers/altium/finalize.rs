//! Last pass over a converted board: extent normalization, plane polygons,
//! antipads and thermal relief.

use log::debug;

use super::context::{Context, Extent};
use crate::geometry::{PolyArea, Rect};
use crate::types::{BBox, Board, Coord, Padstack, Point, Polygon, Shape};

pub fn finalize(ctx: &mut Context<'_>) {
    if ctx.extent != Extent::Explicit {
        normalize_extent(ctx);
    }
    plane_polygons(ctx);
    antipads(ctx);
    thermals(ctx);
}

fn expand_padstack(bbox: &mut BBox, p: &Padstack) {
    for s in &p.shapes {
        match &s.shape {
            Shape::Circle { center, diameter } => {
                bbox.expand_disc(p.pos.offset(center.x, center.y), diameter / 2)
            }
            Shape::Line {
                start,
                end,
                thickness,
            } => {
                bbox.expand_disc(p.pos.offset(start.x, start.y), thickness / 2);
                bbox.expand_disc(p.pos.offset(end.x, end.y), thickness / 2);
            }
            Shape::Polygon { points } => {
                for q in points {
                    let q = p.pos.offset(q.x, q.y);
                    bbox.expand_point(q.x, q.y);
                }
            }
        }
    }
    if let Some(hole) = &p.hole {
        bbox.expand_disc(p.pos, hole.diameter / 2);
    }
    if let Some(slot) = &p.slot {
        bbox.expand_disc(p.pos.offset(slot.start.x, slot.start.y), slot.thickness / 2);
        bbox.expand_disc(p.pos.offset(slot.end.x, slot.end.y), slot.thickness / 2);
    }
}

/// Bounding box of everything drawn on the board.
pub fn board_bbox(board: &Board) -> BBox {
    let mut bbox = BBox::empty();
    for l in &board.lines {
        bbox.expand_disc(l.start, l.width / 2);
        bbox.expand_disc(l.end, l.width / 2);
    }
    for a in &board.arcs {
        bbox.expand_disc(a.center, a.radius + a.width / 2);
    }
    for p in &board.polygons {
        let b = p.area.bbox();
        if !b.is_empty() {
            bbox.expand_point(b.minx, b.miny);
            bbox.expand_point(b.maxx, b.maxy);
        }
    }
    for p in &board.padstacks {
        expand_padstack(&mut bbox, p);
    }
    for t in &board.texts {
        bbox.expand_point(t.pos.x, t.pos.y);
    }
    for c in &board.components {
        bbox.expand_point(c.pos.x, c.pos.y);
    }
    bbox
}

fn translate(board: &mut Board, dx: Coord, dy: Coord) {
    let mv = |p: &mut Point| *p = p.offset(dx, dy);
    for l in &mut board.lines {
        mv(&mut l.start);
        mv(&mut l.end);
    }
    for a in &mut board.arcs {
        mv(&mut a.center);
    }
    for p in &mut board.polygons {
        p.area.translate(dx, dy);
    }
    for p in &mut board.padstacks {
        mv(&mut p.pos);
    }
    for t in &mut board.texts {
        mv(&mut t.pos);
    }
    for c in &mut board.components {
        mv(&mut c.pos);
    }
    if let Some(outline) = &mut board.outline {
        outline.translate(dx, dy);
    }
}

/// Size the board from its contents and move the minimum corner to the origin.
fn normalize_extent(ctx: &mut Context<'_>) {
    let mut bbox = board_bbox(&ctx.board);
    for hole in &ctx.deferred {
        bbox.expand_point(hole.rect.x1, hole.rect.y1);
        bbox.expand_point(hole.rect.x2, hole.rect.y2);
    }
    if bbox.is_empty() {
        ctx.board.width = 0;
        ctx.board.height = 0;
        return;
    }
    let (dx, dy) = (bbox.minx.saturating_neg(), bbox.miny.saturating_neg());
    translate(&mut ctx.board, dx, dy);
    ctx.shift = (dx, dy);
    ctx.board.width = bbox.maxx.saturating_sub(bbox.minx);
    ctx.board.height = bbox.maxy.saturating_sub(bbox.miny);
    debug!(
        "PcbDoc: board sized from contents, {}x{} nm, shifted by ({dx}, {dy})",
        ctx.board.width, ctx.board.height
    );
}

/// Every plane layer gets one polygon covering the board.
fn plane_polygons(ctx: &mut Context<'_>) {
    let board_rect = Rect::new(Point::new(0, 0), Point::new(ctx.board.width, ctx.board.height));
    let planes: Vec<_> = ctx.board.plane_layers().collect();
    for layer in planes {
        if ctx.board.polygons.iter().any(|p| p.layer == layer) {
            continue;
        }
        let net = ctx.board.layer(layer).net;
        let polygon = Polygon {
            layer,
            area: PolyArea::from_rect(&board_rect),
            clearance: ctx.clearance(Some(layer), net),
            net,
            component: None,
        };
        ctx.board.polygons.push(polygon);
    }
}

fn antipads(ctx: &mut Context<'_>) {
    let (dx, dy) = ctx.shift;
    for hole in std::mem::take(&mut ctx.deferred) {
        let rect = hole.rect.offset(dx, dy);
        match ctx.board.polygons.iter_mut().find(|p| p.layer == hole.layer) {
            Some(polygon) => polygon.area = polygon.area.subtract_rect(&rect),
            None => ctx.diag(hole.object, "plane cutout on a layer without a plane polygon"),
        }
    }
}

fn thermals(ctx: &mut Context<'_>) {
    let planes: Vec<_> = ctx
        .board
        .plane_layers()
        .filter_map(|l| ctx.board.layer(l).net.map(|net| (l, net)))
        .collect();
    for &(index, net) in &ctx.object_nets {
        let padstack = &mut ctx.board.padstacks[index];
        padstack.thermals.extend(
            planes
                .iter()
                .filter(|(_, plane_net)| *plane_net == net)
                .map(|(layer, _)| *layer),
        );
    }
}
