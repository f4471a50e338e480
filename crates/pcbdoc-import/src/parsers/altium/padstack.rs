//! Padstack geometry: per-level copper, mask and paste shapes plus the drill.

use super::keywords::ShapeName;
use super::tree::{FieldRef, Value};
use crate::geometry::{octagon_points, rect_points, rotate};
use crate::types::{Coord, Hole, PadLevel, Point, Shape, ShapeRole, Slot, StackShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadShape {
    Round,
    Rectangle,
    Octagonal,
    RoundedRectangle,
}

impl PadShape {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Round),
            2 => Some(Self::Rectangle),
            3 => Some(Self::Octagonal),
            9 => Some(Self::RoundedRectangle),
            _ => None,
        }
    }

    pub fn from_field(field: &FieldRef<'_>) -> Option<Self> {
        if let Value::Int(code) = field.value() {
            return Self::from_code(code);
        }
        let s = field.str();
        if let Ok(code) = s.trim().parse() {
            return Self::from_code(code);
        }
        match ShapeName::lookup(s.trim().as_bytes()) {
            ShapeName::Round => Some(Self::Round),
            ShapeName::Rectangle => Some(Self::Rectangle),
            ShapeName::Octagonal => Some(Self::Octagonal),
            ShapeName::RoundedRectangle => Some(Self::RoundedRectangle),
            ShapeName::Unknown => None,
        }
    }
}

/// Shape and size of one pad level, before expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelDef {
    pub shape: PadShape,
    pub sx: Coord,
    pub sy: Coord,
}

/// Outline of `level` grown by `grow` on every side, rotated by `rotation`
/// degrees. Nothing is produced once a dimension shrinks to zero.
pub fn level_shape(level: &LevelDef, grow: Coord, rotation: f64) -> Option<Shape> {
    let sx = level.sx + 2 * grow;
    let sy = level.sy + 2 * grow;
    if sx <= 0 || sy <= 0 {
        return None;
    }
    let polygon = |points: Vec<Point>| Shape::Polygon {
        points: points.into_iter().map(|p| rotate(p, rotation)).collect(),
    };
    Some(match level.shape {
        PadShape::Round if sx == sy => Shape::Circle {
            center: Point::default(),
            diameter: sx,
        },
        PadShape::Round => {
            let thickness = sx.min(sy);
            let half = (sx.max(sy) - thickness) / 2;
            let end = if sx > sy {
                Point::new(half, 0)
            } else {
                Point::new(0, half)
            };
            Shape::Line {
                start: rotate(Point::new(-end.x, -end.y), rotation),
                end: rotate(end, rotation),
                thickness,
            }
        }
        PadShape::Octagonal => polygon(octagon_points(sx, sy)),
        // rounded corners are not modelled
        PadShape::Rectangle | PadShape::RoundedRectangle => polygon(rect_points(sx, sy)),
    })
}

/// Everything needed to synthesize a pad's padstack.
#[derive(Debug, Clone, PartialEq)]
pub struct PadDef {
    pub top: Option<LevelDef>,
    pub internal: Option<LevelDef>,
    pub bottom: Option<LevelDef>,
    pub mask: Coord,
    pub paste: Coord,
    /// Board-frame rotation in degrees.
    pub rotation: f64,
    pub hole: Coord,
    pub plated: bool,
    /// Slot length and its own rotation, in board-frame degrees.
    pub slot: Option<(Coord, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadGeometry {
    pub shapes: Vec<StackShape>,
    pub hole: Option<Hole>,
    pub slot: Option<Slot>,
}

/// Paste goes on undrilled pads only. The internal level is copper alone.
pub fn build_pad(def: &PadDef) -> PadGeometry {
    let mut geo = PadGeometry::default();
    let drilled = def.hole > 0;
    let mut push = |level: PadLevel, role: ShapeRole, shape: Option<Shape>| {
        if let Some(shape) = shape {
            geo.shapes.push(StackShape { level, role, shape });
        }
    };
    for (level, def_level) in [(PadLevel::Top, def.top), (PadLevel::Bottom, def.bottom)] {
        let Some(l) = def_level else { continue };
        push(level, ShapeRole::Copper, level_shape(&l, 0, def.rotation));
        push(level, ShapeRole::Mask, level_shape(&l, def.mask, def.rotation));
        if !drilled {
            push(level, ShapeRole::Paste, level_shape(&l, def.paste, def.rotation));
        }
    }
    if let Some(l) = def.internal {
        push(PadLevel::Internal, ShapeRole::Copper, level_shape(&l, 0, def.rotation));
    }

    if !drilled {
        return geo;
    }
    match def.slot {
        Some((length, slot_rotation)) if length > 0 && length != def.hole => {
            let thickness = length.min(def.hole);
            let half = (length - def.hole).abs() / 2;
            geo.slot = Some(Slot {
                start: rotate(Point::new(-half, 0), slot_rotation),
                end: rotate(Point::new(half, 0), slot_rotation),
                thickness,
                plated: def.plated,
            });
        }
        _ => {
            geo.hole = Some(Hole {
                diameter: def.hole,
                plated: def.plated,
                span: None,
            })
        }
    }
    geo
}

/// Copper rings of a via on the levels it reaches, plus optional mask
/// openings of the given diameter on the outer sides.
pub fn via_shapes(
    diameter: Coord,
    levels: &[PadLevel],
    mask_top: Option<Coord>,
    mask_bottom: Option<Coord>,
) -> Vec<StackShape> {
    let circle = |diameter| Shape::Circle {
        center: Point::default(),
        diameter,
    };
    let mut shapes: Vec<StackShape> = levels
        .iter()
        .map(|&level| StackShape {
            level,
            role: ShapeRole::Copper,
            shape: circle(diameter),
        })
        .collect();
    for (level, mask) in [(PadLevel::Top, mask_top), (PadLevel::Bottom, mask_bottom)] {
        if let Some(d) = mask.filter(|&d| d > 0) {
            shapes.push(StackShape {
                level,
                role: ShapeRole::Mask,
                shape: circle(d),
            });
        }
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::altium::units::mil;

    fn level(shape: PadShape, sx: f64, sy: f64) -> LevelDef {
        LevelDef {
            shape,
            sx: mil(sx),
            sy: mil(sy),
        }
    }

    fn through_pad(top: LevelDef) -> PadDef {
        PadDef {
            top: Some(top),
            internal: Some(top),
            bottom: Some(top),
            mask: mil(4.0),
            paste: 0,
            rotation: 0.0,
            hole: mil(35.0),
            plated: true,
            slot: None,
        }
    }

    fn shape(geo: &PadGeometry, level: PadLevel, role: ShapeRole) -> Option<&Shape> {
        geo.shapes
            .iter()
            .find(|s| s.level == level && s.role == role)
            .map(|s| &s.shape)
    }

    #[test]
    fn test_round_pad_and_mask() {
        let geo = build_pad(&through_pad(level(PadShape::Round, 60.0, 60.0)));
        assert_eq!(
            shape(&geo, PadLevel::Top, ShapeRole::Copper),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(60.0)
            })
        );
        assert_eq!(
            shape(&geo, PadLevel::Bottom, ShapeRole::Mask),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(68.0)
            })
        );
        // internal level is copper only, drilled pads get no paste
        assert!(shape(&geo, PadLevel::Internal, ShapeRole::Mask).is_none());
        assert!(shape(&geo, PadLevel::Top, ShapeRole::Paste).is_none());
        assert_eq!(
            geo.hole,
            Some(Hole {
                diameter: mil(35.0),
                plated: true,
                span: None
            })
        );
        assert!(geo.slot.is_none());
    }

    #[test]
    fn test_oblong_round_pad_is_a_capsule() {
        let s = level_shape(&level(PadShape::Round, 80.0, 40.0), 0, 0.0).unwrap();
        assert_eq!(
            s,
            Shape::Line {
                start: Point::new(-mil(20.0), 0),
                end: Point::new(mil(20.0), 0),
                thickness: mil(40.0),
            }
        );
        let s = level_shape(&level(PadShape::Round, 40.0, 80.0), 0, 90.0).unwrap();
        match s {
            Shape::Line { start, end, .. } => {
                assert_eq!(start, Point::new(mil(20.0), 0));
                assert_eq!(end, Point::new(-mil(20.0), 0));
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_smd_rect_pad_with_paste() {
        let def = PadDef {
            top: Some(level(PadShape::Rectangle, 50.0, 30.0)),
            internal: None,
            bottom: None,
            mask: mil(4.0),
            paste: -mil(2.0),
            rotation: 0.0,
            hole: 0,
            plated: true,
            slot: None,
        };
        let geo = build_pad(&def);
        assert_eq!(geo.shapes.len(), 3);
        assert!(geo.hole.is_none());
        let Some(Shape::Polygon { points }) = shape(&geo, PadLevel::Top, ShapeRole::Paste) else {
            panic!("paste should be a polygon");
        };
        let xs: Vec<Coord> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs.iter().max(), Some(&mil(23.0)));
        let ys: Vec<Coord> = points.iter().map(|p| p.y).collect();
        assert_eq!(ys.iter().max(), Some(&mil(13.0)));
    }

    #[test]
    fn test_shrinking_past_zero_drops_the_shape() {
        let l = level(PadShape::Rectangle, 10.0, 4.0);
        assert!(level_shape(&l, -mil(2.0), 0.0).is_none());
        assert!(level_shape(&l, -mil(1.0), 0.0).is_some());
    }

    #[test]
    fn test_round_mask_shrunk_past_zero() {
        let mut def = through_pad(level(PadShape::Round, 20.0, 20.0));
        def.mask = -mil(10.0);
        let geo = build_pad(&def);
        assert!(shape(&geo, PadLevel::Top, ShapeRole::Mask).is_none());
        assert!(shape(&geo, PadLevel::Bottom, ShapeRole::Mask).is_none());
        assert!(shape(&geo, PadLevel::Top, ShapeRole::Copper).is_some());
        def.mask = -mil(9.0);
        assert_eq!(
            shape(&build_pad(&def), PadLevel::Top, ShapeRole::Mask),
            Some(&Shape::Circle {
                center: Point::default(),
                diameter: mil(2.0)
            })
        );
    }

    #[test]
    fn test_paste_only_on_undrilled_outer_levels() {
        let mut def = through_pad(level(PadShape::Rectangle, 40.0, 40.0));
        def.paste = mil(1.0);
        let geo = build_pad(&def);
        assert!(geo.shapes.iter().all(|s| s.role != ShapeRole::Paste));
        assert!(geo
            .shapes
            .iter()
            .filter(|s| s.level == PadLevel::Internal)
            .all(|s| s.role == ShapeRole::Copper));

        def.hole = 0;
        def.internal = None;
        let geo = build_pad(&def);
        assert!(shape(&geo, PadLevel::Top, ShapeRole::Paste).is_some());
        assert!(shape(&geo, PadLevel::Bottom, ShapeRole::Paste).is_some());
    }

    #[test]
    fn test_octagon_and_rounded_rectangle() {
        let oct = level_shape(&level(PadShape::Octagonal, 60.0, 60.0), 0, 0.0).unwrap();
        assert!(matches!(oct, Shape::Polygon { ref points } if points.len() == 8));
        let rr = level_shape(&level(PadShape::RoundedRectangle, 60.0, 30.0), 0, 0.0).unwrap();
        assert!(matches!(rr, Shape::Polygon { ref points } if points.len() == 4));
    }

    #[test]
    fn test_slot_replaces_hole() {
        let mut def = through_pad(level(PadShape::Round, 80.0, 80.0));
        def.hole = mil(30.0);
        def.slot = Some((mil(70.0), 90.0));
        let geo = build_pad(&def);
        assert!(geo.hole.is_none());
        let slot = geo.slot.unwrap();
        assert_eq!(slot.thickness, mil(30.0));
        assert_eq!(slot.start, Point::new(0, -mil(20.0)));
        assert_eq!(slot.end, Point::new(0, mil(20.0)));
    }

    #[test]
    fn test_slot_equal_to_hole_is_a_hole() {
        let mut def = through_pad(level(PadShape::Round, 80.0, 80.0));
        def.slot = Some((def.hole, 0.0));
        let geo = build_pad(&def);
        assert!(geo.slot.is_none());
        assert!(geo.hole.is_some());
    }

    #[test]
    fn test_via_shapes() {
        let shapes = via_shapes(
            mil(20.0),
            &[PadLevel::Top, PadLevel::Internal, PadLevel::Bottom],
            Some(mil(28.0)),
            None,
        );
        assert_eq!(shapes.len(), 4);
        assert_eq!(shapes[3].level, PadLevel::Top);
        assert_eq!(shapes[3].role, ShapeRole::Mask);
    }

    #[test]
    fn test_shape_codes() {
        assert_eq!(PadShape::from_code(1), Some(PadShape::Round));
        assert_eq!(PadShape::from_code(9), Some(PadShape::RoundedRectangle));
        assert_eq!(PadShape::from_code(4), None);
    }
}
