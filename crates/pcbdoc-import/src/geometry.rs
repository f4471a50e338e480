use std::f64::consts::PI;

use serde::Serialize;

use crate::types::{BBox, Coord, Point};

/// Axis-aligned rectangle with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl Rect {
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    pub fn from_bbox(bb: &BBox) -> Self {
        Self {
            x1: bb.minx,
            y1: bb.miny,
            x2: bb.maxx,
            y2: bb.maxy,
        }
    }

    pub fn width(&self) -> Coord {
        self.x2 - self.x1
    }

    pub fn height(&self) -> Coord {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    pub fn offset(&self, dx: Coord, dy: Coord) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Overlap with positive area, if any.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        (r.x1 < r.x2 && r.y1 < r.y2).then_some(r)
    }

    /// `self - other` as at most four disjoint rectangles.
    pub fn difference(&self, other: &Rect) -> Vec<Rect> {
        let Some(cut) = self.intersect(other) else {
            return vec![*self];
        };
        let mut out = Vec::with_capacity(4);
        if self.y1 < cut.y1 {
            out.push(Rect { y2: cut.y1, ..*self });
        }
        if cut.y2 < self.y2 {
            out.push(Rect { y1: cut.y2, ..*self });
        }
        if self.x1 < cut.x1 {
            out.push(Rect {
                x1: self.x1,
                y1: cut.y1,
                x2: cut.x1,
                y2: cut.y2,
            });
        }
        if cut.x2 < self.x2 {
            out.push(Rect {
                x1: cut.x2,
                y1: cut.y1,
                x2: self.x2,
                y2: cut.y2,
            });
        }
        out
    }

    /// Corners in counter-clockwise order.
    pub fn contour(&self) -> Vec<Point> {
        vec![
            Point::new(self.x1, self.y1),
            Point::new(self.x2, self.y1),
            Point::new(self.x2, self.y2),
            Point::new(self.x1, self.y2),
        ]
    }
}

/// A filled area: one outer contour (counter-clockwise) and any number of
/// hole contours (clockwise).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolyArea {
    pub outer: Vec<Point>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

impl PolyArea {
    pub fn from_outline(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if signed_area(&points) < 0.0 {
            points.reverse();
        }
        Self {
            outer: points,
            holes: Vec::new(),
        }
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            outer: rect.contour(),
            holes: Vec::new(),
        }
    }

    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.outer).abs() - holes
    }

    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for p in &self.outer {
            bbox.expand_point(p.x, p.y);
        }
        bbox
    }

    pub fn contains(&self, p: Point) -> bool {
        point_in_contour(&self.outer, p) && !self.holes.iter().any(|h| point_in_contour(h, p))
    }

    pub fn translate(&mut self, dx: Coord, dy: Coord) {
        for p in self.outer.iter_mut().chain(self.holes.iter_mut().flatten()) {
            *p = p.offset(dx, dy);
        }
    }

    /// Boolean difference with an axis-aligned rectangle.
    ///
    /// The rectangle is clipped to the outline's bounding box and split
    /// against existing rectangular holes so holes never overlap.
    pub fn subtract_rect(&self, rect: &Rect) -> PolyArea {
        let Some(clipped) = rect.intersect(&Rect::from_bbox(&self.bbox())) else {
            return self.clone();
        };
        let mut pieces = vec![clipped];
        for hole in &self.holes {
            if let Some(existing) = axis_rect(hole) {
                pieces = pieces
                    .into_iter()
                    .flat_map(|p| p.difference(&existing))
                    .collect();
            }
        }
        let mut out = self.clone();
        for piece in pieces {
            let mut contour = piece.contour();
            contour.reverse();
            out.holes.push(contour);
        }
        out
    }
}

/// Shoelace area; positive for counter-clockwise contours.
pub fn signed_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += pts[i].x as f64 * pts[j].y as f64;
        area -= pts[j].x as f64 * pts[i].y as f64;
    }
    area / 2.0
}

fn point_in_contour(pts: &[Point], p: Point) -> bool {
    let (px, py) = (p.x as f64, p.y as f64);
    let mut inside = false;
    let n = pts.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (xi, yi) = (pts[i].x as f64, pts[i].y as f64);
        let (xj, yj) = (pts[j].x as f64, pts[j].y as f64);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// The rectangle a contour describes, if it is an axis-aligned rectangle.
fn axis_rect(pts: &[Point]) -> Option<Rect> {
    let pts = match pts {
        [first, .., last] if pts.len() == 5 && first == last => &pts[..4],
        _ if pts.len() == 4 => pts,
        _ => return None,
    };
    let mut bbox = BBox::empty();
    for p in pts {
        bbox.expand_point(p.x, p.y);
    }
    let on_corner = pts
        .iter()
        .all(|p| (p.x == bbox.minx || p.x == bbox.maxx) && (p.y == bbox.miny || p.y == bbox.maxy));
    let rect = Rect::from_bbox(&bbox);
    let full = (rect.width() as f64) * (rect.height() as f64);
    (on_corner && (signed_area(pts).abs() - full).abs() < 0.5).then_some(rect)
}

/// Rotate a point (x, y) around the origin by the given angle in degrees.
pub fn rotate_point(x: f64, y: f64, angle_deg: f64) -> (f64, f64) {
    if angle_deg.abs() < 1e-9 {
        return (x, y);
    }
    let rad = angle_deg.to_radians();
    let cos_a = rad.cos();
    let sin_a = rad.sin();
    (x * cos_a - y * sin_a, x * sin_a + y * cos_a)
}

pub fn rotate(p: Point, angle_deg: f64) -> Point {
    let (x, y) = rotate_point(p.x as f64, p.y as f64, angle_deg);
    Point::new(x.round() as Coord, y.round() as Coord)
}

pub fn rotate_about(p: Point, center: Point, angle_deg: f64) -> Point {
    let r = rotate(p.offset(-center.x, -center.y), angle_deg);
    r.offset(center.x, center.y)
}

/// Rectangle of the given size centred on the origin.
pub fn rect_points(sx: Coord, sy: Coord) -> Vec<Point> {
    Rect::new(Point::new(-sx / 2, -sy / 2), Point::new(sx / 2, sy / 2)).contour()
}

/// Octagon inscribed in an `sx` by `sy` box centred on the origin.
pub fn octagon_points(sx: Coord, sy: Coord) -> Vec<Point> {
    let hx = sx / 2;
    let hy = sy / 2;
    let chamfer = (hx.min(hy) as f64 * 0.3).round() as Coord;
    vec![
        Point::new(hx, hy - chamfer),
        Point::new(hx - chamfer, hy),
        Point::new(-(hx - chamfer), hy),
        Point::new(-hx, hy - chamfer),
        Point::new(-hx, -(hy - chamfer)),
        Point::new(-(hx - chamfer), -hy),
        Point::new(hx - chamfer, -hy),
        Point::new(hx, -(hy - chamfer)),
    ]
}

/// Points along an arc, about 2 degrees per segment, both ends included.
pub fn arc_points(center: Point, radius: Coord, start_deg: f64, sweep_deg: f64) -> Vec<Point> {
    let num_segments = ((sweep_deg.abs() / 2.0).ceil() as usize).max(2);
    let r = radius as f64;
    (0..=num_segments)
        .map(|k| {
            let t = k as f64 / num_segments as f64;
            let a = (start_deg + t * sweep_deg) * PI / 180.0;
            Point::new(
                center.x + (r * a.cos()).round() as Coord,
                center.y + (r * a.sin()).round() as Coord,
            )
        })
        .collect()
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_deg(a: f64) -> f64 {
    let r = a.rem_euclid(360.0);
    // also folds -0.0 into 0.0
    if r >= 360.0 || r == 0.0 {
        0.0
    } else {
        r
    }
}
