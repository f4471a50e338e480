//! Unit conversion between PcbDoc values and board coordinates (nanometres).

use crate::types::Coord;

pub const NM_PER_MIL: f64 = 25_400.0;

/// Binary "board units" are ten-thousandths of a mil.
const BOARD_UNITS_PER_MIL: f64 = 10_000.0;

/// Largest coordinate magnitude accepted from a file (about 1.1 km).
///
/// Sums and differences of in-range coordinates stay far from `i64` limits.
pub const MAX_COORD: Coord = 1 << 40;

pub fn mil(v: f64) -> Coord {
    (v * NM_PER_MIL).round() as Coord
}

/// `v` mil as a coordinate, if it lies within [`MAX_COORD`].
pub fn checked_mil(v: f64) -> Option<Coord> {
    checked_nm(v * NM_PER_MIL)
}

fn checked_nm(nm: f64) -> Option<Coord> {
    let nm = nm.round();
    (nm.is_finite() && nm.abs() <= MAX_COORD as f64).then_some(nm as Coord)
}

pub fn to_mil(c: Coord) -> f64 {
    c as f64 / NM_PER_MIL
}

/// Convert a raw binary board-unit integer to a coordinate.
pub fn from_board_units(raw: i64) -> Coord {
    mil(raw as f64 / BOARD_UNITS_PER_MIL)
}

/// Parse a unit-tagged length such as `10mil`, `0.254mm` or `1.5`.
///
/// Bare numbers are mils. Non-finite or out-of-range values are rejected.
pub fn parse_coord(s: &str) -> Option<Coord> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let value: f64 = num.parse().ok()?;
    let nm_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "mil" | "mils" => NM_PER_MIL,
        "mm" => 1_000_000.0,
        "cm" => 10_000_000.0,
        "um" => 1_000.0,
        "nm" => 1.0,
        "in" | "inch" => NM_PER_MIL * 1000.0,
        _ => return None,
    };
    checked_nm(value * nm_per_unit)
}

/// Mirror between the source Y axis and the board Y axis.
///
/// The transform is its own inverse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YFlip {
    pub height: Coord,
}

impl YFlip {
    pub fn new(height: Coord) -> Self {
        Self { height }
    }

    pub fn apply(&self, y: Coord) -> Coord {
        self.height.saturating_sub(y)
    }

    pub fn invert(&self, y: Coord) -> Coord {
        self.height.saturating_sub(y)
    }
}
