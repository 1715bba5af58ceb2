//! Compact relative-time text such as `2h15m ago`.

use crate::composite::CompositeTime;

pub const RIGHT_NOW: &str = "right now";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Past,
    Future,
}

impl Direction {
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Past => " ago",
            Direction::Future => " from now",
        }
    }
}

/// Render each non-zero unit as `<value><symbol>` with no separators, then
/// the direction suffix. An all-zero value renders as the suffix alone.
pub fn format_relative(ct: &CompositeTime, direction: Direction) -> String {
    let mut out = String::new();
    for (unit, value) in ct.units() {
        if value > 0 {
            out.push_str(&value.to_string());
            out.push(unit.symbol());
        }
    }
    out.push_str(direction.suffix());
    out
}

/// Describe `elapsed` seconds (now minus then) at the given precision.
pub fn describe_elapsed(elapsed: i64, precision: usize) -> String {
    if elapsed == 0 {
        return RIGHT_NOW.to_string();
    }
    let direction = if elapsed > 0 { Direction::Past } else { Direction::Future };
    let ct = CompositeTime::from_seconds(elapsed.unsigned_abs()).approximate(precision);
    format_relative(&ct, direction)
}
