//! Conversions between global positions, owning systems and in-system zones.
//!
//! Every function here is pure and total. A system is the unit cube at the
//! floor of a position; its 125 zones sit at offsets `0.0..=0.4` from the
//! floor corner in steps of [`ZONE_STEP`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::Position;

/// Size of one zone step along any axis.
pub const ZONE_STEP: f64 = 0.1;

/// Offset of the far face of a system's zone grid.
pub const MAX_ZONE_OFFSET: f64 = 0.4;

const OFFSET_TOLERANCE: f64 = 1e-6;

/// Integer coordinates of a system.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SystemCoord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl SystemCoord {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        SystemCoord { x, y, z }
    }

    pub fn axis(&self, axis: usize) -> i64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn offset(&self, delta: [i64; 3]) -> SystemCoord {
        SystemCoord {
            x: self.x + delta[0],
            y: self.y + delta[1],
            z: self.z + delta[2],
        }
    }

    /// Number of unit jumps separating two systems along the grid axes.
    pub fn jump_distance(&self, other: &SystemCoord) -> u64 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
            .saturating_add(self.z.abs_diff(other.z))
    }
}

impl fmt::Display for SystemCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Round to one decimal place to keep positions on the zone grid.
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Normalise -0.0 so equality and display stay stable.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn round_position(p: Position) -> Position {
    Position::new(round1(p.x), round1(p.y), round1(p.z))
}

fn floor_axis(value: f64) -> i64 {
    round1(value).floor() as i64
}

pub fn system_of(p: &Position) -> SystemCoord {
    SystemCoord::new(floor_axis(p.x), floor_axis(p.y), floor_axis(p.z))
}

pub fn same_system(a: &Position, b: &Position) -> bool {
    system_of(a) == system_of(b)
}

/// Offset of `p` from its system's floor corner along `axis`.
pub fn zone_offset(p: &Position, axis: usize) -> f64 {
    let value = round1(p.axis(axis));
    round1(value - value.floor())
}

pub fn is_at_system_edge(p: &Position) -> bool {
    (0..3).any(|axis| {
        let offset = zone_offset(p, axis);
        offset.abs() < OFFSET_TOLERANCE || (offset - MAX_ZONE_OFFSET).abs() < OFFSET_TOLERANCE
    })
}

/// True when every axis offset lies on the `0.0..=0.4` zone grid.
pub fn is_on_zone_grid(p: &Position) -> bool {
    (0..3).all(|axis| zone_offset(p, axis) <= MAX_ZONE_OFFSET + OFFSET_TOLERANCE)
}

/// Landing point inside `target` for an agent arriving from `from`.
///
/// Per axis: the target's `0.0` face when approaching from below, its far
/// face when approaching from above, and the current in-system offset when
/// the axis is not crossed.
pub fn edge_entry_point(from: &Position, target: SystemCoord) -> Position {
    let origin = system_of(from);
    let mut landing = Position::default();
    for axis in 0..3 {
        let current = origin.axis(axis);
        let wanted = target.axis(axis);
        let offset = if current < wanted {
            0.0
        } else if current > wanted {
            MAX_ZONE_OFFSET
        } else {
            zone_offset(from, axis)
        };
        landing.set_axis(axis, round1(wanted as f64 + offset));
    }
    landing
}

/// Point on the face of `from`'s own system nearest to `target`, where an
/// agent steps off into a jump. Axes that are not crossed are unchanged.
pub fn edge_exit_point(from: &Position, target: SystemCoord) -> Position {
    let origin = system_of(from);
    let mut exit = round_position(*from);
    for axis in 0..3 {
        let current = origin.axis(axis);
        let wanted = target.axis(axis);
        if wanted > current {
            exit.set_axis(axis, round1(current as f64 + MAX_ZONE_OFFSET));
        } else if wanted < current {
            exit.set_axis(axis, current as f64);
        }
    }
    exit
}

/// Parse `"x,y,z"` into a grid-aligned position.
///
/// Values are rounded to one decimal. A position whose offset from its
/// system corner exceeds 0.4 on any axis names no zone and is rejected.
pub fn parse_position(input: &str) -> Result<Position> {
    let parts: Vec<&str> = input.split(',').collect();
    if parts.len() != 3 {
        return Err(NavError::validation(format!(
            "coordinates '{input}' must have exactly three components"
        )));
    }

    let mut values = [0.0_f64; 3];
    for (slot, raw) in values.iter_mut().zip(&parts) {
        let value = raw.trim().parse::<f64>().map_err(|_| {
            NavError::validation(format!("coordinate component '{}' is not a number", raw.trim()))
        })?;
        if !value.is_finite() {
            return Err(NavError::validation(format!(
                "coordinate component '{}' is not finite",
                raw.trim()
            )));
        }
        *slot = round1(value);
    }

    let position = Position::new(values[0], values[1], values[2]);
    if !is_on_zone_grid(&position) {
        return Err(NavError::validation(format!(
            "coordinates '{input}' lie between zones; offsets within a system run 0.0 to 0.4"
        )));
    }
    Ok(position)
}
