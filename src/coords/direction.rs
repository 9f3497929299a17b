use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// Compass-style axis direction. East/west run along X, north/south along Y
/// and up/down along Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Axis index: 0 = X, 1 = Y, 2 = Z.
    pub fn axis(self) -> usize {
        match self {
            Direction::East | Direction::West => 0,
            Direction::North | Direction::South => 1,
            Direction::Up | Direction::Down => 2,
        }
    }

    pub fn sign(self) -> i64 {
        match self {
            Direction::East | Direction::North | Direction::Up => 1,
            Direction::West | Direction::South | Direction::Down => -1,
        }
    }

    /// Unit system-jump vector.
    pub fn unit(self) -> [i64; 3] {
        let mut v = [0; 3];
        v[self.axis()] = self.sign();
        v
    }

    /// Direction that moves along `axis` towards positive values when
    /// `positive` is set.
    pub fn from_axis(axis: usize, positive: bool) -> Direction {
        match (axis, positive) {
            (0, true) => Direction::East,
            (0, false) => Direction::West,
            (1, true) => Direction::North,
            (1, false) => Direction::South,
            (_, true) => Direction::Up,
            (_, false) => Direction::Down,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = NavError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "north" => Ok(Direction::North),
            "south" => Ok(Direction::South),
            "east" => Ok(Direction::East),
            "west" => Ok(Direction::West),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(NavError::validation(format!(
                "unknown direction '{other}'; use north|south|east|west|up|down"
            ))),
        }
    }
}
