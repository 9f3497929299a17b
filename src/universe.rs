//! Persisted record shapes shared with the storage collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::{Direction, SystemCoord};
use crate::Position;

/// Kind of a static celestial body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Star,
    Planet,
    Asteroid,
    Station,
}

impl BodyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BodyKind::Star => "star",
            BodyKind::Planet => "planet",
            BodyKind::Asteroid => "asteroid",
            BodyKind::Station => "station",
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StaticBody {
    pub id: String,
    pub kind: BodyKind,
    pub name: String,
    pub position: Position,
    pub size: f64,
}

/// Ships and probes currently located in a system.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Presence {
    pub ships: Vec<String>,
    pub probes: Vec<String>,
}

impl Presence {
    pub fn add_ship(&mut self, id: &str) {
        if !self.ships.iter().any(|s| s == id) {
            self.ships.push(id.to_string());
        }
    }

    pub fn remove_ship(&mut self, id: &str) -> bool {
        let before = self.ships.len();
        self.ships.retain(|s| s != id);
        before != self.ships.len()
    }

    pub fn add_probe(&mut self, id: &str) {
        if !self.probes.iter().any(|p| p == id) {
            self.probes.push(id.to_string());
        }
    }

    pub fn remove_probe(&mut self, id: &str) -> bool {
        let before = self.probes.len();
        self.probes.retain(|p| p != id);
        before != self.probes.len()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SystemRecord {
    pub coordinates: SystemCoord,
    pub static_bodies: Vec<StaticBody>,
    pub presence: Presence,
}

impl SystemRecord {
    pub fn empty(coordinates: SystemCoord) -> Self {
        SystemRecord {
            coordinates,
            static_bodies: Vec::new(),
            presence: Presence::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    pub id: String,
    pub position: Position,
    pub fuel: u32,
    pub max_fuel: u32,
    /// Probes still carried and available for launch.
    pub probes: u32,
    pub docked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Active,
    Destroyed,
    Recalled,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProbeRecord {
    pub id: String,
    pub owner_id: String,
    pub position: Position,
    /// Fixed system-jump vector taken on every scheduler tick.
    pub direction: Direction,
    pub fuel: u32,
    pub max_fuel: u32,
    pub status: ProbeStatus,
    /// Unix epoch milliseconds.
    pub launched_at: u64,
    pub last_activity: u64,
}

impl ProbeRecord {
    pub fn is_active(&self) -> bool {
        self.status == ProbeStatus::Active
    }
}
