use serde::{Deserialize, Serialize};

use crate::coords::{edge_entry_point, round1, same_system, system_of, Direction, ZONE_STEP};
use crate::error::{NavError, Result};
use crate::Position;

/// Fuel charged for any single move or jump.
pub const STEP_FUEL_COST: u32 = 1;

/// Tolerance when chaining one step's `to` onto the next step's `from`.
pub const CONTINUITY_TOLERANCE: f64 = 1e-2;

const AXIS_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Move,
    Jump,
}

/// One atomic, replayable transition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NavigationStep {
    pub kind: StepKind,
    pub direction: Direction,
    pub from: Position,
    pub to: Position,
    pub fuel_cost: u32,
    pub description: String,
}

impl NavigationStep {
    /// Single zone step inside the current system.
    pub fn move_from(from: Position, direction: Direction) -> Self {
        let to = shifted(from, direction);
        NavigationStep {
            kind: StepKind::Move,
            direction,
            from,
            to,
            fuel_cost: STEP_FUEL_COST,
            description: format!("Move {direction} to {to}"),
        }
    }

    /// Jump into the adjacent system, landing on the face it is entered from.
    pub fn jump_from(from: Position, direction: Direction) -> Self {
        let target = system_of(&from).offset(direction.unit());
        let to = edge_entry_point(&from, target);
        NavigationStep {
            kind: StepKind::Jump,
            direction,
            from,
            to,
            fuel_cost: STEP_FUEL_COST,
            description: format!("Jump {direction} to system {target}"),
        }
    }

    /// Checks the per-kind shape invariants of a step received from outside.
    pub fn validate(&self) -> Result<()> {
        let axis = self.direction.axis();
        let sign = self.direction.sign();
        match self.kind {
            StepKind::Move => {
                if !same_system(&self.from, &self.to) {
                    return Err(NavError::validation(format!(
                        "move step {} -> {} leaves its system",
                        self.from, self.to
                    )));
                }
                for other in 0..3 {
                    let delta = self.to.axis(other) - self.from.axis(other);
                    let expected = if other == axis {
                        sign as f64 * ZONE_STEP
                    } else {
                        0.0
                    };
                    if (delta - expected).abs() > AXIS_TOLERANCE {
                        return Err(NavError::validation(format!(
                            "move step {} -> {} is not a single {} zone step",
                            self.from, self.to, self.direction
                        )));
                    }
                }
            }
            StepKind::Jump => {
                let from = system_of(&self.from);
                let to = system_of(&self.to);
                if to != from.offset(self.direction.unit()) {
                    return Err(NavError::validation(format!(
                        "jump step from system {from} to {to} is not one {} jump",
                        self.direction
                    )));
                }
            }
        }
        Ok(())
    }
}

fn shifted(from: Position, direction: Direction) -> Position {
    let mut to = from;
    let axis = direction.axis();
    to.set_axis(
        axis,
        round1(from.axis(axis) + direction.sign() as f64 * ZONE_STEP),
    );
    to
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NavigationPath {
    pub steps: Vec<NavigationStep>,
    pub total_fuel_cost: u32,
    /// Straight-line distance between the endpoints, not the walked length.
    pub total_distance: f64,
    /// One tick per step.
    pub estimated_time: u32,
}

impl NavigationPath {
    pub fn new(steps: Vec<NavigationStep>, from: &Position, to: &Position) -> Self {
        let total_fuel_cost = steps.iter().map(|s| s.fuel_cost).sum();
        let estimated_time = steps.len() as u32;
        NavigationPath {
            steps,
            total_fuel_cost,
            total_distance: from.distance(to),
            estimated_time,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn count(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    /// True when every step starts where the previous one ended.
    pub fn is_continuous(&self) -> bool {
        self.steps
            .windows(2)
            .all(|w| w[0].to.approx_eq(&w[1].from, CONTINUITY_TOLERANCE))
    }
}
