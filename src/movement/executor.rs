//! Applies single move/jump steps to persisted agent records.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::collision::{check_collision, CollisionInfo};
use crate::config::CollisionPolicy;
use crate::coords::{same_system, system_of, zone_offset, Direction, SystemCoord, MAX_ZONE_OFFSET};
use crate::course::{NavigationStep, StepKind, CONTINUITY_TOLERANCE, STEP_FUEL_COST};
use crate::error::{NavError, Result};
use crate::store::NavigationStore;
use crate::universe::AgentRecord;
use crate::Position;

const GRID_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MovementResult {
    pub agent_id: String,
    pub kind: StepKind,
    pub direction: Direction,
    pub from: Position,
    /// Where the agent is after the call.
    pub position: Position,
    pub fuel: u32,
    /// False only when a pre-move check refused the step.
    pub applied: bool,
    pub collision: CollisionInfo,
}

pub fn move_agent(
    store: &dyn NavigationStore,
    agent_id: &str,
    direction: Direction,
    policy: CollisionPolicy,
) -> Result<MovementResult> {
    execute(store, agent_id, StepKind::Move, direction, None, policy)
}

pub fn jump_agent(
    store: &dyn NavigationStore,
    agent_id: &str,
    direction: Direction,
    policy: CollisionPolicy,
) -> Result<MovementResult> {
    execute(store, agent_id, StepKind::Jump, direction, None, policy)
}

/// Execute a planned step. The step must be well formed and start where the
/// agent currently is.
pub fn execute_step(
    store: &dyn NavigationStore,
    agent_id: &str,
    step: &NavigationStep,
    policy: CollisionPolicy,
) -> Result<MovementResult> {
    step.validate()?;
    execute(
        store,
        agent_id,
        step.kind,
        step.direction,
        Some(step.from),
        policy,
    )
}

fn execute(
    store: &dyn NavigationStore,
    agent_id: &str,
    kind: StepKind,
    direction: Direction,
    expected_origin: Option<Position>,
    policy: CollisionPolicy,
) -> Result<MovementResult> {
    let agent = store
        .agent(agent_id)?
        .ok_or_else(|| NavError::not_found("agent", agent_id))?;
    ensure_fuel(&agent)?;

    let from = agent.position;
    if let Some(expected) = expected_origin {
        if !from.approx_eq(&expected, CONTINUITY_TOLERANCE) {
            return Err(NavError::validation(format!(
                "agent {agent_id} is at {from}, step starts at {expected}"
            )));
        }
    }

    let to = match kind {
        StepKind::Move => {
            let to = NavigationStep::move_from(from, direction).to;
            ensure_on_grid(&from, &to, direction)?;
            to
        }
        StepKind::Jump => NavigationStep::jump_from(from, direction).to,
    };

    if policy == CollisionPolicy::PreMove {
        let collision = check_collision(store, &to)?;
        if collision.has_collision {
            warn!("refusing {kind:?} {direction} for {agent_id}: {to} is obstructed");
            return Ok(MovementResult {
                agent_id: agent_id.to_string(),
                kind,
                direction,
                from,
                position: from,
                fuel: agent.fuel,
                applied: false,
                collision,
            });
        }
    }

    // Fuel and position are committed together or not at all.
    let updated = store.update_agent(agent_id, &mut |record| {
        if !record.position.approx_eq(&from, GRID_TOLERANCE) {
            return Err(NavError::validation(format!(
                "agent {agent_id} moved concurrently"
            )));
        }
        ensure_fuel(record)?;
        record.fuel -= STEP_FUEL_COST;
        record.position = to;
        Ok(())
    })?;

    let (origin_system, target_system) = (system_of(&from), system_of(&to));
    if origin_system != target_system {
        relocate_ship(store, agent_id, origin_system, target_system)?;
    }

    let collision = match policy {
        CollisionPolicy::PostMove => check_collision(store, &to)?,
        CollisionPolicy::PreMove => CollisionInfo::clear(),
    };
    if collision.has_collision {
        warn!("{agent_id} landed at obstructed position {to}");
    }
    debug!(
        "{agent_id} {kind:?} {direction}: {from} -> {to}, fuel {}",
        updated.fuel
    );

    Ok(MovementResult {
        agent_id: agent_id.to_string(),
        kind,
        direction,
        from,
        position: updated.position,
        fuel: updated.fuel,
        applied: true,
        collision,
    })
}

fn ensure_fuel(agent: &AgentRecord) -> Result<()> {
    if agent.fuel < STEP_FUEL_COST {
        return Err(NavError::InsufficientResource {
            resource: "fuel",
            available: agent.fuel,
            required: STEP_FUEL_COST,
        });
    }
    Ok(())
}

// Moves stay inside the zone grid; crossing into another system is a jump.
fn ensure_on_grid(from: &Position, to: &Position, direction: Direction) -> Result<()> {
    let axis = direction.axis();
    let before = zone_offset(from, axis);
    let after = zone_offset(to, axis);
    let leaves_grid = after > MAX_ZONE_OFFSET + GRID_TOLERANCE && after > before;
    if !same_system(from, to) || leaves_grid {
        return Err(NavError::validation(format!(
            "cannot move {direction} from {from}: system edge reached, jump instead"
        )));
    }
    Ok(())
}

fn relocate_ship(
    store: &dyn NavigationStore,
    agent_id: &str,
    from: SystemCoord,
    to: SystemCoord,
) -> Result<()> {
    store.update_system(from, &mut |system| {
        system.presence.remove_ship(agent_id);
        Ok(())
    })?;
    store.update_system(to, &mut |system| {
        system.presence.add_ship(agent_id);
        Ok(())
    })?;
    Ok(())
}
