//! Step-at-a-time consumption of a planned course.
//!
//! The caller holds the remaining steps. Each call to [`advance_autopilot`]
//! executes at most one of them and hands back what is left, which makes the
//! step boundary the only cancellation point.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::CollisionPolicy;
use crate::course::NavigationStep;
use crate::error::NavError;
use crate::store::NavigationStore;

use super::executor::{execute_step, MovementResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutopilotState {
    #[default]
    Idle,
    Executing,
    Completed,
    Blocked,
    Failed,
}

impl AutopilotState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AutopilotState::Completed | AutopilotState::Blocked | AutopilotState::Failed
        )
    }
}

#[derive(Debug, Default)]
pub struct AutopilotReport {
    pub state: AutopilotState,
    /// Outcome of the last executed step, if any ran.
    pub movement: Option<MovementResult>,
    /// Steps not yet taken, in order.
    pub remaining: Vec<NavigationStep>,
    pub steps_taken: usize,
    pub error: Option<NavError>,
}

/// Execute the next step of `remaining`.
///
/// A collision at the new position yields `Blocked` without rolling the step
/// back. Any error yields `Failed` with the unexecuted step still at the
/// front of the returned remainder.
pub fn advance_autopilot(
    store: &dyn NavigationStore,
    agent_id: &str,
    mut remaining: Vec<NavigationStep>,
    policy: CollisionPolicy,
) -> AutopilotReport {
    if remaining.is_empty() {
        return AutopilotReport {
            state: AutopilotState::Completed,
            ..AutopilotReport::default()
        };
    }

    let step = remaining.remove(0);
    match execute_step(store, agent_id, &step, policy) {
        Err(err) => {
            warn!("autopilot for {agent_id} failed on '{}': {err}", step.description);
            remaining.insert(0, step);
            AutopilotReport {
                state: AutopilotState::Failed,
                movement: None,
                remaining,
                steps_taken: 0,
                error: Some(err),
            }
        }
        Ok(movement) if movement.collision.has_collision => {
            warn!(
                "autopilot for {agent_id} blocked at {} after '{}'",
                movement.position, step.description
            );
            let steps_taken = usize::from(movement.applied);
            if !movement.applied {
                remaining.insert(0, step);
            }
            AutopilotReport {
                state: AutopilotState::Blocked,
                movement: Some(movement),
                remaining,
                steps_taken,
                error: None,
            }
        }
        Ok(movement) => {
            debug!("autopilot for {agent_id}: {}", step.description);
            let state = if remaining.is_empty() {
                AutopilotState::Completed
            } else {
                AutopilotState::Executing
            };
            AutopilotReport {
                state,
                movement: Some(movement),
                remaining,
                steps_taken: 1,
                error: None,
            }
        }
    }
}

/// Drive the autopilot until it completes, is blocked or fails.
pub fn run_autopilot(
    store: &dyn NavigationStore,
    agent_id: &str,
    path: Vec<NavigationStep>,
    policy: CollisionPolicy,
) -> AutopilotReport {
    let mut report = AutopilotReport {
        remaining: path,
        ..AutopilotReport::default()
    };

    while !report.state.is_terminal() {
        let remaining = std::mem::take(&mut report.remaining);
        let next = advance_autopilot(store, agent_id, remaining, policy);
        report.steps_taken += next.steps_taken;
        report.state = next.state;
        report.remaining = next.remaining;
        report.error = next.error;
        if next.movement.is_some() {
            report.movement = next.movement;
        }
    }

    info!(
        "autopilot for {agent_id} finished {:?} after {} steps, {} left",
        report.state,
        report.steps_taken,
        report.remaining.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{system_of, SystemCoord};
    use crate::course::{plot_course, StepKind};
    use crate::store::MemoryStore;
    use crate::universe::{AgentRecord, BodyKind, StaticBody, SystemRecord};
    use crate::Position;

    fn store_with_agent(position: Position, fuel: u32) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put_agent(AgentRecord {
                id: "pilot".into(),
                position,
                fuel,
                max_fuel: 20,
                probes: 0,
                docked: false,
            })
            .unwrap();
        store
    }

    #[test]
    fn single_step_returns_the_rest() {
        let store = store_with_agent(Position::new(0.0, 0.0, 0.0), 10);
        let path = plot_course("0,0,0", "0,0,0.3").unwrap();

        let report = advance_autopilot(&store, "pilot", path.steps, CollisionPolicy::PostMove);
        assert_eq!(report.state, AutopilotState::Executing);
        assert_eq!(report.remaining.len(), 2);
        assert_eq!(
            report.movement.expect("movement").position,
            Position::new(0.0, 0.0, 0.1)
        );
    }

    #[test]
    fn empty_path_is_completed() {
        let store = store_with_agent(Position::new(0.0, 0.0, 0.0), 10);
        let report = advance_autopilot(&store, "pilot", Vec::new(), CollisionPolicy::PostMove);
        assert_eq!(report.state, AutopilotState::Completed);
        assert!(report.movement.is_none());
    }

    #[test]
    fn full_run_crosses_systems() {
        let store = store_with_agent(Position::new(0.2, 0.2, 0.2), 10);
        let path = plot_course("0.2,0.2,0.2", "1.2,0.2,0.2").unwrap();
        let report = run_autopilot(&store, "pilot", path.steps, CollisionPolicy::PostMove);

        assert_eq!(report.state, AutopilotState::Completed);
        assert_eq!(report.steps_taken, 5);
        let agent = store.agent("pilot").unwrap().unwrap();
        assert_eq!(agent.position, Position::new(1.2, 0.2, 0.2));
        assert_eq!(agent.fuel, 5);
        assert_eq!(system_of(&agent.position), SystemCoord::new(1, 0, 0));
    }

    #[test]
    fn plotted_multi_axis_course_runs_to_completion() {
        let store = store_with_agent(Position::new(0.2, 0.2, 0.2), 20);
        let path = plot_course("0.2,0.2,0.2", "2.1,-1.7,1.0").unwrap();
        assert_eq!(path.len(), 13);
        let cost = path.total_fuel_cost;

        let report = run_autopilot(&store, "pilot", path.steps, CollisionPolicy::PostMove);
        assert_eq!(report.state, AutopilotState::Completed);
        assert!(report.error.is_none());
        assert_eq!(report.steps_taken, 13);

        let agent = store.agent("pilot").unwrap().unwrap();
        assert_eq!(agent.position, Position::new(2.1, -1.7, 1.0));
        assert_eq!(agent.fuel, 20 - cost);
        assert_eq!(system_of(&agent.position), SystemCoord::new(2, -2, 1));
    }

    #[test]
    fn fuel_exhaustion_fails_with_remaining_path() {
        let store = store_with_agent(Position::new(0.0, 0.0, 0.0), 2);
        let path = plot_course("0,0,0", "0,0,0.4").unwrap();
        let report = run_autopilot(&store, "pilot", path.steps, CollisionPolicy::PostMove);

        assert_eq!(report.state, AutopilotState::Failed);
        assert_eq!(report.steps_taken, 2);
        assert_eq!(report.remaining.len(), 2);
        assert_eq!(report.remaining[0].from, Position::new(0.0, 0.0, 0.2));
        assert!(matches!(
            report.error,
            Some(NavError::InsufficientResource { .. })
        ));
    }

    #[test]
    fn collision_blocks_and_keeps_landing() {
        let store = store_with_agent(Position::new(0.0, 0.0, 0.0), 10);
        let mut system = SystemRecord::empty(SystemCoord::new(0, 0, 0));
        system.static_bodies.push(StaticBody {
            id: "moon".into(),
            kind: BodyKind::Planet,
            name: "Moon".into(),
            position: Position::new(0.0, 0.0, 0.2),
            size: 9.0,
        });
        store.put_system(system).unwrap();

        let path = plot_course("0,0,0", "0,0,0.4").unwrap();
        let report = run_autopilot(&store, "pilot", path.steps, CollisionPolicy::PostMove);

        assert_eq!(report.state, AutopilotState::Blocked);
        assert_eq!(report.steps_taken, 2);
        assert_eq!(report.remaining.len(), 2);
        let movement = report.movement.expect("movement");
        assert_eq!(movement.position, Position::new(0.0, 0.0, 0.2));
        assert_eq!(
            movement.collision.obstruction.expect("obstruction").kind,
            BodyKind::Planet
        );
    }

    #[test]
    fn pre_move_block_keeps_step_in_remainder() {
        let store = store_with_agent(Position::new(0.0, 0.0, 0.0), 10);
        let mut system = SystemRecord::empty(SystemCoord::new(0, 0, 0));
        system.static_bodies.push(StaticBody {
            id: "moon".into(),
            kind: BodyKind::Planet,
            name: "Moon".into(),
            position: Position::new(0.0, 0.0, 0.2),
            size: 9.0,
        });
        store.put_system(system).unwrap();

        let path = plot_course("0,0,0", "0,0,0.4").unwrap();
        let report = run_autopilot(&store, "pilot", path.steps, CollisionPolicy::PreMove);

        assert_eq!(report.state, AutopilotState::Blocked);
        assert_eq!(report.steps_taken, 1);
        assert_eq!(report.remaining.len(), 3);
        assert_eq!(report.remaining[0].kind, StepKind::Move);
        let agent = store.agent("pilot").unwrap().unwrap();
        assert_eq!(agent.position, Position::new(0.0, 0.0, 0.1));
    }

    #[test]
    fn malformed_step_fails() {
        let store = store_with_agent(Position::new(0.0, 0.0, 0.0), 10);
        let mut path = plot_course("0,0,0", "0,0,0.2").unwrap().steps;
        path[0].to = Position::new(3.0, 0.0, 0.0);
        let report = advance_autopilot(&store, "pilot", path, CollisionPolicy::PostMove);
        assert_eq!(report.state, AutopilotState::Failed);
        assert!(matches!(report.error, Some(NavError::Validation(_))));
        assert_eq!(report.remaining.len(), 2);
    }
}
