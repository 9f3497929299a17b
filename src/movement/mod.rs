pub mod autopilot;
pub mod executor;

pub use autopilot::{advance_autopilot, run_autopilot, AutopilotReport, AutopilotState};
pub use executor::{execute_step, jump_agent, move_agent, MovementResult};
