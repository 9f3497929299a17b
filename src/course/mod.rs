pub mod planner;
pub mod step;

pub use planner::{plan_in_system, plot_between, plot_course, MAX_COURSE_JUMPS};
pub use step::{NavigationPath, NavigationStep, StepKind, CONTINUITY_TOLERANCE, STEP_FUEL_COST};
