//! Greedy, per-axis course decomposition.
//!
//! Routes are not shortest paths and never steer around bodies. Axes are
//! always resolved in X, Y, Z order, so identical inputs produce identical
//! step lists.

use log::debug;

use crate::coords::{
    edge_exit_point, is_at_system_edge, is_on_zone_grid, parse_position, round_position,
    same_system, system_of, Direction,
};
use crate::error::{NavError, Result};
use crate::Position;

use super::step::{NavigationPath, NavigationStep};

/// Half a zone step; closer than this counts as arrived on an axis.
const ARRIVAL_TOLERANCE: f64 = 0.05;

/// Longest course, in system jumps, the planner will lay out.
pub const MAX_COURSE_JUMPS: u64 = 1_000;

/// Plot a course between two `"x,y,z"` coordinate strings.
pub fn plot_course(from: &str, to: &str) -> Result<NavigationPath> {
    let origin = parse_position(from)?;
    let destination = parse_position(to)?;
    plot_between(origin, destination)
}

/// Plot a course between two positions on the zone grid.
///
/// Fails when either end lies between zones or the systems are more than
/// [`MAX_COURSE_JUMPS`] jumps apart.
pub fn plot_between(from: Position, to: Position) -> Result<NavigationPath> {
    let from = round_position(from);
    let to = round_position(to);
    for end in [&from, &to] {
        if !is_on_zone_grid(end) {
            return Err(NavError::validation(format!("{end} is not a zone position")));
        }
    }

    if same_system(&from, &to) {
        let path = NavigationPath::new(plan_in_system(from, to), &from, &to);
        debug!("plotted in-system course {from} -> {to}: {} moves", path.len());
        return Ok(path);
    }

    let target = system_of(&to);
    let jumps = system_of(&from).jump_distance(&target);
    if jumps > MAX_COURSE_JUMPS {
        return Err(NavError::validation(format!(
            "course {from} -> {to} needs {jumps} jumps, limit is {MAX_COURSE_JUMPS}"
        )));
    }

    let mut steps = Vec::new();
    let mut current = from;

    if !is_at_system_edge(&from) {
        let exit = edge_exit_point(&from, target);
        steps.extend(plan_in_system(current, exit));
        current = exit;
    }

    for axis in 0..3 {
        let delta = target.axis(axis) - system_of(&current).axis(axis);
        let direction = Direction::from_axis(axis, delta > 0);
        for _ in 0..delta.unsigned_abs() {
            let jump = NavigationStep::jump_from(current, direction);
            current = jump.to;
            steps.push(jump);
        }
    }

    steps.extend(plan_in_system(current, to));

    let path = NavigationPath::new(steps, &from, &to);
    debug!(
        "plotted course {from} -> {to}: {} steps, {} fuel",
        path.len(),
        path.total_fuel_cost
    );
    Ok(path)
}

/// Zone-by-zone moves between two points of the same system.
pub fn plan_in_system(from: Position, to: Position) -> Vec<NavigationStep> {
    let mut steps = Vec::new();
    let mut current = from;
    for axis in 0..3 {
        while (to.axis(axis) - current.axis(axis)).abs() > ARRIVAL_TOLERANCE {
            let direction = Direction::from_axis(axis, to.axis(axis) > current.axis(axis));
            let step = NavigationStep::move_from(current, direction);
            current = step.to;
            steps.push(step);
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::StepKind;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn straight_climb_inside_one_system() {
        let path = plot_course("0,0,0", "0,0,0.3").expect("path");
        assert_eq!(path.len(), 3);
        assert!(path
            .steps
            .iter()
            .all(|s| s.kind == StepKind::Move && s.direction == Direction::Up));
        assert_eq!(path.total_fuel_cost, 3);
        assert_eq!(path.estimated_time, 3);
        assert_approx_eq!(path.total_distance, 0.3);
    }

    #[test]
    fn in_system_cost_is_sum_of_axis_steps() {
        let path = plot_course("0.4,0.0,0.1", "0.1,0.3,0.4").expect("path");
        assert_eq!(path.total_fuel_cost, 3 + 3 + 3);
        let last = path.steps.last().expect("last step");
        assert!((last.to.x - 0.1).abs() < 1e-9);
        assert!((last.to.y - 0.3).abs() < 1e-9);
        assert!((last.to.z - 0.4).abs() < 1e-9);
        // X is resolved before Y, Y before Z.
        let axes: Vec<usize> = path.steps.iter().map(|s| s.direction.axis()).collect();
        let mut sorted = axes.clone();
        sorted.sort();
        assert_eq!(axes, sorted);
    }

    #[test]
    fn same_point_is_an_empty_path() {
        let path = plot_course("2.2,1.1,0.0", "2.2,1.1,0").expect("path");
        assert!(path.is_empty());
        assert_eq!(path.total_fuel_cost, 0);
    }

    #[test]
    fn cross_system_east() {
        let path = plot_course("0.2,0.2,0.2", "1.2,0.2,0.2").expect("path");
        let kinds: Vec<StepKind> = path.steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Move,
                StepKind::Move,
                StepKind::Jump,
                StepKind::Move,
                StepKind::Move
            ]
        );
        assert!(path.steps.iter().all(|s| s.direction == Direction::East));
        assert_eq!(path.steps[1].to, Position::new(0.4, 0.2, 0.2));
        assert_eq!(path.steps[2].to, Position::new(1.0, 0.2, 0.2));
        assert_eq!(path.steps[4].to, Position::new(1.2, 0.2, 0.2));
        assert!(path.is_continuous());
    }

    #[test]
    fn multi_axis_jumps_follow_x_y_z_order() {
        let path = plot_course("0.2,0.2,0.2", "2.1,-1.7,1.0").expect("path");
        let jumps: Vec<Direction> = path
            .steps
            .iter()
            .filter(|s| s.kind == StepKind::Jump)
            .map(|s| s.direction)
            .collect();
        assert_eq!(
            jumps,
            vec![
                Direction::East,
                Direction::East,
                Direction::South,
                Direction::South,
                Direction::Up
            ]
        );
        assert!(path.is_continuous());
        for step in &path.steps {
            assert!(step.validate().is_ok(), "invalid step {step:?}");
        }
        let last = path.steps.last().expect("last");
        assert!(last.to.approx_eq(&Position::new(2.1, -1.7, 1.0), 1e-9));
        assert!(path.steps.iter().all(|s| is_on_zone_grid(&s.to)));
    }

    #[test]
    fn origin_on_edge_jumps_immediately() {
        let path = plot_course("0.4,0.2,0.2", "1.0,0.2,0.2").expect("path");
        assert_eq!(path.len(), 1);
        assert_eq!(path.steps[0].kind, StepKind::Jump);
        assert_eq!(path.steps[0].to, Position::new(1.0, 0.2, 0.2));
    }

    #[test]
    fn cost_decomposes_into_edge_jump_and_entry_legs() {
        let path = plot_course("0.1,0.1,0.1", "0.3,3.2,0.3").expect("path");
        // 3 moves to the north face, 3 jumps north, then 2 + 2 + 2 moves to the target.
        let to_edge = 3;
        let jumps = 3;
        let from_entry = 6;
        assert_eq!(path.count(StepKind::Jump), jumps);
        assert_eq!(path.total_fuel_cost as usize, to_edge + jumps + from_entry);
    }

    #[test]
    fn plotting_is_deterministic() {
        let a = plot_course("-1.7,0.2,4.4", "3.1,-2.6,0.0").expect("a");
        let b = plot_course("-1.7,0.2,4.4", "3.1,-2.6,0.0").expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        assert!(plot_course("0,0", "1,1,1").is_err());
        assert!(plot_course("0,0,0", "x,1,1").is_err());
    }

    #[test]
    fn destinations_between_zones_are_rejected() {
        assert!(matches!(
            plot_course("0.2,0.2,0.2", "0.2,0.7,0.2"),
            Err(NavError::Validation(_))
        ));
        let between = Position::new(0.6, 0.0, 0.0);
        assert!(plot_between(between, Position::new(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn courses_beyond_the_jump_limit_are_rejected() {
        let err = plot_course("0,0,0", "1e12,0,0").unwrap_err();
        assert!(matches!(err, NavError::Validation(_)));

        let edge = format!("{MAX_COURSE_JUMPS}.0,0,0");
        let path = plot_course("0,0,0", &edge).expect("path at the limit");
        assert_eq!(path.count(StepKind::Jump) as u64, MAX_COURSE_JUMPS);

        let beyond = format!("{}.0,0,0", MAX_COURSE_JUMPS + 1);
        assert!(plot_course("0,0,0", &beyond).is_err());
    }
}
