use serde::{Deserialize, Serialize};

use crate::coords::system_of;
use crate::error::Result;
use crate::store::NavigationStore;
use crate::universe::{BodyKind, StaticBody};
use crate::Position;

const STAR_RADIUS_FACTOR: f64 = 0.05;
const STAR_RADIUS_CAP: f64 = 0.3;
const STATION_RADIUS: f64 = 0.05;
const ROCK_RADIUS_FACTOR: f64 = 0.03;
const ROCK_RADIUS_CAP: f64 = 0.2;

/// The body that blocks a position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Obstruction {
    pub kind: BodyKind,
    pub name: String,
    pub size: f64,
    pub position: Position,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CollisionInfo {
    pub has_collision: bool,
    pub obstruction: Option<Obstruction>,
}

impl CollisionInfo {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn blocked_by(body: &StaticBody) -> Self {
        CollisionInfo {
            has_collision: true,
            obstruction: Some(Obstruction {
                kind: body.kind,
                name: body.name.clone(),
                size: body.size,
                position: body.position,
            }),
        }
    }
}

/// Exclusion radius around a body of the given kind and size.
pub fn collision_radius(kind: BodyKind, size: f64) -> f64 {
    let size = size.max(0.0);
    match kind {
        BodyKind::Star => (size.sqrt() * STAR_RADIUS_FACTOR).min(STAR_RADIUS_CAP),
        BodyKind::Station => STATION_RADIUS,
        BodyKind::Planet | BodyKind::Asteroid => {
            (size.sqrt() * ROCK_RADIUS_FACTOR).min(ROCK_RADIUS_CAP)
        }
    }
}

/// Returns the first body, in the given order, whose radius contains `target`.
pub fn check_collision_against(bodies: &[StaticBody], target: &Position) -> CollisionInfo {
    bodies
        .iter()
        .find(|body| body.position.distance(target) < collision_radius(body.kind, body.size))
        .map(CollisionInfo::blocked_by)
        .unwrap_or_else(CollisionInfo::clear)
}

/// Checks `target` against the static bodies of its owning system.
///
/// A system without a record is empty space. Other ships never obstruct.
pub fn check_collision(store: &dyn NavigationStore, target: &Position) -> Result<CollisionInfo> {
    let Some(system) = store.system(system_of(target))? else {
        return Ok(CollisionInfo::clear());
    };
    Ok(check_collision_against(&system.static_bodies, target))
}
