pub mod detector;

pub use detector::{
    check_collision, check_collision_against, collision_radius, CollisionInfo, Obstruction,
};
