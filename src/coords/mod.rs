pub mod direction;
pub mod zone;

pub use direction::Direction;
pub use zone::{
    edge_entry_point, edge_exit_point, is_at_system_edge, is_on_zone_grid, parse_position, round1,
    round_position, same_system, system_of, zone_offset, SystemCoord, MAX_ZONE_OFFSET, ZONE_STEP,
};
