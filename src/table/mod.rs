//! Table data model and seat resolution.
//!
//! ## Modules
//!
//! - `action`: Pre-hero actions and their wire names
//! - `position`: Position labels, table sizes, seat resolver and roster builder
//! - `state`: Starting state loaded from training content
//! - `sample`: Seeded generator of plausible action logs
//! - `error`: Loading and validation errors

pub mod action;
pub mod error;
pub mod position;
pub mod sample;
pub mod state;

pub use action::{ActionEntry, ActionKind};
pub use error::TableError;
pub use position::{
    build_players_array, calculate_hero_seat, Position, Seat, Topology, DEFAULT_STACK_BB,
};
pub use sample::{random_action_history, random_starting_state};
pub use state::{EffectiveStacks, StartingState};
