//! Starting state of a training hand, as authored by the content source.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::action::ActionEntry;
use super::error::TableError;
use super::position::{build_players_array, calculate_hero_seat, Position, Seat, Topology};

/// Effective stacks in BB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EffectiveStacks {
    /// Hero's stack.
    pub hero: f64,
    /// Villain stacks, ordered by seat, excluding the hero.
    #[serde(default)]
    pub villains: Vec<f64>,
}

impl EffectiveStacks {
    /// Create stacks from the hero's and the villains'.
    pub fn new(hero: f64, villains: Vec<f64>) -> Self {
        Self { hero, villains }
    }
}

/// Everything the replay needs to set the table before the hero acts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartingState {
    /// Table size.
    pub topology: Topology,
    /// Seat holding the dealer button.
    pub button_seat: usize,
    /// Hero's position label.
    pub hero_position: Position,
    /// Stacks at the start of the hand.
    #[serde(default)]
    pub effective_stacks: EffectiveStacks,
    /// Actions taken before the hero, in order.
    #[serde(default)]
    pub action_history: Vec<ActionEntry>,
}

impl StartingState {
    /// Parse a starting state from JSON.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a starting state from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let state = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            topology = %state.topology,
            actions = state.action_history.len(),
            "loaded starting state"
        );
        Ok(state)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every seat reference fits the table.
    ///
    /// Replay itself never calls this; it renders whatever it is given.
    pub fn validate(&self) -> Result<(), TableError> {
        let n = self.topology.seats();
        if self.button_seat >= n {
            return Err(TableError::ButtonOutOfRange {
                button: self.button_seat,
                topology: n,
            });
        }
        for (index, entry) in self.action_history.iter().enumerate() {
            if entry.seat >= n {
                return Err(TableError::SeatOutOfRange {
                    index,
                    seat: entry.seat,
                    topology: n,
                });
            }
        }
        Ok(())
    }

    /// Absolute seat of the hero.
    pub fn hero_seat(&self) -> usize {
        calculate_hero_seat(&self.hero_position, self.button_seat, self.topology)
    }

    /// Seat roster for table rendering.
    pub fn players(&self) -> Vec<Seat> {
        build_players_array(
            &self.effective_stacks,
            &self.hero_position,
            self.button_seat,
            self.topology,
        )
    }
}
