//! Position labels, table sizes, and the seat resolver.
//!
//! Training content describes players by their relative position label
//! (BTN, SB, CO, ...). The table renderer needs absolute seat indices, so
//! this module maps a label plus the button seat and the table size to a
//! seat in `[0, topology)`, and builds the full seat roster with stacks.
//!
//! Both functions degrade instead of failing: an unrecognized label resolves
//! to the button's own seat, and a short villain stack list is padded with
//! [`DEFAULT_STACK_BB`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::TableError;
use super::state::EffectiveStacks;

/// Stack (in BB) assigned to a villain seat with no authored stack.
pub const DEFAULT_STACK_BB: f64 = 100.0;

/// A relative position label.
///
/// Parsing never fails: unknown labels are kept verbatim in
/// [`Position::Other`] so they can still be rendered in narratives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    /// Button (dealer).
    BTN,
    /// Small blind.
    SB,
    /// Big blind.
    BB,
    /// Under the gun.
    UTG,
    /// Under the gun + 1.
    UTG1,
    /// Middle position.
    MP,
    /// Lojack.
    LJ,
    /// Hijack.
    HJ,
    /// Cutoff.
    CO,
    /// Any label the resolver does not know.
    Other(String),
}

impl Position {
    /// Every known label, in clockwise order starting from the button.
    pub const KNOWN: [Position; 9] = [
        Position::BTN,
        Position::SB,
        Position::BB,
        Position::UTG,
        Position::UTG1,
        Position::MP,
        Position::LJ,
        Position::HJ,
        Position::CO,
    ];

    /// Canonical label text.
    pub fn name(&self) -> &str {
        match self {
            Position::BTN => "BTN",
            Position::SB => "SB",
            Position::BB => "BB",
            Position::UTG => "UTG",
            Position::UTG1 => "UTG+1",
            Position::MP => "MP",
            Position::LJ => "LJ",
            Position::HJ => "HJ",
            Position::CO => "CO",
            Position::Other(label) => label,
        }
    }

    /// Whether this is a label the resolver understands.
    pub fn is_known(&self) -> bool {
        !matches!(self, Position::Other(_))
    }

    /// Fixed clockwise offset from the button, or `None` for unknown labels.
    pub fn button_offset(&self) -> Option<i64> {
        match self {
            Position::BTN => Some(0),
            Position::SB => Some(1),
            Position::BB => Some(2),
            Position::UTG => Some(3),
            Position::UTG1 => Some(4),
            Position::MP => Some(-4),
            Position::LJ => Some(-3),
            Position::HJ => Some(-2),
            Position::CO => Some(-1),
            Position::Other(_) => None,
        }
    }

    /// Offset from the button at a given table size.
    ///
    /// Heads-up the button posts the small blind, so SB sits on the button
    /// and BB is the only other seat.
    fn offset_at(&self, topology: Topology) -> Option<i64> {
        match (topology, self) {
            (Topology::HeadsUp, Position::SB) => Some(0),
            (Topology::HeadsUp, Position::BB) => Some(1),
            _ => self.button_offset(),
        }
    }
}

/// Labels match exactly, case included. `BU` and `UTG1` are accepted as
/// aliases and are written back in canonical form.
impl From<&str> for Position {
    fn from(label: &str) -> Self {
        match label {
            "BTN" | "BU" => Position::BTN,
            "SB" => Position::SB,
            "BB" => Position::BB,
            "UTG" => Position::UTG,
            "UTG+1" | "UTG1" => Position::UTG1,
            "MP" => Position::MP,
            "LJ" => Position::LJ,
            "HJ" => Position::HJ,
            "CO" => Position::CO,
            _ => Position::Other(label.to_string()),
        }
    }
}

impl From<String> for Position {
    fn from(label: String) -> Self {
        Position::from(label.as_str())
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        match position {
            Position::Other(label) => label,
            known => known.name().to_string(),
        }
    }
}

impl FromStr for Position {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Position::from(s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Table size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum Topology {
    /// Two players.
    HeadsUp,
    /// Six players.
    SixMax,
    /// Nine players.
    FullRing,
}

impl Topology {
    /// Number of seats at the table.
    pub fn seats(&self) -> usize {
        match self {
            Topology::HeadsUp => 2,
            Topology::SixMax => 6,
            Topology::FullRing => 9,
        }
    }

    /// Position labels indexed by clockwise offset from the button.
    pub fn labels(&self) -> &'static [Position] {
        static HEADS_UP: [Position; 2] = [Position::BTN, Position::BB];
        static SIX_MAX: [Position; 6] = [
            Position::BTN,
            Position::SB,
            Position::BB,
            Position::UTG,
            Position::HJ,
            Position::CO,
        ];
        static FULL_RING: [Position; 9] = Position::KNOWN;
        match self {
            Topology::HeadsUp => &HEADS_UP,
            Topology::SixMax => &SIX_MAX,
            Topology::FullRing => &FULL_RING,
        }
    }
}

impl TryFrom<usize> for Topology {
    type Error = TableError;

    fn try_from(seats: usize) -> Result<Self, Self::Error> {
        match seats {
            2 => Ok(Topology::HeadsUp),
            6 => Ok(Topology::SixMax),
            9 => Ok(Topology::FullRing),
            other => Err(TableError::InvalidTopology(other)),
        }
    }
}

impl From<Topology> for usize {
    fn from(topology: Topology) -> Self {
        topology.seats()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-max", self.seats())
    }
}

/// One entry of a table roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Absolute seat index.
    pub seat: usize,
    /// Stack in BB.
    pub stack: f64,
    /// Whether the hero sits here.
    pub is_hero: bool,
    /// Position label for this seat.
    pub position: Position,
}

/// Resolve a position label to an absolute seat index.
///
/// Unrecognized labels resolve to the button seat.
pub fn calculate_hero_seat(position: &Position, button_seat: usize, topology: Topology) -> usize {
    let offset = position.offset_at(topology).unwrap_or_else(|| {
        warn!(label = %position, "unrecognized position label, falling back to button seat");
        0
    });
    let n = topology.seats() as i64;
    let seat = ((button_seat as i64 + offset) % n + n) % n;
    seat as usize
}

/// Build the full seat roster for rendering.
///
/// The hero seat gets `stacks.hero`; every other seat takes the next entry
/// of `stacks.villains` in seat order, or [`DEFAULT_STACK_BB`] once the list
/// runs out.
pub fn build_players_array(
    stacks: &EffectiveStacks,
    hero_position: &Position,
    button_seat: usize,
    topology: Topology,
) -> Vec<Seat> {
    let n = topology.seats();
    let labels = topology.labels();
    let hero_seat = calculate_hero_seat(hero_position, button_seat, topology);
    let mut villains = stacks.villains.iter().copied();

    if stacks.villains.len() < n - 1 {
        warn!(
            authored = stacks.villains.len(),
            needed = n - 1,
            "villain stacks missing, padding with default stack"
        );
    }

    (0..n)
        .map(|seat| {
            let offset = (seat + n - button_seat % n) % n;
            let is_hero = seat == hero_seat;
            let stack = if is_hero {
                stacks.hero
            } else {
                villains.next().unwrap_or(DEFAULT_STACK_BB)
            };
            Seat {
                seat,
                stack,
                is_hero,
                position: labels[offset].clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_seat_examples() {
        assert_eq!(calculate_hero_seat(&Position::BB, 0, Topology::SixMax), 2);
        assert_eq!(calculate_hero_seat(&Position::CO, 3, Topology::FullRing), 2);
    }

    #[test]
    fn test_negative_offsets_wrap() {
        assert_eq!(calculate_hero_seat(&Position::CO, 0, Topology::SixMax), 5);
        assert_eq!(calculate_hero_seat(&Position::HJ, 1, Topology::SixMax), 5);
        assert_eq!(calculate_hero_seat(&Position::MP, 0, Topology::FullRing), 5);
    }

    #[test]
    fn test_unknown_label_falls_back_to_button() {
        let label = Position::from("STRADDLE");
        assert!(!label.is_known());
        assert_eq!(calculate_hero_seat(&label, 4, Topology::SixMax), 4);
        assert_eq!(calculate_hero_seat(&label, 7, Topology::FullRing), 7);
    }

    #[test]
    fn test_heads_up_blinds() {
        assert_eq!(calculate_hero_seat(&Position::SB, 1, Topology::HeadsUp), 1);
        assert_eq!(calculate_hero_seat(&Position::BTN, 1, Topology::HeadsUp), 1);
        assert_eq!(calculate_hero_seat(&Position::BB, 1, Topology::HeadsUp), 0);
    }

    #[test]
    fn test_resolver_agrees_with_roster_labels() {
        for topology in [Topology::HeadsUp, Topology::SixMax, Topology::FullRing] {
            for button in 0..topology.seats() {
                let stacks = EffectiveStacks::new(50.0, vec![]);
                let roster = build_players_array(&stacks, &Position::BTN, button, topology);
                for seat in &roster {
                    assert_eq!(
                        calculate_hero_seat(&seat.position, button, topology),
                        seat.seat,
                        "{} at {} (button {})",
                        seat.position,
                        topology,
                        button
                    );
                }
            }
        }
    }

    #[test]
    fn test_roster_assigns_stacks_in_seat_order() {
        let stacks = EffectiveStacks::new(40.0, vec![10.0, 20.0, 30.0, 50.0, 60.0]);
        let roster = build_players_array(&stacks, &Position::BB, 0, Topology::SixMax);

        assert_eq!(roster.len(), 6);
        assert!(roster[2].is_hero);
        assert_eq!(roster[2].stack, 40.0);
        let villain_stacks: Vec<f64> = roster
            .iter()
            .filter(|s| !s.is_hero)
            .map(|s| s.stack)
            .collect();
        assert_eq!(villain_stacks, vec![10.0, 20.0, 30.0, 50.0, 60.0]);
        assert_eq!(roster[0].position, Position::BTN);
        assert_eq!(roster[5].position, Position::CO);
    }

    #[test]
    fn test_short_villain_list_uses_default_stack() {
        let stacks = EffectiveStacks::new(25.0, vec![15.0]);
        let roster = build_players_array(&stacks, &Position::UTG, 3, Topology::FullRing);

        assert_eq!(roster.iter().filter(|s| s.is_hero).count(), 1);
        let villains: Vec<f64> = roster.iter().filter(|s| !s.is_hero).map(|s| s.stack).collect();
        assert_eq!(villains[0], 15.0);
        assert!(villains[1..].iter().all(|&s| s == DEFAULT_STACK_BB));
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(Position::from("BU"), Position::BTN);
        assert_eq!(Position::from("UTG1"), Position::UTG1);
        assert_eq!(Position::UTG1.to_string(), "UTG+1");
        assert_eq!(Position::from("Dealer+3").to_string(), "Dealer+3");
    }

    #[test]
    fn test_label_parsing_is_case_sensitive() {
        for label in ["bu", "co", "Button", " CO"] {
            let position = Position::from(label);
            assert!(!position.is_known());
            assert_eq!(String::from(position), label);
            assert_eq!(calculate_hero_seat(&Position::from(label), 4, Topology::SixMax), 4);
        }
    }

    #[test]
    fn test_topology_from_seats() {
        assert_eq!(Topology::try_from(6).ok(), Some(Topology::SixMax));
        assert!(matches!(Topology::try_from(8), Err(TableError::InvalidTopology(8))));
    }
}
