//! Pre-hero table actions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::position::Position;

/// Kind of action a player took before the hero.
///
/// Content files use the wire names `fold`, `check`, `call`, `raise` and
/// `all-in`. Anything else is kept as [`ActionKind::Unknown`] and replayed
/// with a generic narrative and the default delay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Fold the hand.
    Fold,
    /// Check.
    Check,
    /// Call the current bet.
    Call,
    /// Raise to an amount.
    Raise,
    /// Commit the whole stack.
    AllIn,
    /// An action name this crate does not recognize.
    Unknown(String),
}

impl ActionKind {
    /// Wire name of this action.
    pub fn wire_name(&self) -> &str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
            ActionKind::AllIn => "all-in",
            ActionKind::Unknown(name) => name,
        }
    }

    /// Check if this is an aggressive action.
    pub fn is_aggressive(&self) -> bool {
        matches!(self, ActionKind::Raise | ActionKind::AllIn)
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "fold" => ActionKind::Fold,
            "check" => ActionKind::Check,
            "call" => ActionKind::Call,
            "raise" => ActionKind::Raise,
            "all-in" | "allin" => ActionKind::AllIn,
            _ => ActionKind::Unknown(name),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Unknown(name) => name,
            known => known.wire_name().to_string(),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// One entry of the pre-hero action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// Absolute seat of the acting player.
    pub seat: usize,
    /// Position label of the acting player.
    pub position: Position,
    /// What they did.
    pub action: ActionKind,
    /// Amount in BB, for calls, raises and all-ins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl ActionEntry {
    /// Create an entry from its parts.
    pub fn new(
        seat: usize,
        position: impl Into<Position>,
        action: ActionKind,
        amount: Option<f64>,
    ) -> Self {
        Self {
            seat,
            position: position.into(),
            action,
            amount,
        }
    }

    /// A fold.
    pub fn fold(seat: usize, position: impl Into<Position>) -> Self {
        Self::new(seat, position, ActionKind::Fold, None)
    }

    /// A check.
    pub fn check(seat: usize, position: impl Into<Position>) -> Self {
        Self::new(seat, position, ActionKind::Check, None)
    }

    /// A call of `amount` BB.
    pub fn call(seat: usize, position: impl Into<Position>, amount: f64) -> Self {
        Self::new(seat, position, ActionKind::Call, Some(amount))
    }

    /// A raise to `amount` BB.
    pub fn raise(seat: usize, position: impl Into<Position>, amount: f64) -> Self {
        Self::new(seat, position, ActionKind::Raise, Some(amount))
    }

    /// An all-in for `amount` BB.
    pub fn all_in(seat: usize, position: impl Into<Position>, amount: f64) -> Self {
        Self::new(seat, position, ActionKind::AllIn, Some(amount))
    }

    /// Amount worth showing in text. Zero and NaN count as absent.
    pub fn display_amount(&self) -> Option<f64> {
        self.amount.filter(|amt| *amt != 0.0 && !amt.is_nan())
    }
}
