//! Human-readable narration of an action log.

use crate::table::{ActionEntry, ActionKind};

/// Narrative shown when nobody acted before the hero.
pub const EMPTY_NARRATIVE: &str = "Action on you";

/// Narrate a single action as a sentence fragment.
///
/// ```
/// use preflop_replay::replay::generate_action_narrative;
/// use preflop_replay::table::ActionEntry;
///
/// assert_eq!(generate_action_narrative(&ActionEntry::raise(4, "CO", 2.5)), "CO raises to 2.5BB");
/// ```
pub fn generate_action_narrative(entry: &ActionEntry) -> String {
    let position = &entry.position;
    let amount = entry.display_amount();

    match (&entry.action, amount) {
        (ActionKind::Fold, _) => format!("{} folds", position),
        (ActionKind::Check, _) => format!("{} checks", position),
        (ActionKind::Call, Some(amt)) => format!("{} calls {}BB", position, amt),
        (ActionKind::Call, None) => format!("{} calls", position),
        (ActionKind::Raise, Some(amt)) => format!("{} raises to {}BB", position, amt),
        (ActionKind::Raise, None) => format!("{} raises", position),
        (ActionKind::AllIn, Some(amt)) => format!("{} is ALL-IN for {}BB!", position, amt),
        (ActionKind::AllIn, None) => format!("{} is ALL-IN!", position),
        (ActionKind::Unknown(_), _) => format!("{} acts", position),
    }
}

/// Turn a run of consecutive folders into one clause.
fn fold_clause(folders: &[String]) -> String {
    match folders {
        [] => String::new(),
        [only] => format!("{} folds", only),
        [rest @ .., last] => format!("{} and {} fold", rest.join(", "), last),
    }
}

/// Narrate a whole action log.
///
/// Contiguous folds collapse into a single clause ("UTG, MP and CO fold");
/// every other action is its own clause. Clauses are joined with ". " and
/// the result ends with a period.
pub fn generate_full_narrative(action_history: &[ActionEntry]) -> String {
    if action_history.is_empty() {
        return EMPTY_NARRATIVE.to_string();
    }

    let mut clauses = Vec::new();
    let mut folders: Vec<String> = Vec::new();

    for entry in action_history {
        if entry.action == ActionKind::Fold {
            folders.push(entry.position.to_string());
            continue;
        }
        if !folders.is_empty() {
            clauses.push(fold_clause(&folders));
            folders.clear();
        }
        clauses.push(generate_action_narrative(entry));
    }

    if !folders.is_empty() {
        clauses.push(fold_clause(&folders));
    }

    format!("{}.", clauses.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        assert_eq!(generate_full_narrative(&[]), "Action on you");
    }

    #[test]
    fn test_fold_grouping() {
        let utg = ActionEntry::fold(3, "UTG");
        let mp = ActionEntry::fold(4, "MP");
        let co = ActionEntry::fold(5, "CO");

        assert_eq!(generate_full_narrative(&[utg.clone()]), "UTG folds.");
        assert_eq!(
            generate_full_narrative(&[utg.clone(), mp.clone()]),
            "UTG and MP fold."
        );
        assert_eq!(
            generate_full_narrative(&[utg, mp, co]),
            "UTG, MP and CO fold."
        );
    }

    #[test]
    fn test_fold_then_raise() {
        let history = [ActionEntry::fold(3, "UTG"), ActionEntry::raise(0, "BTN", 3.0)];
        assert_eq!(generate_full_narrative(&history), "UTG folds. BTN raises to 3BB.");
    }

    #[test]
    fn test_folds_are_not_reordered_across_actions() {
        let history = [
            ActionEntry::fold(3, "UTG"),
            ActionEntry::fold(4, "HJ"),
            ActionEntry::raise(5, "CO", 2.5),
            ActionEntry::fold(0, "BTN"),
            ActionEntry::call(1, "SB", 2.5),
            ActionEntry::fold(2, "BB"),
        ];
        assert_eq!(
            generate_full_narrative(&history),
            "UTG and HJ fold. CO raises to 2.5BB. BTN folds. SB calls 2.5BB. BB folds."
        );
    }

    #[test]
    fn test_fragment_templates() {
        assert_eq!(generate_action_narrative(&ActionEntry::check(2, "BB")), "BB checks");
        assert_eq!(generate_action_narrative(&ActionEntry::call(0, "BTN", 1.0)), "BTN calls 1BB");
        assert_eq!(
            generate_action_narrative(&ActionEntry::new(0, "BTN", ActionKind::Call, None)),
            "BTN calls"
        );
        assert_eq!(
            generate_action_narrative(&ActionEntry::new(4, "CO", ActionKind::Raise, None)),
            "CO raises"
        );
        assert_eq!(
            generate_action_narrative(&ActionEntry::all_in(1, "SB", 42.5)),
            "SB is ALL-IN for 42.5BB!"
        );
        assert_eq!(
            generate_action_narrative(&ActionEntry::new(1, "SB", ActionKind::AllIn, None)),
            "SB is ALL-IN!"
        );
    }

    #[test]
    fn test_unknown_action_gets_generic_fragment() {
        let entry = ActionEntry::new(3, "UTG", ActionKind::Unknown("straddle".into()), Some(2.0));
        assert_eq!(generate_action_narrative(&entry), "UTG acts");
        assert_eq!(generate_full_narrative(&[entry]), "UTG acts.");
    }

    #[test]
    fn test_deterministic() {
        let history = [ActionEntry::fold(3, "UTG"), ActionEntry::all_in(4, "HJ", 30.0)];
        assert_eq!(generate_full_narrative(&history), generate_full_narrative(&history));
    }
}
