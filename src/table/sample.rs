//! Random but plausible preflop action logs.
//!
//! Used by the CLI's `--random` mode, the benchmarks and the property
//! tests. With a seeded RNG the output is reproducible.

use rand::Rng;

use super::action::ActionEntry;
use super::position::{calculate_hero_seat, Position, Topology};
use super::state::{EffectiveStacks, StartingState};

/// Starting stack range (in BB) for generated hands.
const STACK_RANGE: (f64, f64) = (20.0, 150.0);

fn round_half(bb: f64) -> f64 {
    (bb * 2.0).round() / 2.0
}

/// Generate the actions of every player who acts before the hero.
///
/// Action starts at UTG (the button heads-up) and walks clockwise until it
/// reaches the hero's seat.
pub fn random_action_history<R: Rng>(
    rng: &mut R,
    topology: Topology,
    button_seat: usize,
    hero_position: &Position,
    stacks: &[f64],
) -> Vec<ActionEntry> {
    let n = topology.seats();
    let labels = topology.labels();
    let hero_seat = calculate_hero_seat(hero_position, button_seat, topology);
    let first_offset = if topology == Topology::HeadsUp { 0 } else { 3 };

    let mut history = Vec::new();
    let mut to_call = 1.0;
    let mut raised = false;
    let mut shoved = false;

    for k in 0..n {
        let offset = (first_offset + k) % n;
        let seat = (button_seat + offset) % n;
        if seat == hero_seat {
            break;
        }
        let position = labels[offset].clone();
        let stack = stacks.get(seat).copied().unwrap_or(100.0);
        let roll: f64 = rng.gen();

        let entry = if shoved {
            if roll < 0.8 {
                ActionEntry::fold(seat, position)
            } else {
                ActionEntry::all_in(seat, position, round_half(stack.min(to_call)))
            }
        } else if raised {
            if roll < 0.6 {
                ActionEntry::fold(seat, position)
            } else if roll < 0.82 {
                ActionEntry::call(seat, position, to_call)
            } else if roll < 0.95 {
                to_call = round_half(to_call * 3.0);
                ActionEntry::raise(seat, position, to_call)
            } else {
                shoved = true;
                to_call = round_half(stack);
                ActionEntry::all_in(seat, position, to_call)
            }
        } else if roll < 0.6 {
            ActionEntry::fold(seat, position)
        } else if roll < 0.9 {
            raised = true;
            to_call = round_half(rng.gen_range(2.0..3.5));
            ActionEntry::raise(seat, position, to_call)
        } else {
            ActionEntry::call(seat, position, to_call)
        };
        history.push(entry);
    }

    history
}

/// Generate a complete starting state with random button, hero and stacks.
pub fn random_starting_state<R: Rng>(rng: &mut R, topology: Topology) -> StartingState {
    let n = topology.seats();
    let button_seat = rng.gen_range(0..n);
    let labels = topology.labels();
    let hero_position = labels[rng.gen_range(0..labels.len())].clone();
    let stacks: Vec<f64> = (0..n)
        .map(|_| round_half(rng.gen_range(STACK_RANGE.0..STACK_RANGE.1)))
        .collect();

    let hero_seat = calculate_hero_seat(&hero_position, button_seat, topology);
    let villains = stacks
        .iter()
        .enumerate()
        .filter(|(seat, _)| *seat != hero_seat)
        .map(|(_, stack)| *stack)
        .collect();
    let action_history =
        random_action_history(rng, topology, button_seat, &hero_position, &stacks);

    StartingState {
        topology,
        button_seat,
        hero_position,
        effective_stacks: EffectiveStacks::new(stacks[hero_seat], villains),
        action_history,
    }
}
