//! Keystroke resolution for a live round.
//!
//! Priority per key: round over (ignored) → pause toggle → fullscreen
//! toggle → (paused: ignored) → fire → reset → letter. Anything else is
//! dropped without touching state.

use super::event::RoundEvent;
use super::round::Round;

/// A key as the round sees it. The terminal layer maps raw key codes here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    PauseToggle,
    FullscreenToggle,
    Fire,
    Reset,
    Letter(char),
    Other,
}

pub fn handle_key(round: &mut Round, key: KeyInput) -> Vec<RoundEvent> {
    let mut events = Vec::new();
    if round.over {
        return events;
    }

    match key {
        KeyInput::PauseToggle => toggle_pause(round, &mut events),
        KeyInput::FullscreenToggle => events.push(RoundEvent::FullscreenToggled),
        _ if round.paused => {}
        KeyInput::Fire => fire(round, &mut events),
        KeyInput::Reset => use_reset(round, &mut events),
        KeyInput::Letter(c) if c.is_ascii_alphabetic() => type_letter(round, c, &mut events),
        KeyInput::Letter(_) | KeyInput::Other => {}
    }

    events
}

// ── Pause ──

fn toggle_pause(round: &mut Round, events: &mut Vec<RoundEvent>) {
    round.paused = !round.paused;
    log::debug!("paused={}", round.paused);
    events.push(if round.paused { RoundEvent::Paused } else { RoundEvent::Resumed });
}

// ── Typing ──

fn type_letter(round: &mut Round, c: char, events: &mut Vec<RoundEvent>) {
    round.input.push(c.to_ascii_lowercase());
    events.push(RoundEvent::LetterTyped);
    if let Some(ev) = recompute_target(round) {
        events.push(ev);
    }
}

/// Re-pick the active target for the current input.
///
/// The earliest-spawned word having the input as a prefix, even when a later
/// word is spelled exactly by it. Only the target shows matched letters.
pub fn recompute_target(round: &mut Round) -> Option<RoundEvent> {
    let previous = round.target;
    let typed = round.input.as_str();

    let next = if typed.is_empty() {
        None
    } else {
        round
            .words
            .iter()
            .find(|w| w.is_candidate_for(typed))
            .map(|w| w.id)
    };

    for w in &mut round.words {
        w.matched = if Some(w.id) == next { typed.len() } else { 0 };
    }
    round.target = next;

    (previous != next).then_some(RoundEvent::TargetChanged { id: next })
}

// ── Fire ──

fn fire(round: &mut Round, events: &mut Vec<RoundEvent>) {
    let hit = round
        .active_word()
        .filter(|w| w.is_exactly(&round.input))
        .map(|w| w.id);

    match hit {
        Some(id) => round.shoot(id, events),
        None if !round.input.is_empty() => round.misfire(events),
        None => {
            round.clear_input();
            events.push(RoundEvent::InputCleared);
        }
    }
}

// ── Reset ──

fn use_reset(round: &mut Round, events: &mut Vec<RoundEvent>) {
    if round.free_resets == 0 {
        log::debug!("reset rejected, none left");
        events.push(RoundEvent::ResetRejected);
        return;
    }
    round.free_resets -= 1;
    round.clear_input();
    events.push(RoundEvent::ResetUsed { remaining: round.free_resets });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::difficulty::Difficulty;
    use crate::sim::round::tests::{plant, round_with};
    use proptest::prelude::*;

    fn type_str(r: &mut Round, s: &str) -> Vec<RoundEvent> {
        s.chars().flat_map(|c| handle_key(r, KeyInput::Letter(c))).collect()
    }

    #[test]
    fn typing_and_firing_shoots_target() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        let id = plant(&mut r, "cat", 50.0);
        type_str(&mut r, "cat");
        assert_eq!(r.target, Some(id));
        assert_eq!(r.words[0].matched, 3);

        let events = handle_key(&mut r, KeyInput::Fire);
        assert!(r.words.is_empty());
        assert_eq!(r.score, 10);
        assert!(r.input.is_empty());
        assert_eq!(r.target, None);
        assert!(matches!(events.as_slice(), [RoundEvent::Shot { points: 10, .. }]));
    }

    #[test]
    fn no_candidate_then_fire_is_a_misfire() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        plant(&mut r, "cat", 50.0);
        type_str(&mut r, "xy");
        assert_eq!(r.target, None);
        assert_eq!(r.words[0].matched, 0);

        let events = handle_key(&mut r, KeyInput::Fire);
        assert_eq!(events, vec![RoundEvent::Misfired]);
        assert_eq!(r.words.len(), 1);
        assert_eq!(r.score, 0);
        assert!(r.input.is_empty());
    }

    #[test]
    fn partial_word_fire_misfires() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        plant(&mut r, "castle", 50.0);
        type_str(&mut r, "cas");
        assert_eq!(handle_key(&mut r, KeyInput::Fire), vec![RoundEvent::Misfired]);
        assert_eq!(r.words.len(), 1);
    }

    #[test]
    fn fire_with_empty_input_just_clears() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        assert_eq!(handle_key(&mut r, KeyInput::Fire), vec![RoundEvent::InputCleared]);
    }

    #[test]
    fn earlier_spawn_keeps_target_over_exact_word() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        let catalog = plant(&mut r, "catalog", 50.0);
        let cat = plant(&mut r, "cat", 10.0);
        type_str(&mut r, "cat");
        assert_eq!(r.target, Some(catalog));
        assert_eq!(r.word(catalog).unwrap().matched, 3);
        assert_eq!(r.word(cat).unwrap().matched, 0);

        assert_eq!(handle_key(&mut r, KeyInput::Fire), vec![RoundEvent::Misfired]);
        assert_eq!(r.words.len(), 2);
        assert_eq!(r.score, 0);
    }

    #[test]
    fn target_switches_when_prefix_diverges() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        plant(&mut r, "cat", 50.0);
        let cow = plant(&mut r, "cow", 50.0);
        type_str(&mut r, "co");
        assert_eq!(r.target, Some(cow));
        type_str(&mut r, "q");
        assert_eq!(r.target, None);
        assert!(r.words.iter().all(|w| w.matched == 0));
    }

    #[test]
    fn uppercase_letters_are_folded() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        plant(&mut r, "cat", 50.0);
        type_str(&mut r, "CaT");
        assert_eq!(r.input, "cat");
        handle_key(&mut r, KeyInput::Fire);
        assert_eq!(r.score, 10);
    }

    #[test]
    fn non_letters_are_ignored() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        assert!(handle_key(&mut r, KeyInput::Letter('3')).is_empty());
        assert!(handle_key(&mut r, KeyInput::Other).is_empty());
        assert!(r.input.is_empty());
    }

    #[test]
    fn reset_without_resets_is_rejected() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        r.free_resets = 0;
        plant(&mut r, "cat", 50.0);
        type_str(&mut r, "ca");
        assert_eq!(handle_key(&mut r, KeyInput::Reset), vec![RoundEvent::ResetRejected]);
        assert_eq!(r.input, "ca");
        assert_eq!(r.free_resets, 0);
    }

    #[test]
    fn reset_spends_one_and_clears() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        plant(&mut r, "cat", 50.0);
        type_str(&mut r, "ca");
        assert_eq!(handle_key(&mut r, KeyInput::Reset), vec![RoundEvent::ResetUsed { remaining: 0 }]);
        assert!(r.input.is_empty());
        assert_eq!(r.target, None);
        assert_eq!(r.words[0].matched, 0);
    }

    #[test]
    fn shooting_past_hundred_awards_reset() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        r.score = 95;
        plant(&mut r, "cat", 50.0);
        type_str(&mut r, "cat");
        let events = handle_key(&mut r, KeyInput::Fire);
        assert_eq!(r.score, 105);
        assert_eq!(r.free_resets, 2);
        assert!(events.contains(&RoundEvent::ResetAwarded { total: 2 }));
    }

    #[test]
    fn duplicate_words_lose_only_one() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        let first = plant(&mut r, "cat", 50.0);
        let second = plant(&mut r, "cat", 80.0);
        type_str(&mut r, "cat");
        assert_eq!(r.target, Some(first));
        handle_key(&mut r, KeyInput::Fire);
        assert_eq!(r.words.len(), 1);
        assert_eq!(r.words[0].id, second);
    }

    #[test]
    fn paused_round_ignores_play_keys() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        plant(&mut r, "cat", 50.0);
        assert_eq!(handle_key(&mut r, KeyInput::PauseToggle), vec![RoundEvent::Paused]);
        assert!(type_str(&mut r, "cat").is_empty());
        assert!(handle_key(&mut r, KeyInput::Fire).is_empty());
        assert!(handle_key(&mut r, KeyInput::Reset).is_empty());
        assert_eq!(handle_key(&mut r, KeyInput::FullscreenToggle), vec![RoundEvent::FullscreenToggled]);
        assert_eq!(handle_key(&mut r, KeyInput::PauseToggle), vec![RoundEvent::Resumed]);
        assert_eq!(r.free_resets, 1);
        assert!(r.input.is_empty());
    }

    #[test]
    fn finished_round_ignores_everything() {
        let mut r = round_with(Difficulty::Medium, &["cat"]);
        r.over = true;
        assert!(handle_key(&mut r, KeyInput::PauseToggle).is_empty());
        assert!(handle_key(&mut r, KeyInput::Letter('c')).is_empty());
        assert!(!r.paused);
    }

    proptest! {
        #[test]
        fn target_always_prefixed_by_input(keys in proptest::collection::vec("[a-z!]", 0..30)) {
            let mut r = round_with(Difficulty::Medium, &["cat"]);
            for w in ["cat", "castle", "cow", "apple", "ape"] {
                plant(&mut r, w, 0.0);
            }
            for k in keys {
                let key = match k.as_str() {
                    "!" => KeyInput::Fire,
                    s => KeyInput::Letter(s.chars().next().unwrap_or('a')),
                };
                handle_key(&mut r, key);
                if let Some(w) = r.active_word() {
                    prop_assert!(w.word.starts_with(&r.input));
                    prop_assert_eq!(w.matched, r.input.len());
                } else {
                    prop_assert!(r.target.is_none());
                }
                let highlighted = r.words.iter().filter(|w| w.matched > 0).count();
                prop_assert!(highlighted <= 1);
            }
        }
    }
}
