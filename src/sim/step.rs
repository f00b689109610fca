//! The step function: advances a round by one frame delta.
//!
//! Processing order:
//!   1. Motion (every live word falls; escapes cost a life)
//!   2. Escalation timer (tier up, re-arm spawning, immediate spawn)
//!   3. Spawn timer (one attempt per firing, capacity permitting)
//!
//! A paused or finished round does not advance at all, so both timers keep
//! their remaining time until play resumes.

use std::time::Duration;

use super::event::RoundEvent;
use super::round::Round;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(round: &mut Round, dt: Duration) -> Vec<RoundEvent> {
    if round.paused || round.over {
        return vec![];
    }

    let mut events = Vec::new();
    round.elapsed += dt;

    resolve_motion(round, dt, &mut events);
    resolve_escalation(round, dt, &mut events);
    resolve_spawns(round, dt, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Resolvers
// ══════════════════════════════════════════════════════════════

fn resolve_motion(round: &mut Round, dt: Duration, events: &mut Vec<RoundEvent>) {
    let secs = dt.as_secs_f32();
    for w in &mut round.words {
        w.advance(secs);
    }

    let edge = round.field().height;
    let half = round.field().word_radius;
    let mut escaped = Vec::new();
    round.words.retain(|w| {
        if w.has_escaped(edge, half) {
            escaped.push(w.id);
            false
        } else {
            true
        }
    });

    for id in escaped {
        log::debug!("word #{} escaped", id.0);
        events.push(RoundEvent::WordEscaped { id });
        // Losing the word being typed discards the partial input.
        if round.target == Some(id) {
            round.clear_input();
            events.push(RoundEvent::TargetChanged { id: None });
        }
        round.lose_life(events);
    }
}

fn resolve_escalation(round: &mut Round, dt: Duration, events: &mut Vec<RoundEvent>) {
    let fired = round.escalation_timer.advance(dt);
    for _ in 0..fired {
        round.escalate(events);
    }
}

fn resolve_spawns(round: &mut Round, dt: Duration, events: &mut Vec<RoundEvent>) {
    let fired = round.spawn_timer.advance(dt);
    for _ in 0..fired {
        round.try_spawn(events);
    }
}
