//! Terminal input.
//!
//! Drains crossterm events without blocking once per frame, and maps raw
//! key events onto the keys a round understands:
//!
//!   Ctrl+P            pause / resume
//!   Ctrl+Enter, F11   fullscreen (chrome-free) layout
//!   Enter             fire
//!   Esc               spend a free reset
//!   a-z               type (folded to lowercase)

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::resolver::KeyInput;

pub struct InputState {
    /// Key presses collected during the most recent drain, in arrival order.
    /// Resize events are dropped; the renderer re-measures every frame.
    pub keys: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            keys: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.keys.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => self.keys.push(key),
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }
    }
}

/// Map a raw key to round input. Modifier combinations are checked first so
/// Ctrl+Enter never fires.
pub fn round_key(key: &KeyEvent) -> KeyInput {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('p') | KeyCode::Char('P') if ctrl => KeyInput::PauseToggle,
        KeyCode::Enter if ctrl => KeyInput::FullscreenToggle,
        KeyCode::F(11) => KeyInput::FullscreenToggle,
        KeyCode::Enter => KeyInput::Fire,
        KeyCode::Esc => KeyInput::Reset,
        KeyCode::Char(c) if !ctrl && c.is_ascii_alphabetic() => KeyInput::Letter(c.to_ascii_lowercase()),
        _ => KeyInput::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn control_combinations_take_priority() {
        assert_eq!(round_key(&key(KeyCode::Char('p'), KeyModifiers::CONTROL)), KeyInput::PauseToggle);
        assert_eq!(round_key(&key(KeyCode::Enter, KeyModifiers::CONTROL)), KeyInput::FullscreenToggle);
        assert_eq!(round_key(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)), KeyInput::Other);
    }

    #[test]
    fn plain_keys() {
        assert_eq!(round_key(&key(KeyCode::Enter, KeyModifiers::NONE)), KeyInput::Fire);
        assert_eq!(round_key(&key(KeyCode::Esc, KeyModifiers::NONE)), KeyInput::Reset);
        assert_eq!(round_key(&key(KeyCode::Char('p'), KeyModifiers::NONE)), KeyInput::Letter('p'));
        assert_eq!(round_key(&key(KeyCode::Char('Q'), KeyModifiers::SHIFT)), KeyInput::Letter('q'));
        assert_eq!(round_key(&key(KeyCode::Char('7'), KeyModifiers::NONE)), KeyInput::Other);
        assert_eq!(round_key(&key(KeyCode::Tab, KeyModifiers::NONE)), KeyInput::Other);
    }
}
