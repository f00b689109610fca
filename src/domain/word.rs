//! Falling words and prefix matching.
//!
//! A `FallingWord` is the only entity in a round. Its highlighted/unhighlighted
//! halves are derived from `word` + `matched`; nothing else is stored for display.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct WordId(pub u64);

#[derive(Clone, Debug)]
pub struct FallingWord {
    pub id: WordId,
    /// Lowercase ASCII, 3-8 letters.
    pub word: String,
    /// Horizontal placement (playfield units).
    pub x: f32,
    /// Progress along the fall axis; starts above the top edge.
    pub y: f32,
    /// Units per second.
    pub speed: f32,
    /// Letters highlighted as typed; 0 unless this is the active target.
    pub matched: usize,
}

impl FallingWord {
    pub fn new(id: WordId, word: &str, x: f32, y: f32, speed: f32) -> Self {
        FallingWord {
            id,
            word: word.to_ascii_lowercase(),
            x,
            y,
            speed,
            matched: 0,
        }
    }

    pub fn advance(&mut self, dt_secs: f32) {
        self.y += self.speed * dt_secs;
    }

    /// Past the far edge by more than its own half-extent.
    pub fn has_escaped(&self, far_edge: f32, half_extent: f32) -> bool {
        self.y > far_edge + half_extent
    }

    pub fn is_candidate_for(&self, typed: &str) -> bool {
        is_candidate(&self.word, typed)
    }

    pub fn is_exactly(&self, typed: &str) -> bool {
        self.word.eq_ignore_ascii_case(typed)
    }

    pub fn matched_part(&self) -> &str {
        &self.word[..self.matched.min(self.word.len())]
    }

    pub fn unmatched_part(&self) -> &str {
        &self.word[self.matched.min(self.word.len())..]
    }
}

/// Length of the shared leading run of two ASCII strings, ignoring case.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
        .count()
}

/// `typed` is literally a prefix of `word`. No partial credit.
pub fn is_candidate(word: &str, typed: &str) -> bool {
    common_prefix_len(word, typed) == typed.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn common_prefix_counts_shared_run() {
        assert_eq!(common_prefix_len("castle", "cat"), 2);
        assert_eq!(common_prefix_len("cat", "cat"), 3);
        assert_eq!(common_prefix_len("cat", "catch"), 3);
        assert_eq!(common_prefix_len("dog", "cat"), 0);
        assert_eq!(common_prefix_len("Cat", "cA"), 2);
    }

    #[test]
    fn candidate_requires_whole_prefix() {
        assert!(is_candidate("castle", "cas"));
        assert!(is_candidate("castle", ""));
        assert!(!is_candidate("castle", "cat"));
        assert!(!is_candidate("cat", "cats"));
        assert!(is_candidate("castle", "CAS"));
    }

    #[test]
    fn advance_and_escape() {
        let mut w = FallingWord::new(WordId(1), "apple", 100.0, -40.0, 50.0);
        w.advance(2.0);
        assert_eq!(w.y, 60.0);
        assert!(!w.has_escaped(600.0, 40.0));
        w.y = 640.0;
        assert!(!w.has_escaped(600.0, 40.0));
        w.y = 640.5;
        assert!(w.has_escaped(600.0, 40.0));
    }

    #[test]
    fn display_halves_follow_matched() {
        let mut w = FallingWord::new(WordId(7), "Rocket", 0.0, 0.0, 1.0);
        assert_eq!(w.word, "rocket");
        assert_eq!(w.matched_part(), "");
        assert_eq!(w.unmatched_part(), "rocket");
        w.matched = 3;
        assert_eq!(w.matched_part(), "roc");
        assert_eq!(w.unmatched_part(), "ket");
        w.matched = 99;
        assert_eq!(w.unmatched_part(), "");
    }

    proptest! {
        #[test]
        fn candidate_iff_starts_with(word in "[a-z]{3,8}", typed in "[a-zA-Z]{0,9}") {
            let expected = word.starts_with(&typed.to_ascii_lowercase());
            prop_assert_eq!(is_candidate(&word, &typed), expected);
        }
    }
}
