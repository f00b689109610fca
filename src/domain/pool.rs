//! Word pool: the dictionary words are drawn from.
//!
//! ## Sources (priority order):
//!   1. External word file (`words_file` in config.toml)
//!   2. Built-in embedded dictionary (`data/words.txt`)
//!
//! ## File format:
//!   One word per line. Lines starting with `#` are comments.
//!   Words are trimmed and lowercased; anything that is not 3-8 ASCII
//!   letters is dropped.

use std::path::Path;

use rand::seq::IndexedRandom;
use rand::Rng;

pub const MIN_WORD_LEN: usize = 3;
pub const MAX_WORD_LEN: usize = 8;

const EMBEDDED_WORDS: &str = include_str!("../../data/words.txt");

#[derive(Clone, Debug)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    /// Build a pool from arbitrary words, keeping only the valid ones in order.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .filter_map(|w| normalize(w.as_ref()))
            .collect();
        WordPool { words }
    }

    pub fn embedded() -> Self {
        Self::from_text(EMBEDDED_WORDS)
    }

    fn from_text(text: &str) -> Self {
        Self::from_words(text.lines().filter(|l| !l.trim_start().starts_with('#')))
    }

    /// Load from a word file, falling back to the embedded list if the file
    /// is missing, unreadable, or contains no valid words.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::embedded();
        };
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let pool = Self::from_text(&text);
                if pool.is_empty() {
                    log::warn!("{}: no usable 3-8 letter words, using built-in list", path.display());
                    Self::embedded()
                } else {
                    log::info!("Loaded {} words from {}", pool.len(), path.display());
                    pool
                }
            }
            Err(e) => {
                if path.exists() {
                    log::warn!("could not read {}: {e}", path.display());
                }
                Self::embedded()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Uniform pick. `None` only for an empty pool.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.words.choose(rng).map(String::as_str)
    }

    #[cfg(test)]
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

fn normalize(raw: &str) -> Option<String> {
    let w = raw.trim().to_ascii_lowercase();
    let valid = (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&w.len())
        && w.bytes().all(|b| b.is_ascii_lowercase());
    valid.then_some(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::io::Write;

    #[test]
    fn filters_to_valid_lengths() {
        let pool = WordPool::from_words(["ox", "cat", "  Rocket ", "extraordinary", "don't", "eightchr", ""]);
        assert_eq!(pool.words(), &["cat", "rocket", "eightchr"]);
    }

    #[test]
    fn embedded_list_is_all_valid() {
        let pool = WordPool::embedded();
        assert!(pool.len() > 100);
        for w in pool.words() {
            assert!((3..=8).contains(&w.len()), "{w}");
            assert!(w.bytes().all(|b| b.is_ascii_lowercase()), "{w}");
        }
    }

    #[test]
    fn choose_is_deterministic_for_a_seed() {
        let pool = WordPool::embedded();
        let mut a = Pcg32::seed_from_u64(9);
        let mut b = Pcg32::seed_from_u64(9);
        for _ in 0..20 {
            assert_eq!(pool.choose(&mut a), pool.choose(&mut b));
        }
    }

    #[test]
    fn empty_pool_chooses_nothing() {
        let pool = WordPool::from_words(Vec::<String>::new());
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(pool.choose(&mut rng).is_none());
    }

    #[test]
    fn load_reads_file_and_skips_comments() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# header\nalpha\nbe\ngamma\n#delta").unwrap();
        let pool = WordPool::load(Some(f.path()));
        assert_eq!(pool.words(), &["alpha", "gamma"]);
    }

    #[test]
    fn load_falls_back_to_embedded() {
        let missing = WordPool::load(Some(Path::new("/definitely/not/here/words.txt")));
        assert_eq!(missing.len(), WordPool::embedded().len());

        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "no\nx\nsupercalifragilistic").unwrap();
        let junk = WordPool::load(Some(f.path()));
        assert_eq!(junk.len(), WordPool::embedded().len());
    }
}
