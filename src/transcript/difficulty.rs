use serde::{Deserialize, Serialize};

/// Words longer than this count as complex
const COMPLEX_WORD_LEN: usize = 8;

/// Rough reading difficulty of a caption line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Rate a line by its share of long words and its mean word length
    pub fn assess(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Difficulty::Beginner;
        }

        let count = words.len() as f64;
        let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
        let avg_word_len = total_len as f64 / count;
        let complex = words
            .iter()
            .filter(|w| w.chars().count() > COMPLEX_WORD_LEN)
            .count();
        let complexity_ratio = complex as f64 / count;

        if complexity_ratio > 0.25 || avg_word_len > 6.0 {
            Difficulty::Advanced
        } else if complexity_ratio > 0.1 || avg_word_len > 4.5 {
            Difficulty::Intermediate
        } else {
            Difficulty::Beginner
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Beginner
    }
}
