//! Puzzles that stand between the user and the snooze button.
//!
//! The more often the alarm was snoozed, the harder the puzzles that may be
//! picked: difficulty is capped at `1 + snooze_count`, up to
//! [`MAX_DIFFICULTY`].

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

pub const MAX_DIFFICULTY: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub question: String,
    pub answer: String,
    pub difficulty: u8,
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<String>().to_ascii_lowercase()
}

impl Puzzle {
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>, difficulty: u8) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            difficulty,
        }
    }

    /// ignores case and whitespace
    #[must_use]
    pub fn is_solved_by(&self, guess: &str) -> bool {
        normalize(guess) == normalize(&self.answer)
    }
}

/// hardest difficulty allowed after `snooze_count` snoozes
#[must_use]
pub fn difficulty_cap(snooze_count: u32) -> u8 {
    u8::try_from(snooze_count.saturating_add(1))
        .unwrap_or(u8::MAX)
        .min(MAX_DIFFICULTY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleBook(Vec<Puzzle>);

impl Default for PuzzleBook {
    fn default() -> Self {
        Self(vec![
            Puzzle::new("What is 5 + 3?", "8", 1),
            Puzzle::new("What is 12 - 4?", "8", 1),
            Puzzle::new("What is 3 × 3?", "9", 1),
            Puzzle::new(
                "Which word does not belong: Apple, Banana, Carrot, Grape?",
                "Carrot",
                2,
            ),
            Puzzle::new(
                "If you rearrange the letters of 'C A T', you get a word. What is it?",
                "CAT",
                2,
            ),
            Puzzle::new(
                "Remember this sequence: 7, 2, 9. Type it in order.",
                "7,2,9",
                3,
            ),
            Puzzle::new(
                "Remember this sequence: Red, Blue, Green. Type it in order.",
                "Red,Blue,Green",
                3,
            ),
            Puzzle::new("Which number comes next: 2, 4, 8, 16, __?", "32", 4),
            Puzzle::new("Solve: (5 × 6) + (3 × 4)", "42", 4),
        ])
    }
}

impl From<Vec<Puzzle>> for PuzzleBook {
    fn from(puzzles: Vec<Puzzle>) -> Self {
        Self(puzzles)
    }
}

impl PuzzleBook {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn eligible(&self, snooze_count: u32) -> impl Iterator<Item = &Puzzle> {
        let cap = difficulty_cap(snooze_count);
        self.0.iter().filter(move |puzzle| puzzle.difficulty <= cap)
    }

    /// A random eligible puzzle, or the easiest one if none is eligible.
    pub fn pick<G: Rng + ?Sized>(&self, snooze_count: u32, rng: &mut G) -> Option<&Puzzle> {
        let eligible: Vec<&Puzzle> = self.eligible(snooze_count).collect();
        eligible
            .choose(rng)
            .copied()
            .or_else(|| self.0.iter().min_by_key(|puzzle| puzzle.difficulty))
    }
}
