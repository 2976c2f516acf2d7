use serde::{Deserialize, Serialize};

/// The four answer choices of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    /// All choices in declaration order.
    pub const ALL: [Choice; 4] = [Choice::A, Choice::B, Choice::C, Choice::D];

    /// Parses an option letter. Input is trimmed and upper-cased first, so
    /// `" b "` parses as `B`.
    pub fn parse(raw: &str) -> Option<Choice> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Choice::A),
            "B" => Some(Choice::B),
            "C" => Some(Choice::C),
            "D" => Some(Choice::D),
            _ => None,
        }
    }

    /// The option letter as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question snapshotted into a session. Immutable after session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// The unique identifier of the question within its set.
    pub id: String,
    /// The question text.
    pub text: String,
    /// The option texts, keyed `A..D` in order.
    pub options: [String; 4],
    /// The correct option.
    pub correct: Choice,
}

impl Question {
    /// The display text of one option.
    pub fn option_text(&self, choice: Choice) -> &str {
        &self.options[choice as usize]
    }
}
