use serde::{Deserialize, Serialize};

const STRESS_WORDS: &[&str] = &[
    "stressed",
    "stress",
    "anxious",
    "anxiety",
    "worried",
    "worry",
    "nervous",
    "scared",
    "afraid",
    "panic",
    "overwhelmed",
    "frustrated",
    "confused",
    "stuck",
    "rejected",
    "refused",
    "denied",
    "desperate",
    "upset",
    "lost hope",
];

const POSITIVE_WORDS: &[&str] = &[
    "approved",
    "approval",
    "accepted",
    "congrat",
    "excited",
    "happy",
    "finally got",
    "passed",
    "celebrate",
    "landed",
    "good news",
    "great news",
    "yay",
    "thrilled",
];

const QUESTION_WORDS: &[&str] = &[
    "?",
    "how do",
    "how long",
    "how much",
    "what is",
    "what are",
    "when will",
    "when should",
    "where do",
    "where can",
    "why is",
    "which",
    "can i",
    "should i",
    "do i need",
    "does anyone",
    "anyone know",
];

/// Three independent flags from keyword lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentResult {
    pub stressed: bool,
    pub positive: bool,
    pub is_question: bool,
}

impl SentimentResult {
    pub fn needs_empathy(&self) -> bool {
        self.stressed
    }

    pub fn needs_celebration(&self) -> bool {
        self.positive
    }

    /// Single label for the conversation log; stress wins over positivity.
    pub fn label(&self) -> SentimentLabel {
        if self.stressed {
            SentimentLabel::Stressed
        } else if self.positive {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Stressed,
    Positive,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Stressed => write!(f, "stressed"),
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

pub fn analyze(text: &str) -> SentimentResult {
    let lowered = text.to_lowercase();
    SentimentResult {
        stressed: contains_any(&lowered, STRESS_WORDS),
        positive: contains_any(&lowered, POSITIVE_WORDS),
        is_question: contains_any(&lowered, QUESTION_WORDS),
    }
}
