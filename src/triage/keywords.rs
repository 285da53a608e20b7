//! Topic detection against a fixed immigration vocabulary.
//!
//! Matching is case-insensitive substring search, so multi-word phrases
//! work and no tokenizer is involved. Very short acronyms that occur inside
//! ordinary words ("eta", "ita") are deliberately absent.

use std::collections::BTreeSet;

/// Domain phrases, lowercase.
pub const VOCABULARY: &[&str] = &[
    "visa",
    "visitor visa",
    "student visa",
    "work permit",
    "open work permit",
    "study permit",
    "pgwp",
    "lmia",
    "permanent residence",
    "permanent resident",
    "pr card",
    "express entry",
    "crs score",
    "invitation to apply",
    "provincial nominee",
    "pnp",
    "ircc",
    "immigration",
    "canada",
    "canadian",
    "citizenship",
    "passport",
    "biometrics",
    "ielts",
    "celpip",
    "credential assessment",
    "world education services",
    "noc code",
    "proof of funds",
    "settlement funds",
    "medical exam",
    "police certificate",
    "sponsorship",
    "spousal",
    "refugee",
    "asylum",
    "green card",
    "h1b",
    "embassy",
    "consulate",
];

/// The generic travel-document term that collides with card brands.
const DOCUMENT_CLASS_TERM: &str = "visa";

/// Payment-card phrases that mean "visa" is the card network.
const FINANCIAL_CARD_TERMS: &[&str] = &["credit card", "debit card", "mastercard"];

/// Matched vocabulary phrases, deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub keywords: BTreeSet<String>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.keywords.iter().cloned().collect()
    }
}

pub fn detect(text: &str) -> DetectionResult {
    let lowered = text.to_lowercase();
    let mentions_card = FINANCIAL_CARD_TERMS.iter().any(|t| lowered.contains(t));

    let keywords = VOCABULARY
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .filter(|kw| !(**kw == DOCUMENT_CLASS_TERM && mentions_card))
        .map(|kw| kw.to_string())
        .collect();

    DetectionResult { keywords }
}
