//! Keyword matching over operator notes.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fixed vocabularies for the category keyword filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCategory {
    Urgency,
    Obstruction,
    Structural,
    Buildup,
    Flow,
    Biological,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 6] = [
        KeywordCategory::Urgency,
        KeywordCategory::Obstruction,
        KeywordCategory::Structural,
        KeywordCategory::Buildup,
        KeywordCategory::Flow,
        KeywordCategory::Biological,
    ];

    pub fn words(self) -> &'static [&'static str] {
        match self {
            KeywordCategory::Urgency => {
                &["urgent", "emergency", "immediate", "critical", "severe", "danger"]
            }
            KeywordCategory::Obstruction => {
                &["blockage", "blocked", "clog", "debris", "obstruction", "obstructed"]
            }
            KeywordCategory::Structural => {
                &["crack", "collapse", "fracture", "root intrusion", "broken", "deformed"]
            }
            KeywordCategory::Buildup => {
                &["grease", "sediment", "scale", "buildup", "deposit", "encrustation"]
            }
            KeywordCategory::Flow => {
                &["slow drain", "standing water", "stagnant", "backup", "overflow", "pooling"]
            }
            KeywordCategory::Biological => &["odor", "smell", "biofilm", "slime", "mold", "algae"],
        }
    }

    fn matcher(self) -> &'static KeywordMatcher {
        static MATCHERS: OnceLock<Vec<KeywordMatcher>> = OnceLock::new();
        let matchers = MATCHERS.get_or_init(|| {
            KeywordCategory::ALL
                .iter()
                .map(|c| KeywordMatcher::new(c.words()))
                .collect()
        });
        &matchers[self as usize]
    }

    /// Case-insensitive substring match against this category's words.
    pub fn matches(self, text: &str) -> bool {
        self.matcher().matches(text)
    }
}

/// Matches any of a set of words as a case-insensitive substring.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    lowered: Vec<String>,
    regex: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        let lowered: Vec<String> = words
            .iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let regex = if lowered.is_empty() {
            None
        } else {
            let pattern = lowered
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
        };

        Self { lowered, regex }
    }

    pub fn is_empty(&self) -> bool {
        self.lowered.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(text),
            None => {
                let text = text.to_lowercase();
                self.lowered.iter().any(|w| text.contains(w.as_str()))
            }
        }
    }
}
