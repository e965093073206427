//! Marker-phrase classifier for fact-check headlines.
//!
//! Labels are derived from a fixed, ordered rule table ([`MARKER_RULES`]).
//! The first rule with a matching marker wins. Phrase rules come first, false
//! before true: debunking language such as "não é fato" contains a
//! true-marker substring, so false phrases take precedence when both appear.
//! The bare words `fake` and `fato` are fallbacks, checked only when no
//! phrase matched, because the section name "Fato ou Fake" carries both.
//!
//! This is a best-effort labeler. It guarantees a reproducible label for a
//! given text, not a correct verdict on the story.

use crate::models::Classification;
use once_cell::sync::Lazy;
use regex::Regex;

/// How a rule's markers are compared against the lowercased text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Marker appears anywhere in the text.
    Substring,
    /// Marker appears as a whole word (`#FAKE` and `fake.` both count).
    Word,
}

/// One row of the rule table.
#[derive(Debug)]
pub struct MarkerRule {
    pub label: Classification,
    pub kind: MatchKind,
    pub markers: &'static [&'static str],
}

/// Ordered rule table; position is precedence.
pub static MARKER_RULES: &[MarkerRule] = &[
    MarkerRule {
        label: Classification::Fake,
        kind: MatchKind::Substring,
        markers: &[
            "é fake",
            "é falso",
            "não é verdade",
            "não é verdadeiro",
            "falso que",
            "fake news",
            "boato",
            "mentira",
            "enganoso",
            "montagem",
            "não é real",
            "não aconteceu",
            "não procede",
            "não existe",
            "não é fato",
        ],
    },
    MarkerRule {
        label: Classification::Fato,
        kind: MatchKind::Substring,
        markers: &[
            "é fato",
            "é verdade",
            "verdadeiro",
            "aconteceu",
            "é real",
            "confirmado",
            "verificado",
            "comprovado",
            "procede",
        ],
    },
    MarkerRule {
        label: Classification::Fake,
        kind: MatchKind::Word,
        markers: &["fake"],
    },
    MarkerRule {
        label: Classification::Fato,
        kind: MatchKind::Word,
        markers: &["fato"],
    },
];

/// Title keywords that mark a story as a fact-check at all.
const FACT_CHECK_KEYWORDS: &[&str] = &["fato", "fake", "falso", "verdade", "checamos"];

enum Matcher {
    Substring(&'static str),
    Word(&'static str, Regex),
}

impl Matcher {
    fn marker(&self) -> &'static str {
        match self {
            Matcher::Substring(m) | Matcher::Word(m, _) => m,
        }
    }

    fn is_match(&self, lowered: &str) -> bool {
        match self {
            Matcher::Substring(m) => lowered.contains(m),
            Matcher::Word(_, re) => re.is_match(lowered),
        }
    }
}

static COMPILED_RULES: Lazy<Vec<(Classification, Vec<Matcher>)>> = Lazy::new(|| {
    MARKER_RULES
        .iter()
        .map(|rule| {
            let matchers = rule
                .markers
                .iter()
                .map(|m| match rule.kind {
                    MatchKind::Substring => Matcher::Substring(m),
                    MatchKind::Word => {
                        let pattern = format!(r"\b{}\b", regex::escape(m));
                        // Escaped literal between word boundaries always compiles.
                        let re = Regex::new(&pattern).expect("word marker pattern");
                        Matcher::Word(m, re)
                    }
                })
                .collect();
            (rule.label, matchers)
        })
        .collect()
});

/// Build the text the classifier scans: title and summary, space-joined.
///
/// Article content is deliberately not included so classification stays
/// cheap and bounded by headline-sized input.
pub fn classification_text(title: &str, summary: Option<&str>) -> String {
    match summary {
        Some(s) if !s.is_empty() => format!("{title} {s}"),
        _ => title.to_string(),
    }
}

/// Label `text` using the rule table.
pub fn classify(text: &str) -> Classification {
    explain(text)
        .map(|(label, _)| label)
        .unwrap_or(Classification::Indeterminado)
}

/// Label `text` and report the marker that decided it.
///
/// Returns `None` when no marker matches.
pub fn explain(text: &str) -> Option<(Classification, &'static str)> {
    let lowered = text.to_lowercase();
    COMPILED_RULES.iter().find_map(|(label, matchers)| {
        matchers
            .iter()
            .find(|m| m.is_match(&lowered))
            .map(|m| (*label, m.marker()))
    })
}

/// Whether a listing or feed entry is a fact-check worth keeping.
pub fn is_fact_check(title: &str, link: &str) -> bool {
    if link.to_lowercase().contains("fato-ou-fake") {
        return true;
    }
    let lowered = title.to_lowercase();
    FACT_CHECK_KEYWORDS.iter().any(|k| lowered.contains(k))
}
