//! Keyword-contextual analysis of extracted article text.
//!
//! [`Analyzer::analyze`] scans a body text for case-insensitive occurrences
//! of the keyword. Each occurrence yields one [`KeywordMatch`] carrying a
//! fixed-radius character window and the enclosing sentence; the set of all
//! occurrences yields [`ContextualSignals`]: numeric tokens and date-like
//! substrings found within a bounded character distance of any occurrence.
//!
//! A text without any occurrence is the normal "not relevant" outcome and is
//! signalled with `None`, not an error.
//!
//! All offsets exposed in the data model are character offsets; the body
//! text is Dutch and regularly contains non-ASCII, so byte offsets from the
//! regex engine are translated at the boundaries.

use crate::models::{ContextualSignals, KeywordMatch};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Character radius of the context window on each side of an occurrence.
pub const CONTEXT_RADIUS: usize = 100;

/// Character radius within which numbers and dates count as "nearby".
pub const SIGNAL_RADIUS: usize = 150;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap());
static DATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b\d{1,2}-\d{1,2}-\d{4}\b").unwrap(),
        RegexBuilder::new(
            r"\b\d{1,2} (?:januari|februari|maart|april|mei|juni|juli|augustus|september|oktober|november|december) \d{4}\b",
        )
        .case_insensitive(true)
        .build()
        .unwrap(),
    ]
});

/// Everything the analyzer derives from one body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// One entry per keyword occurrence, left-to-right.
    pub matches: Vec<KeywordMatch>,
    /// Numbers and dates near the occurrences.
    pub signals: ContextualSignals,
}

/// Case-insensitive keyword scanner, built once per run.
#[derive(Debug)]
pub struct Analyzer {
    pattern: Regex,
}

impl Analyzer {
    /// Build an analyzer for one keyword.
    pub fn new(keyword: &str) -> Self {
        let pattern = RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
            .expect("escaped keyword is a valid pattern");
        Self { pattern }
    }

    /// Scan `text` for keyword occurrences.
    ///
    /// # Returns
    ///
    /// `None` when the keyword does not occur; the caller must then discard
    /// the record before it reaches enrichment or persistence.
    pub fn analyze(&self, text: &str) -> Option<Analysis> {
        let spans: Vec<(usize, usize)> = self
            .pattern
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();
        if spans.is_empty() {
            return None;
        }

        let matches = spans
            .iter()
            .enumerate()
            .map(|(occurrence_index, &(start, end))| KeywordMatch {
                occurrence_index,
                char_offset: text[..start].chars().count(),
                context_window: window(text, start, end, CONTEXT_RADIUS),
                containing_sentence: sentence_around(text, start, end),
            })
            .collect::<Vec<_>>();

        let signals = contextual_signals(text, &spans);
        debug!(
            occurrences = matches.len(),
            numbers = signals.nearby_numbers.len(),
            dates = signals.nearby_dates.len(),
            "Analyzed text"
        );
        Some(Analysis { matches, signals })
    }
}

/// The character window around a byte span, truncated at text boundaries.
fn window(text: &str, start: usize, end: usize, radius: usize) -> String {
    text[back_by_chars(text, start, radius)..forward_by_chars(text, end, radius)].to_string()
}

/// The sentence enclosing a byte span: from just past the previous
/// sentence terminator to just past the next one, or to a text boundary.
fn sentence_around(text: &str, start: usize, end: usize) -> String {
    let begin = text[..start]
        .rfind(['.', '!', '?'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let stop = text[end..]
        .find(['.', '!', '?'])
        .map(|i| end + i + 1)
        .unwrap_or(text.len());
    text[begin..stop].trim().to_string()
}

fn contextual_signals(text: &str, spans: &[(usize, usize)]) -> ContextualSignals {
    let windows: Vec<(usize, usize)> = spans
        .iter()
        .map(|&(start, end)| {
            (
                back_by_chars(text, start, SIGNAL_RADIUS),
                forward_by_chars(text, end, SIGNAL_RADIUS),
            )
        })
        .collect();
    let near = |start: usize, end: usize| windows.iter().any(|&(lo, hi)| start < hi && end > lo);

    let mut dates = Vec::new();
    let mut date_spans = Vec::new();
    for re in DATE_RES.iter() {
        for m in re.find_iter(text) {
            if near(m.start(), m.end()) {
                push_unique(&mut dates, m.as_str().to_string());
                date_spans.push((m.start(), m.end()));
            }
        }
    }

    // Digits already claimed by a matched date stay out of the number list.
    let mut numbers = Vec::new();
    for m in NUMBER_RE.find_iter(text) {
        let inside_date = date_spans
            .iter()
            .any(|&(lo, hi)| m.start() >= lo && m.end() <= hi);
        if !inside_date && near(m.start(), m.end()) {
            push_unique(&mut numbers, m.as_str().to_string());
        }
    }

    ContextualSignals {
        nearby_numbers: numbers,
        nearby_dates: dates,
    }
}

/// Step back at most `n` characters from a byte index, staying on char
/// boundaries.
fn back_by_chars(text: &str, byte_idx: usize, n: usize) -> usize {
    let mut idx = byte_idx;
    for _ in 0..n {
        match text[..idx].chars().next_back() {
            Some(c) => idx -= c.len_utf8(),
            None => break,
        }
    }
    idx
}

/// Step forward at most `n` characters from a byte index, staying on char
/// boundaries.
fn forward_by_chars(text: &str, byte_idx: usize, n: usize) -> usize {
    let mut idx = byte_idx;
    for c in text[byte_idx..].chars().take(n) {
        idx += c.len_utf8();
    }
    idx
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> Analyzer {
        Analyzer::new("vuurwerk")
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(analyzer().analyze("Niets aan de hand vandaag.").is_none());
        assert!(analyzer().analyze("").is_none());
    }

    #[test]
    fn test_occurrence_indices_increase_and_count_matches() {
        let text = "Vuurwerk hier, VUURWERK daar, en nog eens vuurwerk.";
        let analysis = analyzer().analyze(text).unwrap();
        assert_eq!(analysis.matches.len(), 3);
        for (i, m) in analysis.matches.iter().enumerate() {
            assert_eq!(m.occurrence_index, i);
        }
        let offsets: Vec<usize> = analysis.matches.iter().map(|m| m.char_offset).collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let analysis = analyzer().analyze("VuurWerk!").unwrap();
        assert_eq!(analysis.matches.len(), 1);
        assert_eq!(analysis.matches[0].char_offset, 0);
    }

    #[test]
    fn test_context_window_bounds_and_verbatim() {
        let text = format!("{} vuurwerk {}", "a".repeat(300), "b".repeat(300));
        let analysis = analyzer().analyze(&text).unwrap();
        let window = &analysis.matches[0].context_window;
        assert!(window.chars().count() <= 2 * CONTEXT_RADIUS + "vuurwerk".chars().count());
        assert!(text.contains(window.as_str()));
    }

    #[test]
    fn test_context_window_truncated_at_text_start() {
        let analysis = analyzer().analyze("vuurwerk in de nacht").unwrap();
        assert!(analysis.matches[0].context_window.starts_with("vuurwerk"));
    }

    #[test]
    fn test_window_respects_utf8_boundaries() {
        let text = format!("{}vuurwerk{}", "é".repeat(150), "ü".repeat(150));
        let analysis = analyzer().analyze(&text).unwrap();
        let window = &analysis.matches[0].context_window;
        assert_eq!(window.chars().count(), 2 * CONTEXT_RADIUS + "vuurwerk".len());
        assert!(text.contains(window.as_str()));
    }

    #[test]
    fn test_containing_sentence() {
        let text = "Het was stil. Toen knalde het vuurwerk enorm! Daarna niets meer.";
        let analysis = analyzer().analyze(text).unwrap();
        assert_eq!(
            analysis.matches[0].containing_sentence,
            "Toen knalde het vuurwerk enorm!"
        );
    }

    #[test]
    fn test_sentence_at_text_boundaries() {
        let analysis = analyzer().analyze("vuurwerk zonder leestekens").unwrap();
        assert_eq!(
            analysis.matches[0].containing_sentence,
            "vuurwerk zonder leestekens"
        );
    }

    #[test]
    fn test_nearby_numbers_and_dates_scenario() {
        let text = "Volgens de politie explodeerden 12 vuurwerkbommen op 31 december 2024 in het centrum.";
        let analysis = analyzer().analyze(text).unwrap();
        assert!(analysis.signals.nearby_numbers.contains(&"12".to_string()));
        assert!(analysis
            .signals
            .nearby_dates
            .contains(&"31 december 2024".to_string()));
    }

    #[test]
    fn test_numeric_date_format() {
        let text = "Op 31-12-2024 werd vuurwerk in beslag genomen.";
        let analysis = analyzer().analyze(text).unwrap();
        assert_eq!(analysis.signals.nearby_dates, vec!["31-12-2024".to_string()]);
    }

    #[test]
    fn test_far_away_numbers_are_ignored() {
        let text = format!("Er lagen 999 dozen. {} Het vuurwerk knalde.", "x".repeat(400));
        let analysis = analyzer().analyze(&text).unwrap();
        assert!(!analysis.signals.nearby_numbers.contains(&"999".to_string()));
    }

    #[test]
    fn test_signals_deduplicated_in_first_seen_order() {
        let text = "12 kg vuurwerk en nog eens 12 kg vuurwerk, plus 5 dozen.";
        let analysis = analyzer().analyze(text).unwrap();
        assert_eq!(
            analysis.signals.nearby_numbers,
            vec!["12".to_string(), "5".to_string()]
        );
    }

    #[test]
    fn test_keyword_with_regex_metacharacters_is_escaped() {
        let analyzer = Analyzer::new("c++ vuurwerk");
        assert!(analyzer.analyze("over c++ vuurwerk gesproken").is_some());
        assert!(analyzer.analyze("over cab vuurwerk gesproken").is_none());
    }
}
