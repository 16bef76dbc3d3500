//! Fuzzy keyword matching over recognized text.
//!
//! Scores are a normalized edit-distance ratio scaled to 0–100. A candidate
//! scoring exactly at the threshold is accepted; ties go to the earliest
//! vocabulary entry. Empty text never matches and is never scored.

use tracing::debug;

/// Outcome of matching one run's transcriptions against the vocabulary.
///
/// At most one keyword is selected per run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub keyword: String,
    /// Similarity score, 0–100.
    pub score: u8,
    /// Variant label whose transcription produced the winning text.
    pub variant: String,
    /// Backend that produced the winning text.
    pub backend: String,
}

/// Matcher over a fixed keyword vocabulary.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    vocabulary: Vec<String>,
    threshold: u8,
}

impl KeywordMatcher {
    pub fn new(vocabulary: Vec<String>, threshold: u8) -> Self {
        Self {
            vocabulary,
            threshold,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn is_enabled(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Normalized edit-distance similarity between two strings, 0–100.
    pub fn score(a: &str, b: &str) -> u8 {
        let similarity = strsim::normalized_levenshtein(a.trim(), b.trim());
        (similarity * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Best vocabulary entry for `text`, or `None` when the maximum score is
    /// below the threshold. Empty text short-circuits without scoring.
    pub fn best_match(&self, text: &str) -> Option<(&str, u8)> {
        if text.trim().is_empty() {
            return None;
        }

        let mut best: Option<(&str, u8)> = None;
        for keyword in &self.vocabulary {
            let score = Self::score(text, keyword);
            // Strict comparison keeps the earliest entry on ties.
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((keyword.as_str(), score));
            }
        }

        match best {
            Some((keyword, score)) if score >= self.threshold => {
                debug!(keyword, score, "keyword matched");
                Some((keyword, score))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(threshold: u8) -> KeywordMatcher {
        KeywordMatcher::new(
            vec![
                "בני ברק".to_string(),
                "ירושלים".to_string(),
                "תל אביב".to_string(),
            ],
            threshold,
        )
    }

    #[test]
    fn exact_vocabulary_entry_scores_100() {
        let m = matcher(80);
        let (keyword, score) = m.best_match("ירושלים").unwrap();
        assert_eq!(keyword, "ירושלים");
        assert_eq!(score, 100);
    }

    #[test]
    fn empty_text_never_matches() {
        let m = matcher(0);
        assert!(m.best_match("").is_none());
        assert!(m.best_match("   ").is_none());
    }

    #[test]
    fn near_miss_above_threshold_matches() {
        let m = matcher(80);
        // One character off out of seven
        let (keyword, score) = m.best_match("ירושליח").unwrap();
        assert_eq!(keyword, "ירושלים");
        assert!(score >= 80, "score was {}", score);
    }

    #[test]
    fn low_similarity_yields_no_match() {
        let m = matcher(80);
        assert!(m.best_match("completely unrelated text").is_none());
    }

    #[test]
    fn score_at_exact_threshold_is_accepted() {
        // 100-char string with 20 substitutions: distance 20 → score 80
        let keyword: String = "a".repeat(100);
        let text = format!("{}{}", "a".repeat(80), "b".repeat(20));
        assert_eq!(KeywordMatcher::score(&text, &keyword), 80);

        let m = KeywordMatcher::new(vec![keyword], 80);
        let (_, score) = m.best_match(&text).unwrap();
        assert_eq!(score, 80);
    }

    #[test]
    fn score_one_point_below_threshold_is_rejected() {
        // 100-char string with 21 substitutions: distance 21 → score 79
        let keyword: String = "a".repeat(100);
        let text = format!("{}{}", "a".repeat(79), "b".repeat(21));
        assert_eq!(KeywordMatcher::score(&text, &keyword), 79);

        let m = KeywordMatcher::new(vec![keyword], 80);
        assert!(m.best_match(&text).is_none());
    }

    #[test]
    fn ties_resolve_to_earliest_vocabulary_entry() {
        let m = KeywordMatcher::new(vec!["abcd".to_string(), "abce".to_string()], 50);
        // Equidistant from both entries
        let (keyword, _) = m.best_match("abcf").unwrap();
        assert_eq!(keyword, "abcd");
    }

    #[test]
    fn scoring_trims_whitespace() {
        assert_eq!(KeywordMatcher::score("  tel aviv  ", "tel aviv"), 100);
    }

    #[test]
    fn empty_vocabulary_disables_matching() {
        let m = KeywordMatcher::new(Vec::new(), 80);
        assert!(!m.is_enabled());
        assert!(m.best_match("anything").is_none());
    }
}
