//! Textual run report.
//!
//! One line per (variant, backend) tuple in canonical order — variant order
//! from the plan, backend order from configuration — independent of the
//! order transcriptions actually completed in. The rendered bytes are
//! deterministic for a given result set so archived reports compare equal.

use crate::matcher::MatchResult;

/// One backend's answer for one variant, as reported.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRecord {
    pub variant: String,
    pub backend: String,
    pub text: String,
    pub confidence: Option<f32>,
}

impl TranscriptionRecord {
    pub fn new(variant: impl Into<String>, backend: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            backend: backend.into(),
            text: text.into(),
            confidence: None,
        }
    }
}

/// Render the full run report.
///
/// `match_line` is included only when matching was enabled for the run; a
/// run with an empty vocabulary reports transcriptions alone.
pub fn render_report(
    source: &str,
    records: &[TranscriptionRecord],
    match_result: Option<&MatchResult>,
    matching_enabled: bool,
) -> String {
    let mut out = String::new();
    out.push_str("catchword run report\n");
    out.push_str(&format!("source: {}\n", source));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{} | {} | {}\n",
            record.variant, record.backend, record.text
        ));
    }

    if matching_enabled {
        out.push('\n');
        match match_result {
            Some(m) => out.push_str(&format!(
                "match: {} (score {}, variant {}, backend {})\n",
                m.keyword, m.score, m.variant, m.backend
            )),
            None => out.push_str("match: none\n"),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<TranscriptionRecord> {
        vec![
            TranscriptionRecord::new("original", "google-speech", "ירושלים"),
            TranscriptionRecord::new("original", "whisper", ""),
            TranscriptionRecord::new("padded", "google-speech", "ירושליח"),
        ]
    }

    #[test]
    fn report_lists_every_tuple_in_order() {
        let report = render_report("clip.wav", &records(), None, false);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "catchword run report");
        assert_eq!(lines[1], "source: clip.wav");
        assert_eq!(lines[3], "original | google-speech | ירושלים");
        assert_eq!(lines[4], "original | whisper | ");
        assert_eq!(lines[5], "padded | google-speech | ירושליח");
    }

    #[test]
    fn match_line_present_when_enabled() {
        let m = MatchResult {
            keyword: "ירושלים".to_string(),
            score: 100,
            variant: "original".to_string(),
            backend: "google-speech".to_string(),
        };
        let report = render_report("clip.wav", &records(), Some(&m), true);
        assert!(
            report
                .contains("match: ירושלים (score 100, variant original, backend google-speech)")
        );
    }

    #[test]
    fn no_match_is_reported_explicitly() {
        let report = render_report("clip.wav", &records(), None, true);
        assert!(report.ends_with("match: none\n"));
    }

    #[test]
    fn match_line_absent_when_matching_disabled() {
        let report = render_report("clip.wav", &records(), None, false);
        assert!(!report.contains("match:"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_report("clip.wav", &records(), None, true);
        let b = render_report("clip.wav", &records(), None, true);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
