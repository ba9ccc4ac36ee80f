// Spam scoring - pure text analysis.
//
// Three independent sub-scores (keyword, pattern, heuristic), each clamped to
// 0..=100, are blended with fixed weights into one spam score. Confidence is
// derived from how many sub-scores agree, not from the blended score.

use super::moderation_models::{SpamAnalysisResult, SpamKeyword};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

const MAX_SCORE: u32 = 100;

/// Sub-scores above this count as an agreeing signal.
const SIGNAL_THRESHOLD: u32 = 50;
/// A lone signal above this is treated as a strong one.
const STRONG_SIGNAL_THRESHOLD: u32 = 75;
/// Points per keyword match and severity unit.
const KEYWORD_POINTS: u32 = 10;
/// How many flagged keywords are named in the reason.
const REASON_KEYWORDS: usize = 3;

static LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("Invalid link regex"));

static CRYPTO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:bitcoin|crypto\w*|invest\w*|profits?|roi|guaranteed returns?)\b")
        .expect("Invalid crypto regex")
});

static LONG_DIGIT_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{8,}").expect("Invalid digit run regex"));

static PARAGRAPH_BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").expect("Invalid paragraph regex"));

/// Phrases worth 10 points each.
const SUSPICIOUS_PHRASES: &[&str] = &[
    "click here",
    "buy now",
    "free money",
    "limited time",
    "act now",
    "order now",
    "work from home",
    "make money fast",
    "earn extra cash",
    "double your income",
    "100% free",
    "risk free",
    "no credit check",
    "special promotion",
    "congratulations you won",
    "claim your prize",
];

// ============================================================================
// CONFIG
// ============================================================================

/// Weights and threshold of the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamScoringConfig {
    pub keyword_weight: f64,
    pub pattern_weight: f64,
    pub heuristic_weight: f64,
    /// Combined scores at or above this are spam.
    pub spam_threshold: u8,
}

impl Default for SpamScoringConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 0.5,
            pattern_weight: 0.3,
            heuristic_weight: 0.2,
            spam_threshold: 75,
        }
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Raw sub-scores for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamSignals {
    pub keyword: u32,
    pub pattern: u32,
    pub heuristic: u32,
    pub flagged_keywords: Vec<String>,
}

/// Score a piece of text against the given keyword table.
///
/// Errors only if a keyword cannot be turned into a matcher.
pub fn score_text(
    content: &str,
    title: Option<&str>,
    keywords: &[SpamKeyword],
    config: &SpamScoringConfig,
) -> Result<SpamAnalysisResult, regex::Error> {
    let signals = collect_signals(content, title, keywords)?;
    let spam_score = combine(signals.keyword, signals.pattern, signals.heuristic, config);
    let reason = build_reason(&signals);

    Ok(SpamAnalysisResult {
        spam_score,
        is_spam: spam_score >= config.spam_threshold,
        confidence: confidence(signals.keyword, signals.pattern, signals.heuristic),
        reason,
        flagged_keywords: signals.flagged_keywords,
    })
}

pub fn collect_signals(
    content: &str,
    title: Option<&str>,
    keywords: &[SpamKeyword],
) -> Result<SpamSignals, regex::Error> {
    let raw = format!("{} {}", title.unwrap_or_default(), content);
    let normalized = raw.to_lowercase();

    let (keyword, flagged_keywords) = keyword_score(&normalized, keywords)?;

    Ok(SpamSignals {
        keyword,
        pattern: pattern_score(&normalized, &raw),
        heuristic: heuristic_score(&normalized, content),
        flagged_keywords,
    })
}

/// Word-boundary keyword matching; every match is worth `severity * 10`.
pub fn keyword_score(
    text: &str,
    keywords: &[SpamKeyword],
) -> Result<(u32, Vec<String>), regex::Error> {
    let mut score: u32 = 0;
    let mut flagged = Vec::new();

    for keyword in keywords.iter().filter(|k| k.is_active) {
        let matcher = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&keyword.keyword)))
            .case_insensitive(true)
            .build()?;
        let matches = matcher.find_iter(text).count() as u32;
        if matches > 0 {
            score = score.saturating_add(
                matches
                    .saturating_mul(keyword.severity as u32)
                    .saturating_mul(KEYWORD_POINTS),
            );
            flagged.push(keyword.keyword.clone());
        }
    }

    Ok((score.min(MAX_SCORE), flagged))
}

/// Link, repetition, shouting and phrase heuristics.
///
/// `text` is the lowercased input; `raw` keeps the original casing.
pub fn pattern_score(text: &str, raw: &str) -> u32 {
    let mut score = 0;

    let links = LINK_REGEX.find_iter(text).count();
    if links > 5 {
        score += 30;
    } else if links > 3 {
        score += 15;
    }

    if has_repeated_run(text, 5) {
        score += 15;
    }

    let length = raw.chars().count();
    if length > 20 {
        let upper = raw.chars().filter(|c| c.is_uppercase()).count();
        if upper as f64 / length as f64 > 0.5 {
            score += 20;
        }
    }

    if text.matches('!').count() > 5 {
        score += 15;
    }

    score += SUSPICIOUS_PHRASES
        .iter()
        .filter(|phrase| text.contains(*phrase))
        .count() as u32
        * 10;

    if CRYPTO_REGEX.is_match(text) {
        score += 10;
    }

    score.min(MAX_SCORE)
}

/// Structural heuristics over the whole text.
pub fn heuristic_score(text: &str, content: &str) -> u32 {
    let mut score = 0;
    let length = text.chars().count();

    if length < 20 {
        score += 20;
    }

    if content.chars().count() > 2000 && !PARAGRAPH_BREAK_REGEX.is_match(content) {
        score += 15;
    }

    if text.chars().filter(|c| is_emoji(*c)).count() > 10 {
        score += 20;
    }

    if LONG_DIGIT_RUN_REGEX.find_iter(text).count() > 2 {
        score += 15;
    }

    if length > 0 {
        let special = text
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        if special as f64 / length as f64 > 0.3 {
            score += 20;
        }
    }

    score.min(MAX_SCORE)
}

/// Weighted blend of the three sub-scores, clamped to 0..=100.
pub fn combine(keyword: u32, pattern: u32, heuristic: u32, config: &SpamScoringConfig) -> u8 {
    let blended = keyword as f64 * config.keyword_weight
        + pattern as f64 * config.pattern_weight
        + heuristic as f64 * config.heuristic_weight;
    blended.round().clamp(0.0, MAX_SCORE as f64) as u8
}

/// Agreement between the sub-scores.
pub fn confidence(keyword: u32, pattern: u32, heuristic: u32) -> f64 {
    let scores = [keyword, pattern, heuristic];
    let agreeing = scores.iter().filter(|s| **s > SIGNAL_THRESHOLD).count();
    let strongest = scores.iter().copied().max().unwrap_or(0);

    if agreeing >= 2 {
        0.9
    } else if agreeing == 1 && strongest > STRONG_SIGNAL_THRESHOLD {
        0.7
    } else if agreeing == 1 {
        0.5
    } else {
        0.3
    }
}

pub fn build_reason(signals: &SpamSignals) -> String {
    let mut parts = Vec::new();

    if !signals.flagged_keywords.is_empty() {
        let named: Vec<&str> = signals
            .flagged_keywords
            .iter()
            .take(REASON_KEYWORDS)
            .map(String::as_str)
            .collect();
        parts.push(format!("Flagged keywords: {}", named.join(", ")));
    }
    if signals.pattern > SIGNAL_THRESHOLD {
        parts.push("Suspicious patterns detected".to_string());
    }
    if signals.heuristic > SIGNAL_THRESHOLD {
        parts.push("Content structure indicates spam".to_string());
    }

    if parts.is_empty() {
        "Low spam probability".to_string()
    } else {
        parts.join("; ")
    }
}

/// True if the text contains a run of `min_run` identical characters.
fn has_repeated_run(text: &str, min_run: usize) -> bool {
    let mut previous = None;
    let mut run = 0;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
        } else {
            previous = Some(c);
            run = 1;
        }
        if run >= min_run {
            return true;
        }
    }
    false
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1F5FF
            | 0x1F600..=0x1F64F
            | 0x1F680..=0x1F6FF
            | 0x1F900..=0x1F9FF
            | 0x1FA70..=0x1FAFF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(id: i64, word: &str, severity: u8) -> SpamKeyword {
        SpamKeyword {
            id,
            keyword: word.to_string(),
            severity,
            is_active: true,
        }
    }

    #[test]
    fn test_combine_matches_weighted_formula() {
        let config = SpamScoringConfig::default();
        for k in 0..=100 {
            for p in 0..=100 {
                for h in 0..=100 {
                    let expected = (0.5 * k as f64 + 0.3 * p as f64 + 0.2 * h as f64)
                        .round()
                        .clamp(0.0, 100.0) as u8;
                    assert_eq!(combine(k, p, h, &config), expected, "k={k} p={p} h={h}");
                }
            }
        }
        assert_eq!(combine(100, 100, 100, &config), 100);
        assert_eq!(combine(0, 0, 0, &config), 0);
    }

    #[test]
    fn test_confidence_tracks_agreement() {
        assert_eq!(confidence(60, 60, 0), 0.9);
        assert_eq!(confidence(90, 90, 90), 0.9);
        assert_eq!(confidence(80, 10, 10), 0.7);
        assert_eq!(confidence(60, 10, 10), 0.5);
        assert_eq!(confidence(50, 50, 50), 0.3);
    }

    #[test]
    fn test_keyword_matches_on_word_boundaries() {
        let keywords = vec![keyword(1, "cash", 2), keyword(2, "pills", 1)];
        let (score, flagged) = keyword_score("cash cash cashew", &keywords).unwrap();

        assert_eq!(score, 40);
        assert_eq!(flagged, vec!["cash".to_string()]);
    }

    #[test]
    fn test_keyword_score_saturates_and_keeps_table_order() {
        let keywords = vec![keyword(1, "viagra", 5), keyword(2, "casino", 5)];
        let (score, flagged) = keyword_score("casino viagra casino viagra", &keywords).unwrap();

        assert_eq!(score, 100);
        assert_eq!(flagged, vec!["viagra".to_string(), "casino".to_string()]);
    }

    #[test]
    fn test_inactive_keywords_are_ignored() {
        let mut inactive = keyword(1, "casino", 5);
        inactive.is_active = false;
        let (score, flagged) = keyword_score("casino", &[inactive]).unwrap();

        assert_eq!(score, 0);
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_pattern_score_links_and_phrases() {
        let four_links = "see http://a.io http://b.io http://c.io http://d.io";
        assert_eq!(pattern_score(four_links, four_links), 15);

        let six_links = format!("{} http://e.io http://f.io", four_links);
        assert_eq!(pattern_score(&six_links, &six_links), 30);

        let phrases = "click here and buy now";
        assert_eq!(pattern_score(phrases, phrases), 20);
    }

    #[test]
    fn test_pattern_score_shouting_and_repetition() {
        let raw = "THIS IS AMAZING, READ IT NOW";
        assert_eq!(pattern_score(&raw.to_lowercase(), raw), 20);

        let excited = "wow!!!!!! so good";
        // six exclamation marks form a run of five and exceed the limit
        assert_eq!(pattern_score(excited, excited), 30);

        let crypto = "double your bitcoin today";
        assert_eq!(pattern_score(crypto, crypto), 10);
    }

    #[test]
    fn test_heuristic_score_structure() {
        assert_eq!(heuristic_score("hi", "hi"), 20);

        let wall = "word ".repeat(500);
        assert_eq!(heuristic_score(&wall, &wall), 15);

        let mut paragraphs = "word ".repeat(250);
        paragraphs.push_str("\n\n");
        paragraphs.push_str(&"word ".repeat(250));
        assert_eq!(heuristic_score(&paragraphs, &paragraphs), 0);

        let digits = "call 12345678 or 23456789 or 34567890 today please";
        assert_eq!(heuristic_score(digits, digits), 15);

        let symbols = "$$$ ### @@@ %%% !!! &&& ***";
        assert!(heuristic_score(symbols, symbols) >= 20);

        let emoji = "🎉".repeat(11);
        let text = format!(
            "party time for everyone we are celebrating the launch tonight {}",
            emoji
        );
        assert_eq!(heuristic_score(&text, &text), 20);
    }

    #[test]
    fn test_reason_assembly() {
        let quiet = SpamSignals {
            keyword: 0,
            pattern: 0,
            heuristic: 0,
            flagged_keywords: vec![],
        };
        assert_eq!(build_reason(&quiet), "Low spam probability");

        let loud = SpamSignals {
            keyword: 100,
            pattern: 60,
            heuristic: 60,
            flagged_keywords: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };
        assert_eq!(
            build_reason(&loud),
            "Flagged keywords: a, b, c; Suspicious patterns detected; Content structure indicates spam"
        );
    }

    #[test]
    fn test_empty_input_is_not_spam() {
        let result = score_text("", None, &[], &SpamScoringConfig::default()).unwrap();

        assert!(!result.is_spam);
        assert!(result.spam_score <= 100);
        assert!(!result.reason.is_empty());
        assert!(result.flagged_keywords.is_empty());
    }

    #[test]
    fn test_keyword_and_phrase_signals_for_promotional_text() {
        let keywords = vec![keyword(1, "buy now", 3)];
        let signals = collect_signals("BUY NOW! Click here to get FREE MONEY!!!", None, &keywords)
            .unwrap();

        assert_eq!(signals.keyword, 30);
        assert_eq!(signals.flagged_keywords, vec!["buy now".to_string()]);
        // "click here", "buy now" and "free money"
        assert_eq!(signals.pattern, 30);
    }

    #[test]
    fn test_saturated_spam_is_flagged() {
        let keywords = vec![keyword(1, "buy now", 3)];
        let content = "BUY NOW buy now buy now buy now!!!!!! Click here \
            http://a.io http://b.io http://c.io http://d.io http://e.io http://f.io \
            FREE MONEY on bitcoin 12345678 87654321 11223344";

        let result = score_text(content, None, &keywords, &SpamScoringConfig::default()).unwrap();

        assert!(result.is_spam);
        assert!(result.spam_score >= 83, "score was {}", result.spam_score);
        assert_eq!(result.flagged_keywords, vec!["buy now".to_string()]);
        assert_eq!(result.confidence, 0.9);
        assert!(result.reason.starts_with("Flagged keywords: buy now"));
    }

    #[test]
    fn test_title_is_scored_with_content() {
        let keywords = vec![keyword(1, "casino", 1)];
        let result = score_text(
            "a perfectly normal body text",
            Some("Casino night"),
            &keywords,
            &SpamScoringConfig::default(),
        )
        .unwrap();

        assert_eq!(result.flagged_keywords, vec!["casino".to_string()]);
    }

    #[test]
    fn test_missing_title_still_joins_with_a_space() {
        // 19 characters of body become 20 once the empty title is joined
        let body = "abcdefghij klmnopqr";
        assert_eq!(body.chars().count(), 19);

        let signals = collect_signals(body, None, &[]).unwrap();
        assert_eq!(signals.heuristic, 0);
        assert_eq!(collect_signals(body, Some(""), &[]).unwrap(), signals);

        let shorter = collect_signals("abcdefghij klmnopq", None, &[]).unwrap();
        assert_eq!(shorter.heuristic, 20);
    }

    #[test]
    fn test_threshold_comes_from_config() {
        let strict = SpamScoringConfig {
            spam_threshold: 5,
            ..Default::default()
        };
        let result = score_text("hi", None, &[], &strict).unwrap();
        // heuristic 20 (short text) * 0.2 = 4
        assert_eq!(result.spam_score, 4);
        assert!(!result.is_spam);

        let stricter = SpamScoringConfig {
            spam_threshold: 4,
            ..Default::default()
        };
        assert!(score_text("hi", None, &[], &stricter).unwrap().is_spam);
    }
}
