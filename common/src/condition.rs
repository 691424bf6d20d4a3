//! 状態（コンディション）判定
//!
//! 各ランクのキーワード出現1回ごとに +0.3、外部の画像解析ヒントが
//! ランクを指していれば そのランクに +0.5。最高点のランクを採用する。
//! 全ランク0点なら GOOD（古着で最も多い状態）。

use crate::types::{ConditionLevel, ConditionResult};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

pub const KEYWORD_INCREMENT: f64 = 0.3;
pub const VISUAL_HINT_INCREMENT: f64 = 0.5;
pub const DEFAULT_CONDITION: ConditionLevel = ConditionLevel::Good;

lazy_static::lazy_static! {
    static ref CONDITION_KEYWORDS: Vec<(ConditionLevel, Vec<Regex>)> = vec![
        (ConditionLevel::New, vec![
            "new with tags", "nwt", "bnwt", "brand new", "tags attached", "unworn", "never worn",
        ]),
        (ConditionLevel::Excellent, vec![
            "excellent", "mint condition", "like new", "barely worn", "worn once", "pristine", "immaculate",
        ]),
        (ConditionLevel::VeryGood, vec![
            "very good", "minimal wear", "lightly worn", "great condition", "hardly worn",
        ]),
        (ConditionLevel::Good, vec![
            "good condition", "good used", "gently used", "some wear", "signs of wear", "pre-owned", "pre-loved",
        ]),
        (ConditionLevel::Fair, vec![
            "fair condition", "well worn", "heavily worn", "fading", "faded", "stain", "stained", "hole", "bobbling", "pilling", "tear", "damaged",
        ]),
    ]
    .into_iter()
    .map(|(level, words)| {
        let patterns = words
            .into_iter()
            .map(|w| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w))).unwrap())
            .collect();
        (level, patterns)
    })
    .collect();

    static ref DAMAGE_NOTES: Vec<(Regex, &'static str)> = vec![
        (r"\bstain(?:s|ed)?\b", "Please note a small mark or stain, shown in the photos."),
        (r"\bholes?\b", "There is a small hole, shown in the photos."),
        (r"\btear(?:s)?\b|\bripped\b", "There is a small tear, shown in the photos."),
        (r"\bfad(?:ing|ed)\b", "Some fading consistent with age and wear."),
    ]
    .into_iter()
    .map(|(pattern, note)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), note))
    .collect();
}

fn level_template(level: ConditionLevel) -> &'static str {
    match level {
        ConditionLevel::New => "Brand new with original tags attached. Never worn.",
        ConditionLevel::Excellent => "Excellent pre-owned condition with no visible signs of wear.",
        ConditionLevel::VeryGood => "Very good pre-owned condition with only minimal signs of wear.",
        ConditionLevel::Good => "Good pre-owned condition with some signs of wear consistent with use.",
        ConditionLevel::Fair => "Fair condition with visible signs of wear. Please check the photos carefully.",
    }
}

/// 画像解析ヒントからランクを読む（例: "very good", "EXCELLENT", "like new"）
pub fn parse_visual_hint(hint: &str) -> Option<ConditionLevel> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    if let Ok(level) = hint.parse::<ConditionLevel>() {
        return Some(level);
    }
    CONDITION_KEYWORDS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(hint)))
        .map(|(level, _)| *level)
}

/// 状態説明文（テンプレート + 傷み注記）
pub fn describe_condition(level: ConditionLevel, text: &str) -> String {
    let mut description = level_template(level).to_string();
    for (re, note) in DAMAGE_NOTES.iter() {
        if re.is_match(text) {
            description.push(' ');
            description.push_str(note);
        }
    }
    description
}

/// 状態を判定する
///
/// # Arguments
/// * `text` - 説明・ユーザー入力テキスト
/// * `visual_hint` - 外部の画像解析が返した状態名（任意）
pub fn classify_condition(text: &str, visual_hint: Option<&str>) -> ConditionResult {
    let mut scores: BTreeMap<ConditionLevel, f64> =
        ConditionLevel::ALL.iter().map(|&l| (l, 0.0)).collect();

    for (level, patterns) in CONDITION_KEYWORDS.iter() {
        let occurrences: usize = patterns.iter().map(|re| re.find_iter(text).count()).sum();
        if let Some(score) = scores.get_mut(level) {
            *score += occurrences as f64 * KEYWORD_INCREMENT;
        }
    }

    if let Some(level) = visual_hint.and_then(parse_visual_hint) {
        if let Some(score) = scores.get_mut(&level) {
            *score += VISUAL_HINT_INCREMENT;
        }
    }

    // 同点は宣言順（良い方）が先勝ち、全て0点なら既定値
    let mut winner = DEFAULT_CONDITION;
    let mut best = 0.0;
    for level in ConditionLevel::ALL {
        let score = scores[&level];
        if score > best {
            best = score;
            winner = level;
        }
    }

    debug!(condition = %winner, score = best, "状態判定完了");

    ConditionResult {
        condition: winner,
        confidence: best.min(1.0),
        scores,
        description: describe_condition(winner, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_evidence_defaults_to_good() {
        let result = classify_condition("blue linen dress", None);
        assert_eq!(result.condition, ConditionLevel::Good);
        assert_eq!(result.confidence, 0.0);
        assert!(result.scores.values().all(|&s| s == 0.0));
    }

    #[test]
    fn test_good_with_fading_note() {
        let result = classify_condition("good used condition, some fading", None);
        assert_eq!(result.condition, ConditionLevel::Good);
        assert!(result.description.ends_with("Some fading consistent with age and wear."));
    }

    #[test]
    fn test_new_with_tags() {
        let result = classify_condition("BNWT, brand new with tags", None);
        assert_eq!(result.condition, ConditionLevel::New);
        assert!(result.confidence > 0.8);
    }

    #[test]
    fn test_tie_prefers_better_level() {
        let result = classify_condition("very good condition", None);
        assert_eq!(result.scores[&ConditionLevel::VeryGood], 0.3);
        assert_eq!(result.scores[&ConditionLevel::Good], 0.3);
        assert_eq!(result.condition, ConditionLevel::VeryGood);
    }

    #[test]
    fn test_visual_hint_adds_weight() {
        let result = classify_condition("good condition", Some("excellent"));
        assert_eq!(result.condition, ConditionLevel::Excellent);
        assert_eq!(result.scores[&ConditionLevel::Excellent], 0.5);
    }

    #[test]
    fn test_unknown_visual_hint_ignored() {
        let result = classify_condition("", Some("looks fine"));
        assert_eq!(result.condition, ConditionLevel::Good);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_confidence_capped() {
        let text = "excellent excellent excellent excellent pristine";
        let result = classify_condition(text, Some("EXCELLENT"));
        assert_eq!(result.condition, ConditionLevel::Excellent);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_damage_notes() {
        let description = describe_condition(ConditionLevel::Fair, "small stain and a hole");
        assert!(description.contains("stain"));
        assert!(description.contains("small hole"));
        assert!(!description.contains("fading"));
    }

    #[test]
    fn test_parse_visual_hint() {
        assert_eq!(parse_visual_hint("VERY_GOOD"), Some(ConditionLevel::VeryGood));
        assert_eq!(parse_visual_hint("like new"), Some(ConditionLevel::Excellent));
        assert_eq!(parse_visual_hint(""), None);
    }
}
