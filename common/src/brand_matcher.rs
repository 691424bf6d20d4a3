//! ブランドパターン照合
//!
//! 信頼度 = 基礎信頼度 × (一致パターン数 / 全パターン数)。
//! 汎用的な短いパターン（"lv" など）1つだけの一致では低く出るため、
//! 部分文字列による誤検出が抑えられる。

use crate::registry::BrandRegistry;
use crate::types::{BrandCandidate, EvidenceSource};
use tracing::debug;

/// 全ブランドを照合し、一致したものをレジストリ宣言順で返す
pub fn match_brands(text: &str, registry: &BrandRegistry) -> Vec<BrandCandidate> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let candidates: Vec<BrandCandidate> = registry
        .entries()
        .iter()
        .filter_map(|entry| {
            let matched = entry.count_matches(text);
            if matched == 0 {
                return None;
            }

            let total = entry.total_patterns();
            let definition = &entry.definition;
            let confidence =
                (definition.base_confidence * (matched as f64 / total as f64)).clamp(0.0, 1.0);

            Some(BrandCandidate {
                brand: definition.id.clone(),
                confidence,
                matched_patterns: matched,
                total_patterns: total,
                indicators: definition.indicators.clone(),
                tier: definition.tier,
                raw_score: confidence,
                source: EvidenceSource::Pattern,
            })
        })
        .collect();

    debug!(candidate_count = candidates.len(), "ブランドパターン照合完了");
    candidates
}

/// 最も信頼度の高い候補（同点はレジストリ宣言順で先勝ち）
pub fn best_brand(text: &str, registry: &BrandRegistry) -> Option<BrandCandidate> {
    match_brands(text, registry)
        .into_iter()
        .fold(None, |best: Option<BrandCandidate>, candidate| match best {
            Some(b) if b.confidence >= candidate.confidence => Some(b),
            _ => Some(candidate),
        })
}
