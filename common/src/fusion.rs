//! 証拠統合（ブランド判定の最終決定）
//!
//! 優先順（高い順）: ラベル > ブランドパターン > 素材 > 柄 > サイズ表記
//!
//! 1. パターン候補（+ローマ数字規則）を信頼度の降順に並べる。同点はレジストリ宣言順
//! 2. ラベルからブランドが取れていれば 0.95〜1.0 の合成候補を作り先頭に置く
//!    （同じブランドの候補があれば置き換える）
//! 3. 先頭を primary とする
//! 4. 素材・柄・サイズの示唆は説明用に残すだけで primary にはしない

use crate::clues::apply_roman_sizing_rule;
use crate::registry::BrandRegistry;
use crate::types::{
    BrandCandidate, ClassificationResult, ConfidenceBucket, EvidenceSource, LabelData,
    MaterialSignature, SizingClue, SuggestedBrand, VisualPatternHit,
};
use std::cmp::Ordering;
use tracing::debug;

/// ラベル由来候補の最低信頼度
pub const LABEL_BASE_CONFIDENCE: f64 = 0.95;
/// ラベル抽出の信頼度に掛ける幅（最大 1.0 になる）
pub const LABEL_CONFIDENCE_SPAN: f64 = 0.05;

pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.9;
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// 各検出器の出力一式
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub pattern_candidates: Vec<BrandCandidate>,
    pub sizing_clues: Vec<SizingClue>,
    pub material_signatures: Vec<MaterialSignature>,
    pub visual_patterns: Vec<VisualPatternHit>,
    pub label_data: Option<LabelData>,
}

/// 信頼度を3段階に丸める
pub fn confidence_bucket(confidence: Option<f64>) -> ConfidenceBucket {
    match confidence {
        Some(c) if c > HIGH_CONFIDENCE_THRESHOLD => ConfidenceBucket::High,
        Some(c) if c > MEDIUM_CONFIDENCE_THRESHOLD => ConfidenceBucket::Medium,
        _ => ConfidenceBucket::Low,
    }
}

/// ラベル由来の合成候補の信頼度
pub fn label_candidate_confidence(label_brand_confidence: f64) -> f64 {
    (LABEL_BASE_CONFIDENCE + label_brand_confidence.clamp(0.0, 1.0) * LABEL_CONFIDENCE_SPAN).min(1.0)
}

/// 信頼度の降順、同点はレジストリ宣言順（安定ソート）
fn sort_candidates(candidates: &mut [BrandCandidate], registry: &BrandRegistry) {
    let position = |c: &BrandCandidate| registry.position(&c.brand).unwrap_or(usize::MAX);
    candidates.sort_by(|a, b| {
        b.raw_score
            .partial_cmp(&a.raw_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| position(a).cmp(&position(b)))
    });
}

/// 同一ブランドの候補は信頼度の高い方だけ残す
fn dedupe_candidates(candidates: Vec<BrandCandidate>) -> Vec<BrandCandidate> {
    let mut unique: Vec<BrandCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match unique.iter_mut().find(|c| c.brand == candidate.brand) {
            Some(existing) if candidate.confidence > existing.confidence => *existing = candidate,
            Some(_) => {}
            None => unique.push(candidate),
        }
    }
    unique
}

fn label_candidate(
    label: &LabelData,
    brand_id: &str,
    existing: Option<&BrandCandidate>,
    registry: &BrandRegistry,
) -> Option<BrandCandidate> {
    let definition = registry.get(brand_id)?;
    let confidence = label_candidate_confidence(label.brand_confidence);

    Some(BrandCandidate {
        brand: definition.id.clone(),
        confidence,
        matched_patterns: existing.map_or(0, |c| c.matched_patterns),
        total_patterns: definition.patterns.len(),
        indicators: definition.indicators.clone(),
        tier: definition.tier,
        raw_score: confidence,
        source: EvidenceSource::Label,
    })
}

/// 素材 → 柄 → サイズの順で示唆ブランドをまとめる
fn collect_suggestions(evidence: &Evidence) -> Vec<SuggestedBrand> {
    let mut suggestions: Vec<SuggestedBrand> = Vec::new();

    let mut add = |brand: &str, source: EvidenceSource| {
        match suggestions.iter_mut().find(|s| s.brand == brand) {
            Some(existing) => {
                if !existing.sources.contains(&source) {
                    existing.sources.push(source);
                }
            }
            None => suggestions.push(SuggestedBrand {
                brand: brand.to_string(),
                sources: vec![source],
            }),
        }
    };

    for signature in &evidence.material_signatures {
        for brand in &signature.suggested_brands {
            add(brand, EvidenceSource::Material);
        }
    }
    for hit in &evidence.visual_patterns {
        for brand in &hit.suggested_brands {
            add(brand, EvidenceSource::Visual);
        }
    }
    for clue in &evidence.sizing_clues {
        for brand in &clue.suggested_brands {
            add(brand, EvidenceSource::Sizing);
        }
    }

    suggestions
}

/// 証拠を統合して判定結果を作る
pub fn resolve(evidence: Evidence, registry: &BrandRegistry) -> ClassificationResult {
    let mut candidates = dedupe_candidates(evidence.pattern_candidates.clone());
    apply_roman_sizing_rule(&mut candidates, &evidence.sizing_clues, registry);
    sort_candidates(&mut candidates, registry);

    // ラベルは衣類に縫い付けられた一次情報なので、常に先頭
    if let Some(label) = &evidence.label_data {
        if let Some(brand_id) = label.brand.as_deref() {
            let existing = candidates.iter().position(|c| c.brand == brand_id);
            let synthetic = label_candidate(label, brand_id, existing.map(|i| &candidates[i]), registry);

            if let Some(synthetic) = synthetic {
                if let Some(i) = existing {
                    candidates.remove(i);
                }
                debug!(
                    brand = %synthetic.brand,
                    confidence = synthetic.confidence,
                    replaced = existing.is_some(),
                    "ラベル由来の候補を採用"
                );
                candidates.insert(0, synthetic);
            }
        }
    }

    let primary = candidates.first().cloned();
    let confidence = confidence_bucket(primary.as_ref().map(|p| p.confidence));
    let suggested_brands = collect_suggestions(&evidence);

    debug!(
        primary = ?primary.as_ref().map(|p| p.brand.as_str()),
        candidate_count = candidates.len(),
        confidence = %confidence,
        "証拠統合完了"
    );

    ClassificationResult {
        detected_brands: candidates,
        primary_brand: primary,
        confidence,
        sizing_clues: evidence.sizing_clues,
        material_signatures: evidence.material_signatures,
        visual_patterns: evidence.visual_patterns,
        suggested_brands,
        label_data: evidence.label_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand_matcher::match_brands;
    use crate::clues::detect_sizing;
    use crate::types::Tier;

    fn pattern_candidate(brand: &str, confidence: f64) -> BrandCandidate {
        let definition = BrandRegistry::builtin().get(brand).unwrap();
        BrandCandidate {
            brand: brand.to_string(),
            confidence,
            matched_patterns: 1,
            total_patterns: definition.patterns.len(),
            indicators: vec![],
            tier: definition.tier,
            raw_score: confidence,
            source: EvidenceSource::Pattern,
        }
    }

    fn label_with_brand(brand: &str, brand_confidence: f64) -> LabelData {
        LabelData {
            brand: Some(brand.to_string()),
            brand_confidence,
            ..Default::default()
        }
    }

    #[test]
    fn test_confidence_bucket_thresholds() {
        assert_eq!(confidence_bucket(Some(0.95)), ConfidenceBucket::High);
        assert_eq!(confidence_bucket(Some(0.9)), ConfidenceBucket::Medium);
        assert_eq!(confidence_bucket(Some(0.85)), ConfidenceBucket::Medium);
        assert_eq!(confidence_bucket(Some(0.8)), ConfidenceBucket::Low);
        assert_eq!(confidence_bucket(None), ConfidenceBucket::Low);
    }

    #[test]
    fn test_label_candidate_confidence_bounds() {
        assert_eq!(label_candidate_confidence(0.0), 0.95);
        assert_eq!(label_candidate_confidence(1.0), 1.0);
        assert_eq!(label_candidate_confidence(3.0), 1.0);
    }

    #[test]
    fn test_empty_evidence() {
        let result = resolve(Evidence::default(), BrandRegistry::builtin());
        assert!(result.primary_brand.is_none());
        assert!(result.detected_brands.is_empty());
        assert_eq!(result.confidence, ConfidenceBucket::Low);
    }

    #[test]
    fn test_sorted_with_registry_order_ties() {
        let evidence = Evidence {
            pattern_candidates: vec![
                pattern_candidate("ZARA", 0.4),
                pattern_candidate("JIGSAW", 0.4),
                pattern_candidate("BARBOUR", 0.6),
            ],
            ..Default::default()
        };

        let result = resolve(evidence, BrandRegistry::builtin());
        let order: Vec<&str> = result.detected_brands.iter().map(|c| c.brand.as_str()).collect();
        assert_eq!(order, vec!["BARBOUR", "JIGSAW", "ZARA"]);
        assert_eq!(result.primary_brand.unwrap().brand, "BARBOUR");
    }

    #[test]
    fn test_label_prepended_over_other_brand() {
        let evidence = Evidence {
            pattern_candidates: vec![pattern_candidate("ZARA", 0.85)],
            label_data: Some(label_with_brand("BURBERRY", 0.38)),
            ..Default::default()
        };

        let result = resolve(evidence, BrandRegistry::builtin());
        let primary = result.primary_brand.unwrap();
        assert_eq!(primary.brand, "BURBERRY");
        assert_eq!(primary.source, EvidenceSource::Label);
        assert!(primary.confidence >= 0.95);
        assert_eq!(primary.tier, Tier::Luxury);
        assert_eq!(result.detected_brands.len(), 2);
        assert_eq!(result.confidence, ConfidenceBucket::High);
    }

    #[test]
    fn test_label_replaces_same_brand() {
        let evidence = Evidence {
            pattern_candidates: vec![
                pattern_candidate("ZARA", 0.85),
                pattern_candidate("BURBERRY", 0.19),
            ],
            label_data: Some(label_with_brand("BURBERRY", 1.0)),
            ..Default::default()
        };

        let result = resolve(evidence, BrandRegistry::builtin());
        assert_eq!(result.detected_brands.len(), 2);
        assert_eq!(result.detected_brands[0].brand, "BURBERRY");
        assert_eq!(result.detected_brands[0].confidence, 1.0);
        assert_eq!(result.detected_brands[0].matched_patterns, 1);
        assert_eq!(
            result.detected_brands.iter().filter(|c| c.brand == "BURBERRY").count(),
            1
        );
    }

    #[test]
    fn test_roman_rule_applied_in_fusion() {
        let registry = BrandRegistry::builtin();
        let text = "oska linen dress size iii";
        let evidence = Evidence {
            pattern_candidates: match_brands(text, registry),
            sizing_clues: detect_sizing(text),
            ..Default::default()
        };

        let result = resolve(evidence, registry);
        assert_eq!(result.detected_brands[0].brand, "OSKA");
        assert_eq!(result.detected_brands[0].confidence, 0.99);
        assert_eq!(result.confidence, ConfidenceBucket::High);
    }

    #[test]
    fn test_label_stays_first_over_roman_rule() {
        let registry = BrandRegistry::builtin();
        let text = "linen dress size iii";
        let evidence = Evidence {
            pattern_candidates: match_brands(text, registry),
            sizing_clues: detect_sizing(text),
            label_data: Some(label_with_brand("BURBERRY", 0.38)),
            ..Default::default()
        };

        let result = resolve(evidence, registry);
        let order: Vec<&str> = result.detected_brands.iter().map(|c| c.brand.as_str()).collect();
        assert_eq!(order, vec!["BURBERRY", "OSKA"]);

        // ラベル候補は rawScore が低くても先頭に固定される
        let label = &result.detected_brands[0];
        let roman = &result.detected_brands[1];
        assert_eq!(label.source, EvidenceSource::Label);
        assert!((label.raw_score - label_candidate_confidence(0.38)).abs() < 1e-9);
        assert_eq!(roman.source, EvidenceSource::Sizing);
        assert_eq!(roman.raw_score, 0.99);
        assert!(label.raw_score < roman.raw_score);
        assert_eq!(result.primary_brand.unwrap().brand, "BURBERRY");
    }

    #[test]
    fn test_suggestions_are_advisory() {
        let evidence = Evidence {
            material_signatures: vec![MaterialSignature {
                material: "waxed cotton".to_string(),
                percentage: None,
                confidence: 0.8,
                suggested_brands: vec!["BARBOUR".to_string()],
            }],
            visual_patterns: vec![VisualPatternHit {
                pattern: "tartan lining".to_string(),
                confidence: 0.6,
                suggested_brands: vec!["BARBOUR".to_string()],
            }],
            ..Default::default()
        };

        let result = resolve(evidence, BrandRegistry::builtin());
        assert!(result.primary_brand.is_none());
        assert_eq!(result.suggested_brands.len(), 1);
        assert_eq!(
            result.suggested_brands[0].sources,
            vec![EvidenceSource::Material, EvidenceSource::Visual]
        );
    }

    #[test]
    fn test_unknown_label_brand_ignored() {
        let evidence = Evidence {
            pattern_candidates: vec![pattern_candidate("ZARA", 0.85)],
            label_data: Some(label_with_brand("NOT REGISTERED", 0.9)),
            ..Default::default()
        };

        let result = resolve(evidence, BrandRegistry::builtin());
        assert_eq!(result.primary_brand.unwrap().brand, "ZARA");
    }
}
