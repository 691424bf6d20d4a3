//! 1商品分の処理パイプライン
//!
//! 入力検証 → 各検出器 → 証拠統合 → 状態判定 → 出品データ生成

use crate::brand_matcher::match_brands;
use crate::clues::{detect_materials, detect_sizing, detect_visual_patterns};
use crate::condition::classify_condition;
use crate::error::{Error, Result};
use crate::fusion::{resolve, Evidence};
use crate::label::{extract_label_data, select_label_photo};
use crate::listing::{generate_listing, ListingContext};
use crate::registry::BrandRegistry;
use crate::types::{ClassificationResult, ConditionResult, ItemInput, ListingItem};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 1商品分の処理結果（入力の位置を保持する）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedItem {
    /// 0始まりの入力位置
    pub index: usize,
    pub classification: ClassificationResult,
    pub condition: ConditionResult,
    pub listing: ListingItem,
}

/// ラベルとして読むテキスト
///
/// `label_text` があればそれを使い、無ければ写真から選んだラベル候補の説明文を使う。
pub fn label_source_text(input: &ItemInput) -> Option<String> {
    if let Some(text) = input.label_text.as_deref().filter(|t| !t.trim().is_empty()) {
        return Some(text.to_string());
    }

    let selection = select_label_photo(&input.photos)?;
    let photo = &input.photos[selection.index];
    debug!(
        file = %photo.file_name,
        score = selection.score,
        forced = selection.forced,
        "ラベル写真を選択"
    );
    Some(photo.text.clone()).filter(|t| !t.trim().is_empty())
}

/// ブランド判定
///
/// テキストが全く無い入力だけが `InvalidInput` になる。
pub fn classify(input: &ItemInput, registry: &BrandRegistry) -> Result<ClassificationResult> {
    let blob = input.combined_text();
    if blob.is_empty() {
        return Err(Error::InvalidInput("テキストがありません".to_string()));
    }

    let label_data = label_source_text(input).map(|text| extract_label_data(&text, registry));

    let evidence = Evidence {
        pattern_candidates: match_brands(&blob, registry),
        sizing_clues: detect_sizing(&blob),
        material_signatures: detect_materials(&blob),
        visual_patterns: detect_visual_patterns(&blob),
        label_data,
    };

    Ok(resolve(evidence, registry))
}

/// 状態判定（ラベル文言は使わない）
pub fn assess_condition(input: &ItemInput) -> ConditionResult {
    classify_condition(&input.description_text(), input.condition_hint.as_deref())
}

/// 判定から出品データまで一括で処理する
///
/// # Arguments
/// * `index` - 0始まりの入力位置（SKUには +1 した値を使う）
pub fn process_item<R: Rng + ?Sized>(
    input: &ItemInput,
    index: usize,
    registry: &BrandRegistry,
    batch_id: Option<&str>,
    rng: &mut R,
) -> Result<ProcessedItem> {
    let classification = classify(input, registry)?;
    let condition = assess_condition(input);

    let context = ListingContext::new(batch_id.map(str::to_string), index + 1);
    let listing = generate_listing(input, &classification, &condition, registry, &context, rng);

    Ok(ProcessedItem {
        index,
        classification,
        condition,
        listing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConditionLevel, ConfidenceBucket, EvidenceSource, PhotoInfo, Tier};

    #[test]
    fn test_empty_input_is_invalid() {
        let result = classify(&ItemInput::default(), BrandRegistry::builtin());
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let blank = ItemInput::from_text("   ");
        assert!(classify(&blank, BrandRegistry::builtin()).is_err());
    }

    #[test]
    fn test_no_evidence_is_not_an_error() {
        let result = classify(&ItemInput::from_text("plain navy jumper"), BrandRegistry::builtin())
            .unwrap();
        assert!(result.primary_brand.is_none());
        assert_eq!(result.confidence, ConfidenceBucket::Low);
    }

    #[test]
    fn test_oska_roman_example() {
        let input = ItemInput::from_text("OSKA linen dress size III");
        let result = classify(&input, BrandRegistry::builtin()).unwrap();

        let top = &result.detected_brands[0];
        assert_eq!(top.brand, "OSKA");
        assert!(top.confidence >= 0.99);
        assert_eq!(top.tier, Tier::Premium);
        assert!(result
            .sizing_clues
            .iter()
            .any(|c| c.system == "roman" && c.value == "III"));
    }

    #[test]
    fn test_label_text_overrides_pattern() {
        let input = ItemInput {
            text: "zara style trench coat".to_string(),
            label_text: Some("BURBERRY LONDON 100% COTTON MADE IN ENGLAND SIZE 12".to_string()),
            ..Default::default()
        };
        let result = classify(&input, BrandRegistry::builtin()).unwrap();

        let primary = result.primary_brand.as_ref().unwrap();
        assert_eq!(primary.brand, "BURBERRY");
        assert_eq!(primary.source, EvidenceSource::Label);
        assert!(primary.confidence >= 0.95);

        let label = result.label_data.as_ref().unwrap();
        assert_eq!(label.country_of_origin.as_deref(), Some("uk"));
        assert_eq!(label.materials.get("cotton"), Some(&100));
    }

    #[test]
    fn test_label_photo_used_without_label_text() {
        let input = ItemInput {
            text: "trench coat".to_string(),
            photos: vec![
                PhotoInfo {
                    file_name: "front.jpg".to_string(),
                    text: "beige trench coat on hanger".to_string(),
                },
                PhotoInfo {
                    file_name: "care_label.jpg".to_string(),
                    text: "Burberry London 100% cotton made in England".to_string(),
                },
            ],
            ..Default::default()
        };
        let result = classify(&input, BrandRegistry::builtin()).unwrap();

        assert_eq!(result.label_data.as_ref().and_then(|l| l.brand.as_deref()), Some("BURBERRY"));
        assert_eq!(result.primary_brand.unwrap().source, EvidenceSource::Label);
    }

    #[test]
    fn test_brand_and_roman_size_from_file_name_only() {
        let input = ItemInput {
            text: "dress".to_string(),
            photos: vec![PhotoInfo {
                file_name: "oska_dress_size_iii.jpg".to_string(),
                text: String::new(),
            }],
            ..Default::default()
        };
        let result = classify(&input, BrandRegistry::builtin()).unwrap();

        assert_eq!(result.primary_brand.as_ref().map(|p| p.brand.as_str()), Some("OSKA"));
        assert!(result.sizing_clues.iter().any(|c| c.system == "roman" && c.value == "III"));

        let input = ItemInput {
            text: "coat".to_string(),
            photos: vec![PhotoInfo {
                file_name: "burberry_trench_front.jpg".to_string(),
                text: String::new(),
            }],
            ..Default::default()
        };
        let result = classify(&input, BrandRegistry::builtin()).unwrap();
        assert_eq!(result.primary_brand.map(|p| p.brand), Some("BURBERRY".to_string()));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let input = ItemInput::from_text("Barbour waxed cotton jacket tartan lining size 12");
        let first = classify(&input, BrandRegistry::builtin()).unwrap();
        let second = classify(&input, BrandRegistry::builtin()).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_condition_uses_hint() {
        let mut input = ItemInput::from_text("good used condition, some fading");
        let result = assess_condition(&input);
        assert_eq!(result.condition, ConditionLevel::Good);
        assert!(result.description.contains("fading"));

        input.condition_hint = Some("excellent".to_string());
        assert_eq!(assess_condition(&input).condition, ConditionLevel::Excellent);
    }

    #[test]
    fn test_process_item_keeps_index() {
        let input = ItemInput::from_text("Levi's 501 jeans W32 L30 very good condition");
        let mut rng = rand::thread_rng();
        let processed =
            process_item(&input, 4, BrandRegistry::builtin(), Some("A1"), &mut rng).unwrap();

        assert_eq!(processed.index, 4);
        assert!(processed.listing.sku.starts_with("LEV-"));
        assert!(processed.listing.sku.ends_with("-A1-005"));
        assert_eq!(processed.listing.condition, ConditionLevel::VeryGood);
        assert!(processed.listing.ebay_title.chars().count() <= 80);
    }
}
