//! ケアラベル・サイズタグの推定と抽出
//!
//! ## 処理フロー
//! 1. 商品写真の説明テキストから「ラベル写真らしさ」を採点し1枚を選ぶ
//! 2. 選んだラベルのテキストからブランド・サイズ・混率・洗濯表示・原産国・品番を抽出
//!
//! 画素は扱わない。上流のOCR/キャプション結果のテキストだけを見る。

use crate::brand_matcher::best_brand;
use crate::clues::{detect_sizing, parse_material_percentages};
use crate::registry::BrandRegistry;
use crate::types::{file_name_words, ConfidenceBucket, LabelData, LabelSize, PhotoInfo};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// ラベル文言（洗濯・混率・サイズタグ）を含む写真
pub const LABEL_INDICATOR_SCORE: f64 = 0.9;
/// 最後の写真で、かつ「タグ・ラベル・文字」系の説明
pub const LAST_PHOTO_TEXT_SCORE: f64 = 0.7;
/// 「タグ・ラベル・文字」系の説明のみ
pub const TEXT_INDICATOR_SCORE: f64 = 0.5;
/// 何も手がかりがない
pub const FLOOR_SCORE: f64 = 0.1;

/// 品番は種別ごとに先頭2件まで
const MAX_CODES_PER_TYPE: usize = 2;

lazy_static::lazy_static! {
    static ref LABEL_INDICATOR_RE: Regex = Regex::new(
        r"(?i)\b(?:care|wash(?:ing)?|dry clean|composition|fabric content|made in|do not (?:bleach|tumble|iron)|size (?:label|tag))\b|\d{1,3}\s*%"
    ).unwrap();
    static ref TEXT_INDICATOR_RE: Regex = Regex::new(
        r"(?i)\b(?:tags?|labels?|text|writing|close ?up|inside)\b"
    ).unwrap();

    static ref CARE_VOCABULARY: Vec<(&'static str, Regex, Option<&'static str>)> = vec![
        ("machine_wash", r"\bmachine wash", None),
        ("hand_wash", r"\bhand wash", None),
        ("cool_wash", r"\b(?:cool|cold) wash\b|\bwash\w*\s+(?:at\s+)?30\b|\b30\s*°", None),
        ("do_not_wash", r"\bdo not wash\b", None),
        ("do_not_dry_clean", r"\bdo not dry clean\b", None),
        ("dry_clean", r"\bdry clean\b", Some("do_not_dry_clean")),
        ("do_not_tumble_dry", r"\bdo not tumble", None),
        ("tumble_dry", r"\btumble dry\b", Some("do_not_tumble_dry")),
        ("do_not_bleach", r"\bdo not bleach\b", None),
        ("do_not_iron", r"\bdo not iron\b", None),
        ("iron_low", r"\b(?:cool|low) iron\b|\biron (?:on )?low\b", None),
        ("dry_flat", r"\bdry flat\b", None),
        ("line_dry", r"\bline dry\b", None),
    ]
    .into_iter()
    .map(|(tag, pattern, excluded_by)| (tag, Regex::new(&format!("(?i){}", pattern)).unwrap(), excluded_by))
    .collect();

    /// 原産国（この順で先に一致したものを採用）
    static ref COUNTRY_PRIORITY: Vec<(&'static str, Regex)> = vec![
        ("italy", r"\bmade in italy\b|\bfatto in italia\b"),
        ("france", r"\bmade in france\b|\bfabriqu[eé] en france\b"),
        ("uk", r"\bmade in (?:england|the uk|uk|u\.k\.|great britain|britain|scotland|wales|the united kingdom|united kingdom)\b"),
        ("portugal", r"\bmade in portugal\b"),
        ("spain", r"\bmade in spain\b|\bhecho en espa[nñ]a\b"),
        ("germany", r"\bmade in germany\b"),
        ("usa", r"\bmade in (?:the )?(?:usa|u\.s\.a\.?|united states)\b"),
        ("japan", r"\bmade in japan\b"),
        ("romania", r"\bmade in romania\b"),
        ("turkey", r"\bmade in (?:turkey|t[uü]rkiye)\b"),
        ("morocco", r"\bmade in morocco\b"),
        ("india", r"\bmade in india\b"),
        ("sri lanka", r"\bmade in sri lanka\b"),
        ("bangladesh", r"\bmade in bangladesh\b"),
        ("vietnam", r"\bmade in viet ?nam\b"),
        ("cambodia", r"\bmade in cambodia\b"),
        ("indonesia", r"\bmade in indonesia\b"),
        ("china", r"\bmade in (?:china|p\.?r\.?c\.?)\b"),
    ]
    .into_iter()
    .map(|(code, pattern)| (code, Regex::new(&format!("(?i){}", pattern)).unwrap()))
    .collect();

    static ref CODE_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("style", r"\bstyle\s*(?:no\.?|number|code|#)?\s*[:#]?\s*([a-z0-9][a-z0-9\-/\.]{2,})"),
        ("item", r"\bitem\s*(?:no\.?|number|code|#)?\s*[:#]?\s*([a-z0-9][a-z0-9\-/\.]{2,})"),
        ("sku", r"\bsku\s*[:#]?\s*([a-z0-9][a-z0-9\-/\.]{2,})"),
        ("model", r"\bmodel\s*(?:no\.?|number|#)?\s*[:#]?\s*([a-z0-9][a-z0-9\-/\.]{2,})"),
        ("product_code", r"\b(?:product|prod\.?|art(?:icle)?\.?)\s*(?:code|no\.?|number|#)\s*[:#]?\s*([a-z0-9][a-z0-9\-/\.]{2,})"),
    ]
    .into_iter()
    .map(|(code_type, pattern)| (code_type, Regex::new(&format!("(?i){}", pattern)).unwrap()))
    .collect();
}

/// ラベル写真の選択結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPhotoSelection {
    pub index: usize,
    pub score: f64,
    /// 手がかりがなく最後の写真を採用した
    pub forced: bool,
}

/// 採点用にファイル名の区切り記号を空白にする
fn scoring_text(photo: &PhotoInfo) -> String {
    file_name_words(&format!("{} {}", photo.file_name, photo.text))
}

/// 1枚のラベル写真らしさを採点
pub fn score_label_photo(photo: &PhotoInfo, is_last: bool) -> f64 {
    let text = scoring_text(photo);

    if LABEL_INDICATOR_RE.is_match(&text) {
        LABEL_INDICATOR_SCORE
    } else if TEXT_INDICATOR_RE.is_match(&text) {
        if is_last {
            LAST_PHOTO_TEXT_SCORE
        } else {
            TEXT_INDICATOR_SCORE
        }
    } else {
        FLOOR_SCORE
    }
}

/// 最もラベルらしい写真を選ぶ（同点は先の写真、全て下限なら最後の写真）
pub fn select_label_photo(photos: &[PhotoInfo]) -> Option<LabelPhotoSelection> {
    let last = photos.len().checked_sub(1)?;

    let mut best: Option<(usize, f64)> = None;
    for (i, photo) in photos.iter().enumerate() {
        let score = score_label_photo(photo, i == last);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }

    let selection = match best {
        Some((index, score)) if score > FLOOR_SCORE => LabelPhotoSelection {
            index,
            score,
            forced: false,
        },
        _ => LabelPhotoSelection {
            index: last,
            score: FLOOR_SCORE,
            forced: true,
        },
    };

    debug!(
        index = selection.index,
        score = selection.score,
        forced = selection.forced,
        "ラベル写真を選択"
    );
    Some(selection)
}

/// 洗濯表示タグを抽出（出現の有無のみ、重複なし）
pub fn extract_care_instructions(text: &str) -> Vec<String> {
    let present: Vec<&str> = CARE_VOCABULARY
        .iter()
        .filter(|(_, re, _)| re.is_match(text))
        .map(|(tag, _, _)| *tag)
        .collect();

    present
        .iter()
        .filter(|tag| {
            CARE_VOCABULARY
                .iter()
                .find(|(t, _, _)| t == *tag)
                .and_then(|(_, _, excluded_by)| *excluded_by)
                .map_or(true, |ex| !present.contains(&ex))
        })
        .map(|tag| tag.to_string())
        .collect()
}

/// 原産国を抽出（優先順で先に一致したもの）
pub fn extract_country(text: &str) -> Option<String> {
    COUNTRY_PRIORITY
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(code, _)| code.to_string())
}

/// 品番類を抽出（種別ごと先頭2件、数字を含むもののみ）
pub fn extract_codes(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut codes = BTreeMap::new();

    for (code_type, re) in CODE_PATTERNS.iter() {
        let values: Vec<String> = re
            .captures_iter(text)
            .map(|cap| cap[1].trim_end_matches('.').to_string())
            .filter(|v| v.chars().any(|c| c.is_ascii_digit()))
            .take(MAX_CODES_PER_TYPE)
            .collect();

        if !values.is_empty() {
            codes.insert(code_type.to_string(), values);
        }
    }

    codes
}

/// ラベルテキストから全項目を抽出
pub fn extract_label_data(text: &str, registry: &BrandRegistry) -> LabelData {
    if text.trim().is_empty() {
        return LabelData::default();
    }

    let brand = best_brand(text, registry);

    let mut sizes: Vec<LabelSize> = Vec::new();
    for clue in detect_sizing(text) {
        match sizes.iter_mut().find(|s| s.system == clue.system) {
            Some(existing) => existing.values.push(clue.value),
            None => sizes.push(LabelSize {
                system: clue.system,
                values: vec![clue.value],
            }),
        }
    }

    let mut label = LabelData {
        brand: brand.as_ref().map(|b| b.brand.clone()),
        brand_confidence: brand.as_ref().map_or(0.0, |b| b.confidence),
        sizes,
        materials: parse_material_percentages(text),
        care_instructions: extract_care_instructions(text),
        country_of_origin: extract_country(text),
        codes: extract_codes(text),
        confidence: ConfidenceBucket::Low,
    };
    label.confidence = extraction_confidence(&label);

    debug!(
        brand = ?label.brand,
        confidence = %label.confidence,
        "ラベル抽出完了"
    );
    label
}

/// 6項目のうち埋まっている数で信頼度を決める
pub fn extraction_confidence(label: &LabelData) -> ConfidenceBucket {
    let filled = [
        label.brand.is_some(),
        !label.sizes.is_empty(),
        !label.materials.is_empty(),
        !label.care_instructions.is_empty(),
        label.country_of_origin.is_some(),
        !label.codes.is_empty(),
    ]
    .iter()
    .filter(|&&f| f)
    .count();

    match filled {
        n if n >= 4 => ConfidenceBucket::High,
        n if n >= 2 => ConfidenceBucket::Medium,
        _ => ConfidenceBucket::Low,
    }
}
