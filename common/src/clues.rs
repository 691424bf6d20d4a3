//! サイズ表記・素材表記・柄の手がかり検出
//!
//! いずれもブランドを断定せず「示唆するブランド」を返すだけ。
//! 例外はローマ数字サイズの規則（`apply_roman_sizing_rule`）のみ。

use crate::registry::BrandRegistry;
use crate::types::{BrandCandidate, EvidenceSource, MaterialSignature, SizingClue, VisualPatternHit};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// ローマ数字サイズで確定扱いにするブランド
pub const ROMAN_SIZING_BRAND: &str = "OSKA";
/// ローマ数字サイズ検出時の信頼度
pub const ROMAN_SIZING_CONFIDENCE: f64 = 0.99;

const UK_SIZING_BRANDS: &[&str] = &["BODEN", "JIGSAW", "WHISTLES", "HOBBS", "MARKS & SPENCER", "NEXT"];
const EU_SIZING_BRANDS: &[&str] = &["ZARA", "H&M", "OSKA"];
const US_SIZING_BRANDS: &[&str] = &["RALPH LAUREN", "CARHARTT", "DICKIES"];
const WAIST_SIZING_BRANDS: &[&str] = &["LEVI'S", "DICKIES", "CARHARTT"];

lazy_static::lazy_static! {
    static ref ROMAN_RE: Regex = Regex::new(r"(?i)\b(iii|ii|iv)\b").unwrap();
    static ref ROMAN_SINGLE_RE: Regex = Regex::new(r"(?i)\bsize\s*(i|v)\b").unwrap();
    static ref UK_RE: Regex = Regex::new(r"(?i)\buk\s*(?:size\s*)?(\d{1,2})\b").unwrap();
    static ref EU_RE: Regex = Regex::new(r"(?i)\beur?\s*(?:size\s*)?(\d{2})\b").unwrap();
    static ref US_RE: Regex = Regex::new(r"(?i)\bus\s*(?:size\s*)?(\d{1,2})\b").unwrap();
    static ref PLAIN_SIZE_RE: Regex = Regex::new(r"(?i)\bsize\s*(\d{1,2})\b").unwrap();
    static ref WAIST_LEG_RE: Regex = Regex::new(r"(?i)\bw\s?(\d{2})\s*l\s?(\d{2})\b").unwrap();
    static ref LETTER_RE: Regex = Regex::new(r"(?i)\bsize\s*(xxs|xs|s|m|l|xl|xxl|3xl)\b").unwrap();
    static ref LETTER_STANDALONE_RE: Regex = Regex::new(r"(?i)\b(xxs|xs|xl|xxl|3xl)\b").unwrap();

    /// 「100% cotton」形式
    static ref PCT_BEFORE_RE: Regex = Regex::new(r"(?i)(\d{1,3})\s*%\s*([a-z]+)").unwrap();
    /// 「cotton 100%」形式
    static ref PCT_AFTER_RE: Regex = Regex::new(r"(?i)([a-z]+)\s*[:\-]?\s*(\d{1,3})\s*%").unwrap();

    static ref MATERIAL_VOCABULARY: Vec<(&'static str, Regex, f64, &'static [&'static str])> = vec![
        ("waxed cotton", r"\bwax(?:ed)?\s+cotton\b|\bwax jacket\b", 0.8, &["BARBOUR"][..]),
        ("gabardine", r"\bgabardine\b", 0.7, &["BURBERRY"][..]),
        ("duck canvas", r"\bduck\s+canvas\b", 0.75, &["CARHARTT"][..]),
        ("denim", r"\bdenim\b|\bselvedge\b", 0.5, &["LEVI'S"][..]),
        ("twill", r"\btwill\b", 0.4, &["DICKIES"][..]),
        ("linen", r"\blinen\b|\bflax\b", 0.6, &["OSKA", "TOAST"][..]),
        ("cashmere", r"\bcashmere\b", 0.5, &["RALPH LAUREN", "JIGSAW"][..]),
        ("wool", r"\b(?:lambs)?wool\b|\bmerino\b", 0.4, &["JIGSAW"][..]),
        ("silk", r"\bsilk\b", 0.4, &["WHISTLES", "HOBBS"][..]),
        ("leather", r"\bleather\b", 0.4, &["PRADA", "GUCCI"][..]),
        ("nylon", r"\bnylon\b|\bpolyamide\b", 0.3, &["PRADA"][..]),
        ("cotton", r"\bcotton\b", 0.3, &[][..]),
        ("polyester", r"\bpolyester\b", 0.2, &[][..]),
        ("viscose", r"\bviscose\b|\brayon\b", 0.2, &[][..]),
        ("elastane", r"\belastane\b|\bspandex\b|\blycra\b", 0.2, &[][..]),
        ("acrylic", r"\bacrylic\b", 0.2, &[][..]),
        ("modal", r"\bmodal\b", 0.2, &[][..]),
        ("lyocell", r"\blyocell\b|\btencel\b", 0.2, &[][..]),
    ]
    .into_iter()
    .map(|(name, pattern, confidence, brands)| {
        (name, Regex::new(&format!("(?i){}", pattern)).unwrap(), confidence, brands)
    })
    .collect();

    static ref VISUAL_VOCABULARY: Vec<(&'static str, Regex, f64, &'static [&'static str])> = vec![
        ("nova check", r"\bnova check\b|\bhouse check\b|\bburberry check\b", 0.85, &["BURBERRY"][..]),
        ("gg monogram", r"\bgg (?:monogram|canvas|logo)\b", 0.85, &["GUCCI"][..]),
        ("lv monogram", r"\blv monogram\b|\bdamier\b|\bmonogram canvas\b", 0.85, &["LOUIS VUITTON"][..]),
        ("interlocking cc", r"\binterlocking cc\b|\bcc logo\b", 0.8, &["CHANEL"][..]),
        ("triangle logo", r"\btriangle (?:logo|plaque)\b", 0.75, &["PRADA"][..]),
        ("pony logo", r"\b(?:polo )?pony logo\b|\bembroidered pony\b", 0.8, &["RALPH LAUREN"][..]),
        ("red tab", r"\bred tab\b", 0.8, &["LEVI'S"][..]),
        ("batwing logo", r"\bbatwing\b", 0.7, &["LEVI'S"][..]),
        ("tartan lining", r"\btartan lining\b", 0.6, &["BARBOUR"][..]),
        ("diamond quilt", r"\bdiamond quilt(?:ed|ing)?\b", 0.5, &["BARBOUR"][..]),
        ("square logo patch", r"\bsquare (?:logo|label) patch\b", 0.6, &["CARHARTT"][..]),
        ("lagenlook", r"\blagenlook\b", 0.5, &["OSKA", "TOAST"][..]),
        ("breton stripe", r"\bbreton stripe\b", 0.3, &["BODEN"][..]),
    ]
    .into_iter()
    .map(|(name, pattern, confidence, brands)| {
        (name, Regex::new(&format!("(?i){}", pattern)).unwrap(), confidence, brands)
    })
    .collect();
}

fn to_owned_brands(brands: &[&str]) -> Vec<String> {
    brands.iter().map(|b| b.to_string()).collect()
}

fn push_clue(clues: &mut Vec<SizingClue>, system: &str, value: String, confidence: f64, brands: &[&str]) {
    if clues.iter().any(|c| c.system == system && c.value == value) {
        return;
    }
    clues.push(SizingClue {
        system: system.to_string(),
        value,
        confidence,
        suggested_brands: to_owned_brands(brands),
    });
}

/// サイズ表記を検出（体系ごと、出現順、重複なし）
pub fn detect_sizing(text: &str) -> Vec<SizingClue> {
    let mut clues = Vec::new();

    let roman_tokens = ROMAN_RE
        .captures_iter(text)
        .chain(ROMAN_SINGLE_RE.captures_iter(text))
        .map(|cap| cap[1].to_uppercase());
    for token in roman_tokens {
        push_clue(&mut clues, "roman", token, ROMAN_SIZING_CONFIDENCE, &[ROMAN_SIZING_BRAND]);
    }

    for cap in UK_RE.captures_iter(text) {
        push_clue(&mut clues, "uk", cap[1].to_string(), 0.7, UK_SIZING_BRANDS);
    }

    for cap in EU_RE.captures_iter(text) {
        if let Ok(n) = cap[1].parse::<u32>() {
            if (32..=52).contains(&n) {
                push_clue(&mut clues, "eu", n.to_string(), 0.7, EU_SIZING_BRANDS);
            }
        }
    }

    for cap in US_RE.captures_iter(text) {
        push_clue(&mut clues, "us", cap[1].to_string(), 0.6, US_SIZING_BRANDS);
    }

    // 体系なしの「size 12」「size 38」は数値の範囲で推定
    for cap in PLAIN_SIZE_RE.captures_iter(text) {
        let Ok(n) = cap[1].parse::<u32>() else { continue };
        if (4..=30).contains(&n) && n % 2 == 0 {
            push_clue(&mut clues, "uk", n.to_string(), 0.5, UK_SIZING_BRANDS);
        } else if (32..=52).contains(&n) {
            push_clue(&mut clues, "eu", n.to_string(), 0.5, EU_SIZING_BRANDS);
        }
    }

    for cap in WAIST_LEG_RE.captures_iter(text) {
        push_clue(&mut clues, "waist", format!("W{} L{}", &cap[1], &cap[2]), 0.6, WAIST_SIZING_BRANDS);
    }

    for cap in LETTER_RE.captures_iter(text).chain(LETTER_STANDALONE_RE.captures_iter(text)) {
        push_clue(&mut clues, "letter", cap[1].to_uppercase(), 0.3, &[]);
    }

    debug!(clue_count = clues.len(), "サイズ表記検出完了");
    clues
}

/// 混率表記のパース（素材 → %、同一素材は最大値）
///
/// 「100% cotton」形式を優先し、なければ「cotton 100%」形式を読む。
pub fn parse_material_percentages(text: &str) -> BTreeMap<String, u8> {
    let mut result: BTreeMap<String, u8> = BTreeMap::new();

    let mut record = |word: &str, pct: &str| {
        let Some(material) = canonical_material(word) else { return };
        let Ok(value) = pct.parse::<u32>() else { return };
        if value > 100 {
            return;
        }
        let value = value as u8;
        let entry = result.entry(material.to_string()).or_insert(value);
        if value > *entry {
            *entry = value;
        }
    };

    let mut found_before = false;
    for cap in PCT_BEFORE_RE.captures_iter(text) {
        if canonical_material(&cap[2]).is_some() {
            found_before = true;
        }
        record(&cap[2], &cap[1]);
    }

    if !found_before {
        for cap in PCT_AFTER_RE.captures_iter(text) {
            record(&cap[1], &cap[2]);
        }
    }

    result
}

/// 素材名の表記ゆれを正規名に寄せる
pub fn canonical_material(word: &str) -> Option<&'static str> {
    let word = word.trim().to_lowercase();
    let name = match word.as_str() {
        "cotton" => "cotton",
        "linen" | "flax" => "linen",
        "wool" | "lambswool" | "merino" => "wool",
        "cashmere" => "cashmere",
        "silk" => "silk",
        "polyester" | "poly" => "polyester",
        "viscose" | "rayon" => "viscose",
        "elastane" | "spandex" | "lycra" => "elastane",
        "nylon" | "polyamide" => "nylon",
        "acrylic" => "acrylic",
        "leather" => "leather",
        "modal" => "modal",
        "lyocell" | "tencel" => "lyocell",
        "alpaca" => "alpaca",
        "mohair" => "mohair",
        _ => return None,
    };
    Some(name)
}

/// 素材表記を検出（語彙の宣言順）
pub fn detect_materials(text: &str) -> Vec<MaterialSignature> {
    let percentages = parse_material_percentages(text);

    let signatures: Vec<MaterialSignature> = MATERIAL_VOCABULARY
        .iter()
        .filter(|(_, re, _, _)| re.is_match(text))
        .map(|(name, _, confidence, brands)| MaterialSignature {
            material: name.to_string(),
            percentage: percentages.get(*name).copied(),
            confidence: *confidence,
            suggested_brands: to_owned_brands(brands),
        })
        .collect();

    debug!(signature_count = signatures.len(), "素材表記検出完了");
    signatures
}

/// 柄・ロゴ表記を検出（語彙の宣言順）
pub fn detect_visual_patterns(text: &str) -> Vec<VisualPatternHit> {
    VISUAL_VOCABULARY
        .iter()
        .filter(|(_, re, _, _)| re.is_match(text))
        .map(|(name, _, confidence, brands)| VisualPatternHit {
            pattern: name.to_string(),
            confidence: *confidence,
            suggested_brands: to_owned_brands(brands),
        })
        .collect()
}

/// ローマ数字サイズの規則を候補リストに適用する
///
/// 対象ブランドの信頼度を `ROMAN_SIZING_CONFIDENCE` に固定する（なければ追加）。
/// 対象ブランドがレジストリにない場合は何もしない。
pub fn apply_roman_sizing_rule(
    candidates: &mut Vec<BrandCandidate>,
    clues: &[SizingClue],
    registry: &BrandRegistry,
) {
    if !clues.iter().any(|c| c.system == "roman") {
        return;
    }

    let Some(definition) = registry.get(ROMAN_SIZING_BRAND) else {
        debug!(brand = ROMAN_SIZING_BRAND, "ローマ数字規則の対象ブランドが未登録");
        return;
    };

    if let Some(existing) = candidates.iter_mut().find(|c| c.brand == ROMAN_SIZING_BRAND) {
        existing.confidence = ROMAN_SIZING_CONFIDENCE;
        existing.raw_score = ROMAN_SIZING_CONFIDENCE;
        existing.source = EvidenceSource::Sizing;
    } else {
        candidates.push(BrandCandidate {
            brand: definition.id.clone(),
            confidence: ROMAN_SIZING_CONFIDENCE,
            matched_patterns: 0,
            total_patterns: definition.patterns.len(),
            indicators: definition.indicators.clone(),
            tier: definition.tier,
            raw_score: ROMAN_SIZING_CONFIDENCE,
            source: EvidenceSource::Sizing,
        });
    }

    debug!(brand = ROMAN_SIZING_BRAND, "ローマ数字サイズ規則を適用");
}
