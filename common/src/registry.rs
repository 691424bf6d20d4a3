//! ブランドパターンレジストリ
//!
//! 既知ブランドの照合パターン・基礎信頼度・価格帯を保持する。
//! 一度構築したら変更しない（変更用のAPIは公開しない）。
//! 組み込み定義は `BrandRegistry::builtin()`、独自定義はJSONから構築する。

use crate::error::{Error, Result};
use crate::types::Tier;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ブランド定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDefinition {
    /// 正規名（例: "OSKA"）
    pub id: String,
    /// タイトル用の表記（省略時はid）
    #[serde(default)]
    pub display_name: String,
    /// 照合パターン（正規表現、大文字小文字無視）
    pub patterns: Vec<String>,
    pub base_confidence: f64,
    #[serde(default)]
    pub indicators: Vec<String>,
    pub tier: Tier,
}

/// コンパイル済みのブランド定義
#[derive(Debug, Clone)]
pub struct BrandEntry {
    pub definition: BrandDefinition,
    compiled: Vec<Regex>,
}

impl BrandEntry {
    /// テキストに一致したパターン数
    pub fn count_matches(&self, text: &str) -> usize {
        self.compiled.iter().filter(|re| re.is_match(text)).count()
    }

    pub fn total_patterns(&self) -> usize {
        self.compiled.len()
    }
}

/// 読み取り専用のブランドレジストリ（宣言順を保持）
#[derive(Debug, Clone)]
pub struct BrandRegistry {
    entries: Vec<BrandEntry>,
    index: HashMap<String, usize>,
}

lazy_static::lazy_static! {
    static ref BUILTIN: BrandRegistry = BrandRegistry::from_definitions(builtin_definitions())
        .expect("組み込みブランド定義が不正");
}

impl BrandRegistry {
    /// 組み込みレジストリ（プロセス全体で共有）
    pub fn builtin() -> &'static BrandRegistry {
        &BUILTIN
    }

    /// 定義リストから構築（宣言順 = 同点時の優先順）
    pub fn from_definitions(definitions: Vec<BrandDefinition>) -> Result<Self> {
        let mut entries = Vec::with_capacity(definitions.len());
        let mut index = HashMap::new();

        for mut definition in definitions {
            let id = definition.id.trim().to_string();
            if id.is_empty() {
                return Err(Error::Registry("ブランドIDが空です".into()));
            }
            if index.contains_key(&id) {
                return Err(Error::Registry(format!("{}: ブランドIDが重複しています", id)));
            }
            if definition.patterns.is_empty() {
                return Err(Error::Registry(format!("{}: パターンがありません", id)));
            }
            if !(0.0..=1.0).contains(&definition.base_confidence) {
                return Err(Error::Registry(format!(
                    "{}: 基礎信頼度が範囲外です ({})",
                    id, definition.base_confidence
                )));
            }

            let compiled = definition
                .patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("(?i){}", p))
                        .map_err(|e| Error::Registry(format!("{}: 不正なパターン {}: {}", id, p, e)))
                })
                .collect::<Result<Vec<_>>>()?;

            if definition.display_name.trim().is_empty() {
                definition.display_name = id.clone();
            }
            definition.id = id.clone();

            index.insert(id, entries.len());
            entries.push(BrandEntry { definition, compiled });
        }

        Ok(Self { entries, index })
    }

    /// JSON文字列（BrandDefinition配列）から構築
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<BrandDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// JSONファイルから構築
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn entries(&self) -> &[BrandEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&BrandDefinition> {
        self.index.get(id).map(|&i| &self.entries[i].definition)
    }

    /// 宣言順の位置
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn brand(
    id: &str,
    display_name: &str,
    tier: Tier,
    base_confidence: f64,
    patterns: &[&str],
    indicators: &[&str],
) -> BrandDefinition {
    BrandDefinition {
        id: id.to_string(),
        display_name: display_name.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        base_confidence,
        indicators: indicators.iter().map(|i| i.to_string()).collect(),
        tier,
    }
}

/// 組み込みブランド定義（この順序が同点時の優先順）
fn builtin_definitions() -> Vec<BrandDefinition> {
    vec![
        brand("BURBERRY", "Burberry", Tier::Luxury, 0.95,
            &[r"\bburberry\b", r"\bburberry london\b", r"\bburberrys\b", r"\bprorsum\b", r"\bnova check\b"],
            &["trench coat", "house check", "gabardine"]),
        brand("GUCCI", "Gucci", Tier::Luxury, 0.95,
            &[r"\bgucci\b", r"\bguccissima\b", r"\bgg supreme\b", r"\bhorsebit\b"],
            &["gg monogram", "web stripe", "horsebit hardware"]),
        brand("PRADA", "Prada", Tier::Luxury, 0.95,
            &[r"\bprada\b", r"\bprada milano\b", r"\bre-nylon\b", r"\bsaffiano\b"],
            &["triangle logo", "nylon", "saffiano leather"]),
        brand("LOUIS VUITTON", "Louis Vuitton", Tier::Luxury, 0.95,
            &[r"\blouis vuitton\b", r"\blv\b", r"\bdamier\b", r"\bmonogram canvas\b"],
            &["monogram canvas", "damier check", "date code"]),
        brand("CHANEL", "Chanel", Tier::Luxury, 0.95,
            &[r"\bchanel\b", r"\bchanel paris\b", r"\binterlocking cc\b"],
            &["boucle tweed", "quilted leather", "chain strap"]),
        brand("RALPH LAUREN", "Ralph Lauren", Tier::Premium, 0.85,
            &[r"\bralph lauren\b", r"\bpolo ralph lauren\b", r"\blauren ralph lauren\b", r"\brrl\b"],
            &["pony logo", "oxford shirt", "preppy"]),
        brand("BARBOUR", "Barbour", Tier::Premium, 0.9,
            &[r"\bbarbour\b", r"\bbeaufort\b", r"\bbedale\b", r"\bliddesdale\b"],
            &["wax jacket", "tartan lining", "corduroy collar"]),
        brand("OSKA", "Oska", Tier::Premium, 0.9,
            &[r"\boska\b", r"\boska design\b", r"\boska germany\b"],
            &["lagenlook", "linen", "roman numeral sizing"]),
        brand("JIGSAW", "Jigsaw", Tier::Premium, 0.85,
            &[r"\bjigsaw\b", r"\bjigsaw london\b"],
            &["tailoring", "wool coat"]),
        brand("WHISTLES", "Whistles", Tier::Premium, 0.85,
            &[r"\bwhistles\b"],
            &["contemporary", "silk blouse"]),
        brand("HOBBS", "Hobbs", Tier::Premium, 0.8,
            &[r"\bhobbs\b", r"\bhobbs london\b", r"\bhobbs nw3\b"],
            &["occasionwear", "workwear dress"]),
        brand("TOAST", "Toast", Tier::Premium, 0.8,
            &[r"\btoast\b", r"\btoast ltd\b"],
            &["artisan", "linen", "relaxed fit"]),
        brand("BODEN", "Boden", Tier::MidRange, 0.85,
            &[r"\bboden\b", r"\bmini boden\b", r"\bjohnnie b\b"],
            &["bright print", "jersey dress"]),
        brand("LEVI'S", "Levi's", Tier::MidRange, 0.9,
            &[r"\blevi'?s\b", r"\blevi strauss\b", r"\bred tab\b", r"\b50[15]\b"],
            &["denim", "red tab", "batwing logo"]),
        brand("MARKS & SPENCER", "M&S", Tier::HighStreet, 0.8,
            &[r"\bmarks (?:&|and) spencer\b", r"\bm ?& ?s\b", r"\bautograph\b", r"\bper una\b", r"\bst michael\b"],
            &["everyday basics", "st michael vintage"]),
        brand("NEXT", "Next", Tier::HighStreet, 0.6,
            &[r"\bnext\b"],
            &["high street"]),
        brand("ZARA", "Zara", Tier::HighStreet, 0.85,
            &[r"\bzara\b", r"\bzara woman\b", r"\btrf\b"],
            &["fast fashion", "trend piece"]),
        brand("H&M", "H&M", Tier::HighStreet, 0.8,
            &[r"\bh ?& ?m\b", r"\bhennes\b", r"\bdivided\b"],
            &["fast fashion", "basics"]),
        brand("PRIMARK", "Primark", Tier::HighStreet, 0.8,
            &[r"\bprimark\b", r"\batmosphere\b", r"\bcedarwood state\b"],
            &["value", "basics"]),
        brand("CARHARTT", "Carhartt", Tier::Workwear, 0.9,
            &[r"\bcarhartt\b", r"\bcarhartt wip\b", r"\bdetroit jacket\b"],
            &["duck canvas", "triple stitched", "square logo"]),
        brand("DICKIES", "Dickies", Tier::Workwear, 0.9,
            &[r"\bdickies\b", r"\b874\b", r"\bsince 1922\b"],
            &["work trousers", "twill"]),
    ]
}
