//! 判定結果の型定義
//!
//! CLIとライブラリ利用側で共有される型:
//! - ItemInput: 1商品分の入力（テキスト断片・ラベルOCR・ヒント）
//! - ClassificationResult: 証拠統合（ブランド判定）の出力
//! - ConditionResult: 状態判定の出力
//! - ListingItem: 最終出力（出品データ）

use crate::measurements::MeasurementReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ブランドの価格帯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Luxury,
    Premium,
    MidRange,
    HighStreet,
    Workwear,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Luxury => "luxury",
            Tier::Premium => "premium",
            Tier::MidRange => "mid-range",
            Tier::HighStreet => "high-street",
            Tier::Workwear => "workwear",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "luxury" => Ok(Tier::Luxury),
            "premium" => Ok(Tier::Premium),
            "mid-range" | "midrange" => Ok(Tier::MidRange),
            "high-street" | "highstreet" => Ok(Tier::HighStreet),
            "workwear" => Ok(Tier::Workwear),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

/// 証拠の出所（優先度の高い順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Label,
    Pattern,
    Material,
    Visual,
    Sizing,
}

impl std::fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceSource::Label => write!(f, "label"),
            EvidenceSource::Pattern => write!(f, "pattern"),
            EvidenceSource::Material => write!(f, "material"),
            EvidenceSource::Visual => write!(f, "visual"),
            EvidenceSource::Sizing => write!(f, "sizing"),
        }
    }
}

/// 信頼度の3段階
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBucket {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ConfidenceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceBucket::Low => write!(f, "low"),
            ConfidenceBucket::Medium => write!(f, "medium"),
            ConfidenceBucket::High => write!(f, "high"),
        }
    }
}

/// ブランド候補（統合前は同一ブランドが複数あり得る）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandCandidate {
    pub brand: String,
    pub confidence: f64,
    pub matched_patterns: usize,
    pub total_patterns: usize,
    #[serde(default)]
    pub indicators: Vec<String>,
    pub tier: Tier,
    /// 並び替えキー（信頼度と同値、表示用に保持）
    pub raw_score: f64,
    pub source: EvidenceSource,
}

/// サイズ表記の手がかり
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingClue {
    /// サイズ体系 (roman/uk/eu/us/letter)
    pub system: String,
    pub value: String,
    pub confidence: f64,
    #[serde(default)]
    pub suggested_brands: Vec<String>,
}

/// 素材表記の手がかり
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSignature {
    pub material: String,
    #[serde(default)]
    pub percentage: Option<u8>,
    pub confidence: f64,
    #[serde(default)]
    pub suggested_brands: Vec<String>,
}

/// 柄・ロゴなど見た目の手がかり
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualPatternHit {
    pub pattern: String,
    pub confidence: f64,
    #[serde(default)]
    pub suggested_brands: Vec<String>,
}

/// 弱い証拠から示唆されたブランド（説明表示用、primaryにはならない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedBrand {
    pub brand: String,
    pub sources: Vec<EvidenceSource>,
}

/// ラベルのサイズ表記（体系ごと）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSize {
    pub system: String,
    pub values: Vec<String>,
}

/// ラベルから抽出したデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelData {
    pub brand: Option<String>,
    pub brand_confidence: f64,
    pub sizes: Vec<LabelSize>,
    /// 素材 → 混率(%)
    pub materials: BTreeMap<String, u8>,
    pub care_instructions: Vec<String>,
    pub country_of_origin: Option<String>,
    /// コード種別 → 値（各2件まで）
    pub codes: BTreeMap<String, Vec<String>>,
    pub confidence: ConfidenceBucket,
}

/// 証拠統合の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub detected_brands: Vec<BrandCandidate>,
    pub primary_brand: Option<BrandCandidate>,
    pub confidence: ConfidenceBucket,
    pub sizing_clues: Vec<SizingClue>,
    pub material_signatures: Vec<MaterialSignature>,
    pub visual_patterns: Vec<VisualPatternHit>,
    #[serde(default)]
    pub suggested_brands: Vec<SuggestedBrand>,
    #[serde(default)]
    pub label_data: Option<LabelData>,
}

/// 状態ランク（良い順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionLevel {
    New,
    Excellent,
    VeryGood,
    Good,
    Fair,
}

impl ConditionLevel {
    /// 宣言順（同点時はこの順で先勝ち）
    pub const ALL: [ConditionLevel; 5] = [
        ConditionLevel::New,
        ConditionLevel::Excellent,
        ConditionLevel::VeryGood,
        ConditionLevel::Good,
        ConditionLevel::Fair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionLevel::New => "NEW",
            ConditionLevel::Excellent => "EXCELLENT",
            ConditionLevel::VeryGood => "VERY_GOOD",
            ConditionLevel::Good => "GOOD",
            ConditionLevel::Fair => "FAIR",
        }
    }

    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ConditionLevel::New => "New with tags",
            ConditionLevel::Excellent => "Excellent",
            ConditionLevel::VeryGood => "Very Good",
            ConditionLevel::Good => "Good",
            ConditionLevel::Fair => "Fair",
        }
    }

    /// eBayのコンディションID
    pub fn ebay_code(&self) -> u16 {
        match self {
            ConditionLevel::New => 1000,
            ConditionLevel::Excellent => 2990,
            ConditionLevel::VeryGood | ConditionLevel::Good => 3000,
            ConditionLevel::Fair => 3010,
        }
    }
}

impl std::fmt::Display for ConditionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConditionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "NEW" | "NEW_WITH_TAGS" => Ok(ConditionLevel::New),
            "EXCELLENT" => Ok(ConditionLevel::Excellent),
            "VERY_GOOD" | "VERYGOOD" => Ok(ConditionLevel::VeryGood),
            "GOOD" => Ok(ConditionLevel::Good),
            "FAIR" => Ok(ConditionLevel::Fair),
            _ => Err(format!("Unknown condition: {}", s)),
        }
    }
}

/// 状態判定の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResult {
    pub condition: ConditionLevel,
    pub confidence: f64,
    pub scores: BTreeMap<ConditionLevel, f64>,
    pub description: String,
}

/// 価格レンジ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// 出品データ（生成後は変更しない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    pub sku: String,
    pub ebay_title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub condition: ConditionLevel,
    pub condition_code: u16,
    pub condition_confidence: f64,
    pub brand: String,
    pub tier: Option<Tier>,
    pub suggested_price: f64,
    pub price_range: PriceRange,
    pub category: String,
    #[serde(default)]
    pub measurements: Option<MeasurementReport>,
}

/// 商品写真（画素ではなく説明テキストのみを扱う）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoInfo {
    pub file_name: String,
    /// alt テキスト・OCR結果など
    pub text: String,
}

/// ファイル名の区切り記号（`_` `-` `.` など）を空白にする
///
/// `_` は正規表現の `\b` で単語文字扱いになるため、照合前に分ける。
pub fn file_name_words(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '%' { c } else { ' ' })
        .collect()
}

/// 1商品分の入力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemInput {
    /// ファイル名・メモ・alt テキストなどをまとめたテキスト
    pub text: String,
    /// 上流のラベルOCR結果
    pub label_text: Option<String>,
    /// 外部の画像解析による状態ヒント
    pub condition_hint: Option<String>,
    pub size: Option<String>,
    pub gender: Option<String>,
    pub photos: Vec<PhotoInfo>,
}

impl ItemInput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// 全テキスト信号を連結して小文字化
    ///
    /// ファイル名は `file_name_words` で単語に分けてから連結する。
    pub fn combined_text(&self) -> String {
        let file_names: Vec<String> = self
            .photos
            .iter()
            .map(|p| file_name_words(&p.file_name))
            .collect();

        let mut parts: Vec<&str> = Vec::new();
        parts.push(self.text.as_str());
        for (photo, file_name) in self.photos.iter().zip(&file_names) {
            parts.push(file_name.as_str());
            parts.push(photo.text.as_str());
        }
        if let Some(label) = &self.label_text {
            parts.push(label.as_str());
        }

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// 状態判定用（説明・メモ）テキスト。ラベル文言は含めない
    pub fn description_text(&self) -> String {
        let mut parts = vec![self.text.trim()];
        parts.extend(self.photos.iter().map(|p| p.text.trim()));
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
