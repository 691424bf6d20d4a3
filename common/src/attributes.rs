//! 商品属性の検出（種類・色・性別・季節・スタイル）
//!
//! タイトルのプレースホルダとカテゴリ文字列に使う。
//! いずれも語彙表による文字列一致のみ。

use crate::error::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// 衣類の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentType {
    Dress,
    Coat,
    Jacket,
    Jeans,
    Trousers,
    Skirt,
    Knitwear,
    Shirt,
    Top,
    Bag,
    Shoes,
}

impl GarmentType {
    pub const ALL: [GarmentType; 11] = [
        GarmentType::Dress,
        GarmentType::Coat,
        GarmentType::Jacket,
        GarmentType::Jeans,
        GarmentType::Trousers,
        GarmentType::Skirt,
        GarmentType::Knitwear,
        GarmentType::Shirt,
        GarmentType::Top,
        GarmentType::Bag,
        GarmentType::Shoes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentType::Dress => "dress",
            GarmentType::Coat => "coat",
            GarmentType::Jacket => "jacket",
            GarmentType::Jeans => "jeans",
            GarmentType::Trousers => "trousers",
            GarmentType::Skirt => "skirt",
            GarmentType::Knitwear => "knitwear",
            GarmentType::Shirt => "shirt",
            GarmentType::Top => "top",
            GarmentType::Bag => "bag",
            GarmentType::Shoes => "shoes",
        }
    }

    /// タイトル用の名詞
    pub fn noun(&self) -> &'static str {
        match self {
            GarmentType::Dress => "Dress",
            GarmentType::Coat => "Coat",
            GarmentType::Jacket => "Jacket",
            GarmentType::Jeans => "Jeans",
            GarmentType::Trousers => "Trousers",
            GarmentType::Skirt => "Skirt",
            GarmentType::Knitwear => "Jumper",
            GarmentType::Shirt => "Shirt",
            GarmentType::Top => "Top",
            GarmentType::Bag => "Bag",
            GarmentType::Shoes => "Shoes",
        }
    }

    /// eBayカテゴリの末端名
    fn category_leaf(&self) -> &'static str {
        match self {
            GarmentType::Dress => "Dresses",
            GarmentType::Coat | GarmentType::Jacket => "Coats, Jackets & Waistcoats",
            GarmentType::Jeans => "Jeans",
            GarmentType::Trousers => "Trousers",
            GarmentType::Skirt => "Skirts",
            GarmentType::Knitwear => "Jumpers & Cardigans",
            GarmentType::Shirt | GarmentType::Top => "Tops & Shirts",
            GarmentType::Bag => "Bags & Handbags",
            GarmentType::Shoes => "Shoes",
        }
    }
}

impl fmt::Display for GarmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GarmentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        GarmentType::ALL
            .iter()
            .find(|t| t.as_str() == normalized)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("未知の衣類種別: {}", s)))
    }
}

/// 対象の性別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Womens,
    Mens,
    Unisex,
}

impl Gender {
    /// タイトル用の表記
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Womens => "Women's",
            Gender::Mens => "Men's",
            Gender::Unisex => "Unisex",
        }
    }

    fn department(&self) -> &'static str {
        match self {
            Gender::Womens => "Women",
            Gender::Mens => "Men",
            Gender::Unisex => "Unisex Clothing, Shoes & Accs",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('\'', "").as_str() {
            "women" | "womens" | "woman" | "ladies" | "female" | "f" | "w" => Ok(Gender::Womens),
            "men" | "mens" | "man" | "gents" | "male" | "m" => Ok(Gender::Mens),
            "unisex" | "u" => Ok(Gender::Unisex),
            other => Err(Error::InvalidInput(format!("未知の性別: {}", other))),
        }
    }
}

/// テキストから検出した属性一式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAttributes {
    pub garment_type: Option<GarmentType>,
    pub gender: Gender,
    pub colour: Option<String>,
    pub season: Option<String>,
    pub styles: Vec<String>,
}

fn compile(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
}

lazy_static::lazy_static! {
    static ref GARMENT_VOCABULARY: Vec<(GarmentType, Regex)> = vec![
        (GarmentType::Jeans, &["jeans", "jean", "denims"][..]),
        (GarmentType::Dress, &["dress", "gown", "pinafore", "kaftan"][..]),
        (GarmentType::Coat, &["coat", "trench", "parka", "overcoat", "mac", "raincoat"][..]),
        (GarmentType::Jacket, &["jacket", "blazer", "gilet", "bomber"][..]),
        (GarmentType::Trousers, &["trousers", "chinos", "pants", "culottes", "joggers"][..]),
        (GarmentType::Skirt, &["skirt"][..]),
        (GarmentType::Knitwear, &["jumper", "sweater", "cardigan", "knit", "pullover"][..]),
        (GarmentType::Shirt, &["shirt", "blouse"][..]),
        (GarmentType::Top, &["top", "t-shirt", "tee", "tunic", "camisole"][..]),
        (GarmentType::Bag, &["bag", "handbag", "tote", "clutch", "purse", "backpack"][..]),
        (GarmentType::Shoes, &["shoes", "boots", "trainers", "heels", "sandals", "loafers"][..]),
    ]
    .into_iter()
    .map(|(t, words)| (t, compile(words)))
    .collect();

    static ref COLOUR_VOCABULARY: Vec<(&'static str, Regex)> = vec![
        ("Black", &["black"][..]),
        ("White", &["white"][..]),
        ("Cream", &["cream", "ivory", "ecru"][..]),
        ("Navy", &["navy"][..]),
        ("Blue", &["blue", "denim blue"][..]),
        ("Red", &["red", "scarlet"][..]),
        ("Burgundy", &["burgundy", "wine", "maroon"][..]),
        ("Pink", &["pink", "blush"][..]),
        ("Green", &["green", "sage", "mint green"][..]),
        ("Khaki", &["khaki", "olive"][..]),
        ("Grey", &["grey", "gray", "charcoal"][..]),
        ("Brown", &["brown", "chocolate"][..]),
        ("Camel", &["camel", "tan"][..]),
        ("Beige", &["beige", "stone", "oatmeal"][..]),
        ("Yellow", &["yellow", "mustard"][..]),
        ("Orange", &["orange", "rust"][..]),
        ("Purple", &["purple", "lilac", "plum"][..]),
        ("Multicoloured", &["multicoloured", "multicolored", "multi"][..]),
    ]
    .into_iter()
    .map(|(name, words)| (name, compile(words)))
    .collect();

    static ref SEASON_VOCABULARY: Vec<(&'static str, Regex)> = vec![
        ("Spring", compile(&["spring"])),
        ("Summer", compile(&["summer"])),
        ("Autumn", compile(&["autumn", "fall"])),
        ("Winter", compile(&["winter"])),
    ];

    static ref SUMMER_FABRIC_RE: Regex = compile(&["linen", "seersucker", "cheesecloth"]);
    static ref WINTER_FABRIC_RE: Regex = compile(&["wool", "cashmere", "tweed", "shearling", "fleece"]);

    static ref STYLE_VOCABULARY: Vec<(&'static str, Regex)> = vec![
        ("Lagenlook", "lagenlook"),
        ("Boho", "boho"),
        ("Vintage", "vintage"),
        ("Oversized", "oversized"),
        ("Minimalist", "minimalist"),
        ("Classic", "classic"),
        ("Casual", "casual"),
        ("Tailored", "tailored"),
        ("Quilted", "quilted"),
        ("Wrap", "wrap"),
        ("Maxi", "maxi"),
        ("Midi", "midi"),
        ("Mini", "mini"),
        ("A-Line", "a-line"),
        ("Cropped", "cropped"),
        ("Relaxed", "relaxed"),
    ]
    .into_iter()
    .map(|(name, word)| (name, compile(&[word])))
    .collect();

    static ref UNISEX_RE: Regex = compile(&["unisex"]);
    static ref WOMENS_RE: Regex = compile(&["women's", "womens", "women", "ladies", "female"]);
    static ref MENS_RE: Regex = compile(&["men's", "mens", "men", "gents", "male"]);
}

/// 語彙表のうち、テキスト中で最も早く現れたもの（同じ位置なら宣言順）
fn earliest<T: Copy>(text: &str, vocabulary: &[(T, Regex)]) -> Option<T> {
    vocabulary
        .iter()
        .filter_map(|(value, re)| re.find(text).map(|m| (m.start(), *value)))
        .min_by_key(|(start, _)| *start)
        .map(|(_, value)| value)
}

pub fn detect_garment_type(text: &str) -> Option<GarmentType> {
    earliest(text, GARMENT_VOCABULARY.as_slice())
}

pub fn detect_colour(text: &str) -> Option<String> {
    earliest(text, COLOUR_VOCABULARY.as_slice()).map(str::to_string)
}

/// 性別: 指定 > 検出 > 既定（Women's）
pub fn detect_gender(text: &str, override_value: Option<&str>) -> Gender {
    if let Some(value) = override_value.filter(|v| !v.trim().is_empty()) {
        match value.parse::<Gender>() {
            Ok(gender) => return gender,
            Err(e) => debug!(error = %e, "性別指定を無視"),
        }
    }

    if UNISEX_RE.is_match(text) {
        Gender::Unisex
    } else if WOMENS_RE.is_match(text) {
        Gender::Womens
    } else if MENS_RE.is_match(text) {
        Gender::Mens
    } else {
        Gender::default()
    }
}

/// 季節: 明示語を優先し、無ければ素材から推定
pub fn detect_season(text: &str) -> Option<String> {
    if let Some(season) = earliest(text, SEASON_VOCABULARY.as_slice()) {
        return Some(season.to_string());
    }
    if SUMMER_FABRIC_RE.is_match(text) {
        Some("Summer".to_string())
    } else if WINTER_FABRIC_RE.is_match(text) {
        Some("Winter".to_string())
    } else {
        None
    }
}

pub fn detect_styles(text: &str) -> Vec<String> {
    STYLE_VOCABULARY
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// 属性をまとめて検出
pub fn detect_attributes(text: &str, gender_override: Option<&str>) -> ItemAttributes {
    ItemAttributes {
        garment_type: detect_garment_type(text),
        gender: detect_gender(text, gender_override),
        colour: detect_colour(text),
        season: detect_season(text),
        styles: detect_styles(text),
    }
}

/// eBayのパンくず形式のカテゴリ
///
/// 例: `Clothes, Shoes & Accessories > Women > Women's Clothing > Dresses`
pub fn category_path(garment: Option<GarmentType>, gender: Gender) -> String {
    let root = "Clothes, Shoes & Accessories";
    let department = gender.department();

    match (garment, gender) {
        (_, Gender::Unisex) => format!("{} > {}", root, department),
        (Some(GarmentType::Bag), g) => format!("{} > {} > {} Bags & Handbags", root, department, g.as_str()),
        (Some(GarmentType::Shoes), g) => format!("{} > {} > {} Shoes", root, department, g.as_str()),
        (Some(t), g) => format!(
            "{} > {} > {} Clothing > {}",
            root,
            department,
            g.as_str(),
            t.category_leaf()
        ),
        (None, g) => format!("{} > {} > {} Clothing", root, department, g.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_garment_type() {
        assert_eq!(detect_garment_type("oska linen dress"), Some(GarmentType::Dress));
        assert_eq!(detect_garment_type("burberry trench coat"), Some(GarmentType::Coat));
        assert_eq!(detect_garment_type("levi's 501 jeans"), Some(GarmentType::Jeans));
        assert_eq!(detect_garment_type("wool cardigan"), Some(GarmentType::Knitwear));
        assert_eq!(detect_garment_type("plain item"), None);
    }

    #[test]
    fn test_earliest_mention_wins() {
        // "t-shirt" の中の "shirt" より先に "t-shirt" が現れる
        assert_eq!(detect_garment_type("striped t-shirt"), Some(GarmentType::Top));
        assert_eq!(detect_garment_type("jacket to wear over a dress"), Some(GarmentType::Jacket));
    }

    #[test]
    fn test_detect_colour() {
        assert_eq!(detect_colour("navy and white stripe"), Some("Navy".to_string()));
        assert_eq!(detect_colour("gray wool"), Some("Grey".to_string()));
        assert_eq!(detect_colour("linen dress"), None);
    }

    #[test]
    fn test_gender_priority() {
        assert_eq!(detect_gender("mens waxed jacket", Some("ladies")), Gender::Womens);
        assert_eq!(detect_gender("mens waxed jacket", None), Gender::Mens);
        assert_eq!(detect_gender("women's dress", None), Gender::Womens);
        assert_eq!(detect_gender("waxed jacket", None), Gender::Womens);
        assert_eq!(detect_gender("mens jacket", Some("???")), Gender::Mens);
    }

    #[test]
    fn test_detect_season() {
        assert_eq!(detect_season("summer dress"), Some("Summer".to_string()));
        assert_eq!(detect_season("linen top"), Some("Summer".to_string()));
        assert_eq!(detect_season("cashmere jumper"), Some("Winter".to_string()));
        assert_eq!(detect_season("cotton shirt"), None);
    }

    #[test]
    fn test_detect_styles_in_vocabulary_order() {
        let styles = detect_styles("oversized lagenlook midi dress");
        assert_eq!(styles, vec!["Lagenlook", "Oversized", "Midi"]);
    }

    #[test]
    fn test_category_path() {
        assert_eq!(
            category_path(Some(GarmentType::Dress), Gender::Womens),
            "Clothes, Shoes & Accessories > Women > Women's Clothing > Dresses"
        );
        assert_eq!(
            category_path(Some(GarmentType::Bag), Gender::Womens),
            "Clothes, Shoes & Accessories > Women > Women's Bags & Handbags"
        );
        assert_eq!(
            category_path(None, Gender::Mens),
            "Clothes, Shoes & Accessories > Men > Men's Clothing"
        );
    }

    #[test]
    fn test_garment_type_from_str() {
        assert_eq!("Knitwear".parse::<GarmentType>().unwrap(), GarmentType::Knitwear);
        assert!("hat".parse::<GarmentType>().is_err());
    }
}
