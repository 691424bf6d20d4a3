//! 採寸値の解析・検証・整形
//!
//! 入力テキストに書かれた採寸値（"pit to pit 21in", "length 110 cm",
//! `waist: 32"` など）を cm に正規化する。
//! 値の推測・補完はしない。足りない項目と範囲外の値を報告するだけ。

use crate::attributes::GarmentType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CM_PER_INCH: f64 = 2.54;

/// 採寸項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementField {
    PitToPit,
    Length,
    Shoulder,
    Sleeve,
    Waist,
    Hips,
    Inseam,
    Rise,
    Width,
    Height,
    Depth,
    Insole,
}

impl MeasurementField {
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementField::PitToPit => "Pit to pit",
            MeasurementField::Length => "Length",
            MeasurementField::Shoulder => "Shoulder",
            MeasurementField::Sleeve => "Sleeve",
            MeasurementField::Waist => "Waist",
            MeasurementField::Hips => "Hips",
            MeasurementField::Inseam => "Inside leg",
            MeasurementField::Rise => "Rise",
            MeasurementField::Width => "Width",
            MeasurementField::Height => "Height",
            MeasurementField::Depth => "Depth",
            MeasurementField::Insole => "Insole",
        }
    }

    /// 妥当とみなす範囲（cm）
    pub fn expected_range_cm(&self) -> (f64, f64) {
        match self {
            MeasurementField::PitToPit => (30.0, 90.0),
            MeasurementField::Length => (30.0, 160.0),
            MeasurementField::Shoulder => (25.0, 65.0),
            MeasurementField::Sleeve => (20.0, 90.0),
            MeasurementField::Waist => (50.0, 150.0),
            MeasurementField::Hips => (60.0, 170.0),
            MeasurementField::Inseam => (40.0, 100.0),
            MeasurementField::Rise => (15.0, 45.0),
            MeasurementField::Width => (10.0, 70.0),
            MeasurementField::Height => (5.0, 60.0),
            MeasurementField::Depth => (2.0, 35.0),
            MeasurementField::Insole => (18.0, 35.0),
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.to_lowercase();
        let field = match alias.as_str() {
            "pit to pit" | "p2p" | "armpit to armpit" | "chest" | "bust" => MeasurementField::PitToPit,
            "length" | "total length" => MeasurementField::Length,
            "shoulder" | "shoulders" => MeasurementField::Shoulder,
            "sleeve" | "sleeves" => MeasurementField::Sleeve,
            "waist" => MeasurementField::Waist,
            "hips" | "hip" => MeasurementField::Hips,
            "inside leg" | "inseam" | "leg" => MeasurementField::Inseam,
            "rise" => MeasurementField::Rise,
            "width" => MeasurementField::Width,
            "height" => MeasurementField::Height,
            "depth" => MeasurementField::Depth,
            "insole" => MeasurementField::Insole,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 入力時の単位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Inch,
    Cm,
}

/// 採寸値（cm に正規化済み）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub field: MeasurementField,
    pub value_cm: f64,
    pub unit: Unit,
    /// 元の表記
    pub raw: String,
}

impl Measurement {
    pub fn inches(&self) -> f64 {
        self.value_cm / CM_PER_INCH
    }

    pub fn in_range(&self) -> bool {
        let (min, max) = self.field.expected_range_cm();
        (min..=max).contains(&self.value_cm)
    }
}

/// 検証結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementReport {
    pub garment_type: Option<GarmentType>,
    pub measurements: Vec<Measurement>,
    pub missing: Vec<MeasurementField>,
    pub out_of_range: Vec<MeasurementField>,
    /// 出品文用の整形済み行
    pub formatted: Vec<String>,
}

impl MeasurementReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.out_of_range.is_empty()
    }
}

/// 衣類種別ごとの必須採寸項目
pub fn required_fields(garment: GarmentType) -> &'static [MeasurementField] {
    use MeasurementField::*;
    match garment {
        GarmentType::Dress => &[PitToPit, Length],
        GarmentType::Coat | GarmentType::Jacket => &[PitToPit, Length, Shoulder, Sleeve],
        GarmentType::Jeans | GarmentType::Trousers => &[Waist, Inseam, Rise],
        GarmentType::Skirt => &[Waist, Length],
        GarmentType::Knitwear | GarmentType::Shirt | GarmentType::Top => &[PitToPit, Length, Sleeve],
        GarmentType::Bag => &[Width, Height, Depth],
        GarmentType::Shoes => &[Insole],
    }
}

lazy_static::lazy_static! {
    static ref MEASUREMENT_RE: Regex = Regex::new(
        r#"(?i)\b(pit to pit|armpit to armpit|p2p|chest|bust|total length|length|shoulders?|sleeves?|waist|hips?|inside leg|inseam|leg|rise|width|height|depth|insole)\s*[:=\-]?\s*(\d+(?:\.\d+)?)\s*(cm\b|inches\b|inch\b|in\b|"|”|'')?"#
    ).unwrap();
}

/// テキストから採寸値を抽出（同じ項目は最初の値を採用）
///
/// 単位の無い値はインチとして扱う。
pub fn parse_measurements(text: &str) -> Vec<Measurement> {
    let mut measurements: Vec<Measurement> = Vec::new();

    for cap in MEASUREMENT_RE.captures_iter(text) {
        let Some(field) = MeasurementField::from_alias(&cap[1]) else {
            continue;
        };
        if measurements.iter().any(|m| m.field == field) {
            continue;
        }
        let Ok(value) = cap[2].parse::<f64>() else {
            continue;
        };

        let unit = match cap.get(3).map(|m| m.as_str().to_lowercase()) {
            Some(u) if u == "cm" => Unit::Cm,
            _ => Unit::Inch,
        };
        let value_cm = match unit {
            Unit::Cm => value,
            Unit::Inch => value * CM_PER_INCH,
        };

        measurements.push(Measurement {
            field,
            value_cm,
            unit,
            raw: cap[0].trim().to_string(),
        });
    }

    measurements
}

/// インチは0.5刻み、cmは整数に丸める
fn format_inches(inches: f64) -> String {
    let rounded = (inches * 2.0).round() / 2.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

/// UK表記に整形する（例: `Pit to pit: 21" (53 cm)`）
pub fn format_measurement(measurement: &Measurement) -> String {
    format!(
        "{}: {}\" ({:.0} cm)",
        measurement.field.label(),
        format_inches(measurement.inches()),
        measurement.value_cm.round()
    )
}

/// 採寸値を検証して報告を作る
pub fn validate_measurements(
    garment: Option<GarmentType>,
    measurements: Vec<Measurement>,
) -> MeasurementReport {
    let missing = garment
        .map(required_fields)
        .unwrap_or(&[])
        .iter()
        .filter(|field| !measurements.iter().any(|m| m.field == **field))
        .copied()
        .collect();

    let out_of_range = measurements
        .iter()
        .filter(|m| !m.in_range())
        .map(|m| m.field)
        .collect();

    let formatted = measurements.iter().map(format_measurement).collect();

    MeasurementReport {
        garment_type: garment,
        measurements,
        missing,
        out_of_range,
        formatted,
    }
}

/// テキストに採寸値が無ければ None
pub fn measurement_report(text: &str, garment: Option<GarmentType>) -> Option<MeasurementReport> {
    let measurements = parse_measurements(text);
    if measurements.is_empty() {
        return None;
    }
    Some(validate_measurements(garment, measurements))
}
