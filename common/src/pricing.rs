//! 価格推定（価格帯 × 状態の固定表、GBP）

use crate::types::{ConditionLevel, PriceRange, Tier};

pub const RANGE_MIN_FACTOR: f64 = 0.8;
pub const RANGE_MAX_FACTOR: f64 = 1.2;

/// 状態ごとの価格（NEW, EXCELLENT, VERY_GOOD, GOOD, FAIR の順）
type PriceRow = [f64; 5];

const LUXURY: PriceRow = [450.0, 320.0, 250.0, 180.0, 90.0];
const PREMIUM: PriceRow = [120.0, 85.0, 65.0, 48.0, 25.0];
const MID_RANGE: PriceRow = [60.0, 42.0, 32.0, 24.0, 12.0];
const HIGH_STREET: PriceRow = [25.0, 18.0, 14.0, 10.0, 5.0];
const WORKWEAR: PriceRow = [70.0, 50.0, 40.0, 30.0, 16.0];
/// ブランド不明時
const DEFAULT_ROW: PriceRow = [30.0, 22.0, 17.0, 12.0, 6.0];

fn price_row(tier: Option<Tier>) -> &'static PriceRow {
    match tier {
        Some(Tier::Luxury) => &LUXURY,
        Some(Tier::Premium) => &PREMIUM,
        Some(Tier::MidRange) => &MID_RANGE,
        Some(Tier::HighStreet) => &HIGH_STREET,
        Some(Tier::Workwear) => &WORKWEAR,
        None => &DEFAULT_ROW,
    }
}

fn column(condition: Option<ConditionLevel>) -> usize {
    match condition.unwrap_or(ConditionLevel::Good) {
        ConditionLevel::New => 0,
        ConditionLevel::Excellent => 1,
        ConditionLevel::VeryGood => 2,
        ConditionLevel::Good => 3,
        ConditionLevel::Fair => 4,
    }
}

/// 推奨価格。価格帯不明は既定行、状態不明は GOOD 列
pub fn suggested_price(tier: Option<Tier>, condition: Option<ConditionLevel>) -> f64 {
    price_row(tier)[column(condition)]
}

/// 価格レンジ（min = 0.8×, max = 1.2×, average = 推奨価格）
pub fn price_range(suggested: f64) -> PriceRange {
    PriceRange {
        min: round_pence(suggested * RANGE_MIN_FACTOR),
        max: round_pence(suggested * RANGE_MAX_FACTOR),
        average: suggested,
    }
}

fn round_pence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [Option<Tier>; 6] = [
        Some(Tier::Luxury),
        Some(Tier::Premium),
        Some(Tier::MidRange),
        Some(Tier::HighStreet),
        Some(Tier::Workwear),
        None,
    ];

    #[test]
    fn test_price_lookup() {
        assert_eq!(suggested_price(Some(Tier::Luxury), Some(ConditionLevel::New)), 450.0);
        assert_eq!(suggested_price(Some(Tier::Premium), Some(ConditionLevel::Good)), 48.0);
        assert_eq!(suggested_price(None, Some(ConditionLevel::Fair)), 6.0);
    }

    #[test]
    fn test_unknown_condition_uses_good() {
        assert_eq!(
            suggested_price(Some(Tier::Workwear), None),
            suggested_price(Some(Tier::Workwear), Some(ConditionLevel::Good))
        );
    }

    #[test]
    fn test_better_condition_never_cheaper() {
        for tier in TIERS {
            let prices: Vec<f64> = ConditionLevel::ALL
                .iter()
                .map(|&c| suggested_price(tier, Some(c)))
                .collect();
            assert!(prices.windows(2).all(|w| w[0] >= w[1]), "{:?}", tier);
        }
    }

    #[test]
    fn test_price_range() {
        let range = price_range(48.0);
        assert_eq!(range.min, 38.4);
        assert_eq!(range.max, 57.6);
        assert_eq!(range.average, 48.0);
        assert!(range.min <= range.average && range.average <= range.max);
    }
}
