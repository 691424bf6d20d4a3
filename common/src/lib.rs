//! Garment AI Common Library
//!
//! 古着の商品テキスト（ファイル名・メモ・alt テキスト・ラベルOCR）から
//! ブランド・状態・出品データを決定的に判定するコア。
//! CLI とライブラリ利用側で共有する。I/O はレジストリの `from_file` のみ。

pub mod error;
pub mod types;
pub mod registry;
pub mod brand_matcher;
pub mod clues;
pub mod label;
pub mod fusion;
pub mod condition;
pub mod attributes;
pub mod measurements;
pub mod pricing;
pub mod listing;
pub mod pipeline;
pub mod export;

pub use error::{Error, Result};
pub use types::{
    BrandCandidate, ClassificationResult, ConditionLevel, ConditionResult, ConfidenceBucket,
    EvidenceSource, ItemInput, LabelData, ListingItem, PhotoInfo, PriceRange, Tier,
};
pub use registry::{BrandDefinition, BrandRegistry};
pub use brand_matcher::{best_brand, match_brands};
pub use fusion::{resolve, Evidence};
pub use condition::classify_condition;
pub use label::{extract_label_data, select_label_photo};
pub use measurements::{measurement_report, MeasurementReport};
pub use listing::{generate_listing, ListingContext};
pub use pipeline::{assess_condition, classify, process_item, ProcessedItem};
