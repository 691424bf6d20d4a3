//! Excel生成（共通ライブラリ）
//!
//! 出品一覧シートと判定根拠シートの2枚を作る。

use crate::error::{Error, Result};
use crate::pipeline::ProcessedItem;
use rust_xlsxwriter::*;

/// 出品一覧の列（見出し, 列幅）
const LISTING_COLUMNS: &[(&str, f64)] = &[
    ("SKU", 18.0),
    ("Title", 60.0),
    ("Brand", 16.0),
    ("Tier", 12.0),
    ("Condition", 12.0),
    ("Condition ID", 12.0),
    ("Price (GBP)", 11.0),
    ("Min", 9.0),
    ("Max", 9.0),
    ("Category", 48.0),
    ("Keywords", 40.0),
    ("Brand Confidence", 14.0),
    ("Description", 80.0),
];

const EVIDENCE_COLUMNS: &[(&str, f64)] = &[
    ("SKU", 18.0),
    ("Rank", 6.0),
    ("Brand", 18.0),
    ("Confidence", 11.0),
    ("Source", 10.0),
    ("Matched", 9.0),
    ("Tier", 12.0),
];

fn xlsx_err(context: &str) -> impl Fn(XlsxError) -> Error + '_ {
    move |e| Error::Export(format!("{}: {}", context, e))
}

fn write_header(worksheet: &mut Worksheet, columns: &[(&str, f64)], format: &Format) -> Result<()> {
    for (col, (title, width)) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *title, format)
            .map_err(xlsx_err("見出し書き込みエラー"))?;
        worksheet
            .set_column_width(col, *width)
            .map_err(xlsx_err("列幅設定エラー"))?;
    }
    worksheet
        .set_freeze_panes(1, 0)
        .map_err(xlsx_err("ウィンドウ枠固定エラー"))?;
    Ok(())
}

/// 出品一覧のExcelをバッファに生成
pub fn generate_listing_workbook(items: &[ProcessedItem]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));
    let text_format = Format::new()
        .set_align(FormatAlign::Top)
        .set_text_wrap();
    let price_format = Format::new()
        .set_align(FormatAlign::Top)
        .set_num_format("£#,##0.00");

    let listings = workbook.add_worksheet();
    listings
        .set_name("Listings")
        .map_err(xlsx_err("シート名設定エラー"))?;
    write_header(listings, LISTING_COLUMNS, &header_format)?;

    for (i, item) in items.iter().enumerate() {
        let row = (i + 1) as u32;
        let listing = &item.listing;
        let tier = listing.tier.map(|t| t.as_str()).unwrap_or("-");

        let texts: [(u16, &str); 6] = [
            (0, listing.sku.as_str()),
            (1, listing.ebay_title.as_str()),
            (2, listing.brand.as_str()),
            (3, tier),
            (4, listing.condition.label()),
            (9, listing.category.as_str()),
        ];
        for (col, value) in texts {
            listings
                .write_string_with_format(row, col, value, &text_format)
                .map_err(xlsx_err("値書き込みエラー"))?;
        }

        listings
            .write_number_with_format(row, 5, listing.condition_code as f64, &text_format)
            .map_err(xlsx_err("値書き込みエラー"))?;
        for (col, value) in [
            (6, listing.suggested_price),
            (7, listing.price_range.min),
            (8, listing.price_range.max),
        ] {
            listings
                .write_number_with_format(row, col, value, &price_format)
                .map_err(xlsx_err("価格書き込みエラー"))?;
        }

        listings
            .write_string_with_format(row, 10, listing.keywords.join(", "), &text_format)
            .map_err(xlsx_err("値書き込みエラー"))?;
        listings
            .write_string_with_format(row, 11, item.classification.confidence.to_string(), &text_format)
            .map_err(xlsx_err("値書き込みエラー"))?;
        listings
            .write_string_with_format(row, 12, &listing.description, &text_format)
            .map_err(xlsx_err("値書き込みエラー"))?;
    }

    let evidence = workbook.add_worksheet();
    evidence
        .set_name("Evidence")
        .map_err(xlsx_err("シート名設定エラー"))?;
    write_header(evidence, EVIDENCE_COLUMNS, &header_format)?;

    let mut row: u32 = 1;
    for item in items {
        for (rank, candidate) in item.classification.detected_brands.iter().enumerate() {
            evidence
                .write_string(row, 0, &item.listing.sku)
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            evidence
                .write_number(row, 1, (rank + 1) as f64)
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            evidence
                .write_string(row, 2, &candidate.brand)
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            evidence
                .write_number(row, 3, (candidate.confidence * 1000.0).round() / 1000.0)
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            evidence
                .write_string(row, 4, candidate.source.to_string())
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            evidence
                .write_string(
                    row,
                    5,
                    format!("{}/{}", candidate.matched_patterns, candidate.total_patterns),
                )
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            evidence
                .write_string(row, 6, candidate.tier.as_str())
                .map_err(xlsx_err("根拠書き込みエラー"))?;
            row += 1;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(xlsx_err("Excel保存エラー"))
}
