//! Excel生成（CLI版）
//!
//! シートの組み立ては共通ライブラリの excel_core に任せ、ここではファイルに書くだけ。

use crate::error::{GarmentAiError, Result};
use garment_ai_common::export::excel_core::generate_listing_workbook;
use garment_ai_common::ProcessedItem;
use std::path::Path;

pub fn generate_excel(items: &[ProcessedItem], output_path: &Path) -> Result<()> {
    let buffer = generate_listing_workbook(items)
        .map_err(|e| GarmentAiError::ExcelGeneration(e.to_string()))?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
