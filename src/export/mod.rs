pub mod excel;

use crate::batch::BatchReport;
use crate::cli::ExportFormat;
use crate::error::Result;
use garment_ai_common::ProcessedItem;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// export が受け付ける結果ファイル（batch / scan / classify の出力）
#[derive(Deserialize)]
#[serde(untagged)]
enum ResultsFile {
    Report(BatchReport),
    Items(Vec<ProcessedItem>),
    Item(Box<ProcessedItem>),
}

/// 処理結果JSONを読み込む
pub fn load_results(path: &Path) -> Result<Vec<ProcessedItem>> {
    if !path.exists() {
        return Err(crate::error::GarmentAiError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let items = match serde_json::from_str::<ResultsFile>(&content)? {
        ResultsFile::Report(report) => report.items,
        ResultsFile::Items(items) => items,
        ResultsFile::Item(item) => vec![*item],
    };
    Ok(items)
}

fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.with_extension(extension)
    }
}

/// 出品一覧だけを JSON で書き出す
pub fn write_listings_json(items: &[ProcessedItem], output_path: &Path) -> Result<()> {
    let listings: Vec<_> = items.iter().map(|item| &item.listing).collect();
    let json = serde_json::to_string_pretty(&listings)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// 書き出したファイルのパスを返す
pub fn export_results(
    items: &[ProcessedItem],
    format: &ExportFormat,
    output_dir: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let output_path = output_path_for_format(output_dir, title, "xlsx");
        println!("- Excelを生成中...");
        excel::generate_excel(items, &output_path)?;
        println!("✔ Excel出力: {}", output_path.display());
        written.push(output_path);
    }

    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let output_path = output_path_for_format(output_dir, title, "json");
        println!("- JSONを生成中...");
        write_listings_json(items, &output_path)?;
        println!("✔ JSON出力: {}", output_path.display());
        written.push(output_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garment_ai_common::{process_item, BrandRegistry, ItemInput};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn processed(text: &str, index: usize) -> ProcessedItem {
        let mut rng = StdRng::seed_from_u64(7);
        process_item(&ItemInput::from_text(text), index, BrandRegistry::builtin(), Some("T1"), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_load_results_accepts_all_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let item = processed("OSKA linen dress size III", 0);

        let report = BatchReport {
            items: vec![item.clone()],
            ..Default::default()
        };
        let report_path = dir.path().join("results.json");
        std::fs::write(&report_path, serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(load_results(&report_path).unwrap()[0].listing.sku, item.listing.sku);

        let list_path = dir.path().join("items.json");
        std::fs::write(&list_path, serde_json::to_string(&vec![item.clone()]).unwrap()).unwrap();
        assert_eq!(load_results(&list_path).unwrap().len(), 1);

        let single_path = dir.path().join("listing.json");
        std::fs::write(&single_path, serde_json::to_string(&item).unwrap()).unwrap();
        assert_eq!(load_results(&single_path).unwrap()[0].listing.sku, item.listing.sku);
    }

    #[test]
    fn test_export_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![processed("OSKA linen dress", 0), processed("Barbour wax jacket", 1)];

        let written = export_results(&items, &ExportFormat::Both, dir.path(), "listings").unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));

        let json = std::fs::read_to_string(dir.path().join("listings.json")).unwrap();
        let listings: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(listings.len(), 2);
        assert!(listings[0]["sku"].as_str().unwrap().starts_with("OSK"));
    }

    #[test]
    fn test_output_path_for_format() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path_for_format(dir.path(), "listings", "xlsx"),
            dir.path().join("listings.xlsx")
        );
        assert_eq!(
            output_path_for_format(Path::new("out/sheet.xlsx"), "listings", "json"),
            PathBuf::from("out/sheet.json")
        );
    }
}
