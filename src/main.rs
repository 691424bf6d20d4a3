use clap::Parser;
use garment_ai_common::attributes::GarmentType;
use garment_ai_common::{measurement_report, process_item, BrandRegistry, ItemInput, ProcessedItem};
use garment_ai_rust::batch::{self, BatchOptions, CacheFile};
use garment_ai_rust::cli::{Cli, Commands};
use garment_ai_rust::config::Config;
use garment_ai_rust::error::Result;
use garment_ai_rust::{export, logging, scanner};
use std::path::{Path, PathBuf};
use tracing::info;

/// --registry > 設定ファイル > 組み込み
fn load_custom_registry(cli_path: Option<&Path>, config: &Config) -> Result<Option<BrandRegistry>> {
    match cli_path.or(config.registry_path.as_deref()) {
        Some(path) => {
            let registry = BrandRegistry::from_file(path)?;
            info!(path = %path.display(), brands = registry.len(), "独自レジストリを読み込み");
            Ok(Some(registry))
        }
        None => Ok(None),
    }
}

fn print_summary(item: &ProcessedItem, currency: &str) {
    let listing = &item.listing;
    println!("  SKU:      {}", listing.sku);
    println!("  タイトル: {}", listing.ebay_title);
    println!(
        "  ブランド: {} ({})",
        listing.brand, item.classification.confidence
    );
    println!(
        "  状態:     {} ({:.0}%)",
        listing.condition.label(),
        listing.condition_confidence * 100.0
    );
    println!(
        "  価格:     {c}{:.2} ({c}{:.2} - {c}{:.2})",
        listing.suggested_price,
        listing.price_range.min,
        listing.price_range.max,
        c = currency
    );
}

fn write_json<T: serde::Serialize>(value: &T, output: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(output, json)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let mut config = Config::load()?;

    let custom_registry = load_custom_registry(cli.registry.as_deref(), &config)?;
    let registry = custom_registry
        .as_ref()
        .unwrap_or_else(|| BrandRegistry::builtin());

    match cli.command {
        Commands::Classify { text, label, condition_hint, size, gender, batch_id, output } => {
            let input = ItemInput {
                text,
                label_text: label,
                condition_hint,
                size,
                gender,
                photos: Vec::new(),
            };
            let batch_id = batch_id.or_else(|| config.batch_id());
            let item = process_item(&input, 0, registry, batch_id.as_deref(), &mut rand::thread_rng())?;

            match output {
                Some(path) => {
                    write_json(&item, &path)?;
                    println!("👗 garment-ai - 判定\n");
                    print_summary(&item, &config.currency_symbol());
                    println!("\n✔ 結果を保存: {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&item)?),
            }
        }

        Commands::Scan { folder, condition_hint, batch_id, output } => {
            println!("👗 garment-ai - フォルダ判定\n");

            println!("[1/2] 写真をスキャン中...");
            let mut input = scanner::scan_item(&folder)?;
            input.condition_hint = condition_hint;
            println!("✔ {}枚の写真を検出\n", input.photos.len());

            println!("[2/2] 判定中...");
            let batch_id = batch_id.or_else(|| config.batch_id());
            let item = process_item(&input, 0, registry, batch_id.as_deref(), &mut rand::thread_rng())?;
            print_summary(&item, &config.currency_symbol());

            let output = output.unwrap_or_else(|| folder.join("listing.json"));
            write_json(&item, &output)?;
            println!("\n✔ 結果を保存: {}", output.display());
        }

        Commands::Batch { input, output, batch_id, jobs, use_cache } => {
            println!("👗 garment-ai - 一括処理\n");

            println!("[1/3] 入力を読み込み中...");
            let inputs = batch::load_inputs(&input)?;
            println!("✔ {}件の商品\n", inputs.len());

            let output = output.unwrap_or_else(|| {
                input
                    .parent()
                    .map(|p| p.join("results.json"))
                    .unwrap_or_else(|| PathBuf::from("results.json"))
            });
            // キャッシュは出力ファイルと同じフォルダに置く
            let cache_dir = output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));

            let options = BatchOptions {
                batch_id: batch_id.or_else(|| config.batch_id()),
                worker_threads: jobs.unwrap_or(config.worker_threads),
                show_progress: true,
            };

            println!("[2/3] 処理中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let report = if use_cache {
                let mut cache = CacheFile::load(&cache_dir);
                let report = batch::run_batch(&inputs, registry, &options, Some(&mut cache))?;
                cache.save(&cache_dir)?;
                report
            } else {
                batch::run_batch(&inputs, registry, &options, None)?
            };
            println!(
                "✔ {}件成功 / {}件失敗{}\n",
                report.items.len(),
                report.failures.len(),
                if use_cache { format!(" (キャッシュ {}件)", report.cache_hits) } else { String::new() }
            );
            for failure in &report.failures {
                println!("  ⚠ #{}: {}", failure.index + 1, failure.message);
            }

            println!("[3/3] 結果を保存中...");
            write_json(&report, &output)?;
            println!("✔ 結果を保存: {}", output.display());

            println!("\n✅ 一括処理完了");
        }

        Commands::Export { input, format, output, title } => {
            println!("📄 garment-ai - エクスポート\n");

            let items = export::load_results(&input)?;
            println!("✔ {}件の出品データ\n", items.len());

            let output_dir = output.unwrap_or_else(|| {
                input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            });
            export::export_results(&items, &format, &output_dir, &title)?;

            println!("\n✅ エクスポート完了");
        }

        Commands::Measure { text, garment_type } => {
            let garment = garment_type.as_deref().map(str::parse::<GarmentType>).transpose()?;

            match measurement_report(&text, garment) {
                Some(report) => {
                    println!("📏 採寸\n");
                    for line in &report.formatted {
                        println!("  {}", line);
                    }
                    if !report.missing.is_empty() {
                        let missing: Vec<&str> = report.missing.iter().map(|f| f.label()).collect();
                        println!("\n  ⚠ 不足: {}", missing.join(", "));
                    }
                    if !report.out_of_range.is_empty() {
                        let outliers: Vec<&str> =
                            report.out_of_range.iter().map(|f| f.label()).collect();
                        println!("  ⚠ 範囲外: {}", outliers.join(", "));
                    }
                    if report.is_complete() {
                        println!("\n✔ 採寸OK");
                    }
                }
                None => println!("採寸値が見つかりません"),
            }
        }

        Commands::Config { set_batch_id, set_registry, show } => {
            if let Some(id) = set_batch_id {
                config.set_batch_id(id)?;
                println!("✔ バッチIDを設定しました");
            }

            if let Some(path) = set_registry {
                // 保存前に読めることを確認
                BrandRegistry::from_file(&path)?;
                config.set_registry_path(path)?;
                println!("✔ ブランドレジストリを設定しました");
            }

            if show {
                println!("設定ファイル: {}", Config::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));

            if clear {
                if CacheFile::clear(&target)? {
                    println!("✔ キャッシュを削除しました: {}", CacheFile::cache_path(&target).display());
                } else {
                    println!("キャッシュファイルがありません");
                }
            }

            if info {
                let cache_path = CacheFile::cache_path(&target);
                if cache_path.exists() {
                    let cache = CacheFile::load(&target);
                    let size = std::fs::metadata(&cache_path).map(|m| m.len()).unwrap_or(0);
                    println!("キャッシュ: {}", cache_path.display());
                    println!("  エントリ数: {}", cache.len());
                    println!("  サイズ: {} bytes", size);
                } else {
                    println!("キャッシュファイルがありません");
                }
            }
        }
    }

    Ok(())
}
