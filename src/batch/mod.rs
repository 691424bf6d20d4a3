//! 一括処理
//!
//! JSON / Excel から商品入力を読み、rayon で並列に処理する。
//! 完了順は任意だが、結果は入力の位置で並べ直して返す。

pub mod cache;

pub use cache::{compute_input_hash, registry_fingerprint, CacheFile};

use crate::error::{GarmentAiError, Result};
use calamine::{open_workbook, Reader, Xlsx};
use garment_ai_common::{process_item, BrandRegistry, ItemInput, PhotoInfo, ProcessedItem};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// 一括処理の設定
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub batch_id: Option<String>,
    /// 0 = rayon の既定スレッド数
    pub worker_threads: usize,
    pub show_progress: bool,
}

/// 処理できなかった商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub index: usize,
    pub message: String,
}

/// 一括処理の結果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub items: Vec<ProcessedItem>,
    pub failures: Vec<BatchFailure>,
    #[serde(default)]
    pub cache_hits: usize,
}

/// 入力ファイルを読む（.json: ItemInput の配列、.xlsx: 1行1商品）
pub fn load_inputs(path: &Path) -> Result<Vec<ItemInput>> {
    if !path.exists() {
        return Err(GarmentAiError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "json" => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        "xlsx" => load_xlsx_inputs(path),
        other => Err(GarmentAiError::InvalidBatchInput(format!(
            "未対応の拡張子: {}",
            other
        ))),
    }
}

/// 見出し名を正規化（"Label Text" → "labeltext"）
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn optional(row: &HashMap<String, String>, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

/// 1行を ItemInput に変換
///
/// `photos` 列はファイル名をセミコロン区切りで並べる。
fn row_to_input(row: &HashMap<String, String>) -> ItemInput {
    let photos = row
        .get("photos")
        .map(|v| {
            v.split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| PhotoInfo {
                    file_name: name.to_string(),
                    text: String::new(),
                })
                .collect()
        })
        .unwrap_or_default();

    ItemInput {
        text: row.get("text").cloned().unwrap_or_default(),
        label_text: optional(row, "labeltext"),
        condition_hint: optional(row, "conditionhint"),
        size: optional(row, "size"),
        gender: optional(row, "gender"),
        photos,
    }
}

fn load_xlsx_inputs(path: &Path) -> Result<Vec<ItemInput>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| GarmentAiError::ExcelRead(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| GarmentAiError::ExcelRead("シートがありません".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| GarmentAiError::ExcelRead(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| GarmentAiError::ExcelRead("見出し行がありません".to_string()))?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_header(&cell.to_string()))
        .collect();

    if !headers.iter().any(|h| h == "text") {
        return Err(GarmentAiError::InvalidBatchInput(
            "text 列がありません".to_string(),
        ));
    }

    let mut inputs = Vec::new();
    for data_row in rows {
        let row: HashMap<String, String> = data_row
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| {
                headers
                    .get(col)
                    .map(|h| (h.clone(), cell.to_string().trim().to_string()))
            })
            .collect();

        // 完全に空の行は飛ばす
        if row.values().all(|v| v.is_empty()) {
            continue;
        }
        inputs.push(row_to_input(&row));
    }

    Ok(inputs)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb
}

/// 並列に処理する
///
/// `cache` を渡すとヒットした商品は再処理せず、新しい結果を書き足す。
pub fn run_batch(
    inputs: &[ItemInput],
    registry: &BrandRegistry,
    options: &BatchOptions,
    cache: Option<&mut CacheFile>,
) -> Result<BatchReport> {
    let batch_id = options.batch_id.as_deref();

    // キャッシュ照合は逐次（キャッシュは共有しない）
    let fingerprint = registry_fingerprint(registry)?;
    let mut cached: Vec<ProcessedItem> = Vec::new();
    let mut pending: Vec<(usize, String)> = Vec::new();
    for (index, input) in inputs.iter().enumerate() {
        let hash = compute_input_hash(input, &fingerprint, batch_id, index)?;
        match cache.as_deref().and_then(|c| c.get(&hash)) {
            Some(hit) => cached.push(hit.clone()),
            None => pending.push((index, hash)),
        }
    }
    let cache_hits = cached.len();

    let pb = progress_bar(pending.len(), options.show_progress);

    let work = || {
        pending
            .par_iter()
            .map(|(index, hash)| {
                let mut rng = rand::thread_rng();
                let result = process_item(&inputs[*index], *index, registry, batch_id, &mut rng);
                pb.inc(1);
                (*index, hash.clone(), result)
            })
            .collect::<Vec<_>>()
    };

    let outcomes = if options.worker_threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.worker_threads)
            .build()
            .map_err(|e| GarmentAiError::Config(format!("スレッドプール作成エラー: {}", e)))?;
        pool.install(work)
    } else {
        work()
    };
    pb.finish_and_clear();

    let mut report = BatchReport {
        items: cached,
        failures: Vec::new(),
        cache_hits,
    };

    let mut cache = cache;
    for (index, hash, outcome) in outcomes {
        match outcome {
            Ok(item) => {
                if let Some(cache) = cache.as_deref_mut() {
                    cache.insert(hash, item.clone());
                }
                report.items.push(item);
            }
            Err(e) => {
                warn!(index, error = %e, "商品を処理できませんでした");
                report.failures.push(BatchFailure {
                    index,
                    message: e.to_string(),
                });
            }
        }
    }

    report.items.sort_by_key(|item| item.index);
    report.failures.sort_by_key(|f| f.index);

    info!(
        processed = report.items.len(),
        failed = report.failures.len(),
        cache_hits = report.cache_hits,
        "一括処理完了"
    );
    Ok(report)
}
