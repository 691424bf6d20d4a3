//! 出品データキャッシュモジュール
//!
//! 入力のSHA-256ハッシュをキーにして処理結果をキャッシュし、
//! 再実行時にタイトル（補助キーワードはランダム）を安定させる。

use crate::error::Result;
use garment_ai_common::{BrandDefinition, BrandRegistry, ItemInput, ProcessedItem};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

const CACHE_FILE_NAME: &str = ".listing-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 入力ハッシュ → 処理結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub sku: String,
    pub result: ProcessedItem,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（壊れている・版が違う場合は空）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, CacheFile>(reader) {
            Ok(cache) => {
                if cache.version != Self::CURRENT_VERSION {
                    warn!(found = cache.version, "キャッシュバージョン不一致、再生成します");
                    return Self::default();
                }
                cache
            }
            Err(e) => {
                warn!(error = %e, "キャッシュが読めないため破棄します");
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ false）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// キャッシュをルックアップ
    pub fn get(&self, hash: &str) -> Option<&ProcessedItem> {
        self.entries.get(hash).map(|e| &e.result)
    }

    /// キャッシュに追加
    pub fn insert(&mut self, hash: String, result: ProcessedItem) {
        self.entries.insert(hash, CacheEntry {
            sku: result.listing.sku.clone(),
            result,
        });
    }

    /// キャッシュ件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// レジストリの指紋（定義一覧のSHA-256）
///
/// `--registry` を差し替えた再実行で古い判定を返さないよう、キャッシュキーに含める。
pub fn registry_fingerprint(registry: &BrandRegistry) -> Result<String> {
    let definitions: Vec<&BrandDefinition> =
        registry.entries().iter().map(|e| &e.definition).collect();
    let serialized = serde_json::to_vec(&definitions)?;
    Ok(hex::encode(Sha256::digest(&serialized)))
}

/// 入力のハッシュ（SHA-256）
///
/// SKU が位置とバッチIDに、判定がレジストリに依存するため、すべてをキーに含める。
pub fn compute_input_hash(
    input: &ItemInput,
    registry_fingerprint: &str,
    batch_id: Option<&str>,
    index: usize,
) -> Result<String> {
    let serialized = serde_json::to_vec(input)?;

    let mut hasher = Sha256::new();
    hasher.update(&serialized);
    hasher.update(registry_fingerprint.as_bytes());
    hasher.update(batch_id.unwrap_or("").as_bytes());
    hasher.update(index.to_le_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_fingerprint() -> String {
        registry_fingerprint(BrandRegistry::builtin()).unwrap()
    }

    #[test]
    fn test_hash_is_stable() {
        let input = ItemInput::from_text("oska linen dress");
        let fp = builtin_fingerprint();
        let a = compute_input_hash(&input, &fp, Some("B1"), 0).unwrap();
        let b = compute_input_hash(&input, &fp, Some("B1"), 0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_depends_on_position_and_batch() {
        let input = ItemInput::from_text("oska linen dress");
        let fp = builtin_fingerprint();
        let base = compute_input_hash(&input, &fp, Some("B1"), 0).unwrap();
        assert_ne!(base, compute_input_hash(&input, &fp, Some("B1"), 1).unwrap());
        assert_ne!(base, compute_input_hash(&input, &fp, Some("B2"), 0).unwrap());
        assert_ne!(
            base,
            compute_input_hash(&ItemInput::from_text("oska linen top"), &fp, Some("B1"), 0).unwrap()
        );
    }

    #[test]
    fn test_registry_fingerprint() {
        assert_eq!(builtin_fingerprint(), builtin_fingerprint());

        let custom = BrandRegistry::from_json(
            r#"[{"id": "ACME", "patterns": ["\\bacme\\b"], "baseConfidence": 0.9, "tier": "mid-range"}]"#,
        )
        .unwrap();
        let custom_fp = registry_fingerprint(&custom).unwrap();
        assert_ne!(custom_fp, builtin_fingerprint());

        let input = ItemInput::from_text("acme coat");
        assert_ne!(
            compute_input_hash(&input, &builtin_fingerprint(), None, 0).unwrap(),
            compute_input_hash(&input, &custom_fp, None, 0).unwrap()
        );
    }
}
