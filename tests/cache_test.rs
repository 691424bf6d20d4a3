//! キャッシュ機能テスト
//!
//! 出品データキャッシュの動作を検証

use garment_ai_common::{process_item, BrandRegistry, ItemInput};
use garment_ai_rust::batch::{
    compute_input_hash, registry_fingerprint, run_batch, BatchOptions, CacheFile,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn sample_inputs() -> Vec<ItemInput> {
    vec![
        ItemInput::from_text("OSKA linen dress size III"),
        ItemInput::from_text("Barbour waxed cotton jacket excellent condition"),
    ]
}

/// 空のキャッシュファイル
#[test]
fn test_cache_file_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = CacheFile::load(dir.path());

    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
}

/// キャッシュの保存と読み込み
#[test]
fn test_cache_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = ItemInput::from_text("OSKA linen dress size III");
    let mut rng = StdRng::seed_from_u64(1);
    let item = process_item(&input, 0, BrandRegistry::builtin(), Some("B1"), &mut rng)
        .expect("処理失敗");

    let fingerprint = registry_fingerprint(BrandRegistry::builtin()).expect("指紋計算失敗");
    let hash = compute_input_hash(&input, &fingerprint, Some("B1"), 0).expect("ハッシュ計算失敗");
    let mut cache = CacheFile::load(dir.path());
    cache.insert(hash.clone(), item.clone());
    cache.save(dir.path()).expect("キャッシュ保存失敗");

    let loaded = CacheFile::load(dir.path());
    assert_eq!(loaded.len(), 1);
    let cached = loaded.get(&hash).expect("キャッシュにない");
    assert_eq!(cached.listing.sku, item.listing.sku);
    assert_eq!(cached.listing.ebay_title, item.listing.ebay_title);
    assert!(loaded.get("unknown").is_none());
}

/// 壊れたキャッシュは空として扱う
#[test]
fn test_corrupt_cache_is_ignored() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(CacheFile::cache_path(dir.path()), "{ not json").unwrap();

    let cache = CacheFile::load(dir.path());
    assert!(cache.is_empty());
}

/// バージョン違いのキャッシュは破棄
#[test]
fn test_cache_version_mismatch() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(
        CacheFile::cache_path(dir.path()),
        r#"{"version": 99, "entries": {}}"#,
    )
    .unwrap();

    assert!(CacheFile::load(dir.path()).is_empty());
}

/// キャッシュの削除
#[test]
fn test_cache_clear() {
    let dir = tempdir().expect("Failed to create temp dir");
    assert!(!CacheFile::clear(dir.path()).unwrap());

    CacheFile::load(dir.path()).save(dir.path()).unwrap();
    assert!(CacheFile::cache_path(dir.path()).exists());
    assert!(CacheFile::clear(dir.path()).unwrap());
    assert!(!CacheFile::cache_path(dir.path()).exists());
}

/// 2回目の一括処理はキャッシュから返り、タイトルが変わらない
#[test]
fn test_batch_reuses_cached_titles() {
    let dir = tempdir().expect("Failed to create temp dir");
    let options = BatchOptions {
        batch_id: Some("C1".into()),
        ..Default::default()
    };

    let mut cache = CacheFile::load(dir.path());
    let first = run_batch(&sample_inputs(), BrandRegistry::builtin(), &options, Some(&mut cache))
        .expect("一括処理失敗");
    cache.save(dir.path()).unwrap();

    let mut cache = CacheFile::load(dir.path());
    let second = run_batch(&sample_inputs(), BrandRegistry::builtin(), &options, Some(&mut cache))
        .expect("一括処理失敗");

    assert_eq!(first.cache_hits, 0);
    assert_eq!(second.cache_hits, 2);
    let titles = |items: &[garment_ai_common::ProcessedItem]| {
        items.iter().map(|i| i.listing.ebay_title.clone()).collect::<Vec<_>>()
    };
    assert_eq!(titles(&first.items), titles(&second.items));
}

/// バッチIDが変わればキャッシュは使われない
#[test]
fn test_batch_id_change_misses_cache() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut cache = CacheFile::load(dir.path());

    let options = BatchOptions {
        batch_id: Some("C1".into()),
        ..Default::default()
    };
    run_batch(&sample_inputs(), BrandRegistry::builtin(), &options, Some(&mut cache)).unwrap();

    let options = BatchOptions {
        batch_id: Some("C2".into()),
        ..Default::default()
    };
    let report =
        run_batch(&sample_inputs(), BrandRegistry::builtin(), &options, Some(&mut cache)).unwrap();
    assert_eq!(report.cache_hits, 0);
    assert!(report.items.iter().all(|i| i.listing.sku.contains("-C2-")));
}

/// レジストリを差し替えるとキャッシュは使われず、新しいブランドで判定し直す
#[test]
fn test_registry_change_misses_cache() {
    let dir = tempdir().expect("Failed to create temp dir");
    let inputs = vec![ItemInput::from_text("acme wool coat")];
    let options = BatchOptions::default();

    let mut cache = CacheFile::load(dir.path());
    let first = run_batch(&inputs, BrandRegistry::builtin(), &options, Some(&mut cache)).unwrap();
    assert_eq!(first.items[0].listing.brand, "Unbranded");

    let custom = BrandRegistry::from_json(
        r#"[{"id": "ACME", "displayName": "Acme", "patterns": ["\\bacme\\b"], "baseConfidence": 0.9, "tier": "mid-range"}]"#,
    )
    .expect("レジストリ構築失敗");
    let second = run_batch(&inputs, &custom, &options, Some(&mut cache)).unwrap();

    assert_eq!(second.cache_hits, 0);
    assert_eq!(second.items[0].listing.brand, "Acme");
    assert_eq!(cache.len(), 2);
}
