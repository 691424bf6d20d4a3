//! ログ初期化
//!
//! `tracing-subscriber` を使用。`RUST_LOG` で上書きできる（既定: info、--verbose で debug）。

use tracing_subscriber::{fmt, EnvFilter};

/// ログを初期化する
///
/// # 環境変数
/// - RUST_LOG: 例 `RUST_LOG=garment_ai_common=debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // 進捗表示は stdout なのでログは stderr へ
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_line_number(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

/// テスト用（debug レベル、テスト出力に流す）
#[cfg(test)]
pub(crate) fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
