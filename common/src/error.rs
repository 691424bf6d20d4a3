//! エラー型定義

use thiserror::Error;

/// 共通エラー型
///
/// 「証拠なし」は エラーにしない（ブランド不明・状態不明は既定値で処理する）。
/// ここに来るのは呼び出し側の契約違反か、レジストリ読み込みの失敗のみ。
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Export error: {0}")]
    Export(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
