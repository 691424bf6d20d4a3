use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "garment-ai")]
#[command(about = "古着のブランド・状態判定とeBay出品データ生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 独自ブランドレジストリ（JSON、設定より優先）
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 1商品をテキストから判定してJSONを出力
    Classify {
        /// 商品テキスト（ファイル名・メモ・altテキストなど）
        #[arg(required = true)]
        text: String,

        /// ラベルのOCR結果
        #[arg(short, long)]
        label: Option<String>,

        /// 画像解析による状態ヒント（例: "very good"）
        #[arg(long)]
        condition_hint: Option<String>,

        /// サイズ（指定時は検出より優先）
        #[arg(long)]
        size: Option<String>,

        /// 性別（women/men/unisex）
        #[arg(long)]
        gender: Option<String>,

        /// SKU用のバッチID
        #[arg(short, long)]
        batch_id: Option<String>,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 商品写真フォルダ（1フォルダ = 1商品）を判定
    Scan {
        /// 写真フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 状態ヒント
        #[arg(long)]
        condition_hint: Option<String>,

        /// SKU用のバッチID
        #[arg(short, long)]
        batch_id: Option<String>,

        /// 出力JSONファイル（省略時は 入力フォルダ/listing.json）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// JSON / Excel の商品一覧を一括処理
    Batch {
        /// 入力ファイル（.json / .xlsx）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力JSONファイル（デフォルト: 入力と同じ場所の results.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// SKU用のバッチID
        #[arg(short, long)]
        batch_id: Option<String>,

        /// スレッド数（0 = 自動）
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// キャッシュを使用（処理済みの商品をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 処理結果から出品シートを生成
    Export {
        /// 入力JSONファイル（batch の出力）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力形式 (excel/json/both)
        #[arg(short, long, default_value = "excel")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ファイル名（拡張子なし）
        #[arg(short, long, default_value = "listings")]
        title: String,
    },

    /// 採寸テキストを解析・検証
    Measure {
        /// 採寸テキスト（例: "pit to pit 21in, length 40in"）
        #[arg(required = true)]
        text: String,

        /// 衣類種別（dress/coat/jacket/jeans/...）
        #[arg(short = 't', long)]
        garment_type: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 既定のバッチIDを設定
        #[arg(long)]
        set_batch_id: Option<String>,

        /// 独自ブランドレジストリを設定
        #[arg(long)]
        set_registry: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExportFormat {
    #[default]
    Excel,
    Json,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "json" => Ok(ExportFormat::Json),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use excel, json, or both", s)),
        }
    }
}
