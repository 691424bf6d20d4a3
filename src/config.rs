use crate::error::{GarmentAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const BATCH_ID_ENV: &str = "GARMENT_AI_BATCH_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// SKU に入れるバッチID
    pub default_batch_id: Option<String>,
    /// 独自ブランドレジストリ（JSON）
    pub registry_path: Option<PathBuf>,
    /// 一括処理のスレッド数（0 = rayon に任せる）
    pub worker_threads: usize,
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_batch_id: None,
            registry_path: None,
            worker_threads: 0,
            currency: "GBP".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GarmentAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("garment-ai").join("config.json"))
    }

    /// バッチID（環境変数を優先）
    pub fn batch_id(&self) -> Option<String> {
        if let Ok(id) = std::env::var(BATCH_ID_ENV) {
            if !id.trim().is_empty() {
                return Some(id);
            }
        }
        self.default_batch_id.clone()
    }

    /// 価格表示用の通貨記号（未知の通貨はコード + 空白）
    pub fn currency_symbol(&self) -> String {
        match self.currency.trim().to_uppercase().as_str() {
            "GBP" => "£".to_string(),
            "EUR" => "€".to_string(),
            "USD" => "$".to_string(),
            other => format!("{} ", other),
        }
    }

    pub fn set_batch_id(&mut self, id: String) -> Result<()> {
        self.default_batch_id = Some(id);
        self.save()
    }

    pub fn set_registry_path(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(GarmentAiError::FileNotFound(path.display().to_string()));
        }
        self.registry_path = Some(path);
        self.save()
    }
}
