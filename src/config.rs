use crate::error::{Result, ShoelaceError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8888/api/analyze-scan";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 解析サービスのURL
    pub endpoint: String,
    /// データ保存先（未指定時は OS のデータディレクトリ）
    pub data_dir: Option<PathBuf>,
    pub timeout_seconds: u64,
    /// 常にオフラインとして扱う
    pub force_offline: bool,
    /// 解析サービスの代わりに疑似解析を使う
    pub simulate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            data_dir: None,
            timeout_seconds: 60,
            force_offline: false,
            simulate: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ShoelaceError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("shoelace").join("config.json"))
    }

    /// レコードの保存先ディレクトリ
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| ShoelaceError::Config("データディレクトリが見つかりません".into()))?;
        Ok(base.join("shoelace"))
    }

    // 環境変数を優先
    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("SHOELACE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(dir) = std::env::var("SHOELACE_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(flag) = std::env::var("SHOELACE_OFFLINE") {
            self.force_offline = parse_flag(&flag);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
