use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShoelaceError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ストレージエラー: {0}")]
    Storage(String),

    #[error("画像読み込みエラー: {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("ネットワークエラー: {0}")]
    Network(String),

    #[error("解析サービスエラー: {0}")]
    Service(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, ShoelaceError>;
