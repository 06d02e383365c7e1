//! 解析サービス連携
//!
//! 送信ペイロードを解析結果に変換する外部サービス。
//! 失敗はステータスコードの内容に関わらず一律に失敗として扱い、
//! 呼び出し側でキューに回す。

mod http;
mod simulated;

pub use http::HttpAnalyzer;
pub use simulated::SimulatedAnalyzer;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use shoelace_common::{AnalysisResult, SubmissionPayload};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, payload: &SubmissionPayload) -> Result<AnalysisResult>;
}

/// 設定に応じた解析サービスを作成
pub fn from_config(config: &Config) -> Result<Arc<dyn AnalysisService>> {
    if config.simulate {
        return Ok(Arc::new(SimulatedAnalyzer));
    }
    let analyzer = HttpAnalyzer::new(
        config.endpoint.clone(),
        Duration::from_secs(config.timeout_seconds),
    )?;
    Ok(Arc::new(analyzer))
}
