use super::AnalysisService;
use crate::error::{Result, ShoelaceError};
use async_trait::async_trait;
use shoelace_common::{parse_analysis_response, AnalysisResult, SubmissionPayload};
use std::time::Duration;
use tracing::debug;

/// HTTP POST で解析サービスを呼び出す
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalyzer {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShoelaceError::Config(format!("HTTPクライアント作成失敗: {}", e)))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AnalysisService for HttpAnalyzer {
    async fn analyze(&self, payload: &SubmissionPayload) -> Result<AnalysisResult> {
        debug!(
            scan_id = %payload.scan_id,
            photos = payload.photo_count,
            endpoint = %self.endpoint,
            "analyze request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| ShoelaceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let preview: String = text.chars().take(200).collect();
            return Err(ShoelaceError::Service(format!(
                "Analyze failed (status {}): {}",
                status, preview
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ShoelaceError::Network(e.to_string()))?;

        parse_analysis_response(&body, &payload.scan_id)
            .map_err(|e| ShoelaceError::Service(format!("レスポンスのパースに失敗: {}", e)))
    }
}
