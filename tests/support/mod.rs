//! テスト用の解析サービス・ストア・画像ファイル

#![allow(dead_code)]

use async_trait::async_trait;
use shoelace_common::{AnalysisResult, DetectedItem, SubmissionPayload};
use shoelace_scan::analyzer::AnalysisService;
use shoelace_scan::connectivity::Connectivity;
use shoelace_scan::error::{Result, ShoelaceError};
use shoelace_scan::scanner::DataUrlReader;
use shoelace_scan::status::RecordingSink;
use shoelace_scan::store::Store;
use shoelace_scan::App;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// 応答を順番に返す解析サービス（尽きたら信頼度 0.9 の結果）
#[derive(Default)]
pub struct ScriptedAnalyzer {
    responses: Mutex<VecDeque<Result<AnalysisResult>>>,
    calls: Mutex<Vec<SubmissionPayload>>,
}

impl ScriptedAnalyzer {
    pub fn new(responses: Vec<Result<AnalysisResult>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(network_error())])
    }

    pub fn calls(&self) -> Vec<SubmissionPayload> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_scan_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|p| p.scan_id).collect()
    }
}

#[async_trait]
impl AnalysisService for ScriptedAnalyzer {
    async fn analyze(&self, payload: &SubmissionPayload) -> Result<AnalysisResult> {
        self.calls.lock().unwrap().push(payload.clone());
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(result_with(&[0.9])))
    }
}

pub fn network_error() -> ShoelaceError {
    ShoelaceError::Network("connection refused".into())
}

pub fn result_with(confidences: &[f64]) -> AnalysisResult {
    AnalysisResult {
        items: confidences
            .iter()
            .enumerate()
            .map(|(i, &confidence)| DetectedItem {
                part: format!("PART-{}", i + 1),
                category: "Closures".into(),
                qty_estimate: 1,
                confidence,
                price_range: "$80-$120".into(),
            })
            .collect(),
        sell_first_tags: vec!["High Demand".into()],
        suggested_channels: vec!["eBay".into()],
        ..Default::default()
    }
}

pub struct Harness {
    pub app: App,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub sink: Arc<RecordingSink>,
}

pub async fn harness(dir: &Path, online: bool, analyzer: ScriptedAnalyzer) -> Harness {
    let store = Arc::new(Store::open(dir).await.expect("ストアを開けない"));
    let analyzer = Arc::new(analyzer);
    let sink = Arc::new(RecordingSink::default());
    let app = App::with_parts(
        store,
        analyzer.clone(),
        Arc::new(DataUrlReader),
        Connectivity::new(online),
        sink.clone(),
    );
    Harness { app, analyzer, sink }
}

/// PNG として判別される最小のファイルを作成
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, PNG_MAGIC).expect("画像ファイル作成失敗");
    path
}
