//! スキャン関連の型定義
//!
//! 端末に永続化されるレコード:
//! - Draft: 撮影中の単一セッション（写真 + メタ情報）
//! - Scan: 確定済みの在庫スキャン
//! - QueueItem: 再送待ちの送信ペイロード
//!
//! 解析サービスとの送受信:
//! - SubmissionPayload: 送信内容
//! - AnalysisResult: 解析結果（信頼度付きの検出アイテム一覧）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::derive_status;

/// ドラフト内の撮影写真1枚
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,

    /// 元ファイル名
    #[serde(default)]
    pub name: String,

    /// 埋め込み可能な画像データ（data URL）
    pub data_url: String,

    /// 取り込み日時
    pub added_at: DateTime<Utc>,

    /// 撮影日時（EXIF DateTimeOriginal）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<String>,

    /// 手入力の品番
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_part: Option<String>,

    /// ラベル判読不能
    #[serde(default)]
    pub unreadable: bool,
}

impl Photo {
    /// 空白のみの手入力品番は未入力として扱う
    pub fn manual_part(&self) -> Option<&str> {
        self.manual_part
            .as_deref()
            .map(str::trim)
            .filter(|part| !part.is_empty())
    }
}

/// 撮影中のドラフト（端末に1件のみ）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Draft {
    pub photos: Vec<Photo>,
    pub location_tag: String,
    pub notes: String,
}

impl Draft {
    pub fn photo(&self, photo_id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }
}

/// スキャンの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanStatus {
    /// 送信済み、応答待ち
    Analyzing,
    /// 未送信（オフライン or 送信失敗）、再送待ち
    Queued,
    /// 全アイテムが十分な信頼度
    Ready,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "Needs Better Photo")]
    NeedsBetterPhoto,
}

impl ScanStatus {
    /// 解析結果を保持している状態か
    pub fn has_result(&self) -> bool {
        matches!(
            self,
            ScanStatus::Ready | ScanStatus::NeedsReview | ScanStatus::NeedsBetterPhoto
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Analyzing => "Analyzing",
            ScanStatus::Queued => "Queued",
            ScanStatus::Ready => "Ready",
            ScanStatus::NeedsReview => "Needs Review",
            ScanStatus::NeedsBetterPhoto => "Needs Better Photo",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 確定済みスキャン
///
/// `result` は `status` が Ready / Needs Review / Needs Better Photo の時だけ存在する。
/// 状態の変更は `apply_result` / `mark_queued` を通す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub location_tag: String,
    #[serde(default)]
    pub notes: String,
    pub photos: Vec<Photo>,
    pub status: ScanStatus,
    pub result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl Scan {
    /// ドラフトからスキャンを作成（写真は値コピー）
    pub fn from_draft(id: String, created_at: DateTime<Utc>, draft: &Draft, online: bool) -> Self {
        Self {
            id,
            created_at,
            location_tag: draft.location_tag.clone(),
            notes: draft.notes.clone(),
            photos: draft.photos.clone(),
            status: if online {
                ScanStatus::Analyzing
            } else {
                ScanStatus::Queued
            },
            result: None,
            synced_at: None,
        }
    }

    /// 解析結果を反映し、信頼度からステータスを導出する
    pub fn apply_result(&mut self, result: AnalysisResult, synced_at: DateTime<Utc>) {
        self.status = derive_status(&result);
        self.result = Some(result);
        self.synced_at = Some(synced_at);
    }

    pub fn mark_queued(&mut self) {
        self.status = ScanStatus::Queued;
        self.result = None;
    }
}

/// 解析サービスへの送信内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub scan_id: String,
    pub location_tag: String,
    pub notes: String,
    /// 手入力品番（ドラフトの写真順）
    pub manual_parts: Vec<String>,
    /// 全写真の画像データ
    pub photos: Vec<String>,
    pub photo_count: usize,
}

impl SubmissionPayload {
    pub fn from_draft(scan_id: &str, draft: &Draft) -> Self {
        Self {
            scan_id: scan_id.to_string(),
            location_tag: draft.location_tag.clone(),
            notes: draft.notes.clone(),
            manual_parts: draft
                .photos
                .iter()
                .filter_map(|p| p.manual_part().map(str::to_string))
                .collect(),
            photos: draft.photos.iter().map(|p| p.data_url.clone()).collect(),
            photo_count: draft.photos.len(),
        }
    }
}

/// 再送待ちキュー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    pub scan_id: String,
    pub payload: SubmissionPayload,
    pub created_at: DateTime<Utc>,
    /// 登録順（単調増加）。同期時はこの順に処理する
    #[serde(default)]
    pub seq: u64,
}

/// 検出アイテム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedItem {
    pub part: String,
    pub category: String,
    pub qty_estimate: u32,
    /// 0.0〜1.0
    pub confidence: f64,
    pub price_range: String,
}

/// 解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub scan_id: Option<String>,

    #[serde(default)]
    pub detected_at: Option<String>,

    #[serde(default)]
    pub overall_confidence: f64,

    #[serde(default)]
    pub items: Vec<DetectedItem>,

    #[serde(default)]
    pub sell_first_tags: Vec<String>,

    #[serde(default)]
    pub suggested_channels: Vec<String>,
}
