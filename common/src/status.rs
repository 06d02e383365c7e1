//! 解析結果からスキャンステータスを導出する
//!
//! 最小信頼度 m（アイテムなしは 0）に対して:
//! - m < 0.55 → Needs Better Photo
//! - m < 0.70 → Needs Review
//! - それ以外 → Ready

use crate::types::{AnalysisResult, ScanStatus};

/// これ未満は撮り直しが必要
pub const LOW_CONFIDENCE: f64 = 0.55;

/// これ未満は目視確認が必要
pub const MID_CONFIDENCE: f64 = 0.70;

/// 全アイテム中の最小信頼度
pub fn min_confidence(result: &AnalysisResult) -> f64 {
    result
        .items
        .iter()
        .map(|item| item.confidence)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

pub fn derive_status(result: &AnalysisResult) -> ScanStatus {
    let min = min_confidence(result);
    if min < LOW_CONFIDENCE {
        ScanStatus::NeedsBetterPhoto
    } else if min < MID_CONFIDENCE {
        ScanStatus::NeedsReview
    } else {
        ScanStatus::Ready
    }
}
