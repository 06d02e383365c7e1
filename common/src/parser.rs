//! 解析サービスのレスポンスパーサー
//!
//! サービスの出力は揺れがあるため、アイテムを正規化してから
//! AnalysisResult に変換する:
//! - part: part → name → description → "Item N"
//! - qtyEstimate: qtyEstimate → quantity → qty、四捨五入して 1 以上
//! - confidence: 0.0〜1.0 に丸める（なければ 0.6）
//! - アイテムは先頭 6 件まで

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, DetectedItem};
use serde_json::Value;

pub const MAX_ITEMS: usize = 6;

pub const DEFAULT_SELL_TAGS: [&str; 3] = ["High Demand", "Low Stock", "Contractor Favorite"];

pub const DEFAULT_CHANNELS: [&str; 3] = ["Telecom broker", "eBay", "Surplus wholesale"];

const DEFAULT_CONFIDENCE: f64 = 0.6;

/// レスポンス本文をパースして正規化
///
/// # Examples
/// ```
/// use shoelace_common::parse_analysis_response;
///
/// let body = r#"{"items":[{"part":"ADC-CL-102","confidence":0.8}]}"#;
/// let result = parse_analysis_response(body, "scan_1").unwrap();
/// assert_eq!(result.items[0].part, "ADC-CL-102");
/// assert_eq!(result.scan_id.as_deref(), Some("scan_1"));
/// ```
pub fn parse_analysis_response(body: &str, scan_id: &str) -> Result<AnalysisResult> {
    let value: Value = serde_json::from_str(body)?;
    normalize_result(&value, scan_id)
}

/// JSON値を AnalysisResult に正規化
pub fn normalize_result(value: &Value, scan_id: &str) -> Result<AnalysisResult> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Parse("レスポンスがJSONオブジェクトではありません".into()))?;

    let items: Vec<DetectedItem> = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|raw| {
            raw.iter()
                .take(MAX_ITEMS)
                .enumerate()
                .map(|(index, item)| normalize_item(item, index))
                .collect()
        })
        .unwrap_or_default();

    let overall_confidence = if items.is_empty() {
        0.0
    } else {
        items.iter().map(|i| i.confidence).sum::<f64>() / items.len() as f64
    };

    Ok(AnalysisResult {
        scan_id: Some(
            obj.get("scanId")
                .and_then(Value::as_str)
                .unwrap_or(scan_id)
                .to_string(),
        ),
        detected_at: obj
            .get("detectedAt")
            .and_then(Value::as_str)
            .map(str::to_string),
        overall_confidence,
        items,
        sell_first_tags: string_list_or(obj.get("sellFirstTags"), &DEFAULT_SELL_TAGS),
        suggested_channels: string_list_or(obj.get("suggestedChannels"), &DEFAULT_CHANNELS),
    })
}

fn normalize_item(item: &Value, index: usize) -> DetectedItem {
    let part = first_text(item, &["part", "name", "description"])
        .unwrap_or_else(|| format!("Item {}", index + 1));
    let category = first_text(item, &["category"]).unwrap_or_else(|| "Detected".to_string());
    let qty = first_number(item, &["qtyEstimate", "quantity", "qty"]).unwrap_or(1.0);
    let confidence = first_number(item, &["confidence"]).unwrap_or(DEFAULT_CONFIDENCE);
    let price_range = first_text(item, &["priceRange", "price"]).unwrap_or_else(|| "Unknown".to_string());

    DetectedItem {
        part,
        category,
        qty_estimate: qty.round().max(1.0) as u32,
        confidence: confidence.clamp(0.0, 1.0),
        price_range,
    }
}

fn first_text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
}

fn first_number(item: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .filter_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .find(|n| n.is_finite())
}

fn string_list_or(value: Option<&Value>, defaults: &[&str]) -> Vec<String> {
    let list: Vec<String> = value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if list.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        list
    }
}
