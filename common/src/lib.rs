//! Shoelace Common Library
//!
//! ドラフト・スキャン・キューの型と、解析結果からステータスを導出する規則

pub mod types;
pub mod status;
pub mod error;
pub mod parser;

pub use types::{
    AnalysisResult, DetectedItem, Draft, Photo, QueueItem, Scan, ScanStatus, SubmissionPayload,
};
pub use status::{derive_status, min_confidence, LOW_CONFIDENCE, MID_CONFIDENCE};
pub use error::{Error, Result};
pub use parser::{normalize_result, parse_analysis_response};
