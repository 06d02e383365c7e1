//! UI向けの状態通知
//!
//! 各操作は短いメッセージとトーンを一方向に通知する（応答は不要）。

use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Info,
    Warning,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Good => write!(f, "good"),
            Tone::Info => write!(f, "info"),
            Tone::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub message: String,
    pub tone: Tone,
}

impl StatusUpdate {
    pub fn new(message: impl Into<String>, tone: Tone) -> Self {
        Self {
            message: message.into(),
            tone,
        }
    }

    pub fn good(message: impl Into<String>) -> Self {
        Self::new(message, Tone::Good)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Tone::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Tone::Warning)
    }
}

pub trait StatusSink: Send + Sync {
    fn report(&self, update: StatusUpdate);
}

/// CLI 表示用
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn report(&self, update: StatusUpdate) {
        let mark = match update.tone {
            Tone::Good => "✔",
            Tone::Info => "-",
            Tone::Warning => "⚠",
        };
        println!("{} {}", mark, update.message);
    }
}

/// 通知を記録する（テスト・履歴表示用）
#[derive(Debug, Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl RecordingSink {
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<StatusUpdate> {
        self.updates().pop()
    }
}

impl StatusSink for RecordingSink {
    fn report(&self, update: StatusUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}
