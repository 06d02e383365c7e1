//! Shoelace - 現場在庫ラベル撮影・オフライン同期
//!
//! 撮影中ドラフトの管理、確定時の送信/キュー登録、
//! 接続復帰時のキュー同期を提供する。

pub mod analyzer;
pub mod app;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod draft;
pub mod error;
pub mod id;
pub mod scanner;
pub mod status;
pub mod store;
pub mod submit;
pub mod sync;

pub use app::App;
pub use error::{Result, ShoelaceError};
