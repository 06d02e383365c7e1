//! 撮影画像の取り込み
//!
//! 画像ファイルを埋め込み可能な data URL に変換する。
//! フォルダを渡した場合は直下の画像ファイルを名前順に取り込む。

mod exif;

use crate::error::{Result, ShoelaceError};
use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// data URL 化した画像
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data_url: String,
    /// EXIF の撮影日時
    pub taken_at: Option<String>,
}

/// ファイル → 画像データ変換
#[async_trait]
pub trait ImageReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<ImageData>;
}

/// ファイルを読み込んで base64 の data URL にする
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlReader;

#[async_trait]
impl ImageReader for DataUrlReader {
    async fn read(&self, path: &Path) -> Result<ImageData> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| read_error(path, e.to_string()))?;

        let format = image::guess_format(&bytes)
            .map_err(|_| read_error(path, "画像形式を判別できません".into()))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(ImageData {
            data_url: format!("data:{};base64,{}", format.to_mime_type(), encoded),
            taken_at: exif::extract_date(&bytes),
        })
    }
}

/// 入力パスを画像ファイル一覧に展開
///
/// - ファイル: そのまま（形式チェックは読み込み時）
/// - フォルダ: 直下の画像ファイルを名前順
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(scan_folder(path));
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(read_error(path, "ファイルが見つかりません".into()));
        }
    }

    Ok(files)
}

fn scan_folder(folder: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    // ファイル名でソート
    images.sort();
    images
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

fn read_error(path: &Path, reason: String) -> ShoelaceError {
    ShoelaceError::Read {
        path: path.to_path_buf(),
        reason,
    }
}
