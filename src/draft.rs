//! 撮影中ドラフトの管理
//!
//! ドラフトは端末に1件だけ存在する。変更操作はすべて、戻る前に
//! ドラフト全体を保存する。保存に失敗した場合は呼び出し側にエラーを返し、
//! 渡されたドラフトは変更しない。

use crate::error::Result;
use crate::id::new_id;
use crate::scanner::ImageReader;
use crate::store::{Store, DRAFT_KEY};
use chrono::Utc;
use shoelace_common::{Draft, Photo};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub struct DraftManager {
    store: Arc<Store>,
    reader: Arc<dyn ImageReader>,
}

impl DraftManager {
    pub fn new(store: Arc<Store>, reader: Arc<dyn ImageReader>) -> Self {
        Self { store, reader }
    }

    /// 保存済みドラフト（なければ空のドラフト）
    pub async fn load(&self) -> Result<Draft> {
        Ok(self.store.draft().get(DRAFT_KEY).await?.unwrap_or_default())
    }

    /// 新規スキャン開始。既存のドラフトがあればそれを続ける
    pub async fn start(&self) -> Result<Draft> {
        if let Some(draft) = self.store.draft().get(DRAFT_KEY).await? {
            return Ok(draft);
        }
        let draft = Draft::default();
        self.save(&draft).await?;
        Ok(draft)
    }

    /// 写真を追加する
    ///
    /// 1枚でも読み込みに失敗したらバッチ全体を破棄し、何も保存しない。
    pub async fn add_photos(&self, draft: &Draft, files: &[PathBuf]) -> Result<Draft> {
        let mut photos = Vec::with_capacity(files.len());

        for path in files {
            let image = self.reader.read(path).await?;
            photos.push(Photo {
                id: new_id("photo"),
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                data_url: image.data_url,
                added_at: Utc::now(),
                taken_at: image.taken_at,
                manual_part: None,
                unreadable: false,
            });
        }

        let mut updated = draft.clone();
        updated.photos.extend(photos);
        self.save(&updated).await?;
        info!(added = files.len(), total = updated.photos.len(), "photos added");
        Ok(updated)
    }

    /// 写真を削除（存在しなければ何もしない）
    pub async fn remove_photo(&self, draft: &Draft, photo_id: &str) -> Result<Draft> {
        let mut updated = draft.clone();
        updated.photos.retain(|p| p.id != photo_id);
        self.save(&updated).await?;
        Ok(updated)
    }

    /// 手入力品番と判読不能フラグを更新
    pub async fn update_photo_fields(
        &self,
        draft: &Draft,
        photo_id: &str,
        manual_part: Option<&str>,
        unreadable: bool,
    ) -> Result<Draft> {
        let manual_part = manual_part
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let mut updated = draft.clone();
        if let Some(photo) = updated.photos.iter_mut().find(|p| p.id == photo_id) {
            photo.manual_part = manual_part;
            photo.unreadable = unreadable;
        }
        self.save(&updated).await?;
        Ok(updated)
    }

    pub async fn update_meta(&self, draft: &Draft, location_tag: &str, notes: &str) -> Result<Draft> {
        let updated = Draft {
            location_tag: location_tag.trim().to_string(),
            notes: notes.trim().to_string(),
            ..draft.clone()
        };
        self.save(&updated).await?;
        Ok(updated)
    }

    /// ドラフトを削除
    pub async fn clear(&self) -> Result<()> {
        self.store.draft().delete(DRAFT_KEY).await?;
        info!("draft cleared");
        Ok(())
    }

    async fn save(&self, draft: &Draft) -> Result<()> {
        self.store.draft().put(draft).await?;
        debug!(photos = draft.photos.len(), "draft saved");
        Ok(())
    }
}
