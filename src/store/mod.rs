//! 端末内の永続ストア
//!
//! 独立した3つのコレクションを持つ:
//! - scans: 確定済みスキャン
//! - queue: 再送待ちキュー
//! - draft: 撮影中ドラフト（1件のみ）
//!
//! コレクション間の整合性（QueueItem.scan_id の参照先など）は呼び出し側が保つ。
//!
//! 同じデータディレクトリを複数プロセスが開いてもよい（`watch` と `submit` の併用など）。
//! 書き込みは `store.lock`、キュー同期は `sync.lock` で排他する。

mod collection;
mod lock;

pub use collection::{Collection, Record};
pub use lock::{DirLock, LockGuard, DRAIN_LOCK_FILE, WRITE_LOCK_FILE};

use crate::error::{Result, ShoelaceError};
use shoelace_common::{Draft, QueueItem, Scan};
use std::path::Path;
use tracing::info;

/// ドラフトの固定キー
pub const DRAFT_KEY: &str = "draft";

impl Record for Scan {
    const COLLECTION: &'static str = "scans";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Record for QueueItem {
    const COLLECTION: &'static str = "queue";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Record for Draft {
    const COLLECTION: &'static str = "draft";

    fn key(&self) -> &str {
        DRAFT_KEY
    }
}

#[derive(Debug)]
pub struct Store {
    drain_lock: DirLock,
    scans: Collection<Scan>,
    queue: Collection<QueueItem>,
    draft: Collection<Draft>,
}

impl Store {
    /// データディレクトリを開く（なければ作成）
    pub async fn open(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ShoelaceError::Storage(format!("{}: データディレクトリを作成できません: {}", dir.display(), e))
        })?;
        info!(dir = %dir.display(), "store opened");

        let write_lock = DirLock::new(dir, WRITE_LOCK_FILE);
        Ok(Self {
            drain_lock: DirLock::new(dir, DRAIN_LOCK_FILE),
            scans: Collection::new(dir, write_lock.clone()),
            queue: Collection::new(dir, write_lock.clone()),
            draft: Collection::new(dir, write_lock),
        })
    }

    /// キュー同期の排他（データディレクトリ単位）
    pub fn drain_lock(&self) -> &DirLock {
        &self.drain_lock
    }

    pub fn scans(&self) -> &Collection<Scan> {
        &self.scans
    }

    pub fn queue(&self) -> &Collection<QueueItem> {
        &self.queue
    }

    pub fn draft(&self) -> &Collection<Draft> {
        &self.draft
    }

    /// 作成日時の新しい順
    pub async fn list_scans(&self) -> Result<Vec<Scan>> {
        let mut scans = self.scans.get_all().await?;
        scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(scans)
    }
}
