//! キュー同期
//!
//! 再送待ちキューを登録順（seq）に1件ずつ解析サービスへ送る。
//! 失敗したらその場で停止し、失敗した項目以降はキューに残す。
//! 後続の項目を先に送ることはしない。
//!
//! 同時に走るドレインはデータディレクトリごとに常に1つまで（別プロセスを含む）。
//! 重なった呼び出しは何もせずに戻る。

use crate::analyzer::AnalysisService;
use crate::connectivity::Connectivity;
use crate::error::Result;
use crate::id::new_id;
use crate::status::{StatusSink, StatusUpdate};
use crate::store::Store;
use chrono::{DateTime, Utc};
use shoelace_common::{QueueItem, SubmissionPayload};
use std::sync::Arc;
use tracing::{info, warn};

/// 1回の同期の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// オフラインのため何もしなかった
    Offline,
    /// キューが空
    Idle,
    /// 全件送信済み
    Synced { count: usize },
    /// 途中で失敗して停止
    Paused {
        synced: usize,
        remaining: usize,
        reason: String,
    },
    /// 別の同期が実行中
    Busy,
}

pub struct QueueSynchronizer {
    store: Arc<Store>,
    analyzer: Arc<dyn AnalysisService>,
    connectivity: Connectivity,
    sink: Arc<dyn StatusSink>,
}

impl QueueSynchronizer {
    pub fn new(
        store: Arc<Store>,
        analyzer: Arc<dyn AnalysisService>,
        connectivity: Connectivity,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            store,
            analyzer,
            connectivity,
            sink,
        }
    }

    pub async fn sync_queue(&self) -> SyncReport {
        if !self.connectivity.is_online() {
            self.sink.report(StatusUpdate::warning("Offline - queued"));
            return SyncReport::Offline;
        }

        let _permit = match self.store.drain_lock().try_acquire() {
            Ok(Some(permit)) => permit,
            Ok(None) => {
                self.sink.report(StatusUpdate::info("Sync already in progress"));
                return SyncReport::Busy;
            }
            Err(e) => {
                warn!(error = %e, "drain lock failed");
                return self.pause(0, 0, e.to_string());
            }
        };

        let items = match self.pending().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "queue load failed");
                return self.pause(0, 0, e.to_string());
            }
        };

        if items.is_empty() {
            self.sink.report(StatusUpdate::good("Queue idle"));
            return SyncReport::Idle;
        }

        self.sink
            .report(StatusUpdate::info(format!("Syncing {}...", items.len())));

        for (index, item) in items.iter().enumerate() {
            if let Err(e) = self.process(item).await {
                warn!(queue_id = %item.id, scan_id = %item.scan_id, error = %e, "sync stopped");
                return self.pause(index, items.len() - index, e.to_string());
            }
        }

        info!(count = items.len(), "queue synced");
        self.sink.report(StatusUpdate::good("Queue synced"));
        SyncReport::Synced { count: items.len() }
    }

    /// 処理順に並べたキュー
    pub async fn pending(&self) -> Result<Vec<QueueItem>> {
        let mut items = self.store.queue().get_all().await?;
        items.sort_by(|a, b| {
            a.seq
                .cmp(&b.seq)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn process(&self, item: &QueueItem) -> Result<()> {
        let result = self.analyzer.analyze(&item.payload).await?;

        match self.store.scans().get(&item.scan_id).await? {
            Some(mut scan) => {
                scan.apply_result(result, Utc::now());
                self.store.scans().put(&scan).await?;
                info!(scan_id = %scan.id, status = %scan.status, "queued scan analyzed");
            }
            None => {
                warn!(scan_id = %item.scan_id, "scan not found, dropping queue item");
            }
        }

        self.store.queue().delete(&item.id).await
    }

    fn pause(&self, synced: usize, remaining: usize, reason: String) -> SyncReport {
        self.sink
            .report(StatusUpdate::warning("Sync paused - check connection"));
        SyncReport::Paused {
            synced,
            remaining,
            reason,
        }
    }
}

/// 送信ペイロードをキューに登録（seq は既存の最大値 + 1）
///
/// 採番と保存は同じロック内で行うので、別プロセスと seq が重複しない。
pub async fn enqueue(
    store: &Store,
    scan_id: &str,
    payload: SubmissionPayload,
    created_at: DateTime<Utc>,
) -> Result<QueueItem> {
    let item = store
        .queue()
        .insert_with(|existing| QueueItem {
            id: new_id("queue"),
            scan_id: scan_id.to_string(),
            payload,
            created_at,
            seq: existing
                .iter()
                .map(|item| item.seq)
                .max()
                .map_or(1, |max| max + 1),
        })
        .await?;
    info!(queue_id = %item.id, scan_id, seq = item.seq, "queued");
    Ok(item)
}
