//! ドラフトの確定と送信
//!
//! 1. スキャンID・ペイロードを作成
//! 2. スキャンとキュー項目を保存し、ドラフトを削除
//! 3. オンラインなら即時送信。成功したらキュー項目を消す
//! 4. オフライン、または別の同期が実行中なら送信せずキューに任せる
//!
//! キュー項目はドラフトを消す前に書くので、以降の送信失敗や保存失敗で
//! 送信内容が失われることはない（次回の同期で再送される）。
//! 解析サービスの失敗はエラーとして返さず、Queued に変換する。

use crate::analyzer::AnalysisService;
use crate::connectivity::Connectivity;
use crate::error::{Result, ShoelaceError};
use crate::id::new_id;
use crate::store::{LockGuard, Store, DRAFT_KEY};
use crate::sync::enqueue;
use chrono::Utc;
use shoelace_common::{Draft, QueueItem, Scan, SubmissionPayload};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Submitter {
    store: Arc<Store>,
    analyzer: Arc<dyn AnalysisService>,
    connectivity: Connectivity,
}

impl Submitter {
    pub fn new(
        store: Arc<Store>,
        analyzer: Arc<dyn AnalysisService>,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            store,
            analyzer,
            connectivity,
        }
    }

    /// ドラフトをスキャンとして確定する
    ///
    /// 返すスキャンは保存済み。入力エラー、またはスキャン・キュー項目を
    /// 保存できなかった場合はスキャンを作らずドラフトも残す。
    pub async fn finalize(&self, draft: &Draft) -> Result<Scan> {
        validate(draft)?;

        // 即時送信中は同期と重ならないようドレインを押さえておく
        let permit = if self.connectivity.is_online() {
            self.drain_permit()
        } else {
            None
        };
        let online = permit.is_some();

        let scan_id = new_id("scan");
        let now = Utc::now();
        let payload = SubmissionPayload::from_draft(&scan_id, draft);
        let mut scan = Scan::from_draft(scan_id, now, draft, online);

        self.store.scans().put(&scan).await?;
        let item = match enqueue(&self.store, &scan.id, payload, now).await {
            Ok(item) => item,
            Err(e) => {
                if let Err(rollback) = self.store.scans().delete(&scan.id).await {
                    warn!(scan_id = %scan.id, error = %rollback, "orphan scan left behind");
                }
                return Err(e);
            }
        };
        if let Err(e) = self.store.draft().delete(DRAFT_KEY).await {
            warn!(error = %e, "draft not cleared");
        }
        info!(scan_id = %scan.id, photos = scan.photos.len(), online, "scan finalized");

        if online {
            self.submit_now(&mut scan, &item).await;
        }
        Ok(scan)
    }

    /// 即時送信。失敗してもキュー項目が残るだけでエラーにはしない
    async fn submit_now(&self, scan: &mut Scan, item: &QueueItem) {
        let result = match self.analyzer.analyze(&item.payload).await {
            Ok(result) => result,
            Err(e) => {
                warn!(scan_id = %scan.id, error = %e, "submission failed, queued for retry");
                self.leave_queued(scan).await;
                return;
            }
        };

        scan.apply_result(result, Utc::now());
        if let Err(e) = self.store.scans().put(scan).await {
            warn!(scan_id = %scan.id, error = %e, "result not saved, queued for retry");
            self.leave_queued(scan).await;
            return;
        }
        info!(scan_id = %scan.id, status = %scan.status, "scan analyzed");

        // 残っても次回の同期で再送・上書きされるだけ
        if let Err(e) = self.store.queue().delete(&item.id).await {
            warn!(queue_id = %item.id, error = %e, "queue item not removed");
        }
    }

    async fn leave_queued(&self, scan: &mut Scan) {
        scan.mark_queued();
        if let Err(e) = self.store.scans().put(scan).await {
            warn!(scan_id = %scan.id, error = %e, "scan status not updated");
        }
    }

    fn drain_permit(&self) -> Option<LockGuard> {
        match self.store.drain_lock().try_acquire() {
            Ok(Some(permit)) => Some(permit),
            Ok(None) => {
                info!("sync in progress, submission left to the queue");
                None
            }
            Err(e) => {
                warn!(error = %e, "drain lock failed, submission left to the queue");
                None
            }
        }
    }
}

/// 必須項目チェック
pub fn validate(draft: &Draft) -> Result<()> {
    if draft.photos.is_empty() {
        return Err(ShoelaceError::Validation("写真を1枚以上追加してください".into()));
    }
    if draft.location_tag.trim().is_empty() {
        return Err(ShoelaceError::Validation("ロケーションタグは必須です".into()));
    }
    Ok(())
}
