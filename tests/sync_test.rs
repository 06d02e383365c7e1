//! キュー同期のテスト

mod support;

use async_trait::async_trait;
use chrono::Utc;
use shoelace_common::{AnalysisResult, Draft, QueueItem, ScanStatus, SubmissionPayload};
use shoelace_scan::analyzer::AnalysisService;
use shoelace_scan::connectivity::{spawn_reconnect_sync, Connectivity};
use shoelace_scan::error::Result;
use shoelace_scan::scanner::DataUrlReader;
use shoelace_scan::status::{RecordingSink, Tone};
use shoelace_scan::store::Store;
use shoelace_scan::sync::SyncReport;
use shoelace_scan::App;
use std::sync::Arc;
use std::time::Duration;
use support::{harness, network_error, result_with, write_png, Harness, ScriptedAnalyzer};
use tempfile::tempdir;
use tokio::sync::Notify;

/// オフラインで確定したスキャンを n 件作る（作成順のスキャンIDを返す）
async fn queue_offline_scans(h: &Harness, dir: &std::path::Path, n: usize) -> Vec<String> {
    h.app.connectivity.set_online(false);
    let mut ids = Vec::new();
    for i in 0..n {
        let draft = h.app.drafts.load().await.unwrap();
        let draft = h
            .app
            .drafts
            .add_photos(&draft, &[write_png(dir, &format!("{}.png", i))])
            .await
            .unwrap();
        let draft = h.app.drafts.update_meta(&draft, &format!("Yard {}", i), "").await.unwrap();
        ids.push(h.app.submitter.finalize(&draft).await.unwrap().id);
    }
    h.app.connectivity.set_online(true);
    ids
}

/// オフラインでは何もしない
#[tokio::test]
async fn test_offline_has_no_side_effects() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(&dir.path().join("data"), true, ScriptedAnalyzer::default()).await;
    queue_offline_scans(&h, dir.path(), 1).await;
    h.app.connectivity.set_online(false);

    let report = h.app.synchronizer.sync_queue().await;

    assert_eq!(report, SyncReport::Offline);
    assert!(h.analyzer.calls().is_empty());
    assert_eq!(h.app.store.queue().get_all().await.unwrap().len(), 1);
    let last = h.sink.last().unwrap();
    assert_eq!(last.message, "Offline - queued");
    assert_eq!(last.tone, Tone::Warning);
}

/// 空のキューを2回同期しても何も起きない
#[tokio::test]
async fn test_empty_queue_idempotent() {
    let dir = tempdir().expect("Failed to create temp dir");
    let data = dir.path().join("data");
    let h = harness(&data, true, ScriptedAnalyzer::default()).await;

    assert_eq!(h.app.synchronizer.sync_queue().await, SyncReport::Idle);
    assert_eq!(h.app.synchronizer.sync_queue().await, SyncReport::Idle);

    assert!(h.analyzer.calls().is_empty());
    assert!(!data.join("queue.json").exists());
    assert!(!data.join("scans.json").exists());
    let last = h.sink.last().unwrap();
    assert_eq!(last.message, "Queue idle");
    assert_eq!(last.tone, Tone::Good);
}

/// 全件成功
#[tokio::test]
async fn test_all_items_synced() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(
        &dir.path().join("data"),
        true,
        ScriptedAnalyzer::new(vec![
            Ok(result_with(&[0.9, 0.8])),
            Ok(result_with(&[0.9, 0.6])),
            Ok(result_with(&[0.9, 0.5])),
        ]),
    )
    .await;
    let ids = queue_offline_scans(&h, dir.path(), 3).await;

    let report = h.app.synchronizer.sync_queue().await;

    assert_eq!(report, SyncReport::Synced { count: 3 });
    assert_eq!(h.analyzer.called_scan_ids(), ids);
    assert!(h.app.store.queue().get_all().await.unwrap().is_empty());

    let expected = [ScanStatus::Ready, ScanStatus::NeedsReview, ScanStatus::NeedsBetterPhoto];
    for (id, status) in ids.iter().zip(expected) {
        let scan = h.app.store.scans().get(id).await.unwrap().unwrap();
        assert_eq!(scan.status, status);
        assert!(scan.result.is_some());
        assert!(scan.synced_at.is_some());
    }

    let messages: Vec<String> = h.sink.updates().into_iter().map(|u| u.message).collect();
    assert!(messages.contains(&"Syncing 3...".to_string()));
    assert_eq!(messages.last().unwrap(), "Queue synced");
}

/// 2件目で失敗したら停止し、2件目以降はそのまま残る
#[tokio::test]
async fn test_stop_at_first_failure() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(
        &dir.path().join("data"),
        true,
        ScriptedAnalyzer::new(vec![Ok(result_with(&[0.9])), Err(network_error())]),
    )
    .await;
    let ids = queue_offline_scans(&h, dir.path(), 3).await;
    let before = h.app.synchronizer.pending().await.unwrap();

    let report = h.app.synchronizer.sync_queue().await;

    assert!(matches!(report, SyncReport::Paused { synced: 1, remaining: 2, .. }));
    // 3件目は送信されない
    assert_eq!(h.analyzer.called_scan_ids(), ids[..2].to_vec());

    let first = h.app.store.scans().get(&ids[0]).await.unwrap().unwrap();
    assert_eq!(first.status, ScanStatus::Ready);

    let after = h.app.synchronizer.pending().await.unwrap();
    assert_eq!(after, before[1..].to_vec());
    for id in &ids[1..] {
        let scan = h.app.store.scans().get(id).await.unwrap().unwrap();
        assert_eq!(scan.status, ScanStatus::Queued);
        assert!(scan.result.is_none());
    }

    let last = h.sink.last().unwrap();
    assert_eq!(last.message, "Sync paused - check connection");
    assert_eq!(last.tone, Tone::Warning);
}

/// 停止後の再実行は残りの先頭から
#[tokio::test]
async fn test_resume_after_pause() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(
        &dir.path().join("data"),
        true,
        ScriptedAnalyzer::new(vec![Ok(result_with(&[0.9])), Err(network_error())]),
    )
    .await;
    let ids = queue_offline_scans(&h, dir.path(), 3).await;

    h.app.synchronizer.sync_queue().await;
    let report = h.app.synchronizer.sync_queue().await;

    assert_eq!(report, SyncReport::Synced { count: 2 });
    let expected = vec![ids[0].clone(), ids[1].clone(), ids[1].clone(), ids[2].clone()];
    assert_eq!(h.analyzer.called_scan_ids(), expected);
    assert!(h.app.store.queue().get_all().await.unwrap().is_empty());
}

/// スキャンが消えていてもキュー項目は削除する
#[tokio::test]
async fn test_missing_scan_still_dequeued() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(&dir.path().join("data"), true, ScriptedAnalyzer::default()).await;
    let ids = queue_offline_scans(&h, dir.path(), 1).await;
    h.app.store.scans().delete(&ids[0]).await.unwrap();

    let report = h.app.synchronizer.sync_queue().await;

    assert_eq!(report, SyncReport::Synced { count: 1 });
    assert!(h.app.store.queue().get_all().await.unwrap().is_empty());
    assert!(h.app.store.scans().get(&ids[0]).await.unwrap().is_none());
}

/// キー順ではなく seq 順に処理する
#[tokio::test]
async fn test_processes_in_seq_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(&dir.path().join("data"), true, ScriptedAnalyzer::default()).await;

    for (id, scan_id, seq) in [("queue_c", "scan_1", 1), ("queue_a", "scan_2", 2), ("queue_b", "scan_3", 3)] {
        let item = QueueItem {
            id: id.into(),
            scan_id: scan_id.into(),
            payload: SubmissionPayload {
                scan_id: scan_id.into(),
                location_tag: "Yard A".into(),
                notes: String::new(),
                manual_parts: vec![],
                photos: vec![],
                photo_count: 0,
            },
            created_at: Utc::now(),
            seq,
        };
        h.app.store.queue().put(&item).await.unwrap();
    }

    h.app.synchronizer.sync_queue().await;
    assert_eq!(h.analyzer.called_scan_ids(), vec!["scan_1", "scan_2", "scan_3"]);
}

/// enqueue は seq を単調増加で採番する
#[tokio::test]
async fn test_enqueue_assigns_increasing_seq() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(&dir.path().join("data"), true, ScriptedAnalyzer::default()).await;
    let ids = queue_offline_scans(&h, dir.path(), 3).await;

    let pending = h.app.synchronizer.pending().await.unwrap();
    let seqs: Vec<u64> = pending.iter().map(|i| i.seq).collect();
    let scan_ids: Vec<String> = pending.iter().map(|i| i.scan_id.clone()).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(scan_ids, ids);
}

/// 応答を止めておける解析サービス
struct GatedAnalyzer {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl AnalysisService for GatedAnalyzer {
    async fn analyze(&self, _payload: &SubmissionPayload) -> Result<AnalysisResult> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(result_with(&[0.9]))
    }
}

/// 同期中に呼ばれた同期は何もしない
#[tokio::test]
async fn test_overlapping_sync_is_busy() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = Arc::new(Store::open(dir.path()).await.unwrap());
    let analyzer = Arc::new(GatedAnalyzer {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let sink = Arc::new(RecordingSink::default());
    let app = App::with_parts(
        store,
        analyzer.clone(),
        Arc::new(DataUrlReader),
        Connectivity::new(false),
        sink.clone(),
    );

    let draft = Draft {
        photos: vec![],
        location_tag: "Yard A".into(),
        notes: String::new(),
    };
    let photo_dir = tempdir().expect("Failed to create temp dir");
    let draft = app
        .drafts
        .add_photos(&draft, &[write_png(photo_dir.path(), "a.png")])
        .await
        .unwrap();
    app.submitter.finalize(&draft).await.unwrap();
    app.connectivity.set_online(true);

    let synchronizer = app.synchronizer.clone();
    let first = tokio::spawn(async move { synchronizer.sync_queue().await });

    analyzer.entered.notified().await;
    assert_eq!(app.synchronizer.sync_queue().await, SyncReport::Busy);
    assert_eq!(app.store.queue().get_all().await.unwrap().len(), 1);

    analyzer.release.notify_one();
    assert_eq!(first.await.unwrap(), SyncReport::Synced { count: 1 });
    assert!(app.store.queue().get_all().await.unwrap().is_empty());
}

/// 同じデータディレクトリを開いた別のアプリからの同期も Busy になり、二重送信しない
#[tokio::test]
async fn test_sync_from_other_handle_is_busy() {
    let dir = tempdir().expect("Failed to create temp dir");
    let data = dir.path().join("data");
    let gated = Arc::new(GatedAnalyzer {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let first = App::with_parts(
        Arc::new(Store::open(&data).await.unwrap()),
        gated.clone(),
        Arc::new(DataUrlReader),
        Connectivity::new(true),
        Arc::new(RecordingSink::default()),
    );
    let second = harness(&data, true, ScriptedAnalyzer::default()).await;
    queue_offline_scans(&second, dir.path(), 1).await;

    let synchronizer = first.synchronizer.clone();
    let running = tokio::spawn(async move { synchronizer.sync_queue().await });

    gated.entered.notified().await;
    assert_eq!(second.app.synchronizer.sync_queue().await, SyncReport::Busy);
    assert!(second.analyzer.calls().is_empty());
    assert_eq!(second.sink.last().unwrap().message, "Sync already in progress");

    gated.release.notify_one();
    assert_eq!(running.await.unwrap(), SyncReport::Synced { count: 1 });
    assert_eq!(second.app.synchronizer.sync_queue().await, SyncReport::Idle);
    assert!(second.analyzer.calls().is_empty());
}

/// オンライン復帰イベントでキューが同期される
#[tokio::test]
async fn test_reconnect_triggers_sync() {
    let dir = tempdir().expect("Failed to create temp dir");
    let h = harness(&dir.path().join("data"), true, ScriptedAnalyzer::default()).await;
    let ids = queue_offline_scans(&h, dir.path(), 2).await;
    h.app.connectivity.set_online(false);

    let handle = spawn_reconnect_sync(h.app.connectivity.clone(), h.app.synchronizer.clone());
    h.app.connectivity.set_online(true);

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if h.app.store.queue().get_all().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    handle.abort();

    assert!(drained.is_ok(), "復帰後にキューが空にならない");
    assert_eq!(h.analyzer.called_scan_ids(), ids);
}
