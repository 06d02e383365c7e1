//! 接続状態
//!
//! 同期的に読めるオンライン/オフライン状態と、
//! オンライン復帰時にキュー同期を起動するタスク。

use crate::sync::QueueSynchronizer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// 状態が変わった時だけ購読側に通知される
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "connectivity changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// オフライン → オンラインの遷移ごとに `sync_queue` を実行する
pub fn spawn_reconnect_sync(
    connectivity: Connectivity,
    synchronizer: Arc<QueueSynchronizer>,
) -> JoinHandle<()> {
    let mut rx = connectivity.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let online = *rx.borrow_and_update();
            if online {
                debug!("online event: sync queue");
                synchronizer.sync_queue().await;
            }
        }
    })
}

/// 解析サービスに到達できるか（HTTP応答があればオンライン）
pub async fn probe(endpoint: &str, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(_) => return false,
    };
    match client.head(endpoint).send().await {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "probe failed");
            false
        }
    }
}
