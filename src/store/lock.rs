//! データディレクトリのプロセス間ロック
//!
//! ロックファイルに対するアドバイザリロック（flock / LockFileEx）。
//! 取得したハンドルを保持している間だけ有効で、drop で解放される。
//! 同じプロセス内でも開いたハンドルごとに排他される。

use crate::error::{Result, ShoelaceError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// ストア書き込み用のロックファイル名
pub const WRITE_LOCK_FILE: &str = "store.lock";

/// キュー同期用のロックファイル名
pub const DRAIN_LOCK_FILE: &str = "sync.lock";

#[derive(Debug, Clone)]
pub struct DirLock {
    path: PathBuf,
}

/// 保持している間ロックが有効
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
}

impl DirLock {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(name),
        }
    }

    /// 取得できるまで待つ
    pub async fn acquire(&self) -> Result<LockGuard> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let file = open_lock_file(&path)?;
            file.lock_exclusive().map_err(|e| lock_error(&path, e))?;
            Ok(LockGuard { _file: file })
        })
        .await
        .map_err(|e| lock_error(&self.path, e))?
    }

    /// 他のハンドルが保持していれば None
    pub fn try_acquire(&self) -> Result<Option<LockGuard>> {
        let file = open_lock_file(&self.path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(LockGuard { _file: file })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(lock_error(&self.path, e)),
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| lock_error(path, e))
}

fn lock_error(path: &Path, e: impl std::fmt::Display) -> ShoelaceError {
    ShoelaceError::Storage(format!("{}: ロック取得失敗: {}", path.display(), e))
}
