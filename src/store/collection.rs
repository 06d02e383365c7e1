//! 1コレクション = 1 JSONファイル
//!
//! ファイル形式は `{ "version": 1, "entries": { key: record } }`。
//! put/delete はファイル全体を一意な名前の一時ファイルに書き出してから rename するため、
//! 途中状態が観測されることはない。
//! 読み込み→変更→書き込みはデータディレクトリのロック（[`DirLock`]）内で行うので、
//! 同じディレクトリを開いた別ハンドル・別プロセスの書き込みと混ざらない。

use super::lock::DirLock;
use crate::error::{Result, ShoelaceError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// コレクションに格納できるレコード
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// コレクション名（ファイル名にもなる）
    const COLLECTION: &'static str;

    /// 主キー
    fn key(&self) -> &str;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: DeserializeOwned"))]
struct CollectionFile<T> {
    /// バージョン（互換性チェック用）
    version: u32,
    entries: BTreeMap<String, T>,
}

impl<T> CollectionFile<T> {
    const CURRENT_VERSION: u32 = 1;

    fn empty() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// 名前付きコレクション
///
/// `get_all` の順序はキー順（挿入順ではない）。
#[derive(Debug)]
pub struct Collection<T> {
    path: PathBuf,
    lock: DirLock,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Collection<T> {
    pub fn new(dir: &Path, lock: DirLock) -> Self {
        Self {
            path: dir.join(format!("{}.json", T::COLLECTION)),
            lock,
            _record: PhantomData,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        let mut file = self.read_file().await?;
        Ok(file.entries.remove(key))
    }

    pub async fn get_all(&self) -> Result<Vec<T>> {
        let file = self.read_file().await?;
        Ok(file.entries.into_values().collect())
    }

    /// 主キーで上書き保存（upsert）
    pub async fn put(&self, record: &T) -> Result<()>
    where
        T: Clone,
    {
        let _guard = self.lock.acquire().await?;
        let mut file = self.read_file().await?;
        file.entries.insert(record.key().to_string(), record.clone());
        self.write_file(&file).await?;
        debug!(collection = T::COLLECTION, key = record.key(), "put");
        Ok(())
    }

    /// 既存レコードから新しいレコードを作り、同じロック内で保存する
    pub async fn insert_with<F>(&self, build: F) -> Result<T>
    where
        T: Clone,
        F: FnOnce(&[&T]) -> T,
    {
        let _guard = self.lock.acquire().await?;
        let mut file = self.read_file().await?;
        let record = {
            let existing: Vec<&T> = file.entries.values().collect();
            build(&existing)
        };
        file.entries.insert(record.key().to_string(), record.clone());
        self.write_file(&file).await?;
        debug!(collection = T::COLLECTION, key = record.key(), "insert");
        Ok(record)
    }

    /// キーが存在しなくてもエラーにしない
    pub async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.lock.acquire().await?;
        let mut file = self.read_file().await?;
        if file.entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_file(&file).await?;
        debug!(collection = T::COLLECTION, key, "delete");
        Ok(())
    }

    async fn read_file(&self) -> Result<CollectionFile<T>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CollectionFile::empty());
            }
            Err(e) => return Err(storage_error(&self.path, "読み込み失敗", e)),
        };

        let file: CollectionFile<T> = serde_json::from_slice(&bytes)
            .map_err(|e| storage_error(&self.path, "破損しています", e))?;

        // バージョンチェック
        if file.version != CollectionFile::<T>::CURRENT_VERSION {
            return Err(ShoelaceError::Storage(format!(
                "{}: 未対応のバージョン {}",
                self.path.display(),
                file.version
            )));
        }

        Ok(file)
    }

    async fn write_file(&self, file: &CollectionFile<T>) -> Result<()> {
        let json = serde_json::to_vec_pretty(file)
            .map_err(|e| storage_error(&self.path, "シリアライズ失敗", e))?;
        let tmp_path = self
            .path
            .with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));

        let write = async {
            let mut tmp = tokio::fs::File::create(&tmp_path).await?;
            tmp.write_all(&json).await?;
            tmp.sync_all().await?;
            tokio::fs::rename(&tmp_path, &self.path).await
        };

        if let Err(e) = write.await {
            warn!(path = %tmp_path.display(), error = %e, "コレクション書き込み中断");
            tokio::fs::remove_file(&tmp_path).await.ok();
            return Err(storage_error(&self.path, "書き込み失敗", e));
        }
        Ok(())
    }
}

fn storage_error(path: &Path, what: &str, e: impl std::fmt::Display) -> ShoelaceError {
    ShoelaceError::Storage(format!("{}: {}: {}", path.display(), what, e))
}
