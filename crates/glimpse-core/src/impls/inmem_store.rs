//! InMemoryArtifactStore / InMemoryPodLogs - 開発用のストレージと pod ログ
//!
//! # 学習ポイント
//! - handle は状態を Arc で共有し、`size()` の時点で初めて中身を見る
//! - 障害の再現は `set_unavailable` で行う（一覧も実在確認も失敗する）

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Artifact, ArtifactError, ArtifactHandle, CANONICAL_LOG_NAME, JobLocator, SEPARATOR,
    byte_range,
};
use crate::ports::{ArtifactStore, PodLogSource};

type Objects = HashMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Debug, Default)]
struct StoreState {
    /// パス -> (artifact 名 -> 内容)
    objects: RwLock<Objects>,
    unavailable: AtomicBool,
}

impl StoreState {
    fn check_available(&self) -> Result<(), ArtifactError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(ArtifactError::Backend("storage unavailable".to_string()));
        }
        Ok(())
    }
}

/// InMemoryArtifactStore は開発用のオブジェクトストレージ
///
/// 未知のパスの一覧は空（オブジェクトストレージと同じ）。空のパスは不正。
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    state: Arc<StoreState>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, path: &str, name: &str, contents: impl Into<Vec<u8>>) {
        self.state
            .objects
            .write()
            .await
            .entry(normalize(path).to_string())
            .or_default()
            .insert(name.to_string(), contents.into());
    }

    pub async fn remove(&self, path: &str, name: &str) -> bool {
        self.state
            .objects
            .write()
            .await
            .get_mut(normalize(path))
            .is_some_and(|names| names.remove(name).is_some())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

fn normalize(path: &str) -> &str {
    path.trim_end_matches(SEPARATOR)
}

fn checked_path(path: &str) -> Result<&str, ArtifactError> {
    let path = normalize(path);
    if path.is_empty() {
        return Err(ArtifactError::InvalidPath(path.to_string()));
    }
    Ok(path)
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn list(&self, path: &str) -> Result<Vec<String>, ArtifactError> {
        self.state.check_available()?;
        let path = checked_path(path)?;
        Ok(self
            .state
            .objects
            .read()
            .await
            .get(path)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn open(
        &self,
        path: &str,
        name: &str,
        size_limit: u64,
    ) -> Result<ArtifactHandle, ArtifactError> {
        let path = checked_path(path)?;
        Ok(Arc::new(MemoryArtifact {
            state: Arc::clone(&self.state),
            path: path.to_string(),
            name: name.to_string(),
            size_limit,
        }))
    }
}

#[derive(Debug)]
struct MemoryArtifact {
    state: Arc<StoreState>,
    path: String,
    name: String,
    size_limit: u64,
}

impl MemoryArtifact {
    async fn contents(&self) -> Result<Vec<u8>, ArtifactError> {
        self.state.check_available()?;
        self.state
            .objects
            .read()
            .await
            .get(&self.path)
            .and_then(|names| names.get(&self.name))
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound {
                path: self.path.clone(),
                name: self.name.clone(),
            })
    }
}

#[async_trait]
impl Artifact for MemoryArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn size_limit(&self) -> u64 {
        self.size_limit
    }

    fn canonical_link(&self) -> String {
        format!("memory://{}/{}", self.path, self.name)
    }

    async fn size(&self) -> Result<u64, ArtifactError> {
        Ok(self.contents().await?.len() as u64)
    }

    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, ArtifactError> {
        Ok(byte_range(&self.contents().await?, offset, len))
    }
}

/// StaticArtifact は取得時点の内容を保持する handle
#[derive(Debug, Clone)]
pub struct StaticArtifact {
    name: String,
    link: String,
    contents: Vec<u8>,
    size_limit: u64,
}

impl StaticArtifact {
    pub fn new(
        name: impl Into<String>,
        link: impl Into<String>,
        contents: impl Into<Vec<u8>>,
        size_limit: u64,
    ) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            contents: contents.into(),
            size_limit,
        }
    }
}

#[async_trait]
impl Artifact for StaticArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn size_limit(&self) -> u64 {
        self.size_limit
    }

    fn canonical_link(&self) -> String {
        self.link.clone()
    }

    async fn size(&self) -> Result<u64, ArtifactError> {
        Ok(self.contents.len() as u64)
    }

    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, ArtifactError> {
        Ok(byte_range(&self.contents, offset, len))
    }
}

/// InMemoryPodLogs は開発用の pod ログ取得
///
/// `requests()` で fetch が呼ばれた回数を確認できる。
#[derive(Debug, Default)]
pub struct InMemoryPodLogs {
    logs: RwLock<HashMap<JobLocator, Vec<u8>>>,
    requests: AtomicUsize,
}

impl InMemoryPodLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, locator: JobLocator, log: impl Into<Vec<u8>>) {
        self.logs.write().await.insert(locator, log.into());
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PodLogSource for InMemoryPodLogs {
    async fn fetch(
        &self,
        locator: &JobLocator,
        size_limit: u64,
    ) -> Result<ArtifactHandle, ArtifactError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let log = self
            .logs
            .read()
            .await
            .get(locator)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound {
                path: locator.to_string(),
                name: CANONICAL_LOG_NAME.to_string(),
            })?;
        Ok(Arc::new(StaticArtifact::new(
            CANONICAL_LOG_NAME,
            format!("pod://{locator}/{CANONICAL_LOG_NAME}"),
            log,
            size_limit,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_returns_sorted_names() {
        let store = InMemoryArtifactStore::new();
        store.put("bucket/job/1", "z.txt", "z").await;
        store.put("bucket/job/1/", "a.txt", "a").await;

        let names = store.list("bucket/job/1").await.unwrap();
        assert_eq!(names, vec!["a.txt", "z.txt"]);
        assert!(store.list("bucket/job/2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_path_is_invalid() {
        let store = InMemoryArtifactStore::new();
        assert!(matches!(
            store.list("").await,
            Err(ArtifactError::InvalidPath(_))
        ));
        assert!(matches!(
            store.open("", "a.txt", 10),
            Err(ArtifactError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn open_does_not_check_existence() {
        let store = InMemoryArtifactStore::new();
        let handle = store.open("bucket/job/1", "missing.txt", 10).unwrap();
        assert_eq!(handle.name(), "missing.txt");
        assert!(matches!(
            handle.size().await,
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn handle_sees_later_writes_and_removal() {
        let store = InMemoryArtifactStore::new();
        let handle = store.open("bucket/job/1", "a.txt", 10).unwrap();
        store.put("bucket/job/1", "a.txt", "abc").await;
        assert_eq!(handle.size().await.unwrap(), 3);

        assert!(store.remove("bucket/job/1", "a.txt").await);
        assert!(handle.size().await.is_err());
    }

    #[tokio::test]
    async fn unavailable_store_fails_everything() {
        let store = InMemoryArtifactStore::new();
        store.put("bucket/job/1", "a.txt", "abc").await;
        store.set_unavailable(true);

        assert!(matches!(
            store.list("bucket/job/1").await,
            Err(ArtifactError::Backend(_))
        ));
        let handle = store.open("bucket/job/1", "a.txt", 10).unwrap();
        assert!(handle.size().await.is_err());

        store.set_unavailable(false);
        assert_eq!(handle.read_all().await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn pod_logs_count_requests() {
        let pods = InMemoryPodLogs::new();
        let locator = JobLocator::new("ci-unit", "7");
        pods.insert(locator.clone(), "running...").await;

        let handle = pods.fetch(&locator, 100).await.unwrap();
        assert_eq!(handle.name(), CANONICAL_LOG_NAME);
        assert_eq!(handle.canonical_link(), "pod://ci-unit/7/build-log.txt");
        assert_eq!(handle.read_all().await.unwrap(), b"running...");
        assert_eq!(handle.read_tail(3).await.unwrap(), b"...");

        assert!(pods.fetch(&JobLocator::new("ci-unit", "8"), 100).await.is_err());
        assert_eq!(pods.requests(), 2);
    }
}
