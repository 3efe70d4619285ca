//! ArtifactStore port - オブジェクトストレージ（GCS / ローカル / InMemory）

use async_trait::async_trait;

use crate::domain::{ArtifactError, ArtifactHandle};

/// ArtifactStore はストレージパス配下の artifact を列挙し、handle を開く
///
/// # 設計原則
/// - `list` はパス配下の artifact 名（パスからの相対名）を返す
/// - `open` は I/O を行わない。実在確認は handle の `size()` で行う
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn list(&self, path: &str) -> Result<Vec<String>, ArtifactError>;

    fn open(&self, path: &str, name: &str, size_limit: u64)
    -> Result<ArtifactHandle, ArtifactError>;
}
