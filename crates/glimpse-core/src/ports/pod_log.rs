//! PodLogSource port - 実行中 pod からのビルドログ取得

use async_trait::async_trait;

use crate::domain::{ArtifactError, ArtifactHandle, JobLocator};

/// PodLogSource はストレージにまだ無いビルドログを pod から取得する
#[async_trait]
pub trait PodLogSource: Send + Sync {
    async fn fetch(
        &self,
        locator: &JobLocator,
        size_limit: u64,
    ) -> Result<ArtifactHandle, ArtifactError>;
}
