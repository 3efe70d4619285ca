//! JobLookup port - ジョブメタデータの参照

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{JobLocator, LookupError};

/// JobRecord はジョブの記録のうち解決に必要な部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// ジョブ結果ページの URL。設定の接頭辞を除くとストレージパスになる
    pub status_url: String,
}

impl JobRecord {
    pub fn new(status_url: impl Into<String>) -> Self {
        Self {
            status_url: status_url.into(),
        }
    }
}

#[async_trait]
pub trait JobLookup: Send + Sync {
    async fn get_job(&self, locator: &JobLocator) -> Result<JobRecord, LookupError>;
}
