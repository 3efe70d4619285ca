//! JobResolver - ジョブ参照からストレージパスへの解決
//!
//! # フロー
//! 1. key を `<job>/<build>` に分解
//! 2. JobLookup で status URL を取得
//! 3. 設定の接頭辞で始まることを確認し、取り除いた残りをストレージパスとする

use std::sync::Arc;

use crate::domain::{JobLocator, ResolveError};
use crate::ports::{ConfigSource, JobLookup};

pub struct JobResolver {
    jobs: Arc<dyn JobLookup>,
    config: Arc<dyn ConfigSource>,
}

impl JobResolver {
    pub fn new(jobs: Arc<dyn JobLookup>, config: Arc<dyn ConfigSource>) -> Self {
        Self { jobs, config }
    }

    pub async fn resolve(&self, key: &str) -> Result<String, ResolveError> {
        let locator = JobLocator::parse(key)?;
        self.resolve_locator(&locator).await
    }

    pub async fn resolve_locator(&self, locator: &JobLocator) -> Result<String, ResolveError> {
        let job = self
            .jobs
            .get_job(locator)
            .await
            .map_err(|source| ResolveError::JobLookupFailed {
                locator: locator.clone(),
                source,
            })?;
        strip_job_prefix(&job.status_url, &self.config.job_url_prefix())
    }
}

/// status URL から接頭辞を取り除く
pub fn strip_job_prefix(url: &str, prefix: &str) -> Result<String, ResolveError> {
    url.strip_prefix(prefix)
        .map(str::to_string)
        .ok_or_else(|| ResolveError::PrefixMismatch {
            url: url.to_string(),
            prefix: prefix.to_string(),
        })
}
