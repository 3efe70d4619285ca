//! InMemoryJobLookup - 開発用のジョブメタデータ

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{JobLocator, LookupError};
use crate::ports::{JobLookup, JobRecord};

#[derive(Debug, Default)]
pub struct InMemoryJobLookup {
    jobs: RwLock<HashMap<JobLocator, JobRecord>>,
}

impl InMemoryJobLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: impl IntoIterator<Item = (JobLocator, JobRecord)>) -> Self {
        Self {
            jobs: RwLock::new(jobs.into_iter().collect()),
        }
    }

    pub async fn insert(&self, locator: JobLocator, record: JobRecord) {
        self.jobs.write().await.insert(locator, record);
    }
}

#[async_trait]
impl JobLookup for InMemoryJobLookup {
    async fn get_job(&self, locator: &JobLocator) -> Result<JobRecord, LookupError> {
        self.jobs
            .read()
            .await
            .get(locator)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(locator.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_known_and_unknown_jobs() {
        let jobs = InMemoryJobLookup::with_jobs([(
            JobLocator::new("ci-unit", "1"),
            JobRecord::new("https://ci/view/bucket/ci-unit/1"),
        )]);
        jobs.insert(
            JobLocator::new("ci-e2e", "2"),
            JobRecord::new("https://ci/view/bucket/ci-e2e/2"),
        )
        .await;

        let record = jobs.get_job(&JobLocator::new("ci-e2e", "2")).await.unwrap();
        assert_eq!(record.status_url, "https://ci/view/bucket/ci-e2e/2");

        let err = jobs
            .get_job(&JobLocator::new("ci-unit", "9"))
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::NotFound(l) if l.build_id == "9"));
    }
}
