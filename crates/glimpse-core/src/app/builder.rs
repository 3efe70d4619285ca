//! ServiceBuilder - 協調者の注入とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンでの依存注入（各 port を `Arc<dyn _>` で受け取る）
//! - 起動時検証（Fail-fast 設計）
//! - 不足している協調者をまとめて報告する

use std::sync::Arc;

use super::fetcher::ArtifactFetcher;
use super::lister::ArtifactLister;
use super::resolver::JobResolver;
use super::service::ArtifactService;
use crate::config::ResolverConfig;
use crate::domain::{KindTokenError, KindTokens};
use crate::impls::TracingEventSink;
use crate::ports::{ArtifactStore, ConfigSource, EventSink, JobLookup, PodLogSource};

/// ServiceBuilder は ArtifactService を構築
///
/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::from_config(&config)
///     .storage(Arc::new(store))
///     .job_lookup(Arc::new(jobs))
///     .pod_logs(Arc::new(pods))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - storage / job_lookup / pod_logs / config は必須
/// - event_sink を省略すると TracingEventSink
/// - kind トークンと並列度は build() 時に検証する
pub struct ServiceBuilder {
    kinds: KindTokens,
    probe_concurrency: usize,
    storage: Option<Arc<dyn ArtifactStore>>,
    jobs: Option<Arc<dyn JobLookup>>,
    pod_logs: Option<Arc<dyn PodLogSource>>,
    config: Option<Arc<dyn ConfigSource>>,
    events: Option<Arc<dyn EventSink>>,
}

/// BuildError はサービス構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing collaborators: {0:?}. These must be provided before build().")]
    MissingCollaborators(Vec<&'static str>),

    #[error(transparent)]
    InvalidKinds(#[from] KindTokenError),

    #[error("probe concurrency must be at least 1")]
    InvalidConcurrency,
}

impl ServiceBuilder {
    /// 新しい ServiceBuilder を作成
    pub fn new() -> Self {
        Self {
            kinds: KindTokens::default(),
            probe_concurrency: 1,
            storage: None,
            jobs: None,
            pod_logs: None,
            config: None,
            events: None,
        }
    }

    /// kind トークン・並列度・接頭辞（ConfigSource）を設定値から取る
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new()
            .kinds(config.kind_tokens())
            .probe_concurrency(config.probe_concurrency)
            .config(Arc::new(config.clone()))
    }

    /// kind トークンを設定
    pub fn kinds(mut self, kinds: KindTokens) -> Self {
        self.kinds = kinds;
        self
    }

    /// probe の並列度を設定（1 なら逐次）
    pub fn probe_concurrency(mut self, probe_concurrency: usize) -> Self {
        self.probe_concurrency = probe_concurrency;
        self
    }

    /// オブジェクトストレージを設定
    pub fn storage(mut self, storage: Arc<dyn ArtifactStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// ジョブ情報の取得元を設定
    pub fn job_lookup(mut self, jobs: Arc<dyn JobLookup>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// pod ログの取得元を設定
    pub fn pod_logs(mut self, pod_logs: Arc<dyn PodLogSource>) -> Self {
        self.pod_logs = Some(pod_logs);
        self
    }

    /// 実行中に設定を差し替えるなら SharedConfig を渡す
    pub fn config(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = Some(config);
        self
    }

    /// EventSink を設定
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// ArtifactService を構築（不足・不正があればエラー）
    pub fn build(self) -> Result<ArtifactService, BuildError> {
        self.kinds.validate()?;
        if self.probe_concurrency == 0 {
            return Err(BuildError::InvalidConcurrency);
        }

        let (storage, jobs, pod_logs, config) =
            match (self.storage, self.jobs, self.pod_logs, self.config) {
                (Some(storage), Some(jobs), Some(pod_logs), Some(config)) => {
                    (storage, jobs, pod_logs, config)
                }
                (storage, jobs, pod_logs, config) => {
                    let missing = [
                        ("storage", storage.is_none()),
                        ("job_lookup", jobs.is_none()),
                        ("pod_logs", pod_logs.is_none()),
                        ("config", config.is_none()),
                    ]
                    .into_iter()
                    .filter(|(_, missing)| *missing)
                    .map(|(name, _)| name)
                    .collect();
                    return Err(BuildError::MissingCollaborators(missing));
                }
            };

        Ok(ArtifactService {
            kinds: self.kinds,
            resolver: JobResolver::new(jobs, config),
            lister: ArtifactLister::new(Arc::clone(&storage)),
            fetcher: ArtifactFetcher::new(storage, pod_logs, self.probe_concurrency),
            events: self
                .events
                .unwrap_or_else(|| Arc::new(TracingEventSink) as Arc<dyn EventSink>),
        })
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryArtifactStore, InMemoryJobLookup, InMemoryPodLogs};

    fn complete() -> ServiceBuilder {
        ServiceBuilder::from_config(&ResolverConfig::default())
            .storage(Arc::new(InMemoryArtifactStore::new()))
            .job_lookup(Arc::new(InMemoryJobLookup::new()))
            .pod_logs(Arc::new(InMemoryPodLogs::new()))
    }

    #[test]
    fn test_build_success() {
        let service = complete().build().unwrap();
        assert_eq!(service.kinds(), &KindTokens::default());
    }

    #[test]
    fn test_build_missing_collaborators() {
        let result = ServiceBuilder::new()
            .storage(Arc::new(InMemoryArtifactStore::new()))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingCollaborators(missing))
                if missing == vec!["job_lookup", "pod_logs", "config"]
        ));
    }

    #[test]
    fn test_build_invalid_kinds() {
        let result = complete().kinds(KindTokens::new("gcs", "gcs")).build();
        assert!(matches!(
            result,
            Err(BuildError::InvalidKinds(KindTokenError::Duplicate(_)))
        ));
    }

    #[test]
    fn test_build_zero_concurrency() {
        let result = complete().probe_concurrency(0).build();
        assert!(matches!(result, Err(BuildError::InvalidConcurrency)));
    }
}
