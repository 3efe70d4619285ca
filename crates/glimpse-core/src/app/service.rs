//! ArtifactService - 公開 API（list / fetch）
//!
//! 参照のパースとパス解決を共有し、一覧（ArtifactLister）と取得（ArtifactFetcher）に振り分ける。
//! 呼び出しが失敗するのは参照が構造的に不正な場合だけ。

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::fetcher::{ArtifactFetcher, FetchReport};
use super::lister::ArtifactLister;
use super::resolver::JobResolver;
use crate::domain::{
    ArtifactEvent, Diagnostic, FetchOutcome, JobLocator, KindTokens, ListOutcome, Operation,
    ReferenceError, SourceRef,
};
use crate::ports::EventSink;

/// ArtifactService は参照から artifact の一覧・handle を得る
///
/// 構築は [`ServiceBuilder`](super::ServiceBuilder) を使う。
pub struct ArtifactService {
    pub(crate) kinds: KindTokens,
    pub(crate) resolver: JobResolver,
    pub(crate) lister: ArtifactLister,
    pub(crate) fetcher: ArtifactFetcher,
    pub(crate) events: Arc<dyn EventSink>,
}

impl ArtifactService {
    pub fn kinds(&self) -> &KindTokens {
        &self.kinds
    }

    /// 参照が指す artifact 名の一覧。ビルドログ名は必ずちょうど一つ含まれる
    pub async fn list_artifacts(&self, reference: &str) -> Result<ListOutcome, ReferenceError> {
        let started = Instant::now();
        let source = match SourceRef::parse(reference, &self.kinds) {
            Ok(source) => source,
            Err(err) => return Err(self.reject(Operation::List, reference, err, started)),
        };

        let mut diagnostics = Vec::new();
        let path = match &source {
            SourceRef::Direct { path } => path.clone(),
            SourceRef::Job { key } => match self.resolver.resolve(key).await {
                Ok(path) => path,
                Err(err) => {
                    diagnostics.push(Diagnostic::JobResolutionFailed {
                        key: key.clone(),
                        error: err.to_string(),
                    });
                    String::new()
                }
            },
        };

        let names = self.lister.list(&path, &mut diagnostics).await;
        self.publish(reference, &diagnostics);
        self.events.emit(ArtifactEvent::ListCompleted {
            reference: reference.to_string(),
            artifacts: names.len(),
            elapsed: started.elapsed(),
        });
        Ok(ListOutcome { names, diagnostics })
    }

    /// 要求された名前ごとの handle。欠けたものは黙って除かれ、ビルドログは pod ログで補われうる
    ///
    /// `pod_name` は記録用で、pod ログはジョブ名とビルド ID で引く。
    pub async fn fetch_artifacts(
        &self,
        reference: &str,
        pod_name: &str,
        size_limit: u64,
        names: &[String],
    ) -> Result<FetchOutcome, ReferenceError> {
        let started = Instant::now();
        let source = match SourceRef::parse(reference, &self.kinds) {
            Ok(source) => source,
            Err(err) => return Err(self.reject(Operation::Fetch, reference, err, started)),
        };

        let mut diagnostics = Vec::new();
        let (path, fallback_locator) = match &source {
            SourceRef::Direct { path } => (path.clone(), JobLocator::from_storage_path(path)),
            SourceRef::Job { key } => {
                let locator = match JobLocator::parse(key) {
                    Ok(locator) => locator,
                    Err(err) => return Err(self.reject(Operation::Fetch, reference, err, started)),
                };
                let path = match self.resolver.resolve_locator(&locator).await {
                    Ok(path) => path,
                    Err(err) => {
                            diagnostics.push(Diagnostic::JobResolutionFailed {
                            key: key.clone(),
                            error: err.to_string(),
                        });
                        String::new()
                    }
                };
                (path, Ok(locator))
            }
        };

        debug!(src = %reference, pod = %pod_name, %path, requested = names.len(), "fetching artifacts");
        let FetchReport {
            artifacts,
            fallback,
            diagnostics: fetch_diagnostics,
        } = self
            .fetcher
            .fetch(&path, fallback_locator, size_limit, names)
            .await;
        diagnostics.extend(fetch_diagnostics);

        let elapsed = started.elapsed();
        self.publish(reference, &diagnostics);
        self.events.emit(ArtifactEvent::FetchCompleted {
            reference: reference.to_string(),
            artifacts: artifacts.len(),
            fallback,
            elapsed,
        });
        Ok(FetchOutcome {
            artifacts,
            fallback,
            diagnostics,
            elapsed,
        })
    }

    fn publish(&self, reference: &str, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.events.emit(ArtifactEvent::Diagnostic {
                reference: reference.to_string(),
                diagnostic: diagnostic.clone(),
            });
        }
    }

    fn reject(
        &self,
        operation: Operation,
        reference: &str,
        err: ReferenceError,
        started: Instant,
    ) -> ReferenceError {
        self.events.emit(ArtifactEvent::Rejected {
            operation,
            reference: reference.to_string(),
            error: err.to_string(),
            elapsed: started.elapsed(),
        });
        err
    }
}
