//! ArtifactFetcher - handle の取得と pod ログへのフォールバック
//!
//! # フロー
//! 1. **probe**: 要求された名前ごとに handle を開き、`size()` で実在を確認する
//!    （`probe_concurrency > 1` なら Semaphore で上限を付けて並列に実行）
//! 2. **settle**: 要求順に結果を集計する。ビルドログ以外の失敗は落とし、
//!    ビルドログの失敗はフォールバック要求として記録する
//! 3. **fallback**: 必要なら pod ログを一度だけ取得し、末尾に追加する
//!
//! どの段階の失敗も呼び出しを失敗させない。失敗は [`Diagnostic`] として返し、
//! ログへの出力は EventSink に任せる。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::{
    ArtifactError, ArtifactHandle, Diagnostic, FallbackStatus, JobLocator, ReferenceError,
    is_canonical_log,
};
use crate::ports::{ArtifactStore, PodLogSource};

/// Probe は一つの artifact 名に対する handle 取得と実在確認の結果
#[derive(Debug)]
pub struct Probe {
    pub name: String,
    pub result: Result<ArtifactHandle, ArtifactError>,
}

/// Settled は probe 結果の集計
#[derive(Debug, Default)]
pub struct Settled {
    pub artifacts: Vec<ArtifactHandle>,
    pub fallback_needed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// FetchReport はフォールバックまで含めた取得結果
#[derive(Debug)]
pub struct FetchReport {
    pub artifacts: Vec<ArtifactHandle>,
    pub fallback: FallbackStatus,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ArtifactFetcher {
    store: Arc<dyn ArtifactStore>,
    pod_logs: Arc<dyn PodLogSource>,
    probe_concurrency: usize,
}

impl ArtifactFetcher {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        pod_logs: Arc<dyn PodLogSource>,
        probe_concurrency: usize,
    ) -> Self {
        Self {
            store,
            pod_logs,
            probe_concurrency: probe_concurrency.max(1),
        }
    }

    /// `fallback_locator` はフォールバック時にだけ使う。導出に失敗していれば
    /// フォールバックは行わず診断を残す。
    pub async fn fetch(
        &self,
        path: &str,
        fallback_locator: Result<JobLocator, ReferenceError>,
        size_limit: u64,
        names: &[String],
    ) -> FetchReport {
        let probes = self.probe_all(path, size_limit, names).await;
        let Settled {
            mut artifacts,
            fallback_needed,
            mut diagnostics,
        } = settle(probes);

        let fallback = if !fallback_needed {
            FallbackStatus::NotNeeded
        } else {
            match fallback_locator {
                Ok(locator) => match self.pod_logs.fetch(&locator, size_limit).await {
                    Ok(handle) => {
                        debug!(%locator, "using pod log in place of stored build log");
                        artifacts.push(handle);
                        FallbackStatus::Succeeded
                    }
                    Err(err) => {
                        diagnostics.push(Diagnostic::FallbackFailed {
                            locator: locator.to_string(),
                            error: err.to_string(),
                        });
                        FallbackStatus::Failed
                    }
                },
                Err(err) => {
                    diagnostics.push(Diagnostic::FallbackLocatorUnavailable {
                        error: err.to_string(),
                    });
                    FallbackStatus::Skipped
                }
            }
        };

        FetchReport {
            artifacts,
            fallback,
            diagnostics,
        }
    }

    /// 要求順の probe 結果を返す
    pub async fn probe_all(&self, path: &str, size_limit: u64, names: &[String]) -> Vec<Probe> {
        if self.probe_concurrency <= 1 || names.len() <= 1 {
            let mut probes = Vec::with_capacity(names.len());
            for name in names {
                probes.push(Probe {
                    name: name.clone(),
                    result: probe_one(self.store.as_ref(), path, name, size_limit).await,
                });
            }
            return probes;
        }

        let semaphore = Arc::new(Semaphore::new(self.probe_concurrency));
        let mut set = JoinSet::new();
        for (index, name) in names.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            let path = path.to_string();
            let name = name.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = probe_one(store.as_ref(), &path, &name, size_limit).await;
                (index, Probe { name, result })
            });
        }

        let mut slots: Vec<Option<Probe>> = names.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, probe)) => slots[index] = Some(probe),
                Err(err) => warn!(error = %err, "artifact probe task did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| Probe {
                    name: name.clone(),
                    result: Err(ArtifactError::Backend("probe task aborted".to_string())),
                })
            })
            .collect()
    }
}

/// handle を開いて `size()` を呼ぶ。`open` は I/O をしないので、ここが唯一の実在確認
async fn probe_one(
    store: &dyn ArtifactStore,
    path: &str,
    name: &str,
    size_limit: u64,
) -> Result<ArtifactHandle, ArtifactError> {
    let handle = store.open(path, name, size_limit)?;
    handle.size().await?;
    Ok(handle)
}

/// probe 結果を集計する（副作用なし）
pub fn settle(probes: Vec<Probe>) -> Settled {
    let mut settled = Settled::default();
    for Probe { name, result } in probes {
        match result {
            Ok(handle) => settled.artifacts.push(handle),
            Err(err) if is_canonical_log(&name) => {
                settled.fallback_needed = true;
                settled
                    .diagnostics
                    .push(Diagnostic::CanonicalLogUnavailable {
                        error: err.to_string(),
                    });
            }
            Err(err) => {
                settled.diagnostics.push(Diagnostic::ArtifactDropped {
                    name,
                    error: err.to_string(),
                });
            }
        }
    }
    settled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CANONICAL_LOG_NAME;
    use crate::impls::{InMemoryArtifactStore, InMemoryPodLogs};

    const PATH: &str = "bucket/logs/ci-unit/1";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn locator() -> JobLocator {
        JobLocator::new("ci-unit", "1")
    }

    async fn fixture(stored: &[&str]) -> (InMemoryArtifactStore, Arc<InMemoryPodLogs>) {
        let store = InMemoryArtifactStore::new();
        for name in stored {
            store.put(PATH, name, format!("contents of {name}")).await;
        }
        (store, Arc::new(InMemoryPodLogs::new()))
    }

    #[test]
    fn settle_keeps_order_and_flags_log() {
        let probes = vec![
            Probe {
                name: "a.txt".into(),
                result: Err(ArtifactError::Backend("boom".into())),
            },
            Probe {
                name: CANONICAL_LOG_NAME.into(),
                result: Err(ArtifactError::Backend("gone".into())),
            },
        ];
        let settled = settle(probes);
        assert!(settled.artifacts.is_empty());
        assert!(settled.fallback_needed);
        assert!(matches!(
            &settled.diagnostics[..],
            [
                Diagnostic::ArtifactDropped { name, .. },
                Diagnostic::CanonicalLogUnavailable { .. }
            ] if name == "a.txt"
        ));
    }

    #[tokio::test]
    async fn all_present_no_fallback() {
        let (store, pods) = fixture(&["a.txt", "build-log.txt"]).await;
        let fetcher = ArtifactFetcher::new(Arc::new(store), pods.clone(), 1);

        let report = fetcher
            .fetch(PATH, Ok(locator()), 1024, &names(&["a.txt", "build-log.txt"]))
            .await;

        let got: Vec<&str> = report.artifacts.iter().map(|a| a.name()).collect();
        assert_eq!(got, vec!["a.txt", "build-log.txt"]);
        assert_eq!(report.fallback, FallbackStatus::NotNeeded);
        assert!(report.diagnostics.is_empty());
        assert_eq!(pods.requests(), 0);
    }

    #[tokio::test]
    async fn skipped_fallback_when_locator_missing() {
        let (store, pods) = fixture(&["a.txt"]).await;
        let fetcher = ArtifactFetcher::new(Arc::new(store), pods.clone(), 1);

        let report = fetcher
            .fetch(
                PATH,
                Err(ReferenceError::MalformedJobKey("bucket".into())),
                1024,
                &names(&["a.txt", "build-log.txt"]),
            )
            .await;

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.fallback, FallbackStatus::Skipped);
        assert_eq!(pods.requests(), 0);
    }

    #[tokio::test]
    async fn duplicate_log_requests_fall_back_once() {
        let (store, pods) = fixture(&[]).await;
        pods.insert(locator(), "live").await;
        let fetcher = ArtifactFetcher::new(Arc::new(store), pods.clone(), 4);

        let report = fetcher
            .fetch(
                PATH,
                Ok(locator()),
                1024,
                &names(&["build-log.txt", "build-log.txt"]),
            )
            .await;

        assert_eq!(report.fallback, FallbackStatus::Succeeded);
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(pods.requests(), 1);
    }

    #[tokio::test]
    async fn parallel_probe_preserves_request_order() {
        let stored: Vec<String> = (0..32).map(|i| format!("file-{i:02}.txt")).collect();
        let stored_refs: Vec<&str> = stored.iter().map(String::as_str).collect();
        let (store, pods) = fixture(&stored_refs).await;

        let mut requested = stored.clone();
        requested.reverse();
        requested.insert(5, "missing.txt".to_string());

        let sequential = ArtifactFetcher::new(Arc::new(store.clone()), pods.clone(), 1)
            .fetch(PATH, Ok(locator()), 1024, &requested)
            .await;
        let parallel = ArtifactFetcher::new(Arc::new(store), pods, 8)
            .fetch(PATH, Ok(locator()), 1024, &requested)
            .await;

        let seq: Vec<&str> = sequential.artifacts.iter().map(|a| a.name()).collect();
        let par: Vec<&str> = parallel.artifacts.iter().map(|a| a.name()).collect();
        assert_eq!(seq, par);
        assert_eq!(par.len(), 32);
        assert_eq!(par[0], "file-31.txt");
        assert_eq!(sequential.diagnostics, parallel.diagnostics);
    }
}
