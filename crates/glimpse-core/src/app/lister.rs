//! ArtifactLister - artifact 名の一覧
//!
//! 一覧の成否にかかわらず、結果にはビルドログ名がちょうど一つ含まれる。
//! ビルドログの実在は確認しない（取得時に確認し、無ければ pod ログへフォールバックする）。

use std::sync::Arc;

use crate::domain::{CANONICAL_LOG_NAME, Diagnostic, is_canonical_log};
use crate::ports::ArtifactStore;

pub struct ArtifactLister {
    store: Arc<dyn ArtifactStore>,
}

impl ArtifactLister {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// 失敗しない。一覧の失敗は `diagnostics` に記録する
    pub async fn list(&self, path: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<String> {
        let names = match self.store.list(path).await {
            Ok(names) => names,
            Err(err) => {
                diagnostics.push(Diagnostic::ListingFailed {
                    path: path.to_string(),
                    error: err.to_string(),
                });
                Vec::new()
            }
        };
        let (names, synthesized) = ensure_canonical_log(names);
        if synthesized {
            diagnostics.push(Diagnostic::CanonicalLogSynthesized {
                path: path.to_string(),
            });
        }
        names
    }
}

/// ビルドログ名をちょうど一つ含む一覧にする
///
/// 既にあれば最初の出現位置を保ち、重複は落とす。無ければ末尾に足す。
/// 戻り値の `bool` は補ったかどうか。
pub fn ensure_canonical_log(names: Vec<String>) -> (Vec<String>, bool) {
    let mut seen = false;
    let mut result: Vec<String> = names
        .into_iter()
        .filter(|name| {
            if !is_canonical_log(name) {
                return true;
            }
            !std::mem::replace(&mut seen, true)
        })
        .collect();
    if !seen {
        result.push(CANONICAL_LOG_NAME.to_string());
    }
    (result, !seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryArtifactStore;
    use rstest::rstest;

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case::present(&["a.txt", "build-log.txt"], &["a.txt", "build-log.txt"], false)]
    #[case::absent(&["a.txt"], &["a.txt", "build-log.txt"], true)]
    #[case::empty(&[], &["build-log.txt"], true)]
    #[case::duplicated(&["build-log.txt", "a.txt", "build-log.txt"], &["build-log.txt", "a.txt"], false)]
    fn canonical_log_exactly_once(
        #[case] input: &[&str],
        #[case] expected: &[&str],
        #[case] synthesized: bool,
    ) {
        assert_eq!(ensure_canonical_log(owned(input)), (owned(expected), synthesized));
    }

    #[tokio::test]
    async fn listing_failure_is_recorded_not_returned() {
        let store = InMemoryArtifactStore::new();
        store.set_unavailable(true);
        let lister = ArtifactLister::new(Arc::new(store));

        let mut diagnostics = Vec::new();
        let names = lister.list("bucket/job/1", &mut diagnostics).await;

        assert_eq!(names, owned(&["build-log.txt"]));
        assert!(matches!(diagnostics[0], Diagnostic::ListingFailed { .. }));
        assert!(matches!(
            diagnostics[1],
            Diagnostic::CanonicalLogSynthesized { .. }
        ));
    }

    #[tokio::test]
    async fn empty_path_still_yields_canonical_log() {
        let lister = ArtifactLister::new(Arc::new(InMemoryArtifactStore::new()));
        let mut diagnostics = Vec::new();
        let names = lister.list("", &mut diagnostics).await;
        assert_eq!(names, owned(&["build-log.txt"]));
    }
}
