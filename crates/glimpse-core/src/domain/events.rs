//! Events - 縮退の診断とイベント
//!
//! 縮退はログだけでなく値としても返す。テストはログ出力に依存せずに
//! `Diagnostic` を検査できる。

use std::time::Duration;

use serde::Serialize;

use super::outcome::FallbackStatus;

/// Diagnostic は一回の呼び出しで起きた縮退（または方針による補完）の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// ジョブ参照をストレージパスに解決できなかった（空パスで続行）
    JobResolutionFailed { key: String, error: String },

    /// ストレージの一覧取得に失敗した
    ListingFailed { path: String, error: String },

    /// 一覧に無かったビルドログ名を補った
    CanonicalLogSynthesized { path: String },

    /// ビルドログ以外の artifact を結果から外した
    ArtifactDropped { name: String, error: String },

    /// ストレージ上のビルドログが使えなかった（pod ログへフォールバック）
    CanonicalLogUnavailable { error: String },

    /// フォールバック用のジョブ名・ビルド ID を導出できなかった
    FallbackLocatorUnavailable { error: String },

    /// pod ログの取得に失敗した
    FallbackFailed { locator: String, error: String },
}

impl Diagnostic {
    /// 結果の保証が弱まったか
    ///
    /// `CanonicalLogSynthesized` は楽観的な補完であり、縮退ではない。
    pub fn is_degradation(&self) -> bool {
        !matches!(self, Diagnostic::CanonicalLogSynthesized { .. })
    }
}

/// Operation は公開操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Fetch,
}

/// ArtifactEvent は EventSink に送られるイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactEvent {
    Diagnostic {
        reference: String,
        diagnostic: Diagnostic,
    },
    ListCompleted {
        reference: String,
        artifacts: usize,
        elapsed: Duration,
    },
    FetchCompleted {
        reference: String,
        artifacts: usize,
        fallback: FallbackStatus,
        elapsed: Duration,
    },
    /// 参照が構造的に不正で、結果を返さなかった
    Rejected {
        operation: Operation,
        reference: String,
        error: String,
        elapsed: Duration,
    },
}
