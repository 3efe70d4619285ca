//! Outcome - 一覧・取得の結果

use std::time::Duration;

use serde::Serialize;

use super::artifact::ArtifactHandle;
use super::events::Diagnostic;

/// FallbackStatus は pod ログフォールバックの終端状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStatus {
    /// ビルドログが要求されていない、またはストレージ上で確認できた
    NotNeeded,
    Succeeded,
    Failed,
    /// ジョブ名・ビルド ID を導出できず、要求を出さなかった
    Skipped,
}

/// ListOutcome は `list_artifacts` の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListOutcome {
    pub names: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ListOutcome {
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_degradation)
    }
}

/// FetchOutcome は `fetch_artifacts` の結果
///
/// `artifacts` は要求された名前の順。フォールバックで得た pod ログは末尾に付く。
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub artifacts: Vec<ArtifactHandle>,
    pub fallback: FallbackStatus,
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed: Duration,
}

impl FetchOutcome {
    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name()).collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_degradation)
    }
}
