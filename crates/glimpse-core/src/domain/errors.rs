//! Errors - エラー型と分類
//!
//! 呼び出し元に返るのは [`ReferenceError`] のみ。それ以外は診断（Diagnostic）として
//! 記録され、結果の artifact 集合が縮退するだけで呼び出し自体は成功する。

use thiserror::Error;

use super::source::JobLocator;

/// ReferenceError は参照文字列の構造エラー（呼び出し全体が失敗する唯一の分類）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("invalid src {0:?}: expected <key-type>/<key>")]
    Malformed(String),

    #[error("unrecognized key type {kind:?} in src {reference:?}")]
    UnknownKind { kind: String, reference: String },

    #[error("job key {0:?} incorrectly formatted: expected <job>/<build>")]
    MalformedJobKey(String),
}

/// ResolveError はジョブ参照からストレージパスへの解決エラー
///
/// 回復可能。呼び出し元は空のパスで処理を続ける。
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Key(#[from] ReferenceError),

    #[error("failed to get job {locator}: {source}")]
    JobLookupFailed {
        locator: JobLocator,
        #[source]
        source: LookupError,
    },

    #[error("unexpected job URL {url:?}: expected something starting with {prefix:?}")]
    PrefixMismatch { url: String, prefix: String },
}

/// LookupError はジョブメタデータ参照の失敗
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("job {0} not found")]
    NotFound(JobLocator),

    #[error("{0}")]
    Backend(String),
}

/// ArtifactError はストレージ・pod ログ・handle 読み出しの失敗
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid storage path {0:?}")]
    InvalidPath(String),

    #[error("artifact {name} not found under {path:?}")]
    NotFound { path: String, name: String },

    #[error("artifact {name} is {size} bytes, over the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}
