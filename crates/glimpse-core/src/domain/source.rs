//! SourceRef - 参照文字列のパース
//!
//! 参照は `<kind>/<key>` 形式。最初の区切りでのみ分割するので key 自体は `/` を含んでよい。
//!
//! # kind トークン
//! - **direct**: key がそのままストレージパス（既定 `gcs`）
//! - **job**: key が `<job>/<build>` で、ジョブメタデータ経由でパスを解決（既定 `prowjob`）
//!
//! トークンは設定値であり、パース時に一度だけ照合して閉じた enum に変換する。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::errors::ReferenceError;

/// 参照・ジョブキー・ストレージパスに共通の区切り文字
pub const SEPARATOR: char = '/';

/// KindTokens は direct / job を区別する kind トークンの組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTokens {
    pub direct: String,
    pub job: String,
}

/// KindTokenError は kind トークン設定の不正
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KindTokenError {
    #[error("kind tokens must not be empty")]
    Empty,

    #[error("direct and job kind tokens are both {0:?}")]
    Duplicate(String),

    #[error("kind token {0:?} contains the reference separator")]
    ContainsSeparator(String),
}

impl KindTokens {
    pub const DEFAULT_DIRECT: &'static str = "gcs";
    pub const DEFAULT_JOB: &'static str = "prowjob";

    pub fn new(direct: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            direct: direct.into(),
            job: job.into(),
        }
    }

    pub fn validate(&self) -> Result<(), KindTokenError> {
        for token in [&self.direct, &self.job] {
            if token.is_empty() {
                return Err(KindTokenError::Empty);
            }
            if token.contains(SEPARATOR) {
                return Err(KindTokenError::ContainsSeparator(token.clone()));
            }
        }
        if self.direct == self.job {
            return Err(KindTokenError::Duplicate(self.direct.clone()));
        }
        Ok(())
    }
}

impl Default for KindTokens {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIRECT, Self::DEFAULT_JOB)
    }
}

/// 参照を kind と key に分割（最初の区切りのみ）
///
/// 区切りがない、または key が空の場合は [`ReferenceError::Malformed`]。
pub fn split_reference(reference: &str) -> Result<(&str, &str), ReferenceError> {
    match reference.split_once(SEPARATOR) {
        Some((kind, key)) if !key.is_empty() => Ok((kind, key)),
        _ => Err(ReferenceError::Malformed(reference.to_string())),
    }
}

/// SourceRef はパース済みの参照
///
/// job 側は生の key を保持する。一覧取得では不正な job key は縮退扱い、
/// 取得（fetch）では構造エラー扱いになるため、[`JobLocator`] への分解は利用側で行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// 末尾の区切りを除いたストレージパス
    Direct { path: String },
    Job { key: String },
}

impl SourceRef {
    pub fn parse(reference: &str, kinds: &KindTokens) -> Result<Self, ReferenceError> {
        let (kind, key) = split_reference(reference)?;
        if kind == kinds.direct {
            Ok(SourceRef::Direct {
                path: key.trim_end_matches(SEPARATOR).to_string(),
            })
        } else if kind == kinds.job {
            Ok(SourceRef::Job {
                key: key.to_string(),
            })
        } else {
            Err(ReferenceError::UnknownKind {
                kind: kind.to_string(),
                reference: reference.to_string(),
            })
        }
    }
}

/// JobLocator はジョブ名とビルド ID の組
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobLocator {
    pub job_name: String,
    pub build_id: String,
}

impl JobLocator {
    pub fn new(job_name: impl Into<String>, build_id: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            build_id: build_id.into(),
        }
    }

    /// `<job>/<build>` をちょうど 2 つの非空要素に分解する
    pub fn parse(key: &str) -> Result<Self, ReferenceError> {
        let parts: Vec<&str> = key.split(SEPARATOR).collect();
        match parts.as_slice() {
            [job, build] if !job.is_empty() && !build.is_empty() => Ok(Self::new(*job, *build)),
            _ => Err(ReferenceError::MalformedJobKey(key.to_string())),
        }
    }

    /// ストレージパスの末尾 2 要素から導出する（`.../<job>/<build>`）
    pub fn from_storage_path(path: &str) -> Result<Self, ReferenceError> {
        let mut segments = path.trim_end_matches(SEPARATOR).rsplit(SEPARATOR);
        match (segments.next(), segments.next()) {
            (Some(build), Some(job)) if !job.is_empty() && !build.is_empty() => {
                Ok(Self::new(job, build))
            }
            _ => Err(ReferenceError::MalformedJobKey(path.to_string())),
        }
    }
}

impl fmt::Display for JobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.job_name, SEPARATOR, self.build_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn split_uses_first_separator_only() {
        let (kind, key) = split_reference("gcs/bucket/logs/job/42").unwrap();
        assert_eq!(kind, "gcs");
        assert_eq!(key, "bucket/logs/job/42");
    }

    #[rstest]
    #[case::no_separator("gcs")]
    #[case::empty("")]
    #[case::empty_key("prowjob/")]
    fn split_rejects_malformed(#[case] reference: &str) {
        assert_eq!(
            split_reference(reference),
            Err(ReferenceError::Malformed(reference.to_string()))
        );
    }

    #[test]
    fn parse_direct_trims_trailing_separators() {
        let source = SourceRef::parse("gcs/bucket/job/123//", &KindTokens::default()).unwrap();
        assert_eq!(
            source,
            SourceRef::Direct {
                path: "bucket/job/123".to_string()
            }
        );
    }

    #[test]
    fn parse_job_keeps_raw_key() {
        let source = SourceRef::parse("prowjob/a/b/c", &KindTokens::default()).unwrap();
        assert_eq!(
            source,
            SourceRef::Job {
                key: "a/b/c".to_string()
            }
        );
    }

    #[test]
    fn parse_honors_configured_tokens() {
        let kinds = KindTokens::new("s3", "build");
        assert!(matches!(
            SourceRef::parse("build/job/1", &kinds),
            Ok(SourceRef::Job { .. })
        ));
        assert!(matches!(
            SourceRef::parse("gcs/bucket/x", &kinds),
            Err(ReferenceError::UnknownKind { kind, .. }) if kind == "gcs"
        ));
    }

    #[rstest]
    #[case::single("job")]
    #[case::three("job/1/extra")]
    #[case::empty_job("/1")]
    #[case::empty_build("job/")]
    fn locator_requires_exactly_two_parts(#[case] key: &str) {
        assert_eq!(
            JobLocator::parse(key),
            Err(ReferenceError::MalformedJobKey(key.to_string()))
        );
    }

    #[test]
    fn locator_parses_and_displays() {
        let locator = JobLocator::parse("ci-unit/8812").unwrap();
        assert_eq!(locator, JobLocator::new("ci-unit", "8812"));
        assert_eq!(locator.to_string(), "ci-unit/8812");
    }

    #[rstest]
    #[case("bucket/logs/ci-unit/8812", "ci-unit", "8812")]
    #[case("bucket/logs/ci-unit/8812/", "ci-unit", "8812")]
    #[case("ci-unit/8812", "ci-unit", "8812")]
    fn locator_from_storage_path(#[case] path: &str, #[case] job: &str, #[case] build: &str) {
        assert_eq!(
            JobLocator::from_storage_path(path).unwrap(),
            JobLocator::new(job, build)
        );
    }

    #[test]
    fn locator_from_short_storage_path_fails() {
        assert!(JobLocator::from_storage_path("bucket").is_err());
    }

    #[rstest]
    #[case::empty(KindTokens::new("", "prowjob"), KindTokenError::Empty)]
    #[case::duplicate(KindTokens::new("gcs", "gcs"), KindTokenError::Duplicate("gcs".into()))]
    #[case::separator(KindTokens::new("g/cs", "prowjob"), KindTokenError::ContainsSeparator("g/cs".into()))]
    fn kind_tokens_validation(#[case] kinds: KindTokens, #[case] expected: KindTokenError) {
        assert_eq!(kinds.validate(), Err(expected));
    }
}
