//! Config - 解決コアの設定
//!
//! JSON で記述し、省略したフィールドは既定値になる。
//!
//! ```json
//! {
//!   "job_url_prefix": "https://ci.example.com/view/gcs/",
//!   "direct_kind": "gcs",
//!   "job_kind": "prowjob",
//!   "probe_concurrency": 4
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{KindTokenError, KindTokens};
use crate::ports::ConfigSource;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidKinds(#[from] KindTokenError),

    #[error("probe_concurrency must be at least 1")]
    InvalidConcurrency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// ジョブの status URL から取り除く接頭辞
    #[serde(default)]
    pub job_url_prefix: String,
    #[serde(default = "default_direct_kind")]
    pub direct_kind: String,
    #[serde(default = "default_job_kind")]
    pub job_kind: String,
    /// artifact ごとの handle 取得と実在確認の並列度（1 で逐次）
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            job_url_prefix: String::new(),
            direct_kind: default_direct_kind(),
            job_kind: default_job_kind(),
            probe_concurrency: default_probe_concurrency(),
        }
    }
}

fn default_direct_kind() -> String {
    KindTokens::DEFAULT_DIRECT.to_string()
}

fn default_job_kind() -> String {
    KindTokens::DEFAULT_JOB.to_string()
}

fn default_probe_concurrency() -> usize {
    1
}

impl ResolverConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn kind_tokens(&self) -> KindTokens {
        KindTokens::new(&self.direct_kind, &self.job_kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kind_tokens().validate()?;
        if self.probe_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(())
    }
}

impl ConfigSource for ResolverConfig {
    fn job_url_prefix(&self) -> String {
        self.job_url_prefix.clone()
    }
}

/// SharedConfig は実行中に差し替え可能な設定
///
/// 接頭辞は解決のたびに読み直されるので、`replace` 後の呼び出しから新しい値が効く。
/// kind トークンと並列度はサービス構築時に固定される。
#[derive(Debug, Default)]
pub struct SharedConfig {
    inner: RwLock<ResolverConfig>,
}

impl SharedConfig {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    pub fn snapshot(&self) -> ResolverConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, config: ResolverConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }
}

impl ConfigSource for SharedConfig {
    fn job_url_prefix(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .job_url_prefix
            .clone()
    }
}
