//! Artifact - 遅延評価される artifact handle
//!
//! handle の生成は I/O を行わない。`size()` や読み出しを呼んだ時点で初めて
//! ストレージ（または pod）にアクセスする。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::errors::ArtifactError;

/// 常に一覧に含まれ、欠けていれば pod ログから補われるビルドログの名前
pub const CANONICAL_LOG_NAME: &str = "build-log.txt";

pub fn is_canonical_log(name: &str) -> bool {
    name == CANONICAL_LOG_NAME
}

/// Artifact は読み出し可能な artifact への handle
///
/// 実装が用意するのは `size()` と `read_range()` だけでよい。
/// 読み出しは常に `size_limit()` 以内に収まる。`read_all` は上限を超えると失敗し、
/// `read_at_most` / `read_tail` は要求長を上限で切り詰める。
#[async_trait]
pub trait Artifact: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn size_limit(&self) -> u64;

    /// 閲覧用の安定したリンク
    fn canonical_link(&self) -> String;

    /// 実在確認を兼ねる唯一の軽量 I/O
    async fn size(&self) -> Result<u64, ArtifactError>;

    /// `offset` から最大 `len` バイトを読む（上限チェックなし）
    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, ArtifactError>;

    async fn read_all(&self) -> Result<Vec<u8>, ArtifactError> {
        let size = self.size().await?;
        if size > self.size_limit() {
            return Err(ArtifactError::TooLarge {
                name: self.name().to_string(),
                size,
                limit: self.size_limit(),
            });
        }
        self.read_range(0, size).await
    }

    async fn read_at_most(&self, n: u64) -> Result<Vec<u8>, ArtifactError> {
        self.read_range(0, n.min(self.size_limit())).await
    }

    async fn read_tail(&self, n: u64) -> Result<Vec<u8>, ArtifactError> {
        let size = self.size().await?;
        let len = n.min(self.size_limit()).min(size);
        self.read_range(size - len, len).await
    }
}

/// 共有される handle
pub type ArtifactHandle = Arc<dyn Artifact>;

/// メモリ上の内容から `read_range` の範囲を切り出す
pub fn byte_range(contents: &[u8], offset: u64, len: u64) -> Vec<u8> {
    let start = clamp_len(offset).min(contents.len());
    let end = start.saturating_add(clamp_len(len)).min(contents.len());
    contents[start..end].to_vec()
}

fn clamp_len(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
