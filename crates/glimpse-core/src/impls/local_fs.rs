//! LocalFsStore / LocalPodLogs - ローカルディレクトリをストレージに見立てる
//!
//! ストレージパス `bucket/logs/job/1` は `<root>/bucket/logs/job/1/` に対応し、
//! その配下のファイルが artifact になる（名前はパスからの相対、区切りは `/`）。
//! pod ログは `<root>/<job>/<build>/build-log.txt` に置く。

use std::io::{ErrorKind, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::domain::{
    Artifact, ArtifactError, ArtifactHandle, CANONICAL_LOG_NAME, JobLocator, SEPARATOR,
};
use crate::ports::{ArtifactStore, PodLogSource};

#[derive(Debug, Clone)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `..` を含むパスは拒否する（先頭の `/` は root からの相対として扱う）
    fn resolve(&self, relative: &str) -> Result<PathBuf, ArtifactError> {
        let trimmed = relative.trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Err(ArtifactError::InvalidPath(relative.to_string()));
        }
        let mut resolved = self.root.clone();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(ArtifactError::InvalidPath(relative.to_string())),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ArtifactStore for LocalFsStore {
    async fn list(&self, path: &str) -> Result<Vec<String>, ArtifactError> {
        let base = self.resolve(path)?;
        let mut names = Vec::new();
        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let entry_path = entry.path();
                if file_type.is_dir() {
                    pending.push(entry_path);
                } else if file_type.is_file() {
                    names.push(relative_name(&base, &entry_path));
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn open(
        &self,
        path: &str,
        name: &str,
        size_limit: u64,
    ) -> Result<ArtifactHandle, ArtifactError> {
        let base = self.resolve(path)?;
        let file = LocalFsStore::new(base).resolve(name)?;
        Ok(Arc::new(FileArtifact {
            link: format!("file://{}", file.display()),
            file,
            name: name.to_string(),
            size_limit,
        }))
    }
}

fn relative_name(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// FileArtifact はローカルファイルへの handle
#[derive(Debug)]
struct FileArtifact {
    file: PathBuf,
    name: String,
    link: String,
    size_limit: u64,
}

impl FileArtifact {
    fn not_found(&self) -> ArtifactError {
        ArtifactError::NotFound {
            path: self
                .file
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            name: self.name.clone(),
        }
    }

    fn map_io(&self, err: std::io::Error) -> ArtifactError {
        if err.kind() == ErrorKind::NotFound {
            self.not_found()
        } else {
            ArtifactError::Io(err)
        }
    }
}

#[async_trait]
impl Artifact for FileArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn size_limit(&self) -> u64 {
        self.size_limit
    }

    fn canonical_link(&self) -> String {
        self.link.clone()
    }

    async fn size(&self) -> Result<u64, ArtifactError> {
        let metadata = tokio::fs::metadata(&self.file)
            .await
            .map_err(|e| self.map_io(e))?;
        if !metadata.is_file() {
            return Err(self.not_found());
        }
        Ok(metadata.len())
    }

    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>, ArtifactError> {
        let mut file = tokio::fs::File::open(&self.file)
            .await
            .map_err(|e| self.map_io(e))?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut bytes = Vec::new();
        file.take(len).read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    /// 末尾からシークして読む
    async fn read_tail(&self, n: u64) -> Result<Vec<u8>, ArtifactError> {
        let size = self.size().await?;
        let len = n.min(self.size_limit).min(size);
        let mut file = tokio::fs::File::open(&self.file)
            .await
            .map_err(|e| self.map_io(e))?;
        let back = i64::try_from(len).map_err(|_| ArtifactError::TooLarge {
            name: self.name.clone(),
            size,
            limit: self.size_limit,
        })?;
        file.seek(SeekFrom::End(-back)).await?;
        let mut bytes = Vec::new();
        file.take(len).read_to_end(&mut bytes).await?;
        Ok(bytes)
    }
}

/// LocalPodLogs はローカルディレクトリに書き出された pod ログを返す
#[derive(Debug, Clone)]
pub struct LocalPodLogs {
    store: LocalFsStore,
}

impl LocalPodLogs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: LocalFsStore::new(root),
        }
    }
}

#[async_trait]
impl PodLogSource for LocalPodLogs {
    async fn fetch(
        &self,
        locator: &JobLocator,
        size_limit: u64,
    ) -> Result<ArtifactHandle, ArtifactError> {
        let handle = self
            .store
            .open(&locator.to_string(), CANONICAL_LOG_NAME, size_limit)?;
        // pod が無ければここで失敗させる
        handle.size().await?;
        Ok(handle)
    }
}
