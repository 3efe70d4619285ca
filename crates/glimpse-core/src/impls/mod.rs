//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryArtifactStore / InMemoryJobLookup / InMemoryPodLogs**: 開発・テスト用
//! - **LocalFsStore / LocalPodLogs**: ローカルディレクトリをストレージに見立てる（CLI 用）
//! - **TracingEventSink / NoopEventSink / RecordingEventSink**: イベントの記録先
//!
//! # 本番用実装
//! GCS クライアントや Kubernetes の pod ログ取得は別クレートで ports を実装する想定。

pub mod event_sinks;
pub mod inmem_jobs;
pub mod inmem_store;
pub mod local_fs;

pub use self::event_sinks::{NoopEventSink, RecordingEventSink, TracingEventSink};
pub use self::inmem_jobs::InMemoryJobLookup;
pub use self::inmem_store::{InMemoryArtifactStore, InMemoryPodLogs, StaticArtifact};
pub use self::local_fs::{LocalFsStore, LocalPodLogs};
