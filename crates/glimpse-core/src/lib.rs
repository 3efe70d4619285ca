//! glimpse-core
//!
//! テスト実行の参照（`<kind>/<key>`）を、取得可能な artifact（ビルドログ・出力ファイル）の
//! 一覧と handle に解決するコア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（SourceRef, JobLocator, Artifact, outcome, diagnostics, errors）
//! - **ports**: 抽象化レイヤー（ArtifactStore, JobLookup, PodLogSource, ConfigSource, EventSink）
//! - **app**: アプリケーションロジック（builder, service, resolver, lister, fetcher）
//! - **impls**: 実装（InMemory 系、ローカルファイルシステム、EventSink）
//! - **config**: 設定（ResolverConfig, SharedConfig）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ArtifactService, BuildError, ServiceBuilder};
pub use config::{ConfigError, ResolverConfig, SharedConfig};
pub use domain::{
    Artifact, ArtifactHandle, CANONICAL_LOG_NAME, Diagnostic, FallbackStatus, FetchOutcome,
    ListOutcome, ReferenceError,
};
