//! App - アプリケーション層
//!
//! このモジュールは ports を組み合わせて解決ロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ServiceBuilder**: 協調者の注入とワイヤリング
//! - **ArtifactService**: 公開 API（list_artifacts / fetch_artifacts）
//! - **JobResolver**: ジョブ参照 → ストレージパス
//! - **ArtifactLister**: 一覧（ビルドログ名を必ず含める）
//! - **ArtifactFetcher**: handle 取得と pod ログへのフォールバック

pub mod builder;
pub mod fetcher;
pub mod lister;
pub mod resolver;
pub mod service;

pub use self::builder::{BuildError, ServiceBuilder};
pub use self::fetcher::ArtifactFetcher;
pub use self::lister::{ArtifactLister, ensure_canonical_log};
pub use self::resolver::{JobResolver, strip_job_prefix};
pub use self::service::ArtifactService;
