//! Ports - 外部協調者の抽象化
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 解決コアが触れる外部システムはすべてここの trait 越しに注入され、
//! それぞれ単独で差し替え（fake）可能です。
//!
//! # 協調者
//! - **JobLookup**: ジョブメタデータ（status URL）の参照
//! - **ConfigSource**: ジョブ URL の接頭辞（設定）
//! - **ArtifactStore**: オブジェクトストレージ（list / open）
//! - **PodLogSource**: 実行中 pod からのログ取得
//! - **EventSink**: 診断・所要時間の記録

pub mod artifact_store;
pub mod config_source;
pub mod event_sink;
pub mod job_lookup;
pub mod pod_log;

pub use self::artifact_store::ArtifactStore;
pub use self::config_source::ConfigSource;
pub use self::event_sink::EventSink;
pub use self::job_lookup::{JobLookup, JobRecord};
pub use self::pod_log::PodLogSource;
