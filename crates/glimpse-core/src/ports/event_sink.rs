//! EventSink port - 診断と所要時間の記録
//!
//! # 実装
//! - TracingEventSink: `tracing` へ転送（既定）
//! - NoopEventSink: 何もしない
//! - RecordingEventSink: テスト用に保持

use crate::domain::ArtifactEvent;

/// EventSink はイベントを受け取る。失敗しない（記録は best-effort）
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ArtifactEvent);
}
