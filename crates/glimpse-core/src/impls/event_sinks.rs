//! EventSink の実装

use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

use crate::domain::{ArtifactEvent, Diagnostic};
use crate::ports::EventSink;

/// TracingEventSink はイベントを `tracing` に流す（既定）
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: ArtifactEvent) {
        match event {
            ArtifactEvent::Diagnostic {
                reference,
                diagnostic,
            } => match &diagnostic {
                Diagnostic::ArtifactDropped { name, error } => {
                    error!(src = %reference, artifact = %name, %error, "Failed to fetch artifact");
                }
                Diagnostic::FallbackFailed { locator, error } => {
                    error!(src = %reference, %locator, %error, "Failed to fetch pod log");
                }
                d if d.is_degradation() => {
                    warn!(src = %reference, diagnostic = ?d, "artifact resolution degraded");
                }
                d => info!(src = %reference, diagnostic = ?d, "artifact resolution note"),
            },
            ArtifactEvent::ListCompleted {
                reference,
                artifacts,
                elapsed,
            } => {
                info!(src = %reference, artifacts, duration = ?elapsed, "Listed artifacts");
            }
            ArtifactEvent::FetchCompleted {
                reference,
                artifacts,
                fallback,
                elapsed,
            } => {
                info!(
                    src = %reference,
                    artifacts,
                    ?fallback,
                    duration = ?elapsed,
                    "Retrieved artifacts"
                );
            }
            ArtifactEvent::Rejected {
                operation,
                reference,
                error,
                elapsed,
            } => {
                warn!(src = %reference, ?operation, %error, duration = ?elapsed, "Rejected src");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: ArtifactEvent) {}
}

/// RecordingEventSink は受け取ったイベントを保持する（テスト用）
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ArtifactEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ArtifactEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ArtifactEvent::Diagnostic { diagnostic, .. } => Some(diagnostic),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: ArtifactEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        sink.emit(ArtifactEvent::Diagnostic {
            reference: "gcs/b/j/1".into(),
            diagnostic: Diagnostic::CanonicalLogSynthesized {
                path: "b/j/1".into(),
            },
        });
        sink.emit(ArtifactEvent::ListCompleted {
            reference: "gcs/b/j/1".into(),
            artifacts: 1,
            elapsed: Duration::from_millis(3),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], ArtifactEvent::ListCompleted { artifacts: 1, .. }));
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn tracing_sink_accepts_every_event() {
        let sink = TracingEventSink;
        sink.emit(ArtifactEvent::Rejected {
            operation: crate::domain::Operation::Fetch,
            reference: "nope".into(),
            error: "invalid src".into(),
            elapsed: Duration::ZERO,
        });
        for diagnostic in [
            Diagnostic::ArtifactDropped {
                name: "a.txt".into(),
                error: "not found".into(),
            },
            Diagnostic::FallbackFailed {
                locator: "ci-unit/1".into(),
                error: "no pod".into(),
            },
            Diagnostic::CanonicalLogSynthesized {
                path: "b/j/1".into(),
            },
        ] {
            sink.emit(ArtifactEvent::Diagnostic {
                reference: "gcs/b/j/1".into(),
                diagnostic,
            });
        }
    }
}
