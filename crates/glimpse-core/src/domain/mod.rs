//! Domain model（参照、ジョブ位置、artifact handle、結果、診断、エラー）

pub mod artifact;
pub mod errors;
pub mod events;
pub mod outcome;
pub mod source;

pub use self::artifact::{
    Artifact, ArtifactHandle, CANONICAL_LOG_NAME, byte_range, is_canonical_log,
};
pub use self::errors::{ArtifactError, LookupError, ReferenceError, ResolveError};
pub use self::events::{ArtifactEvent, Diagnostic, Operation};
pub use self::outcome::{FallbackStatus, FetchOutcome, ListOutcome};
pub use self::source::{JobLocator, KindTokenError, KindTokens, SEPARATOR, SourceRef, split_reference};
