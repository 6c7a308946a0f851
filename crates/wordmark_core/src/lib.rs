//! Core annotation logic for Wordmark.
//! This crate is the single source of truth for region state and its
//! interchange format; rendering and file dialogs stay with the host.

pub mod capability;
pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use capability::files::{FileError, FileGateway, FileHandle, FsFileGateway, JSON_MIME};
pub use capability::headless::HeadlessWaveform;
pub use capability::waveform::{EngineError, EngineEvent, RegionSpec, WaveformEngine};
pub use config::{ConfigError, SessionConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::palette::{Color, ColorAllocator, DEFAULT_PALETTE};
pub use model::region::{Region, RegionBound, RegionId, RegionOrigin, RegionPatch};
pub use service::block_sync::{BlockList, FieldEdit, RegionBlock};
pub use service::labeling::{LabelCommit, LabelingState};
pub use service::serialization::{export_regions, parse_regions, ImportError, WireRegion};
pub use service::session::{AnnotationSession, SessionError, SessionResult};
pub use store::annotation_store::{AnnotationStore, StoreError, StoreResult};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
