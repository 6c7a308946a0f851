//! Waveform engine capability contract.
//!
//! The engine owns rendering, playback, gesture detection and pixel-to-time
//! mapping. Core only sees region primitives and a queue of engine events.

use crate::model::palette::Color;
use crate::model::region::{Region, RegionId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures reported by an engine implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    UnknownRegion(RegionId),
    Backend(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRegion(id) => write!(f, "waveform region not found: {id}"),
            Self::Backend(message) => write!(f, "waveform engine failure: {message}"),
        }
    }
}

impl Error for EngineError {}

/// Visual description of one region as the engine draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    pub start: f64,
    pub end: f64,
    pub color: Color,
    pub label: String,
}

impl From<&Region> for RegionSpec {
    fn from(region: &Region) -> Self {
        Self {
            start: region.start,
            end: region.end,
            color: region.color.clone(),
            label: region.label.clone(),
        }
    }
}

/// Events the engine delivers, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Audio decoded and waveform drawn.
    Ready,
    /// A region came into existence, by drag selection or `add_region`.
    RegionCreated { id: RegionId, start: f64, end: f64 },
    /// Region bounds moved while a drag is in progress.
    RegionUpdated { id: RegionId, start: f64, end: f64 },
    /// The pointer was released after creating, moving or resizing a region.
    RegionUpdateEnd { id: RegionId },
}

/// Region and playback primitives consumed by the waveform binding.
///
/// Programmatic `update_region` calls must not echo `RegionUpdated` events;
/// only user gestures produce them.
pub trait WaveformEngine {
    fn load(&mut self, source_url: &str) -> EngineResult<()>;
    fn play_pause(&mut self) -> EngineResult<()>;
    fn enable_drag_selection(&mut self) -> EngineResult<()>;
    fn add_region(&mut self, spec: &RegionSpec) -> EngineResult<RegionId>;
    fn update_region(&mut self, id: RegionId, spec: &RegionSpec) -> EngineResult<()>;
    fn remove_region(&mut self, id: RegionId) -> EngineResult<()>;
    fn region_ids(&self) -> Vec<RegionId>;
    fn drain_events(&mut self) -> Vec<EngineEvent>;
}
