//! Waveform engine binding.
//!
//! # Responsibility
//! - Turn engine gestures into store writes.
//! - Mirror store state back onto engine regions.
//! - Own the settle timer for the current hand-drawn draft.
//!
//! # Invariants
//! - The store is written before the engine is touched.
//! - Echoed `RegionCreated` events for known or removed ids never create a
//!   region.
//! - Only an unsettled hand-drawn draft can settle into labeling.

use crate::capability::waveform::{EngineError, EngineResult, RegionSpec, WaveformEngine};
use crate::model::palette::ColorAllocator;
use crate::model::region::{Region, RegionId, RegionPatch};
use crate::service::settle::DraftTracker;
use crate::store::annotation_store::{AnnotationStore, StoreError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug, Clone, PartialEq)]
pub enum BindingError {
    Store(StoreError),
    Engine(EngineError),
}

impl Display for BindingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BindingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<StoreError> for BindingError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<EngineError> for BindingError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// What a `RegionCreated` event turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawnRegion {
    /// The id already belongs to the store (imported or echoed region).
    Known,
    /// The engine no longer holds the id; the event predates a removal.
    Stale,
    /// A new hand-drawn draft. `superseded` is an older unsettled draft the
    /// caller must roll back.
    Draft {
        id: RegionId,
        superseded: Option<RegionId>,
    },
}

pub struct WaveformBinding<E: WaveformEngine> {
    engine: E,
    drafts: DraftTracker,
    min_region_length: f64,
}

impl<E: WaveformEngine> WaveformBinding<E> {
    pub fn new(engine: E, settle_delay: Duration, min_region_length: f64) -> Self {
        Self {
            engine,
            drafts: DraftTracker::new(settle_delay),
            min_region_length,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn drafts(&self) -> &DraftTracker {
        &self.drafts
    }

    /// Stores a region the user just drew and paints it with the next color.
    pub fn accept_drawn(
        &mut self,
        store: &mut AnnotationStore,
        colors: &mut ColorAllocator,
        id: RegionId,
        start: f64,
        end: f64,
    ) -> BindingResult<DrawnRegion> {
        if store.contains(id) {
            debug!("event=region_created module=binding status=skip reason=known id={id}");
            return Ok(DrawnRegion::Known);
        }
        if !self.engine.region_ids().contains(&id) {
            debug!("event=region_created module=binding status=skip reason=stale id={id}");
            return Ok(DrawnRegion::Stale);
        }

        let (start, end) = self.widen(start, end);
        let region = Region::drawn(id, start, end, colors.next());
        store.create(region)?;
        self.mirror(store, id)?;

        let superseded = self.drafts.begin(id);
        info!("event=region_created module=binding origin=hand_drawn id={id}");
        Ok(DrawnRegion::Draft { id, superseded })
    }

    /// Applies bounds reported by an in-progress drag.
    pub fn accept_moved(
        &mut self,
        store: &mut AnnotationStore,
        id: RegionId,
        start: f64,
        end: f64,
    ) -> BindingResult<()> {
        let (widened_start, widened_end) = self.widen(start, end);
        store.update(id, &RegionPatch::bounds(widened_start, widened_end))?;
        self.drafts.moved(id);
        if widened_end != end {
            self.mirror(store, id)?;
        }
        Ok(())
    }

    /// Handles pointer release; arms the settle timer for the draft.
    pub fn accept_released(&mut self, id: RegionId, now: Instant) {
        self.drafts.released(id, now);
    }

    /// Returns the draft whose settle deadline has passed.
    pub fn poll_settled(&mut self, now: Instant) -> Option<RegionId> {
        self.drafts.poll(now)
    }

    /// Adds an imported region to the engine. The caller stores it under the
    /// returned id.
    pub fn place(&mut self, spec: &RegionSpec) -> EngineResult<RegionId> {
        self.engine.add_region(spec)
    }

    /// Pushes the stored state of `id` onto its engine region.
    pub fn mirror(&mut self, store: &AnnotationStore, id: RegionId) -> BindingResult<()> {
        let region = store.get(id).ok_or(StoreError::NotFound(id))?;
        self.engine.update_region(id, &RegionSpec::from(region))?;
        Ok(())
    }

    /// Removes the engine region and any draft tracking for `id`.
    pub fn detach(&mut self, id: RegionId) -> EngineResult<()> {
        self.drafts.forget(id);
        self.engine.remove_region(id)
    }

    /// Drops draft tracking without touching the engine.
    pub fn reset_drafts(&mut self) {
        self.drafts.clear();
    }

    fn widen(&self, start: f64, end: f64) -> (f64, f64) {
        if end - start < self.min_region_length {
            (start, start + self.min_region_length)
        } else {
            (start, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawnRegion, WaveformBinding};
    use crate::capability::headless::HeadlessWaveform;
    use crate::capability::waveform::WaveformEngine;
    use crate::model::palette::{default_palette, ColorAllocator};
    use crate::model::region::RegionOrigin;
    use crate::store::annotation_store::AnnotationStore;
    use std::time::{Duration, Instant};

    fn binding() -> WaveformBinding<HeadlessWaveform> {
        let mut engine = HeadlessWaveform::new();
        engine.enable_drag_selection().expect("enable");
        WaveformBinding::new(engine, Duration::from_millis(100), 0.1)
    }

    #[test]
    fn drawn_region_is_stored_colored_and_tracked() {
        let mut binding = binding();
        let mut store = AnnotationStore::new();
        let mut colors = ColorAllocator::default();
        let id = binding.engine_mut().begin_drag(1.0, 2.0).expect("drag");

        let outcome = binding
            .accept_drawn(&mut store, &mut colors, id, 1.0, 2.0)
            .expect("accept");
        assert_eq!(
            outcome,
            DrawnRegion::Draft {
                id,
                superseded: None
            }
        );

        let stored = store.get(id).expect("stored");
        assert_eq!(stored.origin, RegionOrigin::HandDrawn);
        assert_eq!(stored.color, default_palette()[0]);
        assert_eq!(
            binding.engine().region(id).expect("engine region").color,
            default_palette()[0]
        );
        assert_eq!(binding.drafts().current(), Some(id));
    }

    #[test]
    fn known_ids_are_not_recreated() {
        let mut binding = binding();
        let mut store = AnnotationStore::new();
        let mut colors = ColorAllocator::default();
        let id = binding.engine_mut().begin_drag(1.0, 2.0).expect("drag");
        binding
            .accept_drawn(&mut store, &mut colors, id, 1.0, 2.0)
            .expect("first");

        let again = binding
            .accept_drawn(&mut store, &mut colors, id, 1.0, 2.0)
            .expect("second");
        assert_eq!(again, DrawnRegion::Known);
        assert_eq!(store.len(), 1);
        assert_eq!(colors.issued(), 1);
    }

    #[test]
    fn events_for_removed_regions_are_ignored() {
        let mut binding = binding();
        let mut store = AnnotationStore::new();
        let mut colors = ColorAllocator::default();
        let id = binding.engine_mut().begin_drag(1.0, 2.0).expect("drag");
        binding.engine_mut().remove_region(id).expect("remove");

        let outcome = binding
            .accept_drawn(&mut store, &mut colors, id, 1.0, 2.0)
            .expect("accept");
        assert_eq!(outcome, DrawnRegion::Stale);
        assert!(store.is_empty());
        assert_eq!(colors.issued(), 0);
    }

    #[test]
    fn short_drags_are_widened_to_minimum_length() {
        let mut binding = binding();
        let mut store = AnnotationStore::new();
        let mut colors = ColorAllocator::default();
        let id = binding.engine_mut().begin_drag(3.0, 3.0).expect("drag");
        binding
            .accept_drawn(&mut store, &mut colors, id, 3.0, 3.0)
            .expect("accept");

        let stored = store.get(id).expect("stored");
        assert!((stored.end - 3.1).abs() < 1e-9);
        assert!(stored.has_valid_range());
    }

    #[test]
    fn settle_fires_after_release_and_quiet_period() {
        let mut binding = binding();
        let mut store = AnnotationStore::new();
        let mut colors = ColorAllocator::default();
        let id = binding.engine_mut().begin_drag(0.0, 1.0).expect("drag");
        binding
            .accept_drawn(&mut store, &mut colors, id, 0.0, 1.0)
            .expect("accept");

        let t0 = Instant::now();
        binding.accept_released(id, t0);
        assert_eq!(binding.poll_settled(t0), None);
        assert_eq!(binding.poll_settled(t0 + Duration::from_millis(100)), Some(id));
    }
}
