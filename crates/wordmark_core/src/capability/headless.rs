//! In-memory waveform engine.
//!
//! Stands in for the browser engine in tests and the CLI. Gestures are
//! simulated through `begin_drag`/`drag_to`/`release`, which queue the same
//! event sequence a real drag selection produces.

use crate::capability::waveform::{
    EngineError, EngineEvent, EngineResult, RegionSpec, WaveformEngine,
};
use crate::model::palette::Color;
use crate::model::region::RegionId;
use log::trace;

const DRAG_PREVIEW_COLOR: &str = "rgba(0, 0, 0, 0.1)";

#[derive(Debug, Default)]
pub struct HeadlessWaveform {
    source_url: Option<String>,
    playing: bool,
    drag_selection: bool,
    regions: Vec<(RegionId, RegionSpec)>,
    events: Vec<EngineEvent>,
    adds_before_failure: Option<usize>,
}

impl HeadlessWaveform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn drag_selection_enabled(&self) -> bool {
        self.drag_selection
    }

    pub fn region(&self, id: RegionId) -> Option<&RegionSpec> {
        self.regions
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, spec)| spec)
    }

    /// Makes `add_region` fail once `successes` more calls have gone through.
    pub fn fail_adds_after(&mut self, successes: usize) {
        self.adds_before_failure = Some(successes);
    }

    /// Starts a drag selection and creates the region under the pointer.
    pub fn begin_drag(&mut self, start: f64, end: f64) -> EngineResult<RegionId> {
        if !self.drag_selection {
            return Err(EngineError::Backend(
                "drag selection is not enabled".to_string(),
            ));
        }

        let id = RegionId::new();
        self.regions.push((
            id,
            RegionSpec {
                start,
                end,
                color: Color::new(DRAG_PREVIEW_COLOR),
                label: String::new(),
            },
        ));
        self.events.push(EngineEvent::RegionCreated { id, start, end });
        Ok(id)
    }

    /// Moves one edge pair of a region during an active drag.
    pub fn drag_to(&mut self, id: RegionId, start: f64, end: f64) -> EngineResult<()> {
        let spec = self.spec_mut(id)?;
        spec.start = start;
        spec.end = end;
        self.events.push(EngineEvent::RegionUpdated { id, start, end });
        Ok(())
    }

    /// Releases the pointer at the end of a drag.
    pub fn release(&mut self, id: RegionId) -> EngineResult<()> {
        self.spec_mut(id)?;
        self.events.push(EngineEvent::RegionUpdateEnd { id });
        Ok(())
    }

    /// Full drag selection: press, move to `end`, release.
    pub fn drag_select(&mut self, start: f64, end: f64) -> EngineResult<RegionId> {
        let id = self.begin_drag(start, start)?;
        self.drag_to(id, start, end)?;
        self.release(id)?;
        Ok(id)
    }

    fn spec_mut(&mut self, id: RegionId) -> EngineResult<&mut RegionSpec> {
        self.regions
            .iter_mut()
            .find(|(existing, _)| *existing == id)
            .map(|(_, spec)| spec)
            .ok_or(EngineError::UnknownRegion(id))
    }
}

impl WaveformEngine for HeadlessWaveform {
    fn load(&mut self, source_url: &str) -> EngineResult<()> {
        self.source_url = Some(source_url.to_string());
        self.playing = false;
        self.drag_selection = false;
        self.events.push(EngineEvent::Ready);
        Ok(())
    }

    fn play_pause(&mut self) -> EngineResult<()> {
        if self.source_url.is_none() {
            return Err(EngineError::Backend("no audio loaded".to_string()));
        }
        self.playing = !self.playing;
        Ok(())
    }

    fn enable_drag_selection(&mut self) -> EngineResult<()> {
        self.drag_selection = true;
        Ok(())
    }

    fn add_region(&mut self, spec: &RegionSpec) -> EngineResult<RegionId> {
        if let Some(remaining) = self.adds_before_failure {
            if remaining == 0 {
                return Err(EngineError::Backend("region limit reached".to_string()));
            }
            self.adds_before_failure = Some(remaining - 1);
        }

        let id = RegionId::new();
        self.regions.push((id, spec.clone()));
        // Mirrors the real engine, which announces programmatic regions too.
        self.events.push(EngineEvent::RegionCreated {
            id,
            start: spec.start,
            end: spec.end,
        });
        trace!("event=engine_add module=headless id={id}");
        Ok(id)
    }

    fn update_region(&mut self, id: RegionId, spec: &RegionSpec) -> EngineResult<()> {
        *self.spec_mut(id)? = spec.clone();
        Ok(())
    }

    fn remove_region(&mut self, id: RegionId) -> EngineResult<()> {
        let before = self.regions.len();
        self.regions.retain(|(existing, _)| *existing != id);
        if self.regions.len() == before {
            return Err(EngineError::UnknownRegion(id));
        }
        Ok(())
    }

    fn region_ids(&self) -> Vec<RegionId> {
        self.regions.iter().map(|(id, _)| *id).collect()
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::HeadlessWaveform;
    use crate::capability::waveform::{EngineEvent, WaveformEngine};

    #[test]
    fn drag_select_requires_enabled_selection() {
        let mut engine = HeadlessWaveform::new();
        assert!(engine.drag_select(0.0, 1.0).is_err());

        engine.enable_drag_selection().expect("enable");
        let id = engine.drag_select(0.0, 1.0).expect("drag");
        let events = engine.drain_events();
        assert_eq!(
            events.first(),
            Some(&EngineEvent::RegionCreated {
                id,
                start: 0.0,
                end: 0.0
            })
        );
        assert_eq!(events.last(), Some(&EngineEvent::RegionUpdateEnd { id }));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn play_pause_needs_loaded_audio() {
        let mut engine = HeadlessWaveform::new();
        assert!(engine.play_pause().is_err());
        engine.load("blob:audio").expect("load");
        engine.play_pause().expect("play");
        assert!(engine.is_playing());
    }
}
