//! Annotation session controller.
//!
//! # Responsibility
//! - Own every piece of per-file state: store, colors, engine binding, list
//!   blocks and the labeling modal.
//! - Route UI and engine events to the right component in a fixed order:
//!   store first, then engine, then blocks.
//!
//! # Invariants
//! - After any public call returns, the store, the engine and the block list
//!   hold the same set of region ids.
//! - A failed call leaves the session usable.
//! - Loading a new audio file tears the previous session state down.

use crate::capability::files::{FileError, FileGateway, JSON_MIME};
use crate::capability::waveform::{EngineError, EngineEvent, RegionSpec, WaveformEngine};
use crate::config::{ConfigError, SessionConfig};
use crate::model::palette::ColorAllocator;
use crate::model::region::{Region, RegionBound, RegionId, RegionPatch};
use crate::service::block_sync::{parse_seconds, BlockList, FieldEdit};
use crate::service::labeling::{LabelCommit, LabelingWorkflow};
use crate::service::serialization::{export_regions, parse_regions, ImportError};
use crate::service::waveform_binding::{BindingError, DrawnRegion, WaveformBinding};
use crate::store::annotation_store::{AnnotationStore, StoreError};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type SessionResult<T> = Result<T, SessionError>;

/// Key name that commits the label field.
pub const COMMIT_KEY: &str = "Enter";

#[derive(Debug)]
pub enum SessionError {
    /// A call referenced a region the session does not know.
    UnknownRegion(RegionId),
    Store(StoreError),
    Engine(EngineError),
    Import(ImportError),
    Export(serde_json::Error),
    File(FileError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRegion(id) => write!(f, "unknown region: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "import failed: {err}"),
            Self::Export(err) => write!(f, "export failed: {err}"),
            Self::File(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownRegion(_) => None,
            Self::Store(err) => Some(err),
            Self::Engine(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::File(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::UnknownRegion(id),
            other => Self::Store(other),
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<BindingError> for SessionError {
    fn from(value: BindingError) -> Self {
        match value {
            BindingError::Store(err) => err.into(),
            BindingError::Engine(err) => Self::Engine(err),
        }
    }
}

impl From<ImportError> for SessionError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<FileError> for SessionError {
    fn from(value: FileError) -> Self {
        Self::File(value)
    }
}

/// Session-scoped controller for one loaded audio file.
pub struct AnnotationSession<E: WaveformEngine> {
    config: SessionConfig,
    store: AnnotationStore,
    colors: ColorAllocator,
    binding: WaveformBinding<E>,
    blocks: BlockList,
    labeling: LabelingWorkflow,
    audio_source: Option<String>,
    notice: Option<String>,
    event_errors: Vec<SessionError>,
}

impl<E: WaveformEngine> AnnotationSession<E> {
    /// Creates a session after validating `config`.
    pub fn new(engine: E, config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(engine, config))
    }

    pub fn with_defaults(engine: E) -> Self {
        Self::build(engine, SessionConfig::default())
    }

    fn build(engine: E, config: SessionConfig) -> Self {
        let binding =
            WaveformBinding::new(engine, config.settle_delay(), config.min_region_length);
        Self {
            colors: ColorAllocator::new(config.palette_colors()),
            blocks: BlockList::with_step(config.number_step),
            config,
            store: AnnotationStore::new(),
            binding,
            labeling: LabelingWorkflow::new(),
            audio_source: None,
            notice: None,
            event_errors: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn regions(&self) -> Vec<&Region> {
        self.store.list()
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    pub fn labeling(&self) -> &LabelingWorkflow {
        &self.labeling
    }

    pub fn engine(&self) -> &E {
        self.binding.engine()
    }

    /// Direct engine access for hosts that forward gestures.
    pub fn engine_mut(&mut self) -> &mut E {
        self.binding.engine_mut()
    }

    pub fn audio_source(&self) -> Option<&str> {
        self.audio_source.as_deref()
    }

    /// Last user-facing error message, shown next to the import control.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Engine events that failed since the last call, oldest first.
    pub fn take_event_errors(&mut self) -> Vec<SessionError> {
        std::mem::take(&mut self.event_errors)
    }

    /// Replaces the audio file and starts from an empty annotation set.
    pub fn load_audio(&mut self, source_url: &str) -> SessionResult<()> {
        for id in self.store.ids().to_vec() {
            match self.binding.detach(id) {
                Ok(()) | Err(EngineError::UnknownRegion(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.store.clear();
        self.blocks.clear();
        self.labeling = LabelingWorkflow::new();
        self.colors = ColorAllocator::new(self.config.palette_colors());
        self.binding.reset_drafts();
        self.notice = None;
        self.event_errors.clear();

        self.binding.engine_mut().load(source_url)?;
        self.audio_source = Some(source_url.to_string());
        info!("event=audio_load module=session status=ok source={source_url}");
        Ok(())
    }

    pub fn play_pause(&mut self) -> SessionResult<()> {
        self.binding.engine_mut().play_pause()?;
        Ok(())
    }

    /// Drains queued engine events, handles them in order, then runs the
    /// settle timer. Returns the region the labeling modal opened for.
    ///
    /// A failing event does not stop the rest of the queue or the timer; it
    /// is logged and kept for `take_event_errors`.
    pub fn pump(&mut self, now: Instant) -> SessionResult<Option<RegionId>> {
        let events = self.binding.engine_mut().drain_events();
        for event in events {
            if let Err(err) = self.handle_event(event, now) {
                error!("event=engine_event module=session status=error error={err}");
                self.event_errors.push(err);
            }
        }
        self.tick(now)
    }

    pub fn handle_event(&mut self, event: EngineEvent, now: Instant) -> SessionResult<()> {
        match event {
            EngineEvent::Ready => {
                self.binding.engine_mut().enable_drag_selection()?;
                debug!("event=engine_ready module=session");
                Ok(())
            }
            EngineEvent::RegionCreated { id, start, end } => self.on_region_created(id, start, end),
            EngineEvent::RegionUpdated { id, .. } | EngineEvent::RegionUpdateEnd { id }
                if !self.store.contains(id) =>
            {
                debug!("event=region_updated module=session status=skip reason=stale id={id}");
                Ok(())
            }
            EngineEvent::RegionUpdated { id, start, end } => self.on_region_updated(id, start, end),
            EngineEvent::RegionUpdateEnd { id } => {
                self.binding.accept_released(id, now);
                Ok(())
            }
        }
    }

    /// Opens labeling for a draft whose settle timer expired.
    pub fn tick(&mut self, now: Instant) -> SessionResult<Option<RegionId>> {
        let Some(id) = self.binding.poll_settled(now) else {
            return Ok(None);
        };
        if !self.store.contains(id) {
            return Ok(None);
        }

        if let Some(displaced) = self.labeling.open(id) {
            self.discard_region(displaced)?;
        }
        info!("event=labeling_open module=session id={id}");
        Ok(Some(id))
    }

    fn on_region_created(&mut self, id: RegionId, start: f64, end: f64) -> SessionResult<()> {
        let outcome =
            self.binding
                .accept_drawn(&mut self.store, &mut self.colors, id, start, end)?;

        match outcome {
            DrawnRegion::Known => {
                if let Some(region) = self.store.get(id) {
                    self.blocks.insert(region);
                }
            }
            DrawnRegion::Stale => {}
            DrawnRegion::Draft { id, superseded } => {
                if let Some(region) = self.store.get(id) {
                    self.blocks.insert(region);
                }
                if let Some(previous) = superseded {
                    self.discard_region(previous)?;
                }
                if let Some(pending) = self.labeling.cancel() {
                    self.discard_region(pending)?;
                }
            }
        }
        Ok(())
    }

    fn on_region_updated(&mut self, id: RegionId, start: f64, end: f64) -> SessionResult<()> {
        self.binding.accept_moved(&mut self.store, id, start, end)?;
        let region = self.store.get(id).ok_or(SessionError::UnknownRegion(id))?;
        if !region.has_valid_range() {
            warn!("event=region_range module=session status=invalid id={id}");
        }
        self.blocks.refresh(region);
        Ok(())
    }

    /// Label field edit in a list block.
    pub fn edit_label(&mut self, id: RegionId, text: &str) -> SessionResult<()> {
        self.store.update(id, &RegionPatch::label(text))?;
        self.binding.mirror(&self.store, id)?;
        self.blocks.set_label_text(id, text);
        Ok(())
    }

    pub fn edit_start(&mut self, id: RegionId, text: &str) -> SessionResult<FieldEdit> {
        self.edit_bound(id, RegionBound::Start, text)
    }

    pub fn edit_end(&mut self, id: RegionId, text: &str) -> SessionResult<FieldEdit> {
        self.edit_bound(id, RegionBound::End, text)
    }

    /// Numeric field edit in a list block.
    ///
    /// Unparseable text stays in the field and is not applied.
    pub fn edit_bound(
        &mut self,
        id: RegionId,
        bound: RegionBound,
        text: &str,
    ) -> SessionResult<FieldEdit> {
        if !self.store.contains(id) {
            return Err(SessionError::UnknownRegion(id));
        }
        self.blocks.set_bound_text(id, bound, text);

        let Some(value) = parse_seconds(text) else {
            debug!(
                "event=field_edit module=session status=rejected id={id} field={}",
                bound.as_str()
            );
            self.blocks.mark_invalid(id, Some(bound));
            return Ok(FieldEdit::Rejected);
        };

        let patch = match bound {
            RegionBound::Start => RegionPatch::start(value),
            RegionBound::End => RegionPatch::end(value),
        };
        match self.store.update(id, &patch) {
            Ok(_) => {}
            Err(StoreError::Validation(err)) => {
                debug!("event=field_edit module=session status=rejected id={id} reason={err}");
                self.blocks.mark_invalid(id, Some(bound));
                return Ok(FieldEdit::Rejected);
            }
            Err(err) => return Err(err.into()),
        }

        self.binding.mirror(&self.store, id)?;
        let region = self.store.get(id).ok_or(SessionError::UnknownRegion(id))?;
        if !region.has_valid_range() {
            warn!(
                "event=region_range module=session status=invalid id={id} start={} end={}",
                region.start, region.end
            );
        }
        self.blocks.settle_edit(region);
        Ok(FieldEdit::Applied)
    }

    /// Collapse toggle. Returns the new collapsed state.
    pub fn toggle_block(&mut self, id: RegionId) -> SessionResult<bool> {
        self.blocks
            .toggle(id)
            .ok_or(SessionError::UnknownRegion(id))
    }

    /// Delete control. Returns `false` when the region is already gone.
    pub fn delete_region(&mut self, id: RegionId) -> SessionResult<bool> {
        if !self.store.contains(id) {
            warn!("event=region_delete module=session status=skip reason=unknown id={id}");
            return Ok(false);
        }
        self.remove_everywhere(id)?;
        info!("event=region_delete module=session status=ok id={id}");
        Ok(true)
    }

    /// Mirrors the modal text field.
    pub fn set_label_input(&mut self, text: &str) {
        self.labeling.set_input(text);
    }

    /// Modal save action.
    pub fn submit_label(&mut self) -> SessionResult<LabelCommit> {
        let outcome = self.labeling.commit();
        if let LabelCommit::Committed { id, label } = &outcome {
            self.store.update(*id, &RegionPatch::label(label.as_str()))?;
            self.binding.mirror(&self.store, *id)?;
            self.blocks.set_label_text(*id, label);
            info!("event=labeling_commit module=session status=ok id={id}");
        }
        Ok(outcome)
    }

    /// Key press inside the modal label field.
    pub fn label_keypress(&mut self, key: &str) -> SessionResult<Option<LabelCommit>> {
        if key != COMMIT_KEY {
            return Ok(None);
        }
        self.submit_label().map(Some)
    }

    /// Modal close action. Rolls the pending draft back.
    pub fn cancel_label(&mut self) -> SessionResult<Option<RegionId>> {
        let Some(id) = self.labeling.cancel() else {
            return Ok(None);
        };
        self.discard_region(id)?;
        Ok(Some(id))
    }

    /// Adds every entry of `text` as an imported region, or none of them.
    pub fn import_json(&mut self, text: &str) -> SessionResult<usize> {
        let entries = match parse_regions(text) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("event=import module=session status=rejected error={err}");
                self.notice = Some(err.to_string());
                return Err(err.into());
            }
        };

        let colors_before = self.colors.clone();
        let mut added = Vec::with_capacity(entries.len());
        for entry in entries {
            let spec = RegionSpec {
                start: entry.start,
                end: entry.end,
                color: self.colors.next(),
                label: entry.word,
            };
            let placed = match self.binding.place(&spec) {
                Ok(id) => self.store_imported(id, spec),
                Err(err) => Err(err.into()),
            };

            match placed {
                Ok(id) => added.push(id),
                Err(err) => {
                    for id in added {
                        if let Err(rollback) = self.remove_everywhere(id) {
                            error!(
                                "event=import_rollback module=session status=error id={id} error={rollback}"
                            );
                        }
                    }
                    self.colors = colors_before;
                    error!("event=import module=session status=rolled_back error={err}");
                    self.notice = Some(format!("import failed: {err}"));
                    return Err(err);
                }
            }
        }

        self.notice = None;
        info!("event=import module=session status=ok count={}", added.len());
        Ok(added.len())
    }

    /// Import button: pick, read, import. Returns `0` when the picker is
    /// dismissed.
    pub fn import_file(&mut self, files: &mut impl FileGateway) -> SessionResult<usize> {
        let Some(handle) = files.pick_file()? else {
            return Ok(0);
        };
        let text = match files.read_text(&handle) {
            Ok(text) => text,
            Err(err) => {
                self.notice = Some(err.to_string());
                return Err(err.into());
            }
        };
        self.import_json(&text)
    }

    pub fn export_json(&self) -> SessionResult<String> {
        export_regions(self.store.list()).map_err(SessionError::Export)
    }

    /// Export button: serialize and hand the file to the host download.
    pub fn export(&self, files: &mut impl FileGateway) -> SessionResult<()> {
        let json = self.export_json()?;
        files.download(&json, &self.config.export_file_name, JSON_MIME)?;
        info!(
            "event=export module=session status=ok count={} file={}",
            self.store.len(),
            self.config.export_file_name
        );
        Ok(())
    }

    /// Whether store, engine and blocks agree on the set of region ids.
    pub fn is_consistent(&self) -> bool {
        let stored: BTreeSet<RegionId> = self.store.ids().iter().copied().collect();
        let drawn: BTreeSet<RegionId> = self.binding.engine().region_ids().into_iter().collect();
        let rendered: BTreeSet<RegionId> = self.blocks.ids().into_iter().collect();
        stored == drawn && stored == rendered
    }

    fn store_imported(&mut self, id: RegionId, spec: RegionSpec) -> SessionResult<RegionId> {
        let region = Region::imported(id, spec.start, spec.end, spec.label, spec.color);
        if let Err(err) = self.store.create(region) {
            if let Err(rollback) = self.binding.detach(id) {
                error!("event=import_rollback module=session status=error id={id} error={rollback}");
            }
            return Err(err.into());
        }
        if let Some(region) = self.store.get(id) {
            self.blocks.insert(region);
        }
        Ok(id)
    }

    fn discard_region(&mut self, id: RegionId) -> SessionResult<()> {
        if !self.store.contains(id) {
            return Ok(());
        }
        self.remove_everywhere(id)?;
        info!("event=draft_rollback module=session status=ok id={id}");
        Ok(())
    }

    fn remove_everywhere(&mut self, id: RegionId) -> SessionResult<()> {
        self.store.remove(id)?;
        self.labeling.release(id);
        self.blocks.remove(id);
        match self.binding.detach(id) {
            Ok(()) | Err(EngineError::UnknownRegion(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
