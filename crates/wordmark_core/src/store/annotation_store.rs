//! In-memory annotation store.
//!
//! # Responsibility
//! - Hold the single authoritative copy of every region in a session.
//! - Preserve creation order for listing and export.
//!
//! # Invariants
//! - Write paths call `Region::validate()` before mutating state.
//! - `order` and `regions` always hold the same set of ids.
//! - Unknown ids surface as `StoreError::NotFound`, never as a panic.

use crate::model::region::{Region, RegionId, RegionPatch, RegionValidationError};
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store contract violations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Validation(RegionValidationError),
    NotFound(RegionId),
    DuplicateId(RegionId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "region not found: {id}"),
            Self::DuplicateId(id) => write!(f, "region id already in use: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<RegionValidationError> for StoreError {
    fn from(value: RegionValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Identity-keyed region map with stable creation order.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    regions: HashMap<RegionId, Region>,
    order: Vec<RegionId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new region and returns its id.
    pub fn create(&mut self, region: Region) -> StoreResult<RegionId> {
        region.validate()?;
        if self.regions.contains_key(&region.id) {
            return Err(StoreError::DuplicateId(region.id));
        }

        let id = region.id;
        debug!(
            "event=region_store module=store op=create id={} origin={} start={} end={}",
            id,
            region.origin.as_str(),
            region.start,
            region.end
        );
        self.order.push(id);
        self.regions.insert(id, region);
        Ok(id)
    }

    /// Applies a partial update and returns the updated snapshot.
    ///
    /// The patch is validated against a copy first, so a rejected patch
    /// leaves the stored region untouched.
    pub fn update(&mut self, id: RegionId, patch: &RegionPatch) -> StoreResult<&Region> {
        let stored = self.regions.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        let mut candidate = stored.clone();
        candidate.apply(patch);
        candidate.validate()?;
        *stored = candidate;

        debug!("event=region_store module=store op=update id={id}");
        Ok(&*stored)
    }

    /// Removes a region and returns its last state.
    pub fn remove(&mut self, id: RegionId) -> StoreResult<Region> {
        let removed = self.regions.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.order.retain(|existing| *existing != id);
        debug!("event=region_store module=store op=remove id={id}");
        Ok(removed)
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    /// Lists regions in creation order.
    pub fn list(&self) -> Vec<&Region> {
        self.order
            .iter()
            .filter_map(|id| self.regions.get(id))
            .collect()
    }

    /// Region ids in creation order.
    pub fn ids(&self) -> &[RegionId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops every region. Used when a new audio file replaces the session.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.order.clear();
    }
}
