//! Region domain model.
//!
//! # Responsibility
//! - Define the canonical annotation record shared by waveform and list views.
//! - Validate numeric fields before they reach the annotation store.
//!
//! # Invariants
//! - `id` is assigned by the waveform engine and never reused in a session.
//! - `start` and `end` are always finite; `start` is never negative.
//! - `end <= start` is representable but reported by `has_valid_range()`.

use crate::model::palette::Color;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity of one region for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(Uuid);

impl RegionId {
    /// Mints a fresh identity. Engines call this when a region is born.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RegionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for RegionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provenance of a region.
///
/// Hand-drawn regions go through interactive labeling; imported ones never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionOrigin {
    /// Created by a drag gesture on the waveform.
    HandDrawn,
    /// Created from a loaded annotation file.
    Imported,
}

impl RegionOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HandDrawn => "hand_drawn",
            Self::Imported => "imported",
        }
    }
}

/// One labeled time interval over the audio timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Seconds from the start of the audio.
    pub start: f64,
    /// Seconds from the start of the audio. Should be greater than `start`.
    pub end: f64,
    /// Word label. Empty while a hand-drawn region awaits labeling.
    pub label: String,
    pub color: Color,
    pub origin: RegionOrigin,
}

impl Region {
    /// Creates an unlabeled hand-drawn draft.
    pub fn drawn(id: RegionId, start: f64, end: f64, color: Color) -> Self {
        Self {
            id,
            start,
            end,
            label: String::new(),
            color,
            origin: RegionOrigin::HandDrawn,
        }
    }

    /// Creates a region restored from an annotation file.
    pub fn imported(
        id: RegionId,
        start: f64,
        end: f64,
        label: impl Into<String>,
        color: Color,
    ) -> Self {
        Self {
            id,
            start,
            end,
            label: label.into(),
            color,
            origin: RegionOrigin::Imported,
        }
    }

    /// Validates numeric fields.
    ///
    /// An inverted or empty interval is not a validation failure; callers
    /// check `has_valid_range()` to surface a warning instead.
    pub fn validate(&self) -> Result<(), RegionValidationError> {
        validate_bound(RegionBound::Start, self.start)?;
        validate_bound(RegionBound::End, self.end)?;
        Ok(())
    }

    /// Returns whether `start < end`.
    pub fn has_valid_range(&self) -> bool {
        self.start < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_labeled(&self) -> bool {
        !self.label.is_empty()
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &RegionPatch) {
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
    }
}

/// Partial update for the mutable region fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPatch {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub label: Option<String>,
}

impl RegionPatch {
    pub fn bounds(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            label: None,
        }
    }

    pub fn start(start: f64) -> Self {
        Self {
            start: Some(start),
            ..Self::default()
        }
    }

    pub fn end(end: f64) -> Self {
        Self {
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.label.is_none()
    }
}

/// Which edge of a region a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionBound {
    Start,
    End,
}

impl RegionBound {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Numeric field violations rejected before storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionValidationError {
    NonFinite { bound: RegionBound, value: f64 },
    Negative { bound: RegionBound, value: f64 },
}

impl Display for RegionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { bound, value } => {
                write!(f, "region {} must be a finite number, got {value}", bound.as_str())
            }
            Self::Negative { bound, value } => {
                write!(f, "region {} must not be negative, got {value}", bound.as_str())
            }
        }
    }
}

impl Error for RegionValidationError {}

/// Checks one boundary value.
pub fn validate_bound(bound: RegionBound, value: f64) -> Result<(), RegionValidationError> {
    if !value.is_finite() {
        return Err(RegionValidationError::NonFinite { bound, value });
    }
    if value < 0.0 {
        return Err(RegionValidationError::Negative { bound, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Region, RegionBound, RegionId, RegionPatch, RegionValidationError};
    use crate::model::palette::Color;

    fn sample() -> Region {
        Region::drawn(RegionId::new(), 1.0, 2.5, Color::new("red"))
    }

    #[test]
    fn drawn_region_starts_unlabeled() {
        let region = sample();
        assert!(!region.is_labeled());
        assert!(region.has_valid_range());
        assert_eq!(region.duration(), 1.5);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut region = sample();
        region.apply(&RegionPatch::label("hello"));
        assert_eq!(region.label, "hello");
        assert_eq!(region.start, 1.0);

        region.apply(&RegionPatch::end(0.5));
        assert_eq!(region.end, 0.5);
        assert!(!region.has_valid_range());
        assert!(region.validate().is_ok());
    }

    #[test]
    fn validate_rejects_nan_and_negative_values() {
        let mut region = sample();
        region.start = f64::NAN;
        assert!(matches!(
            region.validate(),
            Err(RegionValidationError::NonFinite {
                bound: RegionBound::Start,
                ..
            })
        ));

        region.start = -0.5;
        assert!(matches!(
            region.validate(),
            Err(RegionValidationError::Negative {
                bound: RegionBound::Start,
                ..
            })
        ));
    }

    #[test]
    fn region_ids_are_unique() {
        assert_ne!(RegionId::new(), RegionId::new());
    }
}
