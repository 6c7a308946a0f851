//! Annotation file format.
//!
//! Wire shape: a JSON array of `{"start": seconds, "end": seconds, "word": label}`
//! in creation order. Export always emits an array, `[]` when empty.
//!
//! # Invariants
//! - Import parses and validates every entry before anything is created.
//! - Integral seconds are written as JSON integers (`1`, not `1.0`).

use crate::model::region::{validate_bound, Region, RegionBound, RegionValidationError};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Largest f64 magnitude below which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// One exported/imported annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRegion {
    #[serde(serialize_with = "serialize_seconds")]
    pub start: f64,
    #[serde(serialize_with = "serialize_seconds")]
    pub end: f64,
    /// Region label; named `word` on the wire.
    pub word: String,
}

impl From<&Region> for WireRegion {
    fn from(region: &Region) -> Self {
        Self {
            start: region.start,
            end: region.end,
            word: region.label.clone(),
        }
    }
}

/// Reasons an annotation file is refused as a whole.
#[derive(Debug)]
pub enum ImportError {
    Syntax(serde_json::Error),
    NotAnArray,
    Entry {
        index: usize,
        source: serde_json::Error,
    },
    Value {
        index: usize,
        source: RegionValidationError,
    },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "annotation file is not valid JSON: {err}"),
            Self::NotAnArray => write!(f, "annotation file must contain a JSON array"),
            Self::Entry { index, source } => {
                write!(f, "annotation #{} is malformed: {source}", index + 1)
            }
            Self::Value { index, source } => {
                write!(f, "annotation #{} is invalid: {source}", index + 1)
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::NotAnArray => None,
            Self::Entry { source, .. } => Some(source),
            Self::Value { source, .. } => Some(source),
        }
    }
}

/// Renders regions as the pretty-printed annotation file.
pub fn export_regions<'a>(
    regions: impl IntoIterator<Item = &'a Region>,
) -> serde_json::Result<String> {
    let entries: Vec<WireRegion> = regions.into_iter().map(WireRegion::from).collect();
    serde_json::to_string_pretty(&entries)
}

/// Parses an annotation file. Fails on the first bad entry.
pub fn parse_regions(text: &str) -> Result<Vec<WireRegion>, ImportError> {
    let document: Value = serde_json::from_str(text).map_err(ImportError::Syntax)?;
    let Value::Array(items) = document else {
        return Err(ImportError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let entry: WireRegion = serde_json::from_value(item)
                .map_err(|source| ImportError::Entry { index, source })?;
            validate_bound(RegionBound::Start, entry.start)
                .and_then(|_| validate_bound(RegionBound::End, entry.end))
                .map_err(|source| ImportError::Value { index, source })?;
            Ok(entry)
        })
        .collect()
}

fn serialize_seconds<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
