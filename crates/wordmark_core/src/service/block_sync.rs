//! List-block view model.
//!
//! # Responsibility
//! - Keep one editable block per region, in creation order.
//! - Parse start/end field text without letting bad input reach the store.
//!
//! # Invariants
//! - At most one block exists per `RegionId`.
//! - Field text is what the user typed; it is only overwritten when the
//!   region changes through another view.
//! - `range_warning` mirrors `!region.has_valid_range()`.

use crate::config::DEFAULT_NUMBER_STEP;
use crate::model::palette::Color;
use crate::model::region::{Region, RegionBound, RegionId};
use once_cell::sync::Lazy;
use regex::Regex;

// Same grammar an HTML number input accepts: no `inf`, no `NaN`, no hex.
static NUMBER_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid number field regex")
});

/// Header glyph for a collapsed block.
pub const COLLAPSED_GLYPH: &str = "▶";
/// Header glyph for an expanded block.
pub const EXPANDED_GLYPH: &str = "▼";

/// Outcome of one field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    Applied,
    /// Text kept in the field but not written to the store.
    Rejected,
}

/// Editable view of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBlock {
    pub id: RegionId,
    pub color: Color,
    /// Label shown in the always-visible header.
    pub header_label: String,
    pub label_input: String,
    pub start_input: String,
    pub end_input: String,
    /// Increment of the start/end number inputs.
    pub step: f64,
    pub collapsed: bool,
    pub range_warning: bool,
    /// Field whose current text failed to parse.
    pub invalid_field: Option<RegionBound>,
}

impl RegionBlock {
    pub fn from_region(region: &Region, step: f64) -> Self {
        Self {
            id: region.id,
            color: region.color.clone(),
            header_label: region.label.clone(),
            label_input: region.label.clone(),
            start_input: format_seconds(region.start),
            end_input: format_seconds(region.end),
            step,
            collapsed: true,
            range_warning: !region.has_valid_range(),
            invalid_field: None,
        }
    }

    pub fn toggle_glyph(&self) -> &'static str {
        if self.collapsed {
            COLLAPSED_GLYPH
        } else {
            EXPANDED_GLYPH
        }
    }
}

#[derive(Debug)]
pub struct BlockList {
    blocks: Vec<RegionBlock>,
    step: f64,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::with_step(DEFAULT_NUMBER_STEP)
    }
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block list whose number inputs advance by `step` seconds.
    pub fn with_step(step: f64) -> Self {
        Self {
            blocks: Vec::new(),
            step,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Renders a block for `region`. Returns `false` if one already exists.
    pub fn insert(&mut self, region: &Region) -> bool {
        if self.contains(region.id) {
            return false;
        }
        self.blocks.push(RegionBlock::from_region(region, self.step));
        true
    }

    pub fn remove(&mut self, id: RegionId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|block| block.id != id);
        self.blocks.len() != before
    }

    pub fn get(&self, id: RegionId) -> Option<&RegionBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }

    fn get_mut(&mut self, id: RegionId) -> Option<&mut RegionBlock> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionBlock> {
        self.blocks.iter()
    }

    pub fn ids(&self) -> Vec<RegionId> {
        self.blocks.iter().map(|block| block.id).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Flips the detail section. Returns the new collapsed state.
    pub fn toggle(&mut self, id: RegionId) -> Option<bool> {
        let block = self.get_mut(id)?;
        block.collapsed = !block.collapsed;
        Some(block.collapsed)
    }

    /// Records label field text and refreshes the header.
    pub fn set_label_text(&mut self, id: RegionId, text: &str) {
        if let Some(block) = self.get_mut(id) {
            text.clone_into(&mut block.label_input);
            text.clone_into(&mut block.header_label);
        }
    }

    /// Records numeric field text exactly as typed.
    pub fn set_bound_text(&mut self, id: RegionId, bound: RegionBound, text: &str) {
        if let Some(block) = self.get_mut(id) {
            match bound {
                RegionBound::Start => text.clone_into(&mut block.start_input),
                RegionBound::End => text.clone_into(&mut block.end_input),
            }
        }
    }

    pub fn mark_invalid(&mut self, id: RegionId, bound: Option<RegionBound>) {
        if let Some(block) = self.get_mut(id) {
            block.invalid_field = bound;
        }
    }

    /// Re-syncs derived state after the store accepted an edit from this
    /// block. Field text is left as typed.
    pub fn settle_edit(&mut self, region: &Region) {
        if let Some(block) = self.get_mut(region.id) {
            block.range_warning = !region.has_valid_range();
            block.invalid_field = None;
        }
    }

    /// Overwrites every field from `region` after a change made elsewhere.
    pub fn refresh(&mut self, region: &Region) {
        let step = self.step;
        if let Some(block) = self.get_mut(region.id) {
            let collapsed = block.collapsed;
            *block = RegionBlock::from_region(region, step);
            block.collapsed = collapsed;
        }
    }
}

/// Parses number-field text into seconds.
///
/// Returns `None` for anything that is not a plain finite decimal.
pub fn parse_seconds(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if !NUMBER_FIELD_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Formats seconds the way the number inputs display them.
pub fn format_seconds(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_seconds, parse_seconds, BlockList, COLLAPSED_GLYPH, EXPANDED_GLYPH};
    use crate::config::DEFAULT_NUMBER_STEP;
use crate::model::palette::Color;
    use crate::model::region::{Region, RegionBound, RegionId};

    fn region(start: f64, end: f64) -> Region {
        Region::imported(RegionId::new(), start, end, "word", Color::new("green"))
    }

    #[test]
    fn parse_seconds_accepts_plain_decimals_only() {
        assert_eq!(parse_seconds("1.25"), Some(1.25));
        assert_eq!(parse_seconds(" 2 "), Some(2.0));
        assert_eq!(parse_seconds(".5"), Some(0.5));
        assert_eq!(parse_seconds("1e1"), Some(10.0));
        assert_eq!(parse_seconds("abc"), None);
        assert_eq!(parse_seconds(""), None);
        assert_eq!(parse_seconds("NaN"), None);
        assert_eq!(parse_seconds("inf"), None);
        assert_eq!(parse_seconds("1.2.3"), None);
    }

    #[test]
    fn format_seconds_drops_trailing_zero() {
        assert_eq!(format_seconds(1.0), "1");
        assert_eq!(format_seconds(2.5), "2.5");
    }

    #[test]
    fn insert_is_idempotent_per_id() {
        let mut blocks = BlockList::new();
        let region = region(0.0, 1.0);
        assert!(blocks.insert(&region));
        assert!(!blocks.insert(&region));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn blocks_start_collapsed_and_toggle() {
        let mut blocks = BlockList::new();
        let region = region(0.0, 1.0);
        blocks.insert(&region);

        let block = blocks.get(region.id).expect("block");
        assert!(block.collapsed);
        assert_eq!(block.toggle_glyph(), COLLAPSED_GLYPH);

        assert_eq!(blocks.toggle(region.id), Some(false));
        assert_eq!(
            blocks.get(region.id).expect("block").toggle_glyph(),
            EXPANDED_GLYPH
        );
        assert_eq!(blocks.toggle(RegionId::new()), None);
    }

    #[test]
    fn refresh_keeps_collapse_state() {
        let mut blocks = BlockList::new();
        let mut region = region(0.0, 1.0);
        blocks.insert(&region);
        blocks.toggle(region.id);
        blocks.set_bound_text(region.id, RegionBound::Start, "oops");

        region.start = 2.0;
        blocks.refresh(&region);
        let block = blocks.get(region.id).expect("block");
        assert!(!block.collapsed);
        assert_eq!(block.start_input, "2");
        assert!(block.range_warning);
    }

    #[test]
    fn blocks_carry_list_step() {
        let mut blocks = BlockList::with_step(0.05);
        let mut region = region(0.0, 1.0);
        blocks.insert(&region);
        assert_eq!(blocks.get(region.id).expect("block").step, 0.05);

        region.end = 3.0;
        blocks.refresh(&region);
        assert_eq!(blocks.get(region.id).expect("block").step, 0.05);
        assert_eq!(BlockList::new().step(), 0.01);
    }
}
