//! Annotation domain model.
//!
//! # Responsibility
//! - Define canonical region records used by every view.
//! - Own the palette rules for region display colors.
//!
//! # Invariants
//! - Every region is identified by a stable `RegionId`.
//! - Deletion is a hard removal; identities are never recycled.

pub mod palette;
pub mod region;
