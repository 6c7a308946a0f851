//! Annotation storage.
//!
//! # Responsibility
//! - Own region state for one session; every other component reads and
//!   writes through this layer.
//!
//! # Invariants
//! - The store holds no UI or engine references.
//! - Store APIs return semantic errors (`NotFound`, `DuplicateId`) instead of
//!   panicking on contract violations.

pub mod annotation_store;
