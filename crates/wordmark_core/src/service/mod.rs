//! Annotation use-case services.
//!
//! # Responsibility
//! - Keep store, waveform engine and list blocks in step for every user or
//!   engine event.
//! - Own the interaction state machines (draft settling, label capture).
//! - Define the annotation file format.
//!
//! # See also
//! - `session::AnnotationSession`, the single entry point for hosts.

pub mod block_sync;
pub mod labeling;
pub mod serialization;
pub mod session;
pub mod settle;
pub mod waveform_binding;
