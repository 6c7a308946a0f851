//! Host capability contracts.
//!
//! Rendering, playback and file dialogs live outside core. This module
//! defines the narrow traits core calls into, plus headless implementations
//! used by tests and the CLI.

pub mod files;
pub mod headless;
pub mod waveform;
