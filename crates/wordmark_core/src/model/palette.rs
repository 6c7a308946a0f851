//! Display colors and the cyclic color allocator.
//!
//! # Invariants
//! - The Nth region created in a session receives `palette[N % len]`.
//! - Deleting regions never rewinds the allocator.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Minimum number of palette entries accepted from configuration.
pub const MIN_PALETTE_SIZE: usize = 6;

/// Semi-transparent colors so overlapping regions stay readable.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "hsla(400, 100%, 30%, 0.5)",
    "hsla(200, 50%, 70%, 0.4)",
    "hsla(100, 100%, 50%, 0.3)",
    "hsla(50, 100%, 50%, 0.3)",
    "hsla(300, 100%, 40%, 0.4)",
    "hsla(120, 60%, 70%, 0.5)",
    "hsla(0, 80%, 50%, 0.3)",
    "hsla(240, 60%, 50%, 0.3)",
];

/// CSS color string handed to the rendering layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stateful cyclic allocator over a fixed palette.
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    palette: Vec<Color>,
    issued: usize,
}

impl ColorAllocator {
    /// Creates an allocator over `palette`.
    ///
    /// Falls back to `DEFAULT_PALETTE` when `palette` is empty so `next()`
    /// always has something to hand out. Size rules are enforced by config
    /// validation.
    pub fn new(palette: Vec<Color>) -> Self {
        let palette = if palette.is_empty() {
            default_palette()
        } else {
            palette
        };
        Self { palette, issued: 0 }
    }

    /// Returns the next palette color and advances the counter.
    pub fn next(&mut self) -> Color {
        let color = self.peek().clone();
        self.issued += 1;
        color
    }

    /// Color the next `next()` call will return.
    pub fn peek(&self) -> &Color {
        &self.palette[self.issued % self.palette.len()]
    }

    /// Number of colors handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new(default_palette())
    }
}

pub fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE.iter().map(|value| Color::new(*value)).collect()
}
