//! Aria Artwork - cover colours and theme preferences
//!
//! Derives an accent colour from album art and keeps the user's theme
//! choice (mode plus colours) in a key-value store.
//!
//! # Example
//!
//! ```no_run
//! use aria_artwork::ColorExtractor;
//!
//! let bytes = std::fs::read("cover.jpg").unwrap();
//! match ColorExtractor::dominant_color(&bytes) {
//!     Ok(color) => println!("Accent: {}", color.to_hex()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]

mod error;
mod extractor;
mod theme;
mod types;

pub use error::{ArtworkError, Result};
pub use extractor::ColorExtractor;
pub use theme::{ThemeStore, THEME_KEY};
pub use types::{Palette, Rgb, ThemeMode, ThemePreference, PALETTES};
