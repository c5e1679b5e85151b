//! # Mapwright Core
//!
//! Editor-agnostic building blocks shared by the map editor crates:
//!
//! - [`abstract_editor`]: reversible actions and the linear undo/redo history
//! - [`math`]: 2D vector aliases and geometry predicates used for picking
//! - [`settings`]: typed editor configuration with dotted-key lookup

pub mod abstract_editor;
pub mod math;
pub mod settings;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
