//! # Mapwright Map
//!
//! Editing core of the Mapwright 2D map editor.
//!
//! ## Document Model
//!
//! - [`NodeTypeRegistry`]: node types, their typed attributes and what they accept as children
//! - [`Document`]: ordered node tree with validated attributes and queued change events
//! - [`Selection`]: observable, insertion-ordered set of nodes
//! - [`catalog`]: the node types of a polygon map and helpers to build content
//!
//! ## Editing
//!
//! - [`Transaction`]: recorded attribute and structure changes, applied and undone as a unit
//! - [`MapEditor`]: document, selection, history and settings of one open map
//! - [`ClonedNodes`]: subtree copies with reference fix-up across documents
//! - [`ops`]: arrange, delete, clipboard, relocate, transform and selection commands
//!
//! ## Interaction
//!
//! - [`SnapHandle`]: draggable point that snaps to nearby objects or the grid
//! - [`View`]: pan, zoom and grid of the map view

pub mod attribute;
pub mod catalog;
pub mod clone;
pub mod document;
pub mod edit;
pub mod editor;
pub mod error;
pub mod ops;
pub mod path;
pub mod registry;
pub mod selection;
pub mod snapping;
pub mod view;

pub use attribute::{Color, DataType, EnumType, IntWidth, Value};
pub use clone::{CloneExternal, ClonedNodes, ExternalReferences, KeepExternal, MatchByKey};
pub use document::{ChangeEvent, ChangeKind, Document, NodeId};
pub use edit::{EditCommand, Transaction};
pub use editor::{Commit, MapEditor, MapState};
pub use error::{DanglingReference, DocumentError, InvalidOperation, ValidationError};
pub use registry::{AttributeSchema, DanglingPolicy, Footprint, NodeTypeInfo, NodeTypeRegistry};
pub use selection::{NodeSet, Selection};
pub use snapping::{SnapCandidate, SnapContext, SnapHandle, SnapSource};
pub use view::{Grid, View};
