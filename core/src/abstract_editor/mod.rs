//! Abstract editor framework for reversible editing operations.
//!
//! This module provides the foundational traits and types for building
//! an undo/redo-capable editor. It is decoupled from the map document so
//! that the history can be tested against any editable target.
//!
//! - [`Editable`]: marker trait for types that can be edited
//! - [`EditAction`]: an edit operation (Command pattern)
//! - [`EditActionHistory`]: linear history with an undone-count cursor
//!
//! # Inert actions
//!
//! An action whose [`EditAction::has_changes`] returns `false` carries no
//! effect. [`EditActionHistory::execute`] neither applies nor records it,
//! so a tool can build an edit unconditionally and let the history drop
//! the empty ones.
//!
//! # Content vs. UI state
//!
//! Recorded actions can return `false` from [`EditAction::modifies_content`]
//! to indicate they represent UI state rather than document edits. They are
//! fully undoable but do not move the save point, so
//! [`EditActionHistory::has_unsaved_changes`] ignores them.

mod action;
mod history;

pub use action::{AsAny, EditAction, EditActionError, EditActionResult, Editable};
pub use history::{DEFAULT_MAX_UNDO, EditActionHistory, EntryId};
