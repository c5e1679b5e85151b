//! Editable targets and reversible editor actions.
//!
//! - [`Editable`]: marker trait for types that can be edited
//! - [`EditAction`]: a reversible edit operation (Command pattern)
//! - [`EditActionError`] / [`EditActionResult`]: error handling for actions
//!
//! EditActions are self-contained: each implementation stores whatever it
//! needs to redo and undo itself (node ids, old/new attribute values,
//! a selection snapshot).

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. Used by history
/// consumers that need to inspect recorded actions, e.g. to find the
/// nodes a transaction still refers to.
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marker trait for types that serve as editing targets.
///
/// Implement this on any type that actions can operate on: a map document
/// plus its selection, a settings page, a plain counter in tests.
pub trait Editable: 'static {}

/// Error type for action execution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditActionError {
    /// The target object was not found.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// The target is in an invalid state for this action.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A custom error with a description.
    #[error("{0}")]
    Custom(String),
}

/// Result type for action operations.
pub type EditActionResult<T = ()> = Result<T, EditActionError>;

/// A reversible editor action (Command pattern).
///
/// EditActions encapsulate a single logical edit and capture enough state to
/// undo the change and redo it.
///
/// # Object Safety
///
/// This trait is dyn-compatible so that different action types can be stored
/// in a single [`EditActionHistory`](super::EditActionHistory) as
/// `Box<dyn EditAction<T>>`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct MoveVertex {
///     node: NodeId,
///     old_pos: Vec2,
///     new_pos: Vec2,
/// }
///
/// impl EditAction<MapState> for MoveVertex {
///     fn apply(&mut self, target: &mut MapState) -> EditActionResult {
///         target.set_position(self.node, self.new_pos);
///         Ok(())
///     }
///
///     fn undo(&mut self, target: &mut MapState) -> EditActionResult {
///         target.set_position(self.node, self.old_pos);
///         Ok(())
///     }
///
///     fn description(&self) -> &str {
///         "Move vertex"
///     }
/// }
/// ```
pub trait EditAction<T: Editable>: fmt::Debug + AsAny + Send {
    /// Applies the action to the target (forward / redo direction).
    fn apply(&mut self, target: &mut T) -> EditActionResult;

    /// Reverses the action (undo direction).
    ///
    /// Must restore the target to the state before [`apply`](Self::apply)
    /// was called.
    fn undo(&mut self, target: &mut T) -> EditActionResult;

    /// A short, human-readable description for display in the edit menu.
    fn description(&self) -> &str;

    /// Whether applying this action would change anything at all.
    ///
    /// Inert actions are dropped by
    /// [`EditActionHistory::execute`](super::EditActionHistory::execute)
    /// without being applied or recorded.
    ///
    /// Default: `true`.
    fn has_changes(&self) -> bool {
        true
    }

    /// Whether this action changes document content.
    ///
    /// Return `false` for actions that only touch UI state (selection,
    /// visibility). They stay undoable but do not move the save point.
    ///
    /// Default: `true`.
    fn modifies_content(&self) -> bool {
        true
    }
}
