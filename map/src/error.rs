//! Error types for document edits.

use mapwright_core::abstract_editor::EditActionError;
use thiserror::Error;

use crate::document::NodeId;

/// An attribute value was rejected. The attribute is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown attribute \"{key}\" on {node_type}")]
    UnknownAttribute { node_type: String, key: String },
    #[error("expected {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value must be a finite number")]
    NotFinite,
    #[error("{value} is out of range {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },
    #[error("\"{value}\" is not a member of {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },
    #[error("referenced node {0} does not exist")]
    MissingTarget(NodeId),
    #[error("cannot parse \"{text}\" as {expected}")]
    Parse { text: String, expected: &'static str },
}

/// A structurally impossible edit. Rejected before any mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOperation {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("unknown node type \"{0}\"")]
    UnknownType(String),
    #[error("inserting {node} under {parent} would create a cycle")]
    Cycle { parent: NodeId, node: NodeId },
    #[error("{before} is not a child of {parent}")]
    NotAChild { parent: NodeId, before: NodeId },
    #[error("path \"{0}\" must be absolute")]
    RelativePath(String),
}

/// Any error raised by a document operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidOperation(#[from] InvalidOperation),
}

impl From<DocumentError> for EditActionError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InvalidOperation(InvalidOperation::UnknownNode(id)) => {
                EditActionError::TargetNotFound(id.to_string())
            }
            DocumentError::InvalidOperation(e) => EditActionError::InvalidState(e.to_string()),
            DocumentError::Validation(e) => EditActionError::Custom(e.to_string()),
        }
    }
}

/// Non-fatal: an attached node references something that is not attached.
///
/// Reported after a commit. Resolving it (nulling the reference or removing
/// the referrer) is up to the feature that built the transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{node}.{key} references {target}, which is not attached")]
pub struct DanglingReference {
    pub node: NodeId,
    pub key: String,
    pub target: NodeId,
}
