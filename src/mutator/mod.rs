//! Mutation-capable values.
//!
//! A mutator is a transient handle over one composite node of a [`Document`].
//! The evaluator treats it as an ordinary value (it can be indexed, typed and
//! passed around) but it additionally carries write access to the location it
//! was reached through.
//!
//! ## Capabilities
//!
//! - **Value**: every mutator has a fixed [`TypeTag`] and refuses conversion
//!   to anything but itself (see [`Value::convert_to_type`]).
//! - **[`Indexer`]**: navigate into children.
//! - **[`Container`]**: structural child access, used by a child mutator
//!   against its parent.
//! - **[`Mutable`]**: merge a patch into the node, or remove it.
//!
//! ## Write-back
//!
//! Mappings are reached live through the document, so assigning into one is
//! visible without further work. Sequences are moved out of their cell
//! whenever they grow or shrink; the edited sequence is stored back
//! into the *parent's* cell with a single [`Container::set_child`] call. The
//! parent's cell itself never moves, so one hop is enough at any depth.
//!
//! [`Document`]: crate::document::Document
//! [`TypeTag`]: crate::value::TypeTag
//! [`Value::convert_to_type`]: crate::value::Value::convert_to_type

pub mod convert;
mod node;
mod object;
mod sequence;

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::{document::Native, value::Value};

pub use node::NodeState;
pub use object::ObjectMutator;
pub use sequence::SequenceMutator;

/// Errors produced by navigation, merge and removal.
///
/// Failures are terminal for the call that produced them; nothing already
/// written to the document is rolled back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    /// Missing key, or a path that no longer resolves
    #[error("no such key: {0}")]
    NotFound(String),

    /// Wrong key or identifier type for the container
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Navigating through a scalar
    #[error("not a container: {0}")]
    NotContainer(String),

    /// Expected a mapping
    #[error("not an object: {0}")]
    NotObject(String),

    /// Expected a sequence
    #[error("not a sequence: {0}")]
    NotSequence(String),

    #[error("index out of bound: {index} (length {len})")]
    IndexOutOfBound { index: i64, len: usize },

    /// Mutators are opaque handles and never convert to data
    #[error("disallowed conversion from {from:?} to {to:?}")]
    UnsupportedConversion { from: String, to: String },

    /// The node's contract forbids the operation
    #[error("no such overload: {0}")]
    UnsupportedOperation(String),

    /// Non-string key inside a patch mapping
    #[error("bad map key: {0}")]
    BadKey(String),
}

/// How a parent locates one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Entry of a mapping
    Key(String),
    /// Slot of a sequence
    Index(usize),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Key(key) => write!(f, "{key:?}"),
            Identifier::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Shared node state: where the node lives.
pub trait Node {
    fn state(&self) -> &NodeState;

    /// The mutator owning the container this node lives in, `None` for the root.
    fn parent(&self) -> Option<&Mutator> {
        self.state().parent()
    }

    /// How [`Node::parent`] locates this node, `None` for the root.
    fn identifier(&self) -> Option<&Identifier> {
        self.state().identifier()
    }
}

/// Navigation into children.
pub trait Indexer {
    /// Scalars come back as plain values, composites as child mutators.
    fn get(&self, key: &Value) -> Result<Value, MutationError>;
}

/// Structural child access. Only child mutators call this, on their parent.
pub trait Container: Node {
    /// A copy of the child, if present.
    fn child(&self, identifier: &Identifier) -> Option<Native>;

    /// Stores `value` in the child's cell.
    fn set_child(&self, identifier: &Identifier, value: Native) -> Result<(), MutationError>;

    /// Detaches the child from this container.
    fn remove_child(&self, identifier: &Identifier) -> Result<(), MutationError>;
}

/// Write operations on the node itself.
pub trait Mutable: Node {
    /// Shallow merge. Returns the success sentinel (`null`).
    fn merge(&self, patch: &Value) -> Result<Value, MutationError>;

    /// Removes the node from its parent. The root cannot remove itself.
    fn remove(&self) -> Result<Value, MutationError> {
        let state = self.state();
        match (state.parent(), state.identifier()) {
            (Some(parent), Some(identifier)) => {
                debug!(path = %state.path(), "removing node");
                parent.remove_child(identifier)?;
                Ok(Value::Null)
            }
            _ => Err(MutationError::UnsupportedOperation(
                "remove on the root node".to_string(),
            )),
        }
    }
}

/// A parent node: one of the two concrete mutator kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutator {
    Object(ObjectMutator),
    Sequence(SequenceMutator),
}

impl Node for Mutator {
    fn state(&self) -> &NodeState {
        match self {
            Mutator::Object(m) => m.state(),
            Mutator::Sequence(m) => m.state(),
        }
    }
}

impl Container for Mutator {
    fn child(&self, identifier: &Identifier) -> Option<Native> {
        match self {
            Mutator::Object(m) => m.child(identifier),
            Mutator::Sequence(m) => m.child(identifier),
        }
    }

    fn set_child(&self, identifier: &Identifier, value: Native) -> Result<(), MutationError> {
        match self {
            Mutator::Object(m) => m.set_child(identifier, value),
            Mutator::Sequence(m) => m.set_child(identifier, value),
        }
    }

    fn remove_child(&self, identifier: &Identifier) -> Result<(), MutationError> {
        match self {
            Mutator::Object(m) => m.remove_child(identifier),
            Mutator::Sequence(m) => m.remove_child(identifier),
        }
    }
}

/// What a child cell holds, decided without copying composites.
pub(crate) enum Slot {
    Scalar(Value),
    Mapping,
    Sequence,
}

impl Slot {
    pub(crate) fn of(native: &Native) -> Slot {
        match native {
            Native::Object(_) => Slot::Mapping,
            Native::Array(_) => Slot::Sequence,
            scalar => Slot::Scalar(convert::from_native(scalar)),
        }
    }

    /// Scalars pass through; composites become mutators bound to `(parent, identifier)`.
    pub(crate) fn into_value(
        self,
        parent: Mutator,
        identifier: Identifier,
    ) -> Result<Value, MutationError> {
        match self {
            Slot::Scalar(value) => Ok(value),
            Slot::Mapping => ObjectMutator::child_of(parent, identifier).map(Value::Object),
            Slot::Sequence => SequenceMutator::child_of(parent, identifier).map(Value::Sequence),
        }
    }
}
