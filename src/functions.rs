//! Evaluator-visible mutation functions.
//!
//! `merge` and `remove` are registered once per mutator type so that the
//! checker and the evaluator resolve them by receiver type.

use crate::{
    env::{Binding, Overload},
    mutator::MutationError,
    value::{TypeTag, Value},
};

pub const MERGE: &str = "merge";
pub const REMOVE: &str = "remove";

/// `receiver.merge(patch)`: shallow-merges `patch` into the receiver's node.
pub fn merge_operation(lhs: &Value, rhs: &Value) -> Result<Value, MutationError> {
    let mutator = lhs.as_mutable().ok_or_else(|| {
        MutationError::UnsupportedOperation(format!("{MERGE} on {}", lhs.type_tag()))
    })?;
    mutator.merge(rhs)
}

/// `receiver.remove()`: detaches the receiver's node from its parent.
pub fn remove_operation(lhs: &Value) -> Result<Value, MutationError> {
    let mutator = lhs.as_mutable().ok_or_else(|| {
        MutationError::UnsupportedOperation(format!("{REMOVE} on {}", lhs.type_tag()))
    })?;
    mutator.remove()
}

/// The four overloads backing `merge` and `remove`.
pub fn mutator_overloads() -> Vec<Overload> {
    vec![
        Overload {
            id: "object_mutator_merge",
            function: MERGE,
            receiver: TypeTag::ObjectMutator,
            binding: Binding::Binary(merge_operation),
        },
        Overload {
            id: "sequence_mutator_merge",
            function: MERGE,
            receiver: TypeTag::SequenceMutator,
            binding: Binding::Binary(merge_operation),
        },
        Overload {
            id: "object_mutator_remove",
            function: REMOVE,
            receiver: TypeTag::ObjectMutator,
            binding: Binding::Unary(remove_operation),
        },
        Overload {
            id: "sequence_mutator_remove",
            function: REMOVE,
            receiver: TypeTag::SequenceMutator,
            binding: Binding::Unary(remove_operation),
        },
    ]
}
