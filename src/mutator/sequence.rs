use std::mem;

use tracing::{debug, trace};

use super::{
    Container, Identifier, Indexer, Mutable, MutationError, Mutator, Node, NodeState, Slot,
    convert,
};
use crate::{
    document::{Document, Native, Sequence},
    value::Value,
};

/// Mutator over a sequence.
///
/// Slot assignment happens in place. Growing or shrinking moves the sequence
/// out of its cell, edits it, and writes it back into the parent's cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceMutator {
    state: NodeState,
}

impl SequenceMutator {
    /// Root mutator over a document whose root is a sequence.
    pub fn root(document: &Document) -> Result<Self, MutationError> {
        let mutator = SequenceMutator {
            state: NodeState::root(document.clone()),
        };
        mutator.read_sequence(|_| Ok(()))?;
        Ok(mutator)
    }

    pub(crate) fn child_of(parent: Mutator, identifier: Identifier) -> Result<Self, MutationError> {
        let mutator = SequenceMutator {
            state: NodeState::child(parent, identifier),
        };
        mutator.read_sequence(|_| Ok(()))?;
        trace!(path = %mutator.state.path(), "sequence mutator");
        Ok(mutator)
    }

    pub fn len(&self) -> Result<usize, MutationError> {
        self.read_sequence(|sequence| Ok(sequence.len()))
    }

    pub fn is_empty(&self) -> Result<bool, MutationError> {
        self.len().map(|len| len == 0)
    }

    fn read_sequence<R>(
        &self,
        f: impl FnOnce(&Sequence) -> Result<R, MutationError>,
    ) -> Result<R, MutationError> {
        self.state.read(|cell| match cell {
            Native::Array(sequence) => f(sequence),
            _ => Err(MutationError::NotSequence(self.state.path())),
        })
    }

    /// Moves the sequence out of its cell once `check` accepts it, leaving an
    /// empty placeholder until [`Self::write_back`] stores the result.
    fn take(
        &self,
        check: impl FnOnce(&Sequence) -> Result<(), MutationError>,
    ) -> Result<Sequence, MutationError> {
        self.state.write(|cell| match cell {
            Native::Array(sequence) => {
                check(sequence)?;
                Ok(mem::take(sequence))
            }
            _ => Err(MutationError::NotSequence(self.state.path())),
        })
    }

    /// Stores a relocated sequence into the parent's cell.
    ///
    /// Only the sequence itself moved; the parent's cell did not, so this
    /// single hop makes the new sequence reachable from the root.
    fn write_back(&self, sequence: Sequence) -> Result<(), MutationError> {
        debug!(path = %self.state.path(), len = sequence.len(), "writing sequence back");
        match (self.state.parent(), self.state.identifier()) {
            (Some(parent), Some(identifier)) => {
                parent.set_child(identifier, Native::Array(sequence))
            }
            _ => self.state.write(|cell| {
                *cell = Native::Array(sequence);
                Ok(())
            }),
        }
    }
}

fn expect_index(identifier: &Identifier) -> Result<usize, MutationError> {
    match identifier {
        Identifier::Index(index) => Ok(*index),
        Identifier::Key(key) => Err(MutationError::TypeMismatch(format!(
            "expected index to be an int, but got key {key:?}"
        ))),
    }
}

fn check_bound(index: usize, len: usize) -> Result<(), MutationError> {
    if index >= len {
        return Err(MutationError::IndexOutOfBound {
            index: index as i64,
            len,
        });
    }
    Ok(())
}

impl Node for SequenceMutator {
    fn state(&self) -> &NodeState {
        &self.state
    }
}

impl Indexer for SequenceMutator {
    fn get(&self, key: &Value) -> Result<Value, MutationError> {
        let Value::Integer(requested) = key else {
            return Err(MutationError::TypeMismatch(format!(
                "sequence index must be an int, got {}",
                key.type_tag()
            )));
        };
        let (index, slot) = self.read_sequence(|sequence| {
            let out_of_bound = MutationError::IndexOutOfBound {
                index: *requested,
                len: sequence.len(),
            };
            let index = usize::try_from(*requested).map_err(|_| out_of_bound.clone())?;
            let element = sequence.get(index).ok_or(out_of_bound)?;
            Ok((index, Slot::of(element)))
        })?;
        slot.into_value(Mutator::Sequence(self.clone()), Identifier::Index(index))
    }
}

impl Container for SequenceMutator {
    fn child(&self, identifier: &Identifier) -> Option<Native> {
        let index = expect_index(identifier).ok()?;
        self.read_sequence(|sequence| Ok(sequence.get(index).cloned()))
            .ok()
            .flatten()
    }

    fn set_child(&self, identifier: &Identifier, value: Native) -> Result<(), MutationError> {
        let index = expect_index(identifier)?;
        self.state.write(|cell| match cell {
            Native::Array(sequence) => {
                check_bound(index, sequence.len())?;
                sequence[index] = value;
                Ok(())
            }
            _ => Err(MutationError::NotSequence(self.state.path())),
        })
    }

    fn remove_child(&self, identifier: &Identifier) -> Result<(), MutationError> {
        let index = expect_index(identifier)?;
        let mut sequence = self.take(|sequence| check_bound(index, sequence.len()))?;
        sequence.remove(index);
        self.write_back(sequence)
    }
}

impl Mutable for SequenceMutator {
    /// Appends every patch element, flattened to native form, then writes the
    /// grown sequence back. A failing element leaves the document untouched.
    fn merge(&self, patch: &Value) -> Result<Value, MutationError> {
        let Value::List(elements) = patch else {
            return Err(MutationError::UnsupportedOperation(format!(
                "merge of {} into a sequence",
                patch.type_tag()
            )));
        };
        // Convert first so a failing element leaves the cell as it was
        let appended = elements
            .iter()
            .map(convert::to_native)
            .collect::<Result<Vec<_>, _>>()?;
        let mut sequence = self.take(|_| Ok(()))?;
        sequence.extend(appended);
        debug!(path = %self.state.path(), appended = elements.len(), "merging into sequence");
        self.write_back(sequence)?;
        Ok(Value::Null)
    }
}
