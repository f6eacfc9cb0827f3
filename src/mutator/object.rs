use tracing::{debug, trace};

use super::{
    Container, Identifier, Indexer, Mutable, MutationError, Mutator, Node, NodeState, Slot,
    convert,
};
use crate::{
    document::{Document, Mapping, Native},
    value::Value,
};

/// Mutator over a mapping.
///
/// The mapping is reached live through the document, so merges land in place
/// and never need a write-back.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMutator {
    state: NodeState,
}

impl ObjectMutator {
    /// Root mutator over the whole document, which must be a mapping.
    pub fn root(document: &Document) -> Result<Self, MutationError> {
        let mutator = ObjectMutator {
            state: NodeState::root(document.clone()),
        };
        mutator.read_mapping(|_| Ok(()))?;
        Ok(mutator)
    }

    pub(crate) fn child_of(parent: Mutator, identifier: Identifier) -> Result<Self, MutationError> {
        let mutator = ObjectMutator {
            state: NodeState::child(parent, identifier),
        };
        mutator.read_mapping(|_| Ok(()))?;
        trace!(path = %mutator.state.path(), "object mutator");
        Ok(mutator)
    }

    /// Number of entries in the mapping.
    pub fn len(&self) -> Result<usize, MutationError> {
        self.read_mapping(|mapping| Ok(mapping.len()))
    }

    pub fn is_empty(&self) -> Result<bool, MutationError> {
        self.len().map(|len| len == 0)
    }

    fn read_mapping<R>(
        &self,
        f: impl FnOnce(&Mapping) -> Result<R, MutationError>,
    ) -> Result<R, MutationError> {
        self.state.read(|cell| match cell {
            Native::Object(mapping) => f(mapping),
            _ => Err(MutationError::NotObject(self.state.path())),
        })
    }

    fn write_mapping<R>(
        &self,
        f: impl FnOnce(&mut Mapping) -> Result<R, MutationError>,
    ) -> Result<R, MutationError> {
        self.state.write(|cell| match cell {
            Native::Object(mapping) => f(mapping),
            _ => Err(MutationError::NotObject(self.state.path())),
        })
    }
}

fn expect_key(identifier: &Identifier) -> Result<&str, MutationError> {
    match identifier {
        Identifier::Key(key) => Ok(key),
        Identifier::Index(index) => Err(MutationError::TypeMismatch(format!(
            "identifier has wrong type, expected string but got index {index}"
        ))),
    }
}

impl Node for ObjectMutator {
    fn state(&self) -> &NodeState {
        &self.state
    }
}

impl Indexer for ObjectMutator {
    fn get(&self, key: &Value) -> Result<Value, MutationError> {
        let Value::String(key) = key else {
            return Err(MutationError::TypeMismatch(format!(
                "object field must be a string, got {}",
                key.type_tag()
            )));
        };
        let slot = self.read_mapping(|mapping| {
            mapping
                .get(key)
                .map(Slot::of)
                .ok_or_else(|| MutationError::NotFound(key.clone()))
        })?;
        slot.into_value(Mutator::Object(self.clone()), Identifier::Key(key.clone()))
    }
}

impl Container for ObjectMutator {
    fn child(&self, identifier: &Identifier) -> Option<Native> {
        let key = expect_key(identifier).ok()?;
        self.read_mapping(|mapping| Ok(mapping.get(key).cloned()))
            .ok()
            .flatten()
    }

    fn set_child(&self, identifier: &Identifier, value: Native) -> Result<(), MutationError> {
        let key = expect_key(identifier)?;
        self.write_mapping(|mapping| {
            mapping.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn remove_child(&self, identifier: &Identifier) -> Result<(), MutationError> {
        let key = expect_key(identifier)?;
        self.write_mapping(|mapping| {
            mapping.remove(key);
            Ok(())
        })
    }
}

impl Mutable for ObjectMutator {
    /// Assigns every patch entry onto the mapping, replacing what was there.
    ///
    /// Nested maps in the patch are flattened and stored as new structure;
    /// existing nested values are overwritten, never descended into. A list
    /// value is rejected. Entries applied before a failing one stay applied.
    fn merge(&self, patch: &Value) -> Result<Value, MutationError> {
        let Value::Map(entries) = patch else {
            return Err(MutationError::UnsupportedOperation(format!(
                "merge of {} into an object",
                patch.type_tag()
            )));
        };
        debug!(path = %self.state.path(), fields = entries.len(), "merging into object");
        self.write_mapping(|mapping| {
            for (key, value) in entries {
                let Value::String(name) = key else {
                    return Err(MutationError::BadKey(key.to_string()));
                };
                let field = match value {
                    Value::List(_) => {
                        return Err(MutationError::UnsupportedOperation(
                            "array cannot merge with object".to_string(),
                        ));
                    }
                    other => convert::to_native(other)?,
                };
                mapping.insert(name.clone(), field);
            }
            Ok(())
        })?;
        Ok(Value::Null)
    }
}
