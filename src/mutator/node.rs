use std::{fmt, rc::Rc};

use super::{Identifier, MutationError, Mutator, Node};
use crate::document::{Document, Native};

/// Where a mutator lives: the document plus the `(parent, identifier)` link.
///
/// The root has neither a parent nor an identifier. A child holds its parent
/// alive but the parent never learns about the child, so no cycles form.
#[derive(Clone)]
pub struct NodeState {
    document: Document,
    parent: Option<Rc<Mutator>>,
    identifier: Option<Identifier>,
}

impl NodeState {
    pub(crate) fn root(document: Document) -> Self {
        NodeState {
            document,
            parent: None,
            identifier: None,
        }
    }

    pub(crate) fn child(parent: Mutator, identifier: Identifier) -> Self {
        NodeState {
            document: parent.state().document.clone(),
            parent: Some(Rc::new(parent)),
            identifier: Some(identifier),
        }
    }

    pub fn parent(&self) -> Option<&Mutator> {
        self.parent.as_deref()
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Identifiers from the document root down to this node.
    fn identifiers(&self) -> Vec<&Identifier> {
        let mut identifiers = Vec::new();
        let mut current = self;
        while let (Some(parent), Some(identifier)) = (&current.parent, &current.identifier) {
            identifiers.push(identifier);
            current = parent.state();
        }
        identifiers.reverse();
        identifiers
    }

    /// Human readable location, e.g. `$.spec.containers[1]`.
    pub fn path(&self) -> String {
        let mut path = String::from("$");
        for identifier in self.identifiers() {
            match identifier {
                Identifier::Key(key) => {
                    path.push('.');
                    path.push_str(key);
                }
                Identifier::Index(index) => {
                    path.push_str(&format!("[{index}]"));
                }
            }
        }
        path
    }

    /// Runs `f` on this node's current cell.
    pub(crate) fn read<R>(
        &self,
        f: impl FnOnce(&Native) -> Result<R, MutationError>,
    ) -> Result<R, MutationError> {
        let root = self.document.cell().borrow();
        let mut cell: &Native = &root;
        for identifier in self.identifiers() {
            cell = locate(cell, identifier)?;
        }
        f(cell)
    }

    /// Runs `f` on this node's current cell with write access.
    pub(crate) fn write<R>(
        &self,
        f: impl FnOnce(&mut Native) -> Result<R, MutationError>,
    ) -> Result<R, MutationError> {
        let mut root = self.document.cell().borrow_mut();
        let mut cell: &mut Native = &mut root;
        for identifier in self.identifiers() {
            cell = locate_mut(cell, identifier)?;
        }
        f(cell)
    }
}

impl PartialEq for NodeState {
    fn eq(&self, other: &Self) -> bool {
        self.document.same_storage(&other.document) && self.identifiers() == other.identifiers()
    }
}

impl fmt::Debug for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeState")
            .field("path", &self.path())
            .finish()
    }
}

fn locate<'a>(container: &'a Native, identifier: &Identifier) -> Result<&'a Native, MutationError> {
    match (container, identifier) {
        (Native::Object(mapping), Identifier::Key(key)) => mapping
            .get(key)
            .ok_or_else(|| MutationError::NotFound(key.clone())),
        (Native::Array(sequence), Identifier::Index(index)) => {
            sequence
                .get(*index)
                .ok_or(MutationError::IndexOutOfBound {
                    index: *index as i64,
                    len: sequence.len(),
                })
        }
        (other, identifier) => Err(mismatch(other, identifier)),
    }
}

fn locate_mut<'a>(
    container: &'a mut Native,
    identifier: &Identifier,
) -> Result<&'a mut Native, MutationError> {
    match (container, identifier) {
        (Native::Object(mapping), Identifier::Key(key)) => mapping
            .get_mut(key)
            .ok_or_else(|| MutationError::NotFound(key.clone())),
        (Native::Array(sequence), Identifier::Index(index)) => {
            let len = sequence.len();
            sequence.get_mut(*index).ok_or(MutationError::IndexOutOfBound {
                index: *index as i64,
                len,
            })
        }
        (other, identifier) => Err(mismatch(other, identifier)),
    }
}

fn mismatch(container: &Native, identifier: &Identifier) -> MutationError {
    match (container, identifier) {
        (Native::Object(_), Identifier::Index(index)) => MutationError::TypeMismatch(format!(
            "expected a string key for an object, got index {index}"
        )),
        (Native::Array(_), Identifier::Key(key)) => MutationError::TypeMismatch(format!(
            "expected an integer index for a sequence, got key {key:?}"
        )),
        (_, identifier) => MutationError::NotContainer(format!(
            "cannot look up {identifier} in a scalar"
        )),
    }
}
