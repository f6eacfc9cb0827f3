//! The native document that mutators write into.
//!
//! Documents are plain `serde_json` trees. A [`Document`] is a shared handle
//! over the root cell so that every mutator built during one evaluation sees
//! (and writes) the same storage.

use std::{cell::RefCell, rc::Rc};

/// Any node of a native document.
pub type Native = serde_json::Value;

/// A native mapping (object) node.
pub type Mapping = serde_json::Map<String, Native>;

/// A native sequence (array) node.
pub type Sequence = Vec<Native>;

/// Shared handle over the root of a native document.
///
/// The handle is `!Send`: a document is owned by exactly one evaluation at a
/// time. Cloning the handle shares the storage, it never copies the tree.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Rc<RefCell<Native>>,
}

impl Document {
    /// Takes ownership of `root` without copying it.
    pub fn new(root: Native) -> Self {
        Document {
            root: Rc::new(RefCell::new(root)),
        }
    }

    /// Clones the current state of the whole tree.
    pub fn snapshot(&self) -> Native {
        self.root.borrow().clone()
    }

    /// Returns the tree, copying it only if other handles are still alive.
    pub fn into_inner(self) -> Native {
        match Rc::try_unwrap(self.root) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.borrow().clone(),
        }
    }

    /// Whether both handles point at the same storage.
    pub fn same_storage(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }

    pub(crate) fn cell(&self) -> &RefCell<Native> {
        &self.root
    }
}

impl From<Native> for Document {
    fn from(root: Native) -> Self {
        Document::new(root)
    }
}
