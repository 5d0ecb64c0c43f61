//! Read-only access to a serialized delayed-array tree.
//!
//! The decoder only needs four operations from a container: read an
//! attribute, read a dataset, open a child group and list child names.
//! [`Group`] is an in-memory tree implementing them, and [`json`] loads such
//! a tree from a JSON mirror of the HDF5 layout.
pub mod json;
mod memory;
mod value;

use std::borrow::Cow;

use smol_str::SmolStr;

pub use memory::{Entry, Group, GroupRef};
pub use value::{Data, Value};

/// A handle to one group in the serialized tree.
///
/// Absence is always reported as `None`, never as an empty value.
pub trait Node {
    /// Slash-separated location of this group, used in error messages.
    fn path(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>>;

    fn dataset(&self, name: &str) -> Option<Cow<'_, Value>>;

    fn group(&self, name: &str) -> Option<Box<dyn Node + '_>>;

    /// Names of all child entries (groups and datasets) in stored order.
    fn children(&self) -> Vec<SmolStr>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

/// Number of elements in `shape`, or `None` when it does not fit in `usize`.
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}
