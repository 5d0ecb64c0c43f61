//! Typed operand readers shared by the reconstructors.
//!
//! Optional metadata comes back as `Option`; a present value with the wrong
//! type or arity is a `MalformedOperand` error.
use std::borrow::Cow;

use smol_str::SmolStr;

use crate::{
    Decoder, Error, Matrix,
    engine::{Axis, Dimnames, MatrixEngine},
    node::{Node, Value},
};

const LENGTH_ATTRIBUTE: &str = "delayed_length";

pub(crate) fn dataset<'a>(node: &'a dyn Node, name: &str) -> Result<Cow<'a, Value>, Error> {
    node.dataset(name)
        .ok_or_else(|| Error::malformed(node.path(), name, "expected a dataset"))
}

pub(crate) fn scalar_i64(node: &dyn Node, name: &str) -> Result<i64, Error> {
    dataset(node, name)?
        .as_i64()
        .ok_or_else(|| Error::malformed(node.path(), name, "expected an integer scalar"))
}

pub(crate) fn optional_i64(node: &dyn Node, name: &str) -> Result<Option<i64>, Error> {
    match node.dataset(name) {
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::malformed(node.path(), name, "expected an integer scalar")),
        None => Ok(None),
    }
}

pub(crate) fn optional_f64(node: &dyn Node, name: &str) -> Result<Option<f64>, Error> {
    match node.dataset(name) {
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| Error::malformed(node.path(), name, "expected a numeric scalar")),
        None => Ok(None),
    }
}

pub(crate) fn scalar_string(node: &dyn Node, name: &str) -> Result<SmolStr, Error> {
    dataset(node, name)?
        .as_str()
        .map(SmolStr::new)
        .ok_or_else(|| Error::malformed(node.path(), name, "expected a string scalar"))
}

pub(crate) fn axis(node: &dyn Node, name: &str) -> Result<Axis, Error> {
    let index = scalar_i64(node, name)?;
    Axis::from_index(index)
        .ok_or_else(|| Error::malformed(node.path(), name, format!("axis {} is not 0 or 1", index)))
}

/// Non-negative integer vector, e.g. subset indices or a permutation.
pub(crate) fn indices(node: &dyn Node, name: &str) -> Result<Vec<usize>, Error> {
    dataset(node, name)?
        .to_i64s()
        .and_then(|v| v.into_iter().map(|i| usize::try_from(i).ok()).collect())
        .ok_or_else(|| Error::malformed(node.path(), name, "expected non-negative integers"))
}

/// Decodes the child group `seed`.
pub(crate) fn seed<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let seed = node
        .group("seed")
        .ok_or_else(|| Error::malformed(node.path(), "seed", "expected a seed group"))?;
    decoder.decode(seed.as_ref())
}

/// A group whose entries are named `"0"`, `"1"`, ...
pub(crate) struct List<'a> {
    group: Box<dyn Node + 'a>,
    len: usize,
}

impl<'a> List<'a> {
    pub(crate) fn open(node: &'a dyn Node, name: &str) -> Result<Option<Self>, Error> {
        let Some(group) = node.group(name) else {
            return Ok(None);
        };

        let len = match group.attribute(LENGTH_ATTRIBUTE) {
            Some(value) => value
                .as_i64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    Error::malformed(
                        group.path(),
                        LENGTH_ATTRIBUTE,
                        "expected a non-negative integer",
                    )
                })?,
            None => {
                let children = group.children();
                (0..).take_while(|i| children.iter().any(|c| c.as_str() == i.to_string())).count()
            }
        };

        Ok(Some(Self { group, len }))
    }

    pub(crate) fn require(node: &'a dyn Node, name: &str) -> Result<Self, Error> {
        Self::open(node, name)?
            .ok_or_else(|| Error::malformed(node.path(), name, "expected a list group"))
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn path(&self) -> &str {
        self.group.path()
    }

    pub(crate) fn group(&self, index: usize) -> Option<Box<dyn Node + '_>> {
        (index < self.len).then(|| self.group.group(&index.to_string())).flatten()
    }

    pub(crate) fn dataset(&self, index: usize) -> Option<Cow<'_, Value>> {
        (index < self.len).then(|| self.group.dataset(&index.to_string())).flatten()
    }
}

/// Reads a two-entry list of optional name vectors.
pub(crate) fn dimnames(node: &dyn Node, name: &str) -> Result<Option<Dimnames>, Error> {
    let Some(list) = List::open(node, name)? else {
        return Ok(None);
    };
    if list.len() != 2 {
        return Err(Error::malformed(
            list.path(),
            name,
            format!("expected 2 entries, got {}", list.len()),
        ));
    }

    let names = |index: usize| -> Result<Option<Vec<String>>, Error> {
        match list.dataset(index) {
            Some(value) => value.as_strings().map(|s| Some(s.to_vec())).ok_or_else(|| {
                Error::malformed(list.path(), index.to_string(), "expected a string vector")
            }),
            None => Ok(None),
        }
    };

    Ok(Some(Dimnames {
        rows: names(0)?,
        cols: names(1)?,
    }))
}

/// Checks that dimnames agree with a `(nrow, ncol)` shape.
pub(crate) fn check_dimnames(
    node: &dyn Node,
    field: &str,
    names: &Dimnames,
    shape: (usize, usize),
) -> Result<(), Error> {
    for (axis, names) in [(Axis::Row, &names.rows), (Axis::Column, &names.cols)] {
        if let Some(names) = names {
            let extent = axis.extent(shape);
            if names.len() != extent {
                return Err(Error::malformed(
                    node.path(),
                    field,
                    format!(
                        "{} names along dimension {} but extent is {}",
                        names.len(),
                        axis.index(),
                        extent
                    ),
                ));
            }
        }
    }
    Ok(())
}
