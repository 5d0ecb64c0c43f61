use std::borrow::Cow;

use crate::{
    Decoder, Error, ErrorKind, Matrix,
    engine::{DenseMatrix, MatrixEngine, SparseMatrix},
    node::{Node, element_count},
    read,
};

fn malformed(node: &dyn Node, reason: impl Into<Cow<'static, str>>) -> Error {
    Error::new(node.path(), ErrorKind::MalformedArray(reason.into()))
}

/// Loads a `dense array` leaf.
///
/// `data` is stored row-major. With `native` set the matrix has the dataset's
/// dimensions; otherwise the dimensions are reversed, which makes the stored
/// order column-major.
pub(crate) fn load_dense<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let data = node.dataset("data").ok_or_else(|| malformed(node, "expected a 'data' dataset"))?;
    let values = data
        .to_f64s()
        .ok_or_else(|| {
            malformed(node, format!("'data' has unsupported type {}", data.data.type_name()))
        })?;
    let native = match node.dataset("native") {
        Some(native) => native
            .as_bool()
            .ok_or_else(|| Error::malformed(node.path(), "native", "expected a boolean scalar"))?,
        None => false,
    };

    let expected = element_count(&data.shape)
        .ok_or_else(|| malformed(node, format!("'data' shape {:?} is too large", data.shape)))?;
    if values.len() != expected {
        return Err(malformed(node, "'data' shape does not match its length"));
    }

    let matrix = match data.shape.as_slice() {
        [n] => DenseMatrix::new(*n, 1, values),
        [d0, d1] if native => {
            let (nrow, ncol) = (*d0, *d1);
            let mut column_major = Vec::with_capacity(values.len());
            for c in 0..ncol {
                column_major.extend((0..nrow).map(|r| values[r * ncol + c]));
            }
            DenseMatrix::new(nrow, ncol, column_major)
        }
        [d0, d1] => DenseMatrix::new(*d1, *d0, values),
        shape => {
            return Err(malformed(
                node,
                format!("'data' must have 1 or 2 dimensions, got {}", shape.len()),
            ));
        }
    };

    let output = decoder.adopt(node, decoder.engine().dense(matrix))?;
    attach_dimnames(decoder, node, output)
}

/// Loads a compressed sparse column `sparse matrix` leaf.
pub(crate) fn load_sparse<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let (nrow, ncol) = match read::indices(node, "shape")?.as_slice() {
        [nrow, ncol] => (*nrow, *ncol),
        other => {
            return Err(Error::malformed(
                node.path(),
                "shape",
                format!("expected 2 dimensions, got {}", other.len()),
            ));
        }
    };

    let data = read::dataset(node, "data")?;
    let values = data
        .to_f64s()
        .ok_or_else(|| {
            malformed(node, format!("'data' has unsupported type {}", data.data.type_name()))
        })?;
    let indices = read::indices(node, "indices")?;
    let indptr = read::indices(node, "indptr")?;

    if indices.len() != values.len() {
        return Err(malformed(
            node,
            format!("{} indices for {} values", indices.len(), values.len()),
        ));
    }
    if indptr.len() != ncol + 1 {
        return Err(malformed(
            node,
            format!("'indptr' should have length {}, got {}", ncol + 1, indptr.len()),
        ));
    }
    if indptr.first() != Some(&0) || indptr.last() != Some(&values.len()) {
        return Err(malformed(node, "'indptr' must start at 0 and end at the number of values"));
    }
    if indptr.windows(2).any(|w| w[0] > w[1]) {
        return Err(malformed(node, "'indptr' must be non-decreasing"));
    }
    if let Some(row) = indices.iter().find(|i| **i >= nrow) {
        return Err(malformed(
            node,
            format!("row index {} out of range for {} rows", row, nrow),
        ));
    }

    let matrix = SparseMatrix {
        nrow,
        ncol,
        values,
        indices,
        indptr,
    };
    let output = decoder.adopt(node, decoder.engine().sparse(matrix))?;
    attach_dimnames(decoder, node, output)
}

fn attach_dimnames<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
    matrix: Matrix<E>,
) -> Result<Matrix<E>, Error> {
    match read::dimnames(node, "dimnames")? {
        Some(names) if !names.is_empty() => {
            read::check_dimnames(node, "dimnames", &names, matrix.shape())?;
            decoder.adopt(node, decoder.engine().attach_dimnames(matrix.handle(), &names))
        }
        _ => Ok(matrix),
    }
}
