//! A reference [`MatrixEngine`] backed by column-major `f64` storage.
//!
//! Every handle lives in a table until it is released, so the number of live
//! handles can be inspected at any time. Lazy evaluation is not attempted:
//! each operation materializes its result.
use std::cell::{Cell, RefCell};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::error;

use crate::engine::{
    Arithmetic, Axis, DenseMatrix, Dimnames, Math, MatrixEngine, Operand, Side, SparseMatrix,
};

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DenseHandle(u32);

impl DenseHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum DenseError {
    #[error("expected {expected} values for a {nrow}x{ncol} matrix, got {got}")]
    ShapeMismatch {
        nrow: usize,
        ncol: usize,
        expected: usize,
        got: usize,
    },
    #[error("invalid sparse matrix: {0}")]
    InvalidSparse(String),
    #[error("cannot bind matrices with {0} mismatched extents")]
    BindMismatch(&'static str),
    #[error("cannot bind an empty list of matrices")]
    EmptyBind,
    #[error("index {index} out of bounds for extent {extent}")]
    IndexOutOfBounds { index: usize, extent: usize },
    #[error("operand of length {got} does not match extent {expected}")]
    OperandLength { expected: usize, got: usize },
    #[error("{axis} names of length {got} do not match extent {expected}")]
    NamesLength {
        axis: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unknown handle {0}")]
    UnknownHandle(u32),
    #[error("a {nrow}x{ncol} matrix is too large to materialize")]
    TooLarge { nrow: usize, ncol: usize },
}

#[derive(Debug, Clone)]
struct Stored {
    matrix: DenseMatrix,
    dimnames: Dimnames,
}

#[derive(Debug, Default)]
pub struct DenseEngine {
    store: RefCell<FxHashMap<u32, Stored>>,
    next_id: Cell<u32>,
    created: Cell<usize>,
    released: Cell<usize>,
}

impl DenseEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet released.
    pub fn live_handles(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    pub fn to_dense(&self, handle: &DenseHandle) -> Option<DenseMatrix> {
        self.store.borrow().get(&handle.0).map(|s| s.matrix.clone())
    }

    pub fn dimnames(&self, handle: &DenseHandle) -> Option<Dimnames> {
        self.store.borrow().get(&handle.0).map(|s| s.dimnames.clone())
    }

    fn insert(&self, matrix: DenseMatrix, dimnames: Dimnames) -> DenseHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.created.set(self.created.get() + 1);
        self.store.borrow_mut().insert(id, Stored { matrix, dimnames });
        DenseHandle(id)
    }

    fn get(&self, handle: &DenseHandle) -> Result<Stored, DenseError> {
        self.store
            .borrow()
            .get(&handle.0)
            .cloned()
            .ok_or(DenseError::UnknownHandle(handle.0))
    }

    fn gather(&self, seeds: &[&DenseHandle]) -> Result<Vec<Stored>, DenseError> {
        if seeds.is_empty() {
            return Err(DenseError::EmptyBind);
        }
        seeds.iter().map(|h| self.get(h)).collect()
    }
}

/// Allocates a zeroed column-major buffer for an `nrow x ncol` matrix.
fn zeroed(nrow: usize, ncol: usize) -> Result<Vec<f64>, DenseError> {
    let len = nrow
        .checked_mul(ncol)
        .ok_or(DenseError::TooLarge { nrow, ncol })?;
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|_| DenseError::TooLarge { nrow, ncol })?;
    values.resize(len, 0.0);
    Ok(values)
}

/// Concatenates names only when every part carries them.
fn concat_names<'a>(parts: impl Iterator<Item = &'a Option<Vec<String>>>) -> Option<Vec<String>> {
    parts
        .map(|p| p.as_ref())
        .collect::<Option<Vec<_>>>()
        .map(|p| p.into_iter().flatten().cloned().collect())
}

impl MatrixEngine for DenseEngine {
    type Handle = DenseHandle;
    type Error = DenseError;

    fn dense(&self, matrix: DenseMatrix) -> Result<DenseHandle, DenseError> {
        let expected = matrix.nrow.checked_mul(matrix.ncol).ok_or(DenseError::TooLarge {
            nrow: matrix.nrow,
            ncol: matrix.ncol,
        })?;
        if matrix.values.len() != expected {
            return Err(DenseError::ShapeMismatch {
                nrow: matrix.nrow,
                ncol: matrix.ncol,
                expected,
                got: matrix.values.len(),
            });
        }
        Ok(self.insert(matrix, Dimnames::default()))
    }

    fn sparse(&self, matrix: SparseMatrix) -> Result<DenseHandle, DenseError> {
        if matrix.indptr.len().checked_sub(1) != Some(matrix.ncol) {
            return Err(DenseError::InvalidSparse(format!(
                "indptr has length {} for {} columns",
                matrix.indptr.len(),
                matrix.ncol
            )));
        }

        let mut values = zeroed(matrix.nrow, matrix.ncol)?;
        for col in 0..matrix.ncol {
            let (start, end) = (matrix.indptr[col], matrix.indptr[col + 1]);
            if start > end || end > matrix.values.len() || end > matrix.indices.len() {
                return Err(DenseError::InvalidSparse(format!("bad pointers for column {}", col)));
            }
            for i in start..end {
                let row = matrix.indices[i];
                if row >= matrix.nrow {
                    return Err(DenseError::IndexOutOfBounds {
                        index: row,
                        extent: matrix.nrow,
                    });
                }
                values[col * matrix.nrow + row] = matrix.values[i];
            }
        }

        Ok(self.insert(
            DenseMatrix::new(matrix.nrow, matrix.ncol, values),
            Dimnames::default(),
        ))
    }

    fn shape(&self, handle: &DenseHandle) -> (usize, usize) {
        self.store
            .borrow()
            .get(&handle.0)
            .map(|s| (s.matrix.nrow, s.matrix.ncol))
            .unwrap_or_default()
    }

    fn row_bind(&self, seeds: &[&DenseHandle]) -> Result<DenseHandle, DenseError> {
        let parts = self.gather(seeds)?;
        let ncol = parts[0].matrix.ncol;
        if parts.iter().any(|p| p.matrix.ncol != ncol) {
            return Err(DenseError::BindMismatch("column"));
        }

        let nrow = parts.iter().map(|p| p.matrix.nrow).sum();
        let mut values = Vec::with_capacity(nrow * ncol);
        for col in 0..ncol {
            for part in &parts {
                values.extend((0..part.matrix.nrow).map(|row| part.matrix.get(row, col)));
            }
        }

        let dimnames = Dimnames {
            rows: concat_names(parts.iter().map(|p| &p.dimnames.rows)),
            cols: parts.iter().find_map(|p| p.dimnames.cols.clone()),
        };
        Ok(self.insert(DenseMatrix::new(nrow, ncol, values), dimnames))
    }

    fn col_bind(&self, seeds: &[&DenseHandle]) -> Result<DenseHandle, DenseError> {
        let parts = self.gather(seeds)?;
        let nrow = parts[0].matrix.nrow;
        if parts.iter().any(|p| p.matrix.nrow != nrow) {
            return Err(DenseError::BindMismatch("row"));
        }

        let ncol = parts.iter().map(|p| p.matrix.ncol).sum();
        let values = parts.iter().flat_map(|p| p.matrix.values.iter().copied()).collect();

        let dimnames = Dimnames {
            rows: parts.iter().find_map(|p| p.dimnames.rows.clone()),
            cols: concat_names(parts.iter().map(|p| &p.dimnames.cols)),
        };
        Ok(self.insert(DenseMatrix::new(nrow, ncol, values), dimnames))
    }

    fn transpose(&self, seed: &DenseHandle) -> Result<DenseHandle, DenseError> {
        let Stored { matrix, dimnames } = self.get(seed)?;
        let mut values = Vec::with_capacity(matrix.values.len());
        for row in 0..matrix.nrow {
            values.extend((0..matrix.ncol).map(|col| matrix.get(row, col)));
        }

        Ok(self.insert(
            DenseMatrix::new(matrix.ncol, matrix.nrow, values),
            Dimnames {
                rows: dimnames.cols,
                cols: dimnames.rows,
            },
        ))
    }

    fn subset(
        &self,
        seed: &DenseHandle,
        axis: Axis,
        indices: &[usize],
    ) -> Result<DenseHandle, DenseError> {
        let Stored { matrix, mut dimnames } = self.get(seed)?;
        let extent = axis.extent((matrix.nrow, matrix.ncol));
        if let Some(&index) = indices.iter().find(|i| **i >= extent) {
            return Err(DenseError::IndexOutOfBounds { index, extent });
        }

        let pick = |names: Option<Vec<String>>| {
            names.map(|n| indices.iter().map(|i| n[*i].clone()).collect::<Vec<_>>())
        };

        let subsetted = match axis {
            Axis::Row => {
                let values = (0..matrix.ncol)
                    .flat_map(|col| indices.iter().map(move |row| (*row, col)))
                    .map(|(row, col)| matrix.get(row, col))
                    .collect();
                dimnames.rows = pick(dimnames.rows);
                DenseMatrix::new(indices.len(), matrix.ncol, values)
            }
            Axis::Column => {
                let values = indices
                    .iter()
                    .flat_map(|col| (0..matrix.nrow).map(move |row| (row, *col)))
                    .map(|(row, col)| matrix.get(row, col))
                    .collect();
                dimnames.cols = pick(dimnames.cols);
                DenseMatrix::new(matrix.nrow, indices.len(), values)
            }
        };

        Ok(self.insert(subsetted, dimnames))
    }

    fn unary_arith(&self, seed: &DenseHandle, op: &Arithmetic) -> Result<DenseHandle, DenseError> {
        let Stored { mut matrix, dimnames } = self.get(seed)?;

        match op {
            Arithmetic::Unary(op) => {
                for v in matrix.values.iter_mut() {
                    *v = op.apply(0.0, *v);
                }
            }
            Arithmetic::Binary { op, side, operand } => {
                let nrow = matrix.nrow;
                if let Operand::Vector { along, values } = operand {
                    let expected = along.extent((matrix.nrow, matrix.ncol));
                    if values.len() != expected {
                        return Err(DenseError::OperandLength {
                            expected,
                            got: values.len(),
                        });
                    }
                }

                for (i, v) in matrix.values.iter_mut().enumerate() {
                    let other = match operand {
                        Operand::Scalar(s) => *s,
                        Operand::Vector {
                            along: Axis::Row,
                            values,
                        } => values[i % nrow],
                        Operand::Vector {
                            along: Axis::Column,
                            values,
                        } => values[i / nrow],
                    };
                    *v = match side {
                        Side::Left => op.apply(other, *v),
                        Side::Right => op.apply(*v, other),
                    };
                }
            }
        }

        Ok(self.insert(matrix, dimnames))
    }

    fn unary_math(&self, seed: &DenseHandle, op: Math) -> Result<DenseHandle, DenseError> {
        let Stored { mut matrix, dimnames } = self.get(seed)?;
        for v in matrix.values.iter_mut() {
            *v = op.apply(*v);
        }
        Ok(self.insert(matrix, dimnames))
    }

    fn attach_dimnames(
        &self,
        seed: &DenseHandle,
        names: &Dimnames,
    ) -> Result<DenseHandle, DenseError> {
        let Stored { matrix, .. } = self.get(seed)?;
        let checks = [
            ("row", &names.rows, matrix.nrow),
            ("column", &names.cols, matrix.ncol),
        ];
        for (axis, names, expected) in checks {
            if let Some(names) = names
                && names.len() != expected
            {
                return Err(DenseError::NamesLength {
                    axis,
                    expected,
                    got: names.len(),
                });
            }
        }

        Ok(self.insert(matrix, names.clone()))
    }

    fn release(&self, handle: DenseHandle) {
        if self.store.borrow_mut().remove(&handle.0).is_some() {
            self.released.set(self.released.get() + 1);
        } else {
            error!(handle = handle.0, "released a handle that is not live");
        }
    }
}
