use std::{fmt, rc::Rc};

use crate::engine::MatrixEngine;

/// Owning guard around one native matrix handle.
///
/// Dropping a `Matrix` releases its handle through the engine, so every exit
/// path of a reconstructor (including `?`) releases what it acquired.
/// [`Matrix::into_raw`] hands the handle out without releasing it.
pub struct Matrix<E: MatrixEngine> {
    engine: Rc<E>,
    handle: Option<E::Handle>,
}

impl<E: MatrixEngine> Matrix<E> {
    pub fn new(engine: Rc<E>, handle: E::Handle) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    pub fn handle(&self) -> &E::Handle {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("matrix handle accessed after release"),
        }
    }

    pub fn engine(&self) -> &Rc<E> {
        &self.engine
    }

    pub fn shape(&self) -> (usize, usize) {
        self.engine.shape(self.handle())
    }

    /// Transfers ownership of the handle to the caller, who must release it.
    pub fn into_raw(mut self) -> E::Handle {
        match self.handle.take() {
            Some(handle) => handle,
            None => unreachable!("matrix handle taken twice"),
        }
    }
}

impl<E: MatrixEngine> Drop for Matrix<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release(handle);
        }
    }
}

impl<E: MatrixEngine> fmt::Debug for Matrix<E>
where
    E::Handle: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix").field("handle", &self.handle).finish()
    }
}
