use std::{fmt, rc::Rc};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{Decoder, Error, Matrix, engine::MatrixEngine, node::Node};

/// Which discriminator a registry entry is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Matched against `delayed_operation`.
    Operation,
    /// Matched against `delayed_array`.
    Array,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Operation => write!(f, "operation"),
            Kind::Array => write!(f, "array"),
        }
    }
}

/// Reconstructs a matrix from one serialized node.
///
/// Handlers that need their seeds decoded call back into
/// [`Decoder::decode`].
pub trait Handler<E: MatrixEngine> {
    fn load(&self, decoder: &Decoder<E>, node: &dyn Node) -> Result<Matrix<E>, Error>;
}

impl<E, F> Handler<E> for F
where
    E: MatrixEngine,
    F: Fn(&Decoder<E>, &dyn Node) -> Result<Matrix<E>, Error>,
{
    fn load(&self, decoder: &Decoder<E>, node: &dyn Node) -> Result<Matrix<E>, Error> {
        self(decoder, node)
    }
}

/// Caller-supplied handlers that take precedence over the built-in ones.
pub struct Registry<E: MatrixEngine> {
    operations: FxHashMap<SmolStr, Rc<dyn Handler<E>>>,
    arrays: FxHashMap<SmolStr, Rc<dyn Handler<E>>>,
}

impl<E: MatrixEngine> Default for Registry<E> {
    fn default() -> Self {
        Self {
            operations: FxHashMap::default(),
            arrays: FxHashMap::default(),
        }
    }
}

impl<E: MatrixEngine> Clone for Registry<E> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
            arrays: self.arrays.clone(),
        }
    }
}

impl<E: MatrixEngine> Registry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure for `name`, returning the handler it replaces.
    pub fn register<F>(&mut self, kind: Kind, name: &str, handler: F) -> Option<Rc<dyn Handler<E>>>
    where
        F: Fn(&Decoder<E>, &dyn Node) -> Result<Matrix<E>, Error> + 'static,
    {
        self.register_handler(kind, name, Rc::new(handler))
    }

    pub fn register_handler(
        &mut self,
        kind: Kind,
        name: &str,
        handler: Rc<dyn Handler<E>>,
    ) -> Option<Rc<dyn Handler<E>>> {
        self.table_mut(kind).insert(SmolStr::new(name), handler)
    }

    pub fn unregister(&mut self, kind: Kind, name: &str) -> Option<Rc<dyn Handler<E>>> {
        self.table_mut(kind).remove(name)
    }

    pub fn lookup(&self, kind: Kind, name: &str) -> Option<Rc<dyn Handler<E>>> {
        self.table(kind).get(name).cloned()
    }

    pub fn contains(&self, kind: Kind, name: &str) -> bool {
        self.table(kind).contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.arrays.is_empty()
    }

    fn table(&self, kind: Kind) -> &FxHashMap<SmolStr, Rc<dyn Handler<E>>> {
        match kind {
            Kind::Operation => &self.operations,
            Kind::Array => &self.arrays,
        }
    }

    fn table_mut(&mut self, kind: Kind) -> &mut FxHashMap<SmolStr, Rc<dyn Handler<E>>> {
        match kind {
            Kind::Operation => &mut self.operations,
            Kind::Array => &mut self.arrays,
        }
    }
}

impl<E: MatrixEngine> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("arrays", &self.arrays.keys().collect::<Vec<_>>())
            .finish()
    }
}
