use std::{cell::Cell, path::Path, rc::Rc};

use scopeguard::defer;
use tracing::{debug, trace};

use crate::{
    engine::MatrixEngine,
    error::{Error, ErrorKind},
    leaf,
    matrix::Matrix,
    node::{self, Node},
    ops,
    registry::{Handler, Kind, Registry},
};

pub const TYPE_ATTRIBUTE: &str = "delayed_type";
pub const OPERATION_ATTRIBUTE: &str = "delayed_operation";
pub const ARRAY_ATTRIBUTE: &str = "delayed_array";

#[derive(Debug, Clone)]
pub struct Options {
    /// Deepest operation nesting accepted before decoding gives up.
    pub max_depth: u32,
    /// Treat any non-zero `along` in a combine as a column bind.
    pub lenient_along: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 256,
            lenient_along: false,
        }
    }
}

/// Built-in delayed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Subset,
    Combine,
    Transpose,
    UnaryArithmetic,
    UnaryMath,
    Dimnames,
}

impl Operation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "subset" => Some(Operation::Subset),
            "combine" => Some(Operation::Combine),
            "transpose" => Some(Operation::Transpose),
            "unary arithmetic" => Some(Operation::UnaryArithmetic),
            "unary math" => Some(Operation::UnaryMath),
            "dimnames" => Some(Operation::Dimnames),
            _ => None,
        }
    }
}

/// Built-in leaf array types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayType {
    Dense,
    Sparse,
}

impl ArrayType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dense array" => Some(ArrayType::Dense),
            "sparse matrix" => Some(ArrayType::Sparse),
            _ => None,
        }
    }
}

/// Walks a serialized delayed-array tree and rebuilds it through a [`MatrixEngine`].
pub struct Decoder<E: MatrixEngine> {
    engine: Rc<E>,
    registry: Registry<E>,
    options: Options,
    depth: Cell<u32>,
}

impl<E: MatrixEngine> Decoder<E> {
    pub fn new(engine: Rc<E>) -> Self {
        Self::with_options(engine, Options::default())
    }

    pub fn with_options(engine: Rc<E>, options: Options) -> Self {
        Self {
            engine,
            registry: Registry::new(),
            options,
            depth: Cell::new(0),
        }
    }

    pub fn engine(&self) -> &Rc<E> {
        &self.engine
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_max_depth(&mut self, max_depth: u32) {
        self.options.max_depth = max_depth;
    }

    pub fn set_lenient_along(&mut self, lenient_along: bool) {
        self.options.lenient_along = lenient_along;
    }

    pub fn registry(&self) -> &Registry<E> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<E> {
        &mut self.registry
    }

    /// Replaces (or adds) the handler for an operation or array type.
    ///
    /// Overrides are consulted before the built-in handlers and fully replace them.
    pub fn register_override<F>(&mut self, kind: Kind, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&Decoder<E>, &dyn Node) -> Result<Matrix<E>, Error> + 'static,
    {
        self.registry.register(kind, name, handler);
        self
    }

    /// Opens the container at `path` and decodes the group at `name`.
    pub fn decode_from_path(
        &self,
        path: impl AsRef<Path>,
        name: &str,
    ) -> Result<Matrix<E>, Error> {
        let path = path.as_ref();
        let container = node::json::open(path)?;
        let group = container.find(name).ok_or_else(|| {
            Error::new(
                path.display().to_string(),
                ErrorKind::GroupNotFound(name.to_string()),
            )
        })?;

        let root = if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/{}", name)
        };
        self.decode(&group.at(root))
    }

    /// Decodes `node` and everything beneath it.
    ///
    /// The returned matrix is owned by the caller. On failure every handle
    /// created along the way has already been released.
    pub fn decode(&self, node: &dyn Node) -> Result<Matrix<E>, Error> {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            return Err(Error::new(
                node.path(),
                ErrorKind::MaxDepthExceeded(self.options.max_depth),
            ));
        }

        self.depth.set(depth + 1);
        defer! {
            self.depth.set(depth);
        }

        let delayed_type =
            read_discriminator(node, TYPE_ATTRIBUTE, ErrorKind::MissingTypeAttribute)?;
        match delayed_type.as_str() {
            "operation" => {
                let name = read_discriminator(
                    node,
                    OPERATION_ATTRIBUTE,
                    ErrorKind::MissingOperationAttribute,
                )?;
                if let Some(handler) = self.registry.lookup(Kind::Operation, &name) {
                    debug!(path = node.path(), operation = %name, "decoding with override");
                    return handler.load(self, node);
                }

                debug!(path = node.path(), operation = %name, "decoding delayed operation");
                match Operation::from_name(&name) {
                    Some(Operation::Subset) => ops::subset::load(self, node),
                    Some(Operation::Combine) => ops::combine::load(self, node),
                    Some(Operation::Transpose) => ops::transpose::load(self, node),
                    Some(Operation::UnaryArithmetic) => ops::unary_arith::load(self, node),
                    Some(Operation::UnaryMath) => ops::unary_math::load(self, node),
                    Some(Operation::Dimnames) => ops::dimnames::load(self, node),
                    None => Err(Error::new(node.path(), ErrorKind::UnsupportedOperation(name))),
                }
            }
            "array" => {
                let name =
                    read_discriminator(node, ARRAY_ATTRIBUTE, ErrorKind::MissingArrayAttribute)?;
                if let Some(handler) = self.registry.lookup(Kind::Array, &name) {
                    debug!(path = node.path(), array = %name, "decoding with override");
                    return handler.load(self, node);
                }

                trace!(path = node.path(), array = %name, "decoding leaf array");
                match ArrayType::from_name(&name) {
                    Some(ArrayType::Dense) => leaf::load_dense(self, node),
                    Some(ArrayType::Sparse) => leaf::load_sparse(self, node),
                    None => Err(Error::new(node.path(), ErrorKind::UnsupportedArrayType(name))),
                }
            }
            _ => Err(Error::new(node.path(), ErrorKind::UnknownDelayedType(delayed_type))),
        }
    }

    /// Wraps an engine result into an owned [`Matrix`], tagging failures with `node`'s path.
    pub fn adopt(
        &self,
        node: &dyn Node,
        result: Result<E::Handle, E::Error>,
    ) -> Result<Matrix<E>, Error> {
        result
            .map(|handle| Matrix::new(Rc::clone(&self.engine), handle))
            .map_err(|e| Error::engine(node.path(), e))
    }

    /// Registers a trait-object handler; see [`Decoder::register_override`].
    pub fn register_handler(
        &mut self,
        kind: Kind,
        name: &str,
        handler: Rc<dyn Handler<E>>,
    ) -> &mut Self {
        self.registry.register_handler(kind, name, handler);
        self
    }
}

fn read_discriminator(node: &dyn Node, name: &str, missing: ErrorKind) -> Result<String, Error> {
    let value = node.attribute(name).ok_or_else(|| Error::new(node.path(), missing))?;
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| Error::new(node.path(), ErrorKind::InvalidAttribute(name.to_string())))
}

/// Opens `path` as a container and decodes the group at `name` with the built-in handlers.
pub fn decode_from_path<E: MatrixEngine>(
    path: impl AsRef<Path>,
    name: &str,
    engine: Rc<E>,
) -> Result<Matrix<E>, Error> {
    Decoder::new(engine).decode_from_path(path, name)
}
