use std::borrow::Cow;

use miette::Diagnostic;
use smol_str::SmolStr;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("expected a 'delayed_type' attribute")]
    MissingTypeAttribute,
    #[error("expected a 'delayed_operation' attribute")]
    MissingOperationAttribute,
    #[error("expected a 'delayed_array' attribute")]
    MissingArrayAttribute,
    #[error("unknown value \"{0}\" for the 'delayed_type' attribute")]
    UnknownDelayedType(String),
    #[error("delayed operation \"{0}\" is currently not supported")]
    UnsupportedOperation(String),
    #[error("array type \"{0}\" is currently not supported")]
    UnsupportedArrayType(String),
    #[error("attribute '{0}' should be a scalar string")]
    InvalidAttribute(String),
    #[error("malformed '{field}': {reason}")]
    MalformedOperand {
        field: SmolStr,
        reason: Cow<'static, str>,
    },
    #[error("malformed array payload: {0}")]
    MalformedArray(Cow<'static, str>),
    #[error("maximum nesting depth of {0} exceeded")]
    MaxDepthExceeded(u32),
    #[error(transparent)]
    Engine(BoxedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid container: {0}")]
    InvalidContainer(Cow<'static, str>),
    #[error("group \"{0}\" not found")]
    GroupNotFound(String),
}

/// A failed decode, tagged with the path of the node that raised it.
#[derive(Debug, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct Error {
    /// Slash-separated location of the offending node.
    pub path: String,
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn malformed(
        path: impl Into<String>,
        field: impl Into<SmolStr>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(
            path,
            ErrorKind::MalformedOperand {
                field: field.into(),
                reason: reason.into(),
            },
        )
    }

    pub fn engine(
        path: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(path, ErrorKind::Engine(Box::new(err)))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match self.kind {
            ErrorKind::MissingTypeAttribute => "chihaya::missing_type_attribute",
            ErrorKind::MissingOperationAttribute => "chihaya::missing_operation_attribute",
            ErrorKind::MissingArrayAttribute => "chihaya::missing_array_attribute",
            ErrorKind::UnknownDelayedType(_) => "chihaya::unknown_delayed_type",
            ErrorKind::UnsupportedOperation(_) => "chihaya::unsupported_operation",
            ErrorKind::UnsupportedArrayType(_) => "chihaya::unsupported_array_type",
            ErrorKind::InvalidAttribute(_) => "chihaya::invalid_attribute",
            ErrorKind::MalformedOperand { .. } => "chihaya::malformed_operand",
            ErrorKind::MalformedArray(_) => "chihaya::malformed_array",
            ErrorKind::MaxDepthExceeded(_) => "chihaya::max_depth_exceeded",
            ErrorKind::Engine(_) => "chihaya::engine",
            ErrorKind::Io(_) => "chihaya::io",
            ErrorKind::Json(_) => "chihaya::json",
            ErrorKind::InvalidContainer(_) => "chihaya::invalid_container",
            ErrorKind::GroupNotFound(_) => "chihaya::group_not_found",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match &self.kind {
            ErrorKind::UnsupportedOperation(_) | ErrorKind::UnsupportedArrayType(_) => {
                Some(Box::new(
                    "register a handler with `Decoder::register_override` to load this node",
                ))
            }
            ErrorKind::MaxDepthExceeded(_) => {
                Some(Box::new("raise the limit with `Decoder::set_max_depth`"))
            }
            _ => None,
        }
    }
}
