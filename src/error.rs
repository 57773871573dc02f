use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::cast::{Target, repr};
use crate::value::{Kind, Value};

/// Result of a conversion.
pub type Result<T, E = CastError> = std::result::Result<T, E>;

/// Why a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No rule converts the input kind to the target type
    Unconvertible,
    /// The value does not fit the target's representable range
    Overflow,
    /// Text was rejected by the target's grammar
    InvalidSyntax,
    /// Nesting exceeded the configured depth limit
    TooDeep,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Unconvertible => write!(f, "unconvertible"),
            ErrorKind::Overflow => write!(f, "overflow"),
            ErrorKind::InvalidSyntax => write!(f, "invalid syntax"),
            ErrorKind::TooDeep => write!(f, "too deep"),
        }
    }
}

/// Position inside a container where an element failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Index(usize),
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Key(k) => write!(f, "[{k:?}]"),
        }
    }
}

/// A failed conversion
///
/// Carries the offending value's text and kind, the requested target, the
/// container path to the failing element (outermost first) and, when the
/// underlying operation failed, its cause through [`StdError::source`].
#[derive(Debug, Clone)]
pub struct CastError {
    kind: ErrorKind,
    value: String,
    from: Kind,
    target: Target,
    path: Vec<Segment>,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl CastError {
    pub(crate) fn new(kind: ErrorKind, value: &Value, target: Target) -> Self {
        CastError {
            kind,
            value: repr(value),
            from: value.kind(),
            target,
            path: Vec::new(),
            source: None,
        }
    }

    pub(crate) fn unconvertible(value: &Value, target: Target) -> Self {
        Self::new(ErrorKind::Unconvertible, value, target)
    }

    pub(crate) fn overflow(value: &Value, target: Target) -> Self {
        Self::new(ErrorKind::Overflow, value, target)
    }

    pub(crate) fn invalid_syntax(value: &Value, target: Target) -> Self {
        Self::new(ErrorKind::InvalidSyntax, value, target)
    }

    pub(crate) fn too_deep(value: &Value, target: Target) -> Self {
        Self::new(ErrorKind::TooDeep, value, target)
    }

    pub(crate) fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Prefixes the path with the container position the error came from.
    pub(crate) fn at(mut self, segment: Segment) -> Self {
        self.path.insert(0, segment);
        self
    }

    /// Reports the error against another target, keeping kind and cause.
    pub(crate) fn retarget(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Textual representation of the value that failed
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Dynamic kind of the value that failed
    pub fn value_kind(&self) -> Kind {
        self.from
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Container positions leading to the failing element, outermost first
    pub fn path(&self) -> &[Segment] {
        &self.path
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unable to cast {:?} of kind {} to {}",
            self.value, self.from, self.target
        )?;
        if !self.path.is_empty() {
            f.write_str(" at ")?;
            for segment in &self.path {
                write!(f, "{segment}")?;
            }
        }
        match &self.source {
            Some(source) => write!(f, ": {source}"),
            None => Ok(()),
        }
    }
}

impl StdError for CastError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

/// Errors of the encoding helpers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cast(#[from] CastError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
