use http::StatusCode;
use std::fmt;

/// Error types for http-param-bind
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter schema could not be compiled into a validator
    #[error("Invalid validation schema for parameter '{name}': {reason}")]
    Schema { name: String, reason: String },

    /// One or more parameters failed to bind
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// Result type alias for http-param-bind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a parameter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The destination does not match the parameter set. A programming error.
    Internal,
    /// The raw value could not be turned into the declared type, or is missing.
    Conversion,
    /// The converted value failed its schema.
    Validation,
}

/// A single violated schema constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer into the converted value, empty for the root
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Failure of one parameter, always scoped to the parameter's name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("parameter name '{name}' is an unknown field")]
    UnknownField { name: String },

    #[error("{name} in {location} could not be assigned: {reason}")]
    Assign {
        name: String,
        location: &'static str,
        reason: String,
    },

    #[error("{name} in {location} is required")]
    Required { name: String, location: &'static str },

    #[error("{name} in {location} must be of type {expected}: {value:?}")]
    InvalidType {
        name: String,
        location: &'static str,
        expected: String,
        value: String,
    },

    #[error("{name} in {location} must be of format {format}: {reason}")]
    InvalidFormat {
        name: String,
        location: &'static str,
        format: String,
        reason: String,
    },

    #[error("{name} in {location} could not be decoded: {reason}")]
    Decode {
        name: String,
        location: &'static str,
        reason: String,
    },

    #[error("{name} in {location} failed validation: {}", join_violations(.violations))]
    Validation {
        name: String,
        location: &'static str,
        violations: Vec<Violation>,
    },
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ParamError {
    /// Name of the parameter this error is scoped to.
    pub fn name(&self) -> &str {
        match self {
            ParamError::UnknownField { name }
            | ParamError::Assign { name, .. }
            | ParamError::Required { name, .. }
            | ParamError::InvalidType { name, .. }
            | ParamError::InvalidFormat { name, .. }
            | ParamError::Decode { name, .. }
            | ParamError::Validation { name, .. } => name.as_str(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParamError::UnknownField { .. } | ParamError::Assign { .. } => ErrorKind::Internal,
            ParamError::Validation { .. } => ErrorKind::Validation,
            _ => ErrorKind::Conversion,
        }
    }

    /// HTTP status a server would answer with for this failure alone.
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Conversion => StatusCode::BAD_REQUEST,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Schema violations carried by a validation failure, empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ParamError::Validation { violations, .. } => violations.as_slice(),
            _ => &[],
        }
    }
}

/// All parameter failures of one bind, in processing order.
///
/// This is the only error [`RequestBinder::bind`](crate::RequestBinder::bind)
/// returns. Every entry keeps the name of the parameter it belongs to, so a
/// server can report field-level diagnostics in a single response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeError {
    errors: Vec<ParamError>,
}

impl CompositeError {
    pub fn new(errors: Vec<ParamError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ParamError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParamError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors scoped to the given parameter name.
    pub fn for_parameter<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ParamError> {
        self.errors.iter().filter(move |e| e.name() == name)
    }

    /// 500 if any failure is internal, 422 otherwise.
    pub fn status(&self) -> StatusCode {
        if self.errors.iter().any(|e| e.kind() == ErrorKind::Internal) {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.errors))
    }
}

impl std::error::Error for CompositeError {}

impl IntoIterator for CompositeError {
    type Item = ParamError;
    type IntoIter = std::vec::IntoIter<ParamError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Renders a list of parameter errors as one message.
pub fn render(errors: &[ParamError]) -> String {
    let mut out = String::from("validation failure list:");
    for error in errors {
        out.push('\n');
        out.push_str(&error.to_string());
    }
    out
}
