use thiserror::Error;

use crate::ir::{TypeParseError, TypePath, TypeRef};
use crate::model::SourceLocation;

/// Why a unit could not be synthesized. Every variant names the class (and,
/// where there is one, the field) so the message points at the declaration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthError {
    #[error("{class}.{field}: cannot encode `{ty}`: {reason}")]
    UnresolvedPropertyType { class: TypePath, field: String, ty: String, reason: String },

    #[error("{class}.{field}: adapter `{adapter}` cannot handle `{ty}`: {reason}")]
    AdapterArityMismatch { class: TypePath, field: String, adapter: TypePath, ty: String, reason: String },

    #[error("{class}.{field}: `{container}` takes {expected} type argument(s), found {found}")]
    UnsupportedContainerArity { class: TypePath, field: String, container: TypePath, expected: usize, found: usize },

    #[error("{class}: `{routine}` is already declared by hand at {location}")]
    ManualImplementationConflict { class: TypePath, routine: String, location: SourceLocation },

    #[error("{class}: routine `{routine}` is also generated for `{other}`; set a distinct `routine_stem`")]
    DuplicateRoutine { class: TypePath, other: TypePath, routine: String },

    #[error("{class}.{field}: interface `{interface}` lists `{implementer}`, which is not a data class of this unit")]
    MissingClass { class: TypePath, field: String, interface: TypePath, implementer: TypePath },

    #[error("{context}: `{ident}` is not a usable Rust identifier or path")]
    InvalidIdentifier { context: String, ident: String },

    #[error(transparent)]
    InvalidType(#[from] TypeParseError),
}

/// A failure found while resolving one field, before the field is known.
#[derive(Debug)]
pub(crate) enum Failure {
    Unresolved { ty: TypeRef, reason: String },
    AdapterArity { adapter: TypePath, ty: TypeRef, reason: String },
    ContainerArity { container: TypePath, expected: usize, found: usize },
    MissingClass { interface: TypePath, implementer: TypePath },
    /// Raised inside another class reached through this field; already located.
    Nested(Box<SynthError>),
}

impl Failure {
    pub(crate) fn unresolved(ty: &TypeRef, reason: impl Into<String>) -> Self {
        Failure::Unresolved { ty: ty.clone(), reason: reason.into() }
    }

    pub(crate) fn at(self, class: &TypePath, field: &str) -> SynthError {
        let class = class.clone();
        let field = field.to_string();
        match self {
            Failure::Unresolved { ty, reason } => {
                SynthError::UnresolvedPropertyType { class, field, ty: ty.to_string(), reason }
            }
            Failure::AdapterArity { adapter, ty, reason } => {
                SynthError::AdapterArityMismatch { class, field, adapter, ty: ty.to_string(), reason }
            }
            Failure::ContainerArity { container, expected, found } => {
                SynthError::UnsupportedContainerArity { class, field, container, expected, found }
            }
            Failure::MissingClass { interface, implementer } => {
                SynthError::MissingClass { class, field, interface, implementer }
            }
            Failure::Nested(err) => *err,
        }
    }
}

impl From<SynthError> for Failure {
    fn from(err: SynthError) -> Self { Failure::Nested(Box::new(err)) }
}
