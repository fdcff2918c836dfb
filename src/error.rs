use std::fmt;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use thiserror::Error as ThisError;

use crate::descriptor::Syntax;

/// Fatal errors. Any of these aborts the whole run and no artifacts are produced.
#[derive(Debug, ThisError)]
pub enum GeneratorError {
    #[error("{file}: sorry, {syntax} is not supported, please use proto3")]
    UnsupportedDialect { file: String, syntax: Syntax },

    #[error("{file}: unable to find the definition of {expected} '{type_name}' used by field '{message}.{field}'")]
    UnresolvedType {
        file: String,
        message: String,
        field: String,
        expected: &'static str,
        type_name: String,
    },

    #[error("{}: circular dependency between the message definitions {}; capacity parameters can not be inferred for such a cycle, please remove it", .file, .cycle.iter().join(" -> "))]
    CircularDependency { file: String, cycle: Vec<String> },

    #[error("capacity parameters were still unresolved after {passes} passes for {}", .pending.iter().join(", "))]
    ParameterResolutionTimeout {
        passes: usize,
        pending: Vec<PendingRegistration>,
    },

    #[error("{file}: field '{message}.{field}' uses type '{target}' from another scope, but the enclosing scope '{scope}' has capacity parameters of its own; declare the type at top level or in the scope using it")]
    UnqualifiableReference {
        file: String,
        message: String,
        field: String,
        target: String,
        scope: String,
    },

    #[error("type '{name}' is defined in both '{first_file}' and '{second_file}'")]
    DuplicateDefinition {
        name: String,
        first_file: String,
        second_file: String,
    },

    #[error("message '{message}': fields '{first_field}' and '{second_field}' both introduce the capacity parameter '{parameter}'; rename one of them")]
    DuplicateParameter {
        message: String,
        parameter: String,
        first_field: String,
        second_field: String,
    },

    #[error("invalid json input: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("rendering '{artifact}' failed: {source}")]
    Render {
        artifact: String,
        #[source]
        source: RenderError,
    },
}

/// Failure reported by a `Render` implementation.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{reason}")]
pub struct RenderError {
    pub reason: String,
}

impl RenderError {
    pub fn new(reason: impl Into<String>) -> RenderError {
        RenderError {
            reason: reason.into(),
        }
    }
}

/// A message that could not finish registering, and the field holding it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    pub message: String,
    pub field: String,
    pub waiting_on: String,
}

impl Display for PendingRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} (waiting on {})",
            self.message, self.field, self.waiting_on
        )
    }
}

/// A field whose type is the message it is declared in. It is replaced by a disabled stub
/// and the run carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveFieldWarning {
    pub file: String,
    pub message: String,
    pub field: String,
}

impl Display for RecursiveFieldWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: field '{}.{}' includes its own message recursively; capacity parameters can not be determined for it so it is left out",
            self.file, self.message, self.field
        )
    }
}
