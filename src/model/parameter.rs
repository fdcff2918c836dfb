use std::fmt;
use std::fmt::{Display, Formatter};

use crate::context::Name;

/// The type of a capacity parameter. Every bound is a count of bytes or elements.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub enum ParameterKind {
    Uint32,
}

impl Display for ParameterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Uint32 => write!(f, "uint32_t"),
        }
    }
}

/// The role a parameter plays for the field introducing it. The role suffix keeps a field's
/// own bounds apart from those it inherits.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub enum ParameterRole {
    /// Maximum number of bytes in a string or bytes field.
    Length,
    /// Maximum number of elements in a repeated field.
    RepeatLength,
}

impl ParameterRole {
    pub fn suffix(self) -> &'static str {
        match self {
            ParameterRole::Length => "LENGTH",
            ParameterRole::RepeatLength => "REP_LENGTH",
        }
    }
}

/// A compile-time bound a generated type needs before it can be instantiated.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct CapacityParameter<'sc> {
    pub name: Name<'sc>,
    pub kind: ParameterKind,
}

impl<'sc> CapacityParameter<'sc> {
    pub fn new(name: Name<'sc>) -> CapacityParameter<'sc> {
        CapacityParameter {
            name,
            kind: ParameterKind::Uint32,
        }
    }
}

impl Display for CapacityParameter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
