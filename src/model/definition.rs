use std::fmt;
use std::fmt::{Display, Formatter};

use crate::context::Name;
use crate::model::{DefId, Field, Oneof, ScopeId};

/// A declared enum or message. Identity is the dotted full name; the rest is bookkeeping
/// filled in as the linker runs.
#[derive(Debug)]
pub struct TypeDefinition<'sc> {
    pub name: Name<'sc>,
    /// Dotted path including the package, eg `geo.Polygon.Ring`.
    pub full_name: Name<'sc>,
    pub scope: ScopeId,
    /// The message this definition is nested in, if any.
    pub parent: Option<DefId>,
    /// Index of the schema unit (input file) declaring it.
    pub unit: usize,
    /// Position in the file's emission order; set by dependency sorting.
    pub emission_index: usize,
    pub kind: DefinitionKind<'sc>,
}

#[derive(Debug)]
pub enum DefinitionKind<'sc> {
    Enum(EnumDefinition<'sc>),
    Message(MessageDefinition<'sc>),
}

#[derive(Debug, Default)]
pub struct EnumDefinition<'sc> {
    pub values: Vec<EnumValue<'sc>>,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct EnumValue<'sc> {
    pub name: Name<'sc>,
    pub number: i32,
}

#[derive(Debug, Default)]
pub struct MessageDefinition<'sc> {
    /// Nested enums and messages. Declaration order until sorted, emission order after.
    pub nested: Vec<DefId>,
    /// Plain fields first, then the members of each emitted oneof.
    pub fields: Vec<Field<'sc>>,
    pub oneofs: Vec<Oneof<'sc>>,
    /// `(number, NAME)` for every field, sorted by number.
    pub field_numbers: Vec<(u32, String)>,
    /// Every nested message and field has finished registering its parameters.
    pub parameters_resolved: bool,
    /// At least one field registered parameters with this message's scope.
    pub has_parameters: bool,
}

impl<'sc> MessageDefinition<'sc> {
    /// Fields with explicit presence (`optional` in proto3).
    pub fn optional_fields(&self) -> impl Iterator<Item = &Field<'sc>> {
        self.fields.iter().filter(|field| field.optional)
    }

    /// Fields not part of any emitted oneof.
    pub fn plain_fields(&self) -> impl Iterator<Item = &Field<'sc>> {
        self.fields.iter().filter(|field| field.oneof.is_none())
    }

    /// Members of the `oneof`-th emitted oneof, or `None` if there is no such oneof.
    pub fn oneof_members(&self, oneof: usize) -> Option<impl Iterator<Item = &Field<'sc>>> {
        let oneof = self.oneofs.get(oneof)?;
        Some(
            oneof
                .members
                .iter()
                .filter_map(move |index| self.fields.get(*index)),
        )
    }
}

impl<'sc> TypeDefinition<'sc> {
    pub fn is_message(&self) -> bool {
        matches!(self.kind, DefinitionKind::Message(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, DefinitionKind::Enum(_))
    }

    pub fn as_message(&self) -> Option<&MessageDefinition<'sc>> {
        match &self.kind {
            DefinitionKind::Message(msg) => Some(msg),
            DefinitionKind::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDefinition<'sc>> {
        match &self.kind {
            DefinitionKind::Enum(def) => Some(def),
            DefinitionKind::Message(_) => None,
        }
    }

    /// Whether this definition's own parameter set is final. Enums never have any.
    pub fn parameters_resolved(&self) -> bool {
        match &self.kind {
            DefinitionKind::Enum(_) => true,
            DefinitionKind::Message(msg) => msg.parameters_resolved,
        }
    }

    pub fn has_parameters(&self) -> bool {
        match &self.kind {
            DefinitionKind::Enum(_) => false,
            DefinitionKind::Message(msg) => msg.has_parameters,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            DefinitionKind::Enum(_) => "enum",
            DefinitionKind::Message(_) => "message",
        }
    }
}

impl Display for TypeDefinition<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind_name(), self.full_name)
    }
}
