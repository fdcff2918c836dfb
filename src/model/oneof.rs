use crate::context::Name;
use crate::model::{Field, FieldKind};

/// A group of fields of which at most one is set at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oneof<'sc> {
    pub name: Name<'sc>,
    /// Position of the group among the message's declared oneofs.
    pub declared_index: usize,
    /// Indices into the owning message's fields.
    pub members: Vec<usize>,
}

impl<'sc> Oneof<'sc> {
    /// Name of the member tracking which field is currently set.
    pub fn selector(&self) -> String {
        format!("which_{}", self.name)
    }

    /// Whether switching to any member needs its storage constructed first. Enum members are
    /// plain values; every other kind owns an object.
    pub fn allocation_required(&self, fields: &[Field<'sc>]) -> bool {
        self.members
            .iter()
            .filter_map(|index| fields.get(*index))
            .any(|field| !matches!(field.kind, FieldKind::Enum(_)))
    }
}
