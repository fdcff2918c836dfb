//! The resolved schema: scope forest, type definitions, fields and oneofs, all stored in
//! index arenas owned by [`Model`]. Ownership runs strictly top-down; the upward links
//! (`parent`, `owner`, `oneof`) are plain indices.

use std::fmt;
use std::fmt::{Display, Formatter};

pub use definition::*;
pub use field::*;
pub use oneof::*;
pub use parameter::*;
pub use scope::*;

mod definition;
mod field;
mod oneof;
mod parameter;
mod scope;

/// Index of a type definition in [`Model`].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DefId(pub(crate) usize);

impl DefId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a scope in [`ScopeForest`].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct ScopeId(pub(crate) usize);

/// A field, addressed by its owning message and its position in that message's field list.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct FieldKey {
    pub def: DefId,
    pub index: usize,
}

impl Display for DefId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct Model<'sc> {
    pub(crate) scopes: ScopeForest<'sc>,
    pub(crate) definitions: Vec<TypeDefinition<'sc>>,
}

impl<'sc> Model<'sc> {
    pub fn new() -> Model<'sc> {
        Model::default()
    }

    pub fn scopes(&self) -> &ScopeForest<'sc> {
        &self.scopes
    }

    pub fn definition(&self, id: DefId) -> &TypeDefinition<'sc> {
        &self.definitions[id.0]
    }

    pub(crate) fn definition_mut(&mut self, id: DefId) -> &mut TypeDefinition<'sc> {
        &mut self.definitions[id.0]
    }

    pub fn definitions(&self) -> impl Iterator<Item = (DefId, &TypeDefinition<'sc>)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, def)| (DefId(index), def))
    }

    pub fn message(&self, id: DefId) -> Option<&MessageDefinition<'sc>> {
        self.definition(id).as_message()
    }

    pub(crate) fn message_mut(&mut self, id: DefId) -> Option<&mut MessageDefinition<'sc>> {
        match &mut self.definition_mut(id).kind {
            DefinitionKind::Message(msg) => Some(msg),
            DefinitionKind::Enum(_) => None,
        }
    }

    pub fn field(&self, key: FieldKey) -> Option<&Field<'sc>> {
        self.message(key.def).and_then(|msg| msg.fields.get(key.index))
    }

    /// Look a definition up by its dotted full name. Resolution goes through the
    /// `SymbolTable`; this is for callers inspecting a finished model.
    pub fn find(&self, full_name: &str) -> Option<DefId> {
        self.definitions()
            .find(|(_, def)| def.full_name == full_name)
            .map(|(id, _)| id)
    }

    /// `id` followed by every definition nested in it, breadth first.
    pub fn subtree(&self, id: DefId) -> Vec<DefId> {
        let mut result = vec![id];
        let mut cursor = 0;
        while cursor < result.len() {
            if let Some(msg) = self.message(result[cursor]) {
                result.extend(msg.nested.iter().copied());
            }
            cursor += 1;
        }
        result
    }

    pub(crate) fn push_definition(&mut self, definition: TypeDefinition<'sc>) -> DefId {
        let id = DefId(self.definitions.len());
        self.definitions.push(definition);
        id
    }
}
