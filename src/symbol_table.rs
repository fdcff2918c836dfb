use std::collections::HashMap;

use crate::context::Name;
use crate::error::GeneratorError;
use crate::model::{DefId, Model};

/// Every enum and message visible to field matching, keyed by dotted full name without the
/// leading dot.
///
/// The table is built once from all selected files before any field is matched and is
/// read-only afterwards; it is passed to whoever needs it rather than held globally.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable<'sc> {
    bindings: HashMap<Name<'sc>, DefId>,
}

impl<'sc> SymbolTable<'sc> {
    pub fn new() -> SymbolTable<'sc> {
        SymbolTable {
            bindings: HashMap::new(),
        }
    }

    /// Bind every definition in `model`. `unit_names` maps a definition's unit index to its
    /// file name, used when the same full name turns up twice.
    pub fn build(
        model: &Model<'sc>,
        unit_names: &[&str],
    ) -> Result<SymbolTable<'sc>, GeneratorError> {
        let mut table = SymbolTable::new();
        for (id, def) in model.definitions() {
            if let Some(previous) = table.bind(def.full_name, id) {
                let file_of = |id: DefId| {
                    unit_names
                        .get(model.definition(id).unit)
                        .copied()
                        .unwrap_or_default()
                        .to_owned()
                };
                return Err(GeneratorError::DuplicateDefinition {
                    name: def.full_name.to_owned(),
                    first_file: file_of(previous),
                    second_file: file_of(id),
                });
            }
        }
        log::debug!("symbol table holds {} definitions", table.len());
        Ok(table)
    }

    pub fn lookup(&self, full_name: &str) -> Option<DefId> {
        self.bindings.get(full_name).copied()
    }

    /// Bind `full_name`, handing back whatever it was bound to before.
    pub fn bind(&mut self, full_name: Name<'sc>, id: DefId) -> Option<DefId> {
        self.bindings.insert(full_name, id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
