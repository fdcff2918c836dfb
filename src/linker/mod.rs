//! Turns a request into a resolved [`Model`]: file selection, ingestion, symbol table,
//! field matching, dependency ordering, parameter registration and reference checks, in
//! that order. Any failure aborts the run.

use crate::config::GeneratorConfig;
use crate::context::SchemaContext;
use crate::descriptor::{FileDescriptor, GeneratorRequest, Syntax};
use crate::error::{GeneratorError, RecursiveFieldWarning};
use crate::model::{FieldKey, Model};
use crate::symbol_table::SymbolTable;

pub use unit::SchemaUnit;

mod order;
mod registration;
mod unit;

/// A fully resolved run, ready to be emitted.
#[derive(Debug)]
pub struct Resolution<'sc> {
    pub model: Model<'sc>,
    /// Selected files, in emission order.
    pub units: Vec<SchemaUnit<'sc>>,
    pub symbols: SymbolTable<'sc>,
    pub warnings: Vec<RecursiveFieldWarning>,
}

pub fn resolve<'sc>(
    cx: &SchemaContext<'sc>,
    request: &GeneratorRequest,
    config: &GeneratorConfig,
) -> Result<Resolution<'sc>, GeneratorError> {
    let selected = select_files(request, config);
    for file in &selected {
        if file.syntax != Syntax::Proto3 {
            return Err(GeneratorError::UnsupportedDialect {
                file: file.name.clone(),
                syntax: file.syntax,
            });
        }
    }

    let mut model = Model::new();
    let mut warnings = Vec::new();
    let mut units: Vec<SchemaUnit<'sc>> = selected
        .iter()
        .enumerate()
        .map(|(index, file)| SchemaUnit::build(cx, &mut model, file, index, config, &mut warnings))
        .collect();

    let unit_names: Vec<&str> = units.iter().map(|unit| unit.name.as_str()).collect();
    let symbols = SymbolTable::build(&model, &unit_names)?;

    match_fields(&mut model, &symbols, &units)?;
    for unit in units.iter_mut() {
        order::sort_unit(&mut model, unit)?;
    }
    registration::register_all(cx, &mut model, &units, config.resolution_passes())?;
    registration::qualify_references(&mut model, &units)?;

    Ok(Resolution {
        model,
        units,
        symbols,
        warnings,
    })
}

/// Every file except the options file. The base file only goes in when a user file imports
/// it directly, and then goes first.
pub fn select_files<'r>(
    request: &'r GeneratorRequest,
    config: &GeneratorConfig,
) -> Vec<&'r FileDescriptor> {
    let mut selected: Vec<&FileDescriptor> = request
        .files
        .iter()
        .filter(|file| !config.is_options_file(&file.name) && !config.is_base_file(&file.name))
        .collect();

    let base_imported = selected.iter().any(|file| {
        file.dependencies
            .iter()
            .any(|dependency| config.is_base_file(dependency))
    });
    if base_imported {
        if let Some(base) = request.files.iter().find(|file| config.is_base_file(&file.name)) {
            selected.insert(0, base);
        }
    }
    selected
}

/// Link every enum and message reference to its definition.
fn match_fields<'sc>(
    model: &mut Model<'sc>,
    symbols: &SymbolTable<'sc>,
    units: &[SchemaUnit<'sc>],
) -> Result<(), GeneratorError> {
    let mut links = Vec::new();
    for (id, def) in model.definitions() {
        let msg = match def.as_message() {
            Some(msg) => msg,
            None => continue,
        };
        for (index, field) in msg.fields.iter().enumerate() {
            match field.match_against(symbols, model) {
                Ok(Some(target)) => links.push((FieldKey { def: id, index }, target)),
                Ok(None) => {}
                Err(expected) => {
                    return Err(GeneratorError::UnresolvedType {
                        file: units
                            .get(def.unit)
                            .map(|unit| unit.name.clone())
                            .unwrap_or_default(),
                        message: def.full_name.to_owned(),
                        field: field.qualified_name(),
                        expected,
                        type_name: field
                            .type_ref()
                            .map(|type_ref| type_ref.declared)
                            .unwrap_or_default()
                            .to_owned(),
                    })
                }
            }
        }
    }

    for (key, target) in links {
        let type_ref = model
            .message_mut(key.def)
            .and_then(|msg| msg.fields.get_mut(key.index))
            .and_then(|field| field.kind.type_ref_mut());
        if let Some(type_ref) = type_ref {
            type_ref.target = Some(target);
        }
    }
    Ok(())
}
