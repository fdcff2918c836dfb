use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::context::SchemaContext;
use crate::error::{GeneratorError, PendingRegistration};
use crate::linker::SchemaUnit;
use crate::model::{CapacityParameter, DefId, FieldKey, Model};

/// Outcome of trying to register a field or a whole message.
#[derive(Debug, Eq, PartialEq, Clone)]
pub(crate) enum Registration {
    Registered,
    /// Fields still waiting, with the message each one is waiting on.
    Pending(Vec<(FieldKey, DefId)>),
}

impl Registration {
    /// Combine two outcomes; pending fields from both sides are kept.
    pub(crate) fn and(self, next: Registration) -> Registration {
        use Registration::*;
        match (self, next) {
            (Registered, other) | (other, Registered) => other,
            (Pending(mut waiting), Pending(more)) => {
                waiting.extend(more);
                Pending(waiting)
            }
        }
    }

    pub(crate) fn is_registered(&self) -> bool {
        matches!(self, Registration::Registered)
    }
}

impl Display for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Registered => write!(f, "registered"),
            Registration::Pending(waiting) => write!(f, "{} fields pending", waiting.len()),
        }
    }
}

/// Register every field of every unit until all messages report resolved, giving up after
/// `passes` rounds.
pub(crate) fn register_all<'sc>(
    cx: &SchemaContext<'sc>,
    model: &mut Model<'sc>,
    units: &[SchemaUnit<'sc>],
    passes: usize,
) -> Result<(), GeneratorError> {
    let mut outcome = Registration::Registered;
    for pass in 1..=passes {
        outcome = Registration::Registered;
        for unit in units {
            for id in &unit.definitions {
                outcome = outcome.and(register_definition(cx, model, *id)?);
            }
        }
        log::debug!("registration pass {}: {}", pass, outcome);
        if outcome.is_registered() {
            return Ok(());
        }
    }

    let waiting = match outcome {
        Registration::Registered => return Ok(()),
        Registration::Pending(waiting) => waiting,
    };
    Err(GeneratorError::ParameterResolutionTimeout {
        passes,
        pending: waiting
            .into_iter()
            .map(|(key, on)| PendingRegistration {
                message: model.definition(key.def).full_name.to_owned(),
                field: model
                    .field(key)
                    .map(|field| field.qualified_name())
                    .unwrap_or_default(),
                waiting_on: model.definition(on).full_name.to_owned(),
            })
            .collect(),
    })
}

/// Nested messages first, then the message's own fields. Enums are always registered.
pub(crate) fn register_definition<'sc>(
    cx: &SchemaContext<'sc>,
    model: &mut Model<'sc>,
    id: DefId,
) -> Result<Registration, GeneratorError> {
    let (nested, field_count) = match model.message(id) {
        Some(msg) => (msg.nested.clone(), msg.fields.len()),
        None => return Ok(Registration::Registered),
    };

    let mut outcome = Registration::Registered;
    for child in nested {
        outcome = outcome.and(register_definition(cx, model, child)?);
    }
    for index in 0..field_count {
        outcome = outcome.and(register_field(cx, model, FieldKey { def: id, index })?);
    }

    if let Some(msg) = model.message_mut(id) {
        msg.parameters_resolved = outcome.is_registered();
    }
    Ok(outcome)
}

/// Register one field's parameters with its owner's scope, once.
pub(crate) fn register_field<'sc>(
    cx: &SchemaContext<'sc>,
    model: &mut Model<'sc>,
    key: FieldKey,
) -> Result<Registration, GeneratorError> {
    let computed = match model.field(key) {
        Some(field) if !field.is_registered() => field.pending_parameters(model, cx),
        _ => return Ok(Registration::Registered),
    };

    match computed {
        Ok(parameters) => {
            check_unique(model, key, &parameters)?;
            let contributes = !parameters.is_empty();
            if contributes {
                let scope = model.definition(key.def).scope;
                model.scopes.register(scope, key);
            }
            if let Some(msg) = model.message_mut(key.def) {
                msg.has_parameters |= contributes;
                if let Some(field) = msg.fields.get_mut(key.index) {
                    field.parameters = parameters;
                    field.registered = true;
                }
            }
            Ok(Registration::Registered)
        }
        Err(waiting_on) => Ok(Registration::Pending(vec![(key, waiting_on)])),
    }
}

/// Parameter names must be unique within the owner's scope, including among the ones
/// `key` is about to add.
fn check_unique<'sc>(
    model: &Model<'sc>,
    key: FieldKey,
    parameters: &[CapacityParameter<'sc>],
) -> Result<(), GeneratorError> {
    let scope = model.definition(key.def).scope;
    let registered = model
        .scopes
        .get(scope)
        .contributors
        .iter()
        .filter_map(|other| model.field(*other))
        .flat_map(|field| field.parameters().iter().map(move |p| (p.name, field)));
    let field_name = |key: FieldKey| {
        model
            .field(key)
            .map(|field| field.qualified_name())
            .unwrap_or_default()
    };

    let current = field_name(key);
    let mut seen = HashMap::new();
    for (name, field) in registered {
        seen.insert(name, field.qualified_name());
    }
    for parameter in parameters {
        if let Some(first_field) = seen.insert(parameter.name, current.clone()) {
            return Err(GeneratorError::DuplicateParameter {
                message: model.definition(key.def).full_name.to_owned(),
                parameter: parameter.name.to_owned(),
                first_field,
                second_field: current,
            });
        }
    }
    Ok(())
}

/// Record the shortest path to every referenced type, failing where that path would cross a
/// parameterized scope.
pub(crate) fn qualify_references<'sc>(
    model: &mut Model<'sc>,
    units: &[SchemaUnit<'sc>],
) -> Result<(), GeneratorError> {
    let mut paths = Vec::new();
    for (id, def) in model.definitions() {
        let msg = match def.as_message() {
            Some(msg) => msg,
            None => continue,
        };
        for (index, field) in msg.fields.iter().enumerate() {
            let target = match field.type_ref().and_then(|type_ref| type_ref.target) {
                Some(target) => target,
                None => continue,
            };
            let target_scope = model.definition(target).scope;
            match model.reduced_relative_path(target_scope, def.scope) {
                Ok(path) => {
                    let names: Vec<_> = path
                        .into_iter()
                        .map(|scope| model.scopes().get(scope).name)
                        .collect();
                    paths.push((FieldKey { def: id, index }, names));
                }
                Err(err) => {
                    return Err(GeneratorError::UnqualifiableReference {
                        file: units
                            .get(def.unit)
                            .map(|unit| unit.name.clone())
                            .unwrap_or_default(),
                        message: def.full_name.to_owned(),
                        field: field.qualified_name(),
                        target: model.definition(target).full_name.to_owned(),
                        scope: model.scopes().qualified_name(err.scope),
                    })
                }
            }
        }
    }

    for (key, names) in paths {
        let type_ref = model
            .message_mut(key.def)
            .and_then(|msg| msg.fields.get_mut(key.index))
            .and_then(|field| field.kind.type_ref_mut());
        if let Some(type_ref) = type_ref {
            type_ref.path = names;
        }
    }
    Ok(())
}
