use crate::config::GeneratorConfig;
use crate::descriptor::{FieldDescriptor, FieldType, GeneratorRequest, MessageDescriptor};
use crate::error::GeneratorError;
use crate::linker::{resolve, Resolution};

/// Run `$body` with a fresh `SchemaContext` bound to `$cx`.
macro_rules! with_context {
    ($cx:ident, $body:block) => {{
        let arenas = $crate::context::Arenas::default();
        let $cx = $crate::context::SchemaContext::new(&arenas);
        $body
    }};
}

/// Resolve `$request` with the default configuration and run `$body` with the result bound
/// to `$resolution`. Panics if resolution fails.
macro_rules! with_resolution {
    ($request:expr, $resolution:ident, $body:block) => {
        with_context!(cx, {
            let $resolution = $crate::linker::resolve(
                &cx,
                &$request,
                &$crate::config::GeneratorConfig::default(),
            )
            .unwrap();
            $body
        })
    };
}

/// Resolve in a throwaway context, keeping only the outcome.
pub(crate) fn resolve_request(request: &GeneratorRequest) -> Result<(), GeneratorError> {
    with_context!(cx, {
        let outcome = resolve(&cx, request, &GeneratorConfig::default()).map(|_| ());
        outcome
    })
}

/// Full names of unit `unit`'s definitions, parents before their nested types.
pub(crate) fn emission_order<'sc>(resolution: &Resolution<'sc>, unit: usize) -> Vec<&'sc str> {
    resolution.units[unit]
        .walk(&resolution.model)
        .into_iter()
        .map(|(id, _)| resolution.model.definition(id).full_name)
        .collect()
}

/// A fixed-size message: two floats.
pub(crate) fn point() -> MessageDescriptor {
    MessageDescriptor::new("Point")
        .field(FieldDescriptor::new("x", 1, FieldType::Float))
        .field(FieldDescriptor::new("y", 2, FieldType::Float))
}
