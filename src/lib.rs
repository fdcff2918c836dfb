//! Capacity-parameter inference for statically sized protobuf code generation.
//!
//! A [`GeneratorRequest`] holding every schema file of a run is resolved into a
//! [`model::Model`]: each field is linked to the type it uses, every string, bytes or repeated
//! field without a fixed capacity introduces a compile-time parameter, and those parameters
//! propagate to every message embedding the type. Declarations are ordered so that each type
//! follows the types it uses. A [`Render`] implementation then turns the result into one
//! artifact per schema file.

#[cfg(test)]
#[macro_use]
mod test_utils;

pub mod config;
pub mod context;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod linker;
pub mod model;
pub mod symbol_table;

pub use config::GeneratorConfig;
pub use descriptor::GeneratorRequest;
pub use emit::{Artifact, DefinitionView, FieldView, OutlineRender, Render};
pub use error::{GeneratorError, PendingRegistration, RecursiveFieldWarning, RenderError};

use context::{Arenas, SchemaContext};

/// Everything a successful run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub artifacts: Vec<Artifact>,
    pub warnings: Vec<RecursiveFieldWarning>,
}

/// Resolve `request` and render it with `renderer`. Each call works in its own arena; nothing
/// is shared between runs.
pub fn generate<R>(
    request: &GeneratorRequest,
    config: &GeneratorConfig,
    renderer: &mut R,
) -> Result<Generated, GeneratorError>
where
    R: Render + ?Sized,
{
    let arenas = Arenas::default();
    let cx = SchemaContext::new(&arenas);
    let resolution = linker::resolve(&cx, request, config)?;
    let artifacts = emit::emit(&resolution, renderer)?;
    Ok(Generated {
        artifacts,
        warnings: resolution.warnings,
    })
}
