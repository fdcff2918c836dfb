use itertools::Itertools;

use crate::error::{GeneratorError, RenderError};
use crate::linker::{Resolution, SchemaUnit};
use crate::model::{CapacityParameter, DefId, DefinitionKind, Field, Model, TypeDefinition};

/// The templating step. Called once per definition and once per field of each emitted file;
/// the returned snippets become the artifact body.
pub trait Render {
    fn render_definition(&mut self, view: DefinitionView<'_, '_>) -> Result<String, RenderError>;

    fn render_field(&mut self, view: FieldView<'_, '_>) -> Result<String, RenderError>;
}

/// Read-only view of one definition while rendering.
#[derive(Debug, Copy, Clone)]
pub struct DefinitionView<'a, 'sc> {
    pub model: &'a Model<'sc>,
    pub unit: &'a SchemaUnit<'sc>,
    pub id: DefId,
    pub definition: &'a TypeDefinition<'sc>,
    /// Nesting depth below the file's top level.
    pub depth: usize,
}

impl<'a, 'sc> DefinitionView<'a, 'sc> {
    /// Parameters introduced by this definition's own fields.
    pub fn parameters(&self) -> Vec<CapacityParameter<'sc>> {
        self.model.own_parameters(self.definition.scope)
    }

    /// Parameters of every enclosing definition followed by this one's own.
    pub fn flattened_parameters(&self) -> Vec<CapacityParameter<'sc>> {
        self.model.flattened_parameters(self.definition.scope)
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldView<'a, 'sc>> + 'a {
        let model = self.model;
        let owner = self.definition;
        let depth = self.depth + 1;
        owner
            .as_message()
            .into_iter()
            .flat_map(|msg| msg.fields.iter())
            .map(move |field| FieldView {
                model,
                owner,
                field,
                depth,
            })
    }
}

/// Read-only view of one field while rendering.
#[derive(Debug, Copy, Clone)]
pub struct FieldView<'a, 'sc> {
    pub model: &'a Model<'sc>,
    pub owner: &'a TypeDefinition<'sc>,
    pub field: &'a Field<'sc>,
    pub depth: usize,
}

impl<'a, 'sc> FieldView<'a, 'sc> {
    pub fn semantic_type(&self) -> String {
        self.field.semantic_type(self.model)
    }

    /// The referenced type as written from inside the owner, segments joined by `separator`.
    pub fn type_path(&self, separator: &str) -> Option<String> {
        self.field
            .type_ref()
            .filter(|type_ref| !type_ref.path.is_empty())
            .map(|type_ref| type_ref.path.iter().join(separator))
    }
}

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub body: String,
}

/// Render every unit of `resolution`, in order.
pub fn emit<R>(
    resolution: &Resolution<'_>,
    renderer: &mut R,
) -> Result<Vec<Artifact>, GeneratorError>
where
    R: Render + ?Sized,
{
    let mut artifacts = Vec::with_capacity(resolution.units.len());
    for unit in &resolution.units {
        let mut parts = Vec::new();
        for id in &unit.definitions {
            render_tree(&resolution.model, unit, *id, 0, renderer, &mut parts).map_err(|source| {
                GeneratorError::Render {
                    artifact: unit.output_name.clone(),
                    source,
                }
            })?;
        }
        log::info!("rendered {} from {} snippets", unit.output_name, parts.len());
        artifacts.push(Artifact {
            name: unit.output_name.clone(),
            body: parts.join("\n"),
        });
    }
    Ok(artifacts)
}

/// The definition itself, then its nested definitions, then its fields.
fn render_tree<R>(
    model: &Model<'_>,
    unit: &SchemaUnit<'_>,
    id: DefId,
    depth: usize,
    renderer: &mut R,
    parts: &mut Vec<String>,
) -> Result<(), RenderError>
where
    R: Render + ?Sized,
{
    let view = DefinitionView {
        model,
        unit,
        id,
        definition: model.definition(id),
        depth,
    };
    parts.push(renderer.render_definition(view)?);
    if let Some(msg) = view.definition.as_message() {
        for nested in &msg.nested {
            render_tree(model, unit, *nested, depth + 1, renderer, parts)?;
        }
    }
    for field in view.fields() {
        parts.push(renderer.render_field(field)?);
    }
    Ok(())
}

/// Plain-text outline of the resolved model: one line per definition and field, indented by
/// nesting depth. Useful for eyeballing what a real template would be given.
#[derive(Debug, Default)]
pub struct OutlineRender;

impl Render for OutlineRender {
    fn render_definition(&mut self, view: DefinitionView<'_, '_>) -> Result<String, RenderError> {
        let definition = view.definition;
        let mut line = format!(
            "{}{} {}",
            "\t".repeat(view.depth),
            definition.kind_name(),
            definition.name
        );
        match &definition.kind {
            DefinitionKind::Enum(def) => {
                let values = def
                    .values
                    .iter()
                    .map(|value| format!("{} = {}", value.name, value.number))
                    .join(", ");
                line.push_str(&format!(" {{ {} }}", values));
            }
            DefinitionKind::Message(_) => {
                let parameters = view.parameters();
                if !parameters.is_empty() {
                    line.push_str(&format!("<{}>", parameters.iter().join(", ")));
                }
            }
        }
        Ok(line)
    }

    fn render_field(&mut self, view: FieldView<'_, '_>) -> Result<String, RenderError> {
        let field = view.field;
        let indent = "\t".repeat(view.depth);
        match field.wire_category() {
            Some(wire) => Ok(format!(
                "{}{} {}: {} [{}]",
                indent,
                field.number,
                field.qualified_name(),
                view.semantic_type(),
                wire
            )),
            None => Ok(format!(
                "{}{} {}: {} (disabled)",
                indent,
                field.number,
                field.qualified_name(),
                view.semantic_type()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        EnumDescriptor, FieldDescriptor, FieldType, FileDescriptor, GeneratorRequest,
        MessageDescriptor,
    };
    use crate::test_utils::*;

    struct Failing;

    impl Render for Failing {
        fn render_definition(&mut self, _: DefinitionView<'_, '_>) -> Result<String, RenderError> {
            Ok(String::new())
        }

        fn render_field(&mut self, view: FieldView<'_, '_>) -> Result<String, RenderError> {
            Err(RenderError::new(format!("no template for {}", view.field.name)))
        }
    }

    #[test]
    fn outline_lists_definitions_then_fields() {
        let request = GeneratorRequest::new(vec![FileDescriptor::proto3("doc/label.proto")
            .message(
                MessageDescriptor::new("Label")
                    .nested_enum(EnumDescriptor::new("Style").value("PLAIN", 0).value("BOLD", 1))
                    .field(FieldDescriptor::new("text", 1, FieldType::String))
                    .field(FieldDescriptor::enumeration("style", 2, ".Label.Style")),
            )]);
        with_resolution!(request, resolution, {
            let artifacts = emit(&resolution, &mut OutlineRender).unwrap();
            assert_eq!(artifacts.len(), 1);
            assert_eq!(artifacts[0].name, "doc/label.h");
            assert_eq!(
                artifacts[0].body,
                [
                    "message Label<uint32_t Label_text_LENGTH>",
                    "\tenum Style { PLAIN = 0, BOLD = 1 }",
                    "\t1 text: string [LENGTH_DELIMITED]",
                    "\t2 style: Label.Style [VARINT]",
                ]
                .join("\n")
            );
        });
    }

    #[test]
    fn stub_fields_are_marked_disabled() {
        let request = GeneratorRequest::new(vec![FileDescriptor::proto3("self.proto").message(
            MessageDescriptor::new("Node").field(FieldDescriptor::message("next", 1, ".Node")),
        )]);
        with_resolution!(request, resolution, {
            let artifacts = emit(&resolution, &mut OutlineRender).unwrap();
            assert_eq!(artifacts[0].body, "message Node\n\t1 next: Node (disabled)");
        });
    }

    #[test]
    fn renderer_failure_names_the_artifact() {
        let request = GeneratorRequest::new(vec![FileDescriptor::proto3("geo.proto").message(point())]);
        with_resolution!(request, resolution, {
            match emit(&resolution, &mut Failing) {
                Err(GeneratorError::Render { artifact, source }) => {
                    assert_eq!(artifact, "geo.h");
                    assert_eq!(source.reason, "no template for x");
                }
                other => panic!("expected a render failure, got {:?}", other),
            }
        });
    }

    #[test]
    fn field_views_expose_reference_paths() {
        let request = GeneratorRequest::new(vec![FileDescriptor::proto3("geo.proto")
            .package("geo")
            .message(point())
            .message(
                MessageDescriptor::new("Line")
                    .field(FieldDescriptor::message("a", 1, ".geo.Point")),
            )]);
        with_resolution!(request, resolution, {
            let model = &resolution.model;
            let line = model.find("geo.Line").unwrap();
            let view = DefinitionView {
                model,
                unit: &resolution.units[0],
                id: line,
                definition: model.definition(line),
                depth: 0,
            };
            let field = view.fields().next().unwrap();
            assert_eq!(field.type_path("::").as_deref(), Some("Point"));
            assert_eq!(field.semantic_type(), "geo.Point");
            assert_eq!(field.depth, 1);
        });
    }
}
