use itertools::Itertools;

use crate::config::GeneratorConfig;
use crate::context::{Name, SchemaContext};
use crate::descriptor::{EnumDescriptor, FieldDescriptor, FileDescriptor, MessageDescriptor};
use crate::error::RecursiveFieldWarning;
use crate::model::{
    DefId, DefinitionKind, EnumDefinition, EnumValue, Field, FieldOwner, MessageDefinition,
    Model, Oneof, ScopeId, TypeDefinition,
};

/// One selected input file and the top-level definitions it declares.
#[derive(Debug)]
pub struct SchemaUnit<'sc> {
    /// Schema path as given, eg `geo/shapes.proto`.
    pub name: String,
    pub output_name: String,
    pub index: usize,
    /// Innermost package scope; top-level definitions hang off it.
    pub package_scope: Option<ScopeId>,
    /// Top-level enums then messages. Emission order once sorted.
    pub definitions: Vec<DefId>,
    namespaces: Vec<Name<'sc>>,
    includes: Vec<String>,
}

impl<'sc> SchemaUnit<'sc> {
    /// Ingest `file` into `model`, creating its package scopes, definitions and fields.
    pub(crate) fn build(
        cx: &SchemaContext<'sc>,
        model: &mut Model<'sc>,
        file: &FileDescriptor,
        index: usize,
        config: &GeneratorConfig,
        warnings: &mut Vec<RecursiveFieldWarning>,
    ) -> SchemaUnit<'sc> {
        let namespaces: Vec<Name<'sc>> = file
            .package
            .iter()
            .flat_map(|package| package.split('.'))
            .filter(|segment| !segment.is_empty())
            .map(|segment| cx.intern(segment))
            .collect();

        let package_scope = namespaces
            .iter()
            .fold(None, |parent, segment| Some(model.scopes.add(*segment, parent)));

        let mut builder = UnitBuilder {
            cx,
            model,
            unit: index,
            file: &file.name,
            warnings,
        };
        let top_level = Enclosing {
            scope: package_scope,
            definition: None,
        };
        let mut definitions = Vec::with_capacity(file.enums.len() + file.messages.len());
        for enumeration in &file.enums {
            definitions.push(EnumDefinition::from_descriptor(enumeration, &mut builder, top_level));
        }
        for message in &file.messages {
            definitions.push(MessageDefinition::from_descriptor(message, &mut builder, top_level));
        }

        let includes = file
            .dependencies
            .iter()
            .filter(|dependency| !config.is_options_file(dependency))
            .map(|dependency| config.output_name(dependency))
            .collect();

        SchemaUnit {
            name: file.name.clone(),
            output_name: config.output_name(&file.name),
            index,
            package_scope,
            definitions,
            namespaces,
            includes,
        }
    }

    /// Package segments, outermost first.
    pub fn namespaces(&self) -> &[Name<'sc>] {
        &self.namespaces
    }

    /// Output names of the files this one imports, the options file excluded.
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// `geo/shapes.h` becomes `GEO_SHAPES`.
    pub fn header_guard(&self) -> String {
        let stem = self
            .output_name
            .rsplit_once('.')
            .map_or(self.output_name.as_str(), |(stem, _)| stem);
        stem.replace('/', "_").to_uppercase()
    }

    /// Every definition of this file, each followed by its nested definitions, in emission
    /// order.
    pub fn walk(&self, model: &Model<'sc>) -> Vec<(DefId, usize)> {
        fn visit(model: &Model<'_>, id: DefId, depth: usize, out: &mut Vec<(DefId, usize)>) {
            out.push((id, depth));
            if let Some(msg) = model.message(id) {
                for nested in &msg.nested {
                    visit(model, *nested, depth + 1, out);
                }
            }
        }

        let mut out = Vec::new();
        for id in &self.definitions {
            visit(model, *id, 0, &mut out);
        }
        out
    }
}

/// Where a new definition is being declared.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Enclosing {
    pub scope: Option<ScopeId>,
    pub definition: Option<DefId>,
}

pub(crate) struct UnitBuilder<'a, 'sc> {
    cx: &'a SchemaContext<'sc>,
    model: &'a mut Model<'sc>,
    unit: usize,
    file: &'a str,
    warnings: &'a mut Vec<RecursiveFieldWarning>,
}

impl<'a, 'sc> UnitBuilder<'a, 'sc> {
    /// Open a scope for `name` and register an empty definition of `kind` in it.
    fn declare(
        &mut self,
        name: &str,
        enclosing: Enclosing,
        kind: DefinitionKind<'sc>,
    ) -> (DefId, ScopeId) {
        let name = self.cx.intern(name);
        let scope = self.model.scopes.add(name, enclosing.scope);
        let full_name = self.cx.intern(&self.model.scopes.qualified_name(scope));
        let id = self.model.push_definition(TypeDefinition {
            name,
            full_name,
            scope,
            parent: enclosing.definition,
            unit: self.unit,
            emission_index: 0,
            kind,
        });
        self.model.scopes.attach_definition(scope, id);
        (id, scope)
    }
}

/// Conversion from an input descriptor into the model, in the manner of a lowering pass.
pub(crate) trait FromDescriptor<'sc, D> {
    fn from_descriptor(
        descriptor: &D,
        builder: &mut UnitBuilder<'_, 'sc>,
        enclosing: Enclosing,
    ) -> DefId;
}

impl<'sc> FromDescriptor<'sc, EnumDescriptor> for EnumDefinition<'sc> {
    fn from_descriptor(
        descriptor: &EnumDescriptor,
        builder: &mut UnitBuilder<'_, 'sc>,
        enclosing: Enclosing,
    ) -> DefId {
        let values = descriptor
            .values
            .iter()
            .map(|value| EnumValue {
                name: builder.cx.intern(&value.name),
                number: value.number,
            })
            .collect();
        let (id, _) = builder.declare(
            &descriptor.name,
            enclosing,
            DefinitionKind::Enum(EnumDefinition { values }),
        );
        id
    }
}

impl<'sc> FromDescriptor<'sc, MessageDescriptor> for MessageDefinition<'sc> {
    fn from_descriptor(
        descriptor: &MessageDescriptor,
        builder: &mut UnitBuilder<'_, 'sc>,
        enclosing: Enclosing,
    ) -> DefId {
        let (id, scope) = builder.declare(
            &descriptor.name,
            enclosing,
            DefinitionKind::Message(MessageDefinition::default()),
        );
        let inner = Enclosing {
            scope: Some(scope),
            definition: Some(id),
        };

        let mut nested = Vec::with_capacity(
            descriptor.nested_enums.len() + descriptor.nested_messages.len(),
        );
        for enumeration in &descriptor.nested_enums {
            nested.push(EnumDefinition::from_descriptor(enumeration, builder, inner));
        }
        for message in &descriptor.nested_messages {
            nested.push(MessageDefinition::from_descriptor(message, builder, inner));
        }

        let definition = builder.model.definition(id);
        let owner = FieldOwner {
            id,
            name: definition.name,
            full_name: definition.full_name,
        };
        let (fields, oneofs) = build_fields(descriptor, builder, owner);
        let field_numbers = fields
            .iter()
            .map(|field| (field.number, field.number_name()))
            .sorted()
            .collect();

        if let Some(msg) = builder.model.message_mut(id) {
            msg.nested = nested;
            msg.fields = fields;
            msg.oneofs = oneofs;
            msg.field_numbers = field_numbers;
        }
        id
    }
}

/// Plain fields in declaration order, followed by the members of each emitted oneof. A
/// oneof only made up of explicit-presence fields is protoc's synthetic wrapper and is not
/// emitted; its members stay plain optional fields.
fn build_fields<'sc>(
    descriptor: &MessageDescriptor,
    builder: &mut UnitBuilder<'_, 'sc>,
    owner: FieldOwner<'_, 'sc>,
) -> (Vec<Field<'sc>>, Vec<Oneof<'sc>>) {
    let emitted: Vec<usize> = (0..descriptor.oneofs.len())
        .filter(|declared| {
            descriptor
                .fields
                .iter()
                .any(|field| field.oneof_index == Some(*declared) && !field.proto3_optional)
        })
        .collect();

    let cx = builder.cx;
    let file = builder.file;
    let warnings = &mut *builder.warnings;
    let mut fields = Vec::with_capacity(descriptor.fields.len());
    let mut create = |fields: &mut Vec<Field<'sc>>,
                      field: &FieldDescriptor,
                      oneof: Option<(usize, Name<'sc>)>| {
        let created = Field::create(cx, field, owner, oneof);
        if created.is_recursive() {
            let warning = RecursiveFieldWarning {
                file: file.to_owned(),
                message: owner.full_name.to_owned(),
                field: created.qualified_name(),
            };
            log::warn!("{}", warning);
            warnings.push(warning);
        }
        fields.push(created);
        fields.len() - 1
    };

    for field in &descriptor.fields {
        let in_emitted = field
            .oneof_index
            .map_or(false, |declared| emitted.contains(&declared));
        if !in_emitted {
            create(&mut fields, field, None);
        }
    }

    let mut oneofs = Vec::with_capacity(emitted.len());
    for (position, declared) in emitted.into_iter().enumerate() {
        let name = cx.intern(&descriptor.oneofs[declared].name);
        let members = descriptor
            .fields
            .iter()
            .filter(|field| field.oneof_index == Some(declared))
            .map(|field| create(&mut fields, field, Some((position, name))))
            .collect();
        oneofs.push(Oneof {
            name,
            declared_index: declared,
            members,
        });
    }

    (fields, oneofs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldType;
    use crate::model::FieldKind;

    fn build<'sc>(
        cx: &SchemaContext<'sc>,
        model: &mut Model<'sc>,
        file: &FileDescriptor,
    ) -> (SchemaUnit<'sc>, Vec<RecursiveFieldWarning>) {
        let mut warnings = Vec::new();
        let unit = SchemaUnit::build(cx, model, file, 0, &GeneratorConfig::default(), &mut warnings);
        (unit, warnings)
    }

    #[test]
    fn package_segments_become_scopes() {
        with_context!(cx, {
            let mut model = Model::new();
            let file = FileDescriptor::proto3("geo/shapes.proto")
                .package("acme.geo")
                .message(MessageDescriptor::new("Point"));
            let (unit, _) = build(&cx, &mut model, &file);

            assert_eq!(unit.namespaces(), &["acme", "geo"]);
            assert_eq!(unit.output_name, "geo/shapes.h");
            assert_eq!(unit.header_guard(), "GEO_SHAPES");
            let point = model.definition(unit.definitions[0]);
            assert_eq!(point.full_name, "acme.geo.Point");
            assert_eq!(model.scopes().qualified_name(point.scope), "acme.geo.Point");
        });
    }

    #[test]
    fn nested_enums_precede_nested_messages() {
        with_context!(cx, {
            let mut model = Model::new();
            let file = FileDescriptor::proto3("a.proto").message(
                MessageDescriptor::new("Outer")
                    .nested(MessageDescriptor::new("Inner"))
                    .nested_enum(EnumDescriptor::new("Mode").value("OFF", 0)),
            );
            let (unit, _) = build(&cx, &mut model, &file);
            let outer = model.message(unit.definitions[0]).unwrap();
            let names: Vec<_> = outer
                .nested
                .iter()
                .map(|id| model.definition(*id).full_name)
                .collect();
            assert_eq!(names, vec!["Outer.Mode", "Outer.Inner"]);
            assert_eq!(model.definition(outer.nested[1]).parent, Some(unit.definitions[0]));
        });
    }

    #[test]
    fn includes_drop_options_file() {
        with_context!(cx, {
            let mut model = Model::new();
            let file = FileDescriptor::proto3("a.proto")
                .depends_on("embedded_proto_options.proto")
                .depends_on("geo/point.proto");
            let (unit, _) = build(&cx, &mut model, &file);
            assert_eq!(unit.includes(), &["geo/point.h".to_owned()]);
        });
    }

    #[test]
    fn synthetic_oneof_is_not_emitted() {
        with_context!(cx, {
            let mut model = Model::new();
            let file = FileDescriptor::proto3("a.proto").message(
                MessageDescriptor::new("Reading")
                    .field(FieldDescriptor::new("value", 1, FieldType::Float))
                    .field(FieldDescriptor::new("offset", 2, FieldType::Int32).explicit_presence(0))
                    .oneof("_offset"),
            );
            let (unit, _) = build(&cx, &mut model, &file);
            let reading = model.message(unit.definitions[0]).unwrap();
            assert!(reading.oneofs.is_empty());
            assert_eq!(reading.plain_fields().count(), 2);
            let optional: Vec<_> = reading.optional_fields().map(|f| f.name).collect();
            assert_eq!(optional, vec!["offset"]);
        });
    }

    #[test]
    fn oneof_members_follow_plain_fields() {
        with_context!(cx, {
            let mut model = Model::new();
            let file = FileDescriptor::proto3("a.proto").message(
                MessageDescriptor::new("Shape")
                    .field(FieldDescriptor::new("radius", 3, FieldType::Float).in_oneof(0))
                    .field(FieldDescriptor::new("id", 1, FieldType::Uint32))
                    .field(FieldDescriptor::enumeration("unit", 2, ".Unit").in_oneof(0))
                    .oneof("kind"),
            );
            let (unit, _) = build(&cx, &mut model, &file);
            let shape = model.message(unit.definitions[0]).unwrap();
            let order: Vec<_> = shape.fields.iter().map(|f| f.qualified_name()).collect();
            assert_eq!(order, vec!["id", "kind.radius", "kind.unit"]);
            assert_eq!(shape.oneofs[0].selector(), "which_kind");
            assert!(shape.oneofs[0].allocation_required(&shape.fields));
            let members: Vec<_> = shape.oneof_members(0).unwrap().map(|f| f.name).collect();
            assert_eq!(members, vec!["radius", "unit"]);
            assert!(shape.oneof_members(1).is_none());
            assert_eq!(
                shape.field_numbers,
                vec![
                    (1, "ID".to_owned()),
                    (2, "UNIT".to_owned()),
                    (3, "RADIUS".to_owned())
                ]
            );
        });
    }

    #[test]
    fn self_reference_is_reported_once() {
        with_context!(cx, {
            let mut model = Model::new();
            let file = FileDescriptor::proto3("tree.proto").package("t").message(
                MessageDescriptor::new("Node")
                    .field(FieldDescriptor::message("next", 1, ".t.Node"))
                    .field(FieldDescriptor::new("name", 2, FieldType::String)),
            );
            let (unit, warnings) = build(&cx, &mut model, &file);
            assert_eq!(
                warnings,
                vec![RecursiveFieldWarning {
                    file: "tree.proto".to_owned(),
                    message: "t.Node".to_owned(),
                    field: "next".to_owned(),
                }]
            );
            let node = model.message(unit.definitions[0]).unwrap();
            assert!(matches!(node.fields[0].kind, FieldKind::Recursive { .. }));
        });
    }
}
