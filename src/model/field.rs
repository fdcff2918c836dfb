use std::fmt;
use std::fmt::{Display, Formatter};

use crate::context::{Name, SchemaContext};
use crate::descriptor::{FieldDescriptor, FieldType};
use crate::model::{CapacityParameter, DefId, Model, ParameterRole};
use crate::symbol_table::SymbolTable;

/// The four encoding shapes of the wire format.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub enum WireCategory {
    Varint,
    Fixed32,
    Fixed64,
    LengthDelimited,
}

impl Display for WireCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use WireCategory::*;
        let name = match self {
            Varint => "VARINT",
            Fixed32 => "FIXED32",
            Fixed64 => "FIXED64",
            LengthDelimited => "LENGTH_DELIMITED",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub enum ScalarType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    Uint32,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl ScalarType {
    pub fn wire_category(self) -> WireCategory {
        use ScalarType::*;
        match self {
            Int32 | Int64 | Uint32 | Uint64 | Sint32 | Sint64 | Bool => WireCategory::Varint,
            Fixed64 | Sfixed64 | Double => WireCategory::Fixed64,
            Fixed32 | Sfixed32 | Float => WireCategory::Fixed32,
        }
    }

    pub fn name(self) -> &'static str {
        use ScalarType::*;
        match self {
            Double => "double",
            Float => "float",
            Int64 => "int64",
            Uint64 => "uint64",
            Int32 => "int32",
            Fixed64 => "fixed64",
            Fixed32 => "fixed32",
            Bool => "bool",
            Uint32 => "uint32",
            Sfixed32 => "sfixed32",
            Sfixed64 => "sfixed64",
            Sint32 => "sint32",
            Sint64 => "sint64",
        }
    }

    pub fn default_value(self) -> DefaultValue {
        use ScalarType::*;
        match self {
            Double | Float => DefaultValue::FloatZero,
            Uint64 | Uint32 | Fixed64 | Fixed32 => DefaultValue::UnsignedZero,
            Int64 | Int32 | Sfixed32 | Sfixed64 | Sint32 | Sint64 => DefaultValue::Zero,
            Bool => DefaultValue::False,
        }
    }
}

/// The value a freshly constructed field holds.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum DefaultValue {
    Zero,
    UnsignedZero,
    FloatZero,
    False,
    /// The zero value of the referenced enum.
    EnumZero(DefId),
    /// Whatever the field type's default constructor produces.
    Construct,
    /// The field is a disabled stub and holds nothing.
    Disabled,
}

impl Display for DefaultValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use DefaultValue::*;
        match self {
            Zero => write!(f, "0"),
            UnsignedZero => write!(f, "0U"),
            FloatZero => write!(f, "0.0"),
            False => write!(f, "false"),
            EnumZero(_) => write!(f, "0"),
            Construct | Disabled => Ok(()),
        }
    }
}

/// A reference to another type by name, linked to its definition once matched against the
/// symbol table.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TypeRef<'sc> {
    /// Dotted full name as declared, without the leading dot.
    pub declared: Name<'sc>,
    pub target: Option<DefId>,
    /// Shortest path to the target as seen from the referencing message, filled in once
    /// parameters are resolved.
    pub path: Vec<Name<'sc>>,
}

impl<'sc> TypeRef<'sc> {
    fn new(declared: Name<'sc>) -> TypeRef<'sc> {
        TypeRef {
            declared,
            target: None,
            path: Vec::new(),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum FieldKind<'sc> {
    Scalar(ScalarType),
    String,
    Bytes,
    Enum(TypeRef<'sc>),
    Message(TypeRef<'sc>),
    /// A repeated field; the box holds the element kind.
    Repeated(Box<FieldKind<'sc>>),
    /// A field whose type is its own enclosing message. Kept only so the emitter can leave a
    /// trace of it; it takes no part in serialization.
    Recursive { declared: Name<'sc> },
}

impl<'sc> FieldKind<'sc> {
    fn dispatch(
        descriptor: &FieldDescriptor,
        owner_full_name: &str,
        cx: &SchemaContext<'sc>,
        unwrapped: bool,
    ) -> FieldKind<'sc> {
        let declared = descriptor.referenced_type();
        if descriptor.field_type == FieldType::Message && declared == Some(owner_full_name) {
            return FieldKind::Recursive {
                declared: cx.intern(owner_full_name),
            };
        }

        if descriptor.is_repeated() && !unwrapped {
            return FieldKind::Repeated(Box::new(FieldKind::dispatch(
                descriptor,
                owner_full_name,
                cx,
                true,
            )));
        }

        let type_ref = || TypeRef::new(cx.intern(declared.unwrap_or_default()));
        match descriptor.field_type {
            FieldType::Message => FieldKind::Message(type_ref()),
            FieldType::Enum => FieldKind::Enum(type_ref()),
            FieldType::String => FieldKind::String,
            FieldType::Bytes => FieldKind::Bytes,
            FieldType::Double => FieldKind::Scalar(ScalarType::Double),
            FieldType::Float => FieldKind::Scalar(ScalarType::Float),
            FieldType::Int64 => FieldKind::Scalar(ScalarType::Int64),
            FieldType::Uint64 => FieldKind::Scalar(ScalarType::Uint64),
            FieldType::Int32 => FieldKind::Scalar(ScalarType::Int32),
            FieldType::Fixed64 => FieldKind::Scalar(ScalarType::Fixed64),
            FieldType::Fixed32 => FieldKind::Scalar(ScalarType::Fixed32),
            FieldType::Bool => FieldKind::Scalar(ScalarType::Bool),
            FieldType::Uint32 => FieldKind::Scalar(ScalarType::Uint32),
            FieldType::Sfixed32 => FieldKind::Scalar(ScalarType::Sfixed32),
            FieldType::Sfixed64 => FieldKind::Scalar(ScalarType::Sfixed64),
            FieldType::Sint32 => FieldKind::Scalar(ScalarType::Sint32),
            FieldType::Sint64 => FieldKind::Scalar(ScalarType::Sint64),
        }
    }

    pub fn wire_category(&self) -> Option<WireCategory> {
        match self {
            FieldKind::Scalar(scalar) => Some(scalar.wire_category()),
            FieldKind::Enum(_) => Some(WireCategory::Varint),
            FieldKind::String
            | FieldKind::Bytes
            | FieldKind::Message(_)
            | FieldKind::Repeated(_) => Some(WireCategory::LengthDelimited),
            FieldKind::Recursive { .. } => None,
        }
    }

    pub fn semantic_type(&self, model: &Model<'sc>) -> String {
        match self {
            FieldKind::Scalar(scalar) => scalar.name().to_owned(),
            FieldKind::String => "string".to_owned(),
            FieldKind::Bytes => "bytes".to_owned(),
            FieldKind::Enum(type_ref) | FieldKind::Message(type_ref) => type_ref
                .target
                .map(|target| model.definition(target).full_name)
                .unwrap_or(type_ref.declared)
                .to_owned(),
            FieldKind::Repeated(element) => format!("repeated {}", element.semantic_type(model)),
            FieldKind::Recursive { declared } => (*declared).to_owned(),
        }
    }

    pub fn default_value(&self) -> DefaultValue {
        match self {
            FieldKind::Scalar(scalar) => scalar.default_value(),
            FieldKind::Enum(type_ref) => match type_ref.target {
                Some(target) => DefaultValue::EnumZero(target),
                None => DefaultValue::Zero,
            },
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) | FieldKind::Repeated(_) => {
                DefaultValue::Construct
            }
            FieldKind::Recursive { .. } => DefaultValue::Disabled,
        }
    }

    /// The enum or message reference of this field or of its elements.
    pub fn type_ref(&self) -> Option<&TypeRef<'sc>> {
        match self {
            FieldKind::Enum(type_ref) | FieldKind::Message(type_ref) => Some(type_ref),
            FieldKind::Repeated(element) => element.type_ref(),
            _ => None,
        }
    }

    pub(crate) fn type_ref_mut(&mut self) -> Option<&mut TypeRef<'sc>> {
        match self {
            FieldKind::Enum(type_ref) | FieldKind::Message(type_ref) => Some(type_ref),
            FieldKind::Repeated(element) => element.type_ref_mut(),
            _ => None,
        }
    }

    /// The kind being stored: the element kind for repeated fields, otherwise `self`.
    pub fn element(&self) -> &FieldKind<'sc> {
        match self {
            FieldKind::Repeated(element) => element,
            _ => self,
        }
    }

    pub fn is_recursive(&self) -> bool {
        matches!(self, FieldKind::Recursive { .. })
    }

    fn requires_capacity(&self, max_length: Option<u32>, model: &Model<'sc>) -> bool {
        match self {
            FieldKind::String | FieldKind::Bytes => max_length.is_none(),
            FieldKind::Repeated(element) => {
                max_length.is_none() || element.requires_capacity(max_length, model)
            }
            FieldKind::Message(type_ref) => type_ref
                .target
                .map_or(false, |target| model.definition(target).has_parameters()),
            _ => false,
        }
    }

    /// Append the parameters this kind needs to `out`. Fails with the target definition if a
    /// referenced message has not finished resolving its own parameters yet.
    fn collect_parameters(
        &self,
        prefix: &str,
        max_length: Option<u32>,
        model: &Model<'sc>,
        cx: &SchemaContext<'sc>,
        out: &mut Vec<CapacityParameter<'sc>>,
    ) -> Result<(), DefId> {
        match self {
            FieldKind::String | FieldKind::Bytes => {
                if max_length.is_none() {
                    let name = cx.intern_concat(&[prefix, ParameterRole::Length.suffix()]);
                    out.push(CapacityParameter::new(name));
                }
            }
            FieldKind::Repeated(element) => {
                if max_length.is_none() {
                    let name = cx.intern_concat(&[prefix, ParameterRole::RepeatLength.suffix()]);
                    out.push(CapacityParameter::new(name));
                }
                element.collect_parameters(prefix, max_length, model, cx, out)?;
            }
            FieldKind::Message(type_ref) => {
                let target = match type_ref.target {
                    Some(target) => target,
                    None => return Ok(()),
                };
                let definition = model.definition(target);
                if !definition.parameters_resolved() {
                    return Err(target);
                }
                for inherited in model.own_parameters(definition.scope) {
                    let name = cx.intern_concat(&[prefix, inherited.name]);
                    out.push(CapacityParameter {
                        name,
                        kind: inherited.kind,
                    });
                }
            }
            FieldKind::Scalar(_) | FieldKind::Enum(_) | FieldKind::Recursive { .. } => {}
        }
        Ok(())
    }
}

/// The message, by id and name, a field is being created in.
#[derive(Debug, Copy, Clone)]
pub(crate) struct FieldOwner<'a, 'sc> {
    pub id: DefId,
    pub name: Name<'sc>,
    pub full_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct Field<'sc> {
    pub name: Name<'sc>,
    pub number: u32,
    pub owner: DefId,
    pub owner_name: Name<'sc>,
    /// Index into the owner's emitted oneofs, if this field is a member of one.
    pub oneof: Option<usize>,
    pub oneof_name: Option<Name<'sc>>,
    /// Explicit presence is tracked for this field.
    pub optional: bool,
    /// Fixed capacity from the `max_length` schema option. Zero counts as unset.
    pub max_length: Option<u32>,
    pub kind: FieldKind<'sc>,
    pub(crate) parameters: Vec<CapacityParameter<'sc>>,
    pub(crate) registered: bool,
}

impl<'sc> Field<'sc> {
    /// Build the field for `descriptor`. Self references become a `Recursive` stub, repeated
    /// fields wrap their element kind, everything else maps by declared wire type.
    pub(crate) fn create(
        cx: &SchemaContext<'sc>,
        descriptor: &FieldDescriptor,
        owner: FieldOwner<'_, 'sc>,
        oneof: Option<(usize, Name<'sc>)>,
    ) -> Field<'sc> {
        Field {
            name: cx.intern(&descriptor.name),
            number: descriptor.number,
            owner: owner.id,
            owner_name: owner.name,
            oneof: oneof.map(|(index, _)| index),
            oneof_name: oneof.map(|(_, name)| name),
            optional: descriptor.proto3_optional,
            max_length: descriptor.max_length.filter(|n| *n > 0),
            kind: FieldKind::dispatch(descriptor, owner.full_name, cx, false),
            parameters: Vec::new(),
            registered: false,
        }
    }

    pub fn wire_category(&self) -> Option<WireCategory> {
        self.kind.wire_category()
    }

    pub fn semantic_type(&self, model: &Model<'sc>) -> String {
        self.kind.semantic_type(model)
    }

    pub fn default_value(&self) -> DefaultValue {
        self.kind.default_value()
    }

    pub fn is_recursive(&self) -> bool {
        self.kind.is_recursive()
    }

    pub fn requires_capacity(&self, model: &Model<'sc>) -> bool {
        self.kind.requires_capacity(self.max_length, model)
    }

    /// Parameters this field contributes to its owner's scope. Empty until registered.
    pub fn parameters(&self) -> &[CapacityParameter<'sc>] {
        &self.parameters
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Shared start of every parameter name this field introduces: `<Owner>_<field>_`.
    /// Field names are unique per message, oneof members included.
    pub fn parameter_prefix(&self) -> String {
        format!("{}_{}_", self.owner_name, self.name)
    }

    /// Member name as seen from the message, eg `shape.circle` for a oneof member.
    pub fn qualified_name(&self) -> String {
        match self.oneof_name {
            Some(oneof) => format!("{}.{}", oneof, self.name),
            None => self.name.to_owned(),
        }
    }

    /// Name used in the message's field-number enumeration.
    pub fn number_name(&self) -> String {
        self.name.to_uppercase()
    }

    pub fn type_ref(&self) -> Option<&TypeRef<'sc>> {
        self.kind.type_ref()
    }

    /// Find the definition an enum or message reference points at, including the element of
    /// a repeated field. Kinds that reference nothing match trivially with `None`. On failure
    /// the error names the kind of definition that was expected.
    pub fn match_against(
        &self,
        symbols: &SymbolTable<'sc>,
        model: &Model<'sc>,
    ) -> Result<Option<DefId>, &'static str> {
        let (declared, wants_enum) = match self.kind.element() {
            FieldKind::Enum(type_ref) => (type_ref.declared, true),
            FieldKind::Message(type_ref) => (type_ref.declared, false),
            _ => return Ok(None),
        };
        symbols
            .lookup(declared)
            .filter(|target| model.definition(*target).is_enum() == wants_enum)
            .map(Some)
            .ok_or(if wants_enum { "enum" } else { "message" })
    }

    /// Work out the parameters this field contributes, or the message it is still waiting on.
    pub(crate) fn pending_parameters(
        &self,
        model: &Model<'sc>,
        cx: &SchemaContext<'sc>,
    ) -> Result<Vec<CapacityParameter<'sc>>, DefId> {
        let prefix = self.parameter_prefix();
        let mut parameters = Vec::new();
        self.kind
            .collect_parameters(&prefix, self.max_length, model, cx, &mut parameters)?;
        Ok(parameters)
    }
}
