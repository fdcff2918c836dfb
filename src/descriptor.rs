use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;

/// Everything handed to the generator for one run: every schema file protoc loaded, in the
/// order protoc sent them (dependencies before the files importing them).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GeneratorRequest {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

impl GeneratorRequest {
    pub fn new(files: Vec<FileDescriptor>) -> GeneratorRequest {
        GeneratorRequest { files }
    }

    /// Replay a request previously dumped as JSON.
    pub fn from_json(json: &str) -> Result<GeneratorRequest, GeneratorError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The schema dialect a file was written in. protoc leaves the tag empty for proto2, so a
/// missing tag deserializes as `Proto2`.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Proto2,
    Proto3,
    Editions,
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax::Proto2
    }
}

impl Display for Syntax {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
            Syntax::Editions => "editions",
        };
        write!(f, "{}", tag)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FileDescriptor {
    /// Path of the schema file relative to the include root, eg `geo/shapes.proto`.
    pub name: String,
    #[serde(default)]
    pub syntax: Syntax,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
}

impl FileDescriptor {
    pub fn proto3(name: &str) -> FileDescriptor {
        FileDescriptor {
            name: name.to_owned(),
            syntax: Syntax::Proto3,
            ..FileDescriptor::default()
        }
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> FileDescriptor {
        self.syntax = syntax;
        self
    }

    pub fn package(mut self, package: &str) -> FileDescriptor {
        self.package = Some(package.to_owned());
        self
    }

    pub fn depends_on(mut self, dependency: &str) -> FileDescriptor {
        self.dependencies.push(dependency.to_owned());
        self
    }

    pub fn message(mut self, message: MessageDescriptor) -> FileDescriptor {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumDescriptor) -> FileDescriptor {
        self.enums.push(enumeration);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn new(name: &str) -> EnumDescriptor {
        EnumDescriptor {
            name: name.to_owned(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: &str, number: i32) -> EnumDescriptor {
        self.values.push(EnumValueDescriptor {
            name: name.to_owned(),
            number,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MessageDescriptor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub nested_messages: Vec<MessageDescriptor>,
    #[serde(default)]
    pub nested_enums: Vec<EnumDescriptor>,
    #[serde(default)]
    pub oneofs: Vec<OneofDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: &str) -> MessageDescriptor {
        MessageDescriptor {
            name: name.to_owned(),
            ..MessageDescriptor::default()
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> MessageDescriptor {
        self.fields.push(field);
        self
    }

    pub fn nested(mut self, message: MessageDescriptor) -> MessageDescriptor {
        self.nested_messages.push(message);
        self
    }

    pub fn nested_enum(mut self, enumeration: EnumDescriptor) -> MessageDescriptor {
        self.nested_enums.push(enumeration);
        self
    }

    /// Declare a oneof group. Members point at it through `FieldDescriptor::in_oneof` using
    /// the declaration position.
    pub fn oneof(mut self, name: &str) -> MessageDescriptor {
        self.oneofs.push(OneofDescriptor {
            name: name.to_owned(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OneofDescriptor {
    pub name: String,
}

#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

impl Default for Label {
    fn default() -> Self {
        Label::Optional
    }
}

/// The declared wire type of a field, as protoc reports it.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    #[serde(default)]
    pub label: Label,
    pub field_type: FieldType,
    /// Fully qualified name of the referenced type for enum and message fields, eg
    /// `.geo.Point`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneof_index: Option<usize>,
    #[serde(default)]
    pub proto3_optional: bool,
    /// Fixed capacity set through the `max_length` schema option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl FieldDescriptor {
    pub fn new(name: &str, number: u32, field_type: FieldType) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_owned(),
            number,
            label: Label::Optional,
            field_type,
            type_name: None,
            oneof_index: None,
            proto3_optional: false,
            max_length: None,
        }
    }

    pub fn message(name: &str, number: u32, type_name: &str) -> FieldDescriptor {
        FieldDescriptor {
            type_name: Some(type_name.to_owned()),
            ..FieldDescriptor::new(name, number, FieldType::Message)
        }
    }

    pub fn enumeration(name: &str, number: u32, type_name: &str) -> FieldDescriptor {
        FieldDescriptor {
            type_name: Some(type_name.to_owned()),
            ..FieldDescriptor::new(name, number, FieldType::Enum)
        }
    }

    pub fn repeated(mut self) -> FieldDescriptor {
        self.label = Label::Repeated;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> FieldDescriptor {
        self.max_length = Some(max_length);
        self
    }

    pub fn in_oneof(mut self, index: usize) -> FieldDescriptor {
        self.oneof_index = Some(index);
        self
    }

    /// Mark as a proto3 `optional` field. protoc wraps these in a synthetic single-member
    /// oneof, so the caller must also declare that oneof.
    pub fn explicit_presence(mut self, synthetic_oneof: usize) -> FieldDescriptor {
        self.proto3_optional = true;
        self.oneof_index = Some(synthetic_oneof);
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    /// The declared type name in dotted form without the leading dot, if this field refers
    /// to another type.
    pub fn referenced_type(&self) -> Option<&str> {
        self.type_name
            .as_deref()
            .map(|name| name.strip_prefix('.').unwrap_or(name))
    }
}
