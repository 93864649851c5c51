use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::type_ref::TypeRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Object,
    Interface,
    Input,
    Enum,
    Union,
}

impl TypeKind {
    /// Prefix given to a class's secondary unnamed representations.
    pub fn prefix(&self) -> &'static str {
        match self {
            TypeKind::Object => "Object",
            TypeKind::Interface => "Interface",
            TypeKind::Input => "Input",
            TypeKind::Enum => "Enum",
            TypeKind::Union => "Union",
        }
    }

    pub fn has_fields(&self) -> bool {
        matches!(
            self,
            TypeKind::Object | TypeKind::Interface | TypeKind::Input
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Scalar {
    String,
    Int,
    Float,
    Boolean,
    Id,
    Json,
}

impl Scalar {
    pub fn name(&self) -> &'static str {
        match self {
            Scalar::String => "String",
            Scalar::Int => "Int",
            Scalar::Float => "Float",
            Scalar::Boolean => "Boolean",
            Scalar::Id => "ID",
            Scalar::Json => "JSON",
        }
    }
}

/// Class-level type declaration.
#[derive(Clone, Debug)]
pub struct TypeParams {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub extends: Option<TypeRef>,
    pub implements: Vec<TypeRef>,
    /// Members of a class-declared union.
    pub members: Vec<TypeRef>,
}

impl TypeParams {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            name: None,
            description: None,
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn object() -> Self {
        Self::new(TypeKind::Object)
    }

    pub fn input() -> Self {
        Self::new(TypeKind::Input)
    }

    pub fn interface() -> Self {
        Self::new(TypeKind::Interface)
    }

    pub fn enumeration() -> Self {
        Self::new(TypeKind::Enum)
    }

    pub fn union(members: Vec<TypeRef>) -> Self {
        Self {
            members,
            ..Self::new(TypeKind::Union)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn extends(mut self, parent: TypeRef) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.implements.push(interface);
        self
    }
}

/// Field-level declaration on a type class.
#[derive(Clone, Debug)]
pub struct FieldParams {
    pub ty: TypeRef,
    pub name: Option<String>,
    pub nullable: bool,
    pub list: bool,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

impl FieldParams {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            name: None,
            nullable: false,
            list: false,
            description: None,
            deprecation: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct EnumValueParams {
    /// Runtime value; defaults to the key itself.
    pub value: Option<Value>,
    pub description: Option<String>,
}

impl EnumValueParams {
    pub fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ================= compiled definitions =================

/// Reference to another node in the compiled schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldType {
    pub name: String,
    pub nullable: bool,
    pub list: bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.list, self.nullable) {
            (true, true) => write!(f, "[{}!]", self.name),
            (true, false) => write!(f, "[{}!]!", self.name),
            (false, true) => f.write_str(&self.name),
            (false, false) => write!(f, "{}!", self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: FieldType,
    /// Arguments of a resolver-backed field.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<FieldDefinition>,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnumValueDefinition {
    pub name: String,
    pub value: Value,
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransformKind {
    Partial,
    Required,
}

impl TransformKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            TransformKind::Partial => "Partial",
            TransformKind::Required => "Required",
        }
    }

    pub fn nullable(&self) -> bool {
        matches!(self, TransformKind::Partial)
    }
}

/// Record kept on a derived type naming where its fields came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transformation {
    pub kind: TransformKind,
    pub source: String,
    pub nullable: bool,
}

/// One node of the compiled schema graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub interfaces: Vec<String>,
    pub enum_values: Vec<EnumValueDefinition>,
    pub union_members: Vec<String>,
    pub transformation: Option<Transformation>,
}

impl TypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn enum_keys(&self) -> Vec<&str> {
        self.enum_values.iter().map(|v| v.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_renders_modifiers() {
        let t = |nullable, list| FieldType {
            name: "User".into(),
            nullable,
            list,
        };
        assert_eq!(t(false, false).to_string(), "User!");
        assert_eq!(t(true, false).to_string(), "User");
        assert_eq!(t(false, true).to_string(), "[User!]!");
        assert_eq!(t(true, true).to_string(), "[User!]");
    }
}
