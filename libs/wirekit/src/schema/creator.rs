//! Synthesised types: enums and unions built from values, and partial/required
//! variants derived from an existing type.

use serde_json::Value;

use super::type_ref::{CreatedTypeId, TypeRef};
use super::types::{TransformKind, TypeKind};
use crate::error::RegistryError;
use crate::registry::Registry;

#[derive(Clone, Debug)]
pub enum CreatedDef {
    Enum {
        values: Vec<(String, Value)>,
        extends: Option<TypeRef>,
    },
    Union {
        members: Vec<TypeRef>,
    },
    Transform {
        kind: TransformKind,
        target: TypeRef,
    },
}

#[derive(Clone, Debug)]
pub struct CreatedType {
    pub id: CreatedTypeId,
    pub name: Option<String>,
    pub kind: Option<TypeKind>,
    pub description: Option<String>,
    pub def: CreatedDef,
}

/// Options shared by every `TypeCreator` operation.
#[derive(Clone, Debug, Default)]
pub struct CreateParams {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Enum whose values are appended after the new ones.
    pub extends: Option<TypeRef>,
    /// Kind of a derived type; defaults to the target's kind.
    pub kind: Option<TypeKind>,
}

impl CreateParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn extends(mut self, parent: TypeRef) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Registers synthesised types and hands back references to them.
pub struct TypeCreator<'a> {
    registry: &'a mut Registry,
}

impl<'a> TypeCreator<'a> {
    pub(crate) fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    /// Enum whose values are `values` in iteration order. Without a name the
    /// type is named after the concatenated keys.
    pub fn create_enum<I, K>(
        &mut self,
        values: I,
        params: CreateParams,
    ) -> Result<TypeRef, RegistryError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let values: Vec<(String, Value)> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let name = params
            .name
            .or_else(|| Some(values.iter().map(|(k, _)| k.as_str()).collect::<String>()));
        self.registry.add_created(
            name,
            Some(TypeKind::Enum),
            params.description,
            CreatedDef::Enum {
                values,
                extends: params.extends,
            },
        )
    }

    /// Union over `members`; the default name is computed at build time from
    /// the resolved member names.
    pub fn create_union(
        &mut self,
        members: Vec<TypeRef>,
        params: CreateParams,
    ) -> Result<TypeRef, RegistryError> {
        self.registry.add_created(
            params.name,
            Some(TypeKind::Union),
            params.description,
            CreatedDef::Union { members },
        )
    }

    /// Copy of `target` with every field nullable. `target` is left untouched.
    pub fn create_partial(
        &mut self,
        target: TypeRef,
        params: CreateParams,
    ) -> Result<TypeRef, RegistryError> {
        self.transform(TransformKind::Partial, target, params)
    }

    /// Copy of `target` with every field non-null. `target` is left untouched.
    pub fn create_required(
        &mut self,
        target: TypeRef,
        params: CreateParams,
    ) -> Result<TypeRef, RegistryError> {
        self.transform(TransformKind::Required, target, params)
    }

    fn transform(
        &mut self,
        kind: TransformKind,
        target: TypeRef,
        params: CreateParams,
    ) -> Result<TypeRef, RegistryError> {
        self.registry.add_created(
            params.name,
            params.kind,
            params.description,
            CreatedDef::Transform { kind, target },
        )
    }
}
