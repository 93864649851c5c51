use std::collections::HashMap;

use serde_json::{Map, Value};

use super::resolver::{FieldResolver, RootField, RootOperation};
use super::types::TypeDefinition;

/// Schema graph produced by the type compiler.
#[derive(Clone, Debug, Default)]
pub struct CompiledSchema {
    types: Vec<TypeDefinition>,
    by_name: HashMap<String, usize>,
    roots: HashMap<RootOperation, Vec<RootField>>,
    /// `(type, field)` -> resolver, including fields inherited through `extends`.
    field_resolvers: HashMap<(String, String), FieldResolver>,
}

impl CompiledSchema {
    pub(crate) fn new(
        types: Vec<TypeDefinition>,
        roots: HashMap<RootOperation, Vec<RootField>>,
        field_resolvers: HashMap<(String, String), FieldResolver>,
    ) -> Self {
        let by_name = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Self {
            types,
            by_name,
            roots,
            field_resolvers,
        }
    }

    /// Types in declaration order.
    pub fn types(&self) -> &[TypeDefinition] {
        &self.types
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn root_fields(&self, op: RootOperation) -> &[RootField] {
        self.roots.get(&op).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn root_field(&self, op: RootOperation, name: &str) -> Option<&RootField> {
        self.root_fields(op).iter().find(|f| f.name == name)
    }

    pub fn field_resolver(&self, type_name: &str, field: &str) -> Option<&FieldResolver> {
        self.field_resolvers
            .get(&(type_name.to_owned(), field.to_owned()))
    }

    pub fn field_resolver_count(&self) -> usize {
        self.field_resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.roots.values().all(Vec::is_empty)
    }

    /// Runs the resolver chain bound to a root field.
    pub async fn execute_root(
        &self,
        op: RootOperation,
        field: &str,
        args: Map<String, Value>,
    ) -> anyhow::Result<Value> {
        let root = self
            .root_field(op, field)
            .ok_or_else(|| anyhow::anyhow!("{op} has no field '{field}'"))?;
        root.resolver.call(args).await
    }

    /// Resolves a computed field of `parent`, an instance of `type_name`.
    pub async fn execute_field(
        &self,
        type_name: &str,
        field: &str,
        parent: Value,
        args: Map<String, Value>,
    ) -> anyhow::Result<Value> {
        let resolved = self
            .field_resolver(type_name, field)
            .ok_or_else(|| anyhow::anyhow!("'{type_name}.{field}' has no field resolver"))?;
        resolved.resolver.resolve(parent, args).await
    }
}
