//! Type compiler: class-declared and synthesised types assembled into a schema graph.

mod builder;
pub mod compiled;
pub mod creator;
pub mod resolver;
pub mod sdl;
pub mod type_ref;
pub mod types;

pub use compiled::CompiledSchema;
pub use creator::{CreateParams, CreatedDef, CreatedType, TypeCreator};
pub use resolver::{
    BoundResolver, FieldResolver, FieldResolverParams, ResolverChain, ResolverFn, RootField,
    RootFieldParams, RootOperation,
};
pub use type_ref::{CreatedTypeId, TypeRef, TypeTarget};
pub use types::{
    EnumValueDefinition, EnumValueParams, FieldDefinition, FieldParams, FieldType, Scalar,
    TransformKind, Transformation, TypeDefinition, TypeKind, TypeParams,
};

use crate::di::ServiceRegistry;
use crate::directive::Directive;
use crate::error::RegistryError;
use crate::routing::compiler::middleware_index;

/// Builds the schema from every type directive, binding root and field
/// resolvers to their resolver services and middleware.
pub fn compile_schema(
    directives: &[Directive],
    services: &ServiceRegistry,
) -> Result<CompiledSchema, RegistryError> {
    let index = middleware_index(directives)?;
    builder::SchemaBuilder::new(directives).build(services, &index)
}
