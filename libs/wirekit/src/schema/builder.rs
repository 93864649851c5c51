//! Assembles type directives into the compiled schema.
//!
//! Every node is resolved through memoised depth-first passes (names, kinds,
//! fields, enum values); re-entering a node that is still being computed is
//! reported as a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use super::compiled::CompiledSchema;
use super::creator::{CreatedDef, CreatedType};
use super::resolver::{
    FieldResolver, FieldResolverParams, ResolverChain, RootField, RootFieldParams, RootOperation,
};
use super::type_ref::{CreatedTypeId, TypeRef, TypeTarget};
use super::types::{
    EnumValueDefinition, EnumValueParams, FieldDefinition, FieldParams, FieldType, Scalar,
    Transformation, TypeDefinition, TypeKind, TypeParams,
};
use crate::class::ClassId;
use crate::di::ServiceRegistry;
use crate::directive::{Directive, TypeDirective};
use crate::error::RegistryError;
use crate::http::MiddlewareIndex;

#[derive(Clone, Copy)]
enum Source<'a> {
    Class {
        class: ClassId,
        params: &'a TypeParams,
    },
    Created(&'a CreatedType),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

enum Resolved {
    Scalar(Scalar),
    Node(usize),
}

/// Memo slot for one pass over the nodes.
struct Pass<T> {
    state: Vec<Visit>,
    value: Vec<Option<T>>,
}

impl<T: Clone> Pass<T> {
    fn new(len: usize) -> Self {
        Self {
            state: vec![Visit::New; len],
            value: (0..len).map(|_| None).collect(),
        }
    }

    /// `Ok(Some(v))` when done, `Ok(None)` when the caller should compute it,
    /// `Err(())` when the node is already on the stack.
    fn enter(&mut self, i: usize) -> Result<Option<T>, ()> {
        match self.state[i] {
            Visit::Done => Ok(self.value[i].clone()),
            Visit::Active => Err(()),
            Visit::New => {
                self.state[i] = Visit::Active;
                Ok(None)
            }
        }
    }

    fn finish(&mut self, i: usize, v: T) -> T {
        self.state[i] = Visit::Done;
        self.value[i] = Some(v.clone());
        v
    }
}

pub(crate) struct SchemaBuilder<'a> {
    nodes: Vec<Source<'a>>,
    by_class: HashMap<ClassId, Vec<usize>>,
    by_created: HashMap<CreatedTypeId, usize>,
    class_fields: HashMap<ClassId, Vec<(&'a str, &'a FieldParams)>>,
    class_values: HashMap<ClassId, Vec<(&'a str, &'a EnumValueParams)>>,
    root_fields: Vec<(ClassId, &'a str, &'a RootFieldParams)>,
    field_resolvers: Vec<(ClassId, &'a str, &'a FieldResolverParams)>,
    /// Node -> indices into `field_resolvers` declared directly on it.
    resolver_targets: HashMap<usize, Vec<usize>>,
    names: Pass<String>,
    kinds: Pass<TypeKind>,
    fields: Pass<Vec<FieldDefinition>>,
    values: Pass<Vec<EnumValueDefinition>>,
    by_name: HashMap<String, usize>,
}

impl<'a> SchemaBuilder<'a> {
    pub(crate) fn new(directives: &'a [Directive]) -> Self {
        let mut nodes = Vec::new();
        let mut by_class: HashMap<ClassId, Vec<usize>> = HashMap::new();
        let mut by_created = HashMap::new();
        let mut class_fields: HashMap<ClassId, Vec<(&'a str, &'a FieldParams)>> = HashMap::new();
        let mut class_values: HashMap<ClassId, Vec<(&'a str, &'a EnumValueParams)>> =
            HashMap::new();
        let mut root_fields = Vec::new();
        let mut field_resolvers = Vec::new();

        for d in directives {
            match d.type_directive() {
                Some(TypeDirective::Type(params)) => {
                    by_class.entry(d.owner).or_default().push(nodes.len());
                    nodes.push(Source::Class {
                        class: d.owner,
                        params,
                    });
                }
                Some(TypeDirective::Created(created)) => {
                    by_created.insert(created.id, nodes.len());
                    nodes.push(Source::Created(created));
                }
                Some(TypeDirective::Field(params)) => {
                    class_fields.entry(d.owner).or_default().push((&*d.key, params));
                }
                Some(TypeDirective::EnumValue(params)) => {
                    class_values.entry(d.owner).or_default().push((&*d.key, params));
                }
                Some(TypeDirective::RootField(params)) => {
                    root_fields.push((d.owner, &*d.key, params));
                }
                Some(TypeDirective::FieldResolver(params)) => {
                    field_resolvers.push((d.owner, &*d.key, params));
                }
                Some(TypeDirective::Resolver) | None => {}
            }
        }

        let len = nodes.len();
        Self {
            nodes,
            by_class,
            by_created,
            class_fields,
            class_values,
            root_fields,
            field_resolvers,
            resolver_targets: HashMap::new(),
            names: Pass::new(len),
            kinds: Pass::new(len),
            fields: Pass::new(len),
            values: Pass::new(len),
            by_name: HashMap::new(),
        }
    }

    pub(crate) fn build(
        mut self,
        services: &ServiceRegistry,
        index: &MiddlewareIndex,
    ) -> Result<CompiledSchema, RegistryError> {
        for class in self.class_fields.keys() {
            if !self.by_class.contains_key(class) {
                tracing::warn!(
                    class = %class,
                    "Fields declared on a class without a type declaration are ignored"
                );
            }
        }

        self.assign_class_names();
        for i in 0..self.nodes.len() {
            let name = self.name_of(i)?;
            if self.by_name.insert(name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateTypeName { name });
            }
        }

        self.index_field_resolvers()?;

        let mut types = Vec::with_capacity(self.nodes.len());
        for i in 0..self.nodes.len() {
            types.push(self.definition(i)?);
        }

        let roots = self.root_fields(services, index)?;
        let computed = self.bind_field_resolvers(services, index)?;
        tracing::info!(
            types = types.len(),
            field_resolvers = computed.len(),
            queries = roots.get(&RootOperation::Query).map_or(0, Vec::len),
            mutations = roots.get(&RootOperation::Mutation).map_or(0, Vec::len),
            subscriptions = roots.get(&RootOperation::Subscription).map_or(0, Vec::len),
            "Schema compiled"
        );
        Ok(CompiledSchema::new(types, roots, computed))
    }

    // ================= naming =================

    /// Unnamed class declarations: the object one (or the first) takes the bare
    /// class name, the others are prefixed with their kind.
    fn assign_class_names(&mut self) {
        let mut classes: Vec<(ClassId, Vec<usize>)> =
            self.by_class.iter().map(|(c, v)| (*c, v.clone())).collect();
        classes.sort_by_key(|(_, v)| v.first().copied());

        for (class, decls) in classes {
            let unnamed: Vec<(usize, TypeKind)> = decls
                .iter()
                .filter_map(|&i| match self.nodes[i] {
                    Source::Class { params, .. } if params.name.is_none() => {
                        Some((i, params.kind))
                    }
                    _ => None,
                })
                .collect();
            let primary = unnamed
                .iter()
                .find(|(_, k)| *k == TypeKind::Object)
                .or_else(|| unnamed.first())
                .map(|(i, _)| *i);

            for &i in &decls {
                let Source::Class { params, .. } = self.nodes[i] else {
                    continue;
                };
                let name = match &params.name {
                    Some(n) => n.clone(),
                    None if Some(i) == primary => class.short_name().to_owned(),
                    None => format!("{}{}", params.kind.prefix(), class.short_name()),
                };
                self.names.finish(i, name);
            }
        }
    }

    fn name_of(&mut self, i: usize) -> Result<String, RegistryError> {
        match self.names.enter(i) {
            Ok(Some(name)) => return Ok(name),
            Ok(None) => {}
            Err(()) => {
                return Err(RegistryError::TypeCycle {
                    name: self.label(i),
                })
            }
        }
        let name = match self.nodes[i] {
            Source::Class { class, .. } => class.short_name().to_owned(),
            Source::Created(created) => match (&created.name, &created.def) {
                (Some(n), _) => n.clone(),
                (None, CreatedDef::Enum { values, .. }) => {
                    values.iter().map(|(k, _)| k.as_str()).collect()
                }
                (None, CreatedDef::Union { members }) => {
                    let mut name = String::new();
                    for m in members {
                        name.push_str(&self.ref_name(m, false, &self.label(i))?);
                    }
                    name
                }
                (None, CreatedDef::Transform { kind, target }) => {
                    let input = created.kind == Some(TypeKind::Input);
                    let target_name = self.ref_name(target, input, &self.label(i))?;
                    format!("{}{target_name}", kind.prefix())
                }
            },
        };
        Ok(self.names.finish(i, name))
    }

    fn ref_name(
        &mut self,
        r: &TypeRef,
        input: bool,
        referrer: &str,
    ) -> Result<String, RegistryError> {
        let target = r.resolve().cloned();
        match target {
            Some(TypeTarget::Scalar(s)) => Ok(s.name().to_owned()),
            Some(TypeTarget::Named(n)) => Ok(n),
            Some(TypeTarget::Class { class, kind }) => {
                let i = self.class_node(class, kind, input, r, referrer)?;
                self.name_of(i)
            }
            Some(TypeTarget::Created(id)) => {
                let i = self.created_node(id, r, referrer)?;
                self.name_of(i)
            }
            None => Err(unresolvable(r, referrer)),
        }
    }

    /// Diagnostic label for a node whose name may not be known yet.
    fn label(&self, i: usize) -> String {
        if let Some(Some(name)) = self.names.value.get(i) {
            return name.clone();
        }
        match &self.nodes[i] {
            Source::Class { class, params } => format!("{class} ({})", params.kind),
            Source::Created(c) => c.id.to_string(),
        }
    }

    // ================= reference resolution =================

    fn class_node(
        &self,
        class: ClassId,
        kind: Option<TypeKind>,
        input: bool,
        r: &TypeRef,
        referrer: &str,
    ) -> Result<usize, RegistryError> {
        let decls = self
            .by_class
            .get(&class)
            .ok_or_else(|| unresolvable(r, referrer))?;
        let kind_of = |i: usize| match &self.nodes[i] {
            Source::Class { params, .. } => Some(params.kind),
            Source::Created(_) => None,
        };
        if let Some(kind) = kind {
            return decls
                .iter()
                .copied()
                .find(|&i| kind_of(i) == Some(kind))
                .ok_or_else(|| unresolvable(r, referrer));
        }
        let preference: &[TypeKind] = if input {
            &INPUT_PREFERENCE
        } else {
            &OUTPUT_PREFERENCE
        };
        preference
            .iter()
            .find_map(|k| decls.iter().copied().find(|&i| kind_of(i) == Some(*k)))
            .ok_or_else(|| unresolvable(r, referrer))
    }

    fn created_node(
        &self,
        id: CreatedTypeId,
        r: &TypeRef,
        referrer: &str,
    ) -> Result<usize, RegistryError> {
        self.by_created
            .get(&id)
            .copied()
            .ok_or_else(|| unresolvable(r, referrer))
    }

    fn resolve(
        &self,
        r: &TypeRef,
        input: bool,
        referrer: &str,
    ) -> Result<Resolved, RegistryError> {
        match r.resolve() {
            Some(TypeTarget::Scalar(s)) => Ok(Resolved::Scalar(*s)),
            Some(TypeTarget::Named(n)) => self
                .by_name
                .get(n)
                .map(|&i| Resolved::Node(i))
                .ok_or_else(|| unresolvable(r, referrer)),
            Some(TypeTarget::Class { class, kind }) => self
                .class_node(*class, *kind, input, r, referrer)
                .map(Resolved::Node),
            Some(TypeTarget::Created(id)) => {
                self.created_node(*id, r, referrer).map(Resolved::Node)
            }
            None => Err(unresolvable(r, referrer)),
        }
    }

    fn resolve_node(
        &self,
        r: &TypeRef,
        input: bool,
        referrer: &str,
    ) -> Result<usize, RegistryError> {
        match self.resolve(r, input, referrer)? {
            Resolved::Node(i) => Ok(i),
            Resolved::Scalar(_) => Err(unresolvable(r, referrer)),
        }
    }

    fn name(&self, i: usize) -> String {
        self.label(i)
    }

    fn field_type(
        &self,
        params: &FieldParams,
        input: bool,
        referrer: &str,
    ) -> Result<FieldType, RegistryError> {
        let name = match self.resolve(&params.ty, input, referrer)? {
            Resolved::Scalar(s) => s.name().to_owned(),
            Resolved::Node(i) => self.name(i),
        };
        Ok(FieldType {
            name,
            nullable: params.nullable,
            list: params.list,
        })
    }

    // ================= kinds =================

    fn kind_of(&mut self, i: usize) -> Result<TypeKind, RegistryError> {
        match self.kinds.enter(i) {
            Ok(Some(kind)) => return Ok(kind),
            Ok(None) => {}
            Err(()) => return Err(RegistryError::TypeCycle { name: self.name(i) }),
        }
        let kind = match self.nodes[i] {
            Source::Class { params, .. } => params.kind,
            Source::Created(created) => match (created.kind, &created.def) {
                (Some(k), _) => k,
                (None, CreatedDef::Enum { .. }) => TypeKind::Enum,
                (None, CreatedDef::Union { .. }) => TypeKind::Union,
                (None, CreatedDef::Transform { target, .. }) => {
                    let t = self.resolve_node(target, false, &self.name(i))?;
                    let kind = self.kind_of(t)?;
                    if !kind.has_fields() {
                        return Err(RegistryError::InvalidTransformTarget {
                            name: self.name(i),
                            source_type: self.name(t),
                            kind,
                        });
                    }
                    kind
                }
            },
        };
        Ok(self.kinds.finish(i, kind))
    }

    // ================= fields =================

    fn fields_of(&mut self, i: usize) -> Result<Vec<FieldDefinition>, RegistryError> {
        match self.fields.enter(i) {
            Ok(Some(fields)) => return Ok(fields),
            Ok(None) => {}
            Err(()) => return Err(RegistryError::TypeCycle { name: self.name(i) }),
        }
        let kind = self.kind_of(i)?;
        let input = kind == TypeKind::Input;
        let type_name = self.name(i);

        let fields = match self.nodes[i] {
            _ if !kind.has_fields() => Vec::new(),
            Source::Class { class, params } => {
                let mut fields = match &params.extends {
                    Some(parent) => {
                        let p = self.resolve_node(parent, input, &type_name)?;
                        self.fields_of(p)?
                    }
                    None => Vec::new(),
                };

                let own = self.class_fields.get(&class).cloned().unwrap_or_default();
                for (key, fp) in own {
                    let name = fp.name.clone().unwrap_or_else(|| key.to_owned());
                    let def = FieldDefinition {
                        ty: self.field_type(fp, input, &format!("{type_name}.{name}"))?,
                        args: Vec::new(),
                        name,
                        description: fp.description.clone(),
                        deprecation: fp.deprecation.clone(),
                    };
                    merge_field(&mut fields, def);
                }

                let computed = self.resolver_targets.get(&i).cloned().unwrap_or_default();
                for r in computed {
                    let (_, key, params) = self.field_resolvers[r];
                    let name = resolver_field_name(key, params);
                    let referrer = format!("{type_name}.{name}");
                    let def = FieldDefinition {
                        ty: self.field_type(&params.output, false, &referrer)?,
                        args: self.args(&params.args, &referrer)?,
                        name,
                        description: params.output.description.clone(),
                        deprecation: params.output.deprecation.clone(),
                    };
                    merge_field(&mut fields, def);
                }

                for iface in &params.implements {
                    let n = self.resolve_node(iface, false, &type_name)?;
                    for f in self.fields_of(n)? {
                        if !fields.iter().any(|own| own.name == f.name) {
                            fields.push(f);
                        }
                    }
                }
                fields
            }
            Source::Created(created) => match &created.def {
                CreatedDef::Transform { kind: t, target } => {
                    let source = self.resolve_node(target, input, &type_name)?;
                    let nullable = t.nullable();
                    let source_kind = self.kind_of(source)?;
                    if !source_kind.has_fields() {
                        return Err(RegistryError::InvalidTransformTarget {
                            name: type_name,
                            source_type: self.name(source),
                            kind: source_kind,
                        });
                    }
                    self.fields_of(source)?
                        .into_iter()
                        .map(|mut f| {
                            f.ty.nullable = nullable;
                            f
                        })
                        .collect()
                }
                _ => Vec::new(),
            },
        };
        Ok(self.fields.finish(i, fields))
    }

    // ================= enum values =================

    fn values_of(&mut self, i: usize) -> Result<Vec<EnumValueDefinition>, RegistryError> {
        match self.values.enter(i) {
            Ok(Some(values)) => return Ok(values),
            Ok(None) => {}
            Err(()) => return Err(RegistryError::TypeCycle { name: self.name(i) }),
        }
        let type_name = self.name(i);
        let (mut values, extends) = match self.nodes[i] {
            Source::Class { class, params } => {
                let own = self
                    .class_values
                    .get(&class)
                    .map(|vs| {
                        vs.iter()
                            .map(|(key, p)| EnumValueDefinition {
                                name: (*key).to_owned(),
                                value: p
                                    .value
                                    .clone()
                                    .unwrap_or_else(|| Value::String((*key).to_owned())),
                                description: p.description.clone(),
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                (own, params.extends.clone())
            }
            Source::Created(created) => match &created.def {
                CreatedDef::Enum { values, extends } => (
                    values
                        .iter()
                        .map(|(k, v)| EnumValueDefinition {
                            name: k.clone(),
                            value: v.clone(),
                            description: None,
                        })
                        .collect(),
                    extends.clone(),
                ),
                _ => (Vec::new(), None),
            },
        };

        if let Some(parent) = extends {
            let p = self.resolve_node(&parent, false, &type_name)?;
            for v in self.values_of(p)? {
                if !values.iter().any(|own| own.name == v.name) {
                    values.push(v);
                }
            }
        }
        Ok(self.values.finish(i, values))
    }

    // ================= assembly =================

    fn definition(&mut self, i: usize) -> Result<TypeDefinition, RegistryError> {
        let kind = self.kind_of(i)?;
        let name = self.name(i);
        let fields = self.fields_of(i)?;
        let enum_values = if kind == TypeKind::Enum {
            self.values_of(i)?
        } else {
            Vec::new()
        };

        let (description, interfaces, union_members, transformation) = match self.nodes[i] {
            Source::Class { params, .. } => {
                let mut interfaces = Vec::new();
                for r in &params.implements {
                    let n = self.resolve_node(r, false, &name)?;
                    interfaces.push(self.name(n));
                }
                let mut members = Vec::new();
                for r in &params.members {
                    let n = self.resolve_node(r, false, &name)?;
                    members.push(self.name(n));
                }
                (params.description.clone(), interfaces, members, None)
            }
            Source::Created(created) => {
                let mut members = Vec::new();
                let mut transformation = None;
                match &created.def {
                    CreatedDef::Union { members: refs } => {
                        for r in refs {
                            let n = self.resolve_node(r, false, &name)?;
                            members.push(self.name(n));
                        }
                    }
                    CreatedDef::Transform { kind: t, target } => {
                        let source = self.resolve_node(target, kind == TypeKind::Input, &name)?;
                        transformation = Some(Transformation {
                            kind: *t,
                            source: self.name(source),
                            nullable: t.nullable(),
                        });
                    }
                    CreatedDef::Enum { .. } => {}
                }
                (created.description.clone(), Vec::new(), members, transformation)
            }
        };

        tracing::debug!(name = %name, kind = %kind, fields = fields.len(), "Type assembled");
        Ok(TypeDefinition {
            name,
            kind,
            description,
            fields,
            interfaces,
            enum_values,
            union_members,
            transformation,
        })
    }

    fn args(
        &self,
        args: &[(String, FieldParams)],
        referrer: &str,
    ) -> Result<Vec<FieldDefinition>, RegistryError> {
        let mut out = Vec::with_capacity(args.len());
        for (arg, fp) in args {
            out.push(FieldDefinition {
                name: arg.clone(),
                ty: self.field_type(fp, true, &format!("{referrer}({arg})"))?,
                args: Vec::new(),
                description: fp.description.clone(),
                deprecation: None,
            });
        }
        Ok(out)
    }

    // ================= field resolvers =================

    /// Resolves every field resolver's target node; targets must carry output fields.
    fn index_field_resolvers(&mut self) -> Result<(), RegistryError> {
        for r in 0..self.field_resolvers.len() {
            let (owner, key, params) = self.field_resolvers[r];
            let referrer = format!("{owner}.{key}");
            let target = self.resolve_node(&params.target, false, &referrer)?;
            let kind = self.kind_of(target)?;
            if !matches!(kind, TypeKind::Object | TypeKind::Interface) {
                return Err(RegistryError::InvalidFieldResolverTarget {
                    field: referrer,
                    target: self.name(target),
                    kind,
                });
            }
            self.resolver_targets.entry(target).or_default().push(r);
        }
        Ok(())
    }

    /// Field resolvers declared on `i` or any type it extends, nearest first.
    fn inherited_resolvers(&self, i: usize) -> Result<Vec<usize>, RegistryError> {
        let mut out = Vec::new();
        let mut current = Some(i);
        while let Some(n) = current {
            if let Some(rs) = self.resolver_targets.get(&n) {
                out.extend(rs.iter().copied());
            }
            current = match self.nodes[n] {
                Source::Class { params, .. } => match &params.extends {
                    Some(parent) => Some(self.resolve_node(parent, false, &self.name(n))?),
                    None => None,
                },
                Source::Created(_) => None,
            };
        }
        Ok(out)
    }

    /// Binds each field resolver once, then exposes it under its target type
    /// and every object or interface type that inherits the field.
    fn bind_field_resolvers(
        &mut self,
        services: &ServiceRegistry,
        index: &MiddlewareIndex,
    ) -> Result<HashMap<(String, String), FieldResolver>, RegistryError> {
        let mut bound: HashMap<usize, FieldResolver> = HashMap::new();
        for (&target, rs) in &self.resolver_targets {
            for &r in rs {
                let (owner, key, params) = self.field_resolvers[r];
                let declared_on = self.name(target);
                let field = resolver_field_name(key, params);
                let path = format!("{declared_on}.{field}");
                let instance = services.instance_of(owner)?;
                let resolver = params
                    .resolver
                    .bind(Arc::clone(instance))
                    .ok_or(RegistryError::ServiceTypeMismatch { class: owner })?;
                let wrapping = index.split(params.middlewares.iter())?;
                bound.insert(
                    r,
                    FieldResolver {
                        declared_on,
                        field,
                        owner,
                        resolver: ResolverChain::new(path, resolver, wrapping),
                    },
                );
            }
        }

        let mut computed = HashMap::new();
        for i in 0..self.nodes.len() {
            if !matches!(self.kind_of(i)?, TypeKind::Object | TypeKind::Interface) {
                continue;
            }
            let type_name = self.name(i);
            for r in self.inherited_resolvers(i)? {
                let Some(fr) = bound.get(&r) else { continue };
                computed
                    .entry((type_name.clone(), fr.field.clone()))
                    .or_insert_with(|| fr.clone());
            }
        }
        Ok(computed)
    }

    fn root_fields(
        &self,
        services: &ServiceRegistry,
        index: &MiddlewareIndex,
    ) -> Result<HashMap<RootOperation, Vec<RootField>>, RegistryError> {
        let mut roots: HashMap<RootOperation, Vec<RootField>> = HashMap::new();
        let mut seen: HashSet<(RootOperation, String)> = HashSet::new();

        for (owner, key, params) in &self.root_fields {
            let name = params.name.clone().unwrap_or_else(|| (*key).to_owned());
            let referrer = format!("{}.{name}", params.operation);
            if !seen.insert((params.operation, name.clone())) {
                return Err(RegistryError::DuplicateTypeName { name: referrer });
            }

            let args = self.args(&params.args, &referrer)?;
            let instance = services.instance_of(*owner)?;
            let resolver = params
                .resolver
                .bind(Arc::clone(instance))
                .ok_or(RegistryError::ServiceTypeMismatch { class: *owner })?;
            let wrapping = index.split(params.middlewares.iter())?;

            roots.entry(params.operation).or_default().push(RootField {
                ty: self.field_type(&params.output, false, &referrer)?,
                name,
                owner: *owner,
                args,
                description: params.description.clone(),
                resolver: ResolverChain::new(referrer, resolver, wrapping),
            });
        }
        Ok(roots)
    }
}

const INPUT_PREFERENCE: [TypeKind; 5] = [
    TypeKind::Input,
    TypeKind::Enum,
    TypeKind::Object,
    TypeKind::Interface,
    TypeKind::Union,
];

const OUTPUT_PREFERENCE: [TypeKind; 5] = [
    TypeKind::Object,
    TypeKind::Interface,
    TypeKind::Enum,
    TypeKind::Union,
    TypeKind::Input,
];

fn merge_field(fields: &mut Vec<FieldDefinition>, def: FieldDefinition) {
    match fields.iter_mut().find(|f| f.name == def.name) {
        Some(existing) => *existing = def,
        None => fields.push(def),
    }
}

fn resolver_field_name(key: &str, params: &FieldResolverParams) -> String {
    params
        .name
        .clone()
        .or_else(|| params.output.name.clone())
        .unwrap_or_else(|| key.to_owned())
}

fn unresolvable(r: &TypeRef, referrer: &str) -> RegistryError {
    RegistryError::UnresolvableTypeReference {
        reference: r.label().to_owned(),
        referrer: referrer.to_owned(),
    }
}
