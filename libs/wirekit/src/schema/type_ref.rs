use std::fmt;
use std::sync::{Arc, OnceLock};

use super::types::{Scalar, TypeKind};
use crate::class::ClassId;

/// Identity of a type synthesised through `TypeCreator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatedTypeId(pub(crate) u32);

impl fmt::Display for CreatedTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created#{}", self.0)
    }
}

/// What a type reference points at once resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeTarget {
    Scalar(Scalar),
    /// A type by its final schema name.
    Named(String),
    /// A class-declared type; `kind` selects one representation when the class has several.
    Class {
        class: ClassId,
        kind: Option<TypeKind>,
    },
    Created(CreatedTypeId),
}

impl fmt::Display for TypeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTarget::Scalar(s) => f.write_str(s.name()),
            TypeTarget::Named(n) => write!(f, "'{n}'"),
            TypeTarget::Class {
                class,
                kind: Some(kind),
            } => write!(f, "{class} ({kind})"),
            TypeTarget::Class { class, kind: None } => write!(f, "{class}"),
            TypeTarget::Created(id) => write!(f, "{id}"),
        }
    }
}

type Resolver = Box<dyn Fn() -> Option<TypeTarget> + Send + Sync>;

struct Cell {
    label: String,
    resolver: Resolver,
    resolved: OnceLock<Option<TypeTarget>>,
}

/// Deferred reference to a type.
///
/// The resolver runs at most once, the first time the schema builder asks for
/// the target; clones share the cached result.
#[derive(Clone)]
pub struct TypeRef(Arc<Cell>);

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("label", &self.0.label)
            .field("resolved", &self.0.resolved.get())
            .finish()
    }
}

impl TypeRef {
    fn fixed(label: String, target: TypeTarget) -> Self {
        Self(Arc::new(Cell {
            label,
            resolver: Box::new(move || Some(target.clone())),
            resolved: OnceLock::new(),
        }))
    }

    pub fn scalar(s: Scalar) -> Self {
        Self::fixed(s.name().to_owned(), TypeTarget::Scalar(s))
    }

    pub fn string() -> Self {
        Self::scalar(Scalar::String)
    }

    pub fn int() -> Self {
        Self::scalar(Scalar::Int)
    }

    pub fn float() -> Self {
        Self::scalar(Scalar::Float)
    }

    pub fn boolean() -> Self {
        Self::scalar(Scalar::Boolean)
    }

    pub fn id() -> Self {
        Self::scalar(Scalar::Id)
    }

    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::fixed(format!("'{name}'"), TypeTarget::Named(name))
    }

    pub fn class<T: 'static>() -> Self {
        let class = ClassId::of::<T>();
        Self::fixed(class.to_string(), TypeTarget::Class { class, kind: None })
    }

    /// Selects one representation of a class declared with several kinds.
    pub fn class_as<T: 'static>(kind: TypeKind) -> Self {
        let class = ClassId::of::<T>();
        Self::fixed(
            format!("{class} ({kind})"),
            TypeTarget::Class {
                class,
                kind: Some(kind),
            },
        )
    }

    pub(crate) fn created(id: CreatedTypeId) -> Self {
        Self::fixed(id.to_string(), TypeTarget::Created(id))
    }

    /// Reference whose target is only known later; `None` makes the build fail.
    pub fn lazy<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Option<TypeTarget> + Send + Sync + 'static,
    {
        Self(Arc::new(Cell {
            label: label.into(),
            resolver: Box::new(f),
            resolved: OnceLock::new(),
        }))
    }

    pub fn resolve(&self) -> Option<&TypeTarget> {
        self.0.resolved.get_or_init(|| (self.0.resolver)()).as_ref()
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn lazy_resolver_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let r = TypeRef::lazy("later", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(TypeTarget::Named("Later".into()))
        });
        let copy = r.clone();
        assert_eq!(r.resolve(), Some(&TypeTarget::Named("Later".into())));
        assert_eq!(copy.resolve(), Some(&TypeTarget::Named("Later".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unresolvable_reference_yields_none() {
        let r = TypeRef::lazy("nothing", || None);
        assert!(r.resolve().is_none());
        assert_eq!(r.label(), "nothing");
    }
}
