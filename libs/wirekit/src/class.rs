//! Class identity used by directives, services and type references.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of an application type that carries directives.
///
/// Equality and hashing use only the `TypeId`; the name is kept for
/// diagnostics and for default schema type names.
#[derive(Clone, Copy)]
pub struct ClassId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ClassId {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name, e.g. `my_app::routers::UserRouter`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Last path segment without generic arguments, e.g. `UserRouter`.
    pub fn short_name(&self) -> &'static str {
        let base = self
            .type_name
            .split_once('<')
            .map_or(self.type_name, |(head, _)| head);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.type_name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Optional identifier distinguishing several services of the same class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ServiceId {
    Name(Cow<'static, str>),
    Number(i64),
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceId::Name(n) => f.write_str(n),
            ServiceId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&'static str> for ServiceId {
    fn from(value: &'static str) -> Self {
        ServiceId::Name(Cow::Borrowed(value))
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        ServiceId::Name(Cow::Owned(value))
    }
}

impl From<i64> for ServiceId {
    fn from(value: i64) -> Self {
        ServiceId::Number(value)
    }
}

/// Renders an optional id the way error messages expect it.
pub(crate) fn display_id(id: &Option<ServiceId>) -> String {
    match id {
        Some(id) => format!(" with id '{id}'"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        pub struct Inner;
        pub struct Generic<T>(pub T);
    }

    #[test]
    fn short_name_strips_path_and_generics() {
        assert_eq!(ClassId::of::<nested::Inner>().short_name(), "Inner");
        assert_eq!(
            ClassId::of::<nested::Generic<nested::Inner>>().short_name(),
            "Generic"
        );
    }

    #[test]
    fn equality_is_by_type() {
        assert_eq!(ClassId::of::<nested::Inner>(), ClassId::of::<nested::Inner>());
        assert_ne!(ClassId::of::<nested::Inner>(), ClassId::of::<u8>());
    }

    #[test]
    fn service_id_display() {
        assert_eq!(ServiceId::from("primary").to_string(), "primary");
        assert_eq!(ServiceId::from(7_i64).to_string(), "7");
        assert_eq!(display_id(&None), "");
        assert_eq!(display_id(&Some("a".into())), " with id 'a'");
    }
}
