use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::class::{ClassId, ServiceId};
use crate::error::RegistryError;

/// Type-erased singleton instance.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// One singleton managed by the container.
#[derive(Clone)]
pub struct Service {
    pub class: ClassId,
    pub id: Option<ServiceId>,
    pub instance: ServiceInstance,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("class", &self.class)
            .field("id", &self.id)
            .finish()
    }
}

impl Service {
    /// Typed view of the instance.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, RegistryError> {
        Arc::clone(&self.instance)
            .downcast::<T>()
            .map_err(|_| RegistryError::ServiceTypeMismatch { class: self.class })
    }
}

/// Holds exactly one instance per `(class, id)` in registration order.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<Service>,
    index: HashMap<(ClassId, Option<ServiceId>), usize>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .services
            .iter()
            .map(|s| match &s.id {
                Some(id) => format!("{}#{id}", s.class),
                None => s.class.to_string(),
            })
            .collect();
        f.debug_struct("ServiceRegistry")
            .field("services", &names)
            .finish()
    }
}

impl ServiceRegistry {
    pub fn register(&mut self, service: Service) -> Result<&Service, RegistryError> {
        let key = (service.class, service.id.clone());
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateService {
                class: service.class,
                id: service.id,
            });
        }
        tracing::debug!(class = %service.class, id = ?service.id, "Service registered");
        let pos = self.services.len();
        self.index.insert(key, pos);
        self.services.push(service);
        Ok(&self.services[pos])
    }

    /// Never creates anything: a missing service is a configuration defect of the caller.
    pub fn lookup(&self, class: ClassId, id: Option<&ServiceId>) -> Option<&Service> {
        self.index
            .get(&(class, id.cloned()))
            .map(|&pos| &self.services[pos])
    }

    /// Typed lookup for wiring framework-managed singletons into adjacent subsystems.
    pub fn get<T: Send + Sync + 'static>(&self, id: Option<&ServiceId>) -> Option<Arc<T>> {
        self.lookup(ClassId::of::<T>(), id)
            .and_then(|s| s.downcast::<T>().ok())
    }

    /// Instance lookup that reports the missing class as an error.
    pub(crate) fn instance_of(&self, class: ClassId) -> Result<&ServiceInstance, RegistryError> {
        self.lookup(class, None)
            .map(|s| &s.instance)
            .ok_or(RegistryError::UnregisteredService { class })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn clear(&mut self) {
        self.services.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Mailer {
        from: &'static str,
    }

    fn service<T: Send + Sync + 'static>(value: T, id: Option<ServiceId>) -> Service {
        Service {
            class: ClassId::of::<T>(),
            id,
            instance: Arc::new(value),
        }
    }

    #[test]
    fn duplicate_class_and_id_is_rejected() {
        let mut reg = ServiceRegistry::default();
        reg.register(service(Mailer::default(), None)).unwrap();
        reg.register(service(Mailer::default(), Some("backup".into())))
            .unwrap();

        let err = reg
            .register(service(Mailer::default(), Some("backup".into())))
            .unwrap_err();
        match err {
            RegistryError::DuplicateService { class, id } => {
                assert_eq!(class, ClassId::of::<Mailer>());
                assert_eq!(id, Some("backup".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn lookup_distinguishes_ids() {
        let mut reg = ServiceRegistry::default();
        reg.register(service(Mailer { from: "a" }, None)).unwrap();
        reg.register(service(Mailer { from: "b" }, Some(2_i64.into())))
            .unwrap();

        assert_eq!(reg.get::<Mailer>(None).unwrap().from, "a");
        assert_eq!(reg.get::<Mailer>(Some(&2_i64.into())).unwrap().from, "b");
        assert!(reg.get::<Mailer>(Some(&"c".into())).is_none());
    }

    #[test]
    fn lookup_never_creates() {
        let reg = ServiceRegistry::default();
        assert!(reg.lookup(ClassId::of::<Mailer>(), None).is_none());
        assert!(matches!(
            reg.instance_of(ClassId::of::<Mailer>()),
            Err(RegistryError::UnregisteredService { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn downcast_to_wrong_type_fails() {
        let s = service(Mailer::default(), None);
        assert!(matches!(
            s.downcast::<String>(),
            Err(RegistryError::ServiceTypeMismatch { .. })
        ));
    }
}
