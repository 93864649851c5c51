use std::borrow::Cow;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use super::service::{ServiceInstance, ServiceRegistry};
use crate::class::{ClassId, ServiceId};
use crate::error::RegistryError;

/// Injectable field holding one service.
///
/// Empty until the container resolves injections during `build_all`.
pub struct Inject<T> {
    cell: ArcSwapOption<T>,
}

impl<T> Default for Inject<T> {
    fn default() -> Self {
        Self {
            cell: ArcSwapOption::empty(),
        }
    }
}

impl<T> std::fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("resolved", &self.cell.load().is_some())
            .finish()
    }
}

impl<T> Inject<T> {
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.load_full()
    }

    pub fn require(&self) -> anyhow::Result<Arc<T>> {
        self.get().ok_or_else(|| {
            anyhow::anyhow!(
                "dependency '{}' has not been injected",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.load().is_some()
    }

    pub(crate) fn set(&self, value: Arc<T>) {
        self.cell.store(Some(value));
    }
}

/// Injectable field holding every requested service in request order.
pub struct InjectMany<T> {
    cell: ArcSwap<Vec<Arc<T>>>,
}

impl<T> Default for InjectMany<T> {
    fn default() -> Self {
        Self {
            cell: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl<T> std::fmt::Debug for InjectMany<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectMany")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.cell.load().len())
            .finish()
    }
}

impl<T> InjectMany<T> {
    pub fn get(&self) -> Arc<Vec<Arc<T>>> {
        self.cell.load_full()
    }

    pub fn len(&self) -> usize {
        self.cell.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell.load().is_empty()
    }

    pub(crate) fn set(&self, values: Vec<Arc<T>>) {
        self.cell.store(Arc::new(values));
    }
}

type AssignFn =
    Arc<dyn Fn(&ServiceInstance, Vec<ServiceInstance>) -> Result<(), RegistryError> + Send + Sync>;

/// Declares that a field of `destination` receives instance(s) of `source`.
#[derive(Clone)]
pub struct InjectionRequest {
    pub destination: ClassId,
    pub key: Cow<'static, str>,
    pub source: ClassId,
    pub ids: Vec<Option<ServiceId>>,
    pub is_array: bool,
    assign: AssignFn,
}

impl std::fmt::Debug for InjectionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionRequest")
            .field("destination", &self.destination)
            .field("key", &self.key)
            .field("source", &self.source)
            .field("ids", &self.ids)
            .field("is_array", &self.is_array)
            .finish()
    }
}

fn downcast_all<S: Send + Sync + 'static>(
    source: ClassId,
    instances: Vec<ServiceInstance>,
) -> Result<Vec<Arc<S>>, RegistryError> {
    instances
        .into_iter()
        .map(|i| {
            i.downcast::<S>()
                .map_err(|_| RegistryError::ServiceTypeMismatch { class: source })
        })
        .collect()
}

/// Wraps a typed field assignment into the erased form stored on a request.
fn erase<D, F>(destination: ClassId, assign: F) -> AssignFn
where
    D: Send + Sync + 'static,
    F: Fn(&D, Vec<ServiceInstance>) -> Result<(), RegistryError> + Send + Sync + 'static,
{
    Arc::new(
        move |dest: &ServiceInstance, instances: Vec<ServiceInstance>| {
            let dest = Arc::clone(dest)
                .downcast::<D>()
                .map_err(|_| RegistryError::ServiceTypeMismatch { class: destination })?;
            assign(&dest, instances)
        },
    )
}

impl InjectionRequest {
    /// Single injection: the field receives the first resolved instance.
    pub fn single<D, S>(key: impl Into<Cow<'static, str>>, field: fn(&D) -> &Inject<S>) -> Self
    where
        D: Send + Sync + 'static,
        S: Send + Sync + 'static,
    {
        let destination = ClassId::of::<D>();
        let source = ClassId::of::<S>();
        Self {
            destination,
            key: key.into(),
            source,
            ids: vec![None],
            is_array: false,
            assign: erase::<D, _>(destination, move |dest: &D, instances| {
                if let Some(first) = downcast_all::<S>(source, instances)?.into_iter().next() {
                    field(dest).set(first);
                }
                Ok(())
            }),
        }
    }

    /// Array injection: the field receives all resolved instances in `ids` order.
    pub fn many<D, S>(
        key: impl Into<Cow<'static, str>>,
        field: fn(&D) -> &InjectMany<S>,
    ) -> Self
    where
        D: Send + Sync + 'static,
        S: Send + Sync + 'static,
    {
        let destination = ClassId::of::<D>();
        let source = ClassId::of::<S>();
        Self {
            destination,
            key: key.into(),
            source,
            ids: vec![None],
            is_array: true,
            assign: erase::<D, _>(destination, move |dest: &D, instances| {
                field(dest).set(downcast_all::<S>(source, instances)?);
                Ok(())
            }),
        }
    }

    /// Replaces the default `[None]` id list.
    pub fn ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = Option<ServiceId>>,
    {
        self.ids = ids.into_iter().collect();
        self
    }

    /// Shorthand for a single named id.
    pub fn id(self, id: impl Into<ServiceId>) -> Self {
        self.ids([Some(id.into())])
    }
}

/// Resolves every request against the registry and assigns the fields.
///
/// Fails on the first request whose destination or source is missing.
pub fn resolve_injections(
    services: &ServiceRegistry,
    requests: &[InjectionRequest],
) -> Result<(), RegistryError> {
    for req in requests {
        let dest = services
            .lookup(req.destination, None)
            .ok_or(RegistryError::UnregisteredService {
                class: req.destination,
            })?;

        let mut instances = Vec::with_capacity(req.ids.len());
        for id in &req.ids {
            let found = services.lookup(req.source, id.as_ref()).ok_or_else(|| {
                RegistryError::MissingDependency {
                    destination: req.destination,
                    key: req.key.to_string(),
                    source_class: req.source,
                    id: id.clone(),
                }
            })?;
            instances.push(Arc::clone(&found.instance));
        }

        (req.assign)(&dest.instance, instances)?;
        tracing::debug!(
            destination = %req.destination,
            key = %req.key,
            source = %req.source,
            count = req.ids.len(),
            "Injection resolved"
        );
    }
    tracing::info!(count = requests.len(), "Injections resolved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::service::Service;

    #[derive(Default)]
    struct Store {
        name: String,
    }

    #[derive(Default)]
    struct Router {
        store: Inject<Store>,
        stores: InjectMany<Store>,
    }

    fn put<T: Send + Sync + 'static>(reg: &mut ServiceRegistry, v: T, id: Option<ServiceId>) {
        reg.register(Service {
            class: ClassId::of::<T>(),
            id,
            instance: Arc::new(v),
        })
        .unwrap();
    }

    fn store(name: &str) -> Store {
        Store { name: name.into() }
    }

    #[test]
    fn single_injection_takes_first_of_several_ids() {
        let mut reg = ServiceRegistry::default();
        put(&mut reg, Router::default(), None);
        put(&mut reg, store("a"), Some("a".into()));
        put(&mut reg, store("b"), Some("b".into()));

        let req = InjectionRequest::single::<Router, Store>("store", |r| &r.store)
            .ids([Some("b".into()), Some("a".into())]);
        resolve_injections(&reg, &[req]).unwrap();

        let router = reg.get::<Router>(None).unwrap();
        assert_eq!(router.store.get().unwrap().name, "b");
    }

    #[test]
    fn array_injection_keeps_request_order() {
        let mut reg = ServiceRegistry::default();
        put(&mut reg, Router::default(), None);
        put(&mut reg, store("default"), None);
        put(&mut reg, store("a"), Some("a".into()));
        put(&mut reg, store("seven"), Some(7_i64.into()));

        let ids: Vec<Option<ServiceId>> = vec![Some(7_i64.into()), None, Some("a".into())];
        let req = InjectionRequest::many::<Router, Store>("stores", |r| &r.stores).ids(ids);
        resolve_injections(&reg, &[req]).unwrap();

        let router = reg.get::<Router>(None).unwrap();
        let names: Vec<String> = router.stores.get().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["seven", "default", "a"]);
    }

    #[test]
    fn missing_source_id_is_reported() {
        let mut reg = ServiceRegistry::default();
        put(&mut reg, Router::default(), None);
        put(&mut reg, store("a"), None);

        let req = InjectionRequest::single::<Router, Store>("store", |r| &r.store).id("missing");
        let err = resolve_injections(&reg, &[req]).unwrap_err();
        match err {
            RegistryError::MissingDependency {
                destination,
                key,
                source_class,
                id,
            } => {
                assert_eq!(destination, ClassId::of::<Router>());
                assert_eq!(key, "store");
                assert_eq!(source_class, ClassId::of::<Store>());
                assert_eq!(id, Some("missing".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unregistered_destination_is_reported() {
        let mut reg = ServiceRegistry::default();
        put(&mut reg, store("a"), None);

        let req = InjectionRequest::single::<Router, Store>("store", |r| &r.store);
        assert!(matches!(
            resolve_injections(&reg, &[req]),
            Err(RegistryError::UnregisteredService { .. })
        ));
    }

    #[test]
    fn unresolved_inject_reports_error() {
        let cell: Inject<Store> = Inject::default();
        assert!(!cell.is_resolved());
        assert!(cell.require().is_err());
    }
}
