//! Host - owns one registry and the artifacts of its last build.
//!
//! Lifecycle: discover/register -> start (build once) -> serve -> stop (reset).

use std::sync::Arc;

use crate::class::ServiceId;
use crate::error::RegistryError;
use crate::registry::{Artifacts, BuildOptions, Registry};

#[derive(Debug)]
pub struct Host {
    registry: Registry,
    options: BuildOptions,
    artifacts: Option<Arc<Artifacts>>,
}

impl Host {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            registry: Registry::new(),
            options,
            artifacts: None,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Direct access for manual registration before `start`.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Pulls in every `directives!` registrator linked into the binary.
    pub fn discover(&mut self) -> Result<&mut Self, RegistryError> {
        self.registry.discover()?;
        Ok(self)
    }

    /// Builds the artifacts. Calling `start` again returns the same build.
    pub fn start(&mut self) -> Result<Arc<Artifacts>, RegistryError> {
        if let Some(artifacts) = &self.artifacts {
            return Ok(Arc::clone(artifacts));
        }
        let artifacts = Arc::new(self.registry.build_all(&self.options)?);
        tracing::info!(
            routes = artifacts.router.routes().len(),
            rest_endpoint = %artifacts.router.rest_endpoint(),
            "Host started"
        );
        self.artifacts = Some(Arc::clone(&artifacts));
        Ok(artifacts)
    }

    /// Drops the artifacts and resets the registry for a fresh registration round.
    pub fn stop(&mut self) {
        self.artifacts = None;
        self.registry.reset();
        tracing::info!("Host stopped");
    }

    pub fn artifacts(&self) -> Option<&Arc<Artifacts>> {
        self.artifacts.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.artifacts.is_some()
    }

    pub fn get_service<T: Send + Sync + 'static>(&self, id: Option<&ServiceId>) -> Option<Arc<T>> {
        match &self.artifacts {
            Some(a) => a.services.get::<T>(id),
            None => self.registry.get_service::<T>(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter;

    #[test]
    fn start_is_idempotent_and_stop_reopens() {
        let mut host = Host::new(BuildOptions::new("/api"));
        host.registry_mut().add_service::<Counter>().unwrap();

        let first = host.start().unwrap();
        let second = host.start().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(host.get_service::<Counter>(None).is_some());
        assert!(matches!(
            host.registry_mut().add_service::<Counter>(),
            Err(RegistryError::Closed)
        ));

        host.stop();
        assert!(!host.is_started());
        assert!(host.get_service::<Counter>(None).is_none());
        host.registry_mut().add_service::<Counter>().unwrap();
    }
}
