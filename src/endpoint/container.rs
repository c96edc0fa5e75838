//! Request container specialised for one entity endpoint.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::endpoint::{EndpointError, Resource};
use crate::entity::Entity;
use crate::events::Signal;
use crate::repository::Repository;
use crate::routing::{BodyError, Container, ContainerError};

/// A [`Container`] plus the repository, prototype and signal of the
/// endpoint that matched.
pub struct EndPointContainer<E: Entity> {
    container: Container,
    resource: Arc<Resource<E>>,
    repository: OnceLock<Box<dyn Repository<E>>>,
}

impl<E: Entity> EndPointContainer<E> {
    /// Wrap `container`; fails with a 500 response when the endpoint
    /// middleware did not run.
    pub fn new(container: Container) -> Result<Self, Response> {
        let resource = container.extensions().get::<Arc<Resource<E>>>().cloned();
        match resource {
            Some(resource) => Ok(Self {
                container,
                resource,
                repository: OnceLock::new(),
            }),
            None => Err(container.error(
                ContainerError::Missing("entity resource"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )),
        }
    }

    pub fn kind(&self) -> &str {
        self.resource.kind()
    }

    /// Repository for this request, built on first use.
    pub fn repository(&self) -> Result<&dyn Repository<E>, ContainerError> {
        if let Some(repository) = self.repository.get() {
            return Ok(repository.as_ref());
        }
        let store = self.container.store()?;
        let repository = self
            .repository
            .get_or_init(|| self.resource.repository(store));
        Ok(repository.as_ref())
    }

    /// A blank entity that request bodies are decoded onto.
    pub fn prototype(&self) -> E {
        E::default()
    }

    pub fn signal(&self) -> &Signal<E> {
        self.resource.signal()
    }

    /// Decode the JSON body over [`prototype`](Self::prototype): fields the
    /// body omits keep their prototype values.
    pub async fn decode_entity(&mut self) -> Result<E, BodyError> {
        let body: Value = self.container.read_json().await?;
        let merged = match (serde_json::to_value(self.prototype())?, body) {
            (Value::Object(mut base), Value::Object(fields)) => {
                base.extend(fields);
                Value::Object(base)
            }
            (_, other) => other,
        };
        Ok(serde_json::from_value(merged)?)
    }

    /// The `:id` path variable as an entity identifier.
    pub fn id(&self) -> Result<i64, EndpointError> {
        let raw = self.container.route_var("id").unwrap_or_default();
        raw.parse()
            .map_err(|_| EndpointError::InvalidId(raw.to_string()))
    }
}

impl<E: Entity> Deref for EndPointContainer<E> {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl<E: Entity> DerefMut for EndPointContainer<E> {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}
