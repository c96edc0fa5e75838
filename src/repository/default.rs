//! Repository implementation shared by every entity kind.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::entity::Entity;
use crate::events::{
    BeforeEntityCreated, BeforeEntityDeleted, BeforeEntityUpdated, EntityEvent, Listener, Signal,
};
use crate::repository::{Repository, RepositoryError};
use crate::storage::{Datastore, Query};

/// Generic repository bound to one kind of a [`Datastore`].
pub struct DefaultRepository<E> {
    store: Arc<dyn Datastore>,
    kind: String,
    signal: Signal<E>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> DefaultRepository<E> {
    /// Repository with the built-in create/update/delete listeners.
    pub fn new(store: Arc<dyn Datastore>, kind: impl Into<String>) -> Self {
        Self::with_listeners(store, kind, Vec::new())
    }

    /// Repository with the built-in listeners followed by `listeners`.
    pub fn with_listeners(
        store: Arc<dyn Datastore>,
        kind: impl Into<String>,
        listeners: Vec<Arc<dyn Listener<E>>>,
    ) -> Self {
        let mut signal = Signal::new();
        signal.add(Arc::new(BeforeEntityCreated));
        signal.add(Arc::new(BeforeEntityUpdated));
        signal.add(Arc::new(BeforeEntityDeleted));
        for listener in listeners {
            signal.add(listener);
        }
        Self {
            store,
            kind: kind.into(),
            signal,
            _marker: PhantomData,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn signal(&self) -> &Signal<E> {
        &self.signal
    }

    fn decode(&self, id: i64, document: Value) -> Result<E, RepositoryError> {
        let mut entity: E = serde_json::from_value(document)?;
        entity.set_id(id);
        Ok(entity)
    }

    fn load(&self, id: i64) -> Result<E, RepositoryError> {
        match self.store.get(&self.kind, id)? {
            Some(document) => self.decode(id, document),
            None => Err(RepositoryError::NotFound {
                kind: self.kind.clone(),
                id,
            }),
        }
    }

    fn decode_all(&self, rows: Vec<(i64, Value)>) -> Result<Vec<E>, RepositoryError> {
        let mut entities = Vec::with_capacity(rows.len());
        for (id, document) in rows {
            entities.push(self.decode(id, document)?);
        }
        Ok(entities)
    }
}

impl<E: Entity> Repository<E> for DefaultRepository<E> {
    fn create(&self, entity: &mut E) -> Result<(), RepositoryError> {
        let id = self.store.allocate_id(&self.kind)?;
        entity.set_id(id);
        self.signal.dispatch(&mut EntityEvent::BeforeCreated(&mut *entity))?;
        self.store.put(&self.kind, id, serde_json::to_value(&*entity)?)?;
        tracing::debug!(kind = %self.kind, id, "entity created");
        Ok(())
    }

    fn update(&self, entity: &mut E) -> Result<(), RepositoryError> {
        let old = self.load(entity.id())?;
        self.signal
            .dispatch(&mut EntityEvent::BeforeUpdated { old: &old, new: &mut *entity })?;
        self.store
            .put(&self.kind, old.id(), serde_json::to_value(&*entity)?)?;
        tracing::debug!(kind = %self.kind, id = old.id(), "entity updated");
        Ok(())
    }

    fn delete(&self, entity: &E) -> Result<(), RepositoryError> {
        self.signal.dispatch(&mut EntityEvent::BeforeDeleted(entity))?;
        if !self.store.delete(&self.kind, entity.id())? {
            return Err(RepositoryError::NotFound {
                kind: self.kind.clone(),
                id: entity.id(),
            });
        }
        tracing::debug!(kind = %self.kind, id = entity.id(), "entity deleted");
        Ok(())
    }

    fn find_by_id(&self, id: i64) -> Result<E, RepositoryError> {
        self.load(id)
    }

    fn find_all(&self) -> Result<Vec<E>, RepositoryError> {
        self.find_by(&Query::new())
    }

    fn find_by(&self, query: &Query) -> Result<Vec<E>, RepositoryError> {
        let rows = self.store.query(&self.kind, query)?;
        self.decode_all(rows)
    }

    fn count(&self, query: &Query) -> Result<usize, RepositoryError> {
        Ok(self.store.count(&self.kind, query)?)
    }
}

impl<E> fmt::Debug for DefaultRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRepository")
            .field("kind", &self.kind)
            .field("signal", &self.signal)
            .finish()
    }
}
