//! The five CRUD handlers.
//!
//! Each handler runs its steps in order and answers with the status of the
//! first step that fails:
//!
//! ```text
//! index   find_all 500
//! get     id 400, find_by_id 500
//! post    body 400, create 500, AfterCreated 500          → 303 Location
//! put     id 400, find 404, body 400, BeforeUpdated 500,
//!         update 500, AfterUpdated 500                    → 200
//! delete  id 400, find 404, BeforeDeleted 500,
//!         delete 500, AfterDeleted 500                    → 200
//! ```

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;

use crate::endpoint::EndPointContainer;
use crate::entity::Entity;
use crate::events::EntityEvent;
use crate::repository::RepositoryError;
use crate::routing::matcher::join_paths;
use crate::routing::Container;

const BAD_REQUEST: StatusCode = StatusCode::BAD_REQUEST;
const SERVER_ERROR: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Turns a failed step into the error response for that step.
trait OrRespond<T> {
    fn or_respond(self, container: &Container, status: StatusCode) -> Result<T, Response>;
}

impl<T, Err: fmt::Display> OrRespond<T> for Result<T, Err> {
    fn or_respond(self, container: &Container, status: StatusCode) -> Result<T, Response> {
        self.map_err(|err| container.error(err, status))
    }
}

fn respond(result: Result<Response, Response>) -> Response {
    match result {
        Ok(response) | Err(response) => response,
    }
}

/// 404 for a missing record, 500 for anything else.
fn lookup_status(err: &RepositoryError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        SERVER_ERROR
    }
}

/// Lists every entity of the kind.
pub async fn index<E: Entity>(container: Container) -> Response {
    respond(try_index::<E>(container))
}

fn try_index<E: Entity>(container: Container) -> Result<Response, Response> {
    let ec = EndPointContainer::<E>::new(container)?;
    let repository = ec.repository().or_respond(&ec, SERVER_ERROR)?;
    let entities = repository.find_all().or_respond(&ec, SERVER_ERROR)?;
    Ok(Json(entities).into_response())
}

/// Fetches one entity by `:id`.
pub async fn get<E: Entity>(container: Container) -> Response {
    respond(try_get::<E>(container))
}

fn try_get<E: Entity>(container: Container) -> Result<Response, Response> {
    let ec = EndPointContainer::<E>::new(container)?;
    let id = ec.id().or_respond(&ec, BAD_REQUEST)?;
    let repository = ec.repository().or_respond(&ec, SERVER_ERROR)?;
    let entity = repository.find_by_id(id).or_respond(&ec, SERVER_ERROR)?;
    Ok(Json(entity).into_response())
}

/// Creates an entity from the body and redirects to it.
pub async fn post<E: Entity>(container: Container) -> Response {
    respond(try_post::<E>(container).await)
}

async fn try_post<E: Entity>(container: Container) -> Result<Response, Response> {
    let mut ec = EndPointContainer::<E>::new(container)?;
    let mut entity = ec.decode_entity().await.or_respond(&ec, BAD_REQUEST)?;

    let repository = ec.repository().or_respond(&ec, SERVER_ERROR)?;
    repository.create(&mut entity).or_respond(&ec, SERVER_ERROR)?;
    ec.signal()
        .dispatch(&mut EntityEvent::AfterCreated(&entity))
        .or_respond(&ec, SERVER_ERROR)?;

    tracing::info!(parent: ec.logger(), kind = ec.kind(), id = entity.id(), "entity created");
    let location = join_paths(ec.path(), &entity.id().to_string());
    Ok(Redirect::to(&location).into_response())
}

/// Replaces the entity at `:id` with the body.
pub async fn put<E: Entity>(container: Container) -> Response {
    respond(try_put::<E>(container).await)
}

async fn try_put<E: Entity>(container: Container) -> Result<Response, Response> {
    let mut ec = EndPointContainer::<E>::new(container)?;
    let id = ec.id().or_respond(&ec, BAD_REQUEST)?;
    let existing = {
        let repository = ec.repository().or_respond(&ec, SERVER_ERROR)?;
        match repository.find_by_id(id) {
            Ok(existing) => existing,
            Err(err) => return Err(ec.error(&err, lookup_status(&err))),
        }
    };
    let mut candidate = ec.decode_entity().await.or_respond(&ec, BAD_REQUEST)?;
    candidate.set_id(id);

    ec.signal()
        .dispatch(&mut EntityEvent::BeforeUpdated {
            old: &existing,
            new: &mut candidate,
        })
        .or_respond(&ec, SERVER_ERROR)?;
    let repository = ec.repository().or_respond(&ec, SERVER_ERROR)?;
    repository.update(&mut candidate).or_respond(&ec, SERVER_ERROR)?;
    ec.signal()
        .dispatch(&mut EntityEvent::AfterUpdated(&candidate))
        .or_respond(&ec, SERVER_ERROR)?;

    tracing::info!(parent: ec.logger(), kind = ec.kind(), id, "entity updated");
    Ok(StatusCode::OK.into_response())
}

/// Removes the entity at `:id`.
pub async fn delete<E: Entity>(container: Container) -> Response {
    respond(try_delete::<E>(container))
}

fn try_delete<E: Entity>(container: Container) -> Result<Response, Response> {
    let ec = EndPointContainer::<E>::new(container)?;
    let id = ec.id().or_respond(&ec, BAD_REQUEST)?;
    let repository = ec.repository().or_respond(&ec, SERVER_ERROR)?;
    let existing = match repository.find_by_id(id) {
        Ok(existing) => existing,
        Err(err) => return Err(ec.error(&err, lookup_status(&err))),
    };

    ec.signal()
        .dispatch(&mut EntityEvent::BeforeDeleted(&existing))
        .or_respond(&ec, SERVER_ERROR)?;
    repository.delete(&existing).or_respond(&ec, SERVER_ERROR)?;
    ec.signal()
        .dispatch(&mut EntityEvent::AfterDeleted(&existing))
        .or_respond(&ec, SERVER_ERROR)?;

    tracing::info!(parent: ec.logger(), kind = ec.kind(), id, "entity deleted");
    Ok(StatusCode::OK.into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request};

    use super::*;
    use crate::endpoint::EntityEndpoint;
    use crate::entity::fixtures::Full;
    use crate::events::{LifecycleError, Listener, ListenerFn};
    use crate::repository::{DefaultRepository, Repository};
    use crate::routing::{CompiledRouter, ContainerOptions, DefaultContainerFactory, Router, RouterOptions};
    use crate::storage::{Datastore, MemoryDatastore};

    const KIND: &str = "Items";

    /// Endpoint hook refusing every event called `event`.
    fn refuse(event: &'static str) -> Arc<dyn Listener<Full>> {
        Arc::new(ListenerFn(move |e: &mut EntityEvent<'_, Full>| -> Result<(), LifecycleError> {
            if e.name() == event {
                Err(LifecycleError::Rejected(format!("{} refused", event)))
            } else {
                Ok(())
            }
        }))
    }

    fn items(hook: Arc<dyn Listener<Full>>) -> (CompiledRouter, DefaultRepository<Full>) {
        let store: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
        let factory = DefaultContainerFactory::new(ContainerOptions {
            debug: true,
            ..Default::default()
        })
        .with_store(store.clone());
        let mut router = Router::with_options(RouterOptions {
            container_factory: Arc::new(factory),
            ..Default::default()
        });
        router.mount("/items", &EntityEndpoint::<Full>::new(KIND).with_listener(hook));
        (router.compile(), DefaultRepository::new(store, KIND))
    }

    async fn call(router: &CompiledRouter, method: Method, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        router.dispatch(request).await
    }

    async fn seed(router: &CompiledRouter) {
        let response = call(router, Method::POST, "/items", r#"{"Name":"a"}"#).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/items/1");
    }

    #[tokio::test]
    async fn test_failing_after_created_keeps_entity() {
        let (router, repository) = items(refuse("after_created"));
        let response = call(&router, Method::POST, "/items", r#"{"Name":"a"}"#).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(repository.find_by_id(1).unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_failing_before_updated_leaves_record() {
        let (router, repository) = items(refuse("before_updated"));
        seed(&router).await;

        let response = call(&router, Method::PUT, "/items/1", r#"{"Name":"b","Version":1}"#).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"before_updated refused");

        let stored = repository.find_by_id(1).unwrap();
        assert_eq!(stored.name, "a");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_failing_after_updated_keeps_update() {
        let (router, repository) = items(refuse("after_updated"));
        seed(&router).await;

        let response = call(&router, Method::PUT, "/items/1", r#"{"Name":"b","Version":1}"#).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let stored = repository.find_by_id(1).unwrap();
        assert_eq!(stored.name, "b");
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_failing_after_deleted_keeps_delete() {
        let (router, repository) = items(refuse("after_deleted"));
        seed(&router).await;

        let response = call(&router, Method::DELETE, "/items/1", "").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(repository.find_by_id(1).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_hooks_see_every_successful_step() {
        let (router, repository) = items(refuse("never"));
        seed(&router).await;

        let put = call(&router, Method::PUT, "/items/1", r#"{"Name":"b","Version":1}"#).await;
        assert_eq!(put.status(), StatusCode::OK);
        let delete = call(&router, Method::DELETE, "/items/1", "").await;
        assert_eq!(delete.status(), StatusCode::OK);
        assert!(repository.find_all().unwrap().is_empty());
    }
}
