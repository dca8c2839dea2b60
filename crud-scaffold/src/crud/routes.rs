//! HTTP verbs for a [`CrudController`]

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::{CrudController, EntityCapabilities};
use crate::entity::EntityId;
use crate::envelope::{ServiceResult, SuccessStatus};
use crate::mapper::{ApiResult, Location, UnhandledFailure};
use crate::store::EntitySet;

struct RouteState<S, C> {
    controller: CrudController<S, C>,
    shutdown: CancellationToken,
}

type Shared<S, C> = State<Arc<RouteState<S, C>>>;

/// Router exposing `controller` at `/` and `/{id}`
///
/// Every request runs under a child of `shutdown`, so cancelling it aborts
/// in-flight operations at their next store call. Mount the router with
/// `Router::nest` and wrap the application with
/// [`FailureBoundary::install`](crate::mapper::FailureBoundary::install) so
/// failures are rendered as envelopes.
///
/// Bodies are the full `{ isSuccess, result | errorResult }` envelope, except
/// for `204`, which has none.
///
/// | Verb | Path | Success |
/// |------|------|---------|
/// | GET | `/` | 200 list, or 204 when empty |
/// | POST | `/` | 201 with `Location` |
/// | GET | `/{id}` | 200, or 204 when unknown |
/// | PUT | `/{id}` | 200 |
/// | DELETE | `/{id}` | 204 |
pub fn crud_router<S, C>(controller: CrudController<S, C>, shutdown: CancellationToken) -> Router
where
    C: EntityCapabilities,
    C::Create: DeserializeOwned,
    C::Update: DeserializeOwned,
    C::Filter: DeserializeOwned,
    S: EntitySet<C::Entity> + 'static,
{
    let state = Arc::new(RouteState {
        controller,
        shutdown,
    });

    Router::new()
        .route("/", get(list::<S, C>).post(create::<S, C>))
        .route(
            "/{id}",
            get(fetch::<S, C>).put(update::<S, C>).delete(remove::<S, C>),
        )
        .with_state(state)
}

async fn list<S, C>(
    State(state): Shared<S, C>,
    Query(filter): Query<C::Filter>,
) -> Result<ServiceResult<Vec<C::View>>, UnhandledFailure>
where
    C: EntityCapabilities,
    C::Filter: DeserializeOwned,
    S: EntitySet<C::Entity> + 'static,
{
    let cancel = state.shutdown.child_token();
    Ok(state.controller.list(&filter, &cancel).await?)
}

async fn fetch<S, C>(
    State(state): Shared<S, C>,
    Path(id): Path<EntityId>,
) -> Result<ServiceResult<C::View>, UnhandledFailure>
where
    C: EntityCapabilities,
    S: EntitySet<C::Entity> + 'static,
{
    let cancel = state.shutdown.child_token();
    Ok(state.controller.get(id, &cancel).await?)
}

async fn create<S, C>(
    State(state): Shared<S, C>,
    OriginalUri(uri): OriginalUri,
    Json(request): Json<C::Create>,
) -> Result<ApiResult<C::View>, UnhandledFailure>
where
    C: EntityCapabilities,
    C::Create: DeserializeOwned,
    S: EntitySet<C::Entity> + 'static,
{
    let cancel = state.shutdown.child_token();
    let (id, result) = state.controller.create_located(request, &cancel).await?;
    Ok(ApiResult::new(result.with_status(SuccessStatus::Created))
        .enveloped()
        .with_location(Location::route("{id}", [("id", id)]))
        .in_context(&uri))
}

async fn update<S, C>(
    State(state): Shared<S, C>,
    Path(id): Path<EntityId>,
    Json(request): Json<C::Update>,
) -> Result<ServiceResult<C::View>, UnhandledFailure>
where
    C: EntityCapabilities,
    C::Update: DeserializeOwned,
    S: EntitySet<C::Entity> + 'static,
{
    let cancel = state.shutdown.child_token();
    Ok(state.controller.update(id, request, &cancel).await?)
}

async fn remove<S, C>(
    State(state): Shared<S, C>,
    Path(id): Path<EntityId>,
) -> Result<ServiceResult, UnhandledFailure>
where
    C: EntityCapabilities,
    S: EntitySet<C::Entity> + 'static,
{
    let cancel = state.shutdown.child_token();
    Ok(state.controller.delete(id, &cancel).await?)
}
