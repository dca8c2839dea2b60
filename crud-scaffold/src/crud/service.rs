//! Generic CRUD service

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::{CrudError, EntityCapabilities};
use crate::entity::{Entity, EntityId, QueryFilter};
use crate::failure::DomainFailure;
use crate::store::{EntitySet, StoreResult};

/// Entity-agnostic get/list/create/update/delete workflow
///
/// Holds the store handle and the capability set and nothing else; every
/// operation is independent and safe to run concurrently. Consistency between
/// concurrent writers is left to the store.
#[derive(Debug)]
pub struct CrudService<S, C> {
    store: S,
    capabilities: C,
}

impl<S, C> CrudService<S, C>
where
    C: EntityCapabilities,
    S: EntitySet<C::Entity>,
{
    /// Create a service over the given store and capability set
    pub fn new(store: S, capabilities: C) -> Self {
        Self {
            store,
            capabilities,
        }
    }

    /// The underlying entity set
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The entity-specific capability set
    pub fn capabilities(&self) -> &C {
        &self.capabilities
    }

    /// Fetch a non-deleted entity by id
    ///
    /// Absence is `Ok(None)`, not an error.
    #[tracing::instrument(name = "crud.get_by_id", skip_all, fields(entity_id = id))]
    pub async fn get_by_id(
        &self,
        id: EntityId,
        cancel: &CancellationToken,
    ) -> Result<Option<C::Entity>, CrudError> {
        let active_with_id = move |entity: &C::Entity| !entity.is_deleted() && entity.id() == id;
        store_call(cancel, self.store.find_one(&active_with_id)).await
    }

    /// List non-deleted entities selected by `filter`
    #[tracing::instrument(name = "crud.list", skip_all)]
    pub async fn list(
        &self,
        filter: &C::Filter,
        cancel: &CancellationToken,
    ) -> Result<Vec<C::Entity>, CrudError> {
        if filter.is_pass_through() {
            tracing::debug!("Listing without an entity-specific filter");
        }

        let rows = store_call(cancel, self.store.find_all()).await?;
        Ok(rows
            .into_iter()
            .filter(|entity| !entity.is_deleted() && filter.matches(entity))
            .collect())
    }

    /// Create an entity and return it as stored
    #[tracing::instrument(name = "crud.create", skip_all)]
    pub async fn create(
        &self,
        request: C::Create,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CrudError> {
        ensure_active(cancel)?;
        let mut entity = self.capabilities.before_create(request, cancel).await?;

        ensure_active(cancel)?;
        let id = store_call(cancel, self.store.add(entity.clone())).await?;
        self.commit(id, cancel).await?;
        entity.record_mut().id = id;

        ensure_active(cancel)?;
        self.capabilities.after_create(&entity, cancel).await?;

        tracing::debug!(entity_id = id, "Entity created");
        self.refetch(id, cancel).await
    }

    /// Apply `request` to an existing entity and return it as stored
    ///
    /// A missing or soft-deleted id raises `NotFound` without running any hook.
    #[tracing::instrument(name = "crud.update", skip_all, fields(entity_id = id))]
    pub async fn update(
        &self,
        id: EntityId,
        request: C::Update,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CrudError> {
        let mut entity = self.require(id, cancel).await?;
        self.capabilities
            .before_update(&mut entity, request, cancel)
            .await?;

        self.stage_update(id, entity.clone(), cancel).await?;
        self.commit(id, cancel).await?;

        ensure_active(cancel)?;
        self.capabilities.after_update(&entity, cancel).await?;

        self.refetch(id, cancel).await
    }

    /// Soft-delete an entity
    ///
    /// The record is kept with its delete flag set, so it disappears from
    /// [`get_by_id`](Self::get_by_id) and [`list`](Self::list).
    #[tracing::instrument(name = "crud.delete", skip_all, fields(entity_id = id))]
    pub async fn delete(&self, id: EntityId, cancel: &CancellationToken) -> Result<(), CrudError> {
        let mut entity = self.require(id, cancel).await?;
        self.capabilities.before_delete(&mut entity, cancel).await?;
        entity.record_mut().mark_deleted();

        self.stage_update(id, entity.clone(), cancel).await?;
        self.commit(id, cancel).await?;

        ensure_active(cancel)?;
        self.capabilities.after_delete(&entity, cancel).await?;

        tracing::debug!("Entity soft-deleted");
        Ok(())
    }

    async fn stage_update(
        &self,
        id: EntityId,
        entity: C::Entity,
        cancel: &CancellationToken,
    ) -> Result<(), CrudError> {
        ensure_active(cancel)?;
        if let Err(err) = store_call(cancel, self.store.update(entity)).await {
            self.discard(id).await;
            return Err(err);
        }
        Ok(())
    }

    /// Save, dropping the changes staged for `id` if the save fails or is cancelled
    async fn commit(&self, id: EntityId, cancel: &CancellationToken) -> Result<(), CrudError> {
        if let Err(err) = store_call(cancel, self.store.save()).await {
            self.discard(id).await;
            return Err(err);
        }
        Ok(())
    }

    async fn discard(&self, id: EntityId) {
        if let Err(err) = self.store.discard(id).await {
            tracing::warn!(
                entity_id = id,
                operation = %err.operation,
                kind = %err.kind,
                "Failed to discard staged changes: {}", err.message
            );
        }
    }

    async fn require(
        &self,
        id: EntityId,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CrudError> {
        self.get_by_id(id, cancel).await?.ok_or_else(|| {
            tracing::debug!(entity_id = id, "Entity not found");
            DomainFailure::not_found().into()
        })
    }

    async fn refetch(&self, id: EntityId, cancel: &CancellationToken) -> Result<C::Entity, CrudError> {
        self.get_by_id(id, cancel)
            .await?
            .ok_or_else(|| DomainFailure::not_found().into())
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), CrudError> {
    if cancel.is_cancelled() {
        tracing::debug!("CRUD operation cancelled");
        return Err(CrudError::Cancelled);
    }
    Ok(())
}

/// Race a store call against cancellation and wrap store errors as `Database`
async fn store_call<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = StoreResult<T>>,
) -> Result<T, CrudError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Store call cancelled");
            Err(CrudError::Cancelled)
        }
        result = call => result.map_err(|err| {
            tracing::error!(
                operation = %err.operation,
                kind = %err.kind,
                retriable = err.is_retriable(),
                "Store error: {}", err.message
            );
            DomainFailure::database(err).into()
        }),
    }
}
