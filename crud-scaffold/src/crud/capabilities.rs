//! Per-entity capability set
//!
//! The generic CRUD flow owns ordering, persistence and error wrapping. Every
//! entity-specific decision (building an entity from a request, applying a
//! patch, side effects, projecting to a view model) is delegated to one
//! [`EntityCapabilities`] implementation per entity type.

use std::future::Future;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::CrudError;
use crate::entity::{Entity, QueryFilter};
use crate::envelope::ServiceResult;

/// Hooks and projection for one entity type
///
/// The service guarantees `before_* -> persist -> after_*` ordering. `after_*`
/// hooks are skipped when the operation was cancelled or persistence failed.
///
/// # Example
///
/// ```rust,ignore
/// impl EntityCapabilities for WidgetCapabilities {
///     type Entity = Widget;
///     type Create = CreateWidget;
///     type Update = UpdateWidget;
///     type Filter = WidgetFilter;
///     type View = WidgetView;
///
///     async fn before_create(&self, request: CreateWidget, _cancel: &CancellationToken) -> Result<Widget, CrudError> {
///         if request.name.is_empty() {
///             return Err(DomainFailure::null().with_message("name is required").into());
///         }
///         Ok(Widget::new(request.name))
///     }
///     // ...
/// }
/// ```
pub trait EntityCapabilities: Send + Sync + 'static {
    /// Persisted entity type
    type Entity: Entity;
    /// Create request; never carries id or audit fields
    type Create: Send + 'static;
    /// Update request; never carries id or audit fields
    type Update: Send + 'static;
    /// List filter
    type Filter: QueryFilter<Self::Entity> + 'static;
    /// Client-facing projection
    type View: Serialize + Send + 'static;

    /// Validate a create request and build the entity to persist
    fn before_create(
        &self,
        request: Self::Create,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Self::Entity, CrudError>> + Send;

    /// Side effects after the entity was saved
    fn after_create(
        &self,
        entity: &Self::Entity,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), CrudError>> + Send;

    /// Apply an update request onto the stored entity
    fn before_update(
        &self,
        entity: &mut Self::Entity,
        request: Self::Update,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), CrudError>> + Send;

    /// Side effects after the change was saved
    fn after_update(
        &self,
        entity: &Self::Entity,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), CrudError>> + Send;

    /// Checks or changes before the entity is soft-deleted
    fn before_delete(
        &self,
        entity: &mut Self::Entity,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), CrudError>> + Send;

    /// Side effects after the soft delete was saved
    fn after_delete(
        &self,
        entity: &Self::Entity,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), CrudError>> + Send;

    /// Project one entity into its view model envelope
    fn to_view_model(
        &self,
        entity: Self::Entity,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ServiceResult<Self::View>, CrudError>> + Send;

    /// Project a non-empty list of entities
    ///
    /// The default projects each entity in order and stops at the first
    /// failed projection, returning its failure envelope.
    fn to_view_model_list(
        &self,
        entities: Vec<Self::Entity>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ServiceResult<Vec<Self::View>>, CrudError>> + Send {
        async move {
            let mut views = Vec::with_capacity(entities.len());
            for entity in entities {
                let projected = self.to_view_model(entity, cancel).await?;
                if !projected.is_success() {
                    return Ok(projected.map(|view| vec![view]));
                }
                if let Ok(success) = projected.into_result() {
                    views.extend(success.into_data());
                }
            }
            Ok(ServiceResult::ok(views))
        }
    }
}
