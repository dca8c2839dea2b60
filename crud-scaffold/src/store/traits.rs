//! Entity-set accessor trait
//!
//! Uses RPITIT (Return Position Impl Trait In Traits) so implementations can be
//! written with plain `async fn`.

use std::future::Future;

use super::error::StoreError;
use crate::entity::{Entity, EntityId};

/// Result type for entity-set operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Borrowed row predicate handed to [`EntitySet::find_one`]
pub type Predicate<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// Unit-of-work access to one entity type's rows
///
/// `add` and `update` stage changes; nothing is visible to readers until
/// `save` commits them, and `discard` drops them. Rows are never physically
/// removed through this trait: deletion is an `update` that sets the
/// soft-delete flag.
///
/// # Example
///
/// ```rust,ignore
/// impl EntitySet<Widget> for PgWidgets {
///     async fn find_one(&self, predicate: Predicate<'_, Widget>) -> StoreResult<Option<Widget>> {
///         let rows = sqlx::query_as!(Widget, "SELECT * FROM widgets")
///             .fetch_all(&self.pool)
///             .await
///             .map_err(to_store_error)?;
///         Ok(rows.into_iter().find(|w| predicate(w)))
///     }
///     // ...
/// }
/// ```
pub trait EntitySet<E: Entity>: Send + Sync {
    /// First row satisfying `predicate`, including soft-deleted rows
    fn find_one(
        &self,
        predicate: Predicate<'_, E>,
    ) -> impl Future<Output = StoreResult<Option<E>>> + Send;

    /// Every row, including soft-deleted rows
    fn find_all(&self) -> impl Future<Output = StoreResult<Vec<E>>> + Send;

    /// Stage a new row and return the identifier the store assigned to it
    fn add(&self, entity: E) -> impl Future<Output = StoreResult<EntityId>> + Send;

    /// Stage a change to an existing row
    fn update(&self, entity: E) -> impl Future<Output = StoreResult<()>> + Send;

    /// Commit staged changes
    fn save(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Drop uncommitted changes staged for `id`
    ///
    /// Called when an operation fails or is cancelled between staging and
    /// `save`, so a later unrelated `save` cannot commit them.
    fn discard(&self, id: EntityId) -> impl Future<Output = StoreResult<()>> + Send;
}
