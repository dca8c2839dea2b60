//! Widget entity and store doubles shared by the CRUD tests

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{CrudError, EntityCapabilities};
use crate::entity::{Entity, EntityId, QueryFilter, Record};
use crate::envelope::{ErrorModel, ServiceResult};
use crate::failure::DomainFailure;
use crate::store::{
    EntitySet, MemoryEntitySet, Predicate, StoreError, StoreOperation, StoreResult,
};

/// Name whose projection fails with a business error
pub const UNPROJECTABLE: &str = "unprojectable";

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub record: Record,
    pub name: String,
    pub quantity: u32,
}

impl Widget {
    pub fn new(name: &str, quantity: u32) -> Self {
        Self {
            record: Record::default(),
            name: name.to_string(),
            quantity,
        }
    }
}

impl Entity for Widget {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWidget {
    pub name: String,
    pub quantity: u32,
}

impl CreateWidget {
    pub fn new(name: &str, quantity: u32) -> Self {
        Self {
            name: name.to_string(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWidget {
    pub name: Option<String>,
    pub quantity: Option<u32>,
}

impl UpdateWidget {
    pub fn rename(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            quantity: None,
        }
    }
}

/// Substring match on the name; no constraint when empty
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WidgetFilter {
    pub name: Option<String>,
}

impl WidgetFilter {
    pub fn named(fragment: &str) -> Self {
        Self {
            name: Some(fragment.to_string()),
        }
    }
}

impl QueryFilter<Widget> for WidgetFilter {
    fn matches(&self, entity: &Widget) -> bool {
        self.name
            .as_deref()
            .map_or(true, |fragment| entity.name.contains(fragment))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetView {
    pub id: EntityId,
    pub name: String,
    pub quantity: u32,
}

/// Capability set that records every hook invocation
#[derive(Debug, Clone, Default)]
pub struct WidgetHooks {
    calls: Arc<Mutex<Vec<&'static str>>>,
    rejected: Arc<Mutex<Vec<String>>>,
}

impl WidgetHooks {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Make `before_create` refuse this name with `AlreadyExists`
    pub fn reject_name(&self, name: &str) {
        self.rejected.lock().unwrap().push(name.to_string());
    }

    fn record(&self, hook: &'static str) {
        self.calls.lock().unwrap().push(hook);
    }
}

impl EntityCapabilities for WidgetHooks {
    type Entity = Widget;
    type Create = CreateWidget;
    type Update = UpdateWidget;
    type Filter = WidgetFilter;
    type View = WidgetView;

    async fn before_create(
        &self,
        request: CreateWidget,
        _cancel: &CancellationToken,
    ) -> Result<Widget, CrudError> {
        self.record("before_create");
        if request.name.is_empty() {
            return Err(DomainFailure::null().with_message("name is required").into());
        }
        if self.rejected.lock().unwrap().contains(&request.name) {
            return Err(DomainFailure::already_exists().into());
        }
        Ok(Widget::new(&request.name, request.quantity))
    }

    async fn after_create(&self, _entity: &Widget, _cancel: &CancellationToken) -> Result<(), CrudError> {
        self.record("after_create");
        Ok(())
    }

    async fn before_update(
        &self,
        entity: &mut Widget,
        request: UpdateWidget,
        _cancel: &CancellationToken,
    ) -> Result<(), CrudError> {
        self.record("before_update");
        if let Some(name) = request.name {
            entity.name = name;
        }
        if let Some(quantity) = request.quantity {
            entity.quantity = quantity;
        }
        Ok(())
    }

    async fn after_update(&self, _entity: &Widget, _cancel: &CancellationToken) -> Result<(), CrudError> {
        self.record("after_update");
        Ok(())
    }

    async fn before_delete(&self, _entity: &mut Widget, _cancel: &CancellationToken) -> Result<(), CrudError> {
        self.record("before_delete");
        Ok(())
    }

    async fn after_delete(&self, _entity: &Widget, _cancel: &CancellationToken) -> Result<(), CrudError> {
        self.record("after_delete");
        Ok(())
    }

    async fn to_view_model(
        &self,
        entity: Widget,
        _cancel: &CancellationToken,
    ) -> Result<ServiceResult<WidgetView>, CrudError> {
        if entity.name == UNPROJECTABLE {
            return Ok(ServiceResult::business_error(
                ErrorModel::new("ProjectionError").with_message("widget cannot be shown"),
            ));
        }
        Ok(ServiceResult::ok(WidgetView {
            id: entity.id(),
            name: entity.name,
            quantity: entity.quantity,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum FailureMode {
    Timeout,
    Hanging,
}

/// Store whose every call times out or never completes
#[derive(Debug)]
pub struct FailingStore {
    mode: FailureMode,
}

impl FailingStore {
    pub fn timing_out() -> Self {
        Self {
            mode: FailureMode::Timeout,
        }
    }

    pub fn hanging() -> Self {
        Self {
            mode: FailureMode::Hanging,
        }
    }

    async fn fail<T>(&self, operation: StoreOperation) -> StoreResult<T> {
        match self.mode {
            FailureMode::Timeout => Err(StoreError::timeout(operation, "statement timed out")),
            FailureMode::Hanging => std::future::pending().await,
        }
    }
}

impl EntitySet<Widget> for FailingStore {
    async fn find_one(&self, _predicate: Predicate<'_, Widget>) -> StoreResult<Option<Widget>> {
        self.fail(StoreOperation::FindOne).await
    }

    async fn find_all(&self) -> StoreResult<Vec<Widget>> {
        self.fail(StoreOperation::FindAll).await
    }

    async fn add(&self, _entity: Widget) -> StoreResult<EntityId> {
        self.fail(StoreOperation::Add).await
    }

    async fn update(&self, _entity: Widget) -> StoreResult<()> {
        self.fail(StoreOperation::Update).await
    }

    async fn save(&self) -> StoreResult<()> {
        self.fail(StoreOperation::Save).await
    }

    async fn discard(&self, _entity_id: EntityId) -> StoreResult<()> {
        Ok(())
    }
}

/// Memory store that cancels the armed token once `trigger` has completed
///
/// The token fires at most once per arming, so later calls made under a fresh
/// token run normally.
#[derive(Debug)]
pub struct CancellingStore {
    inner: MemoryEntitySet<Widget>,
    trigger: StoreOperation,
    armed: Mutex<Option<CancellationToken>>,
}

impl CancellingStore {
    pub fn on(trigger: StoreOperation) -> Self {
        Self {
            inner: MemoryEntitySet::new(),
            trigger,
            armed: Mutex::new(None),
        }
    }

    pub fn arm(&self, cancel: &CancellationToken) {
        *self.armed.lock().unwrap() = Some(cancel.clone());
    }

    pub fn inner(&self) -> &MemoryEntitySet<Widget> {
        &self.inner
    }

    fn fire(&self, operation: StoreOperation) {
        if operation != self.trigger {
            return;
        }
        if let Some(cancel) = self.armed.lock().unwrap().take() {
            cancel.cancel();
        }
    }
}

impl EntitySet<Widget> for CancellingStore {
    async fn find_one(&self, predicate: Predicate<'_, Widget>) -> StoreResult<Option<Widget>> {
        let found = self.inner.find_one(predicate).await?;
        self.fire(StoreOperation::FindOne);
        Ok(found)
    }

    async fn find_all(&self) -> StoreResult<Vec<Widget>> {
        let rows = self.inner.find_all().await?;
        self.fire(StoreOperation::FindAll);
        Ok(rows)
    }

    async fn add(&self, entity: Widget) -> StoreResult<EntityId> {
        let id = self.inner.add(entity).await?;
        self.fire(StoreOperation::Add);
        Ok(id)
    }

    async fn update(&self, entity: Widget) -> StoreResult<()> {
        self.inner.update(entity).await?;
        self.fire(StoreOperation::Update);
        Ok(())
    }

    async fn save(&self) -> StoreResult<()> {
        self.inner.save().await?;
        self.fire(StoreOperation::Save);
        Ok(())
    }

    async fn discard(&self, id: EntityId) -> StoreResult<()> {
        self.inner.discard(id).await
    }
}
