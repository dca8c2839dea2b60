//! Verb-level CRUD controller

use tokio_util::sync::CancellationToken;

use super::{CrudError, CrudService, EntityCapabilities};
use crate::entity::EntityId;
use crate::envelope::ServiceResult;
use crate::store::EntitySet;

/// Thin dispatcher turning service results into envelopes
///
/// Failures are returned as [`CrudError`] so they reach the single
/// unhandled-failure boundary untouched.
#[derive(Debug)]
pub struct CrudController<S, C> {
    service: CrudService<S, C>,
}

impl<S, C> CrudController<S, C>
where
    C: EntityCapabilities,
    S: EntitySet<C::Entity>,
{
    /// Controller over `service`
    pub fn new(service: CrudService<S, C>) -> Self {
        Self { service }
    }

    /// Underlying service, for operations outside the five verbs
    pub fn service(&self) -> &CrudService<S, C> {
        &self.service
    }

    /// GET collection; an empty listing is `NoContent` with `[]`
    pub async fn list(
        &self,
        filter: &C::Filter,
        cancel: &CancellationToken,
    ) -> Result<ServiceResult<Vec<C::View>>, CrudError> {
        let entities = self.service.list(filter, cancel).await?;
        if entities.is_empty() {
            return Ok(ServiceResult::no_content(Vec::new()));
        }
        self.service
            .capabilities()
            .to_view_model_list(entities, cancel)
            .await
    }

    /// GET by id; an unknown id is `NoContent` with null data
    pub async fn get(
        &self,
        id: EntityId,
        cancel: &CancellationToken,
    ) -> Result<ServiceResult<C::View>, CrudError> {
        match self.service.get_by_id(id, cancel).await? {
            Some(entity) => self.service.capabilities().to_view_model(entity, cancel).await,
            None => Ok(ServiceResult::no_content(None)),
        }
    }

    /// POST
    pub async fn create(
        &self,
        request: C::Create,
        cancel: &CancellationToken,
    ) -> Result<ServiceResult<C::View>, CrudError> {
        self.create_located(request, cancel)
            .await
            .map(|(_, result)| result)
    }

    /// POST, also returning the new id for a `Location` header
    pub async fn create_located(
        &self,
        request: C::Create,
        cancel: &CancellationToken,
    ) -> Result<(EntityId, ServiceResult<C::View>), CrudError> {
        use crate::entity::Entity as _;

        let entity = self.service.create(request, cancel).await?;
        let id = entity.id();
        let projected = self.service.capabilities().to_view_model(entity, cancel).await?;
        Ok((id, projected))
    }

    /// PUT
    pub async fn update(
        &self,
        id: EntityId,
        request: C::Update,
        cancel: &CancellationToken,
    ) -> Result<ServiceResult<C::View>, CrudError> {
        let entity = self.service.update(id, request, cancel).await?;
        self.service.capabilities().to_view_model(entity, cancel).await
    }

    /// DELETE
    pub async fn delete(
        &self,
        id: EntityId,
        cancel: &CancellationToken,
    ) -> Result<ServiceResult, CrudError> {
        self.service.delete(id, cancel).await?;
        Ok(ServiceResult::no_content(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::fixtures::{
        CreateWidget, UpdateWidget, Widget, WidgetFilter, WidgetHooks, WidgetView, UNPROJECTABLE,
    };
    use crate::envelope::SuccessStatus;
    use crate::failure::FailureKind;
    use crate::store::MemoryEntitySet;

    fn controller() -> CrudController<MemoryEntitySet<Widget>, WidgetHooks> {
        CrudController::new(CrudService::new(
            MemoryEntitySet::new(),
            WidgetHooks::default(),
        ))
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_no_content_with_null_data() {
        let result = controller()
            .get(12, &CancellationToken::new())
            .await
            .unwrap();

        let success = result.success().expect("absence is not an error");
        assert_eq!(success.status(), SuccessStatus::NoContent);
        assert!(success.data().is_none());
        assert!(result.error().is_none());
        assert_eq!(result.status_code().as_u16(), 204);
    }

    #[tokio::test]
    async fn test_empty_list_is_no_content_with_empty_payload() {
        let result = controller()
            .list(&WidgetFilter::default(), &CancellationToken::new())
            .await
            .unwrap();

        let success = result.success().unwrap();
        assert_eq!(success.status(), SuccessStatus::NoContent);
        assert_eq!(success.data(), Some(&Vec::new()));

        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body["result"]["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_projects_entities() {
        let controller = controller();
        let cancel = CancellationToken::new();
        controller
            .create(CreateWidget::new("spring", 5), &cancel)
            .await
            .unwrap();

        let result = controller
            .list(&WidgetFilter::default(), &cancel)
            .await
            .unwrap();
        let views = result.success().unwrap().data().unwrap();
        assert_eq!(
            views,
            &vec![WidgetView {
                id: 1,
                name: "spring".to_string(),
                quantity: 5
            }]
        );
    }

    #[tokio::test]
    async fn test_list_stops_at_failed_projection() {
        let controller = controller();
        let cancel = CancellationToken::new();
        for name in ["fine", UNPROJECTABLE, "also fine"] {
            controller
                .create(CreateWidget::new(name, 1), &cancel)
                .await
                .unwrap();
        }

        let result = controller
            .list(&WidgetFilter::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(result.error().unwrap().data().code(), "ProjectionError");
    }

    #[tokio::test]
    async fn test_create_located_returns_new_id() {
        let controller = controller();
        let (id, result) = controller
            .create_located(CreateWidget::new("lever", 2), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(id, 1);
        assert_eq!(result.success().unwrap().data().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_update_projects_new_state() {
        let controller = controller();
        let cancel = CancellationToken::new();
        let (id, _) = controller
            .create_located(CreateWidget::new("old", 2), &cancel)
            .await
            .unwrap();

        let result = controller
            .update(id, UpdateWidget::rename("new"), &cancel)
            .await
            .unwrap();
        assert_eq!(result.success().unwrap().data().unwrap().name, "new");
    }

    #[tokio::test]
    async fn test_delete_returns_bare_no_content() {
        let controller = controller();
        let cancel = CancellationToken::new();
        let (id, _) = controller
            .create_located(CreateWidget::new("gone", 1), &cancel)
            .await
            .unwrap();

        let result = controller.delete(id, &cancel).await.unwrap();
        assert_eq!(result, ServiceResult::no_content(None));

        let after = controller.get(id, &cancel).await.unwrap();
        assert_eq!(after.success().unwrap().status(), SuccessStatus::NoContent);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_propagates_not_found() {
        let err = controller()
            .delete(5, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            CrudError::Failure(failure) => assert_eq!(failure.kind(), &FailureKind::NotFound),
            CrudError::Cancelled => panic!("unexpected cancellation"),
        }
    }
}
