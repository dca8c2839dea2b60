//! Widgets CRUD API over the in-memory entity set
//!
//! ```bash
//! cargo run --example widgets-api
//! curl -i -X POST localhost:8080/api/widgets \
//!     -H 'content-type: application/json' -d '{"name":"gear","quantity":3}'
//! curl -i localhost:8080/api/widgets?name=ge
//! ```

use crud_scaffold::prelude::*;

#[derive(Debug, Clone)]
struct Widget {
    record: Record,
    name: String,
    quantity: u32,
}

impl Entity for Widget {
    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

#[derive(Debug, Deserialize)]
struct CreateWidget {
    name: String,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct UpdateWidget {
    name: Option<String>,
    quantity: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct WidgetFilter {
    name: Option<String>,
}

impl QueryFilter<Widget> for WidgetFilter {
    fn matches(&self, widget: &Widget) -> bool {
        self.name
            .as_deref()
            .map_or(true, |name| widget.name.contains(name))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetView {
    id: EntityId,
    name: String,
    quantity: u32,
    updated_at: String,
}

struct ViewMapper;

impl EntityMapper<Widget, WidgetView> for ViewMapper {
    fn map(&self, widget: Widget) -> WidgetView {
        WidgetView {
            id: widget.id(),
            updated_at: widget.record.updated_at.to_rfc3339(),
            name: widget.name,
            quantity: widget.quantity,
        }
    }
}

struct WidgetCapabilities;

impl EntityCapabilities for WidgetCapabilities {
    type Entity = Widget;
    type Create = CreateWidget;
    type Update = UpdateWidget;
    type Filter = WidgetFilter;
    type View = WidgetView;

    async fn before_create(
        &self,
        request: CreateWidget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<Widget, CrudError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DomainFailure::null().with_message("name is required").into());
        }
        Ok(Widget {
            record: Record::default(),
            name: name.to_string(),
            quantity: request.quantity,
        })
    }

    async fn after_create(
        &self,
        widget: &Widget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), CrudError> {
        tracing::info!(widget_id = widget.id(), "Widget created");
        Ok(())
    }

    async fn before_update(
        &self,
        widget: &mut Widget,
        request: UpdateWidget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), CrudError> {
        if let Some(name) = request.name {
            widget.name = name;
        }
        if let Some(quantity) = request.quantity {
            widget.quantity = quantity;
        }
        Ok(())
    }

    async fn after_update(
        &self,
        _widget: &Widget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), CrudError> {
        Ok(())
    }

    async fn before_delete(
        &self,
        widget: &mut Widget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), CrudError> {
        if widget.quantity > 0 {
            return Err(DomainFailure::business("WidgetInStock")
                .with_message("widgets still in stock cannot be deleted")
                .into());
        }
        Ok(())
    }

    async fn after_delete(
        &self,
        widget: &Widget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), CrudError> {
        tracing::info!(widget_id = widget.id(), "Widget deleted");
        Ok(())
    }

    async fn to_view_model(
        &self,
        widget: Widget,
        _cancel: &CancellationToken,
    ) -> std::result::Result<ServiceResult<WidgetView>, CrudError> {
        Ok(ServiceResult::ok(ViewMapper.map(widget)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_for_service("widgets-api")?;
    init_tracing(&config)?;

    let server = Server::new(config);
    let widgets = CrudController::new(CrudService::new(
        MemoryEntitySet::<Widget>::new(),
        WidgetCapabilities,
    ));
    let routes = Router::new().nest(
        "/api/widgets",
        crud_router(widgets, server.shutdown_token()),
    );

    let served = server.serve(routes).await;
    shutdown_tracing();
    served
}
