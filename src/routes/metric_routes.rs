//! CRUD endpoints for the `metrics` collection.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use tracing::{debug, info, warn};

use crate::config::MetricsConfig;
use crate::error::MetricsError;
use crate::models::{CreateMetricRequest, Metric, UpdateMetricRequest};
use crate::query::{Collection, FieldValue, FilterSet, OrderSet, PageRequest};
use crate::state::MetricState;
use crate::store::ListQuery;
use crate::utils::HTTPError;

/// Registers the metric routes.
pub fn routes() -> Router<MetricState> {
    Router::new()
        .route("/metrics", get(list_metrics).post(create_metric))
        .route(
            "/metrics/:id",
            get(get_metric).put(update_metric).delete(delete_metric),
        )
}

fn invalid_body(rejection: JsonRejection) -> HTTPError {
    debug!("Could not decode request body: {}", rejection.body_text());
    HTTPError::new(StatusCode::BAD_REQUEST, "Invalid request body")
}

/// Every value of a filter on `resource` must be an allowed type.
fn check_resource_filter(filters: &FilterSet, config: &MetricsConfig) -> Result<(), MetricsError> {
    for filter in filters.for_field("resource") {
        for value in &filter.values {
            if let FieldValue::Text(resource_type) = value {
                if !config.is_allowed_type(resource_type) {
                    return Err(MetricsError::validation(format!(
                        "invalid resource type '{}' (allowed: {})",
                        resource_type,
                        config.allowed_types.join(", ")
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Lists metrics with filtering, ordering and pagination.
async fn list_metrics(
    State(state): State<MetricState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Collection<Metric>>, HTTPError> {
    let config = &state.config;
    let page = PageRequest::from_params(
        &params,
        config.pagination_limit,
        config.max_pagination_limit,
    )?;

    let filters = FilterSet::parse(&params, Metric::FIELDS)?;
    check_resource_filter(&filters, config)?;
    filters.check_value_limits()?;
    let ordering = OrderSet::parse(&params, Metric::FIELDS)?;

    let query = ListQuery {
        conditions: filters.conditions(),
        order_by: ordering.into_clauses(),
        limit: page.limit,
        offset: page.offset(),
        include_count: page.include_count,
    };
    let result = state.store.list(&query).await?;

    debug!(
        "Listed {} metrics (page {}, limit {})",
        result.items.len(),
        page.page,
        page.limit
    );
    Ok(Json(Collection {
        items: result.items,
        total: result.total,
        limit: page.limit,
        page: page.page,
    }))
}

/// Fetches one metric by id.
async fn get_metric(
    State(state): State<MetricState>,
    Path(id): Path<String>,
) -> Result<Json<Metric>, HTTPError> {
    let metric = state.store.get(&id).await?.ok_or(MetricsError::NotFound)?;
    Ok(Json(metric))
}

/// Creates a metric. The uniqueness of (resource, resourceId, key) is left to the store.
async fn create_metric(
    State(state): State<MetricState>,
    payload: Result<Json<CreateMetricRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Metric>), HTTPError> {
    let Json(mut request) = payload.map_err(invalid_body)?;
    request.validate(&state.config)?;

    let metric = Metric::from_request(request);
    state.store.create(&metric).await?;
    info!(
        "Created metric {} ({}/{}/{})",
        metric.id, metric.resource, metric.resource_id, metric.key
    );

    // The write succeeded; a failed re-read must not turn it into an error.
    let created = match state.store.get(&metric.id).await {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            warn!("Metric {} not visible after insert; returning local copy", metric.id);
            metric
        }
        Err(e) => {
            warn!("Failed to re-read metric {}: {}; returning local copy", metric.id, e);
            metric
        }
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// Overwrites the value of an existing metric.
async fn update_metric(
    State(state): State<MetricState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMetricRequest>, JsonRejection>,
) -> Result<Json<Metric>, HTTPError> {
    let Json(request) = payload.map_err(invalid_body)?;
    request.validate(&state.config)?;

    let mut metric = state.store.get(&id).await?.ok_or(MetricsError::NotFound)?;
    metric.value = request.value;
    state.store.update(&metric).await?;

    info!("Updated metric {} to {}", metric.id, metric.value);
    Ok(Json(metric))
}

/// Deletes a metric.
async fn delete_metric(
    State(state): State<MetricState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HTTPError> {
    state.store.delete(&id).await?;
    info!("Deleted metric {}", id);
    Ok(StatusCode::NO_CONTENT)
}
