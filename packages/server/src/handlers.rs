//! HTTP handler functions for the quake map API.

use actix_web::{HttpResponse, web};
use quake_map_server_models::{
    ApiDatasetView, ApiEarthquakeAnalysis, ApiEarthquakes, ApiEvent, ApiEvents, ApiHealth,
    ApiNarrative, ApiRegions, ApiSummary, ApiViewState, ApiViewSwitch, FeedQueryParams,
    RegionQueryParams, ViewSwitchRequest,
};
use quake_map_source::usgs::to_feature_collection;
use quake_map_view::{Dataset, ViewError};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: state.views.source_id().to_string(),
    })
}

/// `GET /api/summary`
pub async fn summary(
    state: web::Data<AppState>,
    params: web::Query<FeedQueryParams>,
) -> HttpResponse {
    let feed = params.feed();
    match state.views.get_summary(feed).await {
        Ok(summary) => HttpResponse::Ok().json(ApiSummary::new(feed, &summary)),
        Err(e) => view_error("Failed to summarize events", &e),
    }
}

/// `GET /api/regions`
///
/// Ranks regions by event count. `minMagnitude` re-aggregates the cached
/// events at a different threshold; `limit` truncates the ranking. The
/// response echoes the threshold that was actually applied.
pub async fn regions(
    state: web::Data<AppState>,
    params: web::Query<RegionQueryParams>,
) -> HttpResponse {
    let feed = params.feed();
    let ranked = match params.limit {
        Some(limit) => {
            state
                .views
                .get_top_regions(feed, params.min_magnitude, limit)
                .await
        }
        None => {
            state
                .views
                .get_ranked_regions(feed, params.min_magnitude)
                .await
        }
    };

    match ranked {
        Ok(regions) => HttpResponse::Ok().json(ApiRegions {
            feed,
            min_magnitude: params
                .min_magnitude
                .or_else(|| Dataset::analysis_for(feed).min_magnitude()),
            regions,
        }),
        Err(e) => view_error("Failed to rank regions", &e),
    }
}

/// `GET /api/narrative`
pub async fn narrative(
    state: web::Data<AppState>,
    params: web::Query<FeedQueryParams>,
) -> HttpResponse {
    let feed = params.feed();
    match state.views.get_narrative(feed).await {
        Ok(narrative) => HttpResponse::Ok().json(ApiNarrative { feed, narrative }),
        Err(e) => view_error("Failed to generate narrative", &e),
    }
}

/// `GET /api/events`
///
/// Lists raw events, including those without a magnitude.
pub async fn events(
    state: web::Data<AppState>,
    params: web::Query<FeedQueryParams>,
) -> HttpResponse {
    let feed = params.feed();
    match state.views.get_events(feed).await {
        Ok(events) => {
            let events: Vec<ApiEvent> = events.iter().map(ApiEvent::from).collect();
            HttpResponse::Ok().json(ApiEvents {
                feed,
                count: events.len(),
                events,
            })
        }
        Err(e) => view_error("Failed to list events", &e),
    }
}

/// `GET /api/earthquakes`
///
/// Realtime events as `GeoJSON` together with the batch analysis, in the
/// shape map clients already consume.
pub async fn earthquakes(state: web::Data<AppState>) -> HttpResponse {
    match state.views.request(Dataset::Aggregated).await {
        Ok(view) => HttpResponse::Ok().json(ApiEarthquakes {
            data: to_feature_collection(&view.events),
            analysis: ApiEarthquakeAnalysis::from(&view.summary),
        }),
        Err(e) => view_error("Failed to fetch earthquakes", &e),
    }
}

/// `GET /api/views/{dataset}`
///
/// Snapshot of a dataset's state. Never triggers a fetch.
pub async fn view_state(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Some(dataset) = parse_dataset(&path) else {
        return unknown_dataset(&path);
    };
    HttpResponse::Ok().json(ApiViewState::from(&state.views.get_view_state(dataset)))
}

/// `POST /api/views/{dataset}/refresh`
pub async fn refresh_view(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let Some(dataset) = parse_dataset(&path) else {
        return unknown_dataset(&path);
    };
    match state.views.refresh(dataset).await {
        Ok(view) => HttpResponse::Ok().json(ApiDatasetView::from(view.as_ref())),
        Err(e) => view_error("Failed to refresh dataset", &e),
    }
}

/// `POST /api/view`
///
/// Makes a view active and loads the dataset it renders.
pub async fn switch_view(
    state: web::Data<AppState>,
    body: web::Json<ViewSwitchRequest>,
) -> HttpResponse {
    let view = body.view;
    match state.views.switch_view(view).await {
        Ok(_) => HttpResponse::Ok().json(ApiViewSwitch {
            view,
            state: ApiViewState::from(&state.views.get_view_state(view.dataset())),
        }),
        Err(e) => view_error("Failed to switch view", &e),
    }
}

fn parse_dataset(name: &str) -> Option<Dataset> {
    name.parse().ok()
}

fn unknown_dataset(name: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": format!("Unknown dataset: {name}")
    }))
}

/// Maps a [`ViewError`] to a JSON error response.
///
/// Upstream fetch failures are `502 Bad Gateway`, a bad threshold is
/// `400 Bad Request` and an abandoned fetch is an internal error.
fn view_error(context: &str, e: &ViewError) -> HttpResponse {
    let body = serde_json::json!({ "error": format!("{context}: {e}") });
    match e {
        ViewError::InvalidThreshold { .. } => {
            log::warn!("{context}: {e}");
            HttpResponse::BadRequest().json(body)
        }
        ViewError::Fetch(_) => {
            log::error!("{context}: {e}");
            HttpResponse::BadGateway().json(body)
        }
        ViewError::Abandoned { .. } => {
            log::error!("{context}: {e}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
