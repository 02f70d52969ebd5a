//! HTTP surface: `GET /api/aggregate` plus a health probe.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    aggregator::Aggregator,
    error::AggregateError,
    model::AggregateResult,
    upstream::{github::DEFAULT_OWNER, news::DEFAULT_KEYWORD, weather::DEFAULT_CITY},
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AggregateParams {
    pub city: Option<String>,
    pub keyword: Option<String>,
    pub owner: Option<String>,
}

impl AggregateParams {
    /// First occurrence of each known key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "city" => &mut params.city,
                "keyword" => &mut params.keyword,
                "owner" => &mut params.owner,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/aggregate", get(aggregate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn aggregate(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<AggregateResult>, AggregateError> {
    let params = AggregateParams::from_pairs(pairs);
    let city = params.city.as_deref().unwrap_or(DEFAULT_CITY);
    let keyword = params.keyword.as_deref().unwrap_or(DEFAULT_KEYWORD);
    let owner = params.owner.as_deref().unwrap_or(DEFAULT_OWNER);

    let result = state.aggregator.aggregate(city, keyword, owner).await?;
    Ok(Json(result))
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
