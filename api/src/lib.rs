pub mod auth;
pub mod config;
pub mod error;
pub mod hackrx_request;
pub mod hackrx_response;
pub mod handlers;

use auth::{auth_middleware, ServiceToken};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use config::Settings;
use hackrx_engine::{DocumentFetcher, PerplexityService, QueryService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub token: ServiceToken,
    pub query_service: Arc<QueryService>,
}

impl AppState {
    pub fn new(token: ServiceToken, query_service: QueryService) -> Self {
        Self {
            token,
            query_service: Arc::new(query_service),
        }
    }

    /// Wires the real document fetcher and Perplexity client from settings.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let fetcher = DocumentFetcher::new(settings.max_document_bytes)?;
        let perplexity = PerplexityService::new(settings.perplexity.clone())?;

        log::info!(
            "Using model {} at {} (document limit {} bytes)",
            settings.perplexity.model,
            settings.perplexity.api_url,
            fetcher.max_bytes()
        );

        Ok(Self::new(
            ServiceToken::new(settings.team_bearer_token.clone()),
            QueryService::new(Arc::new(fetcher), Arc::new(perplexity)),
        ))
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/hackrx/run", post(handlers::run_query))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
