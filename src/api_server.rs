// Axum API Server Module
//
// Purpose: JSON search endpoints over a loaded Doxygen search catalog
// Catalog is immutable after startup; query responses are cached in moka

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{CatalogHit, SearchCatalog};
use crate::config::ServerConfig;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<SearchCatalog>,
    pub cache: Cache<String, serde_json::Value>,
}

impl AppState {
    /// Load the catalog named by the config
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let search_dir = config.search_dir.clone();

        // Parsing is CPU-bound; keep it off the async workers
        let catalog = tokio::task::spawn_blocking(move || SearchCatalog::load(&search_dir)).await??;

        Ok(Self::with_catalog(catalog, config))
    }

    pub fn with_catalog(catalog: SearchCatalog, config: &ServerConfig) -> Self {
        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            catalog: Arc::new(catalog),
            cache,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/search", get(search))
        .route("/api/sections", get(list_sections))
        .route("/api/entries/:key", get(get_entry))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "entries": state.catalog.entry_count(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Section name (`all`, `classes`, ...); defaults to `all`
    pub section: Option<String>,
    /// Match key prefixes only, like the browser widget
    #[serde(default)]
    pub prefix: bool,
    pub limit: Option<usize>,
}

fn hit_to_json(hit: &CatalogHit<'_>) -> serde_json::Value {
    let locations: Vec<serde_json::Value> = hit
        .entry
        .locations
        .iter()
        .map(|loc| {
            serde_json::json!({
                "url": loc.url,
                "page": loc.page(),
                "anchor": loc.anchor(),
                "local": loc.local,
                "scope": loc.display_scope(),
            })
        })
        .collect();

    serde_json::json!({
        "key": hit.entry.key,
        "label": hit.entry.display_label(),
        "section": hit.section,
        "shard": hit.shard,
        "locations": locations,
    })
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    // An empty query lists every entry, up to the limit
    let query = params.q.as_deref().unwrap_or("").trim();

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let section = params.section.as_deref();

    let cache_key = format!("search:{:?}:{}:{}:{}", section, params.prefix, limit, query);
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for search '{}'", query);
        return Ok(Json(cached));
    }

    if let Some(name) = section {
        if state.catalog.shards(name).is_empty() {
            return Err(AppError::NotFound(format!("Section '{}' not found", name)));
        }
    }

    let start = std::time::Instant::now();
    let hits = if params.prefix {
        state.catalog.search_prefix(section, query, limit)
    } else {
        state.catalog.search(section, query, limit)
    };
    let elapsed = start.elapsed();

    tracing::debug!(
        "Search '{}' (section: {:?}, prefix: {}) returned {} results in {:?}",
        query,
        section,
        params.prefix,
        hits.len(),
        elapsed
    );

    let data: Vec<serde_json::Value> = hits.iter().map(hit_to_json).collect();
    let result = serde_json::json!({
        "rows": data.len(),
        "data": data,
        "query_time_us": elapsed.as_micros() as u64,
    });

    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

#[derive(Debug, serde::Deserialize)]
pub struct EntryParams {
    pub section: Option<String>,
}

async fn get_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<EntryParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let hit = state
        .catalog
        .get(params.section.as_deref(), &key)
        .ok_or_else(|| AppError::NotFound(format!("Entry '{}' not found", key)))?;

    Ok(Json(hit_to_json(&hit)))
}

async fn list_sections(State(state): State<AppState>) -> impl IntoResponse {
    let sections = state.catalog.sections();
    Json(serde_json::json!({
        "rows": sections.len(),
        "data": sections,
    }))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
