use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, auth, cases, directory, lookups};
use crate::middleware::{require_staff, track_requests};
use crate::state::AppState;

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origins allowed by CORS. Empty disables the CORS layer.
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { cors_origins: Vec::new(), max_upload_bytes: 2 * 1024 * 1024 }
    }
}

/// Builds the complete application router.
pub fn router(state: AppState, config: &ApiConfig) -> Router {
    let upload_limit = usize::try_from(config.max_upload_bytes).unwrap_or(usize::MAX).saturating_add(MULTIPART_OVERHEAD);

    let api = Router::new()
        // Cases
        .route("/cases", get(cases::list).post(cases::create))
        .route("/cases/{id}", get(cases::get).patch(cases::update))
        .route("/cases/{id}/signoff", post(cases::sign_off))
        .route("/cases/{id}/final-letter", post(cases::final_letter))
        .route("/cases/{id}/close", post(cases::close))
        .route("/cases/{id}/tags", get(cases::tags).post(cases::add_tag))
        .route("/cases/{id}/tags/{tag}", delete(cases::remove_tag))
        .route("/cases/{id}/comments", get(cases::comments).post(cases::add_comment))
        .route(
            "/cases/{id}/files",
            get(cases::files).post(cases::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/cases/{id}/files/{file}", get(cases::download))
        .route("/cases/{id}/history", get(cases::history))
        // Directory
        .route("/properties", get(directory::list_properties).post(directory::create_property))
        .route("/properties/{id}", get(directory::get_property))
        .route("/requesters", get(directory::list_requesters).post(directory::create_requester))
        .route("/requesters/{id}", get(directory::get_requester))
        .route("/tags", get(directory::list_tags).post(directory::create_tag))
        .route("/tags/{id}", get(directory::get_tag))
        // Lookups
        .route("/determinations", get(lookups::list_determinations).post(lookups::create_determination))
        .route("/systemunits", get(lookups::list_system_units).post(lookups::create_system_unit))
        .route("/systemunits/{id}", get(lookups::get_system_unit))
        .route("/systemunits/{id}/maps", get(lookups::unit_maps).post(lookups::link_unit_map))
        .route(
            "/systemunits/{id}/prohibitiondates",
            get(lookups::prohibition_dates).post(lookups::add_prohibition_date),
        )
        .route("/systemmaps", get(lookups::list_system_maps).post(lookups::create_system_map))
        .route("/fieldoffices", get(lookups::list_field_offices).post(lookups::create_field_office))
        .route("/fieldoffices/{id}", get(lookups::get_field_office))
        // Accounts
        .route("/users", post(auth::create_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/auth/token", post(auth::issue_token))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state);

    match cors_layer(&config.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600)),
    )
}
