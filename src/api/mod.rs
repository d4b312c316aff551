// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod health;
pub mod magic_link;

pub fn router(state: AppState) -> Router {
    // Origin is mirrored back so any collaborator page can call the gateway;
    // the bearer secret is the actual gate. The CORS layer also answers
    // OPTIONS requests, so no explicit OPTIONS route exists.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route(
            "/magic-link",
            post(magic_link::request_magic_link).fallback(magic_link::method_not_allowed),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        magic_link::request_magic_link,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            magic_link::MagicLinkRequest,
            magic_link::MagicLinkResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "MagicLink", description = "Magic-link issuance"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let state = test_support::state(test_support::config(
            "https://store.example.com/rest/v1",
            "https://auth.example.com/auth/v1",
        ));
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
