use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler, dashboard::dashboard_handler, invoices::invoices_handler,
        messages::messages_handler, notifications::notifications_handler,
        properties::properties_handler, readings::readings_handler, rentals::rentals_handler,
        roles::roles_handler, users::users_handler, utilities::utilities_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .nest("/users", users_handler())
        .nest("/rentals", rentals_handler())
        .nest("/utilities", utilities_handler())
        .nest("/readings", readings_handler())
        .nest("/invoices", invoices_handler())
        .nest("/messages", messages_handler())
        .nest("/notifications", notifications_handler())
        .nest("/dashboard", dashboard_handler())
        .merge(properties_handler())
        .merge(roles_handler())
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::{
        config::{Config, SmtpConfig},
        db::DBClient,
    };

    fn test_state() -> Arc<AppState> {
        let config = Config {
            database_url: "postgres://localhost/rentnest_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 8000,
            redis_url: None,
            cors_origins: vec![],
            due_reading_scan_hours: 24,
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_email: "test@rentnest.app".to_string(),
            },
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        Arc::new(AppState::new(DBClient::new(pool), config))
    }

    #[tokio::test]
    async fn health_check_answers_ok() {
        let response = create_router(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/invoices", "/api/properties", "/api/dashboard", "/api/roles"] {
            let response = create_router(test_state())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let response = create_router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/messages")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
