//! Authentication and CORS for the API.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::CorsLayer;

use super::error::ApiError;
use crate::config::SecurityConfig;
use crate::models::Session;

/// Attach a [`Session`] to every request, rejecting it first if an API key is
/// configured and the request does not carry it as a bearer token.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = match &config.api_key {
        None => Session::anonymous(),
        Some(expected) => {
            let token = request
                .headers()
                .get(header::AUTHORIZATION)
                .ok_or(ApiError::Unauthorized("Missing Authorization header"))?
                .to_str()
                .map_err(|_| ApiError::Unauthorized("Authorization header is not valid UTF-8"))?
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized("Invalid Authorization header format"))?;

            if token != expected {
                return Err(ApiError::Unauthorized("Invalid API key"));
            }
            Session::authenticated("api-key")
        }
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Permissive unless specific origins are configured.
pub fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let Some(origins) = &config.cors_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode, middleware::from_fn_with_state, routing::get, Extension, Router,
    };
    use axum_test::TestServer;

    async fn whoami(Extension(session): Extension<Session>) -> String {
        format!("{}:{}", session.subject, session.authenticated)
    }

    fn server(config: SecurityConfig) -> TestServer {
        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(config, auth_middleware));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn anonymous_session_when_auth_disabled() {
        let server = server(SecurityConfig::disabled());

        server.get("/whoami").await.assert_text("anonymous:false");
    }

    #[tokio::test]
    async fn authenticated_session_for_valid_token() {
        let server = server(SecurityConfig::with_api_key("k"));

        server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer k"))
            .await
            .assert_text("api-key:true");
    }

    #[tokio::test]
    async fn rejects_other_auth_schemes() {
        let server = server(SecurityConfig::with_api_key("k"));

        server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic k"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_non_utf8_header_as_malformed() {
        let server = server(SecurityConfig::with_api_key("k"));

        let response = server
            .get("/whoami")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes(b"Bearer \xffk").unwrap(),
            )
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&serde_json::json!({
            "message": "Authorization header is not valid UTF-8"
        }));
    }

    #[tokio::test]
    async fn missing_header_is_reported_as_missing() {
        let server = server(SecurityConfig::with_api_key("k"));

        let response = server.get("/whoami").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&serde_json::json!({
            "message": "Missing Authorization header"
        }));
    }

    fn cors_server(origins: &[&str]) -> TestServer {
        let config = SecurityConfig {
            api_key: None,
            cors_origins: Some(origins.iter().map(|o| o.to_string()).collect()),
        };
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(&config));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_and_skips_unparseable_ones() {
        let server = cors_server(&["https://notes.example", "bad\norigin"]);

        let response = server
            .get("/ping")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("https://notes.example"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://notes.example"))
        );
    }

    #[tokio::test]
    async fn cors_omits_allow_origin_for_other_origins() {
        let server = cors_server(&["https://notes.example"]);

        let response = server
            .get("/ping")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://evil.example"))
            .await;

        response.assert_status_ok();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
