//! HTTP front for the asset cache
//!
//! Serves cached image bytes directly and redirects to the generator when
//! only the direct URL is available.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{AssetCache, DurableState};
use crate::catalog::DETAIL_SIZE;
use crate::locator::{content_type_of, Locator};

/// Shared application state
#[derive(Clone)]
struct AppState {
    cache: Arc<AssetCache>,
}

/// Asset query parameters
#[derive(Deserialize)]
struct AssetParams {
    prompt: String,
    #[serde(default = "default_size")]
    size: u32,
}

fn default_size() -> u32 {
    DETAIL_SIZE
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct CacheStats {
    memory_entries: usize,
    durable_state: DurableState,
}

/// GET /api/asset/{id}?prompt={prompt}&size={size}
async fn asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<AssetParams>,
) -> Response {
    if id.is_empty() || params.size == 0 {
        return (StatusCode::BAD_REQUEST, "id and size must be non-empty").into_response();
    }

    match state.cache.resolve(&id, &params.prompt, params.size).await {
        Locator::Local { bytes, .. } => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type_of(&bytes)),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            Body::from(bytes),
        )
            .into_response(),
        Locator::Remote(url) => Redirect::temporary(&url).into_response(),
    }
}

/// GET /api/stats
async fn stats_handler(State(state): State<AppState>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse {
        success: true,
        data: Some(CacheStats {
            memory_entries: state.cache.memory_len(),
            durable_state: state.cache.durable_state(),
        }),
        error: None,
    })
}

/// Build the web server router
pub fn create_router(cache: Arc<AssetCache>) -> Router {
    let state = AppState { cache };

    Router::new()
        .route("/api/asset/{id}", get(asset_handler))
        .route("/api/stats", get(stats_handler))
        .with_state(state)
}

/// Start the web server
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(cache: Arc<AssetCache>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(cache);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Asset server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteGenerator;
    use crate::store::DisabledOpener;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_cache(base_url: &str) -> Arc<AssetCache> {
        Arc::new(AssetCache::new(
            RemoteGenerator::new(base_url),
            Arc::new(DisabledOpener),
        ))
    }

    /// Serve the router on an ephemeral port and return its base URL
    async fn spawn_server(cache: Arc<AssetCache>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(cache)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn no_redirect_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_router() {
        let _router = create_router(create_test_cache("https://img.example"));
        // If we got here without panicking, the router was created successfully
    }

    #[test]
    fn test_default_size() {
        assert_eq!(default_size(), 512);
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse {
            success: true,
            data: Some(CacheStats {
                memory_entries: 3,
                durable_state: DurableState::Ready,
            }),
            error: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"memory_entries\":3"));
        assert!(json.contains("\"durable_state\":\"ready\""));
        assert!(!json.contains("\"error\""));
    }

    #[tokio::test]
    async fn test_asset_served_from_cache() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base = spawn_server(create_test_cache(&mock_server.uri())).await;
        let client = no_redirect_client();
        let url = format!("{}/api/asset/amulet_Aries?prompt=gold%20amulet%20aries&size=150", base);

        for _ in 0..2 {
            let response = client.get(&url).send().await.unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            assert_eq!(response.headers()["content-type"], "image/jpeg");
            assert_eq!(response.bytes().await.unwrap().to_vec(), vec![0xFF, 0xD8, 0xFF]);
        }
    }

    #[tokio::test]
    async fn test_png_asset_keeps_its_content_type() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
            .mount(&mock_server)
            .await;

        let base = spawn_server(create_test_cache(&mock_server.uri())).await;
        let response = reqwest::get(format!("{}/api/asset/amulet_Gemini?prompt=gold%20amulet%20gemini", base))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(response.bytes().await.unwrap().to_vec(), png);
    }

    #[tokio::test]
    async fn test_asset_redirects_when_generator_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let cache = create_test_cache(&mock_server.uri());
        let expected = cache.remote_url("brace_Rat", "obsidian bracelet rat", 150);
        let base = spawn_server(cache).await;

        let response = no_redirect_client()
            .get(format!(
                "{}/api/asset/brace_Rat?prompt=obsidian%20bracelet%20rat&size=150",
                base
            ))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()["location"], expected.as_str());
    }

    #[tokio::test]
    async fn test_zero_size_rejected() {
        let base = spawn_server(create_test_cache("http://127.0.0.1:9")).await;
        let response = reqwest::get(format!("{}/api/asset/x?prompt=y&size=0", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let base = spawn_server(create_test_cache("http://127.0.0.1:9")).await;
        let body: serde_json::Value = reqwest::get(format!("{}/api/stats", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["memory_entries"], 0);
        assert_eq!(body["data"]["durable_state"], "uninitialized");
    }
}
