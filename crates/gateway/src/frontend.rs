//! The chat page.
//!
//! `frontend/` at the repository root is compiled in with `include_str!`, so
//! `confidant serve` runs from a single binary with no asset directory.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");

/// Assets served under `/static/`, as `(name, content type, body)`.
const ASSETS: &[(&str, &str, &str)] = &[
    (
        "style.css",
        "text/css; charset=utf-8",
        include_str!("../../../frontend/style.css"),
    ),
    (
        "app.js",
        "application/javascript; charset=utf-8",
        include_str!("../../../frontend/app.js"),
    ),
];

pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/static/{name}", get(asset_handler))
}

fn find_asset(name: &str) -> Option<(&'static str, &'static str)> {
    ASSETS
        .iter()
        .find(|(asset, _, _)| *asset == name)
        .map(|(_, content_type, body)| (*content_type, *body))
}

async fn asset_handler(Path(name): Path<String>) -> Response {
    match find_asset(&name) {
        Some((content_type, body)) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn fetch(uri: &str) -> (StatusCode, Option<String>, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = frontend_router().oneshot(req).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn index_links_its_assets() {
        let (status, content_type, page) = fetch("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(page.contains("Vamshi's Personal AI Assistant"));
        for (name, _, _) in ASSETS {
            assert!(page.contains(&format!("/static/{name}")), "page does not link {name}");
        }
    }

    #[tokio::test]
    async fn assets_carry_content_types() {
        let (status, content_type, _) = fetch("/static/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().contains("text/css"));

        let (status, content_type, script) = fetch("/static/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().contains("javascript"));
        assert!(script.contains("/v1/chat"));
        assert!(script.contains("/v1/settings"));
    }

    #[tokio::test]
    async fn unknown_asset_is_404() {
        let (status, _, _) = fetch("/static/secrets.env").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
