//! Embedded static pages.
//!
//! The landing page, login page and stylesheet from `frontend/` are
//! compiled into the binary using `include_str!`. Anything else is served
//! from the configured public directory by the fallback in `build_router`.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const LOGIN_HTML: &str = include_str!("../../../frontend/login.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");

/// Build a router that serves the embedded pages.
pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/login", get(login_handler))
        .route("/login.html", get(login_handler))
        .route("/style.css", get(css_handler))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn login_handler() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

async fn css_handler() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLE_CSS,
    )
        .into_response()
}
