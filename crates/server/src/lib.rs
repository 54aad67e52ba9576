//! HTTP surface: a single `GET /` page.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::{error, info};

pub mod finder;
pub mod render;

pub use finder::{DEFAULT_QUERY, DEFAULT_SUGGESTIONS, GiftFinder, ResultsPage, SuggestionResults};

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    pub query: Option<String>,
}

/// Any failure while building a page.  The client sees a bare 500; the
/// cause goes to the log.
pub struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(err = %format!("{:#}", self.0), "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

pub async fn index(
    State(finder): State<Arc<GiftFinder>>,
    Query(params): Query<IndexParams>,
) -> Result<Html<String>, AppError> {
    let page = finder.find(params.query.as_deref()).await?;
    Ok(Html(render::render_page(&page)))
}

pub fn router(finder: Arc<GiftFinder>) -> Router {
    Router::new().route("/", get(index)).with_state(finder)
}

pub async fn run_server(finder: GiftFinder, addr: &str) -> Result<()> {
    let app = router(Arc::new(finder));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "serving gift finder");
    axum::serve(listener, app).await?;
    Ok(())
}
