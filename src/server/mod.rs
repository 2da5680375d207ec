//! HTTP server: pages, sitemap, JSON post list and widget proxies

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::content::{Body as PostBody, ContentAggregator, MarkdownRenderer, PostSummary};
use crate::generator::build_sitemap;
use crate::helpers::post_path;
use crate::templates::TemplateRenderer;
use crate::widgets::{self, WidgetState};
use crate::Folio;

/// Server state
#[derive(Clone)]
struct AppState {
    config: Arc<SiteConfig>,
    aggregator: Arc<ContentAggregator>,
    markdown: Arc<MarkdownRenderer>,
    templates: Arc<TemplateRenderer>,
    highlight_css: Arc<str>,
    public_dir: PathBuf,
}

/// Build the application router
pub fn router(folio: &Folio) -> Result<Router> {
    let markdown = Arc::new(folio.renderer()?);
    let highlight_css: Arc<str> = markdown.theme_css()?.into();
    let aggregator = Arc::new(folio.aggregator(markdown.clone())?);

    let state = AppState {
        config: Arc::new(folio.config.clone()),
        aggregator,
        markdown,
        templates: Arc::new(TemplateRenderer::new()?),
        highlight_css,
        public_dir: folio.public_dir.clone(),
    };
    let widget_state = WidgetState::new(folio.config.widgets.clone())?;

    let app = Router::new()
        .route("/", get(home_handler))
        .route("/blog", get(blog_handler))
        .route("/blog/:slug", get(post_handler))
        .route("/sitemap.xml", get(sitemap_handler))
        .route("/api/posts", get(posts_json_handler))
        .route("/assets/highlight.css", get(highlight_css_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .merge(widgets::router(widget_state))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16) -> Result<()> {
    let app = router(folio)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Internal failure of a page handler
struct ServerError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ServerError {
    fn from(err: E) -> Self {
        ServerError(err.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

async fn home_handler(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    let posts = state.aggregator.list_all_posts().await;
    Ok(Html(state.templates.render_home(&state.config, &posts, Utc::now())?))
}

async fn blog_handler(State(state): State<AppState>) -> Result<Html<String>, ServerError> {
    let posts = state.aggregator.list_all_posts().await;
    Ok(Html(state.templates.render_blog(&state.config, &posts, Utc::now())?))
}

async fn post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServerError> {
    let Some(post) = state.aggregator.get_post(&slug).await else {
        return Ok(not_found(&state, &post_path(&slug)));
    };

    let body_html = match &post.body {
        PostBody::Html(html) => html.clone(),
        PostBody::Markdown(markdown) => {
            let renderer = state.markdown.clone();
            let markdown = markdown.clone();
            tokio::task::spawn_blocking(move || renderer.render_or_escape(&markdown)).await?
        }
    };

    let html = state
        .templates
        .render_post(&state.config, &post, &body_html, Utc::now())?;
    Ok(Html(html).into_response())
}

async fn sitemap_handler(State(state): State<AppState>) -> Response {
    let posts = state.aggregator.list_all_posts().await;
    let xml = build_sitemap(&state.config, &posts, Utc::now());
    ([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response()
}

async fn posts_json_handler(State(state): State<AppState>) -> Json<Vec<PostSummary>> {
    let posts = state.aggregator.list_all_posts().await;
    Json(posts.iter().map(PostSummary::from).collect())
}

async fn highlight_css_handler(State(state): State<AppState>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        state.highlight_css.to_string(),
    )
        .into_response()
}

/// Fallback handler that serves static files, or the 404 page
async fn fallback_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let mut service = ServeDir::new(&state.public_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => not_found(&state, &path),
        Err(e) => {
            tracing::error!("Static file error for {}: {}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn not_found(state: &AppState, path: &str) -> Response {
    match state.templates.render_not_found(&state.config, path, Utc::now()) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render 404 page: {:#}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}
