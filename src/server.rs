use core::future::Future;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{Form, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::cli::CommonArgs;

/// What one binary does per request: extract, store, export, chart, render.
pub trait Pipeline: Send + Sync + 'static {
    /// Name of the form field carrying the report filter, if the report has one.
    const FILTER: Option<&'static str>;

    /// One full cycle; returns the rendered page.
    fn report(&self, filter: Option<String>) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// Export file served by `/download`.
    fn export_path(&self) -> PathBuf;
}

struct App<P> {
    pipeline: P,
    /// One extraction at a time.
    running: Mutex<()>,
}

async fn run<P: Pipeline>(app: &App<P>, filter: Option<String>) -> Response {
    let _guard = app.running.lock().await;
    match app.pipeline.report(filter).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!(target: "server", "report failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
        }
    }
}

async fn index<P: Pipeline>(State(app): State<Arc<App<P>>>) -> Response {
    run(&app, None).await
}

async fn submit<P: Pipeline>(State(app): State<Arc<App<P>>>, Form(form): Form<HashMap<String, String>>) -> Response {
    let filter = P::FILTER
        .and_then(|name| form.get(name))
        .filter(|value| !value.is_empty())
        .cloned();
    run(&app, filter).await
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

async fn download<P: Pipeline>(State(app): State<Arc<App<P>>>) -> Response {
    let path = app.pipeline.export_path();
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("export");
            (
                [
                    (header::CONTENT_TYPE, content_type(&path).to_owned()),
                    (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Nothing exported yet").into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response(),
    }
}

pub fn router<P: Pipeline>(pipeline: P, static_dir: impl AsRef<Path>) -> Router {
    let app = Arc::new(App {
        pipeline,
        running: Mutex::new(()),
    });

    Router::new()
        .route("/", get(index::<P>).post(submit::<P>))
        .route("/download", get(download::<P>))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::very_permissive())
        .with_state(app)
}

pub async fn serve<P: Pipeline>(pipeline: P, port: u16, static_dir: PathBuf) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(target: "server", "listening on \x1b[1;36mhttp://{}\x1b[0m", listener.local_addr()?);
    axum::serve(listener, router(pipeline, static_dir)).await
}

/// `--once` renders a single report; otherwise the server runs until killed.
pub async fn launch<P: Pipeline>(pipeline: P, args: &CommonArgs) -> anyhow::Result<()> {
    let out = args.output();
    out.prepare().await?;

    if args.once {
        pipeline.report(None).await?;
        return Ok(());
    }

    serve(pipeline, args.port, out.static_dir()).await?;
    Ok(())
}
