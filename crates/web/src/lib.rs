pub mod cache;
pub mod config;
pub mod credentials;
pub mod metrics;
pub mod model;
pub mod page;
pub mod retry;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use extract::{AnnotatedDocument, Extractor, Provider, ProviderClient};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::{key_fingerprint, Cache, CacheStats};
use crate::config::AppConfig;
use crate::credentials::{CredentialSet, RunForm};
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};
use crate::model::ResilientModel;
use crate::page::{render_page, PageView, ResultsView};
use crate::retry::RetryPolicy;

pub struct AppState {
    config: AppConfig,
    http: reqwest::Client,
    cache: Option<Arc<Cache>>,
    retry: Arc<RetryPolicy>,
    metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.concurrency.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(Cache::new(config.cache.max_entries)));

        Ok(Self {
            retry: Arc::new(RetryPolicy::from_config(&config.retry)),
            http,
            cache,
            metrics: Metrics::new(),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn model_for(&self, provider: Provider, api_key: &str) -> ResilientModel<ProviderClient> {
        let client = ProviderClient::new(
            provider,
            api_key.to_string(),
            self.config.models.get(provider).to_string(),
            self.http.clone(),
        )
        .with_base_url(self.config.endpoints.get(provider));

        ResilientModel::new(
            client,
            key_fingerprint(api_key),
            self.cache.clone(),
            self.retry.clone(),
        )
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct MetricsResponse {
    #[serde(flatten)]
    runs: MetricsSnapshot,
    cache: Option<CacheStats>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/run", post(run_demo))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(render_page(&PageView::start(Provider::OpenAI, "")))
}

async fn run_demo(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RunForm>,
) -> (StatusCode, Html<String>) {
    if form.input_text.trim().is_empty() {
        let provider = form.selected_provider().unwrap_or(Provider::OpenAI);
        return (StatusCode::OK, Html(render_page(&PageView::start(provider, ""))));
    }

    let provider = match form.selected_provider() {
        Ok(provider) => provider,
        Err(e) => {
            state.metrics.record_rejected();
            let view = PageView::error(Provider::OpenAI, &form.input_text, e.to_string());
            return (StatusCode::BAD_REQUEST, Html(render_page(&view)));
        }
    };

    let credentials = CredentialSet::from_form(&form);
    let api_key = match credentials.require(provider) {
        Ok(key) => key,
        Err(e) => {
            state.metrics.record_rejected();
            info!(provider = %provider, "Run rejected: missing API key");
            let view = PageView::error(provider, &form.input_text, e.to_string());
            return (StatusCode::BAD_REQUEST, Html(render_page(&view)));
        }
    };

    let timer = TimedOperation::start();
    let extractor = Extractor::with_settings(
        state.model_for(provider, api_key),
        state.config.generation.settings(),
    );
    let report = extract::run(&extractor, &form.input_text).await;

    let mut warnings = report.warnings.clone();
    let original_html = visualize_or_warn(report.original.clone(), &mut warnings).await;
    let optimized_html = visualize_or_warn(report.optimized.clone(), &mut warnings).await;

    state
        .metrics
        .record_completed(timer.elapsed(), report.total_extractions(), warnings.len());

    let view = PageView {
        provider,
        input_text: form.input_text.clone(),
        banner: None,
        results: Some(ResultsView {
            original_html,
            optimized_text: report.optimized_text,
            optimized_html,
            comparison: report.comparison,
            warnings,
        }),
    };
    (StatusCode::OK, Html(render_page(&view)))
}

/// Render off the async workers; the visualizer does blocking file IO
async fn visualize_or_warn(doc: AnnotatedDocument, warnings: &mut Vec<String>) -> String {
    let rendered = tokio::task::spawn_blocking(move || extract::visualize::render_document(&doc))
        .await
        .context("Visualization task failed")
        .and_then(|result| result);

    match rendered {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Visualization failed");
            warnings.push(format!("Visualization failed: {e:#}"));
            String::new()
        }
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        runs: state.metrics.snapshot(),
        cache: state.cache.as_ref().map(|cache| cache.stats()),
    })
}
