//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gate in front of the upstream handler
//! - Wire up middleware (tracing, timeouts, request ID)
//! - Bind server to listener
//! - Swap in reloaded configuration
//! - Forward admitted requests to the clinic application

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::BoundedCache;
use crate::config::{validate_config, GateConfig, ValidationError};
use crate::http::cookies::CookieSettings;
use crate::http::middleware::gate::gate_middleware;
use crate::locale::LanguageError;
use crate::observability::metrics;
use crate::routing::{DecisionEngine, PathFacts};

/// Errors building the gate from a configuration.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Language(#[from] LanguageError),
}

/// Everything compiled from one configuration.
///
/// The path facts memo lives here so that it is only ever filled by, and read
/// against, the engine it belongs to. Swapping the runtime drops it.
#[derive(Debug)]
pub struct GateRuntime {
    pub config: GateConfig,
    pub engine: DecisionEngine,
    pub cookies: CookieSettings,
    pub logout_param: String,
    pub facts: BoundedCache<String, PathFacts>,
}

impl GateRuntime {
    pub fn from_config(config: GateConfig) -> Result<Self, GateError> {
        validate_config(&config).map_err(GateError::Validation)?;
        let engine = DecisionEngine::from_config(&config)?;
        let cookies = CookieSettings::from_config(&config);
        let logout_param = config.access.logout_param.clone();
        let facts = BoundedCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_secs),
        );
        Ok(Self {
            config,
            engine,
            cookies,
            logout_param,
            facts,
        })
    }

    /// Path facts for `path`, memoized under this runtime's engine.
    pub fn path_facts(&self, path: &str) -> PathFacts {
        self.facts
            .get_or_insert_with(&path.to_string(), || self.engine.path_facts(path))
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ArcSwap<GateRuntime>>,
    pub client: Client<HttpConnector, Body>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(runtime: GateRuntime) -> Self {
        Self {
            runtime: Arc::new(ArcSwap::from_pointee(runtime)),
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            started_at: Instant::now(),
        }
    }

    /// Install a new runtime. Requests already holding the old one finish
    /// against it and its memo.
    pub fn swap_runtime(&self, runtime: GateRuntime) {
        self.runtime.store(Arc::new(runtime));
    }
}

/// HTTP server for the clinic gate.
pub struct GateServer {
    router: Router,
    state: AppState,
}

impl GateServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Result<Self, GateError> {
        let request_timeout = Duration::from_secs(config.listener.request_timeout_secs);
        let state = AppState::new(GateRuntime::from_config(config)?);
        let router = Self::build_router(request_timeout, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_timeout: Duration, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .layer(middleware::from_fn_with_state(state.clone(), gate_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// The fully layered router, for serving or driving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    ///
    /// Configurations arriving on `config_updates` replace the running one;
    /// invalid ones are logged and ignored.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "Gate server starting"
        );

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match GateRuntime::from_config(config) {
                    Ok(runtime) => {
                        state.swap_runtime(runtime);
                        tracing::info!("Gate configuration reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected configuration update, keeping current");
                    }
                }
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Gate server stopped");
        Ok(())
    }
}

/// Forwards an admitted request to the upstream application.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (address, timeout) = {
        let runtime = state.runtime.load();
        (
            runtime.config.upstream.address.clone(),
            Duration::from_secs(runtime.config.upstream.timeout_secs),
        )
    };

    let (mut parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    parts.uri = match format!("http://{address}{path_and_query}").parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %address, error = %e, "Invalid upstream URI");
            metrics::record_upstream(502);
            return (StatusCode::BAD_GATEWAY, "Invalid upstream address").into_response();
        }
    };
    let upstream_request = Request::from_parts(parts, body);

    match tokio::time::timeout(timeout, state.client.request(upstream_request)).await {
        Ok(Ok(response)) => {
            metrics::record_upstream(response.status().as_u16());
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(upstream = %address, error = %e, "Upstream error");
            metrics::record_upstream(502);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
        Err(_) => {
            tracing::error!(upstream = %address, timeout = ?timeout, "Upstream timed out");
            metrics::record_upstream(504);
            (StatusCode::GATEWAY_TIMEOUT, "Upstream timed out").into_response()
        }
    }
}
