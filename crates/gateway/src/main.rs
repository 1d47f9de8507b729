//! SpaceBio API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - The publication import and AI assistant functions
//! - The publication, filter, and graph read API
//! - Rate limiting
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{from_fn, Next},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use spacebio_common::{
    assistant::{create_chat_gateway, ChatGateway},
    config::AppConfig,
    db::{self, PublicationStore},
    metrics::{self, IMPORT_BUCKETS, LATENCY_BUCKETS, METRICS_PREFIX},
    telemetry,
};
use spacebio_ingestion::{CsvSource, HttpCsvSource};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PublicationStore>,
    pub chat: Arc<dyn ChatGateway>,
    pub source: Arc<dyn CsvSource>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    telemetry::init_tracing(&config.observability);

    info!("Starting SpaceBio API Gateway v{}", spacebio_common::VERSION);

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        install_metrics_exporter(
            config.observability.metrics_port,
            &config.observability.service_name,
        )?;
        info!(port = config.observability.metrics_port, "Prometheus exporter listening");
    }
    metrics::register_metrics();

    // Initialize the publication store
    let store = db::connect_store(&config.database).await?;

    let chat = create_chat_gateway(&config.assistant)?;
    let source = HttpCsvSource::new(
        config.import.source_url.clone(),
        Duration::from_secs(config.import.fetch_timeout_secs),
    )?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        store,
        chat,
        source: Arc::new(source),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    // Drain in-flight requests for at most the configured shutdown timeout
    let drain = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let drain = drain.clone();
        async move { drain.notified().await }
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => drain.notify_one(),
    }

    match tokio::time::timeout(config.shutdown_timeout(), server).await {
        Ok(result) => result??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Graceful shutdown timed out, dropping remaining connections"
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Install the Prometheus recorder and its scrape listener
fn install_metrics_exporter(port: u16, service_name: &str) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .add_global_label("service", service_name)
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_request_duration_seconds", METRICS_PREFIX)),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_import_duration_seconds", METRICS_PREFIX)),
            IMPORT_BUCKETS,
        )?
        .install()
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Bounded by the request timeout
    let timed_routes = Router::new()
        .route("/functions/v1/ai-research-assistant", post(handlers::assistant::ai_research_assistant))

        // Publication endpoints
        .route("/api/publications", get(handlers::publications::list_publications))
        .route("/api/publications/count", get(handlers::publications::count_publications))
        .route("/api/publications/filters", get(handlers::publications::filter_options))
        .route("/api/publications/{id}", get(handlers::publications::get_publication))

        // Graph endpoint
        .route("/api/graph", get(handlers::graph::get_graph))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout(),
        ));

    // The import runs to completion on its own task and is not timed out
    let mut api_routes = Router::new()
        .route("/functions/v1/import-publications", post(handlers::import::import_publications))
        .merge(timed_routes)
        .route_layer(from_fn(middleware::metrics::track_metrics));

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        api_routes = api_routes.layer(from_fn(move |request: Request, next: Next| {
            middleware::rate_limit::rate_limit_middleware(request, next, limiter.clone())
        }));
    }

    // Health endpoints (not rate limited)
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready));

    // Compose the app
    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .fallback(handlers::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use async_trait::async_trait;
    use spacebio_common::{
        assistant::{MockChatGateway, MockReply},
        db::{
            models::{Publication, PublicationConnection},
            FilterOptions, MemoryStore, PublicationQuery,
        },
        errors::{Result, AI_SERVICE_MESSAGE, CREDITS_DEPLETED_MESSAGE, RATE_LIMIT_MESSAGE},
        graph::ConnectionInput,
    };
    use uuid::Uuid;
    use spacebio_ingestion::StaticCsvSource;
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    const CSV: &str = "Title,Authors,Year,Abstract,Keywords,DOI,URL,Organisms,Experiment Type,Research Area
Bone loss in mice,Smith J,2019,Mice lose bone in orbit,bone;microgravity;muscle,10.1/a,,Mus musculus,Flight,Human Health
Muscle atrophy,Doe A,2021,Rodent muscle study,bone;microgravity;muscle,10.1/b,,Mus musculus,Flight,Human Health
Root growth,Lee K,2015,Plants in space,roots,10.1/c,,Arabidopsis thaliana,Ground,Plant Biology
";

    fn test_state(chat: Arc<dyn ChatGateway>, csv: &str) -> AppState {
        let mut config = AppConfig::default();
        config.database.url = "memory://".to_string();
        config.rate_limit.enabled = false;

        AppState {
            config: Arc::new(config),
            store: Arc::new(MemoryStore::new()),
            chat,
            source: Arc::new(StaticCsvSource::new(csv)),
        }
    }

    fn test_app(csv: &str) -> Router {
        create_router(test_state(Arc::new(MockChatGateway::echo()), csv))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = assert_ok!(app.clone().oneshot(request).await);
        let status = response.status();
        let body = assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
        (status, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn import(app: &Router) -> Value {
        let (status, body) = send(app, post_json("/functions/v1/import-publications", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    fn ask(question: &str) -> Request<Body> {
        post_json(
            "/functions/v1/ai-research-assistant",
            json!({ "messages": [{ "role": "user", "content": question }] }),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app("");
        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_import_empty_dataset() {
        let app = test_app("");
        let body = import(&app).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["imported"], 0);
        assert_eq!(body["message"], "Publications imported successfully");
    }

    #[tokio::test]
    async fn test_import_builds_graph() {
        let app = test_app(CSV);
        assert_eq!(import(&app).await["imported"], 3);

        let (status, graph) = get_json(&app, "/api/graph").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);

        let links = graph["links"].as_array().unwrap();
        let types: Vec<&str> = links.iter().map(|l| l["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["shared_keywords", "shared_organism", "same_research_area"]);
        assert!((links[0]["strength"].as_f64().unwrap() - 0.6).abs() < 1e-9);

        let (_, small) = get_json(&app, "/api/graph?limit=1").await;
        assert_eq!(small["nodes"].as_array().unwrap().len(), 1);
        assert!(small["links"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publication_listing_and_lookup() {
        let app = test_app(CSV);
        import(&app).await;

        let (status, body) = get_json(&app, "/api/publications?organisms=Mus%20musculus").await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["publications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Muscle atrophy", "Bone loss in mice"]);

        let (_, body) = get_json(&app, "/api/publications?q=PLANTS&year_from=0").await;
        assert_eq!(body["count"], 1);
        let id = body["publications"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(body["publications"][0]["abstract"], "Plants in space");

        let (status, one) = get_json(&app, &format!("/api/publications/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["title"], "Root growth");

        let (_, body) = get_json(&app, "/api/publications?year_from=2016&year_to=2020").await;
        assert_eq!(body["count"], 1);

        let (_, count) = get_json(&app, "/api/publications/count").await;
        assert_eq!(count["count"], 3);

        let (_, filters) = get_json(&app, "/api/publications/filters").await;
        assert_eq!(filters["organisms"], json!(["Arabidopsis thaliana", "Mus musculus"]));
        assert_eq!(filters["research_areas"], json!(["Human Health", "Plant Biology"]));
        assert_eq!(filters["experiment_types"], json!(["Flight", "Ground"]));
    }

    #[tokio::test]
    async fn test_unknown_publication_is_404() {
        let app = test_app("");
        let uri = format!("/api/publications/{}", uuid::Uuid::now_v7());
        let (status, body) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PUBLICATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_listing_limit_out_of_range() {
        let app = test_app("");
        let (status, body) = get_json(&app, "/api/publications?limit=1000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_assistant_streams_reply() {
        let gateway = Arc::new(MockChatGateway::echo());
        let app = create_router(test_state(gateway.clone(), ""));

        let request = ask("How do plants grow in microgravity?");
        let response = assert_ok!(app.oneshot(request).await);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

        let body = assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("How do plants grow in microgravity?"));
        assert!(body.ends_with("data: [DONE]\n\n"));

        let sent = gateway.last_request().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, "system");
        assert!(sent[0].content.contains("insights from 608+ NASA publications"));
        assert_eq!(sent[1].role, "user");
    }

    #[tokio::test]
    async fn test_assistant_prompt_uses_live_count() {
        let gateway = Arc::new(MockChatGateway::echo());
        let app = create_router(test_state(gateway.clone(), CSV));
        import(&app).await;

        let (status, _) = send(&app, ask("hi")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(gateway.last_request().unwrap()[0]
            .content
            .contains("insights from 3 NASA publications"));
    }

    #[tokio::test]
    async fn test_assistant_upstream_failures() {
        let cases = [
            (429, StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE),
            (402, StatusCode::PAYMENT_REQUIRED, CREDITS_DEPLETED_MESSAGE),
            (503, StatusCode::INTERNAL_SERVER_ERROR, AI_SERVICE_MESSAGE),
        ];

        for (upstream, expected, message) in cases {
            let gateway = Arc::new(MockChatGateway::new(MockReply::Status(upstream)));
            let app = create_router(test_state(gateway, ""));

            let (status, body) = send(&app, ask("hello")).await;
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(status, expected, "upstream {}", upstream);
            assert_eq!(body["error"], message);
        }
    }

    #[tokio::test]
    async fn test_assistant_rejects_malformed_body() {
        let app = test_app("");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/functions/v1/ai-research-assistant")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app, request).await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = test_app("");
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/functions/v1/ai-research-assistant")
            .header(header::ORIGIN, "https://example.org")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization, content-type")
            .body(Body::empty())
            .unwrap();

        let response = assert_ok!(app.oneshot(request).await);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_excess_requests() {
        let mut state = test_state(Arc::new(MockChatGateway::echo()), "");
        let mut config = (*state.config).clone();
        config.rate_limit.enabled = true;
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
        state.config = Arc::new(config);
        let app = create_router(state);

        let (status, _) = get_json(&app, "/api/publications/count").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get_json(&app, "/api/publications/count").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests");

        // Health checks bypass the limiter
        let (status, _) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = test_app("");
        let (status, body) = get_json(&app, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    /// Delays connection replacement and graph reads past short deadlines
    struct SlowGraphStore {
        inner: Arc<MemoryStore>,
        delay: Duration,
    }

    #[async_trait]
    impl PublicationStore for SlowGraphStore {
        async fn ping(&self) -> Result<()> {
            self.inner.ping().await
        }

        async fn insert_publications(&self, batch: Vec<Publication>) -> Result<u64> {
            self.inner.insert_publications(batch).await
        }

        async fn connection_inputs(&self) -> Result<Vec<ConnectionInput>> {
            self.inner.connection_inputs().await
        }

        async fn replace_connections(
            &self,
            connections: Vec<PublicationConnection>,
            batch_size: usize,
        ) -> Result<u64> {
            tokio::time::sleep(self.delay).await;
            self.inner.replace_connections(connections, batch_size).await
        }

        async fn count_publications(&self) -> Result<u64> {
            self.inner.count_publications().await
        }

        async fn list_publications(&self, query: &PublicationQuery) -> Result<Vec<Publication>> {
            self.inner.list_publications(query).await
        }

        async fn find_publication(&self, id: Uuid) -> Result<Option<Publication>> {
            self.inner.find_publication(id).await
        }

        async fn filter_options(&self) -> Result<FilterOptions> {
            self.inner.filter_options().await
        }

        async fn first_publications(&self, limit: u64) -> Result<Vec<Publication>> {
            tokio::time::sleep(self.delay).await;
            self.inner.first_publications(limit).await
        }

        async fn connections_among(&self, ids: &[Uuid]) -> Result<Vec<PublicationConnection>> {
            self.inner.connections_among(ids).await
        }
    }

    fn slow_app(store: Arc<MemoryStore>, delay: Duration, request_timeout_secs: u64) -> Router {
        let mut state = test_state(Arc::new(MockChatGateway::echo()), CSV);
        let mut config = (*state.config).clone();
        config.server.request_timeout_secs = request_timeout_secs;
        state.config = Arc::new(config);
        state.store = Arc::new(SlowGraphStore { inner: store, delay });
        create_router(state)
    }

    #[tokio::test]
    async fn test_import_outlives_request_timeout() {
        let store = Arc::new(MemoryStore::new());
        let app = slow_app(store.clone(), Duration::from_millis(1200), 1);

        assert_eq!(import(&app).await["imported"], 3);
        assert_eq!(store.connections().await.len(), 3);
    }

    #[tokio::test]
    async fn test_slow_graph_read_times_out() {
        let store = Arc::new(MemoryStore::new());
        let app = slow_app(store, Duration::from_millis(1200), 1);

        let request = Request::builder().uri("/api/graph").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_import_finishes_after_client_goes_away() {
        let store = Arc::new(MemoryStore::new());
        let app = slow_app(store.clone(), Duration::from_millis(300), 300);

        let request = post_json("/functions/v1/import-publications", json!({}));
        let abandoned = tokio::time::timeout(Duration::from_millis(50), app.oneshot(request)).await;
        assert!(abandoned.is_err());

        for _ in 0..40 {
            if store.connections().await.len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert_eq!(store.connections().await.len(), 3);
        assert_eq!(store.count_publications().await.unwrap(), 3);
    }
}
