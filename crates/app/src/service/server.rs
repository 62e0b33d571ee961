//! Actix Web server exposing the map page, the nearest-tree endpoint, and
//! status routes.
//!
//! Handlers are generic over the store so the same routes run against
//! PostGIS in production and in-memory stores under test.

use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use nearby::{NearbyParams, TreeStore};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    html::render_map_page,
    service::{
        config::ServiceConfig,
        reply::{self, NearbyReply},
        store::open_store,
        telemetry,
    },
};

/// Path of the nearest-tree endpoint.
pub(crate) const NEAREST_TREES_PATH: &str = "/api/nearest-trees";

/// Shared state backing HTTP handlers.
pub(crate) struct ServerState<S> {
    pub(crate) store: S,
    pub(crate) page: String,
    pub(crate) metrics: Option<&'static PrometheusHandle>,
}

impl<S> ServerState<S> {
    pub(crate) fn new(store: S, map_limit: u32, metrics: Option<&'static PrometheusHandle>) -> Self {
        Self {
            store,
            page: render_map_page(NEAREST_TREES_PATH, map_limit),
            metrics,
        }
    }
}

/// Open the store and serve until the process is interrupted.
pub(crate) async fn serve(config: ServiceConfig) -> Result<()> {
    let metrics = if config.metrics {
        Some(telemetry::init_metrics_recorder()?)
    } else {
        None
    };

    let store = open_store(&config.store).await?;
    info!(
        "Serving nearby trees on http://{} (store: {}, map limit: {})",
        config.bind,
        store.kind(),
        config.map_limit
    );

    let state = web::Data::new(ServerState::new(store, config.map_limit, metrics));
    let mut server = HttpServer::new(move || App::new().configure(routes(state.clone())));
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server
        .bind(config.bind)
        .with_context(|| format!("Failed to bind {}", config.bind))?
        .run()
        .await
        .context("HTTP server error")
}

/// Register every route against `state`.
pub(crate) fn routes<S: TreeStore + 'static>(
    state: web::Data<ServerState<S>>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .route("/", web::get().to(index_route::<S>))
            .service(
                web::resource(NEAREST_TREES_PATH)
                    .route(web::get().to(nearest_trees_handler::<S>))
                    .route(web::post().to(not_implemented)),
            )
            .route("/healthz", web::get().to(health_handler::<S>))
            .route("/metrics", web::get().to(metrics_handler::<S>));
    }
}

/// Serve the map page.
async fn index_route<S: TreeStore + 'static>(state: web::Data<ServerState<S>>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(state.page.clone())
}

/// Return the trees nearest to `lat`/`lng`.
///
/// The query string is taken as raw pairs so repeated or unexpected keys
/// never bypass the JSON error contract.
async fn nearest_trees_handler<S: TreeStore + 'static>(
    query: web::Query<Vec<(String, String)>>,
    state: web::Data<ServerState<S>>,
) -> HttpResponse {
    let params = NearbyParams::from_pairs(query.into_inner());
    let reply: NearbyReply = reply::answer(&state.store, params).await;
    HttpResponse::build(reply.status()).json(reply)
}

async fn not_implemented() -> HttpResponse {
    HttpResponse::NotImplemented().json(json!({ "error": "Not implemented" }))
}

/// Report whether the store answers.
async fn health_handler<S: TreeStore + 'static>(state: web::Data<ServerState<S>>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(err) => {
            warn!(store = state.store.kind(), "Health check failed: {err:?}");
            HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
        }
    }
}

/// Render Prometheus metrics when enabled.
async fn metrics_handler<S: TreeStore + 'static>(
    state: web::Data<ServerState<S>>,
) -> HttpResponse {
    match state.metrics {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::NotFound().finish(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::{StatusCode, header},
        test,
    };
    use nearby::{
        MemoryTreeStore, NearbyQuery, StoreError, TreeRecord, TreeSite, TreeStore, geo::haversine_m,
    };
    use serde_json::Value;

    use super::*;
    use crate::service::reply::{INTERNAL_ERROR_MESSAGE, NO_TREES_MESSAGE};

    fn site(id: i64, lat: f64, lng: f64) -> TreeSite {
        TreeSite {
            id,
            boomsoort: Some(format!("Species {id}")),
            boomhoogte: Some("c. 9 tot 12 m.".into()),
            lng,
            lat,
        }
    }

    fn amsterdam() -> MemoryTreeStore {
        MemoryTreeStore::new(vec![
            site(1, 52.3712, 4.9031),
            site(2, 52.3701, 4.9002),
            site(3, 52.3689, 4.8987),
            site(4, 52.3750, 4.9100),
            site(5, 52.3655, 4.8912),
        ])
    }

    /// Store that fails every call, standing in for an unreachable database.
    struct BrokenStore;

    impl TreeStore for BrokenStore {
        async fn nearest(&self, _query: &NearbyQuery) -> Result<Vec<TreeRecord>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        fn kind(&self) -> &'static str {
            "broken"
        }
    }

    /// Store returning rows out of order, as a planar index might.
    struct ShuffledStore(Vec<TreeSite>);

    impl TreeStore for ShuffledStore {
        async fn nearest(&self, query: &NearbyQuery) -> Result<Vec<TreeRecord>, StoreError> {
            let mut rows: Vec<TreeRecord> = self
                .0
                .iter()
                .map(|site| TreeRecord::at_distance(site, haversine_m(query.origin, site.position())))
                .collect();
            rows.sort_by(|a, b| b.distance_m.total_cmp(&a.distance_m));
            rows.truncate(query.limit as usize);
            Ok(rows)
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn kind(&self) -> &'static str {
            "shuffled"
        }
    }

    async fn call<S: TreeStore + 'static>(store: S, uri: &str) -> (StatusCode, Value) {
        let state = web::Data::new(ServerState::new(store, 50, None));
        let app = test::init_service(App::new().configure(routes(state))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    fn distances(body: &Value) -> Vec<u64> {
        body["trees"]
            .as_array()
            .expect("trees array")
            .iter()
            .map(|tree| tree["distance"].as_u64().expect("integer distance"))
            .collect()
    }

    #[actix_web::test]
    async fn returns_requested_number_of_sorted_trees() {
        let (status, body) = call(amsterdam(), "/api/nearest-trees?lat=52.37&lng=4.90&limit=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], Value::Bool(true));
        assert_eq!(body["userLocation"]["lat"], 52.37);
        assert_eq!(body["userLocation"]["lng"], 4.90);
        let distances = distances(&body);
        assert_eq!(distances.len(), 3);
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(body["closest"], body["trees"][0]);
        assert_eq!(body["closest"]["id"], 2);
        assert_eq!(body["closest"]["coordinates"][0], 4.9002);
        assert_eq!(body["closest"]["coordinates"][1], 52.3701);
    }

    #[actix_web::test]
    async fn limit_defaults_to_one() {
        let (status, body) = call(amsterdam(), "/api/nearest-trees?lat=52.37&lng=4.90").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(distances(&body).len(), 1);
    }

    #[actix_web::test]
    async fn malformed_limit_falls_back_to_one() {
        for limit in ["abc", "0", "-3", "1.5"] {
            let uri = format!("/api/nearest-trees?lat=52.37&lng=4.90&limit={limit}");
            let (status, body) = call(amsterdam(), &uri).await;
            assert_eq!(status, StatusCode::OK, "limit={limit}");
            assert_eq!(distances(&body).len(), 1, "limit={limit}");
        }
    }

    #[actix_web::test]
    async fn repeated_limit_keeps_first_value() {
        let (status, body) = call(
            amsterdam(),
            "/api/nearest-trees?lat=52.37&lng=4.90&limit=2&limit=3",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(distances(&body).len(), 2);
    }

    #[actix_web::test]
    async fn repeated_coordinate_keeps_first_value() {
        let (status, body) = call(amsterdam(), "/api/nearest-trees?lat=52.37&lat=1&lng=4.90").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userLocation"]["lat"], 52.37);
        assert_eq!(distances(&body).len(), 1);
    }

    #[actix_web::test]
    async fn repeated_invalid_coordinate_is_a_json_error() {
        let (status, body) = call(amsterdam(), "/api/nearest-trees?lat=abc&lat=52.37&lng=4.90").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Latitude and longitude must be valid numbers");
    }

    #[actix_web::test]
    async fn missing_coordinates_are_rejected() {
        for uri in [
            "/api/nearest-trees?lng=4.90",
            "/api/nearest-trees?lat=52.37",
            "/api/nearest-trees",
        ] {
            let (status, body) = call(amsterdam(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[actix_web::test]
    async fn non_numeric_coordinates_are_rejected() {
        let (status, body) = call(amsterdam(), "/api/nearest-trees?lat=abc&lng=4.90").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Latitude and longitude must be valid numbers");
        assert!(body.get("trees").is_none());
    }

    #[actix_web::test]
    async fn empty_store_reports_message_not_error() {
        let (status, body) = call(
            MemoryTreeStore::default(),
            "/api/nearest-trees?lat=52.37&lng=4.90&limit=5",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], NO_TREES_MESSAGE);
        assert!(body.get("trees").is_none());
        assert!(body.get("error").is_none());
    }

    #[actix_web::test]
    async fn store_failures_are_generic_server_errors() {
        let (status, body) = call(BrokenStore, "/api/nearest-trees?lat=52.37&lng=4.90").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE }));
    }

    #[actix_web::test]
    async fn out_of_order_rows_are_ranked_before_replying() {
        let store = ShuffledStore(vec![
            site(1, 52.3712, 4.9031),
            site(2, 52.3701, 4.9002),
            site(3, 52.3689, 4.8987),
        ]);
        let (status, body) = call(store, "/api/nearest-trees?lat=52.37&lng=4.90&limit=3").await;
        assert_eq!(status, StatusCode::OK);
        let distances = distances(&body);
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(body["closest"], body["trees"][0]);
    }

    #[actix_web::test]
    async fn post_is_not_implemented() {
        let state = web::Data::new(ServerState::new(amsterdam(), 50, None));
        let app = test::init_service(App::new().configure(routes(state))).await;
        let req = test::TestRequest::post()
            .uri(NEAREST_TREES_PATH)
            .set_json(serde_json::json!({ "lat": 52.37, "lng": 4.9 }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Not implemented");
    }

    #[actix_web::test]
    async fn index_serves_rendered_map_page() {
        let state = web::Data::new(ServerState::new(amsterdam(), 25, None));
        let app = test::init_service(App::new().configure(routes(state))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));
        let body = test::read_body(resp).await;
        let page = std::str::from_utf8(&body).unwrap();
        assert!(page.contains("const NEAREST_ENDPOINT = '/api/nearest-trees';"));
        assert!(page.contains("const MAP_LIMIT = 25;"));
    }

    #[actix_web::test]
    async fn health_reflects_store_liveness() {
        let (status, body) = call(amsterdam(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = call(BrokenStore, "/healthz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }

    #[actix_web::test]
    async fn metrics_route_absent_when_disabled() {
        let state = web::Data::new(ServerState::new(amsterdam(), 50, None));
        let app = test::init_service(App::new().configure(routes(state))).await;
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
