use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use kliko_core::{NeighborResult, QueryService};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;

const MISSING_CENTER: &str = "Parameter 'center' (containerId) is required";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<QueryService>,
    pub(crate) default_radius_km: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindQuery {
    pub(crate) center: Option<u64>,
    pub(crate) radius: Option<String>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/find_containers", get(find_containers))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn find_containers(
    State(state): State<AppState>,
    query: Result<Query<FindQuery>, QueryRejection>,
) -> Result<Json<Vec<NeighborResult>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    // Zero is treated like an absent id.
    let center = query
        .center
        .filter(|center| *center != 0)
        .ok_or_else(|| ApiError::BadRequest(MISSING_CENTER.to_owned()))?;
    // An unparsable radius falls back to the default instead of failing.
    let radius = query
        .radius
        .and_then(|radius| radius.trim().parse::<f64>().ok())
        .unwrap_or(state.default_radius_km);

    let neighbors = state.service.handle_query(center, radius).await?;
    info!(center, radius, found = neighbors.len(), "containers query answered");
    Ok(Json(neighbors))
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use chrono::Duration;
    use kliko_core::{
        FetchError, OperatorId, OperatorMeta, OperatorPlugin, SnapshotCache, SystemClock,
        UpstreamPort,
    };
    use kliko_provider_spaarnelanden::variables;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const PAGE: &str = r#"<html><body><script>
        var districts = [];
        var oContainerModel = [
            {"sRegistrationNumber": "1", "dLatitude": 52.0, "dLongitude": 4.0, "dFillingDegree": 10,
             "sDateLastEmptied": "2024-05-01", "bIsEmptiedToday": true, "sProductName": "Rest"},
            {"sRegistrationNumber": "2", "dLatitude": 52.001, "dLongitude": 4.001},
            {"sRegistrationNumber": "3", "dLatitude": 60.0, "dLongitude": 10.0}
        ];
    </script></body></html>"#;

    struct StubUpstream {
        meta: OperatorMeta,
        body: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UpstreamPort for StubUpstream {
        fn operator(&self) -> &OperatorMeta {
            &self.meta
        }

        async fn fetch_document(&self) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .map(|body| body.as_bytes().to_vec())
                .ok_or(FetchError::NotFound)
        }
    }

    fn stub_app(body: Option<&'static str>) -> (Router, Arc<StubUpstream>) {
        let meta = OperatorMeta {
            id: OperatorId("stub".to_owned()),
            name: "Stub".to_owned(),
            url: "http://upstream.invalid/".to_owned(),
        };
        let upstream = Arc::new(StubUpstream {
            meta: meta.clone(),
            body,
            calls: AtomicUsize::new(0),
        });
        let shared: Arc<dyn UpstreamPort> = Arc::<StubUpstream>::clone(&upstream);
        let plugin = OperatorPlugin {
            meta,
            variables: variables(),
            upstream: shared,
        };
        let cache = Arc::new(SnapshotCache::new(Arc::new(SystemClock)));
        let service = QueryService::from_plugin(&plugin, cache, Duration::seconds(300));
        let state = AppState {
            service: Arc::new(service),
            default_radius_km: 0.15,
        };
        (router(state), upstream)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("router answers");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let json = serde_json::from_slice(&bytes).expect("body is json");
        (status, json)
    }

    fn ids(json: &Value) -> Vec<&str> {
        json.as_array()
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("sRegistrationNumber").and_then(Value::as_str))
            .collect()
    }

    #[tokio::test]
    async fn test_find_containers_returns_neighbours() {
        let (app, _) = stub_app(Some(PAGE));
        let (status, json) = get_json(app, "/find_containers?center=1&radius=1").await;

        assert_eq!(status, StatusCode::OK, "success");
        assert_eq!(ids(&json), vec!["1", "2"], "nearby containers");
        let first = json.get(0).expect("first result");
        assert_eq!(first.get("dFillingDegree"), Some(&Value::from(10.0)), "fill state");
        assert_eq!(first.get("bIsEmptiedToday"), Some(&Value::Bool(true)), "flag");
    }

    #[tokio::test]
    async fn test_default_radius_is_applied() {
        let (app, _) = stub_app(Some(PAGE));
        let (status, json) = get_json(app, "/find_containers?center=1").await;

        assert_eq!(status, StatusCode::OK, "success");
        assert_eq!(ids(&json), vec!["1", "2"], "0.13 km is inside 0.15 km");
    }

    #[tokio::test]
    async fn test_missing_center_is_bad_request() {
        for uri in [
            "/find_containers",
            "/find_containers?center=0",
            "/find_containers?radius=1",
            "/find_containers?center=abc",
        ] {
            let (app, upstream) = stub_app(Some(PAGE));
            let (status, json) = get_json(app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(json.get("error").is_some(), "error body for {uri}");
            assert_eq!(upstream.calls.load(Ordering::SeqCst), 0, "no fetch for {uri}");
        }
    }

    #[tokio::test]
    async fn test_unparsable_radius_uses_default() {
        for uri in [
            "/find_containers?center=1&radius=abc",
            "/find_containers?center=1&radius=",
        ] {
            let (app, _) = stub_app(Some(PAGE));
            let (status, json) = get_json(app, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(ids(&json), vec!["1", "2"], "default radius for {uri}");
        }
    }

    #[tokio::test]
    async fn test_negative_radius_is_bad_request() {
        let (app, _) = stub_app(Some(PAGE));
        let (status, _) = get_json(app, "/find_containers?center=1&radius=-2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "negative radius");
    }

    #[tokio::test]
    async fn test_unknown_center_is_not_found() {
        let (app, _) = stub_app(Some(PAGE));
        let (status, json) = get_json(app, "/find_containers?center=42").await;

        assert_eq!(status, StatusCode::NOT_FOUND, "unknown container");
        assert_eq!(json.get("error"), Some(&Value::from("Container not found")), "message");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let (app, _) = stub_app(None);
        let (status, json) = get_json(app, "/find_containers?center=1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "upstream down");
        assert_eq!(
            json.get("error"),
            Some(&Value::from("Failed to fetch or parse script data")),
            "message"
        );
    }

    #[tokio::test]
    async fn test_health_answers_ok() {
        let (app, _) = stub_app(None);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request builds"))
            .await
            .expect("router answers");
        assert_eq!(response.status(), StatusCode::OK, "liveness");
    }
}
