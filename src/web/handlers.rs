//! HTTP request handlers.

use super::AppState;
use crate::camera::{CameraReading, Snapshot};
use crate::filter::{self, FilterOptions};
use crate::fleet::{self, FleetSummary};
use crate::insights::{self, window};
use crate::severity::{self, Severity, SeverityLevel, SeverityModel};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

async fn latest_readings(state: &AppState) -> Vec<CameraReading> {
    let history = state.history.read().await;
    history
        .latest()
        .map(|s| s.readings.clone())
        .unwrap_or_default()
}

// ============================================================================
// Health
// ============================================================================

pub async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ============================================================================
// API: Live fleet
// ============================================================================

pub async fn handle_cameras(State(state): State<AppState>) -> impl IntoResponse {
    Json(latest_readings(&state).await)
}

#[derive(Debug, Deserialize)]
pub struct SeverityQuery {
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedReading {
    #[serde(flatten)]
    pub reading: CameraReading,
    pub severity: Severity,
}

pub async fn handle_severity(
    State(state): State<AppState>,
    Query(query): Query<SeverityQuery>,
) -> impl IntoResponse {
    let model = match query.model.as_deref() {
        None => SeverityModel::default(),
        Some(raw) => match SeverityModel::parse(raw) {
            Some(model) => model,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    format!("Unknown severity model: {}", raw),
                )
                    .into_response()
            }
        },
    };

    let assessed: Vec<AssessedReading> = latest_readings(&state)
        .await
        .into_iter()
        .map(|reading| AssessedReading {
            severity: severity::assess(model, &reading),
            reading,
        })
        .collect();

    Json(assessed).into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub level: SeverityLevel,
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub health_weight: f64,
}

pub async fn handle_levels() -> impl IntoResponse {
    let levels: Vec<LevelInfo> = SeverityLevel::ALL
        .iter()
        .map(|&level| LevelInfo {
            level,
            name: level.name(),
            label: level.label(),
            description: level.description(),
            health_weight: level.health_weight(),
        })
        .collect();
    Json(levels)
}

pub async fn handle_fleet(State(state): State<AppState>) -> impl IntoResponse {
    let readings = latest_readings(&state).await;
    Json(FleetSummary::from_readings(&readings))
}

#[derive(Debug, Deserialize)]
pub struct CriticalQuery {
    pub scope: Option<String>,
}

pub async fn handle_critical(
    State(state): State<AppState>,
    Query(query): Query<CriticalQuery>,
) -> impl IntoResponse {
    let readings = latest_readings(&state).await;

    let cameras = match query.scope.as_deref().unwrap_or("critical") {
        "critical" => fleet::critical_areas(&readings),
        "immediate" => fleet::immediate_action_required(&readings),
        "safe" => fleet::safe_cameras(&readings),
        other => {
            return (StatusCode::BAD_REQUEST, format!("Unknown scope: {}", other)).into_response()
        }
    };

    Json(cameras).into_response()
}

// ============================================================================
// API: Filtering
// ============================================================================

/// Filter options plus an optional preset merged over them.
#[derive(Debug, Default, Deserialize)]
pub struct FilterRequest {
    #[serde(flatten)]
    pub options: FilterOptions,
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
    pub applied: FilterOptions,
    pub total: usize,
    pub cameras: Vec<CameraReading>,
}

fn run_filter(readings: &[CameraReading], req: FilterRequest) -> FilterResponse {
    let applied = match req.preset.as_deref() {
        Some(key) => filter::presets::options_with_preset(&req.options, key).unwrap_or_else(|| {
            tracing::debug!("Ignoring unknown preset {}", key);
            req.options.clone()
        }),
        None => req.options,
    };

    FilterResponse {
        total: readings.len(),
        cameras: filter::filter_cameras(readings, &applied),
        applied,
    }
}

/// Build a filter request from raw query pairs. Repeated keys keep the last value.
fn filter_request_from_query(pairs: Vec<(String, String)>) -> FilterRequest {
    let fields: serde_json::Map<String, serde_json::Value> = pairs
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect();

    serde_json::from_value(serde_json::Value::Object(fields)).unwrap_or_else(|e| {
        tracing::debug!("Ignoring filter query: {}", e);
        FilterRequest::default()
    })
}

pub async fn handle_filter(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let readings = latest_readings(&state).await;
    Json(run_filter(&readings, filter_request_from_query(pairs)))
}

pub async fn handle_filter_body(
    State(state): State<AppState>,
    Json(req): Json<FilterRequest>,
) -> impl IntoResponse {
    let readings = latest_readings(&state).await;
    Json(run_filter(&readings, req))
}

pub async fn handle_presets() -> impl IntoResponse {
    Json(filter::presets())
}

// ============================================================================
// API: Insights
// ============================================================================

pub async fn handle_insights(State(state): State<AppState>) -> impl IntoResponse {
    let (snapshots, window_secs) = {
        let history = state.history.read().await;
        (history.window(), history.policy().max_age_secs)
    };
    Json(window::summarize_window_over(&snapshots, window_secs))
}

pub async fn handle_analysis(State(state): State<AppState>) -> impl IntoResponse {
    let readings = latest_readings(&state).await;
    let result = insights::analyze_fleet(&readings, state.backend.as_deref());
    if let insights::AnalysisResult::Failure { error, .. } = &result {
        tracing::debug!("Analysis fell back to rules: {}", error);
    }
    Json(result)
}

#[derive(Debug, Deserialize)]
pub struct SegmentQuery {
    pub segment: Option<u32>,
}

pub async fn handle_segment_insights(
    State(state): State<AppState>,
    Query(query): Query<SegmentQuery>,
) -> impl IntoResponse {
    let readings = latest_readings(&state).await;
    Json(insights::segment_insights(&readings, query.segment))
}

// ============================================================================
// API: Playback
// ============================================================================

pub async fn handle_history_range(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.history.read().await;
    match history.time_range() {
        Some(range) => Json(range).into_response(),
        None => Json(serde_json::json!({ "min": null, "max": null })).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryAtQuery {
    pub timestamp: i64,
}

pub async fn handle_history_at(
    State(state): State<AppState>,
    Query(query): Query<HistoryAtQuery>,
) -> impl IntoResponse {
    let history = state.history.read().await;
    match history.snapshot_at(query.timestamp) {
        Some(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No history recorded yet").into_response(),
    }
}

// ============================================================================
// Live stream
// ============================================================================

fn snapshot_event(snapshot: &Snapshot) -> Option<Event> {
    match Event::default().event("snapshot").json_data(snapshot) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!("Failed to encode snapshot {}: {}", snapshot.timestamp, e);
            None
        }
    }
}

/// Server-sent events: the latest snapshot, then one event per new snapshot.
pub async fn handle_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.live.subscribe();
    let initial = state.history.read().await.latest();
    tracing::info!("New stream subscriber connected");

    let first = stream::iter(initial.and_then(|s| snapshot_event(&s)).map(Ok::<_, Infallible>));
    let live = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    if let Some(event) = snapshot_event(&snapshot) {
                        return Some((Ok::<_, Infallible>(event), rx));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Stream subscriber lagged, skipped {} snapshots", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(first.chain(live)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraStatus;
    use crate::config::ServerConfig;
    use crate::feed::{History, RetentionPolicy};
    use crate::web::Server;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::Router;
    use std::sync::Arc;
    use tokio::sync::{broadcast, RwLock};
    use tower::ServiceExt;

    fn readings() -> Vec<CameraReading> {
        vec![
            CameraReading::new(1, 0.1, 0.2, CameraStatus::Ok),
            CameraReading::new(2, 0.85, 0.5, CameraStatus::Warning).with_description("Debris"),
            CameraReading::new(3, 0.9, 1.5, CameraStatus::Warning),
        ]
    }

    async fn app(snapshots: Vec<Snapshot>) -> Router {
        let history = Arc::new(RwLock::new(History::new(RetentionPolicy::default()).unwrap()));
        for snapshot in snapshots {
            history.write().await.record(Arc::new(snapshot));
        }
        let (live, _) = broadcast::channel(4);
        let server = Server::new(ServerConfig::default(), history, live);
        server.routes()
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let router = app(vec![]).await;
        let (status, json) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_history_returns_empty_lists() {
        let router = app(vec![]).await;
        let (status, json) = get_json(router.clone(), "/api/cameras").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));

        let (_, json) = get_json(router.clone(), "/api/fleet").await;
        assert_eq!(json["total"], 0);
        assert_eq!(json["systemHealth"], 0.0);

        let (status, _) = get_json(router.clone(), "/api/history/at?timestamp=5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, json) = get_json(router, "/api/insights").await;
        assert_eq!(json["summary"]["totalDataPoints"], 0);
    }

    #[tokio::test]
    async fn test_severity_models() {
        let router = app(vec![Snapshot::new(1_000, readings())]).await;

        let (_, json) = get_json(router.clone(), "/api/severity").await;
        assert_eq!(json[0]["segmentId"], 1);
        assert_eq!(json[0]["severity"]["model"], "linear");
        assert_eq!(json[2]["severity"]["level"], 1);

        let (_, json) = get_json(router.clone(), "/api/severity?model=exponent").await;
        assert_eq!(json[0]["severity"]["model"], "exponent");

        let (status, _) = get_json(router, "/api/severity?model=cubic").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_critical_scopes() {
        let router = app(vec![Snapshot::new(1_000, readings())]).await;

        let (_, json) = get_json(router.clone(), "/api/critical").await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["segmentId"], 3);

        let (_, json) = get_json(router.clone(), "/api/critical?scope=safe").await;
        assert_eq!(json.as_array().unwrap().len(), 2);

        let (status, _) = get_json(router, "/api/critical?scope=everything").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_filter_query_and_preset() {
        let router = app(vec![Snapshot::new(1_000, readings())]).await;

        let (_, json) = get_json(router.clone(), "/api/filter?waterMin=0.8&status=WARNING").await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["cameras"].as_array().unwrap().len(), 2);

        // Malformed values are ignored.
        let (status, json) = get_json(router.clone(), "/api/filter?waterMin=lots&maxSeverity=9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cameras"].as_array().unwrap().len(), 3);

        let (_, json) = get_json(router.clone(), "/api/filter?preset=immediateAction").await;
        assert_eq!(json["applied"]["maxSeverity"], 2);
        assert_eq!(json["cameras"][0]["segmentId"], 3);

        let (_, json) = get_json(router, "/api/filter?descriptionKeywords=debris,grease").await;
        assert_eq!(json["cameras"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_repeated_key_keeps_last() {
        let router = app(vec![Snapshot::new(1_000, readings())]).await;

        let (status, json) =
            get_json(router.clone(), "/api/filter?waterMin=0.1&waterMin=0.88").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["applied"]["waterMin"], 0.88);
        assert_eq!(json["cameras"].as_array().unwrap().len(), 1);
        assert_eq!(json["cameras"][0]["segmentId"], 3);

        let (status, json) = get_json(router, "/api/filter?preset=highWater&preset=nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["cameras"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_filter_body() {
        let router = app(vec![Snapshot::new(1_000, readings())]).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/filter")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"unreliableSensors": true, "preset": "highWater"}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<u64> = json["cameras"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["segmentId"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_presets_and_levels() {
        let router = app(vec![]).await;
        let (_, json) = get_json(router.clone(), "/api/presets").await;
        assert_eq!(json.as_array().unwrap().len(), filter::presets().len());
        assert_eq!(json[0]["key"], "criticalOnly");

        let (_, json) = get_json(router, "/api/levels").await;
        assert_eq!(json[0]["level"], 1);
        assert_eq!(json[4]["label"], "Safe/Clear");
    }

    #[tokio::test]
    async fn test_insights_and_analysis() {
        let router = app(vec![
            Snapshot::new(1_000, readings()),
            Snapshot::new(2_000, readings()),
        ])
        .await;

        let (_, json) = get_json(router.clone(), "/api/insights").await;
        assert_eq!(json["summary"]["totalDataPoints"], 2);
        assert_eq!(json["criticalAreas"].as_array().unwrap().len(), 2);

        let (_, json) = get_json(router.clone(), "/api/analysis").await;
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["fallbackInsights"][0]["type"], "CRITICAL_ALERT");

        let (_, json) = get_json(router, "/api/segments/insights?segment=1").await;
        assert_eq!(json[0]["title"], "Low Light Level");
    }

    #[tokio::test]
    async fn test_playback() {
        let router = app(vec![
            Snapshot::new(1_000, readings()),
            Snapshot::new(8_000, readings()),
        ])
        .await;

        let (_, json) = get_json(router.clone(), "/api/history/range").await;
        assert_eq!(json["min"], 1_000);
        assert_eq!(json["max"], 8_000);

        let (_, json) = get_json(router.clone(), "/api/history/at?timestamp=5000").await;
        assert_eq!(json["timestamp"], 1_000);

        let (status, _) = get_json(router, "/api/history/at").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_is_event_stream() {
        let router = app(vec![Snapshot::new(1_000, readings())]).await;
        let response = router
            .oneshot(Request::builder().uri("/api/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );
    }
}
