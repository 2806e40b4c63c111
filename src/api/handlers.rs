//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, GroupRecord, MeasureRecord, MeasuresQuery};
use crate::audit::{Advisory, AuditSummary};
use crate::energy::EvaluationPass;

fn bad_request(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// `GET /summary` → 200 + `AuditSummary` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<AuditSummary> {
    Json(state.summary.clone())
}

/// Returns measure results in evaluation order.
///
/// `GET /measures` → every result
/// `GET /measures?pass=first|cumulative` → one pass
/// `GET /measures?accepted=true` → committed results only
/// `GET /measures?pass=base` → 400 + `ErrorResponse`
pub async fn get_measures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MeasuresQuery>,
) -> impl IntoResponse {
    let pass = match query.pass.as_deref() {
        None => None,
        Some("first") => Some(EvaluationPass::FirstPass),
        Some("cumulative") => Some(EvaluationPass::Cumulative),
        Some(other) => {
            return Err(bad_request(format!(
                "`pass` must be \"first\" or \"cumulative\", got \"{other}\""
            )));
        }
    };
    let accepted_only = query.accepted.unwrap_or(false);

    let records: Vec<MeasureRecord> = state
        .outcome
        .results()
        .iter()
        .enumerate()
        .filter(|(_, r)| pass.is_none_or(|p| r.pass == p))
        .filter(|(_, r)| !accepted_only || r.committed)
        .map(|(i, r)| MeasureRecord::new(i, r))
        .collect();

    Ok(Json(records))
}

/// `GET /ranking` → 200 + groups of the accepted package in report order
pub async fn get_ranking(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let results = &state.outcome.results;
    let groups = results.grouped().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;
    let body: Vec<GroupRecord> = groups
        .into_iter()
        .map(|(group, indices)| GroupRecord {
            group,
            measures: indices
                .into_iter()
                .filter_map(|i| results.get(i).map(|r| MeasureRecord::new(i, r)))
                .collect(),
        })
        .collect();
    Ok::<_, (StatusCode, Json<ErrorResponse>)>(Json(body))
}

/// `GET /advisories` → 200 + advisory list in the order recorded
pub async fn get_advisories(State(state): State<Arc<AppState>>) -> Json<Vec<Advisory>> {
    Json(state.outcome.advisories().to_vec())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::audit::PassOrchestrator;
    use crate::config::AuditConfig;
    use crate::dwelling::{DwellingInput, DwellingState};

    fn make_test_state() -> Arc<AppState> {
        let outcome = PassOrchestrator::from_config(AuditConfig::default())
            .unwrap()
            .run(DwellingState::from(DwellingInput::sample()))
            .unwrap();
        Arc::new(AppState::new(outcome))
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(state);
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn summary_returns_200() {
        let (status, json) = get_json(make_test_state(), "/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.get("package_sir").is_some());
        assert!(json.get("base_mmbtu").is_some());
    }

    #[tokio::test]
    async fn measures_returns_every_result() {
        let state = make_test_state();
        let expected = state.outcome.results().len();
        let (status, json) = get_json(state, "/measures").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(expected));
    }

    #[tokio::test]
    async fn measures_filters_accepted_cumulative() {
        let state = make_test_state();
        let expected = state.outcome.totals().committed_count;
        let (status, json) = get_json(state, "/measures?pass=cumulative&accepted=true").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), expected);
        assert!(rows.iter().all(|r| r["committed"] == true));
        assert!(rows.iter().all(|r| r["pass"] == "cumulative"));
    }

    #[tokio::test]
    async fn unknown_pass_returns_400() {
        let (status, json) = get_json(make_test_state(), "/measures?pass=base").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn ranking_is_grouped() {
        let state = make_test_state();
        let ranked = state.outcome.ranking.len();
        let (status, json) = get_json(state, "/ranking").await;
        assert_eq!(status, StatusCode::OK);
        let groups = json.as_array().cloned().unwrap_or_default();
        assert!(!groups.is_empty());
        let total: usize = groups
            .iter()
            .map(|g| g["measures"].as_array().map_or(0, Vec::len))
            .sum();
        assert_eq!(total, ranked);
    }

    #[tokio::test]
    async fn advisories_is_a_list() {
        let (status, json) = get_json(make_test_state(), "/advisories").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.is_array());
    }
}
