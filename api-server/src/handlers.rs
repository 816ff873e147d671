use std::sync::PoisonError;

use actix_web::{
    http::StatusCode,
    web::{Data, Json, Path, Query},
    HttpResponse, Responder,
};
use quiver_core::{Distance, DistancePreset, SessionId, ShootingSession, VolleyRecord};
use quiver_host::{
    capture::target_shot, config::check_arrows, summarize_sessions, summarize_volleys,
    HistoryFilter, SessionSummary, VolleySummary,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::response::{json_error_with_code, registry_error, session_not_found, volley_error};
use crate::sessions::{PendingShot, SessionView};
use crate::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreQuery {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct DistancesQuery {
    #[serde(default)]
    preset: Option<DistancePreset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSessionRequest {
    /// Arrows per volley (3 or 6); defaults to the server setting
    #[serde(default)]
    arrows: Option<usize>,
    /// Distance in metres; defaults to the first one of the preset
    #[serde(default)]
    distance: Option<Distance>,
    #[serde(default)]
    preset: Option<DistancePreset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShotRequest {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    distance: Option<Distance>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    success: bool,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct ShotResponse {
    success: bool,
    shot: PendingShot,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct CommitResponse {
    success: bool,
    volley_number: u32,
    total: u32,
    records: Vec<VolleyRecord>,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    success: bool,
    records: Vec<VolleyRecord>,
    volleys: Vec<VolleySummary>,
    sessions: Vec<SessionSummary>,
}

// API Handlers

/// GET /health
pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "quiver-api",
        "sessions": state.sessions.len().await,
    }))
}

/// GET /api/score?x=&y=
pub(crate) async fn score(query: Query<ScoreQuery>) -> impl Responder {
    match target_shot(query.x, query.y) {
        Ok(shot) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "x": shot.x,
            "y": shot.y,
            "score": shot.score(),
        })),
        Err(e) => json_error_with_code(
            StatusCode::UNPROCESSABLE_ENTITY,
            e.to_string(),
            Some("invalid_coordinates"),
        ),
    }
}

/// GET /api/distances?preset=
pub(crate) async fn distances(
    state: Data<AppState>,
    query: Query<DistancesQuery>,
) -> impl Responder {
    let preset = query.preset.unwrap_or(state.defaults.preset);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "preset": preset,
        "distances": preset.metres(),
        "default": preset.default_distance(),
    }))
}

/// POST /api/sessions
/// Start a new shooting session for one archer
pub(crate) async fn create_session(
    state: Data<AppState>,
    req: Json<CreateSessionRequest>,
) -> impl Responder {
    let arrows = match check_arrows(req.arrows.unwrap_or(state.defaults.arrows)) {
        Ok(arrows) => arrows,
        Err(e) => {
            return json_error_with_code(StatusCode::UNPROCESSABLE_ENTITY, e, Some("invalid_arrows"))
        }
    };

    let preset = req.preset.unwrap_or(state.defaults.preset);
    let distance = match req.distance {
        Some(distance) => match preset.check(distance) {
            Ok(distance) => distance,
            Err(e) => {
                return json_error_with_code(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    e.to_string(),
                    Some("invalid_distance"),
                )
            }
        },
        None => preset.default_distance(),
    };

    let session = match ShootingSession::start(arrows, distance, state.clock.as_ref()) {
        Ok(session) => session,
        Err(e) => return volley_error(e),
    };

    match state.sessions.insert(session, preset).await {
        Ok(view) => {
            tracing::info!(
                "Started session {} ({} m, {} arrows) as {}",
                view.session_id,
                view.distance,
                view.capacity,
                view.handle
            );
            HttpResponse::Created().json(SessionResponse {
                success: true,
                session: view,
            })
        }
        Err(e) => {
            tracing::warn!("Could not start session: {}", e);
            registry_error(e)
        }
    }
}

/// GET /api/sessions/{handle}
pub(crate) async fn get_session(state: Data<AppState>, handle: Path<Uuid>) -> impl Responder {
    match state.sessions.view(handle.into_inner()).await {
        Some(view) => HttpResponse::Ok().json(SessionResponse {
            success: true,
            session: view,
        }),
        None => session_not_found(),
    }
}

/// POST /api/sessions/{handle}/shots
/// Add one arrow to the current volley
pub(crate) async fn add_shot(
    state: Data<AppState>,
    handle: Path<Uuid>,
    req: Json<ShotRequest>,
) -> impl Responder {
    let shot = match target_shot(req.x, req.y) {
        Ok(shot) => shot,
        Err(e) => {
            return json_error_with_code(
                StatusCode::UNPROCESSABLE_ENTITY,
                e.to_string(),
                Some("invalid_coordinates"),
            )
        }
    };

    let outcome = state
        .sessions
        .with_session(handle.into_inner(), |s| s.add(shot))
        .await;

    match outcome {
        Err(e) => registry_error(e),
        Ok((Err(e), _)) => {
            tracing::warn!("Rejected shot: {}", e);
            volley_error(e)
        }
        Ok((Ok(()), view)) => HttpResponse::Ok().json(ShotResponse {
            success: true,
            shot: PendingShot {
                arrow_index: view.pending.len(),
                x: shot.x,
                y: shot.y,
                score: shot.score(),
            },
            session: view,
        }),
    }
}

/// POST /api/sessions/{handle}/commit
/// Save the current volley to the log. The write runs off the async workers;
/// arrows are only cleared once it succeeded.
pub(crate) async fn commit(state: Data<AppState>, handle: Path<Uuid>) -> impl Responder {
    let handle = handle.into_inner();
    let records = match state.sessions.begin_commit(handle, state.clock.as_ref()).await {
        Ok(records) => records,
        Err(e) => return registry_error(e),
    };

    let store = state.store.clone();
    let written = tokio::task::spawn_blocking(move || {
        // The store keeps no state in memory, so a poisoned lock is safe to reuse.
        let store = store.lock().unwrap_or_else(PoisonError::into_inner);
        store.append(&records).map(|()| records)
    })
    .await
    .map_err(|err| format!("log writer join failure: {err}"))
    .and_then(|written| written.map_err(|err| err.to_string()));

    let view = match state.sessions.finish_commit(handle, written.is_ok()).await {
        Ok(view) => view,
        Err(e) => return registry_error(e),
    };

    match written {
        Ok(records) => {
            let total: u32 = records.iter().map(|r| u32::from(r.score)).sum();
            let volley_number = records.first().map_or(0, |r| r.volley_number);
            tracing::info!(
                "Saved volley {} of session {}: {} arrows, total {}",
                volley_number,
                view.session_id,
                records.len(),
                total
            );
            HttpResponse::Ok().json(CommitResponse {
                success: true,
                volley_number,
                total,
                records,
                session: view,
            })
        }
        Err(e) => {
            tracing::error!("Failed to save volley: {}", e);
            json_error_with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to save volley, arrows kept: {e}"),
                Some("persistence_error"),
            )
        }
    }
}

/// DELETE /api/sessions/{handle}
pub(crate) async fn delete_session(state: Data<AppState>, handle: Path<Uuid>) -> impl Responder {
    let handle = handle.into_inner();
    match state.sessions.remove(handle).await {
        Ok(discarded) => {
            if discarded > 0 {
                tracing::warn!("Session {} closed with {} unsaved arrows", handle, discarded);
            }
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "discarded_arrows": discarded,
            }))
        }
        Err(e) => registry_error(e),
    }
}

/// GET /api/history?session_id=&distance=
pub(crate) async fn history(state: Data<AppState>, query: Query<HistoryQuery>) -> impl Responder {
    let records = {
        let store = state.store.lock().unwrap_or_else(PoisonError::into_inner);
        store.read_all()
    };

    let records = match records {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to read shot log: {}", e);
            return json_error_with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.to_string(),
                Some("persistence_error"),
            );
        }
    };

    let query = query.into_inner();
    let filter = HistoryFilter {
        session_id: query.session_id.map(SessionId::new),
        distance: query.distance,
    };
    let records = filter.apply(records);

    HttpResponse::Ok().json(HistoryResponse {
        success: true,
        volleys: summarize_volleys(&records),
        sessions: summarize_sessions(&records),
        records,
    })
}
