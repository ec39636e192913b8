use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::{parse_body, ApiError, DeletedResponse};
use crate::models::{is_truthy, ImprovementTicket, TicketDraft, Timestamp};
use crate::normalize::{normalize_ticket, validate_ticket};

/// Body of `PATCH /api/improvements/:id`.
#[derive(Debug, Deserialize)]
pub struct TogglePayload {
    #[serde(default)]
    pub completed: Value,
}

pub async fn list_improvements(
    State(state): State<AppState>,
) -> Result<Json<Vec<ImprovementTicket>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_tickets()?))
}

pub async fn create_improvement(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImprovementTicket>), ApiError> {
    let draft: TicketDraft = parse_body(&body)?;
    validate_ticket(&draft)?;

    let ticket = normalize_ticket(draft, Utc::now());
    state.store.write().await.upsert_ticket(&ticket)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn toggle_improvement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ImprovementTicket>, ApiError> {
    let payload: TogglePayload = parse_body(&body)?;
    let completed = is_truthy(&payload.completed);

    state
        .store
        .write()
        .await
        .set_ticket_completed(&id, completed, Timestamp::now())?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("improvement {}", id)))
}

pub async fn delete_improvement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.write().await.delete_ticket(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("improvement {}", id)))
    }
}

pub async fn delete_all_improvements(
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = state.store.write().await.delete_all_tickets()?;
    Ok(Json(DeletedResponse { deleted }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::testing::{get_json, send, setup_state};
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_create_and_list_tickets() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(tmp.path()));

        let (status, ticket) = send(
            app.clone(),
            "POST",
            "/api/improvements",
            Some(json!({"id": "t1", "title": "Use cooldowns", "completed": "yes"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(ticket["completed"], true);
        assert!(ticket["completedAt"].is_string());
        assert!(ticket["createdAt"].is_string());

        send(
            app.clone(),
            "POST",
            "/api/improvements",
            Some(json!({"id": "t2", "title": "Group up", "completedAt": "2024-01-01T00:00:00Z"})),
        )
        .await;

        let (status, list) = get_json(app, "/api/improvements").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["id"], "t2");
        assert_eq!(list[0]["completedAt"], Value::Null);
        assert_eq!(list[1]["id"], "t1");
    }

    #[tokio::test]
    async fn test_ticket_requires_title() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(tmp.path()));

        let (status, json) = send(
            app,
            "POST",
            "/api/improvements",
            Some(json!({"id": "t1", "title": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Bad request: title is required");
    }

    #[tokio::test]
    async fn test_toggle_sets_and_clears_completed_at() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(tmp.path()));
        send(
            app.clone(),
            "POST",
            "/api/improvements",
            Some(json!({"id": "t1", "title": "Warm up"})),
        )
        .await;

        let (status, ticket) = send(
            app.clone(),
            "PATCH",
            "/api/improvements/t1",
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ticket["completed"], true);
        assert!(ticket["completedAt"].is_string());

        let (_, ticket) = send(
            app.clone(),
            "PATCH",
            "/api/improvements/t1",
            Some(json!({"completed": false})),
        )
        .await;
        assert_eq!(ticket["completed"], false);
        assert_eq!(ticket["completedAt"], Value::Null);

        let (status, _) = send(
            app,
            "PATCH",
            "/api/improvements/missing",
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_tickets() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(tmp.path()));
        for id in ["t1", "t2"] {
            send(
                app.clone(),
                "POST",
                "/api/improvements",
                Some(json!({"id": id, "title": "x"})),
            )
            .await;
        }

        let (status, _) = send(app.clone(), "DELETE", "/api/improvements/t1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app.clone(), "DELETE", "/api/improvements/t1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, json) = send(app, "DELETE", "/api/improvements", None).await;
        assert_eq!(json, json!({"deleted": 1}));
    }
}
