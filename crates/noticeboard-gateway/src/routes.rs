//! HTTP surface for the message board
//!
//! Each handler runs extract → validate → typed store call. Nothing reaches
//! the store until every input has been parsed into its typed form.

use crate::auth::{Tenant, TenantResolver};
use crate::error::{ApiError, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, put},
    Json, Router,
};
use noticeboard_persistence::{compile, ListQuery, MessageStore, Sort};
use noticeboard_types::{
    field_errors, Column, DeleteOutcome, DeleteRequest, FieldError, Message, MessageDraft,
    MessageId, SortDirection, StatusChange, StatusOutcome,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use validator::Validate;

#[derive(Clone)]
pub struct AppState {
    pub store: MessageStore,
    pub resolver: Arc<dyn TenantResolver>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route(
            "/message",
            get(list_messages).post(create_message).delete(delete_messages),
        )
        .route("/message/status", put(update_statuses))
        .route("/message/:id", put(update_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    filter: Option<String>,
    sort_column: Option<String>,
    sort_type: Option<String>,
    page: Option<String>,
}

impl ListParams {
    /// Compile every parameter, reporting all failures together
    fn into_query(self) -> Result<ListQuery> {
        let mut errors = Vec::new();

        let predicates = match compile(self.filter.as_deref().unwrap_or_default()) {
            Ok(predicates) => predicates,
            Err(e) => {
                errors.extend(e.errors);
                Vec::new()
            }
        };

        let mut sort = Sort::default();
        if let Some(raw) = self.sort_column.filter(|s| !s.is_empty()) {
            match raw.parse::<Column>() {
                Ok(column) => sort.column = column,
                Err(_) => errors.push(FieldError::new("sortColumn", "oneof", raw, Column::allowed())),
            }
        }
        if let Some(raw) = self.sort_type.filter(|s| !s.is_empty()) {
            match raw.parse::<SortDirection>() {
                Ok(direction) => sort.direction = direction,
                Err(_) => errors.push(FieldError::new("sortType", "oneof", raw, "asc desc")),
            }
        }

        let mut page = 1;
        if let Some(raw) = self.page.filter(|s| !s.is_empty()) {
            match raw.parse::<i64>() {
                Ok(n) => page = n,
                Err(_) => errors.push(FieldError::new("page", "numeric", raw, "")),
            }
        }

        if errors.is_empty() {
            Ok(ListQuery::new(predicates, sort, page))
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

async fn list_messages(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Message>>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = params.into_query()?;

    let messages = state.store.list(&tenant, &query).await?;
    Ok(Json(messages))
}

fn validated_draft(payload: std::result::Result<Json<MessageDraft>, JsonRejection>) -> Result<MessageDraft> {
    let Json(draft) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    draft
        .validate()
        .map_err(|e| ApiError::Validation(field_errors(&e)))?;
    Ok(draft)
}

async fn create_message(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: std::result::Result<Json<MessageDraft>, JsonRejection>,
) -> Result<Json<Message>> {
    let draft = validated_draft(payload)?;
    let message = state.store.create(&tenant, &draft).await?;
    Ok(Json(message))
}

async fn update_message(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(id): Path<String>,
    payload: std::result::Result<Json<MessageDraft>, JsonRejection>,
) -> Result<Json<Message>> {
    let message_id = MessageId::parse(id.as_str())
        .map_err(|_| ApiError::Validation(vec![FieldError::new("id", "hexadecimal", id, "len=32")]))?;
    let draft = validated_draft(payload)?;

    let existing = state
        .store
        .find_owned(&tenant, &message_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let message = state.store.update(&tenant, &existing, &draft).await?;
    Ok(Json(message))
}

/// Bulk bodies must carry at least one item
fn non_empty<T>(payload: std::result::Result<Json<Vec<T>>, JsonRejection>) -> Result<Vec<T>> {
    let Json(items) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if items.is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "body",
            "min",
            serde_json::Value::Array(Vec::new()),
            "min=1",
        )]));
    }
    Ok(items)
}

async fn update_statuses(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: std::result::Result<Json<Vec<StatusChange>>, JsonRejection>,
) -> Result<Json<Vec<StatusOutcome>>> {
    let changes = non_empty(payload)?;
    Ok(Json(state.store.update_statuses(&tenant, &changes).await))
}

async fn delete_messages(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: std::result::Result<Json<Vec<DeleteRequest>>, JsonRejection>,
) -> Result<Json<Vec<DeleteOutcome>>> {
    let requests = non_empty(payload)?;
    Ok(Json(state.store.delete_messages(&tenant, &requests).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTenants;
    use crate::config::TenantCredential;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use noticeboard_persistence::DatabaseConfig;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.db");
        let store = MessageStore::connect(&DatabaseConfig::with_path(path.to_string_lossy()))
            .await
            .unwrap()
            .with_page_size(10);
        let credentials: Vec<TenantCredential> = ["alice", "bob", "carol"]
            .iter()
            .map(|id| TenantCredential {
                id: id.to_string(),
                secret: format!("{}-secret", id),
            })
            .collect();
        let state = AppState {
            store,
            resolver: Arc::new(StaticTenants::new(&credentials).unwrap()),
        };
        (dir, router(state))
    }

    fn request(method: &str, uri: &str, who: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(who) = who {
            let credentials = STANDARD.encode(format!("{}:{}-secret", who, who));
            builder = builder.header(header::AUTHORIZATION, format!("Basic {}", credentials));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn draft(title: &str, introducers: &[&str]) -> Value {
        json!({
            "title": title,
            "content": "short",
            "category": "news",
            "bigContent": "long form",
            "introducerIds": introducers,
        })
    }

    async fn create(app: &Router, who: &str, title: &str, introducers: &[&str]) -> String {
        let (status, body) = send(
            app,
            request("POST", "/message", Some(who), Some(draft(title, introducers))),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["message_id"].as_str().unwrap().to_string()
    }

    fn message_ids(body: &Value) -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|m| m["message_id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_ping_needs_no_credentials() {
        let (_dir, app) = app().await;
        let response = app.oneshot(request("GET", "/ping", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_are_rejected() {
        let (_dir, app) = app().await;
        let (status, body) = send(&app, request("GET", "/message", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);

        let (status, _) = send(&app, request("GET", "/message", Some("mallory"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_list_by_recipient() {
        let (_dir, app) = app().await;
        let id = create(&app, "alice", "Hello", &["bob"]).await;

        let (status, body) = send(&app, request("GET", "/message", Some("bob"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message_ids(&body), vec![id.clone()]);
        assert_eq!(body[0]["sender_ids"], json!(["alice"]));
        assert_eq!(body[0]["status"], 0);

        let (status, body) = send(&app, request("GET", "/message", Some("carol"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(message_ids(&body).is_empty());
    }

    #[tokio::test]
    async fn test_list_rejects_malformed_parameters() {
        let (_dir, app) = app().await;
        let (status, body) = send(
            &app,
            request("GET", "/message?filter=title%20~%20x", Some("bob"), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body[0]["field"], "filter[0].comparator");
        assert_eq!(body[0]["constraint"], "oneof");

        let (status, body) = send(
            &app,
            request(
                "GET",
                "/message?sortColumn=password&sortType=sideways&page=two",
                Some("bob"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["sortColumn", "sortType", "page"]);
    }

    #[tokio::test]
    async fn test_list_filter_and_sort() {
        let (_dir, app) = app().await;
        create(&app, "alice", "beta", &["bob"]).await;
        create(&app, "alice", "alpha", &["bob"]).await;
        create(&app, "alice", "gamma", &["bob"]).await;

        let (status, body) = send(
            &app,
            request(
                "GET",
                "/message?filter=title%20in%20alpha%7Cgamma&sortColumn=title&sortType=asc&page=0",
                Some("bob"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["alpha", "gamma"]);
    }

    #[tokio::test]
    async fn test_create_reports_field_errors() {
        let (_dir, app) = app().await;
        let mut payload = draft("a title well over twenty-five characters", &[]);
        payload["content"] = json!("");

        let (status, body) = send(&app, request("POST", "/message", Some("alice"), Some(payload))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["content", "introducer_ids", "title"]);
        assert_eq!(body[2]["constraint"], "length");
    }

    #[tokio::test]
    async fn test_create_rejects_unparseable_body() {
        let (_dir, app) = app().await;
        let (status, body) = send(
            &app,
            request("POST", "/message", Some("alice"), Some(json!({"title": 5}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_update_is_owner_only() {
        let (_dir, app) = app().await;
        let id = create(&app, "alice", "Before", &["bob"]).await;
        let uri = format!("/message/{}", id);

        let (status, body) = send(
            &app,
            request("PUT", &uri, Some("bob"), Some(draft("Hijack", &["bob"]))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);

        let (status, body) = send(
            &app,
            request("PUT", &uri, Some("alice"), Some(draft("After", &["carol"]))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_id"], json!(id));
        assert_eq!(body["title"], "After");
        assert_eq!(body["introducer_ids"], json!(["carol"]));
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_id() {
        let (_dir, app) = app().await;
        let (status, body) = send(
            &app,
            request("PUT", "/message/not-an-id", Some("alice"), Some(draft("x", &["bob"]))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body[0]["field"], "id");
    }

    #[tokio::test]
    async fn test_bulk_status() {
        let (_dir, app) = app().await;
        let visible = create(&app, "alice", "To bob", &["bob"]).await;
        let hidden = create(&app, "alice", "To carol", &["carol"]).await;

        let (status, _) = send(
            &app,
            request("PUT", "/message/status", Some("bob"), Some(json!([]))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            request(
                "PUT",
                "/message/status",
                Some("bob"),
                Some(json!([
                    {"id": visible, "status": 1},
                    {"id": hidden, "status": 2},
                ])),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"id": visible, "status": 1, "success": true},
                {"id": hidden, "status": 2, "success": false},
            ])
        );

        let (status, _) = send(
            &app,
            request(
                "PUT",
                "/message/status",
                Some("bob"),
                Some(json!([{"id": visible, "status": 7}])),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_delete() {
        let (_dir, app) = app().await;
        let mine = create(&app, "alice", "Mine", &["carol"]).await;
        let theirs = create(&app, "bob", "Theirs", &["carol"]).await;

        let (status, body) = send(
            &app,
            request(
                "DELETE",
                "/message",
                Some("alice"),
                Some(json!([
                    {"messageId": mine, "hardDelete": true},
                    {"messageId": theirs, "hardDelete": false},
                ])),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"id": mine, "hardDelete": true, "success": true},
                {"id": theirs, "hardDelete": false, "success": false},
            ])
        );

        let (_, body) = send(&app, request("GET", "/message", Some("carol"), None)).await;
        assert_eq!(message_ids(&body), vec![theirs]);
    }
}
