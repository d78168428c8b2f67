//! Thin client for the Eventify REST backend. Every call is a single request;
//! nothing is retried or cached.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ApiError;
use crate::types::event::{AdminStats, Event, EventDraft, EventId};
use crate::types::notification::NotificationRecord;
use crate::types::preferences::NotificationPreferences;
use crate::types::session::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { username, password });
        self.send(request).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.http.post(self.url("/api/auth/register")).json(&RegisterRequest {
            username,
            email,
            password,
        });
        self.send_message(request).await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.send(self.http.get(self.url("/api/events"))).await
    }

    pub async fn event(&self, id: EventId) -> Result<Event, ApiError> {
        self.send(self.http.get(self.url(&format!("/api/events/{id}"))))
            .await
    }

    pub async fn update_event(
        &self,
        headers: HeaderMap,
        id: EventId,
        draft: &EventDraft,
    ) -> Result<Value, ApiError> {
        let request = self
            .http
            .put(self.url(&format!("/api/events/{id}")))
            .headers(headers)
            .json(draft);
        self.send(request).await
    }

    pub async fn delete_event(&self, headers: HeaderMap, id: EventId) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/events/{id}")))
            .headers(headers);
        self.send_raw(request).await.map(|_| ())
    }

    pub async fn register_for_event(
        &self,
        headers: HeaderMap,
        id: EventId,
    ) -> Result<MessageResponse, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/eventregister/{id}")))
            .headers(headers)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.send_message(request).await
    }

    pub async fn my_registrations(&self, headers: HeaderMap) -> Result<Vec<Event>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/my-registrations"))
            .headers(headers);
        self.send(request).await
    }

    pub async fn notification_preferences(
        &self,
        headers: HeaderMap,
    ) -> Result<NotificationPreferences, ApiError> {
        let request = self
            .http
            .get(self.url("/api/notification-preferences"))
            .headers(headers);
        self.send(request).await
    }

    /// PUTs any subset of the preference flags.
    pub async fn update_notification_preferences<B: Serialize + ?Sized>(
        &self,
        headers: HeaderMap,
        body: &B,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .put(self.url("/api/notification-preferences"))
            .headers(headers)
            .json(body);
        self.send_raw(request).await.map(|_| ())
    }

    pub async fn test_notification(&self, headers: HeaderMap) -> Result<Value, ApiError> {
        let request = self
            .http
            .post(self.url("/api/test-notification"))
            .headers(headers);
        self.send(request).await
    }

    pub async fn notifications(&self, headers: HeaderMap) -> Result<Vec<NotificationRecord>, ApiError> {
        let request = self.http.get(self.url("/api/notifications")).headers(headers);
        self.send(request).await
    }

    pub async fn delete_notification(&self, headers: HeaderMap, id: i64) -> Result<(), ApiError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/notifications/{id}")))
            .headers(headers);
        self.send_raw(request).await.map(|_| ())
    }

    pub async fn admin_stats(&self, headers: HeaderMap) -> Result<AdminStats, ApiError> {
        let request = self.http.get(self.url("/api/admin/stats")).headers(headers);
        self.send(request).await
    }

    pub async fn admin_events(
        &self,
        headers: HeaderMap,
        limit: Option<u32>,
    ) -> Result<Vec<Event>, ApiError> {
        let mut request = self.http.get(self.url("/api/admin/events")).headers(headers);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.send(request).await
    }

    pub async fn create_event(&self, headers: HeaderMap, draft: &EventDraft) -> Result<Value, ApiError> {
        let request = self
            .http
            .post(self.url("/api/admin/events"))
            .headers(headers)
            .json(draft);
        self.send(request).await
    }

    pub async fn analytics(&self, headers: HeaderMap, timeframe: &str) -> Result<Value, ApiError> {
        let request = self
            .http
            .get(self.url("/api/stats"))
            .headers(headers)
            .query(&[("timeframe", timeframe)]);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(request).await?;
        decode_body(&body)
    }

    async fn send_message(&self, request: RequestBuilder) -> Result<MessageResponse, ApiError> {
        let body: Value = self.send(request).await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let request = request
            .build()
            .map_err(|err| ApiError::Request(err.to_string()))?;
        debug!(method = %request.method(), url = %request.url(), "api request");
        let response = self.http.execute(request).await.map_err(ApiError::Network)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Network)?;
        if !status.is_success() {
            debug!(%status, "api request failed");
            return Err(ApiError::Status {
                status,
                message: error_message(&body),
            });
        }
        Ok(body.to_vec())
    }
}

/// An empty body decodes as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.trim_ascii().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Body for the push toggle: enabling also switches the one-hour reminder on.
pub fn push_toggle_body(enabled: bool) -> Value {
    if enabled {
        json!({
            "push_enabled": true,
            "event_reminders": true,
            "one_hour_before": true,
        })
    } else {
        json!({ "push_enabled": false })
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::test_support::spawn_backend;
    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap as AxumHeaderMap, StatusCode};
    use axum::routing::{get, post};
    use reqwest::header::AUTHORIZATION;
    use std::collections::HashMap;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers
    }

    #[test]
    fn error_message__should_prefer_message_then_error() {
        assert_eq!(
            error_message(br#"{"message": "Event is full", "error": "x"}"#).as_deref(),
            Some("Event is full")
        );
        assert_eq!(
            error_message(br#"{"error": "Forbidden"}"#).as_deref(),
            Some("Forbidden")
        );
        assert_eq!(error_message(b"<html>oops</html>"), None);
    }

    #[test]
    fn push_toggle_body__should_enable_reminders_with_push() {
        assert_eq!(
            push_toggle_body(true),
            json!({"push_enabled": true, "event_reminders": true, "one_hour_before": true})
        );
        assert_eq!(push_toggle_body(false), json!({"push_enabled": false}));
    }

    #[test]
    fn new__should_strip_trailing_slash() {
        assert_eq!(
            ApiClient::new(" http://api.test/ ").url("/api/events"),
            "http://api.test/api/events"
        );
    }

    #[tokio::test]
    async fn list_events__should_decode_events() {
        // Given
        let router = Router::new().route(
            "/api/events",
            get(|| async {
                Json(json!([
                    {"id": 1, "title": "Tech Conference", "date": "2025-10-15T09:00:00Z", "capacity": 500, "registrations": 342},
                    {"id": 2, "title": "Workshop", "date": "2025-10-20", "capacity": 50}
                ]))
            }),
        );
        let client = ApiClient::new(&spawn_backend(router).await);

        // When
        let events = client.list_events().await.expect("list events");

        // Then
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].available_spots(), 158);
        assert_eq!(events[1].available_spots(), 50);
    }

    #[tokio::test]
    async fn my_registrations__should_send_bearer_token() {
        // Given
        let router = Router::new().route(
            "/api/my-registrations",
            get(|headers: AxumHeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth == "Bearer t1" {
                    (StatusCode::OK, Json(json!([{"id": 5, "title": "Jam"}])))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token missing"})))
                }
            }),
        );
        let client = ApiClient::new(&spawn_backend(router).await);

        // When
        let authorized = client.my_registrations(bearer("t1")).await;
        let anonymous = client.my_registrations(HeaderMap::new()).await;

        // Then
        assert_eq!(authorized.expect("registrations")[0].id, 5);
        let err = anonymous.expect_err("should be rejected");
        assert_eq!(err.server_message(), Some("Token missing"));
    }

    #[tokio::test]
    async fn register_for_event__should_return_server_message() {
        // Given
        let router = Router::new().route(
            "/api/eventregister/{id}",
            post(|Path(id): Path<i64>| async move {
                if id == 1 {
                    (StatusCode::OK, Json(json!({"message": "Registered!"})))
                } else {
                    (StatusCode::BAD_REQUEST, Json(json!({"message": "Event is full"})))
                }
            }),
        );
        let client = ApiClient::new(&spawn_backend(router).await);

        // When
        let ok = client.register_for_event(bearer("t"), 1).await.expect("register");
        let full = client.register_for_event(bearer("t"), 2).await;

        // Then
        assert_eq!(ok.message.as_deref(), Some("Registered!"));
        assert_eq!(
            full.expect_err("full").user_message("Failed to register for event"),
            "Event is full"
        );
    }

    #[tokio::test]
    async fn admin_events__should_pass_limit_query() {
        // Given
        let router = Router::new().route(
            "/api/admin/events",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                let limit: usize = query
                    .get("limit")
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(10);
                let events: Vec<_> = (0..limit).map(|id| json!({"id": id})).collect();
                Json(json!(events))
            }),
        );
        let client = ApiClient::new(&spawn_backend(router).await);

        // When
        let events = client.admin_events(bearer("admin"), Some(5)).await.expect("events");

        // Then
        assert_eq!(events.len(), 5);
    }

    #[tokio::test]
    async fn delete_event__should_accept_empty_body() {
        // Given
        let router = Router::new().route(
            "/api/events/{id}",
            axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
        );
        let client = ApiClient::new(&spawn_backend(router).await);

        // Then
        client.delete_event(bearer("admin"), 3).await.expect("delete");
    }

    #[tokio::test]
    async fn list_events__should_report_network_errors() {
        // Given
        let client = ApiClient::new("http://127.0.0.1:1");

        // When
        let err = client.list_events().await.expect_err("no backend");

        // Then
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(
            err.user_message("whatever"),
            "Network error - please check if backend is running"
        );
    }
}
