use crate::state;

use axum::Router;
use axum::routing::get;
use axum::routing::post;

mod worker;

pub fn app(state: state::AppState) -> Router {
    Router::new()
        .route("/push", post(worker::push))
        .route(
            "/notifications/{tag}/click",
            post(worker::notification_click),
        )
        .route(
            "/notifications/{tag}/close",
            post(worker::notification_close),
        )
        .route("/sync", post(worker::sync))
        .route("/message", post(worker::message))
        .route(
            "/api/debug/notifications",
            get(worker::notifications_debug),
        )
        .route("/api/debug/reminders", get(worker::reminders_debug))
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(non_snake_case)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::TokioTimeProvider;
    use crate::config;
    use crate::notifications::NotificationCenter;
    use crate::reminders::new_registry;
    use crate::test_support::{FixedPermission, MemoryPending, RecordingNotifier, TestClients};
    use crate::types::notification::{Notification, Permission};
    use crate::worker::{REMINDER_SYNC_TAG, ServiceWorker, WorkerOutcome};
    use axum::body::Body;
    use axum::body::to_bytes;
    use axum::http::Request;
    use axum::http::StatusCode;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::from_slice as json_from_slice;
    use tower::ServiceExt;

    fn test_state(clients: TestClients) -> state::AppState {
        let center = NotificationCenter::new(
            RecordingNotifier::default(),
            FixedPermission::new(Permission::Granted),
        );
        let active = center.active_handle();
        let scheduled = new_registry();
        let worker = ServiceWorker::new(
            TokioTimeProvider,
            center,
            clients,
            MemoryPending::default(),
            scheduled.clone(),
        )
        .spawn();
        state::AppState {
            config: config::AppConfig::default(),
            worker,
            active,
            scheduled,
        }
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        json_from_slice(&body).expect("parse json")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn app__should_return_ok_on_health_endpoint() {
        let response = app(test_state(TestClients::new(&[])))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn push__should_display_and_list_active_notification() {
        // Given
        let router = app(test_state(TestClients::new(&[])));

        // When
        let response = router
            .clone()
            .oneshot(post_json("/push", r#"{"title":"T","body":"B","tag":"x"}"#))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let outcome: WorkerOutcome = body_json(response).await;
        assert_eq!(outcome, WorkerOutcome::Displayed { tag: "x".to_string() });

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/debug/notifications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");
        let active: Vec<Notification> = body_json(response).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "T");
    }

    #[tokio::test]
    async fn push__should_ignore_empty_body() {
        let response = app(test_state(TestClients::new(&[])))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/push")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        let outcome: WorkerOutcome = body_json(response).await;
        assert_eq!(outcome, WorkerOutcome::Ignored);
    }

    #[tokio::test]
    async fn notification_click__should_open_target_url() {
        // Given
        let clients = TestClients::new(&[]);
        let router = app(test_state(clients.clone()));
        router
            .clone()
            .oneshot(post_json("/push", r#"{"title":"T","url":"/events/3","tag":"x"}"#))
            .await
            .expect("request failed");

        // When
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/notifications/x/click?action=view")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        let outcome: WorkerOutcome = body_json(response).await;
        assert!(matches!(outcome, WorkerOutcome::Opened(ref window) if window.url == "/events/3"));
        assert_eq!(clients.opened(), vec!["/events/3".to_string()]);
    }

    #[tokio::test]
    async fn notification_close__should_report_closed() {
        let response = app(test_state(TestClients::new(&[])))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/notifications/x/close")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        let outcome: WorkerOutcome = body_json(response).await;
        assert_eq!(outcome, WorkerOutcome::Closed);
    }

    #[tokio::test]
    async fn sync__should_report_delivered_count() {
        let body = format!(r#"{{"tag":"{REMINDER_SYNC_TAG}"}}"#);

        let response = app(test_state(TestClients::new(&[])))
            .oneshot(post_json("/sync", &body))
            .await
            .expect("request failed");

        let outcome: WorkerOutcome = body_json(response).await;
        assert_eq!(outcome, WorkerOutcome::Synced { delivered: 0 });
    }

    #[tokio::test]
    async fn message__should_arm_reminder_and_list_it() {
        // Given
        let router = app(test_state(TestClients::new(&[])));
        let event_date = time::OffsetDateTime::now_utc() + time::Duration::days(2);
        let event_date = event_date
            .format(&time::format_description::well_known::Rfc3339)
            .expect("format");
        let body = format!(
            r#"{{"type":"SCHEDULE_REMINDER","reminder":{{"eventId":9,"eventTitle":"Jam","eventDate":"{event_date}"}}}}"#
        );

        // When
        let response = router
            .clone()
            .oneshot(post_json("/message", &body))
            .await
            .expect("request failed");

        // Then
        let outcome: WorkerOutcome = body_json(response).await;
        assert_eq!(outcome, WorkerOutcome::Scheduled { armed: true });

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/debug/reminders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");
        assert_eq!(response.status(), StatusCode::OK);
        let debug: worker::ReminderScheduleDebugResponse = body_json(response).await;
        assert!(debug.server_time.unix_timestamp() > 0);
        assert_eq!(debug.scheduled.len(), 1);
        assert_eq!(debug.scheduled[0].event_id, 9);
        assert!(!debug.scheduled[0].finished);
    }
}
