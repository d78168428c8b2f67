use crate::state;
use crate::types::event::event_date;
use crate::types::notification::Notification;
use crate::worker::{WorkerEvent, WorkerGone, WorkerMessage, WorkerOutcome};

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Serialize, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

type WorkerResult = Result<Json<WorkerOutcome>, (StatusCode, Json<ErrorResponse>)>;

fn worker_unavailable(err: WorkerGone) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

async fn dispatch(state: &state::AppState, event: WorkerEvent) -> WorkerResult {
    state
        .worker
        .dispatch(event)
        .await
        .map(Json)
        .map_err(worker_unavailable)
}

pub(crate) async fn push(State(state): State<state::AppState>, body: Bytes) -> WorkerResult {
    let data = (!body.is_empty()).then(|| body.to_vec());
    dispatch(&state, WorkerEvent::Push(data)).await
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClickQuery {
    pub(crate) action: Option<String>,
}

pub(crate) async fn notification_click(
    State(state): State<state::AppState>,
    Path(tag): Path<String>,
    Query(query): Query<ClickQuery>,
) -> WorkerResult {
    let action = query.action.filter(|action| !action.is_empty());
    dispatch(&state, WorkerEvent::NotificationClick { tag, action }).await
}

pub(crate) async fn notification_close(
    State(state): State<state::AppState>,
    Path(tag): Path<String>,
) -> WorkerResult {
    dispatch(&state, WorkerEvent::NotificationClose { tag }).await
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncRequest {
    pub(crate) tag: String,
}

pub(crate) async fn sync(
    State(state): State<state::AppState>,
    Json(request): Json<SyncRequest>,
) -> WorkerResult {
    dispatch(&state, WorkerEvent::Sync { tag: request.tag }).await
}

pub(crate) async fn message(
    State(state): State<state::AppState>,
    Json(message): Json<WorkerMessage>,
) -> WorkerResult {
    dispatch(&state, WorkerEvent::Message(message)).await
}

pub(crate) async fn notifications_debug(
    State(state): State<state::AppState>,
) -> Json<Vec<Notification>> {
    let active = state
        .active
        .lock()
        .expect("active notifications lock")
        .clone();
    Json(active)
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ReminderScheduleDebugResponse {
    #[serde(with = "event_date")]
    pub(crate) server_time: OffsetDateTime,
    pub(crate) scheduled: Vec<ReminderScheduleEntry>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ReminderScheduleEntry {
    pub(crate) event_id: i64,
    pub(crate) event_title: String,
    #[serde(with = "event_date")]
    pub(crate) event_date: OffsetDateTime,
    #[serde(with = "event_date")]
    pub(crate) fire_at: OffsetDateTime,
    #[serde(with = "event_date")]
    pub(crate) scheduled_at: OffsetDateTime,
    pub(crate) finished: bool,
}

pub(crate) async fn reminders_debug(
    State(state): State<state::AppState>,
) -> Json<ReminderScheduleDebugResponse> {
    let server_time = OffsetDateTime::now_utc();
    let scheduled = {
        let handles = state.scheduled.lock().expect("scheduled reminders lock");
        handles
            .iter()
            .map(|handle| ReminderScheduleEntry {
                event_id: handle.reminder.event_id,
                event_title: handle.reminder.event_title.clone(),
                event_date: handle.reminder.event_date,
                fire_at: handle.fire_at,
                scheduled_at: handle.scheduled_at,
                finished: handle.is_finished(),
            })
            .collect()
    };
    Json(ReminderScheduleDebugResponse {
        server_time,
        scheduled,
    })
}
