use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::wizard::WizardSession;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "offline": state.config.offline,
            "sessionCount": state.sessions.len(),
        }),
    )
}

fn handle_session_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = Uuid::new_v4().to_string();
    state.sessions.insert(session_id.clone(), WizardSession::new());
    ok(&req.id, json!({ "sessionId": session_id }))
}

fn handle_session_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.sessions.get(&session_id) {
        Some(session) => ok(&req.id, session.snapshot()),
        None => err(&req.id, "no_session", "unknown sessionId", None),
    }
}

/// The aggregate has no client-side persistence; discarding a session is the
/// navigation-away/reload path.
fn handle_session_discard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.sessions.remove(&session_id) {
        Some(_) => ok(&req.id, json!({ "ok": true })),
        None => err(&req.id, "no_session", "unknown sessionId", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.create" => Some(handle_session_create(state, req)),
        "session.snapshot" => Some(handle_session_snapshot(state, req)),
        "session.discard" => Some(handle_session_discard(state, req)),
        _ => None,
    }
}
