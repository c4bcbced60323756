use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::session_mut;
use crate::ipc::types::{AppState, Request};
use crate::wizard::{completed_steps, Step};

fn f64_param(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn nav_view(session: &crate::wizard::WizardSession) -> serde_json::Value {
    let completed: Vec<_> = completed_steps(&session.aggregate, &session.nav)
        .into_iter()
        .collect();
    json!({
        "currentStep": session.nav.current_step,
        "completedSteps": completed,
        "isSticky": session.nav.is_sticky,
    })
}

/// Jump navigation: any step may be visited directly, complete or not.
fn handle_go_to_step(state: &mut AppState, req: &Request) -> serde_json::Value {
    let step = match req.params.get("step").and_then(|v| v.as_u64()) {
        Some(n) => n as usize,
        None => return err(&req.id, "bad_params", "missing step", None),
    };
    if Step::from_index(step).is_none() {
        return err(&req.id, "bad_params", format!("no step at index {}", step), None);
    }
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    session.nav.go_to_step(step);
    ok(&req.id, nav_view(session))
}

fn handle_mark_complete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let step = match req.params.get("step").and_then(|v| v.as_u64()) {
        Some(n) => n as usize,
        None => return err(&req.id, "bad_params", "missing step", None),
    };
    let Some(step) = Step::from_index(step) else {
        return err(&req.id, "bad_params", format!("no step at index {}", step), None);
    };
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    session.nav.mark_step_complete(step);
    ok(&req.id, nav_view(session))
}

/// Scroll tracking: recomputes the active step from the section offsets and
/// the sticky header line.
fn handle_scroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let offsets: Vec<f64> = match req.params.get("sectionOffsets").and_then(|v| v.as_array()) {
        Some(list) => list.iter().filter_map(|v| v.as_f64()).collect(),
        None => return err(&req.id, "bad_params", "missing sectionOffsets", None),
    };
    let scroll_y = match f64_param(req, "scrollY") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let header_height = match f64_param(req, "headerHeight") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    session.nav.on_scroll(&offsets, scroll_y, header_height);
    ok(&req.id, nav_view(session))
}

fn handle_sticky(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sticky = match req.params.get("sticky").and_then(|v| v.as_bool()) {
        Some(b) => b,
        None => return err(&req.id, "bad_params", "missing sticky", None),
    };
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    session.nav.is_sticky = sticky;
    ok(&req.id, nav_view(session))
}

fn handle_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    ok(&req.id, nav_view(session))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "nav.goToStep" => Some(handle_go_to_step(state, req)),
        "nav.markComplete" => Some(handle_mark_complete(state, req)),
        "nav.scroll" => Some(handle_scroll(state, req)),
        "nav.sticky" => Some(handle_sticky(state, req)),
        "nav.state" => Some(handle_state(state, req)),
        _ => None,
    }
}
