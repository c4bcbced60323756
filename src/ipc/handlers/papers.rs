use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};

/// Paper CRUD is a thin passthrough: no wizard session involved, the backend
/// owns the data and every failure maps to `backend_failed`.
fn forward(req: &Request, result: anyhow::Result<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => {
            log::warn!("{} failed: {:#}", req.method, e);
            err(&req.id, "backend_failed", format!("{:#}", e), None)
        }
    }
}

fn handle_details(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paper_id = match required_str(req, "paperId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    forward(req, state.backend.paper_details(&state.config.org_code, &paper_id))
}

fn handle_question_details(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paper_id = match required_str(req, "paperId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    forward(req, state.backend.paper_question_details(&state.config.org_code, &paper_id))
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paper_id = match required_str(req, "paperId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    forward(req, state.backend.delete_paper(&state.config.org_code, &paper_id))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paper_id = match required_str(req, "paperId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch = match req.params.get("patch") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing patch object", None),
    };
    forward(req, state.backend.update_paper(&state.config.org_code, &paper_id, &patch))
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paper = match req.params.get("paper") {
        Some(v) if v.is_object() => v.clone(),
        _ => return err(&req.id, "bad_params", "missing paper object", None),
    };
    forward(req, state.backend.save_paper(&state.config.org_code, &paper))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "papers.details" => Some(handle_details(state, req)),
        "papers.questionDetails" => Some(handle_question_details(state, req)),
        "papers.delete" => Some(handle_delete(state, req)),
        "papers.update" => Some(handle_update(state, req)),
        "papers.save" => Some(handle_save(state, req)),
        _ => None,
    }
}
