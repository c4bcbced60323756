use serde_json::json;

use crate::gateway::OutcomeRequest;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dispatch, mutable_session, required_str};
use crate::ipc::types::{AppState, Request};
use crate::wizard::aggregate::{Action, Elo};

/// Generates course outcomes from the basic-setup selections. A backend
/// failure surfaces as an error; there is no canned fallback for generated
/// content, only for option lists.
fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let outcome_req = {
        let session = match mutable_session(&mut state.sessions, req) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let agg = &session.aggregate;
        if agg.grade.is_empty() || agg.subject.is_empty() || agg.selected_chapters.is_empty() {
            return err(
                &req.id,
                "bad_params",
                "grade, subject and at least one chapter are required",
                None,
            );
        }
        OutcomeRequest {
            board: agg.board.clone(),
            grade: agg.grade.clone(),
            subject: agg.subject.clone(),
            chapters: agg.selected_chapters.clone(),
        }
    };
    let cos = match state.backend.course_outcomes(&outcome_req) {
        Ok(cos) => cos,
        Err(e) => {
            log::warn!("course outcome generation failed: {:#}", e);
            return err(&req.id, "backend_failed", format!("{:#}", e), None);
        }
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::SetCourseOutcomes(cos)) {
        return e;
    }
    ok(
        &req.id,
        json!({
            "courseOutcomes": session.aggregate.generated_course_outcomes,
            "elos": session.aggregate.selected_elos,
        }),
    )
}

fn handle_elos_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elos: Vec<Elo> = match req.params.get("elos") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(list) => list,
            Err(e) => return err(&req.id, "bad_params", format!("bad elos: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing elos", None),
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::SetElos(elos)) {
        return e;
    }
    // Assessment scaffolding follows the selection; prior per-ELO work for
    // still-selected outcomes is preserved by the sync.
    if let Err(e) = dispatch(session, req, Action::SyncAssessmentData) {
        return e;
    }
    ok(&req.id, json!({ "elos": session.aggregate.selected_elos }))
}

fn handle_elos_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::ToggleElo(elo_id)) {
        return e;
    }
    if let Err(e) = dispatch(session, req, Action::SyncAssessmentData) {
        return e;
    }
    ok(&req.id, json!({ "elos": session.aggregate.selected_elos }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "outcomes.generate" => Some(handle_generate(state, req)),
        "outcomes.elos.set" => Some(handle_elos_set(state, req)),
        "outcomes.elos.toggle" => Some(handle_elos_toggle(state, req)),
        _ => None,
    }
}
