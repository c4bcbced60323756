use serde_json::json;

use crate::gateway::parse_unit_plan;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dispatch, mutable_session, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::wizard::aggregate::Action;

/// Drafts the finalized unit plan: the backend returns the narrative shell
/// as stringified JSON, and the locally authored selections are merged on
/// top so the review panel never shows data older than the wizard state.
fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let payload = {
        let session = match mutable_session(&mut state.sessions, req) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let agg = &session.aggregate;
        if agg.name.is_empty() {
            return err(&req.id, "bad_params", "unit plan needs a name", None);
        }
        json!({
            "name": agg.name,
            "board": agg.board,
            "grade": agg.grade,
            "subject": agg.subject,
            "duration": agg.duration,
            "marks": agg.marks,
            "assessmentType": agg.assessment_type,
            "chapters": agg.selected_chapters,
            "courseOutcomes": agg.generated_course_outcomes,
            "elos": agg.selected_elos,
        })
    };

    let raw = match state.backend.unit_plan(&payload) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("unit plan generation failed: {:#}", e);
            return err(&req.id, "backend_failed", format!("{:#}", e), None);
        }
    };

    let mut plan = parse_unit_plan(&raw);
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Some(obj) = plan.as_object_mut() {
        let agg = &session.aggregate;
        obj.insert("courseOutcomes".into(), json!(agg.generated_course_outcomes));
        obj.insert(
            "elos".into(),
            json!(agg.selected_elos.iter().filter(|e| e.selected).collect::<Vec<_>>()),
        );
        obj.insert("assessmentData".into(), json!(agg.assessment_data));
        obj.insert("generatedAt".into(), json!(chrono::Utc::now().to_rfc3339()));
    }
    if let Err(e) = dispatch(session, req, Action::SetFinalizedUnitPlan(plan)) {
        return e;
    }
    ok(&req.id, json!({ "finalizedUnitPlan": session.aggregate.finalized_unit_plan }))
}

/// Persists the finalized plan. A successful save freezes the session; it
/// stays readable as the summary view but rejects further edits.
fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let payload = {
        let session = match mutable_session(&mut state.sessions, req) {
            Ok(s) => s,
            Err(e) => return e,
        };
        if session.aggregate.finalized_unit_plan.is_null() {
            return err(&req.id, "bad_params", "generate the unit plan before saving", None);
        }
        json!({
            "orgCode": state.config.org_code,
            "name": session.aggregate.name,
            "unitPlan": session.aggregate.finalized_unit_plan,
        })
    };

    let result = match state.backend.save_unit_plan(&payload) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("unit plan save failed: {:#}", e);
            return err(&req.id, "backend_failed", format!("{:#}", e), None);
        }
    };

    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let saved_at = chrono::Utc::now().to_rfc3339();
    session.read_only = true;
    session.saved_at = Some(saved_at.clone());
    ok(&req.id, json!({ "result": result, "savedAt": saved_at }))
}

fn handle_learning_experience(state: &mut AppState, req: &Request) -> serde_json::Value {
    let data = match req.params.get("data") {
        Some(v) => v.clone(),
        None => return err(&req.id, "bad_params", "missing data", None),
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::SetLearningExperience(data)) {
        return e;
    }
    ok(&req.id, json!({ "learningExperienceData": session.aggregate.learning_experience_data }))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "finalizedUnitPlan": session.aggregate.finalized_unit_plan,
            "readOnly": session.read_only,
            "savedAt": session.saved_at,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "plan.generate" => Some(handle_generate(state, req)),
        "plan.save" => Some(handle_save(state, req)),
        "plan.get" => Some(handle_get(state, req)),
        "plan.learningExperience.set" => Some(handle_learning_experience(state, req)),
        _ => None,
    }
}
