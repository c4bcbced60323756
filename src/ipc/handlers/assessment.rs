use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dispatch, mutable_session, required_str, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::wizard::aggregate::Action;
use crate::wizard::assessment::RowPatch;
use crate::wizard::Step;

/// Item types the assessment panel offers. Each may be used by at most one
/// row per ELO; taken ones are reported disabled, never removed.
const ITEM_TYPES: [&str; 5] = [
    "MCQ",
    "Fill in the blanks",
    "True or False",
    "Short answer",
    "Long answer",
];

fn parse_row_patch(req: &Request) -> Result<RowPatch, serde_json::Value> {
    match req.params.get("row") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| err(&req.id, "bad_params", format!("bad row: {}", e), None)),
        None => Ok(RowPatch::default()),
    }
}

fn handle_sync(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::SyncAssessmentData) {
        return e;
    }
    ok(&req.id, json!({ "assessmentData": session.aggregate.assessment_data }))
}

fn handle_rows_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let row = match parse_row_patch(req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let outcome = match dispatch(session, req, Action::AddAssessmentRow { elo_id, row }) {
        Ok(o) => o,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "warning": outcome.warning,
            "assessmentData": session.aggregate.assessment_data,
        }),
    )
}

fn handle_rows_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let row_id = match required_str(req, "rowId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch = match parse_row_patch(req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let outcome =
        match dispatch(session, req, Action::UpdateAssessmentRow { elo_id, row_id, patch }) {
            Ok(o) => o,
            Err(e) => return e,
        };
    ok(
        &req.id,
        json!({
            "warning": outcome.warning,
            "assessmentData": session.aggregate.assessment_data,
        }),
    )
}

fn handle_rows_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let row_id = match required_str(req, "rowId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::RemoveAssessmentRow { elo_id, row_id }) {
        return e;
    }
    ok(&req.id, json!({ "assessmentData": session.aggregate.assessment_data }))
}

/// Reports the fixed item-type list with a disabled flag per type already
/// taken by another row of the same ELO.
fn handle_item_types(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match session_mut(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let Some(elo) = session.aggregate.assessment_data.iter().find(|e| e.id == elo_id) else {
        return err(&req.id, "not_found", format!("assessment elo not found: {}", elo_id), None);
    };
    let used = elo.used_item_types();
    let types: Vec<_> = ITEM_TYPES
        .iter()
        .map(|t| json!({ "name": t, "disabled": used.iter().any(|u| u == t) }))
        .collect();
    ok(&req.id, json!({ "itemTypes": types }))
}

/// Runs the generation round-trip for one ELO. The in-flight guard lives in
/// the engine: a second generate for the same ELO while one is running gets
/// `generation_in_flight`, and a failure keeps previously generated items.
fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let payload = {
        let session = match mutable_session(&mut state.sessions, req) {
            Ok(s) => s,
            Err(e) => return e,
        };
        if let Err(e) = dispatch(session, req, Action::BeginGeneration { elo_id: elo_id.clone() }) {
            return e;
        }
        let agg = &session.aggregate;
        // BeginGeneration succeeded, so the slice exists.
        let elo = agg.assessment_data.iter().find(|e| e.id == elo_id);
        let rows: Vec<_> = elo
            .map(|e| {
                e.assessment_rows
                    .iter()
                    .map(|r| {
                        json!({
                            "itemType": r.item_type,
                            "noOfItems": r.no_of_items,
                            "marksPerItem": r.marks_per_item,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        json!({
            "eloId": elo_id,
            "eloName": elo.map(|e| e.name.clone()).unwrap_or_default(),
            "fullText": elo.map(|e| e.full_text.clone()).unwrap_or_default(),
            "board": agg.board,
            "grade": agg.grade,
            "subject": agg.subject,
            "rows": rows,
        })
    };

    match state.backend.assessment_items(&payload) {
        Ok(mut by_elo) => {
            let entry = by_elo
                .remove(&elo_id)
                .or_else(|| by_elo.into_values().next());
            let mut items = entry.map(|e| e.assessment).unwrap_or_default();
            for item in &mut items {
                if item.id.trim().is_empty() {
                    item.id = Uuid::new_v4().to_string();
                }
            }
            let session = match mutable_session(&mut state.sessions, req) {
                Ok(s) => s,
                Err(e) => return e,
            };
            if let Err(e) =
                dispatch(session, req, Action::CompleteGeneration { elo_id: elo_id.clone(), items })
            {
                return e;
            }
            // The assessment step never completes on derived state alone; a
            // successful generation is what marks it, and the mark is sticky.
            session.nav.mark_step_complete(Step::Assessment);
            let generated = session
                .aggregate
                .assessment_data
                .iter()
                .find(|e| e.id == elo_id)
                .map(|e| e.generated_items.clone())
                .unwrap_or_default();
            ok(&req.id, json!({ "eloId": elo_id, "items": generated }))
        }
        Err(e) => {
            log::warn!("assessment generation failed for {}: {:#}", elo_id, e);
            let message = format!("{:#}", e);
            let session = match mutable_session(&mut state.sessions, req) {
                Ok(s) => s,
                Err(e) => return e,
            };
            if let Err(e) = dispatch(
                session,
                req,
                Action::FailGeneration { elo_id, message: message.clone() },
            ) {
                return e;
            }
            err(&req.id, "backend_failed", message, None)
        }
    }
}

fn handle_items_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let item_id = match required_str(req, "itemId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch = match req.params.get("patch").and_then(|v| v.as_object()) {
        Some(map) => map.clone(),
        None => return err(&req.id, "bad_params", "missing patch object", None),
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::UpdateGeneratedItem { elo_id, item_id, patch }) {
        return e;
    }
    ok(&req.id, json!({ "assessmentData": session.aggregate.assessment_data }))
}

fn handle_items_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let elo_id = match required_str(req, "eloId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let item_id = match required_str(req, "itemId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::RemoveGeneratedItem { elo_id, item_id }) {
        return e;
    }
    ok(&req.id, json!({ "assessmentData": session.aggregate.assessment_data }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessment.sync" => Some(handle_sync(state, req)),
        "assessment.rows.add" => Some(handle_rows_add(state, req)),
        "assessment.rows.update" => Some(handle_rows_update(state, req)),
        "assessment.rows.remove" => Some(handle_rows_remove(state, req)),
        "assessment.itemTypes" => Some(handle_item_types(state, req)),
        "assessment.generate" => Some(handle_generate(state, req)),
        "assessment.items.update" => Some(handle_items_update(state, req)),
        "assessment.items.remove" => Some(handle_items_remove(state, req)),
        _ => None,
    }
}
