use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dispatch, mutable_session, required_str};
use crate::ipc::types::{AppState, Request};
use crate::wizard::aggregate::{Action, ItemConfigRow};

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let row = ItemConfigRow::new();
    let row_id = row.id.clone();
    if let Err(e) = dispatch(session, req, Action::AddItemConfigRow(row)) {
        return e;
    }
    ok(
        &req.id,
        json!({
            "rowId": row_id,
            "itemConfiguration": session.aggregate.item_configuration,
        }),
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let row_id = match required_str(req, "rowId") {
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
    if let Err(e) = dispatch(session, req, Action::UpdateItemConfigRow { row_id, patch }) {
        return e;
    }
    ok(&req.id, json!({ "itemConfiguration": session.aggregate.item_configuration }))
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let row_id = match required_str(req, "rowId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::RemoveItemConfigRow { row_id }) {
        return e;
    }
    ok(&req.id, json!({ "itemConfiguration": session.aggregate.item_configuration }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "items.add" => Some(handle_add(state, req)),
        "items.update" => Some(handle_update(state, req)),
        "items.remove" => Some(handle_remove(state, req)),
        _ => None,
    }
}
