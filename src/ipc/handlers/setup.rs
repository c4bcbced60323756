use serde_json::json;

use crate::gateway::{fallback_chapters, fallback_grades, fallback_subjects};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{dispatch, mutable_session, required_str};
use crate::ipc::types::{AppState, Request};
use crate::wizard::aggregate::{Action, Chapter, FetchField};

/// Shallow merge of basic-setup fields into the aggregate. Selection keys
/// route through the cascade setters inside the engine; the response carries
/// which option lists went stale so the client knows to refetch.
fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let partial = match req.params.get("fields").and_then(|v| v.as_object()) {
        Some(map) => map.clone(),
        None => return err(&req.id, "bad_params", "missing fields object", None),
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let outcome = match dispatch(session, req, Action::Update(partial)) {
        Ok(o) => o,
        Err(e) => return e,
    };
    let invalidated: Vec<&str> = outcome
        .invalidated
        .iter()
        .map(|f| match f {
            FetchField::Subjects => "subjects",
            FetchField::Chapters => "chapters",
        })
        .collect();
    ok(
        &req.id,
        json!({
            "changed": outcome.changed,
            "invalidated": invalidated,
            "aggregate": session.aggregate,
        }),
    )
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session_id = match required_str(req, "sessionId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if !state.sessions.contains_key(&session_id) {
        return err(&req.id, "no_session", "unknown sessionId", None);
    }
    let (grades, fallback) = match state.backend.grades(&state.config.org_code) {
        Ok(list) => (list, false),
        Err(e) => {
            log::warn!("grades fetch failed, using built-in list: {:#}", e);
            (fallback_grades(), true)
        }
    };
    if let Some(session) = state.sessions.get_mut(&session_id) {
        session.options.grades = grades.clone();
    }
    ok(&req.id, json!({ "grades": grades, "fallback": fallback }))
}

/// Subjects depend on the selected grade. The fetch takes a generation token
/// up front; if the grade changes while the request is in flight the token
/// goes stale and the response is dropped instead of applied.
fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (token, grade) = {
        let session = match mutable_session(&mut state.sessions, req) {
            Ok(s) => s,
            Err(e) => return e,
        };
        if session.aggregate.grade.is_empty() {
            return err(&req.id, "bad_params", "select a grade first", None);
        }
        (
            session.guard.begin_fetch(FetchField::Subjects),
            session.aggregate.grade.clone(),
        )
    };
    let (subjects, fallback) = match state.backend.subjects(&state.config.org_code, &grade) {
        Ok(list) => (list, false),
        Err(e) => {
            log::warn!("subjects fetch failed, using built-in list: {:#}", e);
            (fallback_subjects(), true)
        }
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let applied = session.apply_subjects(token, subjects.clone());
    ok(
        &req.id,
        json!({
            "subjects": subjects,
            "fallback": fallback,
            "applied": applied,
            "generation": token,
        }),
    )
}

fn handle_chapters_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (token, subject) = {
        let session = match mutable_session(&mut state.sessions, req) {
            Ok(s) => s,
            Err(e) => return e,
        };
        if session.aggregate.subject.is_empty() {
            return err(&req.id, "bad_params", "select a subject first", None);
        }
        (
            session.guard.begin_fetch(FetchField::Chapters),
            session.aggregate.subject.clone(),
        )
    };
    let (chapters, fallback) = match state.backend.chapters(&state.config.org_code, &subject) {
        Ok(list) => (list, false),
        Err(e) => {
            log::warn!("chapters fetch failed, using built-in list: {:#}", e);
            (fallback_chapters(), true)
        }
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let applied = session.apply_chapters(token, chapters.clone());
    ok(
        &req.id,
        json!({
            "chapters": chapters,
            "fallback": fallback,
            "applied": applied,
            "generation": token,
        }),
    )
}

fn handle_chapters_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let chapters: Vec<Chapter> = match req.params.get("chapters") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(list) => list,
            Err(e) => return err(&req.id, "bad_params", format!("bad chapters: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing chapters", None),
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::SetChapters(chapters)) {
        return e;
    }
    ok(&req.id, json!({ "selectedChapters": session.aggregate.selected_chapters }))
}

fn handle_chapters_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let chapter: Chapter = match req.params.get("chapter") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(c) => c,
            Err(e) => return err(&req.id, "bad_params", format!("bad chapter: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing chapter", None),
    };
    let session = match mutable_session(&mut state.sessions, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if let Err(e) = dispatch(session, req, Action::ToggleChapter(chapter)) {
        return e;
    }
    ok(&req.id, json!({ "selectedChapters": session.aggregate.selected_chapters }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.update" => Some(handle_update(state, req)),
        "setup.grades.list" => Some(handle_grades_list(state, req)),
        "setup.subjects.list" => Some(handle_subjects_list(state, req)),
        "setup.chapters.list" => Some(handle_chapters_list(state, req)),
        "setup.chapters.set" => Some(handle_chapters_set(state, req)),
        "setup.chapters.toggle" => Some(handle_chapters_toggle(state, req)),
        _ => None,
    }
}
