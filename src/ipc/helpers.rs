use std::collections::HashMap;

use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::wizard::aggregate::{Action, ApplyOutcome, FetchField};
use crate::wizard::WizardSession;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn session_mut<'a>(
    sessions: &'a mut HashMap<String, WizardSession>,
    req: &Request,
) -> Result<&'a mut WizardSession, serde_json::Value> {
    let session_id = required_str(req, "sessionId")?;
    sessions
        .get_mut(&session_id)
        .ok_or_else(|| err(&req.id, "no_session", "unknown sessionId", None))
}

/// Like [`session_mut`] but for mutating methods: a saved session is a
/// read-only summary view and rejects further edits.
pub fn mutable_session<'a>(
    sessions: &'a mut HashMap<String, WizardSession>,
    req: &Request,
) -> Result<&'a mut WizardSession, serde_json::Value> {
    let session = session_mut(sessions, req)?;
    if session.read_only {
        return Err(err(&req.id, "read_only", "session already saved", None));
    }
    Ok(session)
}

/// Dispatches an action, mapping engine rejections to the error envelope.
pub fn dispatch(
    session: &mut WizardSession,
    req: &Request,
    action: Action,
) -> Result<ApplyOutcome, serde_json::Value> {
    match session.aggregate.apply(action) {
        Ok(outcome) => {
            for field in &outcome.invalidated {
                session.guard.invalidate(*field);
                // The option list itself is stale too.
                match field {
                    FetchField::Subjects => session.options.subjects.clear(),
                    FetchField::Chapters => session.options.chapters.clear(),
                }
            }
            Ok(outcome)
        }
        Err(e) => Err(err(&req.id, e.code(), e.message(), None)),
    }
}
