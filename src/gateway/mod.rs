mod fallback;
mod http;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::wizard::aggregate::{Chapter, CourseOutcome};
use crate::wizard::assessment::GeneratedItem;

pub use fallback::{fallback_chapters, fallback_grades, fallback_subjects, StaticBackend};
pub use http::HttpBackend;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    pub board: String,
    pub grade: String,
    pub subject: String,
    pub chapters: Vec<Chapter>,
}

/// One entry of the generation response map, keyed by ELO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloItems {
    pub eloname: String,
    #[serde(default)]
    pub assessment: Vec<GeneratedItem>,
}

/// One method per external capability. Plain request/response mapping, no
/// retry, no backoff; callers decide whether a failure degrades to defaults
/// or surfaces as a warning.
pub trait RemoteBackend: Send {
    fn grades(&self, org_code: &str) -> Result<Vec<Grade>>;
    fn subjects(&self, org_code: &str, class_id: &str) -> Result<Vec<Subject>>;
    fn chapters(&self, org_code: &str, plan_class_id: &str) -> Result<Vec<Chapter>>;
    fn course_outcomes(&self, req: &OutcomeRequest) -> Result<Vec<CourseOutcome>>;
    fn assessment_items(&self, payload: &Value) -> Result<BTreeMap<String, EloItems>>;
    /// Returns the `unit_plan` payload: a JSON document serialized as a
    /// string by the backend.
    fn unit_plan(&self, payload: &Value) -> Result<String>;
    fn save_unit_plan(&self, payload: &Value) -> Result<Value>;
    fn paper_details(&self, org_code: &str, paper_id: &str) -> Result<Value>;
    fn paper_question_details(&self, org_code: &str, paper_id: &str) -> Result<Value>;
    fn delete_paper(&self, org_code: &str, paper_id: &str) -> Result<Value>;
    fn update_paper(&self, org_code: &str, paper_id: &str, patch: &Value) -> Result<Value>;
    fn save_paper(&self, org_code: &str, paper: &Value) -> Result<Value>;
}

pub fn select_backend(config: &Config) -> Result<Box<dyn RemoteBackend>> {
    if config.offline {
        log::info!("offline mode: using built-in static backend");
        Ok(Box::new(StaticBackend::new()))
    } else {
        Ok(Box::new(HttpBackend::new(config.endpoints.clone())?))
    }
}

/// Guarded conversion of the server's stringified unit-plan JSON. An
/// unexpected shape degrades to an empty object instead of blanking the
/// review panel.
pub fn parse_unit_plan(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) if v.is_object() => v,
        Ok(v) => {
            log::warn!("unit plan payload was not an object ({})", kind_of(&v));
            Value::Object(serde_json::Map::new())
        }
        Err(e) => {
            log::warn!("unit plan payload was not valid JSON: {}", e);
            Value::Object(serde_json::Map::new())
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
