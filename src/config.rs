use std::path::Path;

use serde::{Deserialize, Serialize};

const DEFAULT_BASE: &str = "https://api.planbook.example.com";

/// Logical endpoint names mapped to absolute URLs. One static object; the
/// only indirection is an optional config file override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoints {
    pub grades: String,
    pub subjects: String,
    pub chapters: String,
    pub course_outcomes: String,
    pub assessment_items: String,
    pub unit_plan: String,
    pub save_unit_plan: String,
    pub paper_details: String,
    pub paper_question_details: String,
    pub delete_paper: String,
    pub update_paper: String,
    pub save_paper: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        let at = |path: &str| format!("{}{}", DEFAULT_BASE, path);
        Self {
            grades: at("/school/grades"),
            subjects: at("/school/subjects"),
            chapters: at("/school/chapters"),
            course_outcomes: at("/ai/course-outcomes"),
            assessment_items: at("/ai/assessment-items"),
            unit_plan: at("/ai/unit-plan"),
            save_unit_plan: at("/unit-plan/save"),
            paper_details: at("/papers/details"),
            paper_question_details: at("/papers/question-details"),
            delete_paper: at("/papers/delete"),
            update_paper: at("/papers/update"),
            save_paper: at("/papers/save"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub org_code: String,
    pub offline: bool,
    pub endpoints: Endpoints,
}

impl Config {
    /// Defaults, overridden by `PLANBOOKD_CONFIG` (JSON file) when set; a
    /// broken override is logged and ignored rather than refusing to start.
    /// `PLANBOOKD_OFFLINE=1` forces the built-in backend either way.
    pub fn load() -> Self {
        let mut config = match std::env::var("PLANBOOKD_CONFIG") {
            Ok(path) => match Self::load_from_file(Path::new(&path)) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("ignoring config file {}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        if std::env::var("PLANBOOKD_OFFLINE").map(|v| v == "1").unwrap_or(false) {
            config.offline = true;
        }
        config
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
