use serde::Serialize;
use serde_json::json;

use super::aggregate::{Chapter, FetchField, FetchGuard, WizardAggregate};
use super::steps::{completed_steps, NavState};
use crate::gateway::{Grade, Subject};

/// Remote option lists the panels render their selects from. Not part of the
/// saved aggregate; they are session-scoped dropdown data.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionLists {
    pub grades: Vec<Grade>,
    pub subjects: Vec<Subject>,
    pub chapters: Vec<Chapter>,
}

/// One wizard run. Created empty, lives until discarded; a successful save
/// freezes it read-only (the summary view).
#[derive(Debug, Default)]
pub struct WizardSession {
    pub aggregate: WizardAggregate,
    pub nav: NavState,
    pub options: OptionLists,
    pub guard: FetchGuard,
    pub read_only: bool,
    pub saved_at: Option<String>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a fetched subject list only if the token is still current;
    /// a stale response is dropped so it cannot overwrite a newer one.
    pub fn apply_subjects(&mut self, token: u64, subjects: Vec<Subject>) -> bool {
        if !self.guard.is_current(FetchField::Subjects, token) {
            log::warn!("dropping stale subjects response (token {})", token);
            return false;
        }
        self.options.subjects = subjects;
        true
    }

    pub fn apply_chapters(&mut self, token: u64, chapters: Vec<Chapter>) -> bool {
        if !self.guard.is_current(FetchField::Chapters, token) {
            log::warn!("dropping stale chapters response (token {})", token);
            return false;
        }
        self.options.chapters = chapters;
        true
    }

    pub fn snapshot(&self) -> serde_json::Value {
        let completed: Vec<_> = completed_steps(&self.aggregate, &self.nav)
            .into_iter()
            .collect();
        json!({
            "aggregate": self.aggregate,
            "options": self.options,
            "currentStep": self.nav.current_step,
            "completedSteps": completed,
            "isSticky": self.nav.is_sticky,
            "readOnly": self.read_only,
            "savedAt": self.saved_at,
        })
    }
}
