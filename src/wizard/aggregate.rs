use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::assessment::{self, EloAssessment, GeneratedItem, RowPatch};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_id: String,
    pub chapter_name: String,
}

/// Course outcome as returned by the generation backend. The snake_case wire
/// keys are the backend's, not ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOutcome {
    pub co_id: String,
    pub co_title: String,
    pub co_description: String,
    #[serde(default)]
    pub factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elo {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConfigRow {
    pub id: String,
    #[serde(default)]
    pub blooms_level: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub no_of_items: String,
    #[serde(default)]
    pub marks_per_item: String,
}

impl ItemConfigRow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            blooms_level: String::new(),
            item_type: String::new(),
            difficulty: String::new(),
            no_of_items: String::new(),
            marks_per_item: String::new(),
        }
    }
}

impl Default for ItemConfigRow {
    fn default() -> Self {
        Self::new()
    }
}

/// The single source of truth threaded through the wizard steps. Every step
/// panel reads a slice of this and writes back through [`Action`] dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardAggregate {
    pub board: String,
    pub grade: String,
    pub subject: String,
    pub name: String,
    pub duration: String,
    pub marks: String,
    pub assessment_type: String,
    pub selected_chapters: Vec<Chapter>,
    pub generated_course_outcomes: Vec<CourseOutcome>,
    pub selected_elos: Vec<Elo>,
    pub item_configuration: Vec<ItemConfigRow>,
    pub assessment_data: Vec<EloAssessment>,
    pub learning_experience_data: Value,
    pub finalized_unit_plan: Value,
}

/// Option-list fields whose remote fetches depend on an upstream selection
/// and therefore need stale-response protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchField {
    Subjects,
    Chapters,
}

/// Monotonic per-field generation counters. A response is applied only when
/// its token still matches the latest issued generation; upstream changes
/// bump the counter so every outstanding token goes stale.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard {
    subjects: u64,
    chapters: u64,
}

impl FetchGuard {
    fn slot(&mut self, field: FetchField) -> &mut u64 {
        match field {
            FetchField::Subjects => &mut self.subjects,
            FetchField::Chapters => &mut self.chapters,
        }
    }

    pub fn begin_fetch(&mut self, field: FetchField) -> u64 {
        let slot = self.slot(field);
        *slot += 1;
        *slot
    }

    pub fn invalidate(&mut self, field: FetchField) {
        let slot = self.slot(field);
        *slot += 1;
    }

    pub fn is_current(&self, field: FetchField, token: u64) -> bool {
        match field {
            FetchField::Subjects => self.subjects == token,
            FetchField::Chapters => self.chapters == token,
        }
    }
}

/// Every mutation of the aggregate goes through exactly one of these, so the
/// cascade-reset rules live in a single place.
#[derive(Debug, Clone)]
pub enum Action {
    /// Shallow merge of top-level scalar/array keys; unknown keys rejected.
    Update(Map<String, Value>),
    SetBoard(String),
    SetGrade(String),
    SetSubject(String),
    SetChapters(Vec<Chapter>),
    ToggleChapter(Chapter),
    SetCourseOutcomes(Vec<CourseOutcome>),
    SetElos(Vec<Elo>),
    ToggleElo(String),
    AddItemConfigRow(ItemConfigRow),
    UpdateItemConfigRow { row_id: String, patch: Map<String, Value> },
    RemoveItemConfigRow { row_id: String },
    SyncAssessmentData,
    AddAssessmentRow { elo_id: String, row: RowPatch },
    UpdateAssessmentRow { elo_id: String, row_id: String, patch: RowPatch },
    RemoveAssessmentRow { elo_id: String, row_id: String },
    BeginGeneration { elo_id: String },
    CompleteGeneration { elo_id: String, items: Vec<GeneratedItem> },
    FailGeneration { elo_id: String, message: String },
    UpdateGeneratedItem { elo_id: String, item_id: String, patch: Map<String, Value> },
    RemoveGeneratedItem { elo_id: String, item_id: String },
    SetLearningExperience(Value),
    SetFinalizedUnitPlan(Value),
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    pub changed: bool,
    pub invalidated: Vec<FetchField>,
    /// Soft validation failure (row cap, duplicate item type): the state
    /// carries the warning instead of the request failing.
    pub warning: Option<String>,
}

impl ApplyOutcome {
    fn changed() -> Self {
        Self { changed: true, ..Self::default() }
    }

    fn with_warning(warning: Option<String>) -> Self {
        Self { changed: true, invalidated: Vec::new(), warning }
    }

    fn unchanged() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    UnknownField(String),
    BadValue { field: String, message: String },
    NotFound { what: &'static str, id: String },
    GenerationInFlight { elo_id: String },
}

impl ApplyError {
    pub fn code(&self) -> &'static str {
        match self {
            ApplyError::UnknownField(_) | ApplyError::BadValue { .. } => "bad_params",
            ApplyError::NotFound { .. } => "not_found",
            ApplyError::GenerationInFlight { .. } => "generation_in_flight",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApplyError::UnknownField(k) => format!("unknown aggregate field: {}", k),
            ApplyError::BadValue { field, message } => format!("{} {}", field, message),
            ApplyError::NotFound { what, id } => format!("{} not found: {}", what, id),
            ApplyError::GenerationInFlight { elo_id } => {
                format!("generation already in flight for outcome {}", elo_id)
            }
        }
    }
}

impl WizardAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single dispatch point for every aggregate mutation. Rejected actions
    /// leave the aggregate untouched except where the contract says a warning
    /// is recorded (assessment row cap / duplicate type).
    pub fn apply(&mut self, action: Action) -> Result<ApplyOutcome, ApplyError> {
        match action {
            Action::Update(partial) => self.apply_update(partial),
            Action::SetBoard(v) => Ok(self.set_board(v)),
            Action::SetGrade(v) => Ok(self.set_grade(v)),
            Action::SetSubject(v) => Ok(self.set_subject(v)),
            Action::SetChapters(chapters) => {
                self.selected_chapters = dedup_chapters(chapters);
                Ok(ApplyOutcome::changed())
            }
            Action::ToggleChapter(chapter) => {
                let before = self.selected_chapters.len();
                self.selected_chapters
                    .retain(|c| c.chapter_id != chapter.chapter_id);
                if self.selected_chapters.len() == before {
                    self.selected_chapters.push(chapter);
                }
                Ok(ApplyOutcome::changed())
            }
            Action::SetCourseOutcomes(cos) => {
                // A fresh generation replaces the downstream ELO list with
                // unselected entries derived from the new outcomes.
                self.selected_elos = cos
                    .iter()
                    .map(|co| Elo {
                        id: co.co_id.clone(),
                        title: co.co_title.clone(),
                        description: co.co_description.clone(),
                        selected: false,
                    })
                    .collect();
                self.generated_course_outcomes = cos;
                Ok(ApplyOutcome::changed())
            }
            Action::SetElos(elos) => {
                self.selected_elos = elos;
                Ok(ApplyOutcome::changed())
            }
            Action::ToggleElo(elo_id) => {
                let Some(elo) = self.selected_elos.iter_mut().find(|e| e.id == elo_id) else {
                    return Err(ApplyError::NotFound { what: "elo", id: elo_id });
                };
                elo.selected = !elo.selected;
                Ok(ApplyOutcome::changed())
            }
            Action::AddItemConfigRow(row) => {
                // No item-type uniqueness at this stage; only the per-ELO
                // assessment rows enforce it. Kept divergent on purpose.
                self.item_configuration.push(row);
                Ok(ApplyOutcome::changed())
            }
            Action::UpdateItemConfigRow { row_id, patch } => {
                let Some(row) = self.item_configuration.iter_mut().find(|r| r.id == row_id)
                else {
                    return Err(ApplyError::NotFound { what: "item config row", id: row_id });
                };
                patch_item_config_row(row, &patch)?;
                Ok(ApplyOutcome::changed())
            }
            Action::RemoveItemConfigRow { row_id } => {
                let before = self.item_configuration.len();
                self.item_configuration.retain(|r| r.id != row_id);
                if self.item_configuration.len() == before {
                    return Err(ApplyError::NotFound { what: "item config row", id: row_id });
                }
                Ok(ApplyOutcome::changed())
            }
            Action::SyncAssessmentData => {
                self.assessment_data =
                    assessment::sync_with_elos(std::mem::take(&mut self.assessment_data), &self.selected_elos);
                Ok(ApplyOutcome::changed())
            }
            Action::AddAssessmentRow { elo_id, row } => {
                let elo = self.assessment_mut(&elo_id)?;
                let warning = elo.add_row(row);
                Ok(ApplyOutcome::with_warning(warning))
            }
            Action::UpdateAssessmentRow { elo_id, row_id, patch } => {
                let elo = self.assessment_mut(&elo_id)?;
                let warning = elo.update_row(&row_id, patch)?;
                Ok(ApplyOutcome::with_warning(warning))
            }
            Action::RemoveAssessmentRow { elo_id, row_id } => {
                let elo = self.assessment_mut(&elo_id)?;
                elo.remove_row(&row_id)?;
                Ok(ApplyOutcome::changed())
            }
            Action::BeginGeneration { elo_id } => {
                let elo = self.assessment_mut(&elo_id)?;
                elo.begin_generation()?;
                Ok(ApplyOutcome::changed())
            }
            Action::CompleteGeneration { elo_id, items } => {
                let elo = self.assessment_mut(&elo_id)?;
                elo.complete_generation(items);
                Ok(ApplyOutcome::changed())
            }
            Action::FailGeneration { elo_id, message } => {
                let elo = self.assessment_mut(&elo_id)?;
                elo.fail_generation(message);
                Ok(ApplyOutcome::changed())
            }
            Action::UpdateGeneratedItem { elo_id, item_id, patch } => {
                let elo = self.assessment_mut(&elo_id)?;
                elo.update_item(&item_id, &patch)?;
                Ok(ApplyOutcome::changed())
            }
            Action::RemoveGeneratedItem { elo_id, item_id } => {
                let elo = self.assessment_mut(&elo_id)?;
                elo.remove_item(&item_id)?;
                Ok(ApplyOutcome::changed())
            }
            Action::SetLearningExperience(v) => {
                self.learning_experience_data = v;
                Ok(ApplyOutcome::changed())
            }
            Action::SetFinalizedUnitPlan(v) => {
                self.finalized_unit_plan = v;
                Ok(ApplyOutcome::changed())
            }
        }
    }

    fn assessment_mut(&mut self, elo_id: &str) -> Result<&mut EloAssessment, ApplyError> {
        self.assessment_data
            .iter_mut()
            .find(|e| e.id == elo_id)
            .ok_or_else(|| ApplyError::NotFound { what: "assessment elo", id: elo_id.to_string() })
    }

    /// Shallow merge: a key present in the partial replaces the aggregate's
    /// key wholesale. Selection keys route through their setters so the
    /// cascade rules cannot be bypassed. `Update({})` is a no-op. Merges
    /// into a scratch copy and commits only when every key was accepted, so
    /// a bad key cannot leave a half-applied partial behind.
    fn apply_update(&mut self, partial: Map<String, Value>) -> Result<ApplyOutcome, ApplyError> {
        let mut scratch = self.clone();
        let mut outcome = ApplyOutcome::unchanged();
        for (key, value) in partial {
            let step = match key.as_str() {
                "board" => scratch.set_board(string_value(&key, &value)?),
                "grade" => scratch.set_grade(string_value(&key, &value)?),
                "subject" => scratch.set_subject(string_value(&key, &value)?),
                "name" => {
                    scratch.name = string_value(&key, &value)?;
                    ApplyOutcome::changed()
                }
                "duration" => {
                    scratch.duration = string_value(&key, &value)?;
                    ApplyOutcome::changed()
                }
                "marks" => {
                    scratch.marks = string_value(&key, &value)?;
                    ApplyOutcome::changed()
                }
                "assessmentType" => {
                    scratch.assessment_type = string_value(&key, &value)?;
                    ApplyOutcome::changed()
                }
                "selectedChapters" => {
                    let chapters: Vec<Chapter> =
                        serde_json::from_value(value).map_err(|e| ApplyError::BadValue {
                            field: key.clone(),
                            message: e.to_string(),
                        })?;
                    scratch.selected_chapters = dedup_chapters(chapters);
                    ApplyOutcome::changed()
                }
                "learningExperienceData" => {
                    scratch.learning_experience_data = value;
                    ApplyOutcome::changed()
                }
                _ => return Err(ApplyError::UnknownField(key)),
            };
            outcome.changed |= step.changed;
            outcome.invalidated.extend(step.invalidated);
        }
        *self = scratch;
        Ok(outcome)
    }

    fn set_board(&mut self, board: String) -> ApplyOutcome {
        if self.board == board {
            return ApplyOutcome::unchanged();
        }
        self.board = board;
        self.reset_downstream_selections();
        ApplyOutcome::changed()
    }

    fn set_grade(&mut self, grade: String) -> ApplyOutcome {
        if self.grade == grade {
            return ApplyOutcome::unchanged();
        }
        self.grade = grade;
        // A new grade strands the old subject and everything under it.
        self.subject.clear();
        self.selected_chapters.clear();
        self.reset_downstream_selections();
        ApplyOutcome {
            changed: true,
            invalidated: vec![FetchField::Subjects, FetchField::Chapters],
            warning: None,
        }
    }

    fn set_subject(&mut self, subject: String) -> ApplyOutcome {
        if self.subject == subject {
            return ApplyOutcome::unchanged();
        }
        self.subject = subject;
        self.selected_chapters.clear();
        self.reset_downstream_selections();
        ApplyOutcome { changed: true, invalidated: vec![FetchField::Chapters], warning: None }
    }

    /// Board/grade/subject changes orphan generated outcomes, ELO picks and
    /// assessment work; clearing them here keeps stale selections from
    /// surviving an upstream change.
    fn reset_downstream_selections(&mut self) {
        self.generated_course_outcomes.clear();
        self.selected_elos.clear();
        self.assessment_data.clear();
        self.finalized_unit_plan = Value::Null;
    }
}

fn string_value(field: &str, value: &Value) -> Result<String, ApplyError> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ApplyError::BadValue {
            field: field.to_string(),
            message: "must be a string".into(),
        })
}

fn dedup_chapters(chapters: Vec<Chapter>) -> Vec<Chapter> {
    let mut out: Vec<Chapter> = Vec::with_capacity(chapters.len());
    for ch in chapters {
        if !out.iter().any(|c| c.chapter_id == ch.chapter_id) {
            out.push(ch);
        }
    }
    out
}

// Patches a scratch copy first; a bad key rejects the whole patch without
// touching the row.
fn patch_item_config_row(
    row: &mut ItemConfigRow,
    patch: &Map<String, Value>,
) -> Result<(), ApplyError> {
    let mut next = row.clone();
    for (k, v) in patch {
        let target = match k.as_str() {
            "bloomsLevel" => &mut next.blooms_level,
            "itemType" => &mut next.item_type,
            "difficulty" => &mut next.difficulty,
            "noOfItems" => &mut next.no_of_items,
            "marksPerItem" => &mut next.marks_per_item,
            _ => return Err(ApplyError::UnknownField(format!("patch.{}", k))),
        };
        *target = string_value(k, v)?;
    }
    *row = next;
    Ok(())
}
