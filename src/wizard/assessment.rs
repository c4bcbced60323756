use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::aggregate::{ApplyError, Elo};

/// Combined `noOfItems` allowed across one ELO's rows.
pub const MAX_ITEMS_PER_ELO: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Populated,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentRow {
    pub id: String,
    pub item_type: String,
    pub no_of_items: String,
    pub marks_per_item: String,
}

/// Partial row as edited in the panel; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowPatch {
    pub item_type: Option<String>,
    pub no_of_items: Option<String>,
    pub marks_per_item: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedItem {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub item_type: String,
    pub blooms_level: String,
    pub marks: String,
}

/// Per-ELO assessment slice: configuration rows plus whatever the generation
/// backend produced for them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EloAssessment {
    pub id: String,
    pub name: String,
    pub full_text: String,
    pub assessment_rows: Vec<AssessmentRow>,
    pub generated_items: Vec<GeneratedItem>,
    pub status: GenerationStatus,
    pub warning: Option<String>,
}

/// `noOfItems` arrives as free text; anything non-numeric counts as zero for
/// the cap sum, matching the form's `parseInt(...) || 0`.
pub fn items_count(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

impl EloAssessment {
    pub fn from_elo(elo: &Elo) -> Self {
        Self {
            id: elo.id.clone(),
            name: elo.title.clone(),
            full_text: elo.description.clone(),
            ..Self::default()
        }
    }

    pub fn row_item_total(&self) -> u32 {
        self.assessment_rows
            .iter()
            .map(|r| items_count(&r.no_of_items))
            .sum()
    }

    /// Item types already taken by a row; the panel disables (never removes)
    /// these in its select. Duplicates loaded from elsewhere stay as-is.
    pub fn used_item_types(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for row in &self.assessment_rows {
            let t = row.item_type.trim();
            if !t.is_empty() && !out.iter().any(|u| u == t) {
                out.push(t.to_string());
            }
        }
        out
    }

    /// At least one row must have both an item type and a positive count
    /// before generation makes sense.
    pub fn can_generate(&self) -> bool {
        self.assessment_rows
            .iter()
            .any(|r| !r.item_type.trim().is_empty() && items_count(&r.no_of_items) > 0)
    }

    /// Adds a row. A patch that would break the cap or duplicate an item
    /// type still adds the row, but with the offending field unset and the
    /// per-ELO warning recorded; the returned warning mirrors it.
    pub fn add_row(&mut self, patch: RowPatch) -> Option<String> {
        let mut row = AssessmentRow {
            id: Uuid::new_v4().to_string(),
            ..AssessmentRow::default()
        };
        let mut warning = None;
        if let Some(t) = patch.item_type {
            let t = t.trim().to_string();
            if !t.is_empty() && self.used_item_types().iter().any(|u| *u == t) {
                warning = Some(format!("item type already used: {}", t));
            } else {
                row.item_type = t;
            }
        }
        if let Some(m) = patch.marks_per_item {
            row.marks_per_item = m.trim().to_string();
        }
        if let Some(n) = patch.no_of_items {
            let n = n.trim().to_string();
            if self.row_item_total() + items_count(&n) > MAX_ITEMS_PER_ELO {
                warning = Some(cap_message());
            } else {
                row.no_of_items = n;
            }
        }
        self.assessment_rows.push(row);
        self.warning = warning.clone();
        warning
    }

    /// Edits a row in place. A violating edit is rejected wholesale (the
    /// prior value stays) and reported through the per-ELO warning.
    pub fn update_row(&mut self, row_id: &str, patch: RowPatch) -> Result<Option<String>, ApplyError> {
        let idx = self
            .assessment_rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or_else(|| ApplyError::NotFound { what: "assessment row", id: row_id.to_string() })?;

        if let Some(t) = &patch.item_type {
            let t = t.trim();
            let taken = self
                .assessment_rows
                .iter()
                .enumerate()
                .any(|(i, r)| i != idx && r.item_type.trim() == t && !t.is_empty());
            if taken {
                let w = format!("item type already used: {}", t);
                self.warning = Some(w.clone());
                return Ok(Some(w));
            }
        }
        if let Some(n) = &patch.no_of_items {
            let others: u32 = self
                .assessment_rows
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, r)| items_count(&r.no_of_items))
                .sum();
            if others + items_count(n) > MAX_ITEMS_PER_ELO {
                self.warning = Some(cap_message());
                return Ok(Some(cap_message()));
            }
        }

        let row = &mut self.assessment_rows[idx];
        if let Some(t) = patch.item_type {
            row.item_type = t.trim().to_string();
        }
        if let Some(n) = patch.no_of_items {
            row.no_of_items = n.trim().to_string();
        }
        if let Some(m) = patch.marks_per_item {
            row.marks_per_item = m.trim().to_string();
        }
        self.warning = None;
        Ok(None)
    }

    pub fn remove_row(&mut self, row_id: &str) -> Result<(), ApplyError> {
        let before = self.assessment_rows.len();
        self.assessment_rows.retain(|r| r.id != row_id);
        if self.assessment_rows.len() == before {
            return Err(ApplyError::NotFound { what: "assessment row", id: row_id.to_string() });
        }
        Ok(())
    }

    pub fn begin_generation(&mut self) -> Result<(), ApplyError> {
        if self.status == GenerationStatus::Generating {
            return Err(ApplyError::GenerationInFlight { elo_id: self.id.clone() });
        }
        if !self.can_generate() {
            return Err(ApplyError::BadValue {
                field: "assessmentRows".into(),
                message: "need at least one row with an item type and a count".into(),
            });
        }
        self.status = GenerationStatus::Generating;
        self.warning = None;
        Ok(())
    }

    pub fn complete_generation(&mut self, items: Vec<GeneratedItem>) {
        self.generated_items = items;
        self.status = GenerationStatus::Populated;
        self.warning = None;
    }

    /// A failed round-trip keeps whatever was generated before.
    pub fn fail_generation(&mut self, message: String) {
        self.status = GenerationStatus::Error;
        self.warning = Some(message);
    }

    pub fn update_item(&mut self, item_id: &str, patch: &Map<String, Value>) -> Result<(), ApplyError> {
        let item = self
            .generated_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ApplyError::NotFound { what: "generated item", id: item_id.to_string() })?;
        for (k, v) in patch {
            let Some(s) = v.as_str() else {
                return Err(ApplyError::BadValue {
                    field: format!("patch.{}", k),
                    message: "must be a string".into(),
                });
            };
            match k.as_str() {
                "question" => item.question = s.to_string(),
                "answer" => item.answer = s.to_string(),
                "itemType" => item.item_type = s.to_string(),
                "bloomsLevel" => item.blooms_level = s.to_string(),
                "marks" => item.marks = s.to_string(),
                _ => return Err(ApplyError::UnknownField(format!("patch.{}", k))),
            }
        }
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &str) -> Result<(), ApplyError> {
        let before = self.generated_items.len();
        self.generated_items.retain(|i| i.id != item_id);
        if self.generated_items.len() == before {
            return Err(ApplyError::NotFound { what: "generated item", id: item_id.to_string() });
        }
        Ok(())
    }
}

fn cap_message() -> String {
    format!("combined item count cannot exceed {}", MAX_ITEMS_PER_ELO)
}

/// Rebuild the per-ELO list from the current selection, keeping the work
/// already done for ELOs that are still selected.
pub fn sync_with_elos(existing: Vec<EloAssessment>, elos: &[Elo]) -> Vec<EloAssessment> {
    let mut prior: Vec<EloAssessment> = existing;
    let mut out: Vec<EloAssessment> = Vec::new();
    for elo in elos.iter().filter(|e| e.selected) {
        match prior.iter().position(|p| p.id == elo.id) {
            Some(idx) => out.push(prior.swap_remove(idx)),
            None => out.push(EloAssessment::from_elo(elo)),
        }
    }
    out
}
