use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{EloItems, Grade, OutcomeRequest, RemoteBackend, Subject};
use crate::wizard::aggregate::{Chapter, CourseOutcome};
use crate::wizard::assessment::GeneratedItem;

/// The hardcoded grade list the UI falls back to when the school-data
/// service is unreachable.
pub fn fallback_grades() -> Vec<Grade> {
    (1..=12)
        .map(|n| Grade { id: n.to_string(), name: format!("Grade {}", n) })
        .collect()
}

pub fn fallback_subjects() -> Vec<Subject> {
    [
        ("1", "English"),
        ("2", "Mathematics"),
        ("3", "Science"),
        ("4", "Social Studies"),
        ("5", "Computer Science"),
    ]
    .iter()
    .map(|(id, name)| Subject { id: (*id).to_string(), name: (*name).to_string() })
    .collect()
}

pub fn fallback_chapters() -> Vec<Chapter> {
    (1..=6)
        .map(|n| Chapter {
            chapter_id: n.to_string(),
            chapter_name: format!("Chapter {}", n),
        })
        .collect()
}

/// Offline backend: deterministic stand-ins for every remote capability so
/// the whole wizard is exercisable without network. Doubles as the
/// graceful-degradation source for the list fetches.
#[derive(Default)]
pub struct StaticBackend {
    papers: Mutex<BTreeMap<String, Value>>,
}

impl StaticBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemoteBackend for StaticBackend {
    fn grades(&self, _org_code: &str) -> Result<Vec<Grade>> {
        Ok(fallback_grades())
    }

    fn subjects(&self, _org_code: &str, _class_id: &str) -> Result<Vec<Subject>> {
        Ok(fallback_subjects())
    }

    fn chapters(&self, _org_code: &str, _plan_class_id: &str) -> Result<Vec<Chapter>> {
        Ok(fallback_chapters())
    }

    fn course_outcomes(&self, req: &OutcomeRequest) -> Result<Vec<CourseOutcome>> {
        let chapters = if req.chapters.is_empty() {
            fallback_chapters()
        } else {
            req.chapters.clone()
        };
        Ok(chapters
            .iter()
            .enumerate()
            .map(|(i, ch)| CourseOutcome {
                co_id: format!("co-{}", i + 1),
                co_title: format!("Understand {}", ch.chapter_name),
                co_description: format!(
                    "Students explain the key ideas of {} for {} ({})",
                    ch.chapter_name, req.subject, req.grade
                ),
                factor: 1.0,
            })
            .collect())
    }

    fn assessment_items(&self, payload: &Value) -> Result<BTreeMap<String, EloItems>> {
        let elo_id = payload
            .get("eloId")
            .and_then(|v| v.as_str())
            .unwrap_or("elo");
        let elo_name = payload
            .get("eloName")
            .and_then(|v| v.as_str())
            .unwrap_or("learning outcome");
        let rows = payload
            .get("rows")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut items = Vec::new();
        for row in rows {
            let item_type = row
                .get("itemType")
                .and_then(|v| v.as_str())
                .unwrap_or("short answer")
                .to_string();
            let count = row
                .get("noOfItems")
                .and_then(|v| v.as_str())
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(0);
            let marks = row
                .get("marksPerItem")
                .and_then(|v| v.as_str())
                .unwrap_or("1")
                .to_string();
            for n in 1..=count {
                items.push(GeneratedItem {
                    id: Uuid::new_v4().to_string(),
                    question: format!("Sample {} question {} for: {}", item_type, n, elo_name),
                    answer: format!("Model answer {} for: {}", n, elo_name),
                    item_type: item_type.clone(),
                    blooms_level: "Understand".to_string(),
                    marks: marks.clone(),
                });
            }
        }

        let mut out = BTreeMap::new();
        out.insert(
            elo_id.to_string(),
            EloItems { eloname: elo_name.to_string(), assessment: items },
        );
        Ok(out)
    }

    fn unit_plan(&self, payload: &Value) -> Result<String> {
        let name = payload
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("Unit Plan");
        let plan = json!({
            "title": name,
            "overview": format!("Auto-drafted unit plan for {}", name),
            "sections": ["Objectives", "Learning Outcomes", "Assessment", "Activities"],
        });
        Ok(plan.to_string())
    }

    fn save_unit_plan(&self, _payload: &Value) -> Result<Value> {
        Ok(json!({ "status": "saved" }))
    }

    fn paper_details(&self, _org_code: &str, paper_id: &str) -> Result<Value> {
        let papers = self.papers.lock().map_err(|_| anyhow::anyhow!("paper store poisoned"))?;
        papers
            .get(paper_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("paper not found: {}", paper_id))
    }

    fn paper_question_details(&self, org_code: &str, paper_id: &str) -> Result<Value> {
        let paper = self.paper_details(org_code, paper_id)?;
        Ok(paper.get("questions").cloned().unwrap_or_else(|| json!([])))
    }

    fn delete_paper(&self, _org_code: &str, paper_id: &str) -> Result<Value> {
        let mut papers = self.papers.lock().map_err(|_| anyhow::anyhow!("paper store poisoned"))?;
        if papers.remove(paper_id).is_none() {
            anyhow::bail!("paper not found: {}", paper_id);
        }
        Ok(json!({ "status": "deleted" }))
    }

    fn update_paper(&self, _org_code: &str, paper_id: &str, patch: &Value) -> Result<Value> {
        let mut papers = self.papers.lock().map_err(|_| anyhow::anyhow!("paper store poisoned"))?;
        let Some(paper) = papers.get_mut(paper_id) else {
            anyhow::bail!("paper not found: {}", paper_id);
        };
        if let (Some(target), Some(fields)) = (paper.as_object_mut(), patch.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(json!({ "status": "updated" }))
    }

    fn save_paper(&self, _org_code: &str, paper: &Value) -> Result<Value> {
        let paper_id = paper
            .get("paperId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut stored = paper.clone();
        if let Some(obj) = stored.as_object_mut() {
            obj.insert("paperId".to_string(), json!(paper_id));
        }
        let mut papers = self.papers.lock().map_err(|_| anyhow::anyhow!("paper store poisoned"))?;
        papers.insert(paper_id.clone(), stored);
        Ok(json!({ "status": "saved", "paperId": paper_id }))
    }
}
