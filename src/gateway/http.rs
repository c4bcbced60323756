use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{EloItems, Grade, OutcomeRequest, RemoteBackend, Subject};
use crate::config::Endpoints;
use crate::wizard::aggregate::{Chapter, CourseOutcome};

#[derive(Debug, Deserialize)]
struct OutcomeResponse {
    course_outcomes: Vec<CourseOutcome>,
}

#[derive(Debug, Deserialize)]
struct UnitPlanResponse {
    unit_plan: String,
}

/// The real gateway: plain JSON over HTTPS, an `OrgCode` header where the
/// endpoint expects one, and no retry policy by contract.
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("building http client")?;
        Ok(Self { client, endpoints })
    }

    fn get<T: DeserializeOwned>(&self, url: &str, org_code: Option<&str>) -> Result<T> {
        let mut req = self.client.get(url);
        if let Some(code) = org_code {
            req = req.header("OrgCode", code);
        }
        let resp = req.send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("request to {} failed ({})", url, status);
        }
        Ok(resp.json()?)
    }

    fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        org_code: Option<&str>,
        body: &Value,
    ) -> Result<T> {
        let mut req = self.client.post(url).json(body);
        if let Some(code) = org_code {
            req = req.header("OrgCode", code);
        }
        let resp = req.send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("request to {} failed ({})", url, status);
        }
        Ok(resp.json()?)
    }
}

impl RemoteBackend for HttpBackend {
    fn grades(&self, org_code: &str) -> Result<Vec<Grade>> {
        self.get(&self.endpoints.grades, Some(org_code))
    }

    fn subjects(&self, org_code: &str, class_id: &str) -> Result<Vec<Subject>> {
        let url = format!("{}?classId={}", self.endpoints.subjects, class_id);
        self.get(&url, Some(org_code))
    }

    fn chapters(&self, org_code: &str, plan_class_id: &str) -> Result<Vec<Chapter>> {
        let url = format!("{}?planClassId={}", self.endpoints.chapters, plan_class_id);
        self.get(&url, Some(org_code))
    }

    fn course_outcomes(&self, req: &OutcomeRequest) -> Result<Vec<CourseOutcome>> {
        let body = serde_json::to_value(req)?;
        let resp: OutcomeResponse = self.post(&self.endpoints.course_outcomes, None, &body)?;
        Ok(resp.course_outcomes)
    }

    fn assessment_items(&self, payload: &Value) -> Result<BTreeMap<String, EloItems>> {
        self.post(&self.endpoints.assessment_items, None, payload)
    }

    fn unit_plan(&self, payload: &Value) -> Result<String> {
        let resp: UnitPlanResponse = self.post(&self.endpoints.unit_plan, None, payload)?;
        Ok(resp.unit_plan)
    }

    fn save_unit_plan(&self, payload: &Value) -> Result<Value> {
        self.post(&self.endpoints.save_unit_plan, None, payload)
    }

    fn paper_details(&self, org_code: &str, paper_id: &str) -> Result<Value> {
        let url = format!("{}?paperId={}", self.endpoints.paper_details, paper_id);
        self.get(&url, Some(org_code))
    }

    fn paper_question_details(&self, org_code: &str, paper_id: &str) -> Result<Value> {
        let url = format!(
            "{}?paperId={}",
            self.endpoints.paper_question_details, paper_id
        );
        self.get(&url, Some(org_code))
    }

    fn delete_paper(&self, org_code: &str, paper_id: &str) -> Result<Value> {
        self.post(
            &self.endpoints.delete_paper,
            Some(org_code),
            &json!({ "paperId": paper_id }),
        )
    }

    fn update_paper(&self, org_code: &str, paper_id: &str, patch: &Value) -> Result<Value> {
        self.post(
            &self.endpoints.update_paper,
            Some(org_code),
            &json!({ "paperId": paper_id, "patch": patch }),
        )
    }

    fn save_paper(&self, org_code: &str, paper: &Value) -> Result<Value> {
        self.post(&self.endpoints.save_paper, Some(org_code), paper)
    }
}
