use std::collections::HashMap;

use serde::Deserialize;

use crate::config::Config;
use crate::gateway::RemoteBackend;
use crate::wizard::WizardSession;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub backend: Box<dyn RemoteBackend>,
    pub sessions: HashMap<String, WizardSession>,
}

impl AppState {
    pub fn new(config: Config, backend: Box<dyn RemoteBackend>) -> Self {
        Self { config, backend, sessions: HashMap::new() }
    }
}
