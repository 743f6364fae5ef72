//! Prompt - Named template runs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PromptRunRequest {
    /// Template variables, e.g. `city`, `days`
    #[serde(default)]
    pub vars: HashMap<String, String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptRunResponse {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptListResponse {
    pub templates: Vec<String>,
}
