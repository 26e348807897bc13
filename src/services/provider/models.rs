//! Model listing filter for `GET /api/models`

use serde::{Deserialize, Serialize};
use serde_json::Value;

const MODEL_PREFIX: &str = "models/";
const GENERATE_METHOD: &str = "generateContent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelList {
    pub count: usize,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawModel {
    name: String,
    version: String,
    display_name: String,
    description: String,
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListing {
    models: Vec<RawModel>,
}

impl ModelList {
    /// Keep content-generation models, strip the `models/` prefix and sort
    /// by version, newest first.
    pub fn from_listing(listing: Value) -> Result<Self, serde_json::Error> {
        let raw: RawListing = serde_json::from_value(listing)?;
        let mut models: Vec<ModelInfo> = raw
            .models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == GENERATE_METHOD))
            .map(|m| ModelInfo {
                name: m
                    .name
                    .strip_prefix(MODEL_PREFIX)
                    .unwrap_or(&m.name)
                    .to_string(),
                version: m.version,
                display_name: m.display_name,
                description: m.description,
            })
            .collect();
        models.sort_by(|a, b| b.version.cmp(&a.version));

        Ok(Self {
            count: models.len(),
            models,
        })
    }
}

/// Provider listings that report an error carry a top-level `error` object
pub fn is_error_listing(listing: &Value) -> bool {
    listing.get("error").is_some_and(|e| !e.is_null())
}
