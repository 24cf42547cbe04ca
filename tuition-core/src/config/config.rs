use crate::is_default;
use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Config {
    pub api: ApiInfo,
    #[serde(default, skip_serializing_if = "is_default")]
    pub session: SessionInfo,
    #[serde(default, skip_serializing_if = "is_default")]
    pub upload: UploadInfo,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    /// Root of the REST API, e.g. `https://academy.example.com/api`.
    pub base_url: String,
    /// Per request timeout in seconds.
    #[serde(default, skip_serializing_if = "is_default")]
    pub timeout: Option<u64>,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// File the cookies and the signed in user are kept in between runs.
    #[serde(default, skip_serializing_if = "is_default")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub csrf_cookie: Option<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub csrf_header: Option<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub login_route: Option<String>,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    #[serde(default, skip_serializing_if = "is_default")]
    pub max_file_size: Option<usize>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub chunk_size: Option<usize>,
}
