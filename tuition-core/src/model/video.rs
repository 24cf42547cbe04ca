use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::entity_ref::{EntityId, EntityRef};
use crate::model::Resource;
use crate::validation::{Checks, Validate, ValidationErrors};

/// A free video resource, linked by URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityRef>,
    #[serde(default = "free")]
    pub is_free: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn free() -> bool {
    true
}

impl Resource for Video {
    type Draft = VideoDraft;

    const PATH: &'static str = "/videos";
    const NOUN: &'static str = "video";
    const PLURAL: &'static str = "videos";

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into, strip_option)]
pub struct VideoDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<EntityId>,
    pub is_free: bool,
}

impl Default for VideoDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            url: String::new(),
            subject: None,
            standard: None,
            is_free: true,
        }
    }
}

impl Validate for VideoDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Checks::default()
            .required("title", &self.title)
            .url("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_videos_are_free_unless_told_otherwise() -> anyhow::Result<()> {
        let video: Video = serde_json::from_value(json!({
            "_id": "v1",
            "title": "Kinematics",
            "url": "https://www.youtube.com/watch?v=abc"
        }))?;
        assert!(video.is_free);
        Ok(())
    }

    #[test]
    fn test_draft_validation() {
        let draft = VideoDraft::default()
            .title("Kinematics")
            .url("https://www.youtube.com/watch?v=abc");
        assert!(draft.validate().is_ok());
        let errors = draft.url("watch?v=abc").validate().unwrap_err();
        assert_eq!(errors.get("url"), Some("Enter a valid URL"));
    }
}
