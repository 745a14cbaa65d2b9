//! Merlin vendor schemas, one request and one response shape per endpoint.

use serde::{Deserialize, Serialize};

/// Session-cookie exchange response (`GET session.getmerlin.in`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub user: SessionUser,
    #[serde(default)]
    pub expires: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Refresh-token exchange request (`POST uam.getmerlin.in/session/get`).
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub token: &'a str,
}

/// Refresh-token exchange response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: RefreshData,
    #[serde(default)]
    pub error: Option<RefreshError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshError {
    #[serde(default, rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

/// Unified chat thread request (`POST arcane.getmerlin.in/v1/thread/unified`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedThreadRequest {
    pub attachments: Vec<serde_json::Value>,
    pub chat_id: String,
    pub language: String,
    pub message: ThreadMessage,
    pub metadata: ThreadMetadata,
    pub mode: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    pub content: String,
    pub context: String,
    pub child_id: String,
    pub id: String,
    pub parent_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools, reason = "mirrors upstream metadata flags")]
pub struct ThreadMetadata {
    pub large_context: bool,
    pub merlin_magic: bool,
    pub pro_finder_mode: bool,
    pub web_access: bool,
}

/// Image generation request (`POST uam.getmerlin.in/web/v2/image-generation`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageThreadRequest {
    pub action: ImageAction,
    pub chat_id: String,
    pub mode: String,
    pub settings: ImageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAction {
    pub message: ImageActionMessage,
    #[serde(rename = "type")]
    pub action_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageActionMessage {
    pub attachments: Vec<serde_json::Value>,
    pub content: String,
    pub metadata: ImageMessageMetadata,
    pub parent_id: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageMessageMetadata {
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSettings {
    pub merlin_prompt_magic: bool,
    pub model_config: Vec<ImageModelConfig>,
    pub negative_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageModelConfig {
    pub aspect_ratio: String,
    pub model_id: String,
    pub number_of_images: u32,
}

/// One `data:` record from either vendor stream. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StreamRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<StreamRecordData>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecordData {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<RecordAttachment>,
    #[serde(default)]
    pub message: Option<RecordMessage>,
    #[serde(default)]
    pub payload: Vec<RecordPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecordMessage {
    #[serde(default)]
    pub attachments: Vec<RecordAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecordAttachment {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecordPayload {
    #[serde(default)]
    pub variations: Vec<RecordVariation>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecordVariation {
    #[serde(default)]
    pub url: String,
}
