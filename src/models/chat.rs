use serde::{ Serialize, Deserialize, Deserializer };

pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

/// Role of a conversation turn as sent by the dashboard widget. Anything
/// other than `user`/`assistant` parses as `Other` and is dropped later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

fn default_media_type() -> String {
    DEFAULT_IMAGE_MEDIA_TYPE.to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub data: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

/// `model` may be omitted, but an explicit `null` is a malformed payload.
fn deserialize_model<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    String::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ConversationTurn>,
    #[serde(default)]
    pub dashboard_context: String,
    #[serde(
        default,
        deserialize_with = "deserialize_model",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub tokens_used: u128,
}
