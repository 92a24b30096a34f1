use serde::{Deserialize, Serialize};

/// One unit of content sent to the chat-display overlay.
///
/// Serializes as `{"mc_type": "string" | "emote" | "image", "value": ...}`,
/// which is the shape the overlay consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mc_type", content = "value", rename_all = "lowercase")]
pub enum Segment {
    #[serde(rename = "string")]
    Text(String),
    Emote(String),
    Image(String),
}
