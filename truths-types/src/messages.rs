use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::user::VerifiedIdentity;

/// Body accepted by the frame endpoint.
///
/// Local tooling posts the flat [`SimpleFrameMessage`]; hosting clients post
/// the signed packet with untrusted and trusted sections.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum FrameRequest {
    Simple(SimpleFrameMessage),
    Signed(SignedFrameMessage),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SimpleFrameMessage {
    pub is_valid: bool,
    #[serde(default)]
    pub button: Option<u32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub fid: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub input_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignedFrameMessage {
    pub untrusted_data: UntrustedData,
    #[serde(default)]
    pub trusted_data: Option<TrustedData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UntrustedData {
    pub fid: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub button_index: Option<u32>,
    #[serde(default)]
    pub input_text: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TrustedData {
    /// Hex-encoded protobuf message, validated by a hub.
    pub message_bytes: String,
}

/// A single user interaction after verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FrameAction {
    /// 1-based, matching the rendered button order.
    pub button_index: u32,
    pub input_text: Option<String>,
    pub identity: Option<VerifiedIdentity>,
}

impl FrameAction {
    pub fn button(button_index: u32) -> Self {
        Self {
            button_index,
            input_text: None,
            identity: None,
        }
    }

    pub fn with_input(mut self, text: impl Into<String>) -> Self {
        self.input_text = Some(text.into());
        self
    }

    pub fn with_identity(mut self, identity: VerifiedIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Input text, treating an empty string as absent.
    pub fn input(&self) -> Option<&str> {
        self.input_text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Verified action plus the state token it was submitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFrame {
    pub action: FrameAction,
    pub state_token: Option<String>,
}

/// Everything needed to render one frame response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FrameContent {
    pub title: String,
    pub description: String,
    /// At most four labels; label `i` is submitted as button index `i + 1`.
    pub buttons: Vec<String>,
    pub accepts_input: bool,
    pub image_url: String,
    pub post_url: String,
    /// Encoded state the next action must carry back.
    pub state: String,
}

/// Text content of the preview image for a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreviewCard {
    pub headline: String,
    pub lines: Vec<String>,
}
