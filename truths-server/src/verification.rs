use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use truths_types::{
    FrameAction, FrameRequest, SignedFrameMessage, SimpleFrameMessage, VerifiedFrame,
    VerifiedIdentity,
};

const USERNAME_CACHE_TTL: Duration = Duration::from_secs(3600);
const USER_DATA_TYPE_USERNAME: u32 = 6;

/// Hub reply to `POST /v1/validateMessage`.
#[derive(Debug, Deserialize)]
struct ValidateMessageResponse {
    valid: bool,
    message: Option<HubMessage>,
}

#[derive(Debug, Deserialize)]
struct HubMessage {
    data: HubMessageData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HubMessageData {
    fid: u64,
    frame_action_body: Option<FrameActionBody>,
}

/// `inputText` and `state` arrive base64-encoded.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameActionBody {
    button_index: Option<u32>,
    input_text: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserDataResponse {
    data: UserDataMessageData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDataMessageData {
    user_data_body: UserDataBody,
}

#[derive(Debug, Deserialize)]
struct UserDataBody {
    value: String,
}

/// Turns a posted frame body into a [`VerifiedFrame`].
pub struct FrameVerifier {
    client: Client,
    hub_url: String,
    username_cache: Arc<RwLock<HashMap<u64, (String, Instant)>>>,
    dev_mode: bool,
}

impl FrameVerifier {
    pub fn new(hub_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            hub_url: hub_url.into().trim_end_matches('/').to_string(),
            username_cache: Arc::new(RwLock::new(HashMap::new())),
            dev_mode: false,
        }
    }

    pub fn new_dev_mode() -> Self {
        Self {
            client: Client::new(),
            hub_url: String::new(),
            username_cache: Arc::new(RwLock::new(HashMap::new())),
            dev_mode: true,
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub async fn verify(&self, request: FrameRequest) -> Result<VerifiedFrame, VerificationError> {
        match request {
            FrameRequest::Simple(message) => self.verify_simple(message),
            FrameRequest::Signed(message) if self.dev_mode => Ok(Self::trust_untrusted(message)),
            FrameRequest::Signed(message) => self.verify_with_hub(message).await,
        }
    }

    fn verify_simple(&self, message: SimpleFrameMessage) -> Result<VerifiedFrame, VerificationError> {
        if !self.dev_mode {
            tracing::warn!("Rejecting unsigned frame message outside dev mode");
            return Err(VerificationError::Unsigned);
        }
        if !message.is_valid {
            return Err(VerificationError::MarkedInvalid);
        }

        let action = FrameAction {
            button_index: resolve_button(message.button),
            input_text: message.input_text,
            identity: message
                .fid
                .map(|fid| VerifiedIdentity::new(fid, message.username)),
        };

        Ok(VerifiedFrame {
            action,
            state_token: message.state,
        })
    }

    fn trust_untrusted(message: SignedFrameMessage) -> VerifiedFrame {
        let data = message.untrusted_data;
        tracing::debug!("Trusting unverified frame payload from fid {}", data.fid);

        VerifiedFrame {
            action: FrameAction {
                button_index: resolve_button(data.button_index),
                input_text: data.input_text,
                identity: Some(VerifiedIdentity::new(data.fid, None)),
            },
            state_token: data.state,
        }
    }

    async fn verify_with_hub(
        &self,
        message: SignedFrameMessage,
    ) -> Result<VerifiedFrame, VerificationError> {
        let trusted = message.trusted_data.ok_or(VerificationError::Unsigned)?;
        let bytes = hex::decode(trusted.message_bytes.trim_start_matches("0x")).map_err(|e| {
            tracing::warn!("Frame message bytes are not hex: {:?}", e);
            VerificationError::InvalidMessageBytes
        })?;

        let url = format!("{}/v1/validateMessage", self.hub_url);
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to reach hub at {}: {:?}", url, e);
                VerificationError::HubUnavailable
            })?;

        if !response.status().is_success() {
            tracing::warn!("Hub validation returned status: {}", response.status());
            return Err(VerificationError::InvalidSignature);
        }

        let validated: ValidateMessageResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse hub validation response: {:?}", e);
            VerificationError::MalformedMessage
        })?;

        let message = match validated {
            ValidateMessageResponse {
                valid: true,
                message: Some(message),
            } => message,
            _ => return Err(VerificationError::InvalidSignature),
        };

        let fid = message.data.fid;
        let body = message.data.frame_action_body.unwrap_or_default();
        let input_text = body.input_text.as_deref().map(decode_hub_bytes).transpose()?;
        let state_token = body.state.as_deref().map(decode_hub_bytes).transpose()?;
        let username = self.lookup_username(fid).await;

        Ok(VerifiedFrame {
            action: FrameAction {
                button_index: resolve_button(body.button_index),
                input_text,
                identity: Some(VerifiedIdentity::new(fid, username)),
            },
            state_token: state_token.filter(|token| !token.is_empty()),
        })
    }

    /// Username from the hub, cached per fid. `None` on any failure.
    async fn lookup_username(&self, fid: u64) -> Option<String> {
        {
            let cache = self.username_cache.read().await;
            if let Some((username, cached_at)) = cache.get(&fid) {
                if cached_at.elapsed() < USERNAME_CACHE_TTL {
                    return Some(username.clone());
                }
            }
        }

        let url = format!(
            "{}/v1/userDataByFid?fid={}&user_data_type={}",
            self.hub_url, fid, USER_DATA_TYPE_USERNAME
        );
        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!("No username for fid {} (status {})", fid, response.status());
                return None;
            }
            Err(e) => {
                tracing::warn!("Username lookup for fid {} failed: {:?}", fid, e);
                return None;
            }
        };

        let username = match response.json::<UserDataResponse>().await {
            Ok(user_data) => user_data.data.user_data_body.value,
            Err(e) => {
                tracing::warn!("Failed to parse user data for fid {}: {:?}", fid, e);
                return None;
            }
        };

        let mut cache = self.username_cache.write().await;
        cache.insert(fid, (username.clone(), Instant::now()));
        Some(username)
    }
}

/// Missing and zero button indexes both mean the first button.
fn resolve_button(button: Option<u32>) -> u32 {
    match button {
        None | Some(0) => 1,
        Some(button) => button,
    }
}

fn decode_hub_bytes(encoded: &str) -> Result<String, VerificationError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| VerificationError::MalformedMessage)?;
    String::from_utf8(bytes).map_err(|_| VerificationError::MalformedMessage)
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Frame message is marked invalid")]
    MarkedInvalid,
    #[error("Frame message is not signed")]
    Unsigned,
    #[error("Frame message bytes are not valid hex")]
    InvalidMessageBytes,
    #[error("Hub is unavailable")]
    HubUnavailable,
    #[error("Hub rejected the frame message")]
    InvalidSignature,
    #[error("Malformed frame message")]
    MalformedMessage,
}
