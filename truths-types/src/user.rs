use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Stable identifier of an authenticated party (the Farcaster fid, as a string).
pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub total_points: i32,
}

impl User {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            total_points: 0,
        }
    }
}

/// Identity yielded by a verified frame message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VerifiedIdentity {
    pub fid: String,
    pub username: String,
}

impl VerifiedIdentity {
    /// Builds an identity, falling back to `User_<fid>` when no username is known.
    pub fn new(fid: impl ToString, username: Option<String>) -> Self {
        let fid = fid.to_string();
        let username = username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("User_{}", fid));
        Self { fid, username }
    }
}
