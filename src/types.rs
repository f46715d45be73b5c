//! Read-only views of successful reply payloads.
//!
//! Fields the peer may omit default to empty values; unknown fields are
//! ignored.

use serde::{Deserialize, Serialize};

/// Result of `AUTHORIZE`: an OAuth2 code to exchange for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub code: String,
}

/// Result of `AUTHENTICATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub application: Option<Application>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A text or voice channel, as returned by the channel selection commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<u8>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

/// A server (guild) the authenticated user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// `GET_GUILDS` payload wrapper.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerList {
    #[serde(default)]
    pub guilds: Vec<Server>,
}

/// Result of `SUBSCRIBE` / `UNSUBSCRIBE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub evt: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
