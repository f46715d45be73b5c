//! Typed command set.
//!
//! Each remote operation is one [`Command`] variant with its own arguments.
//! Numeric ids are rendered as decimal strings on the wire.

use frames::Frame;
use serde_json::{Value, json};

/// A remote command and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Authorize { client_id: u64, scopes: Vec<String> },
    Authenticate { access_token: String },
    SelectTextChannel { channel_id: u64 },
    SelectVoiceChannel { channel_id: u64 },
    GetGuilds,
    GetGuild { guild_id: u64 },
    Subscribe { event: String, args: Option<Value> },
    Unsubscribe { event: String, args: Option<Value> },
}

impl Command {
    /// Wire command name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authorize { .. } => "AUTHORIZE",
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::SelectTextChannel { .. } => "SELECT_TEXT_CHANNEL",
            Self::SelectVoiceChannel { .. } => "SELECT_VOICE_CHANNEL",
            Self::GetGuilds => "GET_GUILDS",
            Self::GetGuild { .. } => "GET_GUILD",
            Self::Subscribe { .. } => "SUBSCRIBE",
            Self::Unsubscribe { .. } => "UNSUBSCRIBE",
        }
    }

    /// Wire `args` document.
    #[must_use]
    pub fn args(&self) -> Option<Value> {
        let args = match self {
            Self::Authorize { client_id, scopes } => {
                json!({ "client_id": client_id.to_string(), "scopes": scopes })
            }
            Self::Authenticate { access_token } => json!({ "access_token": access_token }),
            Self::SelectTextChannel { channel_id } | Self::SelectVoiceChannel { channel_id } => {
                json!({ "channel_id": channel_id.to_string() })
            }
            Self::GetGuilds => json!({}),
            Self::GetGuild { guild_id } => json!({ "guild_id": guild_id.to_string() }),
            Self::Subscribe { args, .. } | Self::Unsubscribe { args, .. } => {
                args.clone().unwrap_or_else(|| json!({}))
            }
        };
        Some(args)
    }

    /// Wire `evt` for subscription commands.
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        match self {
            Self::Subscribe { event, .. } | Self::Unsubscribe { event, .. } => Some(event.as_str()),
            _ => None,
        }
    }

    /// Build the outbound frame for this command under `nonce`.
    #[must_use]
    pub fn to_frame(&self, nonce: &str) -> Frame {
        self.to_notification().with_nonce(nonce)
    }

    /// Build the outbound frame with no nonce; the peer sends no reply.
    #[must_use]
    pub fn to_notification(&self) -> Frame {
        let mut frame = Frame::new(self.name());
        frame.args = self.args();
        if let Some(evt) = self.event() {
            frame = frame.with_event(evt);
        }
        frame
    }
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
