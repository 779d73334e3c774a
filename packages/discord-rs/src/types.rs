//! Wire types for the subset of the Discord API this client speaks.
//!
//! Only the fields the bot actually reads are modeled; everything else in the
//! payloads is ignored during deserialization.

use serde::Deserialize;

/// Sticker type: platform-wide standard catalog.
pub const STICKER_TYPE_STANDARD: u8 = 1;
/// Sticker type: owned by a specific guild.
pub const STICKER_TYPE_GUILD: u8 = 2;

/// Sticker format: animated GIF.
pub const STICKER_FORMAT_GIF: u8 = 4;

/// Media CDN URL for a sticker asset, usable whether or not the sticker
/// metadata is available.
pub fn sticker_media_url(sticker_id: &str, size: u32) -> String {
    format!("https://media.discordapp.net/stickers/{sticker_id}.png?size={size}")
}

/// A full sticker object, as returned by `GET /stickers/{id}` or embedded in
/// a message payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sticker {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub format_type: Option<u8>,
    pub guild_id: Option<String>,
}

impl Sticker {
    pub fn is_guild_sticker(&self) -> bool {
        self.kind == STICKER_TYPE_GUILD
    }

    /// CDN URL for a small preview of this sticker.
    pub fn preview_url(&self) -> String {
        if self.format_type == Some(STICKER_FORMAT_GIF) {
            format!("https://media.discordapp.net/stickers/{}.gif?size=256", self.id)
        } else {
            sticker_media_url(&self.id, 256)
        }
    }
}

/// Partial sticker reference carried inline on messages and snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StickerItem {
    pub id: String,
    pub name: String,
    pub format_type: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: Option<bool>,
}

impl User {
    /// Legacy `name#1234` tag, or the plain username for migrated accounts.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    /// CDN URL for the user's avatar, falling back to a default avatar when
    /// none is set.
    pub fn display_avatar_url(&self, size: u32) -> String {
        match &self.avatar {
            Some(hash) => format!(
                "https://cdn.discordapp.com/avatars/{}/{}.png?size={}",
                self.id, hash, size
            ),
            None => {
                let index = self.id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0);
                format!("https://cdn.discordapp.com/embed/avatars/{index}.png")
            }
        }
    }

    pub fn profile_url(&self) -> String {
        format!("https://discord.com/users/{}", self.id)
    }
}

/// A guild member. The `user` field is absent when the member arrives
/// attached to a message payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Member {
    pub user: Option<User>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A guild role. `permissions` is the raw bitset, serialized by the platform
/// as a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub id: String,
    pub permissions: String,
}

/// The preserved content of a forwarded message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageSnapshot {
    pub message: SnapshotContent,
}

/// Inner snapshot payload. Newer payloads carry `sticker_items`; older ones
/// embed full `stickers` objects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotContent {
    pub sticker_items: Option<Vec<StickerItem>>,
    pub stickers: Option<Vec<Sticker>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: Option<User>,
    pub member: Option<Member>,
    pub stickers: Option<Vec<Sticker>>,
    pub sticker_items: Option<Vec<StickerItem>>,
    pub message_snapshots: Option<Vec<MessageSnapshot>>,
}

impl Message {
    /// Permalink to this message. Requires a guild context.
    pub fn jump_url(&self) -> Option<String> {
        self.guild_id.as_ref().map(|guild_id| {
            format!(
                "https://discord.com/channels/{}/{}/{}",
                guild_id, self.channel_id, self.id
            )
        })
    }

    /// Permalink to the channel this message was posted in.
    pub fn channel_url(&self) -> Option<String> {
        self.guild_id
            .as_ref()
            .map(|guild_id| format!("https://discord.com/channels/{}/{}", guild_id, self.channel_id))
    }
}

pub const CHANNEL_TYPE_GUILD_TEXT: u8 = 0;
pub const CHANNEL_TYPE_DM: u8 = 1;
pub const CHANNEL_TYPE_GROUP_DM: u8 = 3;
pub const CHANNEL_TYPE_GUILD_ANNOUNCEMENT: u8 = 5;
pub const CHANNEL_TYPE_ANNOUNCEMENT_THREAD: u8 = 10;
pub const CHANNEL_TYPE_PUBLIC_THREAD: u8 = 11;
pub const CHANNEL_TYPE_PRIVATE_THREAD: u8 = 12;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub locked: bool,
}

/// Thread membership marker; present on thread channels the current user has
/// already joined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadMember {
    pub join_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: Option<String>,
    pub thread_metadata: Option<ThreadMetadata>,
    pub member: Option<ThreadMember>,
}

impl Channel {
    pub fn is_text_based(&self) -> bool {
        matches!(
            self.kind,
            CHANNEL_TYPE_GUILD_TEXT
                | CHANNEL_TYPE_DM
                | CHANNEL_TYPE_GROUP_DM
                | CHANNEL_TYPE_GUILD_ANNOUNCEMENT
                | CHANNEL_TYPE_ANNOUNCEMENT_THREAD
                | CHANNEL_TYPE_PUBLIC_THREAD
                | CHANNEL_TYPE_PRIVATE_THREAD
        )
    }

    pub fn is_thread(&self) -> bool {
        matches!(
            self.kind,
            CHANNEL_TYPE_ANNOUNCEMENT_THREAD | CHANNEL_TYPE_PUBLIC_THREAD | CHANNEL_TYPE_PRIVATE_THREAD
        )
    }

    /// True for threads that can still be joined.
    pub fn is_joinable(&self) -> bool {
        self.is_thread()
            && self
                .thread_metadata
                .as_ref()
                .map(|meta| !meta.archived && !meta.locked)
                .unwrap_or(false)
    }

    /// True when the current user is already a member of this thread.
    pub fn is_joined(&self) -> bool {
        self.member.is_some()
    }
}
