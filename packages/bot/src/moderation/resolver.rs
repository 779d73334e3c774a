//! Sticker metadata resolution.
//!
//! Every referenced sticker is resolved independently and concurrently:
//! stickers already attached to the message payload are used as-is, then the
//! guild and global caches are consulted, and only then does a REST fetch go
//! out. A failed fetch becomes a [`ResolutionFailure`] value instead of
//! aborting the sibling resolutions, so a multi-sticker message always
//! resolves as far as it can.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use discord::types::{Message, Sticker, STICKER_TYPE_GUILD, STICKER_TYPE_STANDARD};
use futures::future::join_all;
use tokio::sync::RwLock;

use crate::platform::Platform;

/// Origin classification of a resolved sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickerKind {
    Standard,
    Guild,
    Unknown(u8),
}

impl StickerKind {
    fn from_wire(kind: u8) -> Self {
        match kind {
            STICKER_TYPE_STANDARD => StickerKind::Standard,
            STICKER_TYPE_GUILD => StickerKind::Guild,
            other => StickerKind::Unknown(other),
        }
    }
}

impl fmt::Display for StickerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StickerKind::Standard => write!(f, "Standard Sticker"),
            StickerKind::Guild => write!(f, "Guild Sticker"),
            StickerKind::Unknown(raw) => write!(f, "Unknown Type ({raw})"),
        }
    }
}

/// Successfully resolved sticker metadata. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSticker {
    pub id: String,
    pub name: String,
    pub kind: StickerKind,
    pub guild_id: Option<String>,
    pub preview_url: String,
}

impl ResolvedSticker {
    fn from_wire(sticker: &Sticker) -> Self {
        Self {
            id: sticker.id.clone(),
            name: sticker.name.clone(),
            kind: StickerKind::from_wire(sticker.kind),
            guild_id: sticker.guild_id.clone(),
            preview_url: sticker.preview_url(),
        }
    }

    /// True when this sticker is owned by a guild other than
    /// `self_guild_id`. Standard-catalog stickers are never foreign.
    pub fn is_foreign_to(&self, self_guild_id: &str) -> bool {
        self.kind == StickerKind::Guild
            && self
                .guild_id
                .as_deref()
                .map(|guild_id| guild_id != self_guild_id)
                .unwrap_or(false)
    }
}

/// A sticker reference that could not be resolved. Carries the platform's
/// JSON error code when one was returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub id: String,
    pub message: String,
    pub code: Option<u32>,
}

/// Passive in-memory sticker cache, populated from successful fetches.
/// Racing writers converge on equivalent values, so no coordination beyond
/// the lock is needed.
#[derive(Default)]
struct StickerCache {
    guild: RwLock<HashMap<(String, String), Sticker>>,
    global: RwLock<HashMap<String, Sticker>>,
}

impl StickerCache {
    async fn get(&self, guild_id: &str, sticker_id: &str) -> Option<Sticker> {
        let key = (guild_id.to_string(), sticker_id.to_string());
        if let Some(sticker) = self.guild.read().await.get(&key) {
            return Some(sticker.clone());
        }
        self.global.read().await.get(sticker_id).cloned()
    }

    async fn insert(&self, sticker: &Sticker) {
        if let Some(guild_id) = &sticker.guild_id {
            self.guild
                .write()
                .await
                .insert((guild_id.clone(), sticker.id.clone()), sticker.clone());
        }
        self.global
            .write()
            .await
            .insert(sticker.id.clone(), sticker.clone());
    }
}

pub struct StickerResolver {
    platform: Arc<dyn Platform>,
    cache: StickerCache,
}

impl StickerResolver {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            cache: StickerCache::default(),
        }
    }

    /// Resolve every referenced sticker concurrently. All branches settle;
    /// each reference ends up in exactly one of the returned lists.
    pub async fn resolve(
        &self,
        message: &Message,
        guild_id: &str,
        sticker_ids: &[String],
    ) -> (Vec<ResolvedSticker>, Vec<ResolutionFailure>) {
        let outcomes = join_all(
            sticker_ids
                .iter()
                .map(|sticker_id| self.resolve_one(message, guild_id, sticker_id)),
        )
        .await;

        let mut resolved = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(sticker) => resolved.push(sticker),
                Err(failure) => failed.push(failure),
            }
        }
        (resolved, failed)
    }

    async fn resolve_one(
        &self,
        message: &Message,
        guild_id: &str,
        sticker_id: &str,
    ) -> Result<ResolvedSticker, ResolutionFailure> {
        // Full sticker objects attached to the outer message payload.
        if let Some(sticker) = message
            .stickers
            .as_ref()
            .and_then(|stickers| stickers.iter().find(|s| s.id == sticker_id))
        {
            return Ok(ResolvedSticker::from_wire(sticker));
        }

        if let Some(sticker) = self.cache.get(guild_id, sticker_id).await {
            return Ok(ResolvedSticker::from_wire(&sticker));
        }

        match self.platform.fetch_sticker(sticker_id).await {
            Ok(sticker) => {
                self.cache.insert(&sticker).await;
                Ok(ResolvedSticker::from_wire(&sticker))
            }
            Err(err) => Err(ResolutionFailure {
                id: sticker_id.to_string(),
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }
}
