//! Audit record assembly and emission.
//!
//! [`build`] assembles the complete evidentiary snapshot of one enforcement
//! episode; [`LogChannelSink`] owns the destination-channel cache, renders
//! the record as a components-v2 card, and sends it. Emission is strictly
//! best-effort: every failure is logged and swallowed, with at most one send
//! attempt per record, so a logging problem can never disturb the
//! message-processing caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use discord::card::{Container, CreateMessage, Section};
use discord::error::codes;
use discord::types::{sticker_media_url, Channel, Message};
use tokio::sync::RwLock;

use crate::moderation::enforcement::EnforcementOutcome;
use crate::moderation::permission::PermissionVerdict;
use crate::moderation::policy::PolicyVerdict;
use crate::moderation::resolver::{ResolutionFailure, ResolvedSticker};
use crate::platform::Platform;

const CARD_ACCENT_COLOR: u32 = 0xF97316;

/// Immutable evidentiary snapshot of one detection/decision/enforcement
/// episode.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub message_id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub author_id: Option<String>,
    pub author_tag: Option<String>,
    pub author_avatar_url: Option<String>,
    pub jump_url: Option<String>,
    pub channel_url: Option<String>,
    pub author_url: Option<String>,
    pub sticker_ids: Vec<String>,
    pub resolved: Vec<ResolvedSticker>,
    pub failed: Vec<ResolutionFailure>,
    pub permission: PermissionVerdict,
    pub verdict: PolicyVerdict,
    pub outcome: EnforcementOutcome,
    pub recorded_at: DateTime<Utc>,
}

/// Assemble the audit record for one enforcement episode. Total: any missing
/// optional message metadata degrades to `None`.
pub fn build(
    message: &Message,
    sticker_ids: &[String],
    resolved: Vec<ResolvedSticker>,
    failed: Vec<ResolutionFailure>,
    permission: PermissionVerdict,
    verdict: PolicyVerdict,
    outcome: EnforcementOutcome,
) -> AuditRecord {
    let author = message.author.as_ref();
    AuditRecord {
        message_id: message.id.clone(),
        channel_id: message.channel_id.clone(),
        guild_id: message.guild_id.clone().unwrap_or_default(),
        author_id: author.map(|a| a.id.clone()),
        author_tag: author.map(|a| a.tag()),
        author_avatar_url: author.map(|a| a.display_avatar_url(2048)),
        jump_url: message.jump_url(),
        channel_url: message.channel_url(),
        author_url: author.map(|a| a.profile_url()),
        sticker_ids: sticker_ids.to_vec(),
        resolved,
        failed,
        permission,
        verdict,
        outcome,
        recorded_at: Utc::now(),
    }
}

/// Render the record as a components-v2 card. Optional pieces (mention,
/// author, links) degrade without disturbing the surrounding structure.
fn render_card(record: &AuditRecord, alert_mention: Option<&str>) -> CreateMessage {
    let mut container = Container::new().accent_color(CARD_ACCENT_COLOR);

    if let Some(mention) = alert_mention {
        container = container.text(format!("-# {mention}")).divider();
    }

    container = container.text("## 🚫 Sticker Bypassing Detected 🚫").divider();

    let delete_status = if record.outcome.deleted {
        "✓ Message deleted"
    } else {
        "✗ Message deletion failed"
    };
    container = container
        .text(format!("- **Reason**:\n> {}", record.verdict.human_reason))
        .text(format!("- **Action**:\n> {delete_status}"))
        .divider();

    container = container.text("### 👤 Forwarded By");
    let mut author = Section::new();
    if let Some(avatar_url) = &record.author_avatar_url {
        author = author.thumbnail(avatar_url.as_str(), "User Avatar");
    }
    let mention = record
        .author_id
        .as_ref()
        .map(|id| format!("<@{id}>"))
        .unwrap_or_else(|| "Unknown".to_string());
    author = author
        .text(format!("- **Mention**:\n> {mention}"))
        .text(format!(
            "- **ID**:\n> {}",
            record.author_id.as_deref().unwrap_or("Unknown")
        ))
        .text(format!(
            "- **Tag**:\n> {}",
            record.author_tag.as_deref().unwrap_or("Unknown")
        ));
    container = container.section(author).divider();

    container = container
        .text("### 📍 Context")
        .text(format!("- **Channel**:\n> <#{}>", record.channel_id))
        .text(format!(
            "- **Message**:\n> [Jump to Message]({})",
            record.jump_url.as_deref().unwrap_or("Unknown")
        ))
        .text(format!(
            "- **Sticker IDs**:\n> {}",
            record.sticker_ids.join(", ")
        ));

    if record.permission.checked {
        let status = if record.permission.allowed {
            "✅ Has external sticker access"
        } else {
            "❌ No external sticker access"
        };
        container = container.text(format!("- **Permission**:\n> {status}"));
    }

    container = container.divider().text("### 🎨 Sticker Details");
    if record.resolved.is_empty() {
        // Metadata is gone but the asset itself usually still renders.
        for sticker_id in &record.sticker_ids {
            container = container.section(unknown_sticker_section(sticker_id));
        }
    } else {
        for sticker in &record.resolved {
            container = container.section(sticker_section(sticker));
        }
    }

    container = container.divider().text("### 🔗 Links");
    let mut links = Vec::new();
    if let Some(url) = &record.channel_url {
        links.push(format!("- [Open Channel]({url})"));
    }
    if let Some(url) = &record.jump_url {
        links.push(format!("- [Original Message]({url})"));
    }
    if let Some(url) = &record.author_url {
        links.push(format!("- [View User Profile]({url})"));
    }
    if !links.is_empty() {
        container = container.text(links.join("\n"));
    }

    CreateMessage::card(container)
}

fn sticker_section(sticker: &ResolvedSticker) -> Section {
    let mut section = Section::new()
        .thumbnail(
            sticker.preview_url.as_str(),
            format!("Sticker:\n> {}", sticker.name),
        )
        .text(format!("- **Name**:\n> {}", sticker.name))
        .text(format!("- **ID**:\n> {}", sticker.id))
        .text(format!("- **Type**:\n> {}", sticker.kind));
    if let Some(guild_id) = &sticker.guild_id {
        section = section.text(format!("- **Origin Guild**:\n> {guild_id}"));
    }
    section
}

fn unknown_sticker_section(sticker_id: &str) -> Section {
    Section::new()
        .thumbnail(sticker_media_url(sticker_id, 1024), "Sticker preview")
        .text(format!("- **ID**:\n> {sticker_id}"))
        .text("- **Status**:\n> Metadata unavailable")
}

/// Destination-channel cache and audit card emitter.
pub struct LogChannelSink {
    platform: Arc<dyn Platform>,
    channel_id: String,
    alert_mention: Option<String>,
    cached: RwLock<Option<Channel>>,
}

impl LogChannelSink {
    pub fn new(
        platform: Arc<dyn Platform>,
        channel_id: String,
        alert_mention: Option<String>,
    ) -> Self {
        Self {
            platform,
            channel_id,
            alert_mention,
            cached: RwLock::new(None),
        }
    }

    /// Send the audit card. At most one attempt; every failure is logged and
    /// swallowed.
    pub async fn emit(&self, record: &AuditRecord) {
        let Some(channel) = self.get_or_fetch().await else {
            tracing::error!("cannot log enforcement action, log channel unavailable");
            return;
        };

        let payload = render_card(record, self.alert_mention.as_deref());
        match self.platform.create_message(&channel.id, &payload).await {
            Ok(()) => {
                tracing::info!(channel_id = %channel.id, "enforcement action logged");
            }
            Err(err) => {
                tracing::error!(error = %err, code = ?err.code(), "failed to send audit card");
                match err.code() {
                    Some(codes::INVALID_FORM_BODY) => {
                        tracing::error!("card payload rejected, components likely malformed");
                    }
                    Some(codes::MISSING_PERMISSIONS) => {
                        tracing::error!("missing permission to send messages in the log channel");
                    }
                    _ => {}
                }
            }
        }
    }

    /// Resolve and cache the destination channel. The cached value is only
    /// reused while its identity still matches the configured id.
    async fn get_or_fetch(&self) -> Option<Channel> {
        if let Some(channel) = self.cached.read().await.as_ref() {
            if channel.id == self.channel_id {
                return Some(channel.clone());
            }
        }

        tracing::debug!(channel_id = %self.channel_id, "fetching log channel");
        let channel = match self.platform.fetch_channel(&self.channel_id).await {
            Ok(channel) => channel,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    channel_id = %self.channel_id,
                    "failed to fetch log channel, verify LOG_CHANNEL_ID and bot access"
                );
                return None;
            }
        };

        if !channel.is_text_based() {
            tracing::error!(
                channel_id = %self.channel_id,
                "log channel is not text-based, cannot send messages"
            );
            return None;
        }

        if channel.is_joinable() && !channel.is_joined() {
            tracing::debug!(channel_name = ?channel.name, "joining log thread");
            if let Err(err) = self.platform.join_thread(&channel.id).await {
                tracing::warn!(error = %err, "failed to join log thread");
            }
        }

        *self.cached.write().await = Some(channel.clone());
        Some(channel)
    }
}
