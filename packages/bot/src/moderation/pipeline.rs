//! Per-message moderation pipeline.
//!
//! Orchestrates one inbound message end to end. Ordering matters within a
//! run: resolution fully settles before the decision, enforcement happens
//! before the audit card is sent so the card reflects the true outcome.
//! Runs for different messages are fully independent.

use std::sync::Arc;

use discord::types::Message;

use crate::config::Config;
use crate::moderation::audit::{self, LogChannelSink};
use crate::moderation::enforcement::EnforcementExecutor;
use crate::moderation::permission::PermissionOracle;
use crate::moderation::policy;
use crate::moderation::resolver::StickerResolver;
use crate::moderation::snapshot;
use crate::platform::Platform;

pub struct ModerationPipeline {
    resolver: StickerResolver,
    oracle: PermissionOracle,
    executor: EnforcementExecutor,
    sink: LogChannelSink,
    self_user_id: String,
}

impl ModerationPipeline {
    pub fn new(platform: Arc<dyn Platform>, config: &Config, self_user_id: String) -> Self {
        Self {
            resolver: StickerResolver::new(platform.clone()),
            oracle: PermissionOracle::new(platform.clone()),
            executor: EnforcementExecutor::new(platform.clone()),
            sink: LogChannelSink::new(
                platform,
                config.log_channel_id.clone(),
                config.alert_mention.clone(),
            ),
            self_user_id,
        }
    }

    /// Process one inbound message event. Infallible: every downstream
    /// failure is folded into data or logged, and messages outside the
    /// policy's scope fall through without side effects.
    pub async fn handle_message(&self, message: &Message) {
        let Some(guild_id) = message.guild_id.clone() else {
            return;
        };
        let sticker_ids = snapshot::forwarded_sticker_ids(message);
        if sticker_ids.is_empty() {
            return;
        }

        let author_tag = message
            .author
            .as_ref()
            .map(|author| author.tag())
            .unwrap_or_else(|| "Unknown".to_string());
        tracing::info!(
            count = sticker_ids.len(),
            author = %author_tag,
            message_id = %message.id,
            "found stickers in forwarded message"
        );
        tracing::debug!(?sticker_ids, "snapshot sticker references");

        let (resolved, failed) = self
            .resolver
            .resolve(message, &guild_id, &sticker_ids)
            .await;
        tracing::info!(
            resolved = resolved.len(),
            total = sticker_ids.len(),
            "sticker resolution settled"
        );
        for failure in &failed {
            tracing::warn!(
                sticker_id = %failure.id,
                code = ?failure.code,
                error = %failure.message,
                "failed to resolve sticker"
            );
        }

        let verdict = policy::decide(&resolved, &failed, &guild_id);
        if !verdict.violates {
            tracing::debug!("all stickers are local or standard, no action needed");
            return;
        }
        tracing::info!(reasons = ?verdict.reasons, "policy violation detected");

        let permission = self.oracle.check(message).await;
        if permission.allowed {
            tracing::info!(author = %author_tag, "author may use external stickers, skipping enforcement");
            return;
        }
        if permission.checked {
            tracing::info!(author = %author_tag, "author lacks external sticker access, enforcing policy");
        } else {
            tracing::warn!("could not verify permissions, proceeding with enforcement");
        }

        let outcome = self
            .executor
            .enforce(message, &self.self_user_id, &self.oracle)
            .await;

        let record = audit::build(
            message,
            &sticker_ids,
            resolved,
            failed,
            permission,
            verdict,
            outcome,
        );
        self.sink.emit(&record).await;
    }
}
