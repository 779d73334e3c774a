//! Enforcement executor.
//!
//! Deletes the offending message when possible. Provider errors never leave
//! this module: every path folds into an [`EnforcementOutcome`] so the audit
//! record can always be written afterwards.

use std::sync::Arc;

use discord::error::codes;
use discord::types::Message;
use discord::Permissions;

use crate::moderation::permission::PermissionOracle;
use crate::platform::Platform;

/// What enforcement actually did for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementOutcome {
    pub attempted: bool,
    pub deleted: bool,
}

impl EnforcementOutcome {
    pub const SKIPPED: EnforcementOutcome = EnforcementOutcome {
        attempted: false,
        deleted: false,
    };
}

pub struct EnforcementExecutor {
    platform: Arc<dyn Platform>,
}

impl EnforcementExecutor {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    /// Attempt to delete the message, at most once.
    pub async fn enforce(
        &self,
        message: &Message,
        self_user_id: &str,
        oracle: &PermissionOracle,
    ) -> EnforcementOutcome {
        if !self.is_deletable(message, self_user_id, oracle).await {
            tracing::warn!(
                message_id = %message.id,
                "message is not deletable, may lack permissions or already be gone"
            );
            return EnforcementOutcome::SKIPPED;
        }

        match self
            .platform
            .delete_message(&message.channel_id, &message.id)
            .await
        {
            Ok(()) => {
                tracing::info!(message_id = %message.id, "deleted message containing restricted stickers");
                EnforcementOutcome {
                    attempted: true,
                    deleted: true,
                }
            }
            Err(err) if err.is_code(codes::UNKNOWN_MESSAGE) => {
                // Already gone: a redelivered event or another moderator.
                tracing::debug!(message_id = %message.id, "message already deleted");
                EnforcementOutcome::SKIPPED
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    code = ?err.code(),
                    message_id = %message.id,
                    "failed to delete message"
                );
                EnforcementOutcome {
                    attempted: true,
                    deleted: false,
                }
            }
        }
    }

    /// A message is deletable when the bot authored it or holds
    /// `MANAGE_MESSAGES` in the guild. Indeterminate permission state counts
    /// as not deletable.
    async fn is_deletable(
        &self,
        message: &Message,
        self_user_id: &str,
        oracle: &PermissionOracle,
    ) -> bool {
        if message
            .author
            .as_ref()
            .map(|author| author.id == self_user_id)
            .unwrap_or(false)
        {
            return true;
        }
        let Some(guild_id) = message.guild_id.as_deref() else {
            return false;
        };
        oracle
            .user_has_permission(guild_id, self_user_id, Permissions::MANAGE_MESSAGES)
            .await
            .unwrap_or(false)
    }
}
