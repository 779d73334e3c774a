//! Permission oracle.
//!
//! Answers "may this author post foreign-origin stickers?" from the member's
//! role set. The member record is fetched lazily (forwarded messages usually
//! arrive without it) and role lists are cached per guild. Whenever a
//! definitive answer cannot be produced (missing context, fetch failure,
//! unparseable role bitset) the verdict is `checked: false` and callers must
//! treat the author as not allowed.

use std::collections::HashMap;
use std::sync::Arc;

use discord::types::{Message, Role};
use discord::{DiscordError, Permissions};
use tokio::sync::RwLock;

use crate::platform::Platform;

/// Outcome of a bypass-permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionVerdict {
    pub allowed: bool,
    pub checked: bool,
}

impl PermissionVerdict {
    /// No definitive answer was available; treated as not allowed.
    pub const UNCHECKED: PermissionVerdict = PermissionVerdict {
        allowed: false,
        checked: false,
    };
}

/// Effective permission bitset for a member: OR of the `@everyone` role (the
/// role sharing the guild's id) and every role the member holds. `None` when
/// any applicable role carries an unparseable bitset.
fn permissions_from_roles(
    guild_id: &str,
    member_roles: &[String],
    roles: &[Role],
) -> Option<Permissions> {
    let mut perms = Permissions::empty();
    for role in roles {
        if role.id != guild_id && !member_roles.contains(&role.id) {
            continue;
        }
        perms = perms.union(Permissions::parse(&role.permissions)?);
    }
    Some(perms)
}

pub struct PermissionOracle {
    platform: Arc<dyn Platform>,
    roles: RwLock<HashMap<String, Arc<Vec<Role>>>>,
}

impl PermissionOracle {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            roles: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the message author may post foreign-origin stickers.
    pub async fn check(&self, message: &Message) -> PermissionVerdict {
        let (Some(guild_id), Some(author)) =
            (message.guild_id.as_deref(), message.author.as_ref())
        else {
            tracing::warn!("cannot check permissions without guild and author");
            return PermissionVerdict::UNCHECKED;
        };

        // Forwarded messages usually arrive without the member record.
        let member_roles = match &message.member {
            Some(member) => member.roles.clone(),
            None => {
                tracing::debug!(user_id = %author.id, "fetching member for permission check");
                match self.platform.fetch_member(guild_id, &author.id).await {
                    Ok(member) => member.roles,
                    Err(err) => {
                        tracing::warn!(error = %err, user_id = %author.id, "unable to fetch member");
                        return PermissionVerdict::UNCHECKED;
                    }
                }
            }
        };

        match self
            .effective_permissions(guild_id, &member_roles)
            .await
        {
            Some(perms) => PermissionVerdict {
                allowed: perms.contains(Permissions::USE_EXTERNAL_STICKERS),
                checked: true,
            },
            None => PermissionVerdict::UNCHECKED,
        }
    }

    /// Guild-level permission check for an arbitrary user. `None` when no
    /// definitive answer could be produced.
    pub async fn user_has_permission(
        &self,
        guild_id: &str,
        user_id: &str,
        flag: Permissions,
    ) -> Option<bool> {
        let member = match self.platform.fetch_member(guild_id, user_id).await {
            Ok(member) => member,
            Err(err) => {
                tracing::warn!(error = %err, user_id, "unable to fetch member");
                return None;
            }
        };
        self.effective_permissions(guild_id, &member.roles)
            .await
            .map(|perms| perms.contains(flag))
    }

    async fn effective_permissions(
        &self,
        guild_id: &str,
        member_roles: &[String],
    ) -> Option<Permissions> {
        let roles = match self.guild_roles(guild_id).await {
            Ok(roles) => roles,
            Err(err) => {
                tracing::warn!(error = %err, guild_id, "unable to fetch guild roles");
                return None;
            }
        };
        let perms = permissions_from_roles(guild_id, member_roles, &roles);
        if perms.is_none() {
            tracing::warn!(guild_id, "role carried an unparseable permission bitset");
        }
        perms
    }

    async fn guild_roles(&self, guild_id: &str) -> Result<Arc<Vec<Role>>, DiscordError> {
        if let Some(roles) = self.roles.read().await.get(guild_id) {
            return Ok(roles.clone());
        }
        let fetched = Arc::new(self.platform.fetch_guild_roles(guild_id).await?);
        self.roles
            .write()
            .await
            .insert(guild_id.to_string(), fetched.clone());
        Ok(fetched)
    }
}
