//! Platform dependencies for the moderation pipeline (traits for testability)
//!
//! The pipeline never talks to the REST client directly; it goes through the
//! [`Platform`] trait so tests can substitute scripted implementations for
//! every call the platform exposes.

use std::sync::Arc;

use async_trait::async_trait;
use discord::card::CreateMessage;
use discord::types::{Channel, Member, Role, Sticker};
use discord::{Client, DiscordError};

/// The platform surface the moderation pipeline runs against.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn fetch_sticker(&self, sticker_id: &str) -> Result<Sticker, DiscordError>;
    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member, DiscordError>;
    async fn fetch_guild_roles(&self, guild_id: &str) -> Result<Vec<Role>, DiscordError>;
    async fn delete_message(&self, channel_id: &str, message_id: &str)
        -> Result<(), DiscordError>;
    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, DiscordError>;
    async fn join_thread(&self, channel_id: &str) -> Result<(), DiscordError>;
    async fn create_message(
        &self,
        channel_id: &str,
        payload: &CreateMessage,
    ) -> Result<(), DiscordError>;
}

/// Adapter wrapping the REST client in the [`Platform`] trait.
pub struct DiscordPlatform(Arc<Client>);

impl DiscordPlatform {
    pub fn new(client: Arc<Client>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    async fn fetch_sticker(&self, sticker_id: &str) -> Result<Sticker, DiscordError> {
        self.0.fetch_sticker(sticker_id).await
    }

    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member, DiscordError> {
        self.0.fetch_member(guild_id, user_id).await
    }

    async fn fetch_guild_roles(&self, guild_id: &str) -> Result<Vec<Role>, DiscordError> {
        self.0.fetch_guild_roles(guild_id).await
    }

    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), DiscordError> {
        self.0.delete_message(channel_id, message_id).await
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, DiscordError> {
        self.0.fetch_channel(channel_id).await
    }

    async fn join_thread(&self, channel_id: &str) -> Result<(), DiscordError> {
        self.0.join_thread(channel_id).await
    }

    async fn create_message(
        &self,
        channel_id: &str,
        payload: &CreateMessage,
    ) -> Result<(), DiscordError> {
        self.0.create_message(channel_id, payload).await
    }
}
