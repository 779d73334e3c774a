//! REST client for the Discord HTTP API.
//!
//! Thin `reqwest` wrapper over the handful of endpoints the bot consumes.
//! Non-success responses are decoded into [`DiscordError::Api`] carrying the
//! HTTP status and the JSON error code from the response body.

use crate::card::CreateMessage;
use crate::error::{ApiErrorBody, DiscordError, Result};
use crate::types::{Channel, Member, Role, Sticker};

const API_BASE_URL: &str = "https://discord.com/api/v10";

pub struct Client {
    http: reqwest::Client,
    token: String,
}

impl Client {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Convert a non-success response into an `Api` error with the decoded
    /// JSON error body.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or(ApiErrorBody {
            code: None,
            message: None,
        });
        Err(DiscordError::Api {
            status: status.as_u16(),
            code: parsed.code,
            message: parsed.message.unwrap_or(body),
        })
    }

    pub async fn fetch_sticker(&self, sticker_id: &str) -> Result<Sticker> {
        let url = format!("{API_BASE_URL}/stickers/{sticker_id}");
        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member> {
        let url = format!("{API_BASE_URL}/guilds/{guild_id}/members/{user_id}");
        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn fetch_guild_roles(&self, guild_id: &str) -> Result<Vec<Role>> {
        let url = format!("{API_BASE_URL}/guilds/{guild_id}/roles");
        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn fetch_channel(&self, channel_id: &str) -> Result<Channel> {
        let url = format!("{API_BASE_URL}/channels/{channel_id}");
        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Join a thread channel as the current user.
    pub async fn join_thread(&self, channel_id: &str) -> Result<()> {
        let url = format!("{API_BASE_URL}/channels/{channel_id}/thread-members/@me");
        let resp = self
            .http
            .put(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        tracing::debug!(channel_id, message_id, "deleting message");
        let url = format!("{API_BASE_URL}/channels/{channel_id}/messages/{message_id}");
        let resp = self
            .http
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Post a structured card message to a channel.
    pub async fn create_message(&self, channel_id: &str, payload: &CreateMessage) -> Result<()> {
        let url = format!("{API_BASE_URL}/channels/{channel_id}/messages");
        let resp = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(payload)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
