//! Integration tests for the moderation pipeline against a scripted platform.
//!
//! Every platform call the pipeline makes goes through the `Platform` trait,
//! so these tests swap in a mock that scripts sticker lookups, member and
//! role data, deletion behavior, and the audit channel, then assert on the
//! side effects the pipeline actually produced.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bot_core::moderation::ModerationPipeline;
use bot_core::platform::Platform;
use bot_core::Config;
use discord::card::CreateMessage;
use discord::error::codes;
use discord::types::{
    Channel, Member, Message, MessageSnapshot, Role, SnapshotContent, Sticker, StickerItem, User,
    CHANNEL_TYPE_GUILD_TEXT, STICKER_TYPE_GUILD, STICKER_TYPE_STANDARD,
};
use discord::{DiscordError, Permissions};

const GUILD: &str = "100";
const CHANNEL: &str = "200";
const MESSAGE: &str = "300";
const AUTHOR: &str = "400";
const BOT_USER: &str = "500";
const LOG_CHANNEL: &str = "900";

// =============================================================================
// Scripted platform mock
// =============================================================================

#[derive(Default)]
struct MockPlatform {
    /// Scripted sticker lookups; ids not present fail as unknown stickers.
    stickers: HashMap<String, Sticker>,
    /// Role ids per user; users not present fail as unknown members.
    member_roles: HashMap<String, Vec<String>>,
    roles: Vec<Role>,
    delete_error_code: Option<u32>,
    log_channel: Option<Channel>,
    send_fails: bool,

    sticker_fetches: Mutex<usize>,
    deleted: Mutex<Vec<String>>,
    sent_cards: Mutex<Vec<serde_json::Value>>,
}

fn api_error(status: u16, code: u32, message: &str) -> DiscordError {
    DiscordError::Api {
        status,
        code: Some(code),
        message: message.to_string(),
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn fetch_sticker(&self, sticker_id: &str) -> Result<Sticker, DiscordError> {
        *self.sticker_fetches.lock().unwrap() += 1;
        self.stickers
            .get(sticker_id)
            .cloned()
            .ok_or_else(|| api_error(404, codes::UNKNOWN_STICKER, "Unknown Sticker"))
    }

    async fn fetch_member(&self, _guild_id: &str, user_id: &str) -> Result<Member, DiscordError> {
        self.member_roles
            .get(user_id)
            .map(|roles| Member {
                user: None,
                roles: roles.clone(),
            })
            .ok_or_else(|| api_error(404, codes::UNKNOWN_MEMBER, "Unknown Member"))
    }

    async fn fetch_guild_roles(&self, _guild_id: &str) -> Result<Vec<Role>, DiscordError> {
        Ok(self.roles.clone())
    }

    async fn delete_message(
        &self,
        _channel_id: &str,
        message_id: &str,
    ) -> Result<(), DiscordError> {
        if let Some(code) = self.delete_error_code {
            return Err(api_error(403, code, "delete rejected"));
        }
        self.deleted.lock().unwrap().push(message_id.to_string());
        Ok(())
    }

    async fn fetch_channel(&self, _channel_id: &str) -> Result<Channel, DiscordError> {
        self.log_channel
            .clone()
            .ok_or_else(|| api_error(404, codes::UNKNOWN_CHANNEL, "Unknown Channel"))
    }

    async fn join_thread(&self, _channel_id: &str) -> Result<(), DiscordError> {
        Ok(())
    }

    async fn create_message(
        &self,
        _channel_id: &str,
        payload: &CreateMessage,
    ) -> Result<(), DiscordError> {
        if self.send_fails {
            return Err(api_error(403, codes::MISSING_PERMISSIONS, "Missing Permissions"));
        }
        self.sent_cards
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload).unwrap());
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn guild_sticker(id: &str, guild_id: &str) -> Sticker {
    Sticker {
        id: id.to_string(),
        name: format!("sticker-{id}"),
        kind: STICKER_TYPE_GUILD,
        format_type: Some(1),
        guild_id: Some(guild_id.to_string()),
    }
}

fn standard_sticker(id: &str) -> Sticker {
    Sticker {
        id: id.to_string(),
        name: format!("sticker-{id}"),
        kind: STICKER_TYPE_STANDARD,
        format_type: Some(1),
        guild_id: None,
    }
}

fn forwarded_message(sticker_ids: &[&str]) -> Message {
    let items = sticker_ids
        .iter()
        .map(|id| StickerItem {
            id: id.to_string(),
            name: format!("sticker-{id}"),
            format_type: Some(1),
        })
        .collect();
    Message {
        id: MESSAGE.to_string(),
        channel_id: CHANNEL.to_string(),
        guild_id: Some(GUILD.to_string()),
        author: Some(User {
            id: AUTHOR.to_string(),
            username: "forwarder".to_string(),
            discriminator: Some("0".to_string()),
            ..Default::default()
        }),
        message_snapshots: Some(vec![MessageSnapshot {
            message: SnapshotContent {
                sticker_items: Some(items),
                stickers: None,
            },
        }]),
        ..Default::default()
    }
}

/// Author without bypass permission, bot able to manage messages, working
/// log channel.
fn base_mock() -> MockPlatform {
    let mut mock = MockPlatform {
        roles: vec![
            Role {
                id: GUILD.to_string(),
                permissions: "0".to_string(),
            },
            Role {
                id: "curators".to_string(),
                permissions: Permissions::USE_EXTERNAL_STICKERS.0.to_string(),
            },
            Role {
                id: "janitors".to_string(),
                permissions: Permissions::MANAGE_MESSAGES.0.to_string(),
            },
        ],
        log_channel: Some(Channel {
            id: LOG_CHANNEL.to_string(),
            kind: CHANNEL_TYPE_GUILD_TEXT,
            name: Some("mod-log".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    mock.member_roles.insert(AUTHOR.to_string(), vec![]);
    mock.member_roles
        .insert(BOT_USER.to_string(), vec!["janitors".to_string()]);
    mock
}

fn build_pipeline(mock: Arc<MockPlatform>) -> ModerationPipeline {
    let platform: Arc<dyn Platform> = mock;
    let config = Config {
        bot_token: "token".to_string(),
        log_channel_id: LOG_CHANNEL.to_string(),
        alert_mention: None,
    };
    ModerationPipeline::new(platform, &config, BOT_USER.to_string())
}

fn sent_card_text(mock: &MockPlatform) -> String {
    let cards = mock.sent_cards.lock().unwrap();
    assert_eq!(cards.len(), 1, "expected exactly one audit card");
    cards[0].to_string()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn foreign_sticker_is_deleted_and_audited() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert_eq!(*mock.deleted.lock().unwrap(), vec![MESSAGE.to_string()]);
    let card = sent_card_text(&mock);
    assert!(card.contains("External server sticker"));
    assert!(card.contains("✓ Message deleted"));
    assert!(card.contains("No external sticker access"));
    assert!(card.contains("other-guild"));
}

#[tokio::test]
async fn own_guild_and_standard_stickers_pass() {
    let mut mock = base_mock();
    mock.stickers.insert("10".to_string(), standard_sticker("10"));
    mock.stickers
        .insert("11".to_string(), guild_sticker("11", GUILD));
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10", "11"])).await;

    assert!(mock.deleted.lock().unwrap().is_empty());
    assert!(mock.sent_cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_sticker_enforces_without_metadata() {
    // The sticker map is empty, so the lookup fails as unknown/deleted.
    let mock = Arc::new(base_mock());
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert_eq!(*mock.deleted.lock().unwrap(), vec![MESSAGE.to_string()]);
    let card = sent_card_text(&mock);
    assert!(card.contains("Unknown/deleted sticker"));
    assert!(card.contains("Unverified origin"));
    assert!(card.contains("Metadata unavailable"));
}

#[tokio::test]
async fn bypass_permission_suppresses_enforcement_and_audit() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    mock.member_roles
        .insert(AUTHOR.to_string(), vec!["curators".to_string()]);
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert!(mock.deleted.lock().unwrap().is_empty());
    assert!(mock.sent_cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_deletion_is_still_audited() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    mock.delete_error_code = Some(codes::MISSING_PERMISSIONS);
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert!(mock.deleted.lock().unwrap().is_empty());
    let card = sent_card_text(&mock);
    assert!(card.contains("✗ Message deletion failed"));
}

#[tokio::test]
async fn unverifiable_permission_fails_closed() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    // The author has no member record at all, so the permission check cannot
    // produce a definitive answer.
    mock.member_roles.remove(AUTHOR);
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert_eq!(*mock.deleted.lock().unwrap(), vec![MESSAGE.to_string()]);
    let card = sent_card_text(&mock);
    // Unverified permission state is omitted from the card entirely.
    assert!(!card.contains("sticker access"));
}

#[tokio::test]
async fn messages_outside_policy_scope_are_untouched() {
    let mock = Arc::new(base_mock());
    let pipeline = build_pipeline(mock.clone());

    // No snapshot at all.
    let plain = Message {
        id: MESSAGE.to_string(),
        channel_id: CHANNEL.to_string(),
        guild_id: Some(GUILD.to_string()),
        ..Default::default()
    };
    pipeline.handle_message(&plain).await;

    // Snapshot with an empty sticker list.
    pipeline.handle_message(&forwarded_message(&[])).await;

    // No guild context.
    let mut dm = forwarded_message(&["10"]);
    dm.guild_id = None;
    pipeline.handle_message(&dm).await;

    assert_eq!(*mock.sticker_fetches.lock().unwrap(), 0);
    assert!(mock.deleted.lock().unwrap().is_empty());
    assert!(mock.sent_cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn audit_send_failure_is_swallowed() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    mock.send_fails = true;
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    // Must return normally; enforcement already happened.
    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert_eq!(*mock.deleted.lock().unwrap(), vec![MESSAGE.to_string()]);
    assert!(mock.sent_cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_log_channel_is_swallowed() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    mock.log_channel = None;
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert_eq!(*mock.deleted.lock().unwrap(), vec![MESSAGE.to_string()]);
    assert!(mock.sent_cards.lock().unwrap().is_empty());
}

#[tokio::test]
async fn message_payload_stickers_short_circuit_fetching() {
    let mock = Arc::new(base_mock());
    let pipeline = build_pipeline(mock.clone());

    // The full sticker object rides along on the outer message, so no REST
    // lookup is needed even though the mock would fail it.
    let mut message = forwarded_message(&["10"]);
    message.stickers = Some(vec![guild_sticker("10", "other-guild")]);
    pipeline.handle_message(&message).await;

    assert_eq!(*mock.sticker_fetches.lock().unwrap(), 0);
    assert_eq!(*mock.deleted.lock().unwrap(), vec![MESSAGE.to_string()]);
}

#[tokio::test]
async fn resolved_stickers_are_cached_across_runs() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;
    pipeline.handle_message(&forwarded_message(&["10"])).await;

    // Second run hits the cache; a redelivered event still produces a
    // second audit record.
    assert_eq!(*mock.sticker_fetches.lock().unwrap(), 1);
    assert_eq!(mock.sent_cards.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_delete_capability_skips_deletion_but_audits() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    // The bot holds no roles, so it cannot manage messages.
    mock.member_roles.insert(BOT_USER.to_string(), vec![]);
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline.handle_message(&forwarded_message(&["10"])).await;

    assert!(mock.deleted.lock().unwrap().is_empty());
    let card = sent_card_text(&mock);
    assert!(card.contains("✗ Message deletion failed"));
}

#[tokio::test]
async fn duplicate_sticker_references_resolve_once() {
    let mut mock = base_mock();
    mock.stickers
        .insert("10".to_string(), guild_sticker("10", "other-guild"));
    let mock = Arc::new(mock);
    let pipeline = build_pipeline(mock.clone());

    pipeline
        .handle_message(&forwarded_message(&["10", "10", "10"]))
        .await;

    assert_eq!(*mock.sticker_fetches.lock().unwrap(), 1);
    assert_eq!(mock.sent_cards.lock().unwrap().len(), 1);
}
