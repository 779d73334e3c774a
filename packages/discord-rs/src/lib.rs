//! Minimal Discord REST and gateway client.
//!
//! Covers the slice of the platform API a moderation bot needs: fetching
//! stickers, members, roles, and channels; deleting messages; posting
//! components-v2 card messages; and a realtime gateway connection delivering
//! `MESSAGE_CREATE` events.
//!
//! # Example
//!
//! ```rust,ignore
//! use discord::{gateway::{Event, Gateway, INTENT_GUILDS, INTENT_GUILD_MESSAGES}, Client};
//!
//! let rest = Client::new(token.clone());
//! let (tx, mut rx) = tokio::sync::mpsc::channel(256);
//! tokio::spawn(Gateway::new(token, INTENT_GUILDS | INTENT_GUILD_MESSAGES).run(tx));
//!
//! while let Some(event) = rx.recv().await {
//!     if let Event::MessageCreate(message) = event {
//!         println!("message {} in {}", message.id, message.channel_id);
//!     }
//! }
//! ```

pub mod card;
pub mod error;
pub mod gateway;
pub mod permissions;
pub mod rest;
pub mod types;

pub use error::{DiscordError, Result};
pub use permissions::Permissions;
pub use rest::Client;
