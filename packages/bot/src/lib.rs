// Sticker moderation bot - core
//
// Watches forwarded messages for stickers that originate outside the current
// guild and enforces the no-foreign-sticker policy: offending messages are
// deleted (unless the author may use external stickers) and every enforcement
// action is logged as a structured card in a designated channel.

pub mod config;
pub mod moderation;
pub mod platform;

pub use config::*;
