//! Policy decision engine.
//!
//! [`decide`] is a pure function over the settled resolution outcomes: no
//! I/O, total for every input shape, and deterministic, so callers and tests
//! can evaluate it repeatedly without side effects.

use discord::error::codes;

use crate::moderation::resolver::{ResolutionFailure, ResolvedSticker};

/// Why a message violates the sticker policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// A resolved sticker is owned by a different guild.
    ForeignGuildSticker,
    /// The platform reported a referenced sticker as unknown or deleted.
    UnknownSticker,
    /// Nothing resolved and at least one lookup failed, so a foreign origin
    /// cannot be ruled out.
    UnverifiedOrigin,
}

impl Reason {
    pub fn label(self) -> &'static str {
        match self {
            Reason::ForeignGuildSticker => "External server sticker",
            Reason::UnknownSticker => "Unknown/deleted sticker",
            Reason::UnverifiedOrigin => "Unverified origin",
        }
    }
}

/// Shown when a verdict carries no specific reason.
const FALLBACK_REASON: &str = "Sticker policy violation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyVerdict {
    pub violates: bool,
    pub reasons: Vec<Reason>,
    pub human_reason: String,
}

/// Decide whether a resolved sticker set violates the no-foreign-sticker
/// policy.
pub fn decide(
    resolved: &[ResolvedSticker],
    failed: &[ResolutionFailure],
    self_guild_id: &str,
) -> PolicyVerdict {
    let mut reasons = Vec::new();

    if resolved
        .iter()
        .any(|sticker| sticker.is_foreign_to(self_guild_id))
    {
        reasons.push(Reason::ForeignGuildSticker);
    }
    if failed
        .iter()
        .any(|failure| failure.code == Some(codes::UNKNOWN_STICKER))
    {
        reasons.push(Reason::UnknownSticker);
    }
    if resolved.is_empty() && !failed.is_empty() {
        reasons.push(Reason::UnverifiedOrigin);
    }

    let human_reason = if reasons.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        reasons
            .iter()
            .map(|reason| reason.label())
            .collect::<Vec<_>>()
            .join(" • ")
    };

    PolicyVerdict {
        violates: !reasons.is_empty(),
        reasons,
        human_reason,
    }
}
