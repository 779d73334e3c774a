//! Typed extraction of sticker references from forwarded snapshots.

use discord::types::Message;

/// Sticker ids referenced by the first forwarded snapshot of `message`,
/// deduplicated in first-seen order. Empty when the message carries no
/// snapshot, so callers can use this as the "is there anything to moderate"
/// gate. Newer payloads carry `sticker_items`; older ones embed full
/// `stickers` objects.
pub fn forwarded_sticker_ids(message: &Message) -> Vec<String> {
    let Some(snapshot) = message
        .message_snapshots
        .as_ref()
        .and_then(|snapshots| snapshots.first())
    else {
        return Vec::new();
    };

    let ids: Vec<String> = if let Some(items) = &snapshot.message.sticker_items {
        items.iter().map(|item| item.id.clone()).collect()
    } else if let Some(stickers) = &snapshot.message.stickers {
        stickers.iter().map(|sticker| sticker.id.clone()).collect()
    } else {
        Vec::new()
    };

    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !id.is_empty() && !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
