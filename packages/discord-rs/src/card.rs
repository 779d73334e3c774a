//! Components-v2 message payloads.
//!
//! Structured "card" messages are a tree of typed components: a container
//! holding text displays, separators, and sections (text plus an optional
//! thumbnail accessory). The numeric `type` discriminators and the
//! components-v2 message flag follow the platform API.

use serde::Serialize;

/// Message flag marking the payload as components-v2.
pub const MESSAGE_FLAG_IS_COMPONENTS_V2: u64 = 1 << 15;

const COMPONENT_TYPE_SECTION: u8 = 9;
const COMPONENT_TYPE_TEXT_DISPLAY: u8 = 10;
const COMPONENT_TYPE_THUMBNAIL: u8 = 11;
const COMPONENT_TYPE_SEPARATOR: u8 = 14;
const COMPONENT_TYPE_CONTAINER: u8 = 17;

const SEPARATOR_SPACING_SMALL: u8 = 1;

/// Body for `POST /channels/{id}/messages` carrying a single card.
#[derive(Debug, Serialize)]
pub struct CreateMessage {
    pub flags: u64,
    pub components: Vec<Container>,
}

impl CreateMessage {
    pub fn card(container: Container) -> Self {
        Self {
            flags: MESSAGE_FLAG_IS_COMPONENTS_V2,
            components: vec![container],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Container {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    accent_color: Option<u32>,
    components: Vec<ContainerChild>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            kind: COMPONENT_TYPE_CONTAINER,
            accent_color: None,
            components: Vec::new(),
        }
    }

    pub fn accent_color(mut self, color: u32) -> Self {
        self.accent_color = Some(color);
        self
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.components
            .push(ContainerChild::Text(TextDisplay::new(content)));
        self
    }

    /// Small divider separator.
    pub fn divider(mut self) -> Self {
        self.components.push(ContainerChild::Separator(Separator {
            kind: COMPONENT_TYPE_SEPARATOR,
            divider: true,
            spacing: SEPARATOR_SPACING_SMALL,
        }));
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.components.push(ContainerChild::Section(section));
        self
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContainerChild {
    Text(TextDisplay),
    Separator(Separator),
    Section(Section),
}

#[derive(Debug, Serialize)]
pub struct TextDisplay {
    #[serde(rename = "type")]
    kind: u8,
    content: String,
}

impl TextDisplay {
    fn new(content: impl Into<String>) -> Self {
        Self {
            kind: COMPONENT_TYPE_TEXT_DISPLAY,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Separator {
    #[serde(rename = "type")]
    kind: u8,
    divider: bool,
    spacing: u8,
}

/// Text block with an optional thumbnail accessory.
#[derive(Debug, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<TextDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accessory: Option<Thumbnail>,
}

impl Section {
    pub fn new() -> Self {
        Self {
            kind: COMPONENT_TYPE_SECTION,
            components: Vec::new(),
            accessory: None,
        }
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.components.push(TextDisplay::new(content));
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>, description: impl Into<String>) -> Self {
        self.accessory = Some(Thumbnail {
            kind: COMPONENT_TYPE_THUMBNAIL,
            media: UnfurledMedia { url: url.into() },
            description: Some(description.into()),
        });
        self
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct Thumbnail {
    #[serde(rename = "type")]
    kind: u8,
    media: UnfurledMedia,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct UnfurledMedia {
    url: String,
}
