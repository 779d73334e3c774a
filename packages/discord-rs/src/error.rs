//! Error types for the Discord client.
//!
//! REST failures are split into transport errors (`Http`) and API rejections
//! (`Api`), which carry the HTTP status and the JSON error code the platform
//! returns in the response body. Callers that need to react to a specific
//! rejection (deleted sticker, missing permission) match on the code.

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordError>;

/// JSON error codes returned in Discord API error bodies.
pub mod codes {
    pub const UNKNOWN_CHANNEL: u32 = 10003;
    pub const UNKNOWN_MEMBER: u32 = 10007;
    pub const UNKNOWN_MESSAGE: u32 = 10008;
    pub const UNKNOWN_STICKER: u32 = 10060;
    pub const MISSING_PERMISSIONS: u32 = 50013;
    pub const INVALID_FORM_BODY: u32 = 50035;
}

#[derive(Debug, Error)]
pub enum DiscordError {
    /// Transport-level failure before a response body was available.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the REST API.
    #[error("api error (status {status}, code {code:?}): {message}")]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
    },

    /// Gateway connection or protocol failure.
    #[error("gateway error: {0}")]
    Gateway(String),
}

impl DiscordError {
    /// The platform JSON error code, when the API returned one.
    pub fn code(&self) -> Option<u32> {
        match self {
            DiscordError::Api { code, .. } => *code,
            _ => None,
        }
    }

    /// True if this is an API rejection with the given JSON error code.
    pub fn is_code(&self, expected: u32) -> bool {
        self.code() == Some(expected)
    }
}

/// Shape of the JSON body Discord returns on API errors.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: Option<u32>,
    pub message: Option<String>,
}
