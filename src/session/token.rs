//! Self-describing affinity tokens.
//!
//! Wire format: `base64(session_id + "@" + target_base_url)`. Tokens are
//! written without padding; decoding accepts either form.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a cookie value could not be turned into a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("cookie value is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cookie payload is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("cookie payload has no `@` separator")]
    MissingSeparator,

    #[error("cookie payload has an empty session id or target")]
    EmptyPart,

    #[error("cookie target is not a URL: {0}")]
    InvalidTarget(#[from] url::ParseError),
}

/// Affinity record carried in the client's cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyToken {
    pub session_id: String,
    pub target: Url,
}

impl StickyToken {
    /// Mint a token with a fresh session id.
    pub fn issue(target: Url) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            target,
        }
    }

    pub fn encode(&self) -> String {
        let target = self.target.as_str().trim_end_matches('/');
        TOKEN_ENGINE.encode(format!("{}@{}", self.session_id, target))
    }

    /// Parse a cookie value. Splits on the first `@`.
    pub fn decode(value: &str) -> Result<Self, TokenError> {
        let bytes = TOKEN_ENGINE.decode(value.trim())?;
        let payload = String::from_utf8(bytes)?;
        let (session_id, target) = payload.split_once('@').ok_or(TokenError::MissingSeparator)?;
        if session_id.is_empty() || target.is_empty() {
            return Err(TokenError::EmptyPart);
        }
        Ok(Self {
            session_id: session_id.to_string(),
            target: Url::parse(target)?,
        })
    }
}
