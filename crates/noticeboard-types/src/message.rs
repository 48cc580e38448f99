use crate::{TenantId, TypesError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of the external message identifier in hex characters
pub const MESSAGE_ID_LEN: usize = 32;

/// Externally visible message identifier
///
/// Generated once at creation as the MD5 digest of a fresh v4 UUID, rendered as
/// 32 lowercase hex characters. It is an opaque handle, not a security token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId(String);

impl MessageId {
    /// Generate a new random identifier
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        let digest = md5::compute(uuid.to_string().as_bytes());
        Self(format!("{:x}", digest))
    }

    pub fn parse(id: impl Into<String>) -> Result<Self, TypesError> {
        let id = id.into();
        let well_formed = id.len() == MESSAGE_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Self(id))
        } else {
            Err(TypesError::InvalidMessageId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-message read state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
    Archived,
}

impl MessageStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Unread => 0,
            Self::Read => 1,
            Self::Archived => 2,
        }
    }
}

impl TryFrom<i64> for MessageStatus {
    type Error = TypesError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unread),
            1 => Ok(Self::Read),
            2 => Ok(Self::Archived),
            other => Err(TypesError::InvalidStatus(other)),
        }
    }
}

impl From<MessageStatus> for i64 {
    fn from(status: MessageStatus) -> Self {
        status.code()
    }
}

/// A message as returned to callers
///
/// The store's internal row id is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub sender_ids: Vec<TenantId>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub big_content: String,
    pub introducer_ids: Vec<TenantId>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_public(&self) -> bool {
        self.introducer_ids.is_empty()
    }
}
