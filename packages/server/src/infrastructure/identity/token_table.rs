//! Token table identity resolver.
//!
//! 不透明なトークンとユーザー情報の対応表を JSON ファイルから読み込む。
//!
//! ```json
//! {
//!   "tokens": {
//!     "alice-token": { "userId": 1, "displayName": "Alice", "isAdmin": true },
//!     "bob-token": { "userId": 2, "displayName": "Bob", "roomId": "main" }
//!   }
//! }
//! ```

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Identity, IdentityContext, IdentityResolver, RoomId, UserId};

#[derive(Debug, Error)]
pub enum TokenTableError {
    #[error("failed to read token table: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed token table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("token '{token}' has an invalid room id: {reason}")]
    InvalidRoomId { token: String, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    user_id: i64,
    display_name: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default)]
    tokens: HashMap<String, IdentityRecord>,
}

/// In-memory token -> identity table
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    identities: HashMap<String, Identity>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, TokenTableError> {
        let file: TokenFile = serde_json::from_str(json)?;

        let mut table = Self::new();
        for (token, record) in file.tokens {
            let room_id = record
                .room_id
                .map(RoomId::new)
                .transpose()
                .map_err(|e| TokenTableError::InvalidRoomId {
                    token: token.clone(),
                    reason: e.to_string(),
                })?;

            table.insert(
                token,
                Identity {
                    user_id: UserId::new(record.user_id),
                    display_name: record.display_name,
                    is_admin: record.is_admin,
                    room_id,
                },
            );
        }
        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenTableError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, token: impl Into<String>, identity: Identity) {
        self.identities.insert(token.into(), identity);
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for TokenTable {
    async fn resolve(&self, token: &str) -> IdentityContext {
        match self.identities.get(token) {
            Some(identity) => IdentityContext::Authenticated(identity.clone()),
            None => {
                tracing::debug!("Unknown token presented; treating connection as anonymous");
                IdentityContext::Anonymous
            }
        }
    }
}
