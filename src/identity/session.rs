//! In-memory bearer sessions.
//!
//! Only the SHA-256 of each token is kept. Sessions have no expiry; they
//! end on logout or process restart.

use std::collections::HashMap;

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::models::User;

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<[u8; 32], User>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `user` and return the bearer token.
    pub fn issue(&mut self, user: User) -> String {
        let token = generate_token();
        self.sessions.insert(hash_token(&token), user);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<&User> {
        self.sessions.get(&hash_token(token))
    }

    /// Forget a token. Returns whether it was live.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    /// Refresh the cached projection after a profile edit.
    pub fn refresh_user(&mut self, user: &User) {
        for cached in self.sessions.values_mut() {
            if cached.id_usuario == user.id_usuario {
                *cached = user.clone();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
