use std::sync::Arc;

use super::{entry::StoredValue, observers::SubscriptionId, storage::KeyValueStorage};

pub const TOKEN_KEY: &str = "accessToken";

/// Bearer token of the signed-in user, if any.
pub struct SessionStore {
    token: StoredValue<String>,
}

fn decode_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn encode_token(token: &String) -> String {
    token.clone()
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            token: StoredValue::new(TOKEN_KEY, storage, decode_token, encode_token),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn store_token(&self, token: impl Into<String>) {
        match decode_token(&token.into()) {
            Some(token) => self.token.set(token),
            None => self.token.clear(),
        }
    }

    pub fn clear(&self) {
        self.token.clear();
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.token
            .subscribe(move |token: &Option<String>| listener(token.as_deref()))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.token.unsubscribe(id)
    }
}
