use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;

pub const SCOPE_SUBMIT: &str = "csrf_submit";
pub const SCOPE_RENEW: &str = "csrf_renew";

const TOKEN_BYTES: usize = 32;

/// Server-side anti-forgery tokens, one live value per action scope.
///
/// A token stays valid until the scope is regenerated; validation is an
/// exact-match comparison against the stored value. There is no per-user
/// session layer, so the scope name is the whole key.
pub struct CsrfStore {
    tokens: Mutex<HashMap<&'static str, String>>,
}

impl CsrfStore {
    pub fn new() -> Self {
        CsrfStore {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Draws a fresh 64-hex-char token for the scope, replacing any
    /// previous one, and returns it for embedding in the client payload.
    pub fn generate(&self, scope: &'static str) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        self.tokens.lock().unwrap().insert(scope, token.clone());
        token
    }

    pub fn validate(&self, scope: &str, presented: &str) -> bool {
        match self.tokens.lock().unwrap().get(scope) {
            Some(stored) => stored == presented,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_validates_for_its_scope_only() {
        let store = CsrfStore::new();
        let token = store.generate(SCOPE_SUBMIT);
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(store.validate(SCOPE_SUBMIT, &token));
        assert!(!store.validate(SCOPE_RENEW, &token));
    }

    #[test]
    fn regeneration_replaces_the_stored_value() {
        let store = CsrfStore::new();
        let old = store.generate(SCOPE_RENEW);
        let new = store.generate(SCOPE_RENEW);
        assert_ne!(old, new);
        assert!(!store.validate(SCOPE_RENEW, &old));
        assert!(store.validate(SCOPE_RENEW, &new));
    }

    #[test]
    fn unknown_scope_never_validates() {
        let store = CsrfStore::new();
        assert!(!store.validate(SCOPE_SUBMIT, "deadbeef"));
    }
}
