//! One-time codes for email verification. Codes live in process memory
//! with a short expiry; a restart simply forces a re-request.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;

const CODE_TTL_MINUTES: i64 = 10;

pub struct OtpStore {
    codes: DashMap<String, (String, DateTime<Utc>)>,
    ttl: Duration,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new(Duration::minutes(CODE_TTL_MINUTES))
    }
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: DashMap::new(),
            ttl,
        }
    }

    /// Generates a fresh six-digit code for the address, replacing any
    /// outstanding one.
    pub fn issue(&self, email: &str) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.codes
            .insert(email.to_lowercase(), (code.clone(), Utc::now() + self.ttl));
        code
    }

    /// Consumes the code on success. Expired or mismatched codes leave the
    /// stored entry untouched so the user can retry.
    pub fn verify(&self, email: &str, code: &str) -> bool {
        let key = email.to_lowercase();
        let matched = self
            .codes
            .get(&key)
            .map(|entry| {
                let (stored, expires) = entry.value();
                stored == code && Utc::now() <= *expires
            })
            .unwrap_or(false);
        if matched {
            self.codes.remove(&key);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_verifies_once() {
        let store = OtpStore::default();
        let code = store.issue("ada@example.edu");
        assert!(store.verify("Ada@Example.edu", &code));
        assert!(!store.verify("ada@example.edu", &code));
    }

    #[test]
    fn wrong_code_is_rejected_without_consuming() {
        let store = OtpStore::default();
        let code = store.issue("ada@example.edu");
        assert!(!store.verify("ada@example.edu", "000000x"));
        assert!(store.verify("ada@example.edu", &code));
    }

    #[test]
    fn expired_code_is_rejected() {
        let store = OtpStore::new(Duration::minutes(-1));
        let code = store.issue("ada@example.edu");
        assert!(!store.verify("ada@example.edu", &code));
    }
}
