//! Service configuration
//!
//! Everything comes from the environment, matching how the deployment images
//! are wired. With no `LETTERS_API_KEYS` set the API runs open, which is the
//! local development mode.

use std::collections::HashMap;

use letters_core::UserRole;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub listen_addr: String,
    /// API key -> role of the caller it authenticates
    pub api_keys: HashMap<String, UserRole>,
    /// Per-key request budget per minute, sized for the polling clients
    pub rate_per_minute: u32,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let listen_addr =
            std::env::var("LETTERS_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
        let api_keys = std::env::var("LETTERS_API_KEYS")
            .map(|raw| parse_api_keys(&raw))
            .unwrap_or_default();
        let rate_per_minute = std::env::var("LETTERS_RATE_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);
        Self { listen_addr, api_keys, rate_per_minute }
    }

    /// Open configuration: no keys, generous rate budget. Used by tests.
    pub fn open() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".into(),
            api_keys: HashMap::new(),
            rate_per_minute: 6000,
        }
    }
}

/// Parse `key:role,key:role`; a bare `key` defaults to the staff role
fn parse_api_keys(raw: &str) -> HashMap<String, UserRole> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (key, role) = match entry.split_once(':') {
                Some((key, role)) => (key, role_from_name(role)),
                None => (entry, UserRole::Staff),
            };
            Some((key.to_string(), role))
        })
        .collect()
}

fn role_from_name(name: &str) -> UserRole {
    match name.trim() {
        "admin" => UserRole::Admin,
        "applicant" => UserRole::Applicant,
        _ => UserRole::Staff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_keys() {
        let keys = parse_api_keys("alpha:admin, beta ,gamma:applicant,");
        assert_eq!(keys.get("alpha"), Some(&UserRole::Admin));
        assert_eq!(keys.get("beta"), Some(&UserRole::Staff));
        assert_eq!(keys.get("gamma"), Some(&UserRole::Applicant));
        assert_eq!(keys.len(), 3);
    }
}
