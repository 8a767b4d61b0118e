//! API credentials sourced from the process environment
//!
//! All four values are required. They are validated once at startup and
//! every missing name is reported in a single error.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

pub const API_KEY: &str = "API_KEY";
pub const API_SECRET: &str = "API_SECRET";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ACCESS_SECRET: &str = "ACCESS_SECRET";

/// Environment variable names, in reporting order
pub const REQUIRED_VARS: [&str; 4] = [API_KEY, API_SECRET, ACCESS_TOKEN, ACCESS_SECRET];

/// OAuth 1.0a user-context credentials
///
/// Values are held in [`SecretString`] so they are zeroed on drop and never
/// show up in `Debug` output.
#[derive(Debug)]
pub struct Credentials {
    api_key: SecretString,
    api_secret: SecretString,
    access_token: SecretString,
    access_secret: SecretString,
}

impl Credentials {
    /// Read credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredentials` naming every variable that
    /// is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |name: &str| match lookup(name).filter(|value| !value.trim().is_empty()) {
            Some(value) => Some(SecretString::from(value)),
            None => {
                missing.push(name.to_string());
                None
            }
        };

        let api_key = read(API_KEY);
        let api_secret = read(API_SECRET);
        let access_token = read(ACCESS_TOKEN);
        let access_secret = read(ACCESS_SECRET);

        match (api_key, api_secret, access_token, access_secret) {
            (Some(api_key), Some(api_secret), Some(access_token), Some(access_secret)) => {
                Ok(Self {
                    api_key,
                    api_secret,
                    access_token,
                    access_secret,
                })
            }
            _ => Err(ConfigError::MissingCredentials(missing)),
        }
    }

    /// Name/value pairs to hand to a publishing subprocess
    pub fn env_pairs(&self) -> [(&'static str, &str); 4] {
        [
            (API_KEY, self.api_key.expose_secret()),
            (API_SECRET, self.api_secret.expose_secret()),
            (ACCESS_TOKEN, self.access_token.expose_secret()),
            (ACCESS_SECRET, self.access_secret.expose_secret()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_all_present() {
        let credentials = Credentials::from_lookup(lookup_from(&[
            ("API_KEY", "key"),
            ("API_SECRET", "secret"),
            ("ACCESS_TOKEN", "token"),
            ("ACCESS_SECRET", "token-secret"),
        ]))
        .unwrap();

        let pairs = credentials.env_pairs();
        assert_eq!(pairs[0], ("API_KEY", "key"));
        assert_eq!(pairs[3], ("ACCESS_SECRET", "token-secret"));
    }

    #[test]
    fn test_missing_names_aggregated() {
        let err = Credentials::from_lookup(lookup_from(&[
            ("API_KEY", "key"),
            ("ACCESS_SECRET", "token-secret"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::MissingCredentials(missing) => {
                assert_eq!(missing, vec!["API_SECRET", "ACCESS_TOKEN"]);
            }
            other => panic!("Expected MissingCredentials, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = Credentials::from_lookup(lookup_from(&[
            ("API_KEY", "key"),
            ("API_SECRET", "   "),
            ("ACCESS_TOKEN", "token"),
            ("ACCESS_SECRET", "token-secret"),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingCredentials(ref missing) if missing == &vec!["API_SECRET".to_string()]
        ));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let credentials = Credentials::from_lookup(lookup_from(&[
            ("API_KEY", "super-secret-key"),
            ("API_SECRET", "super-secret-secret"),
            ("ACCESS_TOKEN", "super-secret-token"),
            ("ACCESS_SECRET", "super-secret-access"),
        ]))
        .unwrap();

        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        for (name, value) in REQUIRED_VARS.iter().zip(["k", "s", "t", "ts"]) {
            std::env::set_var(name, value);
        }
        assert!(Credentials::from_env().is_ok());

        std::env::remove_var(ACCESS_TOKEN);
        let err = Credentials::from_env().unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN"));

        for name in REQUIRED_VARS {
            std::env::remove_var(name);
        }
    }
}
