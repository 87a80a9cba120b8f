use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.kraken.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WEBDRIVER: &str = "geckodriver";
pub const DEFAULT_WEBDRIVER_PORT: u16 = 4444;

const ENV_API_KEY: &str = "public_key";
const ENV_API_SECRET: &str = "private_key";
const ENV_UPLOAD_USERNAME: &str = "cointracking_username";
const ENV_UPLOAD_PASSWORD: &str = "cointracking_password";
const ENV_WEBDRIVER: &str = "geckodriver";
const ENV_API_URL: &str = "KRAKEN_API_URL";
const ENV_TIMEOUT: &str = "KRAKEN_TIMEOUT_SECS";
const ENV_WEBDRIVER_PORT: &str = "WEBDRIVER_PORT";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Please make sure that [{}] are valid fields in your .env file", .0.join("] and ["))]
    Missing(Vec<&'static str>),

    #[error("[{name}] is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Exchange credentials and client tuning, built once at startup
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    /// Base64-encoded API secret
    pub api_secret: String,
    pub api_url: String,
    pub request_timeout: Duration,
    pub webdriver_path: String,
    pub webdriver_port: u16,
    upload: Option<UploadCredentials>,
}

/// CoinTracking login
#[derive(Clone)]
pub struct UploadCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &create_preview(&self.api_key))
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .field("webdriver_path", &self.webdriver_path)
            .field("webdriver_port", &self.webdriver_port)
            .field("upload", &self.upload.as_ref().map(|u| &u.username))
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY);
        let api_secret = get(ENV_API_SECRET);

        let (api_key, api_secret) = match (api_key, api_secret) {
            (Some(key), Some(secret)) => (key, secret),
            _ => return Err(ConfigError::Missing(vec![ENV_API_KEY, ENV_API_SECRET])),
        };

        general_purpose::STANDARD
            .decode(api_secret.trim())
            .map_err(|e| ConfigError::Invalid {
                name: ENV_API_SECRET,
                reason: format!("not valid base64 ({})", e),
            })?;

        let request_timeout = match get(ENV_TIMEOUT) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: ENV_TIMEOUT,
                    reason: e.to_string(),
                })?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let webdriver_port = match get(ENV_WEBDRIVER_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: ENV_WEBDRIVER_PORT,
                reason: e.to_string(),
            })?,
            None => DEFAULT_WEBDRIVER_PORT,
        };

        let upload = match (get(ENV_UPLOAD_USERNAME), get(ENV_UPLOAD_PASSWORD)) {
            (Some(username), Some(password)) => Some(UploadCredentials { username, password }),
            _ => None,
        };

        Ok(Self {
            api_key: api_key.trim().to_string(),
            api_secret: api_secret.trim().to_string(),
            api_url: get(ENV_API_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            request_timeout,
            webdriver_path: get(ENV_WEBDRIVER).unwrap_or_else(|| DEFAULT_WEBDRIVER.to_string()),
            webdriver_port,
            upload,
        })
    }

    /// CoinTracking login, required only by the upload flow
    pub fn upload_credentials(&self) -> Result<&UploadCredentials, ConfigError> {
        self.upload
            .as_ref()
            .ok_or_else(|| ConfigError::Missing(vec![ENV_UPLOAD_USERNAME, ENV_UPLOAD_PASSWORD]))
    }
}

/// Mask everything but the last 4 characters
pub fn create_preview(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        "*".repeat(chars.len())
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let err = Settings::from_lookup(lookup(&[("private_key", "c2VjcmV0")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["public_key", "private_key"]));
        assert_eq!(
            err.to_string(),
            "Please make sure that [public_key] and [private_key] are valid fields in your .env file"
        );
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let err = Settings::from_lookup(lookup(&[("public_key", "  "), ("private_key", "c2VjcmV0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_invalid_secret_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("public_key", "key"), ("private_key", "not base64!")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "private_key", .. }));
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::from_lookup(lookup(&[("public_key", "key"), ("private_key", "c2VjcmV0")])).unwrap();
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.webdriver_path, "geckodriver");
        assert_eq!(settings.webdriver_port, 4444);
        assert!(settings.upload_credentials().is_err());
    }

    #[test]
    fn test_overrides_and_upload_credentials() {
        let settings = Settings::from_lookup(lookup(&[
            ("public_key", "key"),
            ("private_key", "c2VjcmV0"),
            ("KRAKEN_API_URL", "http://127.0.0.1:8080/"),
            ("KRAKEN_TIMEOUT_SECS", "5"),
            ("geckodriver", "/opt/geckodriver"),
            ("cointracking_username", "alice"),
            ("cointracking_password", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(settings.api_url, "http://127.0.0.1:8080");
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.webdriver_path, "/opt/geckodriver");
        assert_eq!(settings.upload_credentials().unwrap().username, "alice");
    }

    #[test]
    fn test_debug_output_masks_key() {
        let settings = Settings::from_lookup(lookup(&[
            ("public_key", "abcdefghijkl"),
            ("private_key", "c2VjcmV0"),
        ]))
        .unwrap();
        let debug = format!("{:?}", settings);
        assert!(debug.contains("****...ijkl"));
        assert!(!debug.contains("c2VjcmV0"));
    }
}
