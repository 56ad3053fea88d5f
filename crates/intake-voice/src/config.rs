use serde::Deserialize;
use std::fmt;

fn default_token_ttl_seconds() -> u64 {
    3600
}

fn default_room_empty_timeout() -> u32 {
    300
}

/// LiveKit connection settings for the real-time intake rooms.
#[derive(Clone, Deserialize)]
pub struct LiveKitConfig {
    /// LiveKit server URL (ws:// or wss://). Empty disables room features.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// JWT TTL in seconds for join and admin tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
    /// Seconds an empty call room lingers before LiveKit closes it.
    #[serde(default = "default_room_empty_timeout")]
    pub room_empty_timeout: u32,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
            room_empty_timeout: default_room_empty_timeout(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("room_empty_timeout", &self.room_empty_timeout)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }
}
