use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::notification::ApnMessage;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub client: ClientConfig,
    #[serde(default)]
    pub defaults: MessageDefaults,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Identity of the default push client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// App bundle ID, sent as the `apns-topic`
    pub bundle_id: String,
    /// Use the production gateway instead of the sandbox
    #[serde(default)]
    pub production: bool,
}

/// Values applied to messages that leave them unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDefaults {
    pub sound: Option<String>,
    pub push_type: Option<String>,
    /// Seconds from send time until the message expires
    pub expiry_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .set_default("client.production", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/apn").required(false))
            .add_source(File::with_name(&format!("config/apn.{}", run_mode)).required(false))
            // APN_CLIENT__BUNDLE_ID, APN_DEFAULTS__SOUND, APN_LOGGING__LEVEL, etc.
            .add_source(
                Environment::with_prefix("APN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize settings from an already built configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}

impl ClientConfig {
    /// APNs host matching the configured environment
    pub fn endpoint(&self) -> &'static str {
        if self.production {
            "api.push.apple.com"
        } else {
            "api.sandbox.push.apple.com"
        }
    }
}

impl MessageDefaults {
    /// Fill the fields `message` leaves unset; explicit values always win
    pub fn apply(&self, mut message: ApnMessage) -> ApnMessage {
        if message.sound.is_none() {
            message.sound = self.sound.clone();
        }
        if message.push_type.is_none() {
            message.push_type = self.push_type.clone();
        }
        if message.expires_at.is_none() {
            if let Some(secs) = self.expiry_seconds {
                // Out-of-range values saturate to the latest representable instant
                let ttl = i64::try_from(secs)
                    .ok()
                    .and_then(chrono::Duration::try_seconds)
                    .unwrap_or(chrono::Duration::MAX);
                message = message.expires_in(ttl);
            }
        }
        message
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
