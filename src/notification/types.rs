use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::PushClient;

/// Sound name APNs plays when no custom sound file is given
pub const DEFAULT_SOUND: &str = "default";

/// Key under which `action` stores its entry in the custom data
pub const ACTION_KEY: &str = "action";

/// One outbound Apple push notification.
///
/// Built with chained calls, then handed by reference to a [`PushClient`].
/// Nothing here is validated; payload limits and required fields are the
/// client's concern at send time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApnMessage {
    /// Alert title shown to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Alert body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// App icon badge count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    /// Sound file name, or `"default"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Action-button category identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Background update flag, conventionally 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_available: Option<u8>,
    /// Extra payload fields merged into the notification
    #[serde(default)]
    pub custom: Map<String, Value>,
    /// Value of the `apns-push-type` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_type: Option<String>,
    /// When APNs may stop trying to deliver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Message-specific client overriding the channel default
    #[serde(skip)]
    pub client: Option<Arc<dyn PushClient>>,
    /// Notification service extension flag, conventionally 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutable_content: Option<u8>,
}

impl ApnMessage {
    /// Create an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message with the commonly used fields filled in
    pub fn create(
        title: Option<String>,
        body: Option<String>,
        custom: Option<Map<String, Value>>,
        badge: Option<u32>,
    ) -> Self {
        Self {
            title,
            body,
            custom: custom.unwrap_or_default(),
            badge,
            ..Self::default()
        }
    }

    /// Set the alert title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the alert body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the badge count
    pub fn badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    /// Set the sound file name
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Play the system default sound
    pub fn default_sound(self) -> Self {
        self.sound(DEFAULT_SOUND)
    }

    /// Set the action-button category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Mark the notification as carrying new content for a background update
    pub fn content_available(self) -> Self {
        self.content_available_value(1)
    }

    /// Set the content-available flag to an explicit value
    pub fn content_available_value(mut self, value: u8) -> Self {
        self.content_available = Some(value);
        self
    }

    /// Set the push type, e.g. `PushType::Background` or `"alert"`
    pub fn push_type(mut self, push_type: impl Into<String>) -> Self {
        self.push_type = Some(push_type.into());
        self
    }

    /// Set the expiration instant
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expire the notification `ttl` from now
    pub fn expires_in(self, ttl: chrono::Duration) -> Self {
        let at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expires_at(at)
    }

    /// Insert or overwrite one custom data entry
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Insert a custom data entry from any serializable value
    pub fn custom_from<T: Serialize>(
        self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        Ok(self.custom(key, value))
    }

    /// Replace all custom data
    pub fn set_custom(mut self, custom: Map<String, Value>) -> Self {
        self.custom = custom;
        self
    }

    /// Attach an action without parameters
    pub fn action(self, action: impl Into<String>) -> Self {
        self.action_with_params(action, Value::Null)
    }

    /// Attach an action and its parameters under the `"action"` custom key.
    ///
    /// Any earlier action is overwritten.
    pub fn action_with_params(self, action: impl Into<String>, params: impl Into<Value>) -> Self {
        let mut entry = Map::new();
        entry.insert("action".to_string(), Value::String(action.into()));
        entry.insert("params".to_string(), params.into());
        self.custom(ACTION_KEY, Value::Object(entry))
    }

    /// Let a notification service extension modify the content
    pub fn mutable_content(self) -> Self {
        self.mutable_content_value(1)
    }

    /// Set the mutable-content flag to an explicit value
    pub fn mutable_content_value(mut self, value: u8) -> Self {
        self.mutable_content = Some(value);
        self
    }

    /// Send this message through `client` instead of the channel default
    pub fn via(mut self, client: Arc<dyn PushClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Whether a message-specific client is attached
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Check if the expiration instant has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Well-known values of the `apns-push-type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    /// Visible alert, sound or badge
    Alert,
    /// Silent background update
    Background,
    /// Location query for a location push extension
    Location,
    /// Incoming VoIP call
    Voip,
    /// watchOS complication update
    Complication,
    /// File provider change signal
    FileProvider,
    /// Device management wake-up
    Mdm,
    /// Live Activity update
    LiveActivity,
    /// Push to Talk channel update
    PushToTalk,
}

impl PushType {
    /// Header value sent to APNs
    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Location => "location",
            PushType::Voip => "voip",
            PushType::Complication => "complication",
            PushType::FileProvider => "fileprovider",
            PushType::Mdm => "mdm",
            PushType::LiveActivity => "liveactivity",
            PushType::PushToTalk => "pushtotalk",
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PushType> for String {
    fn from(push_type: PushType) -> Self {
        push_type.as_str().to_string()
    }
}

/// Error returned when a string is not a known push type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown push type: {0}")]
pub struct UnknownPushType(pub String);

impl FromStr for PushType {
    type Err = UnknownPushType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(PushType::Alert),
            "background" => Ok(PushType::Background),
            "location" => Ok(PushType::Location),
            "voip" => Ok(PushType::Voip),
            "complication" => Ok(PushType::Complication),
            "fileprovider" => Ok(PushType::FileProvider),
            "mdm" => Ok(PushType::Mdm),
            "liveactivity" => Ok(PushType::LiveActivity),
            "pushtotalk" => Ok(PushType::PushToTalk),
            other => Err(UnknownPushType(other.to_string())),
        }
    }
}
