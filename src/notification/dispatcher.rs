use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::{ApnMessage, PushClient};

/// Number of device token characters kept in logs
const TOKEN_LOG_PREFIX: usize = 8;

/// Result of handing a message to a client for a set of devices
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryResult {
    /// Name of the client that handled the message
    pub client: String,
    /// Number of devices the client accepted the message for
    pub delivered: usize,
    /// Number of devices the client reported a failure for
    pub failed: usize,
    /// Tokens of the devices that failed
    pub failed_tokens: Vec<String>,
    /// Whether any delivery was successful
    pub success: bool,
}

impl DeliveryResult {
    fn new(client: &str, delivered: usize, failed_tokens: Vec<String>) -> Self {
        Self {
            client: client.to_string(),
            delivered,
            failed: failed_tokens.len(),
            failed_tokens,
            success: delivered > 0,
        }
    }
}

/// Statistics for the channel
#[derive(Debug, Default)]
pub struct ChannelStats {
    /// Messages handed to the channel
    pub total_messages: AtomicU64,
    /// Per-device sends the client accepted
    pub total_delivered: AtomicU64,
    /// Per-device sends the client rejected
    pub total_failed: AtomicU64,
    /// Messages sent through a message-specific client
    pub client_overrides: AtomicU64,
}

impl ChannelStats {
    pub fn snapshot(&self) -> ChannelStatsSnapshot {
        ChannelStatsSnapshot {
            total_messages: self.total_messages.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            client_overrides: self.client_overrides.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of channel statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatsSnapshot {
    pub total_messages: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub client_overrides: u64,
}

/// Routes messages to the client that should deliver them.
///
/// A message carrying its own client (see [`ApnMessage::via`]) goes through
/// that client; every other message goes through the channel default.
#[derive(Debug)]
pub struct ApnChannel {
    default_client: Arc<dyn PushClient>,
    stats: ChannelStats,
}

impl ApnChannel {
    /// Create a channel that falls back to `default_client`
    pub fn new(default_client: Arc<dyn PushClient>) -> Self {
        Self {
            default_client,
            stats: ChannelStats::default(),
        }
    }

    /// The process-wide default client
    pub fn default_client(&self) -> &Arc<dyn PushClient> {
        &self.default_client
    }

    /// Get channel statistics
    pub fn stats(&self) -> ChannelStatsSnapshot {
        self.stats.snapshot()
    }

    /// Pick the client for `message`: its own when attached, else the default
    pub fn client_for<'a>(&'a self, message: &'a ApnMessage) -> &'a Arc<dyn PushClient> {
        message.client.as_ref().unwrap_or(&self.default_client)
    }

    /// Hand `message` to its client once per device token, in order.
    ///
    /// Failures are counted and logged; the remaining tokens are still sent.
    /// Expiry is left to the client, which forwards it as `apns-expiration`.
    #[tracing::instrument(
        name = "channel.send",
        skip(self, message, device_tokens),
        fields(token_count = device_tokens.len())
    )]
    pub async fn send(&self, message: &ApnMessage, device_tokens: &[String]) -> DeliveryResult {
        let client = self.client_for(message);
        self.stats.total_messages.fetch_add(1, Ordering::Relaxed);

        if message.has_client() {
            self.stats.client_overrides.fetch_add(1, Ordering::Relaxed);
        }

        let mut delivered = 0;
        let mut failed_tokens = Vec::new();

        for token in device_tokens {
            match client.send(token, message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        client = %client.name(),
                        token = %token_prefix(token),
                        error = %e,
                        "Push client failed to send message"
                    );
                    failed_tokens.push(token.clone());
                }
            }
        }

        self.stats
            .total_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.stats
            .total_failed
            .fetch_add(failed_tokens.len() as u64, Ordering::Relaxed);

        tracing::debug!(
            client = %client.name(),
            delivered = delivered,
            failed = failed_tokens.len(),
            "Sent message"
        );

        DeliveryResult::new(client.name(), delivered, failed_tokens)
    }
}

fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_LOG_PREFIX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApnError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingClient {
        name: String,
        reject: Vec<String>,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn named(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                ..Self::default()
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushClient for RecordingClient {
        fn name(&self) -> &str {
            &self.name
        }

        async fn send(&self, device_token: &str, _message: &ApnMessage) -> Result<()> {
            if self.reject.iter().any(|t| t == device_token) {
                return Err(ApnError::delivery(&self.name, "BadDeviceToken"));
            }
            self.sent.lock().unwrap().push(device_token.to_string());
            Ok(())
        }
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_client_for_prefers_message_client() {
        let default = RecordingClient::named("default");
        let custom = RecordingClient::named("custom");
        let channel = ApnChannel::new(default);

        let plain = ApnMessage::new();
        assert_eq!(channel.client_for(&plain).name(), "default");

        let routed = ApnMessage::new().via(custom);
        assert_eq!(channel.client_for(&routed).name(), "custom");
        assert_eq!(channel.default_client().name(), "default");
    }

    #[tokio::test]
    async fn test_send_to_each_token_in_order() {
        let client = RecordingClient::named("default");
        let channel = ApnChannel::new(client.clone());

        let result = channel
            .send(&ApnMessage::new().title("Hi"), &tokens(&["aaa", "bbb", "ccc"]))
            .await;

        assert!(result.success);
        assert_eq!(result.delivered, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(client.sent(), tokens(&["aaa", "bbb", "ccc"]));
    }

    #[tokio::test]
    async fn test_send_without_tokens() {
        let client = RecordingClient::named("default");
        let channel = ApnChannel::new(client.clone());

        let result = channel.send(&ApnMessage::new(), &[]).await;

        assert!(!result.success);
        assert_eq!(result.delivered, 0);
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_remaining_tokens() {
        let client = Arc::new(RecordingClient {
            name: "default".to_string(),
            reject: tokens(&["bad"]),
            ..RecordingClient::default()
        });
        let channel = ApnChannel::new(client.clone());

        let result = channel
            .send(&ApnMessage::new(), &tokens(&["one", "bad", "two"]))
            .await;

        assert!(result.success);
        assert_eq!(result.delivered, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failed_tokens, tokens(&["bad"]));
        assert_eq!(client.sent(), tokens(&["one", "two"]));
    }

    #[derive(Debug, Default)]
    struct ExpiryClient {
        seen: Mutex<Vec<Option<chrono::DateTime<chrono::Utc>>>>,
    }

    #[async_trait]
    impl PushClient for ExpiryClient {
        fn name(&self) -> &str {
            "expiry"
        }

        async fn send(&self, _device_token: &str, message: &ApnMessage) -> Result<()> {
            self.seen.lock().unwrap().push(message.expires_at);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_past_expiry_is_passed_to_client() {
        let client = Arc::new(ExpiryClient::default());
        let channel = ApnChannel::new(client.clone());
        let expires = chrono::Utc::now() - chrono::Duration::seconds(1);
        let message = ApnMessage::new().title("x").expires_at(expires);

        let result = channel.send(&message, &tokens(&["aaa"])).await;

        assert!(result.success);
        assert_eq!(result.delivered, 1);
        assert_eq!(*client.seen.lock().unwrap(), vec![Some(expires)]);
    }

    #[tokio::test]
    async fn test_stats() {
        let default = RecordingClient::named("default");
        let custom = RecordingClient::named("custom");
        let channel = ApnChannel::new(default.clone());

        channel.send(&ApnMessage::new(), &tokens(&["a"])).await;
        let result = channel
            .send(&ApnMessage::new().via(custom.clone()), &tokens(&["b", "c"]))
            .await;

        assert_eq!(result.client, "custom");
        assert_eq!(default.sent(), tokens(&["a"]));
        assert_eq!(custom.sent(), tokens(&["b", "c"]));
        assert_eq!(
            channel.stats(),
            ChannelStatsSnapshot {
                total_messages: 2,
                total_delivered: 3,
                total_failed: 0,
                client_overrides: 1,
            }
        );
    }

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("0123456789abcdef"), "01234567");
        assert_eq!(token_prefix("abc"), "abc");
    }
}
