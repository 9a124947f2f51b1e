use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

use super::ApnMessage;

/// A transport able to deliver an [`ApnMessage`] to one device.
///
/// Implementations own everything past the message: payload encoding,
/// token or certificate authentication, the HTTP/2 connection, and
/// interpreting the APNs response.
#[async_trait]
pub trait PushClient: Send + Sync + fmt::Debug {
    /// Name identifying this client's configuration in logs
    fn name(&self) -> &str;

    /// Deliver `message` to the device identified by `device_token`
    async fn send(&self, device_token: &str, message: &ApnMessage) -> Result<()>;
}
