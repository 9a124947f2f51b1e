//! Apple Push Notification messages and the channel that routes them to a
//! push client.
//!
//! ```rust,ignore
//! let message = ApnMessage::new()
//!     .title("Order shipped")
//!     .body("Arriving tomorrow")
//!     .default_sound()
//!     .action_with_params("open_order", serde_json::json!({"id": 42}));
//!
//! let result = channel.send(&message, &device_tokens).await;
//! ```

// Infrastructure
pub mod config;
pub mod error;
pub mod telemetry;

// Domain
pub mod notification;

pub use error::{ApnError, Result};
pub use notification::{ApnChannel, ApnMessage, DeliveryResult, PushClient, PushType};
