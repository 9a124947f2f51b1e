//! Push notification messages and their delivery channel.
//!
//! An [`ApnMessage`] is built with chained calls and handed to an
//! [`ApnChannel`], which picks the [`PushClient`] that delivers it: the one
//! attached to the message with [`ApnMessage::via`], or the channel default.

mod client;
mod dispatcher;
mod types;

pub use client::PushClient;
pub use dispatcher::{ApnChannel, ChannelStatsSnapshot, DeliveryResult};
pub use types::{ApnMessage, PushType, UnknownPushType, ACTION_KEY, DEFAULT_SOUND};
