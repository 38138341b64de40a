//! Event channel client.
//!
//! The channel is a long-poll stream of subscription events. After
//! authenticating, the client keeps exactly one poll request outstanding
//! and re-issues it as soon as the previous one is classified. Pokes and
//! subscription changes are independent POSTs that run alongside it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use urbit_channel::channel::{ChannelClient, ChannelEvent, SubscriptionRequest};
//!
//! let (event_tx, mut event_rx) = mpsc::channel(100);
//! let client = ChannelClient::connect(&config, registry, event_tx)?;
//! client.bootstrap().await;
//! client.subscribe(&request, SubscriptionAction::Subscribe).await?;
//!
//! while let Some(event) = event_rx.recv().await {
//!     match event {
//!         ChannelEvent::Data { value, .. } => { /* typed update */ }
//!         ChannelEvent::PollingStopped(error) => { /* re-bootstrap */ }
//!         // ...
//!     }
//! }
//! ```

mod client;
mod messages;

pub use client::{ChannelClient, ChannelEvent};
pub use messages::{
    PokeRequest, PollOutcome, SubscriptionAction, SubscriptionRequest, classify,
};
