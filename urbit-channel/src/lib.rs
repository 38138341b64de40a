//! Client for the Urbit HTTP event-channel protocol.
//!
//! - [`ship`]: ship name parsing and classification.
//! - [`auth`]: the authentication handshake.
//! - [`channel`]: pokes, subscriptions and the long-poll event stream.
//! - [`codec`]: routing of event payloads to typed application data.
//! - [`transport`]: the HTTP capability the client runs over.

pub mod auth;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod ship;
pub mod tracing;
pub mod transport;

pub use auth::{AuthCredentials, AuthOptions, ConnectionState};
pub use channel::{ChannelClient, ChannelEvent, PokeRequest, SubscriptionAction, SubscriptionRequest};
pub use codec::CodecRegistry;
pub use config::ChannelConfig;
pub use error::{ChannelError, UnifiedError};
pub use ship::{ShipAddress, ShipClass};
