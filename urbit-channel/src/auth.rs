//! Authentication handshake.
//!
//! A session starts with an untargeted auth request, which tells us which
//! ship we are talking to. We then authenticate as that ship ("self
//! auth"). If that fails and the caller allows it, we fall back to
//! anonymous auth exactly once.
//!
//! ```text
//! Unauthenticated
//!   -> AwaitingInitialAuth  --fail-->  Disconnected
//!   -> AwaitingSelfAuth     --ok---->  Connected
//!                           --fail-->  AwaitingAnonAuth (fallback allowed)
//!                           --fail-->  Disconnected     (otherwise)
//!   AwaitingAnonAuth        --ok---->  Connected
//!                           --fail-->  Disconnected
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{self, ChannelError, UnifiedError};
use crate::ship::{self, ShipAddress};
use crate::transport::{self, HttpTransport};

pub(crate) const INITIAL_AUTH_PATH: &str = "/~/auth.json";
pub(crate) const ANON_AUTH_PATH: &str = "/~/as/anon/~/auth.json";

pub(crate) fn self_auth_path(ship: &str) -> String {
    format!("/~/as/~{}/~/auth.json", ship.trim_start_matches('~'))
}

/// Handshake options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthOptions {
    /// Retry as anonymous when self auth fails.
    pub allow_anonymous_fallback: bool,
}

/// Body of every auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct AuthResponse {
    pub oryx: String,
    pub user: String,
    pub sein: String,
    pub ixor: String,
    pub ship: String,
    pub auth: Vec<String>,
}

/// Credentials issued by the ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    /// Session token, echoed in every poke and subscription.
    pub session_token: String,
    /// Identity the ship considers us to be.
    pub user: String,
    /// Ship that signed for us.
    pub signing_ship: String,
    /// Event channel id.
    pub channel: String,
    /// Ship that answered.
    pub ship: String,
    /// Identities this session may act as.
    pub granted: Vec<String>,
}

impl From<AuthResponse> for AuthCredentials {
    fn from(response: AuthResponse) -> Self {
        Self {
            session_token: response.oryx,
            user: response.user,
            signing_ship: response.sein,
            channel: response.ixor,
            ship: response.ship,
            granted: response.auth,
        }
    }
}

/// Whether the last handshake produced a usable session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingInitialAuth,
    AwaitingSelfAuth,
    AwaitingAnonAuth,
    Connected,
    Disconnected,
}

/// Result of a completed handshake, applied by the caller in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub connection: ConnectionState,
    /// Latest credentials the ship issued, if any request succeeded.
    pub credentials: Option<AuthCredentials>,
    /// Our identity; set only when connected.
    pub ship: Option<ShipAddress>,
    /// Why we ended up disconnected.
    pub error: Option<UnifiedError>,
}

/// One run of the authentication handshake.
pub struct AuthSession<'a> {
    transport: &'a dyn HttpTransport,
    options: AuthOptions,
    state: AuthState,
    credentials: Option<AuthCredentials>,
}

impl<'a> AuthSession<'a> {
    pub fn new(transport: &'a dyn HttpTransport, options: AuthOptions) -> Self {
        Self {
            transport,
            options,
            state: AuthState::Unauthenticated,
            credentials: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Run the handshake to completion.
    pub async fn begin(&mut self) -> AuthOutcome {
        self.state = AuthState::AwaitingInitialAuth;
        debug!("Requesting initial auth");

        let initial = match self.request(INITIAL_AUTH_PATH).await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Initial auth failed");
                return self.disconnect(e);
            }
        };
        let target = initial.ship.clone();
        self.credentials = Some(initial);

        self.state = AuthState::AwaitingSelfAuth;
        debug!(ship = %target, "Requesting self auth");

        let self_error = match self.authenticate(&self_auth_path(&target), |c| c.granted.first()).await {
            Ok(ship) => return self.connect(ship),
            Err(e) => e,
        };

        if !self.options.allow_anonymous_fallback {
            warn!(error = %self_error, "Self auth failed");
            return self.disconnect(self_error);
        }

        self.state = AuthState::AwaitingAnonAuth;
        info!(error = %self_error, "Self auth failed, falling back to anonymous");

        match self.authenticate(ANON_AUTH_PATH, |c| Some(&c.user)).await {
            Ok(ship) => self.connect(ship),
            Err(e) => {
                warn!(error = %e, "Anonymous auth failed");
                self.disconnect(e)
            }
        }
    }

    /// Request credentials from `path` and derive our identity from them
    /// with `identity`. Credentials are kept even if the identity turns
    /// out to be unusable.
    async fn authenticate(
        &mut self,
        path: &str,
        identity: impl Fn(&AuthCredentials) -> Option<&String>,
    ) -> Result<ShipAddress, UnifiedError> {
        let credentials = self.request(path).await?;
        let name = identity(&credentials).cloned();
        self.credentials = Some(credentials);

        let name = name.ok_or_else(|| {
            UnifiedError::from(ChannelError::ProtocolDecodeError(
                "auth response names no identity".to_string(),
            ))
        })?;
        ship::parse(&name).map_err(|e| ChannelError::from(e).into())
    }

    async fn request(&self, path: &str) -> Result<AuthCredentials, UnifiedError> {
        transport::get_json::<AuthResponse>(self.transport, path)
            .await
            .map(AuthCredentials::from)
            .map_err(|failure| error::translate(&failure))
    }

    fn connect(&mut self, ship: ShipAddress) -> AuthOutcome {
        self.state = AuthState::Connected;
        info!(ship = %ship, class = %ship.class(), "Authenticated");
        AuthOutcome {
            connection: ConnectionState::Connected,
            credentials: self.credentials.clone(),
            ship: Some(ship),
            error: None,
        }
    }

    fn disconnect(&mut self, error: UnifiedError) -> AuthOutcome {
        self.state = AuthState::Disconnected;
        AuthOutcome {
            connection: ConnectionState::Disconnected,
            credentials: self.credentials.clone(),
            ship: None,
            error: Some(error),
        }
    }
}
