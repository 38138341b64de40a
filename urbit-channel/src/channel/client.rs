//! Channel client implementation.
//!
//! The client owns the session state (connection, cursor, credentials,
//! last error) and mutates it in one critical section per completed
//! request. Typed events are pushed to the consumer over a channel.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::messages::{
    self, PokeRequest, PollOutcome, SubscriptionAction, SubscriptionRequest, classify,
};
use crate::auth::{AuthCredentials, AuthOptions, AuthOutcome, AuthSession, ConnectionState};
use crate::codec::CodecRegistry;
use crate::config::ChannelConfig;
use crate::error::{self, ChannelError, UnifiedError};
use crate::ship::ShipAddress;
use crate::transport::{self, BuildError, HttpClient, HttpTransport, TransportFailure};

/// Events emitted by the channel client.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent<T> {
    /// Handshake succeeded.
    Connected(ShipAddress),

    /// Handshake failed.
    Disconnected(UnifiedError),

    /// A subscription event decoded by the codec registry.
    Data { id: u64, path: String, value: T },

    /// Non-fatal failure: a poke, subscription change or undecodable
    /// event. Polling continues.
    Error(UnifiedError),

    /// The poll request itself failed. Polling resumes only after a
    /// successful `bootstrap` or `subscribe`.
    PollingStopped(UnifiedError),
}

/// Session state, guarded by one lock.
#[derive(Debug)]
struct Session {
    connection: ConnectionState,
    cursor: u64,
    credentials: Option<AuthCredentials>,
    ship: Option<ShipAddress>,
    last_error: Option<UnifiedError>,
    polling: bool,
    /// Bumped whenever the channel id changes. Poll results tagged with
    /// an older generation are discarded.
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            cursor: 1,
            credentials: None,
            ship: None,
            last_error: None,
            polling: false,
            generation: 0,
        }
    }
}

impl Session {
    fn session_token(&self) -> String {
        self.credentials
            .as_ref()
            .map(|c| c.session_token.clone())
            .unwrap_or_default()
    }

    fn channel(&self) -> String {
        self.credentials
            .as_ref()
            .map(|c| c.channel.clone())
            .unwrap_or_default()
    }
}

/// State shared between the client handle and its poll task.
struct Shared<T> {
    transport: Arc<dyn HttpTransport>,
    registry: CodecRegistry<T>,
    session: Mutex<Session>,
    event_tx: mpsc::Sender<ChannelEvent<T>>,
    shutdown: CancellationToken,
    /// Publishes `Session::generation` so the poll task can drop a request
    /// still outstanding on a replaced channel.
    generation_tx: watch::Sender<u64>,
}

/// What the poll task does after handling a response.
enum Next {
    Rearm,
    Stop,
}

/// Client for one ship's event channel.
///
/// Dropping the client stops the poll loop: a poll already in flight is
/// left to finish, but nothing is issued after it.
pub struct ChannelClient<T> {
    options: AuthOptions,
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> ChannelClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn new(
        options: AuthOptions,
        transport: Arc<dyn HttpTransport>,
        registry: CodecRegistry<T>,
        event_tx: mpsc::Sender<ChannelEvent<T>>,
    ) -> Self {
        Self {
            options,
            shared: Arc::new(Shared {
                transport,
                registry,
                session: Mutex::new(Session::default()),
                event_tx,
                shutdown: CancellationToken::new(),
                generation_tx: watch::Sender::new(0),
            }),
        }
    }

    /// Create a client talking HTTP to `config.url`.
    pub fn connect(
        config: &ChannelConfig,
        registry: CodecRegistry<T>,
        event_tx: mpsc::Sender<ChannelEvent<T>>,
    ) -> Result<Self, BuildError> {
        let transport = HttpClient::new(config)?;
        Ok(Self::new(config.auth, Arc::new(transport), registry, event_tx))
    }

    /// Authenticate, then start polling if that succeeded.
    ///
    /// May be called again to re-authenticate; credentials are replaced
    /// wholesale and the cursor restarts if the channel changed.
    pub async fn bootstrap(&self) -> ConnectionState {
        let outcome = AuthSession::new(self.shared.transport.as_ref(), self.options)
            .begin()
            .await;
        let connection = outcome.connection;

        let event = self.shared.apply_auth(outcome);
        self.shared.emit(event).await;

        if connection == ConnectionState::Connected {
            start_polling(&self.shared);
        }
        connection
    }

    /// Send a one-shot command.
    ///
    /// Issued regardless of connection state. A failure is recorded as the
    /// last error but does not affect the connection or the poll loop.
    pub async fn poke(&self, request: &PokeRequest) -> Result<(), UnifiedError> {
        let token = self.shared.session.lock().session_token();
        let path = messages::poke_path(request);
        debug!(app = %request.app, mark = %request.mark, "Poking");

        let result =
            transport::post_json(self.shared.transport.as_ref(), &path, &messages::poke_body(request, &token))
                .await;

        match result {
            Ok(()) => Ok(()),
            Err(failure) => Err(self.shared.record_failure("Poke", &failure).await),
        }
    }

    /// Open or close a subscription.
    ///
    /// The first success while the poll loop is idle starts it. This
    /// includes an unsubscribe: the loop does not track which
    /// subscriptions remain open.
    pub async fn subscribe(
        &self,
        request: &SubscriptionRequest,
        action: SubscriptionAction,
    ) -> Result<(), UnifiedError> {
        let token = self.shared.session.lock().session_token();
        let path = messages::subscription_path(request, action);
        debug!(app = %request.app, wire = %request.wire, verb = action.verb(), "Changing subscription");

        let result = transport::post_json(
            self.shared.transport.as_ref(),
            &path,
            &messages::subscription_body(request, &token),
        )
        .await;

        match result {
            Ok(()) => {
                start_polling(&self.shared);
                Ok(())
            }
            Err(failure) => Err(self.shared.record_failure("Subscription", &failure).await),
        }
    }

    pub async fn unsubscribe(&self, request: &SubscriptionRequest) -> Result<(), UnifiedError> {
        self.subscribe(request, SubscriptionAction::Unsubscribe)
            .await
    }
}

impl<T> ChannelClient<T> {
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.session.lock().connection
    }

    /// Event id the next poll asks for.
    pub fn cursor(&self) -> u64 {
        self.shared.session.lock().cursor
    }

    pub fn credentials(&self) -> Option<AuthCredentials> {
        self.shared.session.lock().credentials.clone()
    }

    /// Our identity, once connected.
    pub fn ship(&self) -> Option<ShipAddress> {
        self.shared.session.lock().ship.clone()
    }

    pub fn last_error(&self) -> Option<UnifiedError> {
        self.shared.session.lock().last_error.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.shared.session.lock().polling
    }
}

impl<T> Drop for ChannelClient<T> {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl<T> Shared<T> {
    /// Apply a finished handshake and return the event announcing it.
    fn apply_auth(&self, outcome: AuthOutcome) -> ChannelEvent<T> {
        let mut session = self.session.lock();

        if let Some(credentials) = &outcome.credentials {
            let previous = session.credentials.as_ref().map(|c| c.channel.as_str());
            if previous != Some(credentials.channel.as_str()) {
                session.cursor = 1;
                session.generation += 1;
                self.generation_tx.send_replace(session.generation);
            }
        }

        session.connection = outcome.connection;
        session.credentials = outcome.credentials;
        session.ship = outcome.ship.clone();
        session.last_error = outcome.error.clone();

        match (outcome.ship, outcome.error) {
            (Some(ship), _) => ChannelEvent::Connected(ship),
            (None, Some(error)) => ChannelEvent::Disconnected(error),
            (None, None) => ChannelEvent::Disconnected(UnifiedError::new("Not connected")),
        }
    }

    /// Record a failed poke or subscription change.
    async fn record_failure(&self, what: &str, failure: &TransportFailure) -> UnifiedError {
        let error = error::translate(failure);
        warn!(error = %error, "{} failed", what);
        self.session.lock().last_error = Some(error.clone());
        self.emit(ChannelEvent::Error(error.clone())).await;
        error
    }

    /// Deliver an event. Returns false once the consumer is gone.
    async fn emit(&self, event: ChannelEvent<T>) -> bool {
        self.event_tx.send(event).await.is_ok()
    }
}

impl<T: Send + 'static> Shared<T> {
    /// Apply one classified poll response issued under `generation`.
    async fn handle_poll(&self, outcome: PollOutcome, generation: u64) -> Next {
        let stale = self.session.lock().generation != generation;
        if stale {
            debug!("Discarding poll response from a replaced channel");
            return Next::Rearm;
        }

        let event = match outcome {
            PollOutcome::Heartbeat => {
                trace!("Heartbeat");
                return Next::Rearm;
            }
            PollOutcome::Data { id, path, payload } => {
                let decoded = self.registry.dispatch(&path, &payload);

                let mut session = self.session.lock();
                if session.generation != generation {
                    return Next::Rearm;
                }
                session.cursor = id.saturating_add(1);
                match decoded {
                    Ok(value) => {
                        trace!(id, path = %path, "Event");
                        session.last_error = None;
                        ChannelEvent::Data { id, path, value }
                    }
                    Err(e) => {
                        warn!(id, path = %path, error = %e, "Undecodable event");
                        let error = UnifiedError::from(e);
                        session.last_error = Some(error.clone());
                        ChannelEvent::Error(error)
                    }
                }
            }
            PollOutcome::ProtocolError(message) => {
                warn!(error = %message, "Unrecognized poll response");
                let error = UnifiedError::from(ChannelError::ProtocolDecodeError(message));
                self.session.lock().last_error = Some(error.clone());
                ChannelEvent::Error(error)
            }
        };

        if self.emit(event).await {
            Next::Rearm
        } else {
            debug!("Event consumer gone");
            Next::Stop
        }
    }

    /// Stop polling after a failed poll request issued under
    /// `generation`. Returns false, leaving the loop running, if the
    /// channel has been replaced since.
    async fn halt(&self, failure: &TransportFailure, generation: u64) -> bool {
        let error = error::translate(failure);
        {
            let mut session = self.session.lock();
            if session.generation != generation {
                debug!(error = %error, "Ignoring poll failure from a replaced channel");
                return false;
            }
            session.last_error = Some(error.clone());
            session.polling = false;
        }
        warn!(error = %error, "Poll failed, polling stopped");
        self.emit(ChannelEvent::PollingStopped(error)).await;
        true
    }
}

/// Spawn the poll task unless one is already running.
fn start_polling<T: Send + 'static>(shared: &Arc<Shared<T>>) {
    {
        let mut session = shared.session.lock();
        if session.polling || shared.shutdown.is_cancelled() {
            return;
        }
        session.polling = true;
    }

    info!("Polling started");
    tokio::spawn(poll_loop(shared.clone()));
}

/// The poll task: one request at a time, each issued only after the
/// previous response has been applied.
async fn poll_loop<T: Send + 'static>(shared: Arc<Shared<T>>) {
    let mut generations = shared.generation_tx.subscribe();

    while !shared.shutdown.is_cancelled() {
        let (path, generation) = {
            let session = shared.session.lock();
            generations.borrow_and_update();
            (
                messages::poll_path(&session.channel(), session.cursor),
                session.generation,
            )
        };

        let response = tokio::select! {
            response = transport::get_text(shared.transport.as_ref(), &path) => response,
            _ = generations.changed() => {
                debug!("Channel replaced, abandoning outstanding poll");
                continue;
            }
        };

        match response {
            Ok(body) => {
                if let Next::Stop = shared.handle_poll(classify(&body), generation).await {
                    break;
                }
            }
            Err(failure) => {
                if shared.halt(&failure, generation).await {
                    return;
                }
            }
        }
    }

    shared.session.lock().polling = false;
    debug!("Polling ended");
}
