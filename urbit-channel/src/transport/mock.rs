//! Scripted transport for deterministic tests.
//!
//! Replies are queued per (method, path prefix) and consumed in order. A
//! request with no queued reply never completes, which is how a ship holds
//! a long-poll open. Every request is also forwarded to the paired
//! [`MockTransportHandle`] so tests can wait for the client to reach a
//! given request before inspecting its state.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::{HttpResponse, HttpTransport, TransportFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
}

/// A request the client issued.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

type Reply = Result<HttpResponse, TransportFailure>;

enum Queued {
    Ready(Reply),
    /// Completes when the test sends on the paired oneshot.
    Deferred(oneshot::Receiver<Reply>),
}

struct Route {
    method: Method,
    prefix: String,
    replies: VecDeque<Queued>,
}

pub(crate) struct MockTransport {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<RecordedRequest>>,
    tx: mpsc::UnboundedSender<RecordedRequest>,
}

/// Test-side handle for a [`MockTransport`].
pub(crate) struct MockTransportHandle {
    rx: mpsc::UnboundedReceiver<RecordedRequest>,
}

impl MockTransport {
    /// Create a linked (transport, handle) pair.
    pub fn pair() -> (Arc<Self>, MockTransportHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = MockTransport {
            routes: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
            tx,
        };
        (Arc::new(transport), MockTransportHandle { rx })
    }

    /// Queue a reply for the next unanswered request matching `prefix`.
    pub fn reply(&self, method: Method, prefix: &str, reply: Reply) {
        self.enqueue(method, prefix, Queued::Ready(reply));
    }

    /// Queue a reply that is only delivered once the returned sender is
    /// used. Dropping the sender leaves the request hanging.
    pub fn reply_later(&self, method: Method, prefix: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(method, prefix, Queued::Deferred(rx));
        tx
    }

    fn enqueue(&self, method: Method, prefix: &str, reply: Queued) {
        let mut routes = self.routes.lock();
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.prefix == prefix)
        {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                prefix: prefix.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    pub fn reply_json(&self, method: Method, prefix: &str, status: u16, body: Value) {
        self.reply(method, prefix, Ok(HttpResponse::new(status, body.to_string())));
    }

    pub fn reply_body(&self, method: Method, prefix: &str, status: u16, body: &str) {
        self.reply(method, prefix, Ok(HttpResponse::new(status, body)));
    }

    pub fn reply_failure(&self, method: Method, prefix: &str, failure: TransportFailure) {
        self.reply(method, prefix, Err(failure));
    }

    /// All requests issued so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().clone()
    }

    /// Number of issued requests whose path starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Reply {
        let request = RecordedRequest {
            method,
            path: path.to_string(),
            body,
        };
        self.log.lock().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock();
            routes
                .iter_mut()
                .filter(|r| r.method == method && path.starts_with(&r.prefix))
                .find_map(|r| r.replies.pop_front())
        };

        // Announce after the reply is claimed, so a test that queues the
        // next reply on seeing this request cannot race the lookup above.
        let _ = self.tx.send(request);

        match reply {
            Some(Queued::Ready(reply)) => reply,
            Some(Queued::Deferred(rx)) => match rx.await {
                Ok(reply) => reply,
                Err(_) => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, path: &str) -> Reply {
        self.exchange(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Reply {
        self.exchange(Method::Post, path, Some(body.clone())).await
    }
}

impl MockTransportHandle {
    /// Wait for the next request the client issues.
    pub async fn recv(&mut self) -> RecordedRequest {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("transport dropped")
    }

    /// Wait until a request whose path starts with `prefix` arrives,
    /// skipping any others.
    pub async fn recv_path(&mut self, prefix: &str) -> RecordedRequest {
        loop {
            let request = self.recv().await;
            if request.path.starts_with(prefix) {
                return request;
            }
        }
    }
}
