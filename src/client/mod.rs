//! Public API veneer and the retry controller that ties grouping and dispatch together
//! into `Producer::send`/`send_batch`.

pub mod error;
mod dispatch;
mod grouping;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use crate::coordination::{CoordinationClient, CoordinationEndpoint, DEFAULT_SESSION_TIMEOUT};
use crate::coordination::zookeeper::ZookeeperCoordinationClient;
use crate::connection::BrokerConnector;
use crate::message::{Message, MessageSet};
use crate::status::StatusCode;

pub use error::Error;
use error::Result;

/// Bounded attempt count for a single send call. Kept fixed rather than exposed via
/// [`ProducerBuilder`]; see the Open Questions decision recorded in DESIGN.md.
const MAX_ATTEMPTS: usize = 4;

const DEFAULT_CLIENT_ID: &str = "libkafka";
const DEFAULT_REQUEST_TIMEOUT_MS: i32 = 1500;

/// Acknowledgement policy for a send. Encoded on the wire as `int16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acks {
    /// No response; the broker does not wait for disk or replication.
    Async,
    /// Response after the leader has written to its local log.
    Sync,
    /// Response after all in-sync replicas have acknowledged.
    FullSync,
}

impl From<Acks> for i16 {
    fn from(acks: Acks) -> Self {
        match acks {
            Acks::Async => 0,
            Acks::Sync => 1,
            Acks::FullSync => -1,
        }
    }
}

/// Builder for [`Producer`]. The only supported construction path: `build()`
/// performs the bootstrap synchronously before returning.
pub struct ProducerBuilder {
    bootstrap: CoordinationEndpoint,
    client_id: Arc<str>,
    request_timeout_ms: i32,
    coordination_session_timeout_ms: Duration,
}

impl ProducerBuilder {
    pub fn new(bootstrap: impl Into<CoordinationEndpoint>) -> Self {
        Self {
            bootstrap: bootstrap.into(),
            client_id: Arc::from(DEFAULT_CLIENT_ID),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            coordination_session_timeout_ms: DEFAULT_SESSION_TIMEOUT,
        }
    }

    pub fn client_id(mut self, client_id: impl Into<Arc<str>>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn request_timeout_ms(mut self, request_timeout_ms: i32) -> Self {
        self.request_timeout_ms = request_timeout_ms;
        self
    }

    pub fn coordination_session_timeout_ms(mut self, ms: i32) -> Self {
        self.coordination_session_timeout_ms = Duration::from_millis(ms.max(0) as u64);
        self
    }

    /// Connects to the coordination ensemble, bootstraps topology, and returns
    /// an owned [`Producer`]. Fails with [`Error::Connection`] wrapping
    /// [`crate::connection::Error::Coordination`] if the ensemble is unreachable, or
    /// wrapping [`crate::connection::Error::MetadataUnavailable`] if no candidate
    /// broker yields a usable metadata response.
    pub fn build(self) -> Result<Producer> {
        let coordination = ZookeeperCoordinationClient::connect(&self.bootstrap.0, self.coordination_session_timeout_ms)
            .map(|c| Box::new(c) as Box<dyn CoordinationClient>)
            .map_err(crate::connection::Error::from)?;
        self.build_with_coordination(coordination)
    }

    /// Same as [`Self::build`], but with `coordination` used in place of a real
    /// ZooKeeper ensemble connection. The core only ever talks to the
    /// [`CoordinationClient`] trait, so any ensemble -- or an in-memory fake for
    /// tests -- can stand in here.
    pub fn build_with_coordination(self, coordination: Box<dyn CoordinationClient>) -> Result<Producer> {
        let connector = BrokerConnector::new(coordination, self.client_id.to_string());
        connector.bootstrap()?;

        Ok(Producer {
            connector,
            request_timeout_ms: self.request_timeout_ms,
            status: Mutex::new(StatusCode::Ok),
        })
    }
}

/// Owned handle to a bootstrapped topology and its broker connections. Construct with
/// [`ProducerBuilder`]. Dropping a `Producer` tears down the topology and its sockets.
pub struct Producer {
    connector: BrokerConnector,
    request_timeout_ms: i32,
    status: Mutex<StatusCode>,
}

impl Producer {
    /// The last bootstrap/send outcome.
    pub fn status(&self) -> StatusCode {
        *self.status.lock()
    }

    /// Sends a single message.
    pub fn send(&self, message: Message, acks: Acks) -> Result<()> {
        let mut set = MessageSet::new();
        set.push(message);
        self.send_batch(set, acks)
    }

    /// Sends a batch of messages. Returns the first non-OK
    /// outcome encountered, or `Ok(())` if every message was accepted by its partition
    /// leader according to `acks`.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub fn send_batch(&self, messages: MessageSet, acks: Acks) -> Result<()> {
        let owned: Vec<Message> = messages.into_iter().collect();
        let mut remaining: Vec<&Message> = owned.iter().collect();
        let wire_acks = i16::from(acks);

        let mut first_rejection: Option<dispatch::Rejection> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            // Build the grouping under the topology lock, then drop the lock before
            // dispatching: `dispatch::run` itself calls back into
            // `BrokerConnector::send_request`/`with_topology`, and the lock is not
            // reentrant.
            let result = self.connector.with_topology(|topology| grouping::build(topology, &remaining));
            let assignments = result.assignments.clone();
            let outcome = dispatch::run(&self.connector, result, wire_acks, self.request_timeout_ms);

            if first_rejection.is_none() {
                if let Some(r) = outcome.first_rejection() {
                    first_rejection = Some(r.clone());
                }
            }

            if outcome.retry_partitions.is_empty() {
                return self.finish(first_rejection);
            }

            info!(
                attempt,
                retry_partitions = outcome.retry_partitions.len(),
                rejected = outcome.rejected.len(),
                "refreshing topology before retry"
            );

            remaining = assignments
                .into_iter()
                .filter(|(_, topic, partition)| outcome.retry_partitions.contains(&(topic.clone(), *partition)))
                .map(|(message, _, _)| message)
                .collect();

            self.connector.teardown();
            if let Err(e) = self.connector.refresh() {
                warn!(error = %e, "topology refresh failed, aborting send");
                let err = Error::from(e);
                *self.status.lock() = err.status();
                return Err(err);
            }
        }

        *self.status.lock() = StatusCode::RetryExhausted;
        match first_rejection {
            Some(r) => Err(to_error(r)),
            None => Err(Error::RetryExhausted),
        }
    }

    fn finish(&self, rejection: Option<dispatch::Rejection>) -> Result<()> {
        match rejection {
            Some(r) => {
                let err = to_error(r);
                *self.status.lock() = err.status();
                Err(err)
            }
            None => {
                *self.status.lock() = StatusCode::Ok;
                Ok(())
            }
        }
    }
}

fn to_error(rejection: dispatch::Rejection) -> Error {
    match rejection {
        dispatch::Rejection::UnknownTopic(topic) => Error::UnknownTopic(topic),
        dispatch::Rejection::Wire(code) => Error::Rejected(code),
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.connector.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acks_wire_values() {
        assert_eq!(i16::from(Acks::Async), 0);
        assert_eq!(i16::from(Acks::Sync), 1);
        assert_eq!(i16::from(Acks::FullSync), -1i16);
    }
}
