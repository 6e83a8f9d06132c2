//! Bootstrap coordination-service adapter: the external collaborator that hands the
//! producer its first list of broker endpoints.
//!
//! The core only ever talks to the small [`CoordinationClient`] trait, never
//! to a concrete ensemble client, so the dispatch/retry engine is testable without a running
//! ensemble — see [`fake::FakeCoordinationClient`] in tests.

pub mod zookeeper;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A connection string for the coordination ensemble, e.g. `"zk1:2181,zk2:2181/kafka"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationEndpoint(pub String);

impl fmt::Display for CoordinationEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CoordinationEndpoint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CoordinationEndpoint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Coordination ensemble unreachable or session init failed: {0}")]
    Init(String),

    #[error("Coordination lookup failed for path '{path}': {source}")]
    Lookup { path: String, source: String },

    #[error("Malformed broker descriptor at '{path}': {reason}")]
    MalformedDescriptor { path: String, reason: String },
}

/// Descriptor for one broker as published under the brokers-ids namespace.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct BrokerDescriptor {
    pub host: String,
    pub port: i32,
    #[serde(default)]
    pub id: Option<i32>,
}

/// Minimal surface the core needs from the coordination ensemble: list the children of a
/// namespace and fetch one child's raw payload. `/brokers/ids` is the only namespace the
/// bootstrap path reads today.
pub trait CoordinationClient: Send + Sync {
    fn list_children(&self, path: &str) -> Result<Vec<String>, Error>;
    fn get_data(&self, path: &str) -> Result<Vec<u8>, Error>;
}

pub(crate) const BROKER_IDS_PATH: &str = "/brokers/ids";

/// Enumerates `/brokers/ids` and parses each child's descriptor, skipping (with a traced
/// warning left to the caller) any id whose payload does not parse.
pub fn discover_brokers(
    client: &dyn CoordinationClient,
) -> Result<Vec<BrokerDescriptor>, Error> {
    let ids = client.list_children(BROKER_IDS_PATH)?;
    let mut brokers = Vec::with_capacity(ids.len());
    for id in ids {
        let path = format!("{BROKER_IDS_PATH}/{id}");
        let payload = client.get_data(&path)?;
        let mut descriptor: BrokerDescriptor =
            serde_json::from_slice(&payload).map_err(|e| Error::MalformedDescriptor {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if descriptor.id.is_none() {
            descriptor.id = id.parse().ok();
        }
        brokers.push(descriptor);
    }
    Ok(brokers)
}

/// Default session-establishment timeout used unless overridden via
/// `ProducerBuilder::coordination_session_timeout_ms`.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::{CoordinationClient, Error};

    /// In-memory stand-in for an ensemble, used by connection/client tests so they never
    /// need a running ZooKeeper.
    #[derive(Debug, Default)]
    pub struct FakeCoordinationClient {
        nodes: Mutex<HashMap<String, Vec<u8>>>,
        children: Mutex<HashMap<String, Vec<String>>>,
    }

    impl FakeCoordinationClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_broker(&self, id: i32, host: &str, port: i32) {
            let payload = serde_json::to_vec(&serde_json::json!({ "host": host, "port": port }))
                .expect("serializable descriptor");
            self.nodes
                .lock()
                .insert(format!("{}/{id}", super::BROKER_IDS_PATH), payload);
            self.children
                .lock()
                .entry(super::BROKER_IDS_PATH.to_string())
                .or_default()
                .push(id.to_string());
        }
    }

    impl CoordinationClient for FakeCoordinationClient {
        fn list_children(&self, path: &str) -> Result<Vec<String>, Error> {
            Ok(self.children.lock().get(path).cloned().unwrap_or_default())
        }

        fn get_data(&self, path: &str) -> Result<Vec<u8>, Error> {
            self.nodes
                .lock()
                .get(path)
                .cloned()
                .ok_or_else(|| Error::Lookup {
                    path: path.to_string(),
                    source: "no such node".to_string(),
                })
        }
    }

    #[test]
    fn test_discover_brokers_from_fake() {
        let fake = FakeCoordinationClient::new();
        fake.add_broker(1, "h1", 9092);
        fake.add_broker(2, "h2", 9093);

        let mut brokers = super::discover_brokers(&fake).unwrap();
        brokers.sort_by_key(|b| b.port);

        assert_eq!(brokers.len(), 2);
        assert_eq!(brokers[0].host, "h1");
        assert_eq!(brokers[1].port, 9093);
    }
}
