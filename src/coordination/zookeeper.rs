//! ZooKeeper-backed [`CoordinationClient`].

use std::time::Duration;

use tracing::{info, warn};
use zookeeper::{WatchedEvent, Watcher, ZooKeeper};

use super::{CoordinationClient, Error};

/// Watcher that only logs session events; the hot path never blocks on it.
struct LoggingWatcher;

impl Watcher for LoggingWatcher {
    fn handle(&self, event: WatchedEvent) {
        let event_type = event.event_type;
        let keeper_state = event.keeper_state;
        info!(?event_type, ?keeper_state, path = ?event.path, "zookeeper session event");
    }
}

/// Holds one ZooKeeper session, established once per [`crate::Producer`] lifetime.
pub struct ZookeeperCoordinationClient {
    zk: ZooKeeper,
}

impl ZookeeperCoordinationClient {
    /// Connects to `connect_string` (e.g. `"zk1:2181,zk2:2181/kafka"`), failing with
    /// [`Error::Init`] if the ensemble is unreachable or the session does not establish
    /// within `session_timeout`.
    pub fn connect(connect_string: &str, session_timeout: Duration) -> Result<Self, Error> {
        let zk = ZooKeeper::connect(connect_string, session_timeout, LoggingWatcher)
            .map_err(|e| Error::Init(e.to_string()))?;
        Ok(Self { zk })
    }
}

impl CoordinationClient for ZookeeperCoordinationClient {
    fn list_children(&self, path: &str) -> Result<Vec<String>, Error> {
        self.zk
            .get_children(path, false)
            .map_err(|e| Error::Lookup {
                path: path.to_string(),
                source: e.to_string(),
            })
    }

    fn get_data(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.zk
            .get_data(path, false)
            .map(|(data, _stat)| data)
            .map_err(|e| Error::Lookup {
                path: path.to_string(),
                source: e.to_string(),
            })
    }
}

impl Drop for ZookeeperCoordinationClient {
    fn drop(&mut self) {
        if let Err(e) = self.zk.close() {
            warn!(error = %e, "failed to close zookeeper session cleanly");
        }
    }
}
