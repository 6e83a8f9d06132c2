//! In-memory snapshot of the cluster: brokers and topic/partition metadata.
//!
//! Brokers are stored in a flat map keyed by id; partitions hold the *id* of their leader
//! rather than an owning reference, so the topology has no ownership cycles and tolerates
//! broker replacement across a refresh.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::net::TcpStream;

use crate::protocol::messages::{MetadataResponse, MetadataResponseBroker, MetadataResponsePartition, MetadataResponseTopic};

#[derive(Debug)]
pub struct Broker {
    pub id: i32,
    pub host: String,
    pub port: i32,
    connection: Option<TcpStream>,
}

impl Broker {
    fn new(id: i32, host: String, port: i32) -> Self {
        Self {
            id,
            host,
            port,
            connection: None,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns this broker's connection, opening a blocking TCP connection on first use.
    pub fn connection(&mut self) -> std::io::Result<&mut TcpStream> {
        if self.connection.is_none() {
            let stream = TcpStream::connect(self.addr())?;
            stream.set_nodelay(true)?;
            self.connection = Some(stream);
        }
        Ok(self.connection.as_mut().expect("just inserted"))
    }

    fn close(&mut self) {
        self.connection = None;
    }
}

impl Display for Broker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<&MetadataResponseBroker> for Broker {
    fn from(b: &MetadataResponseBroker) -> Self {
        Self::new(b.node_id, b.host.clone(), b.port)
    }
}

/// Invariant: `leader` (when present) names an id in `replicas`; `isr` is a subset of
/// `replicas`. A non-zero `error` may leave `leader` unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionMeta {
    pub partition_id: i32,
    pub leader: Option<i32>,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub error: i16,
}

impl From<MetadataResponsePartition> for PartitionMeta {
    fn from(p: MetadataResponsePartition) -> Self {
        let leader = (p.partition_error == 0).then_some(p.leader_id);
        Self {
            partition_id: p.partition_id,
            leader,
            replicas: p.replicas,
            isr: p.isr,
            error: p.partition_error,
        }
    }
}

/// Invariant: `partitions.len() == num_partitions as usize` when `error == 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicMeta {
    pub topic: String,
    pub num_partitions: i32,
    pub partitions: HashMap<i32, PartitionMeta>,
    pub error: i16,
}

impl From<MetadataResponseTopic> for TopicMeta {
    fn from(t: MetadataResponseTopic) -> Self {
        let num_partitions = i32::try_from(t.partitions.len()).unwrap_or(i32::MAX);
        let partitions = t
            .partitions
            .into_iter()
            .map(|p| (p.partition_id, PartitionMeta::from(p)))
            .collect();
        Self {
            topic: t.topic,
            num_partitions,
            partitions,
            error: t.topic_error,
        }
    }
}

/// Rebuilt atomically as a unit by [`crate::connection::BrokerConnector`]; the old topology
/// is only torn down once a new one has replaced it (no concurrent readers exist
/// within the core).
#[derive(Debug, Default)]
pub struct Topology {
    pub brokers: HashMap<i32, Broker>,
    pub topics: HashMap<String, TopicMeta>,
}

impl Topology {
    pub fn from_metadata(response: MetadataResponse) -> Self {
        let mut brokers = HashMap::with_capacity(response.brokers.len());
        for broker in &response.brokers {
            brokers.insert(broker.node_id, Broker::from(broker));
        }

        let mut topics = HashMap::with_capacity(response.topics.len());
        for topic in response.topics {
            topics.insert(topic.topic.clone(), TopicMeta::from(topic));
        }

        Self { brokers, topics }
    }

    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }

    pub fn broker_mut(&mut self, id: i32) -> Option<&mut Broker> {
        self.brokers.get_mut(&id)
    }

    pub fn brokers(&self) -> impl Iterator<Item = &Broker> {
        self.brokers.values()
    }

    pub fn topic(&self, name: &str) -> Option<&TopicMeta> {
        self.topics.get(name)
    }

    /// Closes every broker connection this topology owns. Called immediately before a
    /// topology is discarded in favor of a freshly bootstrapped one.
    pub fn teardown(&mut self) {
        for broker in self.brokers.values_mut() {
            broker.close();
        }
    }
}
