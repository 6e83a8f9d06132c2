//! Dispatcher: issues one produce-request per broker for a grouping, and folds
//! per-(topic, partition) wire responses (plus any ungrouped messages from C7) into a
//! single outcome the retry controller can act on.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::client::grouping::{GroupingResult, Ungrouped};
use crate::connection::BrokerConnector;
use crate::message::Message;
use crate::protocol::messages::{ProduceRequest, ProduceRequestPartition, ProduceRequestTopic, WireMessage};
use crate::status::WireError;

/// A rejection that retrying cannot fix: either the topic was unknown to the topology,
/// or the broker returned one of the fatal wire codes.
#[derive(Debug, Clone)]
pub(crate) enum Rejection {
    UnknownTopic(String),
    Wire(WireError),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTopic(topic) => write!(f, "topic '{topic}' is not known to the cluster"),
            Self::Wire(err) => write!(f, "{err}"),
        }
    }
}

/// Outcome of one dispatch pass over a grouping (one send attempt).
pub(crate) struct DispatchOutcome<'a> {
    /// (topic, partition) pairs that failed in a way retrying might fix: missing broker,
    /// socket I/O error, or a non-fatal wire error.
    pub retry_partitions: HashSet<(String, i32)>,
    /// Messages that are never going to be retried, along with why.
    pub rejected: Vec<(&'a Message, Rejection)>,
}

impl DispatchOutcome<'_> {
    pub fn first_rejection(&self) -> Option<&Rejection> {
        self.rejected.first().map(|(_, r)| r)
    }
}

/// Runs one dispatch pass: builds and sends one produce-request per broker in
/// `result.grouping`, parses responses, and folds in `result.ungrouped` messages from
/// the grouping transform.
pub(crate) fn run<'a>(
    connector: &BrokerConnector,
    result: GroupingResult<'a>,
    acks: i16,
    timeout_ms: i32,
) -> DispatchOutcome<'a> {
    let GroupingResult { grouping, ungrouped, .. } = result;
    let mut retry_partitions = HashSet::new();
    let mut rejected = Vec::new();

    for (message, topic, partition, reason) in ungrouped {
        match reason {
            Ungrouped::UnknownTopic => rejected.push((message, Rejection::UnknownTopic(topic))),
            Ungrouped::LeaderUnresolved => {
                if let Some(partition) = partition {
                    retry_partitions.insert((topic, partition));
                }
            }
        }
    }

    for (broker_id, per_topic) in grouping {
        let known_broker = connector.with_topology(|t| t.brokers.contains_key(&broker_id));
        if !known_broker {
            warn!(broker_id, "broker missing from topology at dispatch time");
            for (topic, per_partition) in &per_topic {
                for partition_id in per_partition.keys() {
                    retry_partitions.insert((topic.clone(), *partition_id));
                }
            }
            continue;
        }

        let request = build_request(&per_topic, acks, timeout_ms);
        let expect_response = acks != 0;

        match connector.send_request(broker_id, &request, expect_response) {
            Ok(None) => {
                debug!(broker_id, "produce request sent without awaiting a response (ASYNC)");
            }
            Ok(Some(response)) => {
                for topic in response.topics {
                    for partition in topic.partitions {
                        let error = WireError::from(partition.error_code);
                        if error.is_ok() {
                            continue;
                        }

                        if error.is_fatal_to_message() {
                            if let Some(messages) = per_topic
                                .get(&topic.topic)
                                .and_then(|p| p.get(&partition.partition_id))
                            {
                                for message in messages {
                                    rejected.push((*message, Rejection::Wire(error)));
                                }
                            }
                        } else {
                            retry_partitions.insert((topic.topic.clone(), partition.partition_id));
                        }
                    }
                }
            }
            Err(e) => {
                warn!(broker_id, error = %e, "produce request failed, marking its partitions for retry");
                for (topic, per_partition) in &per_topic {
                    for partition_id in per_partition.keys() {
                        retry_partitions.insert((topic.clone(), *partition_id));
                    }
                }
            }
        }
    }

    DispatchOutcome {
        retry_partitions,
        rejected,
    }
}

fn build_request(
    per_topic: &std::collections::HashMap<String, std::collections::HashMap<i32, Vec<&Message>>>,
    acks: i16,
    timeout_ms: i32,
) -> ProduceRequest {
    let mut topics = Vec::with_capacity(per_topic.len());
    for (topic, per_partition) in per_topic {
        let mut partitions = Vec::with_capacity(per_partition.len());
        for (partition_id, messages) in per_partition {
            let wire_messages = messages
                .iter()
                .map(|m| WireMessage::new(m.key.clone(), m.value.clone()))
                .collect();
            partitions.push(ProduceRequestPartition {
                partition_id: *partition_id,
                messages: wire_messages,
            });
        }
        topics.push(ProduceRequestTopic {
            topic: topic.clone(),
            partitions,
        });
    }

    ProduceRequest {
        acks,
        timeout_ms,
        topics,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::connection::BrokerConnector;
    use crate::coordination::fake::FakeCoordinationClient;

    use super::*;

    fn empty_connector() -> BrokerConnector {
        BrokerConnector::new(Box::new(FakeCoordinationClient::new()), "test".to_string())
    }

    #[test]
    fn test_unknown_topic_ungrouped_message_is_rejected() {
        let message = Message::new("missing", b"v".to_vec());
        let result = GroupingResult {
            grouping: HashMap::new(),
            ungrouped: vec![(&message, "missing".to_string(), None, Ungrouped::UnknownTopic)],
            assignments: Vec::new(),
        };

        let connector = empty_connector();
        let outcome = run(&connector, result, 1, 1500);

        assert!(outcome.retry_partitions.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert!(matches!(outcome.rejected[0].1, Rejection::UnknownTopic(ref t) if t == "missing"));
    }

    #[test]
    fn test_unresolved_leader_ungrouped_message_becomes_retry_partition() {
        let message = Message::new("t", b"v".to_vec());
        let result = GroupingResult {
            grouping: HashMap::new(),
            ungrouped: vec![(&message, "t".to_string(), Some(2), Ungrouped::LeaderUnresolved)],
            assignments: Vec::new(),
        };

        let connector = empty_connector();
        let outcome = run(&connector, result, 1, 1500);

        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.retry_partitions, HashSet::from([("t".to_string(), 2)]));
    }

    #[test]
    fn test_dispatch_to_broker_missing_from_topology_marks_partitions_for_retry() {
        let message = Message::new("t", b"v".to_vec());
        let mut per_partition = HashMap::new();
        per_partition.insert(0, vec![&message]);
        let mut per_topic = HashMap::new();
        per_topic.insert("t".to_string(), per_partition);
        let mut grouping = HashMap::new();
        grouping.insert(7, per_topic);

        let result = GroupingResult {
            grouping,
            ungrouped: Vec::new(),
            assignments: vec![(&message, "t".to_string(), 0)],
        };

        let connector = empty_connector();
        let outcome = run(&connector, result, 1, 1500);

        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.retry_partitions, HashSet::from([("t".to_string(), 0)]));
    }

    #[test]
    fn test_build_request_groups_messages_under_their_partition() {
        let one = Message::new("t", b"one".to_vec());
        let two = Message::keyed("t", b"k".to_vec(), b"two".to_vec());

        let mut per_partition = HashMap::new();
        per_partition.insert(0, vec![&one, &two]);
        let mut per_topic = HashMap::new();
        per_topic.insert("t".to_string(), per_partition);

        let request = build_request(&per_topic, 1, 1500);

        assert_eq!(request.acks, 1);
        assert_eq!(request.timeout_ms, 1500);
        assert_eq!(request.topics.len(), 1);
        let topic = &request.topics[0];
        assert_eq!(topic.topic, "t");
        assert_eq!(topic.partitions.len(), 1);
        assert_eq!(topic.partitions[0].partition_id, 0);
        assert_eq!(topic.partitions[0].messages.len(), 2);
    }
}
