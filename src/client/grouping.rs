//! Grouping transform: binds each message to a concrete (broker, topic, partition)
//! triple and folds the result into the three-level shape the dispatcher needs.

use std::collections::HashMap;

use rand::Rng;

use crate::connection::topology::Topology;
use crate::message::Message;

/// The three-level `{broker -> {topic -> {partition -> [message]}}}` map a send-batch
/// call serializes one produce-request per top-level entry.
pub(crate) type Grouping<'a> = HashMap<i32, HashMap<String, HashMap<i32, Vec<&'a Message>>>>;

/// Why a message did not make it into the grouping this attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ungrouped {
    /// The topic is not known to the current topology. No retry will recover it, so
    /// this is terminal.
    UnknownTopic,
    /// The chosen partition's leader is unresolved (a non-zero metadata error left it
    /// unset). This *is* retried after the next topology refresh.
    LeaderUnresolved,
}

/// Picks a partition for `topic` uniformly at random over `[0, num_partitions)`,
/// regardless of the message's key: this producer never hashes a key into a partition
/// choice, it only carries the key through to the wire for consumers to see.
fn choose_partition(num_partitions: i32) -> i32 {
    debug_assert!(num_partitions > 0);
    rand::thread_rng().gen_range(0..num_partitions)
}

/// Every message that was placed or considered for placement this attempt, tagged
/// with the (topic, partition) it was assigned to (`None` when the topic itself was
/// unknown, so no partition could even be chosen). The retry controller uses this
/// to compute which messages belong in `remaining` for the next attempt.
pub(crate) struct GroupingResult<'a> {
    pub grouping: Grouping<'a>,
    pub ungrouped: Vec<(&'a Message, String, Option<i32>, Ungrouped)>,
    pub assignments: Vec<(&'a Message, String, i32)>,
}

/// Builds the grouping for one send attempt. Returns the grouping alongside every
/// message that could not be placed, tagged with why.
pub(crate) fn build<'a>(topology: &Topology, messages: &[&'a Message]) -> GroupingResult<'a> {
    let mut grouping: Grouping<'a> = HashMap::new();
    let mut ungrouped = Vec::new();
    let mut assignments = Vec::new();

    for &message in messages {
        let Some(topic_meta) = topology.topic(&message.topic) else {
            ungrouped.push((message, message.topic.clone(), None, Ungrouped::UnknownTopic));
            continue;
        };

        if topic_meta.num_partitions <= 0 {
            ungrouped.push((message, message.topic.clone(), None, Ungrouped::UnknownTopic));
            continue;
        }

        let partition_id = choose_partition(topic_meta.num_partitions);
        assignments.push((message, message.topic.clone(), partition_id));
        let partition = topic_meta.partitions.get(&partition_id);

        let leader = partition.and_then(|p| p.leader);
        let Some(leader_id) = leader else {
            ungrouped.push((
                message,
                message.topic.clone(),
                Some(partition_id),
                Ungrouped::LeaderUnresolved,
            ));
            continue;
        };

        grouping
            .entry(leader_id)
            .or_default()
            .entry(message.topic.clone())
            .or_default()
            .entry(partition_id)
            .or_default()
            .push(message);
    }

    GroupingResult {
        grouping,
        ungrouped,
        assignments,
    }
}
