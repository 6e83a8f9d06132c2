mod support;

use libkafka_producer::coordination::CoordinationClient;
use libkafka_producer::protocol::messages::{
    MetadataResponse, MetadataResponseBroker, MetadataResponsePartition, MetadataResponseTopic,
    ProduceResponse, ProduceResponsePartition, ProduceResponseTopic,
};
use libkafka_producer::{Acks, Error, Message, ProducerBuilder, StatusCode};

use support::{MockBroker, SingleBrokerCoordination};

fn single_partition_topology(broker: &MockBroker, topic: &str, broker_id: i32) -> MetadataResponse {
    MetadataResponse {
        brokers: vec![MetadataResponseBroker {
            node_id: broker_id,
            host: broker.host(),
            port: broker.port(),
        }],
        topics: vec![MetadataResponseTopic {
            topic_error: 0,
            topic: topic.to_string(),
            partitions: vec![MetadataResponsePartition {
                partition_error: 0,
                partition_id: 0,
                leader_id: broker_id,
                replicas: vec![broker_id],
                isr: vec![broker_id],
            }],
        }],
    }
}

fn ok_response(topic: &str) -> ProduceResponse {
    ProduceResponse {
        topics: vec![ProduceResponseTopic {
            topic: topic.to_string(),
            partitions: vec![ProduceResponsePartition {
                partition_id: 0,
                error_code: 0,
                base_offset: 0,
            }],
        }],
    }
}

fn rejected_response(topic: &str, error_code: i16) -> ProduceResponse {
    ProduceResponse {
        topics: vec![ProduceResponseTopic {
            topic: topic.to_string(),
            partitions: vec![ProduceResponsePartition {
                partition_id: 0,
                error_code,
                base_offset: -1,
            }],
        }],
    }
}

fn build_producer(broker: &MockBroker) -> libkafka_producer::Producer {
    let coordination = Box::new(SingleBrokerCoordination::new(1, broker)) as Box<dyn CoordinationClient>;
    ProducerBuilder::new("unused connect string")
        .build_with_coordination(coordination)
        .expect("bootstrap against the mock broker")
}

#[test]
fn send_succeeds_against_a_healthy_broker() {
    let broker = MockBroker::start(MetadataResponse::default(), ok_response("orders"));
    broker.set_metadata_response(single_partition_topology(&broker, "orders", 1));

    let producer = build_producer(&broker);
    let result = producer.send(Message::new("orders", b"hello world".to_vec()), Acks::Sync);

    assert!(result.is_ok());
    assert_eq!(producer.status(), StatusCode::Ok);
    assert_eq!(broker.produce_requests_seen(), 1);
}

#[test]
fn async_acks_does_not_wait_for_a_response() {
    let broker = MockBroker::start(MetadataResponse::default(), ok_response("orders"));
    broker.set_metadata_response(single_partition_topology(&broker, "orders", 1));

    let producer = build_producer(&broker);
    let result = producer.send(Message::new("orders", b"fire and forget".to_vec()), Acks::Async);

    assert!(result.is_ok());
    assert_eq!(producer.status(), StatusCode::Ok);
}

#[test]
fn unknown_topic_is_rejected_without_contacting_a_broker() {
    let broker = MockBroker::start(MetadataResponse::default(), ok_response("orders"));
    broker.set_metadata_response(single_partition_topology(&broker, "orders", 1));

    let producer = build_producer(&broker);
    let err = producer
        .send(Message::new("does-not-exist", b"x".to_vec()), Acks::Sync)
        .unwrap_err();

    assert!(matches!(err, Error::UnknownTopic(ref t) if t == "does-not-exist"));
    assert_eq!(producer.status(), StatusCode::Unknown);
    assert_eq!(broker.produce_requests_seen(), 0);
}

#[test]
fn fatal_wire_error_is_rejected_without_retrying() {
    // MESSAGE_SIZE_TOO_LARGE (10) is fatal to the message; the controller must not retry it.
    let broker = MockBroker::start(MetadataResponse::default(), rejected_response("orders", 10));
    broker.set_metadata_response(single_partition_topology(&broker, "orders", 1));

    let producer = build_producer(&broker);
    let err = producer
        .send(Message::new("orders", vec![0u8; 16]), Acks::Sync)
        .unwrap_err();

    assert!(matches!(err, Error::Rejected(_)));
    assert_eq!(producer.status(), StatusCode::Unknown);
    assert_eq!(broker.produce_requests_seen(), 1);
}

#[test]
fn retryable_wire_error_eventually_exhausts_retries() {
    // NOT_LEADER_FOR_PARTITION (6) is retried; a broker that always returns it should
    // see exactly the bounded attempt count before the controller gives up.
    let broker = MockBroker::start(MetadataResponse::default(), rejected_response("orders", 6));
    broker.set_metadata_response(single_partition_topology(&broker, "orders", 1));

    let producer = build_producer(&broker);
    let err = producer
        .send(Message::new("orders", b"retry me".to_vec()), Acks::Sync)
        .unwrap_err();

    assert!(matches!(err, Error::RetryExhausted));
    assert_eq!(producer.status(), StatusCode::RetryExhausted);
    assert_eq!(broker.produce_requests_seen(), 4);
}

#[test]
fn batch_spanning_two_topics_reports_the_first_rejection_but_accepts_the_rest() {
    let broker = MockBroker::start(MetadataResponse::default(), ok_response("a"));
    let mut topology = single_partition_topology(&broker, "a", 1);
    topology.topics.push(MetadataResponseTopic {
        topic_error: 0,
        topic: "b".to_string(),
        partitions: vec![MetadataResponsePartition {
            partition_error: 0,
            partition_id: 0,
            leader_id: 1,
            replicas: vec![1],
            isr: vec![1],
        }],
    });
    broker.set_metadata_response(topology);

    let producer = build_producer(&broker);

    let mut set = libkafka_producer::MessageSet::new();
    set.push(Message::new("a", b"in topology".to_vec()));
    set.push(Message::new("missing", b"not in topology".to_vec()));

    let err = producer.send_batch(set, Acks::Sync).unwrap_err();
    assert!(matches!(err, Error::UnknownTopic(ref t) if t == "missing"));
}
