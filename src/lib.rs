//! A minimal, blocking producer client for a partitioned, replicated log broker.
//!
//! A [`client::Producer`] discovers cluster topology from a coordination ensemble
//! (`coordination`), binds each outgoing [`message::Message`] to a concrete
//! (broker, topic, partition) triple, serializes batches into the broker's wire
//! format (`protocol`) and sends them over blocking TCP connections (`connection`),
//! refreshing topology and retrying affected messages on transient failure.
//!
//! ```no_run
//! use libkafka_producer::client::{Acks, ProducerBuilder};
//! use libkafka_producer::message::Message;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let producer = ProducerBuilder::new("zk1:2181/kafka").build()?;
//! producer.send(Message::new("events", b"hello world".to_vec()), Acks::Sync)?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod client;
pub mod codec;
pub mod connection;
pub mod coordination;
pub mod message;
pub mod protocol;
pub mod status;

pub use client::error::Error;
pub use client::{Acks, Producer, ProducerBuilder};
pub use message::{Message, MessageSet};
pub use status::StatusCode;
