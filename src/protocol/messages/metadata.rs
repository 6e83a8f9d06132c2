//! Metadata request/response bodies.

use std::io::{Read, Write};

use super::RequestBody;
use crate::codec::{ReadError, ReadType, WriteError, WriteType};
use crate::protocol::api_key::ApiKey;

/// `topics = None` requests metadata for every topic the broker knows about.
#[derive(Debug, Default)]
pub struct MetadataRequest {
    pub topics: Option<Vec<String>>,
}

impl WriteType for MetadataRequest {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        let topics = self.topics.as_deref().unwrap_or(&[]);
        let len = i32::try_from(topics.len())?;
        len.write(writer)?;
        for topic in topics {
            topic.write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for MetadataRequest {
    type ResponseBody = MetadataResponse;

    const API_KEY: ApiKey = ApiKey::Metadata;
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponseBroker {
    pub node_id: i32,
    pub host: String,
    pub port: i32,
}

impl ReadType for MetadataResponseBroker {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            node_id: i32::read(reader)?,
            host: String::read(reader)?,
            port: i32::read(reader)?,
        })
    }
}

impl WriteType for MetadataResponseBroker {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        self.node_id.write(writer)?;
        self.host.write(writer)?;
        self.port.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponsePartition {
    pub partition_error: i16,
    pub partition_id: i32,
    pub leader_id: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

impl ReadType for MetadataResponsePartition {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let partition_error = i16::read(reader)?;
        let partition_id = i32::read(reader)?;
        let leader_id = i32::read(reader)?;

        let num_replicas = i32::read(reader)?;
        let num_replicas = usize::try_from(num_replicas)
            .map_err(|_| ReadError::Malformed("negative replica count".into()))?;
        let mut replicas = Vec::with_capacity(num_replicas);
        for _ in 0..num_replicas {
            replicas.push(i32::read(reader)?);
        }

        let num_isr = i32::read(reader)?;
        let num_isr = usize::try_from(num_isr)
            .map_err(|_| ReadError::Malformed("negative isr count".into()))?;
        let mut isr = Vec::with_capacity(num_isr);
        for _ in 0..num_isr {
            isr.push(i32::read(reader)?);
        }

        Ok(Self {
            partition_error,
            partition_id,
            leader_id,
            replicas,
            isr,
        })
    }
}

impl WriteType for MetadataResponsePartition {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_error.write(writer)?;
        self.partition_id.write(writer)?;
        self.leader_id.write(writer)?;

        i32::try_from(self.replicas.len())?.write(writer)?;
        for replica in &self.replicas {
            replica.write(writer)?;
        }

        i32::try_from(self.isr.len())?.write(writer)?;
        for isr in &self.isr {
            isr.write(writer)?;
        }

        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponseTopic {
    pub topic_error: i16,
    pub topic: String,
    pub partitions: Vec<MetadataResponsePartition>,
}

impl ReadType for MetadataResponseTopic {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let topic_error = i16::read(reader)?;
        let topic = String::read(reader)?;

        let num_partitions = i32::read(reader)?;
        let num_partitions = usize::try_from(num_partitions)
            .map_err(|_| ReadError::Malformed("negative partition count".into()))?;
        let mut partitions = Vec::with_capacity(num_partitions);
        for _ in 0..num_partitions {
            partitions.push(MetadataResponsePartition::read(reader)?);
        }

        Ok(Self {
            topic_error,
            topic,
            partitions,
        })
    }
}

impl WriteType for MetadataResponseTopic {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topic_error.write(writer)?;
        self.topic.write(writer)?;

        i32::try_from(self.partitions.len())?.write(writer)?;
        for partition in &self.partitions {
            partition.write(writer)?;
        }

        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct MetadataResponse {
    pub brokers: Vec<MetadataResponseBroker>,
    pub topics: Vec<MetadataResponseTopic>,
}

impl ReadType for MetadataResponse {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let num_brokers = i32::read(reader)?;
        let num_brokers = usize::try_from(num_brokers)
            .map_err(|_| ReadError::Malformed("negative broker count".into()))?;
        let mut brokers = Vec::with_capacity(num_brokers);
        for _ in 0..num_brokers {
            brokers.push(MetadataResponseBroker::read(reader)?);
        }

        let num_topics = i32::read(reader)?;
        let num_topics = usize::try_from(num_topics)
            .map_err(|_| ReadError::Malformed("negative topic count".into()))?;
        let mut topics = Vec::with_capacity(num_topics);
        for _ in 0..num_topics {
            topics.push(MetadataResponseTopic::read(reader)?);
        }

        Ok(Self { brokers, topics })
    }
}

impl WriteType for MetadataResponse {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        i32::try_from(self.brokers.len())?.write(writer)?;
        for broker in &self.brokers {
            broker.write(writer)?;
        }

        i32::try_from(self.topics.len())?.write(writer)?;
        for topic in &self.topics {
            topic.write(writer)?;
        }

        Ok(())
    }
}
