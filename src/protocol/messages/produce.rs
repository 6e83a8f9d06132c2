//! Produce request/response bodies.

use std::io::{Cursor, Read, Write};

use super::RequestBody;
use crate::codec::{crc32, ReadError, ReadType, WriteError, WriteType};
use crate::protocol::api_key::ApiKey;

/// One message inside a message-set. `offset` is always `0` on the way out; it is kept
/// as a field (rather than hardcoded) so values read back off the wire round-trip too.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct WireMessage {
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

impl WireMessage {
    pub fn new(key: Option<Vec<u8>>, value: Vec<u8>) -> Self {
        Self {
            offset: 0,
            key,
            value,
        }
    }

    /// magic ‖ attributes ‖ key ‖ value — the span the CRC covers.
    fn encode_body(&self) -> Result<Vec<u8>, WriteError> {
        let mut body = Vec::new();
        0i8.write(&mut body)?; // magic
        0i8.write(&mut body)?; // attributes
        self.key.write(&mut body)?;
        Some(self.value.as_slice()).write(&mut body)?;
        Ok(body)
    }
}

impl ReadType for WireMessage {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let offset = i64::read(reader)?;
        let message_size = i32::read(reader)?;
        let message_size = usize::try_from(message_size)
            .map_err(|_| ReadError::Malformed("negative message_size".into()))?;

        let mut message_buf = vec![0u8; message_size];
        reader.read_exact(&mut message_buf)?;
        let mut cursor = Cursor::new(message_buf);

        let crc = i32::read(&mut cursor)?;
        let body_start = cursor.position() as usize;
        let body = &cursor.get_ref()[body_start..];
        let computed = crc32(body) as i32;
        if computed != crc {
            return Err(ReadError::Malformed(
                format!("crc mismatch: expected {crc:#x}, computed {computed:#x}").into(),
            ));
        }

        let magic = i8::read(&mut cursor)?;
        if magic != 0 {
            return Err(ReadError::Malformed(format!("unsupported magic byte: {magic}").into()));
        }
        let _attributes = i8::read(&mut cursor)?;
        let key = Option::<Vec<u8>>::read(&mut cursor)?;
        let value = Option::<Vec<u8>>::read(&mut cursor)?
            .ok_or_else(|| ReadError::Malformed("message value must not be absent".into()))?;

        Ok(Self { offset, key, value })
    }
}

impl WriteType for WireMessage {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        let body = self.encode_body()?;
        let crc = crc32(&body) as i32;

        // message_size counts crc + magic + attributes + key + value, i.e. everything
        // after the message_size field itself.
        let message_size = i32::try_from(4 + body.len())?;

        self.offset.write(writer)?;
        message_size.write(writer)?;
        crc.write(writer)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ProduceRequestPartition {
    pub partition_id: i32,
    pub messages: Vec<WireMessage>,
}

impl ReadType for ProduceRequestPartition {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let partition_id = i32::read(reader)?;
        let message_set_size = i32::read(reader)?;
        let message_set_size = usize::try_from(message_set_size)
            .map_err(|_| ReadError::Malformed("negative message_set_size".into()))?;

        let mut set_buf = vec![0u8; message_set_size];
        reader.read_exact(&mut set_buf)?;
        let mut cursor = Cursor::new(set_buf);

        let mut messages = Vec::new();
        while (cursor.position() as usize) < cursor.get_ref().len() {
            messages.push(WireMessage::read(&mut cursor)?);
        }

        Ok(Self {
            partition_id,
            messages,
        })
    }
}

impl WriteType for ProduceRequestPartition {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        let mut message_set = Vec::new();
        for message in &self.messages {
            message.write(&mut message_set)?;
        }

        self.partition_id.write(writer)?;
        i32::try_from(message_set.len())?.write(writer)?;
        writer.write_all(&message_set)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ProduceRequestTopic {
    pub topic: String,
    pub partitions: Vec<ProduceRequestPartition>,
}

impl ReadType for ProduceRequestTopic {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let topic = String::read(reader)?;
        let num_partitions = i32::read(reader)?;
        let num_partitions = usize::try_from(num_partitions)
            .map_err(|_| ReadError::Malformed("negative partition count".into()))?;
        let mut partitions = Vec::with_capacity(num_partitions);
        for _ in 0..num_partitions {
            partitions.push(ProduceRequestPartition::read(reader)?);
        }
        Ok(Self { topic, partitions })
    }
}

impl WriteType for ProduceRequestTopic {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
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
pub struct ProduceRequest {
    pub acks: i16,
    pub timeout_ms: i32,
    pub topics: Vec<ProduceRequestTopic>,
}

impl ReadType for ProduceRequest {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let acks = i16::read(reader)?;
        let timeout_ms = i32::read(reader)?;
        let num_topics = i32::read(reader)?;
        let num_topics = usize::try_from(num_topics)
            .map_err(|_| ReadError::Malformed("negative topic count".into()))?;
        let mut topics = Vec::with_capacity(num_topics);
        for _ in 0..num_topics {
            topics.push(ProduceRequestTopic::read(reader)?);
        }
        Ok(Self {
            acks,
            timeout_ms,
            topics,
        })
    }
}

impl WriteType for ProduceRequest {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        self.acks.write(writer)?;
        self.timeout_ms.write(writer)?;
        i32::try_from(self.topics.len())?.write(writer)?;
        for topic in &self.topics {
            topic.write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for ProduceRequest {
    type ResponseBody = ProduceResponse;

    const API_KEY: ApiKey = ApiKey::Produce;
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ProduceResponsePartition {
    pub partition_id: i32,
    pub error_code: i16,
    pub base_offset: i64,
}

impl ReadType for ProduceResponsePartition {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            partition_id: i32::read(reader)?,
            error_code: i16::read(reader)?,
            base_offset: i64::read(reader)?,
        })
    }
}

impl WriteType for ProduceResponsePartition {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        self.partition_id.write(writer)?;
        self.error_code.write(writer)?;
        self.base_offset.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ProduceResponseTopic {
    pub topic: String,
    pub partitions: Vec<ProduceResponsePartition>,
}

impl ReadType for ProduceResponseTopic {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let topic = String::read(reader)?;
        let num_partitions = i32::read(reader)?;
        let num_partitions = usize::try_from(num_partitions)
            .map_err(|_| ReadError::Malformed("negative partition count".into()))?;
        let mut partitions = Vec::with_capacity(num_partitions);
        for _ in 0..num_partitions {
            partitions.push(ProduceResponsePartition::read(reader)?);
        }
        Ok(Self { topic, partitions })
    }
}

impl WriteType for ProduceResponseTopic {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
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
pub struct ProduceResponse {
    pub topics: Vec<ProduceResponseTopic>,
}

impl ReadType for ProduceResponse {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let num_topics = i32::read(reader)?;
        let num_topics = usize::try_from(num_topics)
            .map_err(|_| ReadError::Malformed("negative topic count".into()))?;
        let mut topics = Vec::with_capacity(num_topics);
        for _ in 0..num_topics {
            topics.push(ProduceResponseTopic::read(reader)?);
        }
        Ok(Self { topics })
    }
}

impl WriteType for ProduceResponse {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        i32::try_from(self.topics.len())?.write(writer)?;
        for topic in &self.topics {
            topic.write(writer)?;
        }
        Ok(())
    }
}
