//! Request/response bodies and the envelope that frames them.

mod header;
pub mod metadata;
pub mod produce;

#[cfg(test)]
mod test_utils;

use std::io::{Cursor, Read};

use crate::buffer::GrowingBuffer;
use crate::codec::{ReadError, ReadType, WriteError, WriteType};
use crate::protocol::api_key::ApiKey;

pub use header::RequestHeader;
pub use metadata::{MetadataRequest, MetadataResponse, MetadataResponseBroker, MetadataResponsePartition, MetadataResponseTopic};
pub use produce::{ProduceRequest, ProduceResponse, ProduceResponsePartition, ProduceResponseTopic, WireMessage};

/// Ties a request body to the api key it is sent under and the response body shape it
/// expects back.
pub trait RequestBody: WriteType {
    type ResponseBody: ReadType;

    const API_KEY: ApiKey;
}

/// Serializes the full request frame: `request_size` is back-patched once the
/// header and body have been written.
pub fn encode_request<B>(body: &B, client_id: &str, correlation_id: i32) -> Result<Vec<u8>, WriteError>
where
    B: RequestBody,
{
    let mut buf = GrowingBuffer::new();

    let size_field = buf.position();
    buf.append(&0i32.to_be_bytes());

    let header = RequestHeader {
        api_key: B::API_KEY,
        api_version: 0,
        correlation_id,
        client_id: client_id.to_string(),
    };
    header.write(&mut buf)?;
    body.write(&mut buf)?;

    let body_len = i32::try_from(buf.position() - size_field - 4)?;
    buf.patch(size_field, &body_len.to_be_bytes());

    Ok(buf.into_vec())
}

/// Reads one full response frame (`int32 response_size` followed by exactly that many
/// bytes), then decodes the leading `correlation_id` and the api-specific body out of it
/// for both the Metadata and Produce APIs.
pub fn read_response<R, B>(reader: &mut R) -> Result<(i32, B), ReadError>
where
    R: Read,
    B: ReadType,
{
    let size = i32::read(reader)?;
    let size = usize::try_from(size)
        .map_err(|_| ReadError::Malformed(format!("negative response_size: {size}").into()))?;

    let mut buf = vec![0u8; size];
    reader.read_exact(&mut buf)?;

    let mut cursor = Cursor::new(buf);
    let correlation_id = i32::read(&mut cursor)?;
    let body = B::read(&mut cursor)?;

    Ok((correlation_id, body))
}
