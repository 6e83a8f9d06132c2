//! Request/response envelope. Only `api_version = 0` is spoken, so unlike the
//! original flexible-version protocol there is no per-field version gating here.

use std::io::{Read, Write};

use crate::codec::{ReadError, ReadType, WriteError, WriteType};
use crate::protocol::api_key::ApiKey;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct RequestHeader {
    pub api_key: ApiKey,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: String,
}

impl ReadType for RequestHeader {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            api_key: ApiKey::from(i16::read(reader)?),
            api_version: i16::read(reader)?,
            correlation_id: i32::read(reader)?,
            client_id: String::read(reader)?,
        })
    }
}

impl WriteType for RequestHeader {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        i16::from(self.api_key).write(writer)?;
        self.api_version.write(writer)?;
        self.correlation_id.write(writer)?;
        self.client_id.write(writer)?;
        Ok(())
    }
}
