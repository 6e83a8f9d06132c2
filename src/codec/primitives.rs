//! Primitive wire types shared by every request and response body.
//!
//! Two string conventions are used throughout the protocol:
//!
//! - a **short-string** (`int16` length followed by raw bytes) is represented as a plain
//!   [`String`];
//! - a **byte-string** (`int32` length followed by raw bytes, `-1` meaning absent) is
//!   represented as `Option<Vec<u8>>`.

use std::io::{Read, Write};

use super::traits::{ReadError, ReadType, WriteError, WriteType};

impl ReadType for i8 {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(i8::from_be_bytes(buf))
    }
}

impl WriteType for i8 {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        writer.write_all(&self.to_be_bytes())?;
        Ok(())
    }
}

impl ReadType for i16 {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }
}

impl WriteType for i16 {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        writer.write_all(&self.to_be_bytes())?;
        Ok(())
    }
}

impl ReadType for i32 {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }
}

impl WriteType for i32 {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        writer.write_all(&self.to_be_bytes())?;
        Ok(())
    }
}

impl ReadType for i64 {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }
}

impl WriteType for i64 {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        writer.write_all(&self.to_be_bytes())?;
        Ok(())
    }
}

// SHORT_STRING: int16 length ++ utf8 bytes, no null terminator.
impl ReadType for String {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let len = i16::read(reader)?;
        let len = usize::try_from(len)
            .map_err(|_| ReadError::Malformed(format!("negative short-string length: {len}").into()))?;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| ReadError::Malformed(format!("invalid utf8 in short-string: {e}").into()))
    }
}

impl WriteType for String {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i16::try_from(self.len())?;
        len.write(writer)?;
        writer.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl WriteType for str {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i16::try_from(self.len())?;
        len.write(writer)?;
        writer.write_all(self.as_bytes())?;
        Ok(())
    }
}

// BYTE_STRING: int32 length ++ raw bytes, -1 meaning absent (not zero-length).
impl ReadType for Option<Vec<u8>> {
    fn read<R: Read>(reader: &mut R) -> Result<Self, ReadError> {
        let len = i32::read(reader)?;
        match len {
            -1 => Ok(None),
            l if l < -1 => Err(ReadError::Malformed(
                format!("invalid negative byte-string length: {l}").into(),
            )),
            l => {
                let len = usize::try_from(l)?;
                let mut buf = vec![0u8; len];
                reader.read_exact(&mut buf)?;
                Ok(Some(buf))
            }
        }
    }
}

impl WriteType for Option<Vec<u8>> {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        match self {
            Some(bytes) => {
                let len = i32::try_from(bytes.len())?;
                len.write(writer)?;
                writer.write_all(bytes)?;
                Ok(())
            }
            None => (-1i32).write(writer),
        }
    }
}

impl WriteType for Option<&[u8]> {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteError> {
        match self {
            Some(bytes) => {
                let len = i32::try_from(bytes.len())?;
                len.write(writer)?;
                writer.write_all(bytes)?;
                Ok(())
            }
            None => (-1i32).write(writer),
        }
    }
}

/// Computes the standard IEEE CRC-32 (poly `0xEDB88320`, init `0`, no final XOR) over `data`.
///
/// This is the checksum the broker expects over each message's `crc`-covered span.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
