//! Binary persistence primitives.
//!
//! Networks persist as a flat little-endian stream: a leading `int32` type
//! tag, `int32` node and link counts, a network-specific prefix, then the
//! payload of every node and every link in construction order. Primitives are
//! written through `bincode`'s legacy fixed-width encoding, which emits
//! exactly 4 bytes for an `i32` and 8 bytes for an `i64`/`f64`.

use crate::error::{NeuroError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Type tag stored at the head of every persisted network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    Adaline,
    BackProp,
    SelfOrganizing,
    Bam,
    BamSystem,
    EpochBackProp,
    RpropBackProp,
}

impl NetworkType {
    /// Integer tag written to the stream.
    pub fn tag(self) -> i32 {
        match self {
            NetworkType::Adaline => 0,
            NetworkType::BackProp => 1,
            NetworkType::SelfOrganizing => 2,
            NetworkType::Bam => 3,
            NetworkType::BamSystem => 4,
            NetworkType::EpochBackProp => 5,
            NetworkType::RpropBackProp => 6,
        }
    }

    /// Decode an integer tag.
    pub fn from_tag(tag: i32) -> Result<Self> {
        Ok(match tag {
            0 => NetworkType::Adaline,
            1 => NetworkType::BackProp,
            2 => NetworkType::SelfOrganizing,
            3 => NetworkType::Bam,
            4 => NetworkType::BamSystem,
            5 => NetworkType::EpochBackProp,
            6 => NetworkType::RpropBackProp,
            other => {
                return Err(NeuroError::InvalidFormat(format!(
                    "unknown network type tag {}",
                    other
                )))
            }
        })
    }
}

/// Sequential writer for the persistence format.
pub(crate) struct Encoder<'a> {
    writer: &'a mut dyn Write,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(writer: &'a mut dyn Write) -> Self {
        Self { writer }
    }

    pub(crate) fn write_i32(&mut self, value: i32) -> Result<()> {
        bincode::serialize_into(&mut *self.writer, &value)?;
        Ok(())
    }

    pub(crate) fn write_i64(&mut self, value: i64) -> Result<()> {
        bincode::serialize_into(&mut *self.writer, &value)?;
        Ok(())
    }

    pub(crate) fn write_f64(&mut self, value: f64) -> Result<()> {
        bincode::serialize_into(&mut *self.writer, &value)?;
        Ok(())
    }

    /// Write a count or size as `int32`.
    pub(crate) fn write_count(&mut self, value: usize) -> Result<()> {
        let value = i32::try_from(value).map_err(|_| {
            NeuroError::InvalidParameter(format!("count {} does not fit in int32", value))
        })?;
        self.write_i32(value)
    }

    pub(crate) fn write_network_type(&mut self, network_type: NetworkType) -> Result<()> {
        self.write_i32(network_type.tag())
    }
}

/// Sequential reader for the persistence format.
pub(crate) struct Decoder<'a> {
    reader: &'a mut dyn Read,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(reader: &'a mut dyn Read) -> Self {
        Self { reader }
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        Ok(bincode::deserialize_from(&mut *self.reader)?)
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        Ok(bincode::deserialize_from(&mut *self.reader)?)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        Ok(bincode::deserialize_from(&mut *self.reader)?)
    }

    /// Read an `int32` count, rejecting negative values.
    pub(crate) fn read_count(&mut self, what: &str) -> Result<usize> {
        let value = self.read_i32()?;
        usize::try_from(value)
            .map_err(|_| NeuroError::InvalidFormat(format!("negative {} ({})", what, value)))
    }

    /// Read exactly `len` bytes. The buffer grows only as data arrives, so a
    /// bogus length cannot force a large allocation.
    pub(crate) fn read_block(&mut self, len: usize) -> Result<Vec<u8>> {
        let limit = u64::try_from(len)
            .map_err(|_| NeuroError::InvalidFormat(format!("payload of {} bytes", len)))?;
        let mut block = Vec::new();
        Read::take(&mut *self.reader, limit).read_to_end(&mut block)?;
        if block.len() != len {
            return Err(NeuroError::InvalidFormat(format!(
                "stream ends after {} of {} payload bytes",
                block.len(),
                len
            )));
        }
        Ok(block)
    }

    pub(crate) fn read_network_type(&mut self) -> Result<NetworkType> {
        NetworkType::from_tag(self.read_i32()?)
    }

    /// Read the leading tag and fail with `FormatMismatch` if it is not `expected`.
    pub(crate) fn expect_network_type(&mut self, expected: NetworkType) -> Result<()> {
        let found = self.read_network_type()?;
        if found != expected {
            return Err(NeuroError::FormatMismatch { expected, found });
        }
        Ok(())
    }
}
