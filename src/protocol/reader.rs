//! Blocking extraction of primitive values from the simulator stream.

use std::io::{self, BufRead};

use serde::{Deserialize, Serialize};

/// Byte order of IEEE-754 doubles on the wire.
///
/// The simulator dumps doubles in its own memory layout, so the player has to
/// be told which platform produced the stream. Integers are always big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatOrder {
    /// Same byte order as the machine running the player.
    #[default]
    Native,
    Big,
    Little,
}

impl FloatOrder {
    pub fn decode(self, bytes: [u8; 8]) -> f64 {
        match self {
            FloatOrder::Native => f64::from_ne_bytes(bytes),
            FloatOrder::Big => f64::from_be_bytes(bytes),
            FloatOrder::Little => f64::from_le_bytes(bytes),
        }
    }

    pub fn encode(self, value: f64) -> [u8; 8] {
        match self {
            FloatOrder::Native => value.to_ne_bytes(),
            FloatOrder::Big => value.to_be_bytes(),
            FloatOrder::Little => value.to_le_bytes(),
        }
    }
}

/// Failure to pull bytes out of the stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Unexpected end of stream at byte {offset} (wanted {wanted} more bytes)")]
    UnexpectedEof { offset: u64, wanted: usize },
    #[error("Error while reading from stream at byte {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("String at byte {offset} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        offset: u64,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Buffered reader for the simulator's primitive encodings.
///
/// Every read blocks until the requested bytes are available. A stream that
/// ends mid-value is an error: the protocol has no resynchronisation point.
pub struct ByteReader<R> {
    inner: R,
    float_order: FloatOrder,
    offset: u64,
}

impl<R: BufRead> ByteReader<R> {
    pub fn new(inner: R, float_order: FloatOrder) -> Self {
        Self {
            inner,
            float_order,
            offset: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Block until at least one byte is buffered.
    ///
    /// Returns `Ok(false)` when the stream is exhausted, which is a clean end
    /// of playback rather than an error.
    pub fn wait_ready(&mut self) -> Result<bool, StreamError> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(!buf.is_empty()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(StreamError::Io {
                        offset: self.offset,
                        source,
                    });
                }
            }
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StreamError> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        self.inner.read_exact(buf).map_err(|source| {
            if source.kind() == io::ErrorKind::UnexpectedEof {
                StreamError::UnexpectedEof {
                    offset: self.offset,
                    wanted: buf.len(),
                }
            } else {
                StreamError::Io {
                    offset: self.offset,
                    source,
                }
            }
        })?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, StreamError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, StreamError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, StreamError> {
        let bytes = self.read_array()?;
        Ok(self.float_order.decode(bytes))
    }

    /// Read a u16 length followed by that many bytes of UTF-8.
    ///
    /// Invalid UTF-8 is rejected: the value names a resource, and a lossy
    /// decode would name a different file.
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let len = self.read_u16()? as usize;
        let offset = self.offset;
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        String::from_utf8(buf).map_err(|source| StreamError::InvalidUtf8 { offset, source })
    }
}
