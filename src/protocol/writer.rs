//! Producer-side encoder for the simulator protocol.

use std::io::{self, Write};

use super::message::{InitMessage, Message};
use super::reader::FloatOrder;

/// Writes the handshake and tagged messages in the layout the player reads.
///
/// Usage:
/// ```
/// use crowd_player::protocol::{FloatOrder, Message, MessageWriter};
///
/// let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Big);
/// writer.write_message(&Message::CurrentTime { timestamp: 0.5 }).unwrap();
/// assert_eq!(writer.into_inner().len(), 9);
/// ```
pub struct MessageWriter<W> {
    inner: W,
    float_order: FloatOrder,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(inner: W, float_order: FloatOrder) -> Self {
        Self { inner, float_order }
    }

    pub fn write_handshake(&mut self, init: &InitMessage) -> io::Result<()> {
        self.write_string(&init.scene_file)?;
        self.write_f64(init.scene_scale)?;
        self.write_f64(init.density_min)?;
        self.write_f64(init.density_max)?;
        Ok(())
    }

    pub fn write_message(&mut self, message: &Message) -> io::Result<()> {
        self.inner.write_all(&[message.tag()])?;
        match message {
            Message::CurrentTime { timestamp } => self.write_f64(*timestamp)?,
            Message::Locations { people } => {
                self.write_count(people.len())?;
                for person in people {
                    self.inner.write_all(&person.x.to_be_bytes())?;
                    self.inner.write_all(&person.y.to_be_bytes())?;
                    self.write_f64(person.heading)?;
                }
            }
            Message::DensityMap { cells } => {
                self.write_count(cells.len())?;
                for cell in cells {
                    self.inner.write_all(&cell.x.to_be_bytes())?;
                    self.inner.write_all(&cell.y.to_be_bytes())?;
                    self.write_f64(cell.density)?;
                }
            }
            Message::Statistics(stats) => {
                self.write_f64(stats.min)?;
                self.write_f64(stats.max)?;
                self.inner.write_all(&stats.count.to_be_bytes())?;
                self.write_f64(stats.avg)?;
                self.write_f64(stats.variance)?;
                self.write_f64(stats.std_deviation)?;
            }
            // A bare tag byte, as a misbehaving producer would send it.
            Message::Unknown { .. } => {}
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_count(&mut self, len: usize) -> io::Result<()> {
        let count = i32::try_from(len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Block of {} elements does not fit an i32 count", len),
            )
        })?;
        self.inner.write_all(&count.to_be_bytes())
    }

    fn write_string(&mut self, s: &str) -> io::Result<()> {
        let len = u16::try_from(s.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("String of {} bytes is too long for a u16 prefix", s.len()),
            )
        })?;
        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(s.as_bytes())
    }

    fn write_f64(&mut self, value: f64) -> io::Result<()> {
        self.inner.write_all(&self.float_order.encode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DensitySample, PersonPose, Statistics};

    fn written(message: &Message) -> Vec<u8> {
        let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Big);
        writer.write_message(message).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_message_sizes() {
        assert_eq!(written(&Message::CurrentTime { timestamp: 1.0 }).len(), 9);
        assert_eq!(
            written(&Message::Locations {
                people: vec![PersonPose { x: 1, y: 2, heading: 0.0 }; 3]
            })
            .len(),
            1 + 4 + 3 * PersonPose::SIZE
        );
        assert_eq!(
            written(&Message::DensityMap {
                cells: vec![DensitySample { x: 1, y: 2, density: 0.0 }; 2]
            })
            .len(),
            1 + 4 + 2 * DensitySample::SIZE
        );
        assert_eq!(
            written(&Message::Statistics(Statistics {
                min: 0.0,
                max: 0.0,
                count: 0,
                avg: 0.0,
                variance: 0.0,
                std_deviation: 0.0,
            }))
            .len(),
            1 + 5 * 8 + 4
        );
        assert_eq!(written(&Message::Unknown { tag: 9 }), vec![9]);
    }

    #[test]
    fn test_handshake_bytes() {
        let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Big);
        writer
            .write_handshake(&InitMessage {
                scene_file: "ab".into(),
                scene_scale: 1.0,
                density_min: 0.0,
                density_max: 2.0,
            })
            .unwrap();
        let bytes = writer.into_inner();
        assert_eq!(&bytes[..4], &[0, 2, b'a', b'b']);
        assert_eq!(&bytes[4..12], &1.0f64.to_be_bytes());
        assert_eq!(bytes.len(), 4 + 3 * 8);
    }

    #[test]
    fn test_oversized_string_rejected() {
        let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Big);
        let err = writer
            .write_handshake(&InitMessage {
                scene_file: "x".repeat(70_000),
                scene_scale: 1.0,
                density_min: 0.0,
                density_max: 1.0,
            })
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
