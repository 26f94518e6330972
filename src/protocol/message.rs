//! Tagged messages and the decoder that pulls them off the stream.

use std::io::BufRead;

use log::{info, warn};

use super::reader::{ByteReader, StreamError};

/// Tag of a [`Message::CurrentTime`].
pub const CURRENT_TIME_TAG: u8 = 0;
/// Tag of a [`Message::Locations`].
pub const LOCATIONS_TAG: u8 = 1;
/// Tag of a [`Message::DensityMap`].
pub const DENSITY_MAP_TAG: u8 = 2;
/// Tag of a [`Message::Statistics`].
pub const STATISTICS_TAG: u8 = 3;

/// Elements allocated up front for a count-prefixed block, whatever the
/// announced count.
const PREALLOC_CAP: usize = 4096;

/// Scene description sent once before the first message.
#[derive(Debug, Clone, PartialEq)]
pub struct InitMessage {
    /// Background scene resource, as named by the simulator.
    pub scene_file: String,
    /// Pixels per simulation unit.
    pub scene_scale: f64,
    /// Densities at or below this are drawn fully faded.
    pub density_min: f64,
    /// Densities at or above this are drawn at full intensity.
    pub density_max: f64,
}

/// Pose of one simulated person.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonPose {
    /// Scene pixel column of the sprite centre.
    pub x: i16,
    /// Scene pixel row of the sprite centre.
    pub y: i16,
    /// Heading in radians.
    pub heading: f64,
}

impl PersonPose {
    /// Encoded size in bytes.
    pub const SIZE: usize = 12;
}

/// One sparse sample of the density field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensitySample {
    /// Scene pixel column.
    pub x: i16,
    /// Scene pixel row.
    pub y: i16,
    /// People per unit area around the pixel.
    pub density: f64,
}

impl DensitySample {
    /// Encoded size in bytes.
    pub const SIZE: usize = 12;
}

/// Travel-time statistics sent when the simulation finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Shortest travel time, in seconds.
    pub min: f64,
    /// Longest travel time, in seconds.
    pub max: f64,
    /// People who reached their destination.
    pub count: i32,
    /// Mean travel time.
    pub avg: f64,
    /// Population variance of the travel times.
    pub variance: f64,
    /// Square root of `variance`.
    pub std_deviation: f64,
}

/// A decoded message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Simulation time of the frame being assembled, in seconds.
    CurrentTime { timestamp: f64 },
    /// Poses of every person for one frame.
    Locations { people: Vec<PersonPose> },
    /// Replacement set of active density cells.
    DensityMap { cells: Vec<DensitySample> },
    /// Final statistics; nothing is read after this.
    Statistics(Statistics),
    /// A tag byte outside the known set. It carries no payload and is skipped.
    Unknown { tag: u8 },
}

impl Message {
    pub fn tag(&self) -> u8 {
        match self {
            Message::CurrentTime { .. } => CURRENT_TIME_TAG,
            Message::Locations { .. } => LOCATIONS_TAG,
            Message::DensityMap { .. } => DENSITY_MAP_TAG,
            Message::Statistics(_) => STATISTICS_TAG,
            Message::Unknown { tag } => *tag,
        }
    }
}

/// Bounds applied while decoding untrusted input.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    /// Largest element count accepted for a `Locations` or `DensityMap` block.
    pub max_elements: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_elements: 1 << 20,
        }
    }
}

/// Decoding failures. All of them end playback.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("Negative element count {count} in {kind} message")]
    NegativeCount { kind: &'static str, count: i32 },
    #[error("Element count {count} in {kind} message exceeds limit of {limit}")]
    CountTooLarge {
        kind: &'static str,
        count: u32,
        limit: u32,
    },
}

/// Turns the byte stream into [`Message`]s.
pub struct MessageDecoder<R> {
    reader: ByteReader<R>,
    limits: DecodeLimits,
    decoded: u64,
    unknown: u64,
}

impl<R: BufRead> MessageDecoder<R> {
    pub fn new(reader: ByteReader<R>, limits: DecodeLimits) -> Self {
        Self {
            reader,
            limits,
            decoded: 0,
            unknown: 0,
        }
    }

    /// Read the one-off scene handshake.
    pub fn read_handshake(&mut self) -> Result<InitMessage, DecodeError> {
        let scene_file = self.reader.read_string()?;
        let scene_scale = self.reader.read_f64()?;
        let density_min = self.reader.read_f64()?;
        let density_max = self.reader.read_f64()?;

        info!(
            "Handshake: scene={} scale={} density=[{}, {}]",
            scene_file, scene_scale, density_min, density_max
        );

        Ok(InitMessage {
            scene_file,
            scene_scale,
            density_min,
            density_max,
        })
    }

    /// Block until the next message starts arriving.
    ///
    /// `Ok(false)` means the producer closed the stream between messages.
    pub fn wait_ready(&mut self) -> Result<bool, DecodeError> {
        Ok(self.reader.wait_ready()?)
    }

    /// Decode the next message.
    pub fn decode_next(&mut self) -> Result<Message, DecodeError> {
        let offset = self.reader.offset();
        let tag = self.reader.read_u8()?;

        let message = match tag {
            CURRENT_TIME_TAG => Message::CurrentTime {
                timestamp: self.reader.read_f64()?,
            },
            LOCATIONS_TAG => {
                let count = self.read_count("locations")?;
                let mut people = Vec::with_capacity(count.min(PREALLOC_CAP));
                for _ in 0..count {
                    people.push(PersonPose {
                        x: self.reader.read_i16()?,
                        y: self.reader.read_i16()?,
                        heading: self.reader.read_f64()?,
                    });
                }
                Message::Locations { people }
            }
            DENSITY_MAP_TAG => {
                let count = self.read_count("density_map")?;
                let mut cells = Vec::with_capacity(count.min(PREALLOC_CAP));
                for _ in 0..count {
                    cells.push(DensitySample {
                        x: self.reader.read_i16()?,
                        y: self.reader.read_i16()?,
                        density: self.reader.read_f64()?,
                    });
                }
                Message::DensityMap { cells }
            }
            STATISTICS_TAG => Message::Statistics(Statistics {
                min: self.reader.read_f64()?,
                max: self.reader.read_f64()?,
                count: self.reader.read_i32()?,
                avg: self.reader.read_f64()?,
                variance: self.reader.read_f64()?,
                std_deviation: self.reader.read_f64()?,
            }),
            tag => {
                self.unknown += 1;
                warn!(
                    "Ignoring unknown message tag {} at byte {} (message #{})",
                    tag, offset, self.decoded
                );
                Message::Unknown { tag }
            }
        };

        self.decoded += 1;
        Ok(message)
    }

    fn read_count(&mut self, kind: &'static str) -> Result<usize, DecodeError> {
        let count = self.reader.read_i32()?;
        if count < 0 {
            return Err(DecodeError::NegativeCount { kind, count });
        }
        let count = count as u32;
        if count > self.limits.max_elements {
            return Err(DecodeError::CountTooLarge {
                kind,
                count,
                limit: self.limits.max_elements,
            });
        }
        Ok(count as usize)
    }

    /// Messages decoded so far, unknown tags included.
    pub fn messages_decoded(&self) -> u64 {
        self.decoded
    }

    /// Unknown tag bytes skipped so far.
    pub fn unknown_tags(&self) -> u64 {
        self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FloatOrder, MessageWriter};
    use proptest::prelude::*;
    use std::io::Cursor;

    fn decoder(bytes: Vec<u8>) -> MessageDecoder<Cursor<Vec<u8>>> {
        MessageDecoder::new(
            ByteReader::new(Cursor::new(bytes), FloatOrder::Big),
            DecodeLimits::default(),
        )
    }

    fn encode(messages: &[Message]) -> Vec<u8> {
        let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Big);
        for message in messages {
            writer.write_message(message).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_decode_current_time_layout() {
        let mut bytes = vec![CURRENT_TIME_TAG];
        bytes.extend_from_slice(&2.5f64.to_be_bytes());
        let mut d = decoder(bytes);
        assert_eq!(
            d.decode_next().unwrap(),
            Message::CurrentTime { timestamp: 2.5 }
        );
        assert_eq!(d.messages_decoded(), 1);
    }

    #[test]
    fn test_decode_locations_layout() {
        let mut bytes = vec![LOCATIONS_TAG, 0, 0, 0, 2];
        for (x, y, h) in [(100i16, 50i16, 0.0f64), (-3, 7, 1.5)] {
            bytes.extend_from_slice(&x.to_be_bytes());
            bytes.extend_from_slice(&y.to_be_bytes());
            bytes.extend_from_slice(&h.to_be_bytes());
        }
        let mut d = decoder(bytes);
        assert_eq!(
            d.decode_next().unwrap(),
            Message::Locations {
                people: vec![
                    PersonPose {
                        x: 100,
                        y: 50,
                        heading: 0.0
                    },
                    PersonPose {
                        x: -3,
                        y: 7,
                        heading: 1.5
                    },
                ]
            }
        );
        assert!(!d.wait_ready().unwrap());
    }

    #[test]
    fn test_decode_statistics_field_order() {
        let mut bytes = vec![STATISTICS_TAG];
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        bytes.extend_from_slice(&5.0f64.to_be_bytes());
        bytes.extend_from_slice(&10i32.to_be_bytes());
        bytes.extend_from_slice(&3.0f64.to_be_bytes());
        bytes.extend_from_slice(&0.5f64.to_be_bytes());
        bytes.extend_from_slice(&0.707f64.to_be_bytes());
        let mut d = decoder(bytes);
        assert_eq!(
            d.decode_next().unwrap(),
            Message::Statistics(Statistics {
                min: 1.0,
                max: 5.0,
                count: 10,
                avg: 3.0,
                variance: 0.5,
                std_deviation: 0.707,
            })
        );
    }

    #[test]
    fn test_handshake() {
        let init = InitMessage {
            scene_file: "resources/office/scene.svg".into(),
            scene_scale: 10.0,
            density_min: 0.5,
            density_max: 4.0,
        };
        let mut writer = MessageWriter::new(Vec::new(), FloatOrder::Big);
        writer.write_handshake(&init).unwrap();
        writer
            .write_message(&Message::CurrentTime { timestamp: 0.1 })
            .unwrap();

        let mut d = decoder(writer.into_inner());
        assert_eq!(d.read_handshake().unwrap(), init);
        assert_eq!(
            d.decode_next().unwrap(),
            Message::CurrentTime { timestamp: 0.1 }
        );
    }

    #[test]
    fn test_unknown_tag_does_not_halt_stream() {
        let bytes = encode(&[
            Message::Unknown { tag: 0x42 },
            Message::CurrentTime { timestamp: 1.0 },
            Message::Unknown { tag: 0xff },
            Message::DensityMap { cells: vec![] },
        ]);
        let mut d = decoder(bytes);
        assert_eq!(d.decode_next().unwrap(), Message::Unknown { tag: 0x42 });
        assert_eq!(
            d.decode_next().unwrap(),
            Message::CurrentTime { timestamp: 1.0 }
        );
        assert_eq!(d.decode_next().unwrap(), Message::Unknown { tag: 0xff });
        assert_eq!(
            d.decode_next().unwrap(),
            Message::DensityMap { cells: vec![] }
        );
        assert_eq!(d.unknown_tags(), 2);
        assert_eq!(d.messages_decoded(), 4);
    }

    #[test]
    fn test_count_guard() {
        let mut bytes = vec![DENSITY_MAP_TAG];
        bytes.extend_from_slice(&1000i32.to_be_bytes());
        let mut d = MessageDecoder::new(
            ByteReader::new(Cursor::new(bytes), FloatOrder::Big),
            DecodeLimits { max_elements: 10 },
        );
        assert!(matches!(
            d.decode_next(),
            Err(DecodeError::CountTooLarge {
                count: 1000,
                limit: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_negative_count() {
        let mut bytes = vec![LOCATIONS_TAG];
        bytes.extend_from_slice(&(-1i32).to_be_bytes());
        let mut d = decoder(bytes);
        assert!(matches!(
            d.decode_next(),
            Err(DecodeError::NegativeCount { count: -1, .. })
        ));
    }

    #[test]
    fn test_huge_count_with_short_body_fails_without_allocating() {
        // Announces ~2 billion cells but carries one.
        let mut bytes = vec![DENSITY_MAP_TAG];
        bytes.extend_from_slice(&i32::MAX.to_be_bytes());
        bytes.extend_from_slice(&[0, 1, 0, 2]);
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        let mut d = MessageDecoder::new(
            ByteReader::new(Cursor::new(bytes), FloatOrder::Big),
            DecodeLimits {
                max_elements: u32::MAX,
            },
        );
        assert!(matches!(
            d.decode_next(),
            Err(DecodeError::Stream(StreamError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_truncated_payload_is_stream_error() {
        let mut d = decoder(vec![CURRENT_TIME_TAG, 0, 0]);
        assert!(matches!(
            d.decode_next(),
            Err(DecodeError::Stream(StreamError::UnexpectedEof { .. }))
        ));
    }

    fn finite() -> impl Strategy<Value = f64> {
        -1.0e9f64..1.0e9
    }

    fn message_strategy() -> impl Strategy<Value = Message> {
        let pose = (any::<i16>(), any::<i16>(), finite())
            .prop_map(|(x, y, heading)| PersonPose { x, y, heading });
        let sample = (any::<i16>(), any::<i16>(), finite())
            .prop_map(|(x, y, density)| DensitySample { x, y, density });
        prop_oneof![
            finite().prop_map(|timestamp| Message::CurrentTime { timestamp }),
            prop::collection::vec(pose, 0..64).prop_map(|people| Message::Locations { people }),
            prop::collection::vec(sample, 0..64).prop_map(|cells| Message::DensityMap { cells }),
            (finite(), finite(), any::<i32>(), finite(), finite(), finite()).prop_map(
                |(min, max, count, avg, variance, std_deviation)| {
                    Message::Statistics(Statistics {
                        min,
                        max,
                        count,
                        avg,
                        variance,
                        std_deviation,
                    })
                }
            ),
        ]
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            messages in prop::collection::vec(message_strategy(), 1..8),
            order in prop_oneof![
                Just(FloatOrder::Native),
                Just(FloatOrder::Big),
                Just(FloatOrder::Little)
            ],
        ) {
            let mut writer = MessageWriter::new(Vec::new(), order);
            for message in &messages {
                writer.write_message(message).unwrap();
            }
            let mut d = MessageDecoder::new(
                ByteReader::new(Cursor::new(writer.into_inner()), order),
                DecodeLimits::default(),
            );
            for message in &messages {
                prop_assert!(d.wait_ready().unwrap());
                prop_assert_eq!(&d.decode_next().unwrap(), message);
            }
            prop_assert!(!d.wait_ready().unwrap());
        }
    }
}
